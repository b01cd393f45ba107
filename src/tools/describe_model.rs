//! `describe_model` — structured introspection of the open model.
//!
//! Purely read-only. The result text is itself a JSON document so the
//! caller can parse entity counts, selection and bounds without scraping
//! prose. Everything is computed fresh per call; nothing is cached.

use serde::Serialize;
use serde_json::Value;

use super::ToolError;
use crate::host::{BoundingBox, EntityInfo, EntityKind, Host};

/// Selection items reported before truncation.
const MAX_SELECTION_ITEMS: usize = 10;

/// Groups/components listed per class when details are requested.
const MAX_DETAIL_ENTITIES: usize = 20;

/// Reportable form of a bounding volume.
///
/// Shared by the model-level and entity-level queries: an empty volume has
/// no reportable bounds and serialises as `null` at its use sites.
#[derive(Debug, Clone, Serialize)]
pub struct BoundsInfo {
    /// Minimum corner, `[x, y, z]`.
    pub min: [f64; 3],
    /// Maximum corner, `[x, y, z]`.
    pub max: [f64; 3],
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
    /// Extent along z.
    pub depth: f64,
}

impl BoundsInfo {
    /// Derives reportable bounds from a volume, `None` when it is empty.
    #[must_use]
    pub fn from_box(bounds: &BoundingBox) -> Option<Self> {
        bounds.corners().map(|(min, max)| Self {
            min,
            max,
            width: max[0] - min[0],
            height: max[1] - min[1],
            depth: max[2] - min[2],
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelDescription {
    name: String,
    path: Option<String>,
    units: String,
    entity_counts: EntityCounts,
    selection: SelectionInfo,
    bounds: Option<BoundsInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<EntityDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<Vec<EntityDetail>>,
}

#[derive(Default, Serialize)]
struct EntityCounts {
    total: usize,
    groups: usize,
    components: usize,
    faces: usize,
    edges: usize,
}

#[derive(Serialize)]
struct SelectionInfo {
    count: usize,
    items: Vec<SelectionItem>,
}

#[derive(Serialize)]
struct SelectionItem {
    id: i64,
    #[serde(rename = "type")]
    kind: EntityKind,
}

#[derive(Serialize)]
struct EntityDetail {
    id: i64,
    name: Option<String>,
    bounds: Option<BoundsInfo>,
}

fn detail_rows(entities: &[EntityInfo], kind: EntityKind) -> Vec<EntityDetail> {
    entities
        .iter()
        .filter(|e| e.kind == kind)
        .take(MAX_DETAIL_ENTITIES)
        .map(|e| EntityDetail {
            id: e.id,
            name: e.name.clone(),
            bounds: BoundsInfo::from_box(&e.bounds),
        })
        .collect()
}

/// Describes the open model as a JSON document.
pub(crate) fn run(host: &mut dyn Host, arguments: &Value) -> Result<String, ToolError> {
    let include_details = arguments
        .get("include_details")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let model = host.active_model().ok_or(ToolError::NoActiveModel)?;

    let entities = model.entities();
    let mut counts = EntityCounts {
        total: entities.len(),
        ..EntityCounts::default()
    };
    for entity in &entities {
        match entity.kind {
            EntityKind::Group => counts.groups += 1,
            EntityKind::Component => counts.components += 1,
            EntityKind::Face => counts.faces += 1,
            EntityKind::Edge => counts.edges += 1,
            EntityKind::Other => {}
        }
    }

    let selected = model.selection();
    let selection = SelectionInfo {
        count: selected.len(),
        items: selected
            .iter()
            .take(MAX_SELECTION_ITEMS)
            .map(|s| SelectionItem {
                id: s.id,
                kind: s.kind,
            })
            .collect(),
    };

    let (groups, components) = if include_details {
        (
            Some(detail_rows(&entities, EntityKind::Group)),
            Some(detail_rows(&entities, EntityKind::Component)),
        )
    } else {
        (None, None)
    };

    let description = ModelDescription {
        name: model.name(),
        path: model.path().map(|p| p.display().to_string()),
        units: model.unit_label(),
        entity_counts: counts,
        selection,
        bounds: BoundsInfo::from_box(&model.bounds()),
        groups,
        components,
    };

    Ok(serde_json::to_string(&description)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryHost, MemoryModel};
    use serde_json::json;

    fn unit_box() -> BoundingBox {
        BoundingBox::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])
    }

    fn describe(host: &mut MemoryHost, arguments: Value) -> Value {
        let text = run(host, &arguments).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn no_model_is_an_application_error() {
        let mut host = MemoryHost::new();
        let err = run(&mut host, &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "No active model");
    }

    #[test]
    fn empty_model_reports_zero_counts_and_null_bounds() {
        let mut host = MemoryHost::with_model(MemoryModel::new("empty"));
        let value = describe(&mut host, json!({}));

        assert_eq!(value["name"], "empty");
        assert_eq!(value["path"], Value::Null);
        assert_eq!(value["entityCounts"]["total"], 0);
        assert_eq!(value["bounds"], Value::Null);
        assert_eq!(value["selection"]["count"], 0);
        assert!(value.get("groups").is_none());
    }

    #[test]
    fn counts_are_classified_by_kind() {
        let mut model = MemoryModel::new("counts");
        model.add_entity(EntityKind::Group, Some("g"), unit_box());
        model.add_entity(EntityKind::Component, Some("c"), unit_box());
        for _ in 0..3 {
            model.add_entity(EntityKind::Face, None, unit_box());
        }
        for _ in 0..4 {
            model.add_entity(EntityKind::Edge, None, unit_box());
        }
        model.add_entity(EntityKind::Other, None, BoundingBox::empty());

        let mut host = MemoryHost::with_model(model);
        let value = describe(&mut host, json!({}));

        assert_eq!(value["entityCounts"]["total"], 10);
        assert_eq!(value["entityCounts"]["groups"], 1);
        assert_eq!(value["entityCounts"]["components"], 1);
        assert_eq!(value["entityCounts"]["faces"], 3);
        assert_eq!(value["entityCounts"]["edges"], 4);
    }

    #[test]
    fn bounds_carry_extents() {
        let mut model = MemoryModel::new("bounds");
        model.add_entity(
            EntityKind::Face,
            None,
            BoundingBox::new([0.0, 0.0, 0.0], [2.0, 3.0, 4.0]),
        );
        let mut host = MemoryHost::with_model(model);
        let value = describe(&mut host, json!({}));

        assert_eq!(value["bounds"]["width"], 2.0);
        assert_eq!(value["bounds"]["height"], 3.0);
        assert_eq!(value["bounds"]["depth"], 4.0);
        assert_eq!(value["bounds"]["min"], json!([0.0, 0.0, 0.0]));
    }

    #[test]
    fn selection_is_truncated_to_ten_items() {
        let mut model = MemoryModel::new("selection");
        let ids: Vec<i64> = (0..15)
            .map(|_| model.add_entity(EntityKind::Face, None, unit_box()))
            .collect();
        model.select(&ids);

        let mut host = MemoryHost::with_model(model);
        let value = describe(&mut host, json!({}));

        assert_eq!(value["selection"]["count"], 15);
        assert_eq!(value["selection"]["items"].as_array().unwrap().len(), 10);
        assert_eq!(value["selection"]["items"][0]["type"], "face");
    }

    #[test]
    fn details_are_capped_at_twenty_per_class() {
        let mut model = MemoryModel::new("details");
        for i in 0..50 {
            model.add_entity(EntityKind::Group, Some(&format!("group {i}")), unit_box());
        }
        for i in 0..25 {
            model.add_entity(
                EntityKind::Component,
                Some(&format!("component {i}")),
                unit_box(),
            );
        }

        let mut host = MemoryHost::with_model(model);
        let value = describe(&mut host, json!({"include_details": true}));

        assert_eq!(value["groups"].as_array().unwrap().len(), 20);
        assert_eq!(value["components"].as_array().unwrap().len(), 20);
        assert_eq!(value["groups"][0]["name"], "group 0");
        assert!(value["groups"][0]["bounds"].is_object());
    }

    #[test]
    fn details_are_omitted_by_default() {
        let mut model = MemoryModel::new("no-details");
        model.add_entity(EntityKind::Group, Some("g"), unit_box());
        let mut host = MemoryHost::with_model(model);
        let value = describe(&mut host, json!({}));
        assert!(value.get("groups").is_none());
        assert!(value.get("components").is_none());
    }

    #[test]
    fn entity_without_geometry_reports_null_bounds_in_details() {
        let mut model = MemoryModel::new("hollow");
        model.add_entity(EntityKind::Group, Some("hollow"), BoundingBox::empty());
        let mut host = MemoryHost::with_model(model);
        let value = describe(&mut host, json!({"include_details": true}));
        assert_eq!(value["groups"][0]["bounds"], Value::Null);
    }
}
