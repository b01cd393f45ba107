//! In-memory reference host.
//!
//! The real host is a modelling application the bridge is embedded into; it
//! cannot be linked from here. This module provides a self-contained stand-in
//! with the same facade: an entity store with selection and bounds, a JSON
//! scene snapshot behind [`Model::save_as`], a stub image writer behind
//! [`Model::render_view`], and a small arithmetic evaluator behind
//! [`Host::eval`] so the execute-code path can be driven end to end.
//!
//! The dev binary serves this host; the integration tests run against it.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{
    BoundingBox, EntityInfo, EntityKind, EntityRef, Host, HostError, Model, RenderOptions,
};

/// An in-memory model.
#[derive(Debug)]
pub struct MemoryModel {
    name: String,
    path: Option<PathBuf>,
    unit_label: String,
    entities: Vec<EntityInfo>,
    selection: Vec<EntityRef>,
    next_id: i64,
}

impl MemoryModel {
    /// Creates an empty model with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            unit_label: "mm".to_string(),
            entities: Vec::new(),
            selection: Vec::new(),
            next_id: 1,
        }
    }

    /// Sets the unit label reported by the model.
    pub fn set_unit_label(&mut self, label: impl Into<String>) {
        self.unit_label = label.into();
    }

    /// Adds a top-level entity and returns its id.
    pub fn add_entity(
        &mut self,
        kind: EntityKind,
        name: Option<&str>,
        bounds: BoundingBox,
    ) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(EntityInfo {
            id,
            kind,
            name: name.map(str::to_string),
            bounds,
        });
        id
    }

    /// Replaces the selection with the entities matching `ids`, in order.
    /// Unknown ids are ignored.
    pub fn select(&mut self, ids: &[i64]) {
        self.selection = ids
            .iter()
            .filter_map(|id| {
                self.entities
                    .iter()
                    .find(|e| e.id == *id)
                    .map(|e| EntityRef {
                        id: e.id,
                        kind: e.kind,
                    })
            })
            .collect();
    }
}

/// Snapshot document written by [`MemoryModel::save_as`].
#[derive(Serialize)]
struct SceneSnapshot<'a> {
    name: &'a str,
    units: &'a str,
    entities: Vec<SnapshotEntity<'a>>,
}

#[derive(Serialize)]
struct SnapshotEntity<'a> {
    id: i64,
    kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounds: Option<([f64; 3], [f64; 3])>,
}

impl Model for MemoryModel {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn unit_label(&self) -> String {
        self.unit_label.clone()
    }

    fn entities(&self) -> Vec<EntityInfo> {
        self.entities.clone()
    }

    fn selection(&self) -> Vec<EntityRef> {
        self.selection.clone()
    }

    fn bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for entity in &self.entities {
            bounds.union(&entity.bounds);
        }
        bounds
    }

    fn save_as(&mut self, path: &Path) -> Result<(), HostError> {
        let snapshot = SceneSnapshot {
            name: &self.name,
            units: &self.unit_label,
            entities: self
                .entities
                .iter()
                .map(|e| SnapshotEntity {
                    id: e.id,
                    kind: e.kind,
                    name: e.name.as_deref(),
                    bounds: e.bounds.corners(),
                })
                .collect(),
        };

        let json = serde_json::to_vec_pretty(&snapshot).map_err(|e| HostError::Save {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        std::fs::write(path, json).map_err(|e| HostError::Save {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn render_view(&mut self, path: &Path, options: &RenderOptions) -> Result<(), HostError> {
        // Not a rasteriser. The stub records the requested parameters so
        // callers can assert on what would have been rendered.
        let stub = format!(
            "scene-bridge render stub: {}x{} antialias={} transparent={}\n",
            options.width, options.height, options.antialias, options.transparent
        );
        std::fs::write(path, stub).map_err(|e| HostError::Render {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// An in-memory host holding at most one open model.
#[derive(Debug, Default)]
pub struct MemoryHost {
    model: Option<MemoryModel>,
}

impl MemoryHost {
    /// Creates a host with no model open.
    #[must_use]
    pub fn new() -> Self {
        Self { model: None }
    }

    /// Creates a host with the given model open.
    #[must_use]
    pub fn with_model(model: MemoryModel) -> Self {
        Self { model: Some(model) }
    }

    /// Opens `model`, replacing any previously open model.
    pub fn open(&mut self, model: MemoryModel) {
        self.model = Some(model);
    }

    /// Closes the open model.
    pub fn close(&mut self) {
        self.model = None;
    }
}

impl Host for MemoryHost {
    fn active_model(&mut self) -> Option<&mut dyn Model> {
        self.model.as_mut().map(|m| m as &mut dyn Model)
    }

    fn eval(&mut self, code: &str) -> Result<String, HostError> {
        eval_script(code).map_err(HostError::script)
    }
}

/// Evaluates a script: expressions separated by `;` or newlines, the value
/// of the final expression is returned.
fn eval_script(code: &str) -> Result<String, String> {
    let mut last = None;
    for statement in code.split(|c| c == ';' || c == '\n') {
        if statement.trim().is_empty() {
            continue;
        }
        last = Some(eval_expression(statement)?);
    }
    last.map(format_value)
        .ok_or_else(|| "no expression to evaluate".to_string())
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluates a single arithmetic expression: `+ - * /`, parentheses and
/// unary minus over decimal literals.
fn eval_expression(input: &str) -> Result<f64, String> {
    let mut parser = ExprParser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    let value = parser.expression()?;
    parser.skip_whitespace();
    if parser.pos < parser.bytes.len() {
        return Err(format!(
            "unexpected character '{}' at offset {}",
            parser.bytes[parser.pos] as char,
            parser.pos
        ));
    }
    Ok(value)
}

struct ExprParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl ExprParser<'_> {
    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    fn expression(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            if op == b'+' {
                value += rhs;
            } else {
                value -= rhs;
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        while let Some(op @ (b'*' | b'/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == b'*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err("division by zero".to_string());
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.expression()?;
                if self.peek() == Some(b')') {
                    self.pos += 1;
                    Ok(value)
                } else {
                    Err("expected ')'".to_string())
                }
            }
            Some(b) if b.is_ascii_digit() || b == b'.' => self.number(),
            Some(b) => Err(format!(
                "unexpected character '{}' at offset {}",
                b as char, self.pos
            )),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| "invalid number".to_string())?;
        text.parse::<f64>()
            .map_err(|_| format!("invalid number '{text}'"))
    }
}
