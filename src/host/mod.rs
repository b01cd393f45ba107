//! The Host Model Facade: the surface the bridge consumes from the
//! modelling application.
//!
//! The real scene graph, scripting engine and renderer live inside the host
//! application and are only ever touched from its own thread. The bridge is
//! generic over the [`Host`] trait so the same protocol server runs against
//! the live application and against the in-memory reference host in
//! [`memory`].
//!
//! The facade is deliberately narrow: entity enumeration, selection, bounds,
//! save and view rendering. Everything else the host exposes (materials,
//! layers, cameras, ...) is reachable through [`Host::eval`], which hands a
//! script to the host's own execution context at full privilege.

pub mod memory;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the Host Model Facade.
#[derive(Debug, Error)]
pub enum HostError {
    /// The scripting engine rejected or failed to run the supplied code.
    /// The message carries the engine's own diagnostic text.
    #[error("{message}")]
    Script {
        /// Diagnostic text from the scripting engine.
        message: String,
    },

    /// Saving the model failed.
    #[error("failed to save model to {path}")]
    Save {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Rendering the active view failed.
    #[error("failed to render view to {path}")]
    Render {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl HostError {
    /// Creates a script error from engine diagnostic text.
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }
}

/// Classification of a scene entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A group of entities.
    Group,
    /// A component instance.
    Component,
    /// A face.
    Face,
    /// An edge.
    Edge,
    /// Anything else (guides, dimensions, text, ...).
    Other,
}

/// A lightweight reference to an entity: id plus classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef {
    /// Host-assigned entity id.
    pub id: i64,
    /// Entity classification.
    pub kind: EntityKind,
}

/// A top-level entity as seen by the bridge.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    /// Host-assigned entity id.
    pub id: i64,
    /// Entity classification.
    pub kind: EntityKind,
    /// Display name, when the entity carries one.
    pub name: Option<String>,
    /// Bounding volume of this entity.
    pub bounds: BoundingBox,
}

/// An axis-aligned bounding volume, possibly empty.
///
/// An empty box contains no geometry and has no corner points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    corners: Option<([f64; 3], [f64; 3])>,
}

impl BoundingBox {
    /// Creates an empty bounding box.
    #[must_use]
    pub const fn empty() -> Self {
        Self { corners: None }
    }

    /// Creates a bounding box from min/max corner points.
    #[must_use]
    pub const fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            corners: Some((min, max)),
        }
    }

    /// Returns `true` if the box contains no geometry.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.corners.is_none()
    }

    /// Returns the min/max corner points, or `None` for an empty box.
    #[must_use]
    pub const fn corners(&self) -> Option<([f64; 3], [f64; 3])> {
        self.corners
    }

    /// Extends the box to contain another box.
    pub fn union(&mut self, other: &Self) {
        let Some((omin, omax)) = other.corners else {
            return;
        };
        match &mut self.corners {
            None => self.corners = Some((omin, omax)),
            Some((min, max)) => {
                for axis in 0..3 {
                    min[axis] = min[axis].min(omin[axis]);
                    max[axis] = max[axis].max(omax[axis]);
                }
            }
        }
    }
}

/// Options for rendering the active view to an image file.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Whether antialiasing is applied.
    pub antialias: bool,
    /// Whether the background is rendered with alpha transparency.
    pub transparent: bool,
}

/// A live model: the scene graph the tools read and mutate.
pub trait Model {
    /// Display name of the model.
    fn name(&self) -> String;

    /// Path of the model file, when it has been saved.
    fn path(&self) -> Option<PathBuf>;

    /// Human-readable label of the model's length unit setting.
    fn unit_label(&self) -> String;

    /// Top-level entities of the active entity collection.
    fn entities(&self) -> Vec<EntityInfo>;

    /// The current selection, in selection order.
    fn selection(&self) -> Vec<EntityRef>;

    /// Bounding volume of the whole model.
    fn bounds(&self) -> BoundingBox;

    /// Persists the entire model to `path` in the host's native format.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Save`] when the host cannot write the file.
    fn save_as(&mut self, path: &Path) -> Result<(), HostError>;

    /// Renders the active view to an image file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Render`] when the host cannot produce the image.
    fn render_view(&mut self, path: &Path, options: &RenderOptions) -> Result<(), HostError>;
}

/// The host application, as consumed by the bridge.
pub trait Host {
    /// The currently open model, or `None` when no model is open.
    fn active_model(&mut self) -> Option<&mut dyn Model>;

    /// Evaluates `code` in the host's scripting execution context and
    /// returns the textual value of the final expression.
    ///
    /// Runs at the same trust level as the host's own script console; the
    /// caller is responsible for the trust decision.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Script`] carrying the engine's diagnostic text
    /// when evaluation fails.
    fn eval(&mut self, code: &str) -> Result<String, HostError>;
}
