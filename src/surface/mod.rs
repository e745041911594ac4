//! Surface: the presentation collaborator the scheduler issues commands to
//!
//! The scheduler never touches a document directly. Everything it draws,
//! tints, rewrites or removes goes through [`Surface`]:
//!
//! | Concern | Operations |
//! |---------|------------|
//! | Persistent layers | `layer`, `create_layer`, `remove_layer`, `set_themed` |
//! | Queries | `themed_elements`, `text_elements`, `contains`, `find` |
//! | Transient state | `filter`, `page_filter`, `text`, `title` and their setters |
//! | Canvas | `viewport`, `fit_canvas`, `put_pixels` |
//! | Short-lived nodes | `spawn_overlay`, `set_opacity`, `move_to`, `remove` |
//! | Tagging | `add_class`, `attribute`, `set_attribute` |
//!
//! Host events (pointer, resize, first input) flow the other way, as
//! [`SurfaceEvent`]s handed to the scheduler.
//!
//! Implementations:
//! - [`MemorySurface`]: in-memory document with a command journal
//! - `DomSurface` (feature `wasm`): the live browser document

mod memory;
mod registry;

pub use memory::{Command, MemorySurface, SurfaceSnapshot};
pub use registry::Registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::catalog::names;
use crate::core::noise::{StaticFrame, Viewport};
use crate::error::{ThemeError, ThemeResult};

/// Opaque handle to an element on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Long-lived layers created at init and removed at teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    StaticOverlay,
    Scanlines,
    Background,
    DynamicStyles,
    StaticCanvas,
    Subliminal,
    CursorMarker,
}

impl Layer {
    pub const ALL: [Layer; 7] = [
        Layer::StaticOverlay,
        Layer::Scanlines,
        Layer::Background,
        Layer::DynamicStyles,
        Layer::StaticCanvas,
        Layer::Subliminal,
        Layer::CursorMarker,
    ];

    /// Class (or id) the layer carries in the document
    pub fn name(&self) -> &'static str {
        match self {
            Layer::StaticOverlay => names::STATIC_OVERLAY,
            Layer::Scanlines => names::SCANLINES,
            Layer::Background => names::BACKGROUND,
            Layer::DynamicStyles => names::DYNAMIC_STYLES,
            Layer::StaticCanvas => names::STATIC_CANVAS,
            Layer::Subliminal => names::SUBLIMINAL,
            Layer::CursorMarker => names::CURSOR_MARKER,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Short-lived nodes spawned by effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Overlay {
    /// Fade-and-shrink mark at the pointer
    Interference { x: f64, y: f64 },
    /// Full-viewport scare screen
    Scare { text: String },
}

/// Role an element can be tagged with by `apply_to_element`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Title,
    Subtitle,
    Card,
    Button,
    CorruptedText,
}

impl Default for ElementKind {
    fn default() -> Self {
        Self::Card
    }
}

impl ElementKind {
    pub fn class(&self) -> &'static str {
        match self {
            ElementKind::Title => "vhs-title",
            ElementKind::Subtitle => "vhs-subtitle",
            ElementKind::Card => "vhs-card",
            ElementKind::Button => "vhs-button",
            ElementKind::CorruptedText => "vhs-corrupted-text",
        }
    }
}

impl FromStr for ElementKind {
    type Err = ThemeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(ElementKind::Title),
            "subtitle" => Ok(ElementKind::Subtitle),
            "card" => Ok(ElementKind::Card),
            "button" => Ok(ElementKind::Button),
            "corrupted-text" | "corrupted_text" => Ok(ElementKind::CorruptedText),
            other => Err(ThemeError::InvalidConfig(format!("unknown element kind: {other}"))),
        }
    }
}

/// Host notifications the scheduler reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SurfaceEvent {
    PointerMove { x: f64, y: f64 },
    Resize { width: u32, height: u32 },
    /// First click or pointer movement; unlocks audio
    FirstInput,
}

/// Sink for every visual command the scheduler issues.
///
/// Mutators on elements that no longer exist must be no-ops.
pub trait Surface {
    fn layer(&self, layer: Layer) -> Option<ElementId>;
    fn create_layer(&mut self, layer: Layer) -> ThemeResult<ElementId>;
    fn remove_layer(&mut self, layer: Layer);
    /// Mark (or unmark) the document as themed
    fn set_themed(&mut self, on: bool);

    fn themed_elements(&self) -> Vec<ElementId>;
    fn text_elements(&self) -> Vec<ElementId>;
    fn contains(&self, el: ElementId) -> bool;
    /// Resolve `#id`, `.class` or a bare id
    fn find(&self, target: &str) -> Option<ElementId>;

    fn filter(&self, el: ElementId) -> Option<String>;
    fn set_filter(&mut self, el: ElementId, filter: Option<&str>);
    fn page_filter(&self) -> Option<String>;
    fn set_page_filter(&mut self, filter: Option<&str>);
    fn text(&self, el: ElementId) -> Option<String>;
    fn set_text(&mut self, el: ElementId, text: &str);
    fn title(&self) -> String;
    fn set_title(&mut self, title: &str);

    fn viewport(&self) -> Viewport;
    fn fit_canvas(&mut self, viewport: Viewport);
    fn put_pixels(&mut self, frame: &StaticFrame);

    fn spawn_overlay(&mut self, overlay: &Overlay) -> ThemeResult<ElementId>;
    fn set_opacity(&mut self, el: ElementId, opacity: f32);
    fn move_to(&mut self, el: ElementId, x: f64, y: f64);
    fn remove(&mut self, el: ElementId);

    fn add_class(&mut self, el: ElementId, class: &str);
    fn attribute(&self, el: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str);
}
