//! In-memory surface: a tiny document model with a command journal

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::{ElementId, Layer, Overlay, Surface};
use crate::core::noise::{StaticFrame, Viewport};
use crate::error::{ThemeError, ThemeResult};

const TEXT_TAGS: &[&str] = &["p", "h1", "h2", "h3"];

/// One node of the in-memory document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub parent: Option<ElementId>,
    pub text: String,
    pub filter: Option<String>,
    pub opacity: Option<f32>,
    pub position: Option<(f64, f64)>,
    pub attributes: BTreeMap<String, String>,
    pub overlay: Option<Overlay>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            parent: None,
            text: String::new(),
            filter: None,
            opacity: None,
            position: None,
            attributes: BTreeMap::new(),
            overlay: None,
        }
    }

    fn has_theme_class(&self) -> bool {
        self.classes.iter().any(|c| c.contains("vhs-"))
    }
}

/// Everything the scheduler did to the surface, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Command {
    Themed { on: bool },
    CreateLayer { layer: Layer, el: ElementId },
    RemoveLayer { layer: Layer },
    SetFilter { el: ElementId, filter: Option<String> },
    SetPageFilter { filter: Option<String> },
    SetText { el: ElementId, text: String },
    SetTitle { title: String },
    FitCanvas { width: u32, height: u32 },
    SpawnOverlay { el: ElementId, overlay: Overlay },
    SetOpacity { el: ElementId, opacity: f32 },
    Remove { el: ElementId },
    AddClass { el: ElementId, class: String },
    SetAttribute { el: ElementId, name: String, value: String },
}

/// Comparable view of the document state, without the journal.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    pub nodes: BTreeMap<ElementId, Node>,
    pub layers: BTreeMap<Layer, ElementId>,
    pub title: String,
    pub page_filter: Option<String>,
    pub themed: bool,
}

/// In-memory [`Surface`] used by tests and the headless CLI.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    nodes: BTreeMap<ElementId, Node>,
    next_id: u64,
    layers: BTreeMap<Layer, ElementId>,
    blocked: HashSet<Layer>,
    title: String,
    page_filter: Option<String>,
    themed: bool,
    viewport: Viewport,
    canvas: Option<Viewport>,
    frames_drawn: u64,
    journal: Vec<Command>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl MemorySurface {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
            layers: BTreeMap::new(),
            blocked: HashSet::new(),
            title: title.into(),
            page_filter: None,
            themed: false,
            viewport: Viewport::new(64, 48),
            canvas: None,
            frames_drawn: 0,
            journal: Vec::new(),
        }
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    /// Refuse to create `layer`, as a document without that capability would
    pub fn block_layer(mut self, layer: Layer) -> Self {
        self.blocked.insert(layer);
        self
    }

    /// Add a document element. Returns its handle.
    pub fn add_element(&mut self, tag: &str, classes: &[&str], text: &str) -> ElementId {
        let mut node = Node::new(tag);
        node.classes = classes.iter().map(|c| c.to_string()).collect();
        node.text = text.to_string();
        self.insert(node)
    }

    /// Add an element nested under `parent`.
    pub fn add_child(&mut self, parent: ElementId, tag: &str, text: &str) -> ElementId {
        let mut node = Node::new(tag);
        node.parent = Some(parent);
        node.text = text.to_string();
        self.insert(node)
    }

    pub fn set_element_id(&mut self, el: ElementId, id: &str) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.id = Some(id.to_string());
        }
    }

    /// Host-side viewport change; the scheduler hears about it separately
    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
    }

    pub fn node(&self, el: ElementId) -> Option<&Node> {
        self.nodes.get(&el)
    }

    pub fn themed(&self) -> bool {
        self.themed
    }

    pub fn canvas(&self) -> Option<Viewport> {
        self.canvas
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn journal(&self) -> &[Command] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Live overlays, in creation order
    pub fn overlays(&self) -> Vec<(ElementId, &Overlay)> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| node.overlay.as_ref().map(|o| (*id, o)))
            .collect()
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            nodes: self.nodes.clone(),
            layers: self.layers.clone(),
            title: self.title.clone(),
            page_filter: self.page_filter.clone(),
            themed: self.themed,
        }
    }

    fn insert(&mut self, node: Node) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    fn inside_themed(&self, node: &Node) -> bool {
        let mut parent = node.parent;
        while let Some(id) = parent {
            match self.nodes.get(&id) {
                Some(p) if p.has_theme_class() => return true,
                Some(p) => parent = p.parent,
                None => return false,
            }
        }
        false
    }

    fn remove_subtree(&mut self, el: ElementId) {
        let children: Vec<ElementId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(el))
            .map(|(id, _)| *id)
            .collect();
        for child in children {
            self.remove_subtree(child);
        }
        self.nodes.remove(&el);
    }
}

impl Surface for MemorySurface {
    fn layer(&self, layer: Layer) -> Option<ElementId> {
        self.layers.get(&layer).copied()
    }

    fn create_layer(&mut self, layer: Layer) -> ThemeResult<ElementId> {
        if self.blocked.contains(&layer) {
            return Err(ThemeError::LayerUnavailable(layer));
        }
        if let Some(existing) = self.layer(layer) {
            return Ok(existing);
        }
        let tag = match layer {
            Layer::StaticCanvas => "canvas",
            Layer::DynamicStyles => "style",
            _ => "div",
        };
        let mut node = Node::new(tag);
        node.classes.push(layer.name().to_string());
        let el = self.insert(node);
        self.layers.insert(layer, el);
        self.journal.push(Command::CreateLayer { layer, el });
        Ok(el)
    }

    fn remove_layer(&mut self, layer: Layer) {
        if let Some(el) = self.layers.remove(&layer) {
            self.remove_subtree(el);
            self.journal.push(Command::RemoveLayer { layer });
            if layer == Layer::StaticCanvas {
                self.canvas = None;
            }
        }
    }

    fn set_themed(&mut self, on: bool) {
        self.themed = on;
        self.journal.push(Command::Themed { on });
    }

    fn themed_elements(&self) -> Vec<ElementId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.has_theme_class())
            .map(|(id, _)| *id)
            .collect()
    }

    fn text_elements(&self) -> Vec<ElementId> {
        self.nodes
            .iter()
            .filter(|(_, n)| {
                n.classes.iter().any(|c| c == "vhs-corrupted-text")
                    || (TEXT_TAGS.contains(&n.tag.as_str()) && self.inside_themed(n))
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn contains(&self, el: ElementId) -> bool {
        self.nodes.contains_key(&el)
    }

    fn find(&self, target: &str) -> Option<ElementId> {
        if let Some(class) = target.strip_prefix('.') {
            return self
                .nodes
                .iter()
                .find(|(_, n)| n.classes.iter().any(|c| c == class))
                .map(|(id, _)| *id);
        }
        let id = target.strip_prefix('#').unwrap_or(target);
        self.nodes
            .iter()
            .find(|(_, n)| n.id.as_deref() == Some(id))
            .map(|(el, _)| *el)
    }

    fn filter(&self, el: ElementId) -> Option<String> {
        self.nodes.get(&el).and_then(|n| n.filter.clone())
    }

    fn set_filter(&mut self, el: ElementId, filter: Option<&str>) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.filter = filter.map(str::to_string);
            self.journal.push(Command::SetFilter { el, filter: node.filter.clone() });
        }
    }

    fn page_filter(&self) -> Option<String> {
        self.page_filter.clone()
    }

    fn set_page_filter(&mut self, filter: Option<&str>) {
        self.page_filter = filter.map(str::to_string);
        self.journal.push(Command::SetPageFilter { filter: self.page_filter.clone() });
    }

    fn text(&self, el: ElementId) -> Option<String> {
        self.nodes.get(&el).map(|n| n.text.clone())
    }

    fn set_text(&mut self, el: ElementId, text: &str) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.text = text.to_string();
            self.journal.push(Command::SetText { el, text: text.to_string() });
        }
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.journal.push(Command::SetTitle { title: title.to_string() });
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn fit_canvas(&mut self, viewport: Viewport) {
        if self.layers.contains_key(&Layer::StaticCanvas) {
            self.canvas = Some(viewport);
            let (width, height) = (viewport.width, viewport.height);
            self.journal.push(Command::FitCanvas { width, height });
        }
    }

    fn put_pixels(&mut self, frame: &StaticFrame) {
        let Some(canvas) = self.canvas else { return };
        if canvas.width as usize == frame.width() && canvas.height as usize == frame.height() {
            self.frames_drawn += 1;
        }
    }

    fn spawn_overlay(&mut self, overlay: &Overlay) -> ThemeResult<ElementId> {
        let mut node = Node::new("div");
        node.overlay = Some(overlay.clone());
        match overlay {
            Overlay::Interference { x, y } => node.position = Some((*x, *y)),
            Overlay::Scare { text } => node.text = text.clone(),
        }
        let el = self.insert(node);
        self.journal.push(Command::SpawnOverlay { el, overlay: overlay.clone() });
        Ok(el)
    }

    fn set_opacity(&mut self, el: ElementId, opacity: f32) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.opacity = Some(opacity);
            self.journal.push(Command::SetOpacity { el, opacity });
        }
    }

    fn move_to(&mut self, el: ElementId, x: f64, y: f64) {
        // Pointer tracking fires constantly; positions are not journaled
        if let Some(node) = self.nodes.get_mut(&el) {
            node.position = Some((x, y));
        }
    }

    fn remove(&mut self, el: ElementId) {
        if self.nodes.contains_key(&el) {
            self.remove_subtree(el);
            self.layers.retain(|_, id| *id != el);
            self.journal.push(Command::Remove { el });
        }
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(&el) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
                self.journal.push(Command::AddClass { el, class: class.to_string() });
            }
        }
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.nodes.get(&el).and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.attributes.insert(name.to_string(), value.to_string());
            self.journal.push(Command::SetAttribute {
                el,
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_queries_follow_classes_and_nesting() {
        let mut surface = MemorySurface::new("Home");
        let card = surface.add_element("div", &["vhs-card"], "");
        let para = surface.add_child(card, "p", "hello");
        let plain = surface.add_element("p", &[], "outside");
        let tagged = surface.add_element("span", &["vhs-corrupted-text"], "bits");

        let themed = surface.themed_elements();
        assert!(themed.contains(&card));
        assert!(themed.contains(&tagged));
        assert!(!themed.contains(&para));

        let text = surface.text_elements();
        assert!(text.contains(&para));
        assert!(text.contains(&tagged));
        assert!(!text.contains(&plain));
    }

    #[test]
    fn blocked_layer_errors() {
        let mut surface = MemorySurface::new("x").block_layer(Layer::StaticCanvas);
        assert!(surface.create_layer(Layer::StaticCanvas).is_err());
        assert!(surface.create_layer(Layer::Scanlines).is_ok());
    }

    #[test]
    fn create_layer_is_idempotent() {
        let mut surface = MemorySurface::new("x");
        let a = surface.create_layer(Layer::Background).unwrap();
        let b = surface.create_layer(Layer::Background).unwrap();
        assert_eq!(a, b);
        assert_eq!(surface.journal().len(), 1);
    }

    #[test]
    fn mutating_removed_element_is_noop() {
        let mut surface = MemorySurface::new("x");
        let el = surface.add_element("div", &["vhs-card"], "t");
        surface.remove(el);
        surface.set_filter(el, Some("blur(1px)"));
        surface.set_text(el, "changed");
        assert!(!surface.contains(el));
        assert_eq!(surface.filter(el), None);
    }

    #[test]
    fn find_by_id_and_class() {
        let mut surface = MemorySurface::new("x");
        let el = surface.add_element("h1", &["headline"], "T");
        surface.set_element_id(el, "main-title");
        assert_eq!(surface.find("#main-title"), Some(el));
        assert_eq!(surface.find("main-title"), Some(el));
        assert_eq!(surface.find(".headline"), Some(el));
        assert_eq!(surface.find("#nope"), None);
    }

    #[test]
    fn frames_only_count_on_fitted_canvas() {
        let mut surface = MemorySurface::new("x").with_viewport(8, 6);
        let frame = StaticFrame::new(Viewport::new(8, 6));
        surface.put_pixels(&frame);
        assert_eq!(surface.frames_drawn(), 0);
        surface.create_layer(Layer::StaticCanvas).unwrap();
        surface.fit_canvas(Viewport::new(8, 6));
        surface.put_pixels(&frame);
        assert_eq!(surface.frames_drawn(), 1);
    }
}
