//! DomSurface: the live browser document as a [`Surface`]
//!
//! Element handles are kept in a registry beside the document, so themed
//! pages are not stamped with bookkeeping attributes. Elements the page
//! detaches are pruned on every query, and teardown clears the registry.

use js_sys::Map;
use std::cell::RefCell;
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{
    CanvasRenderingContext2d, CssStyleDeclaration, Document, Element, HtmlCanvasElement,
    HtmlElement, ImageData, Window,
};

use crate::core::catalog::{names, selectors};
use crate::core::noise::{StaticFrame, Viewport};
use crate::error::{ThemeError, ThemeResult};
use crate::surface::{ElementId, Layer, Overlay, Registry, Surface};

const CANVAS_CLASS: &str = "vhs-horror-static";

const DYNAMIC_CSS: &str = r#"
.vhs-horror-static {
    position: fixed; top: 0; left: 0; width: 100%; height: 100%;
    pointer-events: none; z-index: -2; opacity: 0.12;
}
@keyframes vhs-fadeOut {
    0% { opacity: 1; transform: scale(1); }
    100% { opacity: 0; transform: scale(0.3) translateY(-10px); }
}
.vhs-cursor-eye {
    position: fixed; width: 20px; height: 20px;
    background: radial-gradient(circle, #ff0000 2px, transparent 3px, #333 8px, transparent 9px);
    border-radius: 50%; pointer-events: none; z-index: 9999;
    opacity: 0; transition: opacity 0.3s ease;
}
"#;

const SCARE_CSS: &str = "position: fixed; top: 0; left: 0; width: 100%; height: 100%; \
    background: #ff0000; z-index: 99999; opacity: 0; pointer-events: none; font-size: 4rem; \
    color: #000; display: flex; align-items: center; justify-content: center; \
    font-family: VT323, monospace;";

/// Layers looked up by id rather than class
fn by_id(layer: Layer) -> bool {
    matches!(layer, Layer::StaticCanvas | Layer::Subliminal | Layer::DynamicStyles)
}

fn layer_selector(layer: Layer) -> String {
    if by_id(layer) {
        format!("#{}", layer.name())
    } else {
        format!(".{}", layer.name())
    }
}

/// Element handles: `ElementId -> Element` in Rust, `Element -> id` in a JS
/// `Map`, which keys objects by identity.
struct Handles {
    nodes: Registry<Element>,
    index: Map,
}

impl Handles {
    fn new() -> Self {
        Self { nodes: Registry::new(), index: Map::new() }
    }

    fn lookup(&self, element: &Element) -> Option<ElementId> {
        self.index.get(element.as_ref()).as_f64().map(|id| ElementId(id as u64))
    }

    fn insert(&mut self, element: Element) -> ElementId {
        let key: JsValue = element.clone().into();
        let id = self.nodes.insert(element);
        self.index.set(&key, &JsValue::from_f64(id.0 as f64));
        id
    }

    fn remove(&mut self, el: ElementId) {
        if let Some(element) = self.nodes.remove(el) {
            self.index.delete(element.as_ref());
        }
    }

    fn prune_detached(&mut self) {
        for element in self.nodes.prune(|e| e.is_connected()) {
            self.index.delete(element.as_ref());
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }
}

pub struct DomSurface {
    window: Window,
    document: Document,
    handles: RefCell<Handles>,
}

impl DomSurface {
    pub fn new() -> ThemeResult<Self> {
        let window = web_sys::window().ok_or_else(|| ThemeError::ElementMissing("window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| ThemeError::ElementMissing("document".into()))?;
        Ok(Self { window, document, handles: RefCell::new(Handles::new()) })
    }

    /// Handle for `element`, registering it on first sight
    fn handle(&self, element: Element) -> ElementId {
        let mut handles = self.handles.borrow_mut();
        match handles.lookup(&element) {
            Some(id) => id,
            None => handles.insert(element),
        }
    }

    fn element(&self, el: ElementId) -> Option<Element> {
        self.handles.borrow().nodes.get(el).cloned()
    }

    fn style(&self, el: ElementId) -> Option<CssStyleDeclaration> {
        self.element(el)?.dyn_into::<HtmlElement>().ok().map(|e| e.style())
    }

    fn body(&self) -> Option<HtmlElement> {
        self.document.body()
    }

    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        let Ok(list) = self.document.query_selector_all(selector) else { return Vec::new() };
        self.handles.borrow_mut().prune_detached();
        let body = self.body();
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .filter(|e| body.as_ref().map_or(true, |b| !b.is_same_node(Some(e))))
            .map(|e| self.handle(e))
            .collect()
    }

    fn canvas(&self) -> Option<HtmlCanvasElement> {
        let el = self.layer(Layer::StaticCanvas)?;
        self.element(el)?.dyn_into::<HtmlCanvasElement>().ok()
    }

    fn create(&self, tag: &str) -> ThemeResult<Element> {
        self.document
            .create_element(tag)
            .map_err(|e| ThemeError::ElementMissing(format!("{tag}: {e:?}")))
    }
}

fn set_style(style: &CssStyleDeclaration, property: &str, value: Option<&str>) {
    let _ = match value {
        Some(v) => style.set_property(property, v),
        None => style.remove_property(property).map(|_| ()),
    };
}

fn read_style(style: &CssStyleDeclaration, property: &str) -> Option<String> {
    style.get_property_value(property).ok().filter(|v| !v.is_empty())
}

impl Surface for DomSurface {
    fn layer(&self, layer: Layer) -> Option<ElementId> {
        let element = self.document.query_selector(&layer_selector(layer)).ok()??;
        Some(self.handle(element))
    }

    fn create_layer(&mut self, layer: Layer) -> ThemeResult<ElementId> {
        if let Some(existing) = self.layer(layer) {
            return Ok(existing);
        }
        let unavailable = || ThemeError::LayerUnavailable(layer);
        let element = match layer {
            Layer::DynamicStyles => {
                let style = self.create("style")?;
                style.set_id(names::DYNAMIC_STYLES);
                style.set_text_content(Some(DYNAMIC_CSS));
                let head = self.document.head().ok_or_else(unavailable)?;
                head.append_child(&style).map_err(|_| unavailable())?;
                style
            }
            Layer::StaticCanvas => {
                let canvas = self.create("canvas")?;
                canvas.set_id(names::STATIC_CANVAS);
                canvas.set_class_name(CANVAS_CLASS);
                canvas
            }
            Layer::Subliminal => {
                let div = self.create("div")?;
                div.set_id(names::SUBLIMINAL);
                div.set_class_name(names::SUBLIMINAL);
                div
            }
            other => {
                let div = self.create("div")?;
                div.set_class_name(other.name());
                div
            }
        };
        if layer != Layer::DynamicStyles {
            let body = self.body().ok_or_else(unavailable)?;
            body.append_child(&element).map_err(|_| unavailable())?;
        }
        Ok(self.handle(element))
    }

    fn remove_layer(&mut self, layer: Layer) {
        if let Some(el) = self.layer(layer) {
            self.remove(el);
        }
    }

    fn set_themed(&mut self, on: bool) {
        if !on {
            self.handles.borrow_mut().clear();
        }
        let Some(body) = self.body() else { return };
        let classes = body.class_list();
        let _ = if on {
            classes.add_1(names::THEME_CLASS)
        } else {
            classes.remove_1(names::THEME_CLASS)
        };
    }

    fn themed_elements(&self) -> Vec<ElementId> {
        self.query_all(selectors::THEMED)
    }

    fn text_elements(&self) -> Vec<ElementId> {
        self.query_all(selectors::TEXT)
    }

    fn contains(&self, el: ElementId) -> bool {
        self.element(el).is_some_and(|e| e.is_connected())
    }

    fn find(&self, target: &str) -> Option<ElementId> {
        let element = if target.starts_with('#') || target.starts_with('.') {
            self.document.query_selector(target).ok()?
        } else {
            self.document.get_element_by_id(target)
        }?;
        Some(self.handle(element))
    }

    fn filter(&self, el: ElementId) -> Option<String> {
        read_style(&self.style(el)?, "filter")
    }

    fn set_filter(&mut self, el: ElementId, filter: Option<&str>) {
        if let Some(style) = self.style(el) {
            set_style(&style, "filter", filter);
        }
    }

    fn page_filter(&self) -> Option<String> {
        read_style(&self.body()?.style(), "filter")
    }

    fn set_page_filter(&mut self, filter: Option<&str>) {
        if let Some(body) = self.body() {
            set_style(&body.style(), "filter", filter);
        }
    }

    fn text(&self, el: ElementId) -> Option<String> {
        self.element(el)?.text_content()
    }

    fn set_text(&mut self, el: ElementId, text: &str) {
        if let Some(element) = self.element(el) {
            element.set_text_content(Some(text));
        }
    }

    fn title(&self) -> String {
        self.document.title()
    }

    fn set_title(&mut self, title: &str) {
        self.document.set_title(title);
    }

    fn viewport(&self) -> Viewport {
        let size =
            |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
        Viewport::new(size(self.window.inner_width()), size(self.window.inner_height()))
    }

    fn fit_canvas(&mut self, viewport: Viewport) {
        if let Some(canvas) = self.canvas() {
            canvas.set_width(viewport.width);
            canvas.set_height(viewport.height);
        }
    }

    fn put_pixels(&mut self, frame: &StaticFrame) {
        let Some(canvas) = self.canvas() else { return };
        if canvas.width() as usize != frame.width() || canvas.height() as usize != frame.height() {
            return;
        }
        let Ok(Some(ctx)) = canvas.get_context("2d") else { return };
        let Ok(ctx) = ctx.dyn_into::<CanvasRenderingContext2d>() else { return };
        let Ok(image) = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(frame.as_rgba()),
            frame.width() as u32,
            frame.height() as u32,
        ) else {
            return;
        };
        let _ = ctx.put_image_data(&image, 0.0, 0.0);
    }

    fn spawn_overlay(&mut self, overlay: &Overlay) -> ThemeResult<ElementId> {
        let div = self.create("div")?;
        let css = match overlay {
            Overlay::Interference { x, y } => format!(
                "position: fixed; left: {x}px; top: {y}px; width: 30px; height: 30px; \
                 background: rgba(85, 85, 85, 0.4); pointer-events: none; z-index: 999; \
                 animation: vhs-fadeOut 0.6s forwards; border-radius: 50%;"
            ),
            Overlay::Scare { text } => {
                div.set_text_content(Some(text));
                SCARE_CSS.to_string()
            }
        };
        div.set_attribute("style", &css)
            .map_err(|e| ThemeError::ElementMissing(format!("overlay style: {e:?}")))?;
        let body = self.body().ok_or_else(|| ThemeError::ElementMissing("body".into()))?;
        body.append_child(&div)
            .map_err(|e| ThemeError::ElementMissing(format!("overlay: {e:?}")))?;
        Ok(self.handle(div))
    }

    fn set_opacity(&mut self, el: ElementId, opacity: f32) {
        if let Some(style) = self.style(el) {
            set_style(&style, "opacity", Some(&opacity.to_string()));
        }
    }

    fn move_to(&mut self, el: ElementId, x: f64, y: f64) {
        if let Some(style) = self.style(el) {
            set_style(&style, "left", Some(&format!("{x}px")));
            set_style(&style, "top", Some(&format!("{y}px")));
        }
    }

    fn remove(&mut self, el: ElementId) {
        if let Some(element) = self.element(el) {
            element.remove();
        }
        self.handles.borrow_mut().remove(el);
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        if let Some(element) = self.element(el) {
            let _ = element.class_list().add_1(class);
        }
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.element(el)?.get_attribute(name)
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(element) = self.element(el) {
            let _ = element.set_attribute(name, value);
        }
    }
}
