//! WasmTheme: the effect scheduler exported to JavaScript
//!
//! # Usage from JavaScript
//!
//! ```javascript
//! import { WasmTheme } from 'vhs-horror';
//!
//! const theme = new WasmTheme({ staticIntensity: 0.2, enableAudio: true });
//! theme.init();
//!
//! let last = performance.now();
//! function frame(now) {
//!     theme.advance(now - last);
//!     last = now;
//!     requestAnimationFrame(frame);
//! }
//! requestAnimationFrame(frame);
//!
//! document.addEventListener('mousemove', e => theme.pointerMove(e.clientX, e.clientY));
//! document.addEventListener('click', () => theme.firstInput(), { once: true });
//! window.addEventListener('resize', () => theme.resize(innerWidth, innerHeight));
//! ```

use wasm_bindgen::prelude::*;

use super::audio::WebAudio;
use super::dom::DomSurface;
use super::log;
use crate::core::noise::Viewport;
use crate::surface::ElementKind;
use crate::theme::{EffectScheduler, ThemeConfig};

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WasmTheme {
    inner: EffectScheduler<DomSurface>,
    last_tick: Option<f64>,
    /// Sub-millisecond remainder carried to the next advance
    carry: f64,
}

#[wasm_bindgen]
impl WasmTheme {
    /// Create a theme over the current document. `options` is a plain object
    /// with the JavaScript option names; missing keys take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<WasmTheme, JsValue> {
        let config: ThemeConfig = if options.is_undefined() || options.is_null() {
            ThemeConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(js_err)?
        };
        config.validate().map_err(js_err)?;
        let surface = DomSurface::new().map_err(js_err)?;
        let inner = EffectScheduler::new(surface, config).with_audio(Box::new(WebAudio::new()));
        Ok(Self { inner, last_tick: None, carry: 0.0 })
    }

    #[wasm_bindgen]
    pub fn init(&mut self) {
        self.inner.init();
        log!("[WasmTheme] initialized, {} timers", self.inner.pending_timers());
    }

    #[wasm_bindgen]
    pub fn destroy(&mut self) {
        self.inner.destroy();
        log!("[WasmTheme] destroyed");
    }

    /// Feed elapsed time in ms
    #[wasm_bindgen]
    pub fn advance(&mut self, dt_ms: f64) {
        if dt_ms.is_nan() || dt_ms <= 0.0 {
            return;
        }
        let total = dt_ms + self.carry;
        let whole = total.floor();
        self.carry = total - whole;
        self.inner.advance(whole as u64);
    }

    /// Advance by the wall-clock time since the previous call, for hosts
    /// that drive the theme from `setInterval`
    #[wasm_bindgen]
    pub fn tick(&mut self) {
        let now = js_sys::Date::now();
        if let Some(last) = self.last_tick.replace(now) {
            self.advance(now - last);
        }
    }

    #[wasm_bindgen(js_name = "pointerMove")]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.inner.pointer_move(x, y);
    }

    #[wasm_bindgen]
    pub fn resize(&mut self, width: u32, height: u32) {
        self.inner.resize(Viewport::new(width, height));
    }

    #[wasm_bindgen(js_name = "firstInput")]
    pub fn first_input(&mut self) {
        self.inner.first_input();
    }

    /// Tag an element by id or selector. `kind` is one of `title`,
    /// `subtitle`, `card`, `button`, `corrupted-text`.
    #[wasm_bindgen(js_name = "applyToElement")]
    pub fn apply_to_element(&mut self, target: &str, kind: Option<String>) -> bool {
        let kind = kind
            .as_deref()
            .and_then(|k| k.parse::<ElementKind>().ok())
            .unwrap_or_default();
        self.inner.apply_to_element(target, kind)
    }

    #[wasm_bindgen(js_name = "corruptText")]
    pub fn corrupt_text(&mut self, text: &str, alt: bool) -> String {
        self.inner.corrupt_text(text, alt)
    }

    #[wasm_bindgen(js_name = "jumpScare")]
    pub fn jump_scare(&mut self) {
        self.inner.jump_scare();
    }

    #[wasm_bindgen(getter, js_name = "isInitialized")]
    pub fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    #[wasm_bindgen(getter, js_name = "elapsedMs")]
    pub fn elapsed_ms(&self) -> f64 {
        self.inner.elapsed_ms() as f64
    }

    /// Effect counters as a plain object
    #[wasm_bindgen]
    pub fn stats(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.inner.stats()).unwrap_or(JsValue::NULL)
    }
}
