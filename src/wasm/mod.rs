//! WASM module: the theme in a live browser page
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          WasmTheme (JS API)             │
//! │  init, destroy, advance, pointerMove,   │
//! │  resize, firstInput, applyToElement     │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │     EffectScheduler<DomSurface>         │
//! │  timers, holds, escalation              │
//! └────────┬───────────────────────┬────────┘
//!          │                       │
//! ┌────────▼─────────┐   ┌─────────▼────────┐
//! │   DomSurface     │   │    WebAudio      │
//! │  web-sys DOM     │   │  AudioContext    │
//! └──────────────────┘   └──────────────────┘
//! ```

mod audio;
mod dom;
mod theme;

pub use audio::WebAudio;
pub use dom::DomSurface;
pub use theme::WasmTheme;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
