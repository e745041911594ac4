//! VHS Horror: a timed effect scheduler for analog-horror page themes.
//!
//! # Architecture
//!
//! ```text
//! EffectScheduler (entry point)
//!   │
//!   ├── Timers<Task> ── virtual time, fed by advance(dt_ms)
//!   │     ├── static-render      (30 ms)
//!   │     ├── element/page/text corruption (jittered)
//!   │     ├── subliminal-rotate  (12 s)
//!   │     └── escalation-tick    (1 s) → SessionClock → Escalation gates
//!   │
//!   ├── Chance ── every probabilistic branch (rand, or scripted in tests)
//!   │
//!   ├── Surface ── layers, filters, text, title, canvas, overlays
//!   │     ├── MemorySurface (tests, CLI)
//!   │     └── DomSurface    (wasm)
//!   │
//!   └── AudioSession ── 40 Hz hum + looped static, opened on first input
//! ```
//!
//! # Features
//!
//! - `native` - tokio real-time driver, log subscriber, `vhs-horror` CLI
//! - `wasm` - browser host: DOM surface, Web Audio, `WasmTheme` export
//!
//! # Usage
//!
//! ```ignore
//! use vhs_horror::{EffectScheduler, MemorySurface, ThemeConfig};
//!
//! let config = ThemeConfig::new().with_static_intensity(0.2);
//! let mut theme = EffectScheduler::new(MemorySurface::new("Archive"), config);
//! theme.init();
//! theme.advance(60_000);
//! println!("{:?}", theme.stats());
//! theme.destroy();
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod audio;
pub mod clock;
pub mod core;
pub mod error;
pub mod surface;
pub mod theme;

// =============================================================================
// Native-only modules (tokio driver, log subscriber)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod runtime;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use audio::{AudioBackend, AudioLog, AudioSession, RecordingAudio};
pub use clock::{Cadence, Missed, SessionClock, TimerId, Timers};
pub use core::chance::{Chance, FixedChance, RandChance};
pub use core::noise::{StaticFrame, Viewport};
pub use error::{ThemeError, ThemeResult};
pub use surface::{
    Command, ElementId, ElementKind, Layer, MemorySurface, Overlay, Surface, SurfaceEvent,
    SurfaceSnapshot,
};
pub use theme::{EffectScheduler, EffectStats, TaskName, ThemeConfig};

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use runtime::{drive, install_signal_handlers, Shutdown};

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use wasm::{DomSurface, WasmTheme, WebAudio};
