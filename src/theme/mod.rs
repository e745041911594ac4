//! Theme - the effect scheduler
//!
//! Owns every timer, picks effect variants through [`Chance`], and escalates
//! with time on page. All output goes to a [`Surface`].
//!
//! # Tasks
//!
//! | Task | Feature flag | Cadence | Effect |
//! |------|--------------|---------|--------|
//! | static-render | `enableStatic` | 30 ms, draws every 90 ms | regenerate the static canvas |
//! | element-corrupt | `enableCorruption` | `frequency + U(0,4000)` | filter one themed element |
//! | page-corrupt | `enableCorruption` | `8000 + U(0,15000)` | filter the whole page |
//! | text-corrupt | `enableCorruption` | `5000 + U(0,10000)` | scramble one text element |
//! | subliminal-rotate | `enableSubliminal` | 12 s, first immediately | next message |
//! | escalation-tick | `enableEscalation` | 1 s | advance session clock, roll gates |
//!
//! # Transient Mutations
//!
//! Every filter, text or title change records the original value and a
//! one-shot reversal. If the same target is hit again before it reverts, the
//! first original is kept and the reversal is pushed back, so stacked glitches
//! still land on the true original. Teardown applies all pending reversals.
//!
//! # Catching Up
//!
//! A long `advance` (a background tab coming back) replays reversals and
//! glitches in due order, but static-render skips its missed periods and
//! draws a single frame.
//!
//! # Usage
//!
//! ```ignore
//! use vhs_horror::{EffectScheduler, MemorySurface, ThemeConfig};
//!
//! let mut theme = EffectScheduler::new(MemorySurface::new("Home"), ThemeConfig::default());
//! theme.init();
//! theme.advance(16);          // host reports elapsed time
//! theme.pointer_move(120.0, 80.0);
//! theme.destroy();
//! ```

mod config;
mod tasks;

pub use config::ThemeConfig;
pub use tasks::TaskName;

use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::audio::{AudioBackend, AudioSession};
use crate::clock::{Cadence, Missed, SessionClock, Timers, TimerId};
use crate::core::catalog::{
    names, odds, timing, visuals, CREEPY_TITLES, ELEMENT_FILTERS, PAGE_FILTERS, SCARE_TEXT,
};
use crate::core::chance::{Chance, RandChance};
use crate::core::corrupt::{corrupt_text, glitch_text};
use crate::core::escalation::Escalation;
use crate::core::noise::{StaticFrame, Viewport};
use crate::surface::{ElementId, ElementKind, Layer, Overlay, Surface, SurfaceEvent};
use tasks::{Hold, Target, Task};

/// Counters of what the scheduler has done since construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectStats {
    pub frames: u64,
    pub element_glitches: u64,
    pub page_glitches: u64,
    pub text_glitches: u64,
    pub subliminal_shown: u64,
    pub escalation_ticks: u64,
    pub title_swaps: u64,
    pub page_pulses: u64,
    pub jump_scares: u64,
    pub interference_marks: u64,
    pub marker_reveals: u64,
}

/// The effect scheduler.
pub struct EffectScheduler<S: Surface> {
    config: ThemeConfig,
    surface: S,
    chance: Box<dyn Chance>,
    timers: Timers<Task>,
    clock: SessionClock,
    holds: HashMap<Target, Hold>,
    audio_backend: Option<Box<dyn AudioBackend>>,
    audio: Option<AudioSession>,
    audio_attempted: bool,
    frame: Option<StaticFrame>,
    last_redraw_ms: u64,
    subliminal_index: usize,
    marker_hide: Option<TimerId>,
    tone_restore: Option<TimerId>,
    original_title: String,
    initialized: bool,
    stats: EffectStats,
}

impl<S: Surface> EffectScheduler<S> {
    /// Create a scheduler over `surface`. The document title is captured now
    /// and restored at teardown.
    pub fn new(surface: S, config: ThemeConfig) -> Self {
        let original_title = surface.title();
        Self {
            config,
            surface,
            chance: Box::new(RandChance::from_entropy()),
            timers: Timers::new(),
            clock: SessionClock::new(timing::ESCALATION_TICK_MS),
            holds: HashMap::new(),
            audio_backend: None,
            audio: None,
            audio_attempted: false,
            frame: None,
            last_redraw_ms: 0,
            subliminal_index: 0,
            marker_hide: None,
            tone_restore: None,
            original_title,
            initialized: false,
            stats: EffectStats::default(),
        }
    }

    /// Replace the randomness source (seeded or scripted for tests)
    pub fn with_chance(mut self, chance: Box<dyn Chance>) -> Self {
        self.chance = chance;
        self
    }

    /// Backend opened on the first user input when audio is enabled
    pub fn with_audio(mut self, backend: Box<dyn AudioBackend>) -> Self {
        self.audio_backend = Some(backend);
        self
    }

    pub fn config(&self) -> &ThemeConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Session clock: time on page as counted by escalation ticks
    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    /// Registry time: total time reported through `advance`
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn original_title(&self) -> &str {
        &self.original_title
    }

    pub fn audio_active(&self) -> bool {
        self.audio.is_some()
    }

    pub fn tone_hz(&self) -> Option<f32> {
        self.audio.as_ref().map(AudioSession::tone_hz)
    }

    pub fn stats(&self) -> &EffectStats {
        &self.stats
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create the persistent layers and start every enabled task.
    /// Calling it again while initialized does nothing.
    pub fn init(&mut self) {
        if self.initialized {
            debug!("EffectScheduler::init: already initialized");
            return;
        }

        self.surface.set_themed(true);
        let persistent =
            [Layer::StaticOverlay, Layer::Scanlines, Layer::Background, Layer::DynamicStyles];
        for layer in persistent {
            self.ensure_layer(layer);
        }
        let canvas = self
            .config
            .enable_static
            .then(|| self.ensure_layer(Layer::StaticCanvas))
            .flatten();
        let subliminal = self
            .config
            .enable_subliminal
            .then(|| self.ensure_layer(Layer::Subliminal))
            .flatten();
        if let Some(marker) = self.ensure_layer(Layer::CursorMarker) {
            self.surface.set_opacity(marker, 0.0);
        }

        self.clock.reset();

        if let Some(canvas) = canvas {
            self.start_static(canvas);
        }
        if self.config.enable_corruption {
            self.start_corruption();
        }
        if subliminal.is_some() {
            self.start_subliminal();
        }
        if self.config.enable_escalation {
            self.every(Cadence::Fixed(timing::ESCALATION_TICK_MS), TaskName::EscalationTick);
        }

        self.initialized = true;
        info!(
            static_noise = canvas.is_some(),
            corruption = self.config.enable_corruption,
            subliminal = subliminal.is_some(),
            escalation = self.config.enable_escalation,
            timers = self.timers.len(),
            "Theme initialized"
        );
    }

    /// Remove every layer, stop every timer, close audio and put the title
    /// back. Pending reversals are applied first.
    pub fn destroy(&mut self) {
        let pending = self.timers.drain_once();
        debug!(pending = pending.len(), "EffectScheduler::destroy: settling");
        for task in pending {
            self.settle(task);
        }
        self.holds.clear();
        self.marker_hide = None;
        self.tone_restore = None;

        for layer in Layer::ALL {
            self.surface.remove_layer(layer);
        }
        self.surface.set_themed(false);

        if let Some(audio) = self.audio.take() {
            self.audio_backend = Some(audio.close());
        }
        self.audio_attempted = false;

        self.surface.set_title(&self.original_title);

        self.frame = None;
        self.last_redraw_ms = 0;
        self.subliminal_index = 0;
        self.clock.reset();
        self.initialized = false;
        info!("Theme destroyed");
    }

    /// Report elapsed host time; runs every task that fell due, in order.
    pub fn advance(&mut self, dt_ms: u64) {
        let until = self.timers.now_ms() + dt_ms;
        while let Some((_, task)) = self.timers.pop_due(until, self.chance.as_mut()) {
            self.run(task);
        }
        self.timers.settle_to(until);
    }

    pub fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::PointerMove { x, y } => self.pointer_move(x, y),
            SurfaceEvent::Resize { width, height } => self.resize(Viewport::new(width, height)),
            SurfaceEvent::FirstInput => self.first_input(),
        }
    }

    // =========================================================================
    // Host events
    // =========================================================================

    /// First click or pointer movement. Opens audio once.
    pub fn first_input(&mut self) {
        if !self.initialized || !self.config.enable_audio || self.audio_attempted {
            return;
        }
        self.audio_attempted = true;

        let Some(backend) = self.audio_backend.take() else {
            debug!("No audio backend, ambient audio skipped");
            return;
        };
        match AudioSession::open(backend, self.chance.as_mut()) {
            Ok(session) => self.audio = Some(session),
            Err(e) => warn!(error = %e, "Audio context not available"),
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if !self.initialized {
            return;
        }
        self.first_input();

        if self.chance.fires(odds::INTERFERENCE) {
            self.interference(x, y);
        }

        let Some(marker) = self.surface.layer(Layer::CursorMarker) else { return };
        self.surface.move_to(marker, x - visuals::MARKER_OFFSET, y - visuals::MARKER_OFFSET);
        if self.chance.fires(odds::MARKER_SHOW) {
            self.surface.set_opacity(marker, visuals::MARKER_VISIBLE);
            if let Some(pending) = self.marker_hide.take() {
                self.timers.cancel(pending);
            }
            let show = timing::MARKER_SHOW_MS + self.chance.jitter(timing::MARKER_SHOW_SPREAD_MS);
            self.marker_hide = Some(self.timers.once(show, Task::HideMarker));
            self.stats.marker_reveals += 1;
        }
    }

    /// Viewport changed; the static canvas re-fits.
    pub fn resize(&mut self, viewport: Viewport) {
        if let Some(frame) = self.frame.as_mut() {
            frame.resize(viewport);
            self.surface.fit_canvas(viewport);
            debug!(width = viewport.width, height = viewport.height, "Static canvas resized");
        }
    }

    // =========================================================================
    // One-off effects
    // =========================================================================

    /// Full-screen scare. Never coalesces with a scare already on screen.
    pub fn jump_scare(&mut self) {
        let overlay = Overlay::Scare { text: SCARE_TEXT.to_string() };
        let el = match self.surface.spawn_overlay(&overlay) {
            Ok(el) => el,
            Err(e) => {
                warn!(error = %e, "Jump scare skipped");
                return;
            }
        };
        self.surface.set_opacity(el, visuals::SCARE_OPACITY);
        self.timers.once(timing::SCARE_HOLD_MS, Task::ScareFade(el));
        self.stats.jump_scares += 1;
        info!(%el, "Jump scare");

        if let Some(audio) = self.audio.as_mut() {
            audio.intensify(2.0);
            if let Some(pending) = self.tone_restore.take() {
                self.timers.cancel(pending);
            }
            self.tone_restore = Some(self.timers.once(timing::SCARE_TONE_MS, Task::RestoreTone));
        }
    }

    /// Tag an element (`#id`, `.class` or bare id) with a themed role.
    /// Returns false when the target does not exist.
    pub fn apply_to_element(&mut self, target: &str, kind: ElementKind) -> bool {
        match self.surface.find(target) {
            Some(el) => {
                self.apply_to(el, kind);
                true
            }
            None => {
                debug!(target, "apply_to_element: no such element");
                false
            }
        }
    }

    pub fn apply_to(&mut self, el: ElementId, kind: ElementKind) {
        if !self.surface.contains(el) {
            return;
        }
        self.surface.add_class(el, kind.class());
        if kind != ElementKind::Title {
            return;
        }
        let text = self.surface.text(el).unwrap_or_default();
        for (attr, alt) in [(names::GLITCH_TEXT_ATTR, false), (names::GLITCH_ALT_ATTR, true)] {
            if self.surface.attribute(el, attr).is_none() {
                let corrupted = corrupt_text(&text, alt, self.chance.as_mut());
                self.surface.set_attribute(el, attr, &corrupted);
            }
        }
    }

    /// Corrupted copy of `text` for glitch attributes. `alt` is denser.
    pub fn corrupt_text(&mut self, text: &str, alt: bool) -> String {
        corrupt_text(text, alt, self.chance.as_mut())
    }

    // =========================================================================
    // Task setup
    // =========================================================================

    fn ensure_layer(&mut self, layer: Layer) -> Option<ElementId> {
        if let Some(el) = self.surface.layer(layer) {
            return Some(el);
        }
        match self.surface.create_layer(layer) {
            Ok(el) => Some(el),
            Err(e) => {
                warn!(%layer, error = %e, "Layer unavailable, feature skipped");
                None
            }
        }
    }

    fn every(&mut self, cadence: Cadence, name: TaskName) -> TimerId {
        debug!(task = %name, ?cadence, "Task started");
        self.timers.every(cadence, Task::Recurring(name), self.chance.as_mut())
    }

    fn start_static(&mut self, canvas: ElementId) {
        let viewport = self.surface.viewport();
        self.surface.set_opacity(canvas, self.config.static_intensity);
        self.surface.fit_canvas(viewport);
        self.frame = Some(StaticFrame::new(viewport));
        self.last_redraw_ms = self.timers.now_ms();
        let cadence = Cadence::Fixed(timing::STATIC_TICK_MS);
        debug!(task = %TaskName::StaticRender, ?cadence, "Task started");
        self.timers.every_with(
            cadence,
            Missed::Skip,
            Task::Recurring(TaskName::StaticRender),
            self.chance.as_mut(),
        );
    }

    fn start_corruption(&mut self) {
        self.every(
            Cadence::Jittered {
                base_ms: self.config.corruption_frequency,
                spread_ms: timing::ELEMENT_SPREAD_MS,
            },
            TaskName::ElementCorrupt,
        );
        self.every(
            Cadence::Jittered { base_ms: timing::PAGE_BASE_MS, spread_ms: timing::PAGE_SPREAD_MS },
            TaskName::PageCorrupt,
        );
        self.every(
            Cadence::Jittered { base_ms: timing::TEXT_BASE_MS, spread_ms: timing::TEXT_SPREAD_MS },
            TaskName::TextCorrupt,
        );
    }

    fn start_subliminal(&mut self) {
        if self.config.subliminal_messages.is_empty() {
            warn!("No subliminal messages configured");
            return;
        }
        self.subliminal_index = 0;
        self.rotate_subliminal();
        self.every(Cadence::Fixed(timing::SUBLIMINAL_MS), TaskName::SubliminalRotate);
    }

    // =========================================================================
    // Task bodies
    // =========================================================================

    fn run(&mut self, task: Task) {
        match task {
            Task::Recurring(name) => match name {
                TaskName::StaticRender => self.render_static(),
                TaskName::ElementCorrupt => self.corrupt_element(),
                TaskName::PageCorrupt => self.page_glitch(),
                TaskName::TextCorrupt => self.corrupt_text_element(),
                TaskName::SubliminalRotate => self.rotate_subliminal(),
                TaskName::EscalationTick => self.escalate(),
            },
            Task::Revert(target) => self.revert(target),
            Task::ScareFade(el) => {
                if self.surface.contains(el) {
                    self.surface.set_opacity(el, 0.0);
                    self.timers.once(timing::SCARE_FADE_MS, Task::ScareRemove(el));
                }
            }
            Task::ScareRemove(el) | Task::RemoveInterference(el) => {
                if self.surface.contains(el) {
                    self.surface.remove(el);
                }
            }
            Task::RestoreTone => {
                self.tone_restore = None;
                if let Some(audio) = self.audio.as_mut() {
                    audio.restore();
                }
            }
            Task::HideMarker => {
                self.marker_hide = None;
                if let Some(marker) = self.surface.layer(Layer::CursorMarker) {
                    self.surface.set_opacity(marker, 0.0);
                }
            }
        }
    }

    /// Teardown variant of `run`: put things back, start nothing new.
    fn settle(&mut self, task: Task) {
        match task {
            Task::Revert(target) => self.revert(target),
            Task::ScareFade(el) | Task::ScareRemove(el) | Task::RemoveInterference(el) => {
                if self.surface.contains(el) {
                    self.surface.remove(el);
                }
            }
            Task::RestoreTone => {
                if let Some(audio) = self.audio.as_mut() {
                    audio.restore();
                }
            }
            Task::Recurring(_) | Task::HideMarker => {}
        }
    }

    fn render_static(&mut self) {
        let now = self.timers.now_ms();
        let redraw_ms = timing::STATIC_TICK_MS * timing::STATIC_REDRAW_EVERY;
        if now.saturating_sub(self.last_redraw_ms) < redraw_ms {
            return;
        }
        self.last_redraw_ms = now;
        if self.surface.layer(Layer::StaticCanvas).is_none() {
            return;
        }
        if let Some(frame) = self.frame.as_mut() {
            let drawn = frame.regenerate(self.chance.as_mut());
            if let Some((x, y)) = drawn.blotch {
                debug!(x, y, "Face in the static");
            }
            self.surface.put_pixels(frame);
            self.stats.frames += 1;
        }
    }

    fn corrupt_element(&mut self) {
        let elements = self.surface.themed_elements();
        if elements.is_empty() {
            return;
        }
        let el = elements[self.chance.pick(elements.len())];
        let preset = ELEMENT_FILTERS[self.chance.pick(ELEMENT_FILTERS.len())];
        let original = self.surface.filter(el);
        self.surface.set_filter(el, Some(preset));

        let hold = timing::ELEMENT_HOLD_MS + self.chance.jitter(timing::ELEMENT_HOLD_SPREAD_MS);
        self.hold(Target::ElementFilter(el), original, hold);
        self.stats.element_glitches += 1;
        debug!(%el, preset, hold, "Element glitch");
    }

    /// Page-wide glitch; shared by its own task and the escalation pulse.
    fn page_glitch(&mut self) {
        let preset = PAGE_FILTERS[self.chance.pick(PAGE_FILTERS.len())];
        let original = self.surface.page_filter();
        self.surface.set_page_filter(Some(preset));

        let hold = timing::PAGE_HOLD_MS + self.chance.jitter(timing::PAGE_HOLD_SPREAD_MS);
        self.hold(Target::PageFilter, original, hold);
        self.stats.page_glitches += 1;
        debug!(preset, hold, "Page glitch");
    }

    fn corrupt_text_element(&mut self) {
        let elements = self.surface.text_elements();
        if elements.is_empty() {
            return;
        }
        let el = elements[self.chance.pick(elements.len())];
        let Some(current) = self.surface.text(el) else { return };

        // Scramble the true original if an earlier glitch is still showing
        let source = self
            .holds
            .get(&Target::Text(el))
            .and_then(|h| h.original.clone())
            .unwrap_or_else(|| current.clone());
        let corrupted = glitch_text(&source, self.chance.as_mut());
        self.surface.set_text(el, &corrupted);

        let hold = timing::TEXT_HOLD_MS + self.chance.jitter(timing::TEXT_HOLD_SPREAD_MS);
        self.hold(Target::Text(el), Some(current), hold);
        self.stats.text_glitches += 1;
        debug!(%el, hold, "Text glitch");
    }

    fn rotate_subliminal(&mut self) {
        let Some(node) = self.surface.layer(Layer::Subliminal) else { return };
        let messages = &self.config.subliminal_messages;
        if messages.is_empty() {
            return;
        }
        let message = messages[self.subliminal_index % messages.len()].clone();
        self.subliminal_index = (self.subliminal_index + 1) % messages.len();
        self.surface.set_text(node, &message);
        self.stats.subliminal_shown += 1;
    }

    fn escalate(&mut self) {
        let elapsed = self.clock.tick();
        self.stats.escalation_ticks += 1;
        let outcome = Escalation::evaluate(elapsed, self.chance.as_mut());
        if outcome.any() {
            debug!(elapsed, ?outcome, "Escalation");
        }
        if outcome.retitle {
            self.swap_title();
        }
        if outcome.page_pulse {
            self.stats.page_pulses += 1;
            self.page_glitch();
        }
        if outcome.jump_scare {
            self.jump_scare();
        }
    }

    fn swap_title(&mut self) {
        let choice = self.chance.pick(CREEPY_TITLES.len() + 1);
        let title = CREEPY_TITLES
            .get(choice)
            .map(|t| t.to_string())
            .unwrap_or_else(|| self.original_title.clone());
        self.surface.set_title(&title);

        let hold = timing::TITLE_HOLD_MS + self.chance.jitter(timing::TITLE_HOLD_SPREAD_MS);
        self.hold(Target::Title, Some(self.original_title.clone()), hold);
        self.stats.title_swaps += 1;
        debug!(%title, hold, "Title swapped");
    }

    fn interference(&mut self, x: f64, y: f64) {
        let overlay = Overlay::Interference {
            x: x - visuals::INTERFERENCE_OFFSET,
            y: y - visuals::INTERFERENCE_OFFSET,
        };
        match self.surface.spawn_overlay(&overlay) {
            Ok(el) => {
                self.timers.once(timing::INTERFERENCE_MS, Task::RemoveInterference(el));
                self.stats.interference_marks += 1;
            }
            Err(e) => debug!(error = %e, "Interference skipped"),
        }
    }

    // =========================================================================
    // Holds
    // =========================================================================

    /// Schedule the reversal of `target`. A target already held keeps its
    /// first original; only the reversal time moves.
    fn hold(&mut self, target: Target, original: Option<String>, hold_ms: u64) {
        let timer = self.timers.once(hold_ms, Task::Revert(target));
        match self.holds.entry(target) {
            Entry::Occupied(mut held) => {
                self.timers.cancel(held.get().timer);
                held.get_mut().timer = timer;
            }
            Entry::Vacant(slot) => {
                slot.insert(Hold { original, timer });
            }
        }
    }

    fn revert(&mut self, target: Target) {
        let Some(hold) = self.holds.remove(&target) else { return };
        match target {
            Target::ElementFilter(el) => {
                if self.surface.contains(el) {
                    self.surface.set_filter(el, hold.original.as_deref());
                }
            }
            Target::PageFilter => self.surface.set_page_filter(hold.original.as_deref()),
            Target::Text(el) => {
                if self.surface.contains(el) {
                    self.surface.set_text(el, hold.original.as_deref().unwrap_or_default());
                }
            }
            Target::Title => {
                let title = hold.original.unwrap_or_else(|| self.original_title.clone());
                self.surface.set_title(&title);
            }
        }
    }
}
