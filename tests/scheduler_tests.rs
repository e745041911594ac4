//! Integration Tests: effect scheduler against the in-memory surface
//!
//! These tests verify:
//! 1. Lifecycle: idempotent init, complete teardown, re-init
//! 2. Transient mutations revert to the exact original state
//! 3. Subliminal rotation order and timing
//! 4. Escalation gates, jump scares and the pointer marker
//! 5. Degraded hosts: blocked layers, failing audio

use vhs_horror::core::catalog::{names, ELEMENT_FILTERS, PAGE_FILTERS, SCARE_TEXT};
use vhs_horror::{
    EffectScheduler, ElementId, ElementKind, FixedChance, Layer, MemorySurface, Overlay,
    RandChance, RecordingAudio, Surface, SurfaceEvent, ThemeConfig, Viewport,
};

fn theme(
    surface: MemorySurface,
    config: ThemeConfig,
    chance: FixedChance,
) -> EffectScheduler<MemorySurface> {
    EffectScheduler::new(surface, config).with_chance(Box::new(chance))
}

/// Card with a heading-free paragraph, the card carrying a pre-existing filter
fn page_with_card() -> (MemorySurface, ElementId, ElementId) {
    let mut surface = MemorySurface::new("Home");
    let card = surface.add_element("div", &["vhs-card"], "");
    let copy = surface.add_child(card, "p", "Tape 04");
    surface.set_filter(card, Some("sepia(1)"));
    surface.clear_journal();
    (surface, card, copy)
}

fn subliminal_text(theme: &EffectScheduler<MemorySurface>) -> Option<String> {
    let node = theme.surface().layer(Layer::Subliminal)?;
    theme.surface().text(node)
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn init_twice_equals_init_once() {
    let mut once = theme(MemorySurface::new("Home"), ThemeConfig::default(), FixedChance::never());
    once.init();

    let mut twice = theme(MemorySurface::new("Home"), ThemeConfig::default(), FixedChance::never());
    twice.init();
    twice.init();

    assert_eq!(once.surface().snapshot(), twice.surface().snapshot());
    assert_eq!(once.surface().journal(), twice.surface().journal());
    assert_eq!(once.pending_timers(), twice.pending_timers());
}

#[test]
fn init_creates_layers_for_enabled_features() {
    let mut t = theme(MemorySurface::new("Home"), ThemeConfig::default(), FixedChance::never());
    t.init();

    assert!(t.is_initialized());
    assert!(t.surface().themed());
    for layer in Layer::ALL {
        assert!(t.surface().layer(layer).is_some(), "missing {layer}");
    }
    // static, three corruption tasks, subliminal, escalation
    assert_eq!(t.pending_timers(), 6);

    let canvas = t.surface().layer(Layer::StaticCanvas).unwrap();
    assert_eq!(t.surface().node(canvas).unwrap().opacity, Some(0.12));
    assert_eq!(t.surface().canvas(), Some(Viewport::new(64, 48)));
}

#[test]
fn disabled_features_create_nothing() {
    let mut t = theme(MemorySurface::new("Home"), ThemeConfig::quiet(), FixedChance::never());
    t.init();

    assert!(t.surface().layer(Layer::StaticCanvas).is_none());
    assert!(t.surface().layer(Layer::Subliminal).is_none());
    assert!(t.surface().layer(Layer::CursorMarker).is_some());
    assert_eq!(t.pending_timers(), 0);
}

#[test]
fn destroy_leaves_nothing_behind() {
    let mut surface = MemorySurface::new("Home");
    let card = surface.add_element("div", &["vhs-card"], "");
    let copy = surface.add_child(card, "p", "Recovered footage");
    let audio = RecordingAudio::new(8_000);
    let log = audio.log();

    let mut t = EffectScheduler::new(surface, ThemeConfig::default())
        .with_chance(Box::new(RandChance::seeded(42)))
        .with_audio(Box::new(audio));
    t.init();
    t.first_input();
    assert!(t.audio_active());
    for step in 0..5_000u64 {
        t.advance(18);
        if step % 10 == 0 {
            t.pointer_move((step % 300) as f64, (step % 200) as f64);
        }
    }
    t.destroy();

    let surface = t.surface();
    for layer in Layer::ALL {
        assert!(surface.layer(layer).is_none(), "{layer} still present");
    }
    assert!(!surface.themed());
    assert!(surface.overlays().is_empty());
    assert_eq!(surface.title(), "Home");
    assert_eq!(surface.page_filter(), None);
    assert_eq!(surface.filter(card), None);
    assert_eq!(surface.text(copy).as_deref(), Some("Recovered footage"));
    assert_eq!(t.pending_timers(), 0);
    assert!(!t.is_initialized());
    assert!(!t.audio_active());
    assert!(log.borrow().closed);
}

#[test]
fn title_restored_to_value_at_construction() {
    let mut t = theme(
        MemorySurface::new("Home"),
        ThemeConfig::quiet().with_escalation(true),
        FixedChance::always(),
    );
    t.init();
    t.advance(25_000);
    assert_ne!(t.surface().title(), "Home");
    t.destroy();
    assert_eq!(t.surface().title(), "Home");
    assert_eq!(t.original_title(), "Home");
}

#[test]
fn reinit_after_destroy_reopens_audio() {
    let audio = RecordingAudio::new(100);
    let log = audio.log();
    let config = ThemeConfig::quiet().with_audio(true);
    let mut t = theme(MemorySurface::new("Home"), config, FixedChance::never())
        .with_audio(Box::new(audio));

    t.init();
    t.first_input();
    t.destroy();
    assert!(log.borrow().closed);

    t.init();
    t.first_input();
    assert!(t.audio_active());
    assert_eq!(t.tone_hz(), Some(40.0));
}

// =============================================================================
// Transient mutations
// =============================================================================

#[test]
fn glitches_revert_to_exact_original() {
    let (surface, card, copy) = page_with_card();
    let config = ThemeConfig::quiet().with_corruption(true);
    let mut t = theme(surface, config, FixedChance::always());
    t.init();
    let before = t.surface().snapshot();

    // Element glitch lands at 2000 ms and holds for 150 ms
    t.advance(2_100);
    assert_eq!(t.surface().filter(card).as_deref(), Some(ELEMENT_FILTERS[0]));
    t.advance(100);
    assert_eq!(t.surface().filter(card).as_deref(), Some("sepia(1)"));

    // Text glitch at 5000 ms, held 200 ms
    t.advance(2_850);
    assert_eq!(t.surface().text(copy).as_deref(), Some("███████"));

    // Page glitch at 8000 ms, held 80 ms
    t.advance(2_990);
    assert_eq!(t.surface().page_filter().as_deref(), Some(PAGE_FILTERS[0]));

    t.advance(960);
    assert_eq!(t.now_ms(), 9_000);
    assert_eq!(t.surface().snapshot(), before);
    assert_eq!(t.stats().element_glitches, 4);
    assert_eq!(t.stats().text_glitches, 1);
    assert_eq!(t.stats().page_glitches, 1);
}

#[test]
fn overlapping_glitches_keep_first_original() {
    let (surface, card, _) = page_with_card();
    let config = ThemeConfig::quiet().with_corruption(true).with_corruption_frequency(100);
    let mut t = theme(surface, config, FixedChance::always());
    t.init();

    // A new glitch every 100 ms, each held 150 ms: never reverts while running
    t.advance(1_000);
    assert_eq!(t.surface().filter(card).as_deref(), Some(ELEMENT_FILTERS[0]));
    assert_eq!(t.stats().element_glitches, 10);

    t.destroy();
    assert_eq!(t.surface().filter(card).as_deref(), Some("sepia(1)"));
}

#[test]
fn removed_element_is_skipped_on_revert() {
    let (surface, card, _) = page_with_card();
    let config = ThemeConfig::quiet().with_corruption(true);
    let mut t = theme(surface, config, FixedChance::always());
    t.init();
    t.advance(2_000);
    t.surface_mut().remove(card);
    t.advance(500);
    assert!(!t.surface().contains(card));
    t.destroy();
}

// =============================================================================
// Subliminal text
// =============================================================================

#[test]
fn subliminal_cycles_in_order_with_wraparound() {
    let messages = ["m0", "m1", "m2", "m3", "m4"];
    let config = ThemeConfig::quiet().with_subliminal(true).with_messages(messages);
    let mut t = theme(MemorySurface::new("Home"), config, FixedChance::never());
    t.init();

    let mut shown = vec![subliminal_text(&t).unwrap()];
    for _ in 0..12 {
        t.advance(12_000);
        shown.push(subliminal_text(&t).unwrap());
    }

    let expected: Vec<String> = (0..13).map(|i| messages[i % messages.len()].to_string()).collect();
    assert_eq!(shown, expected);
    assert_eq!(t.stats().subliminal_shown, 13);
}

#[test]
fn subliminal_a_b_scenario() {
    let config = ThemeConfig::new()
        .with_messages(["A", "B"])
        .with_static(false)
        .with_corruption(false)
        .with_escalation(false);
    let mut t = theme(MemorySurface::new("Home"), config, FixedChance::never());
    t.init();

    assert_eq!(subliminal_text(&t).as_deref(), Some("A"));
    t.advance(11_999);
    assert_eq!(subliminal_text(&t).as_deref(), Some("A"));
    t.advance(1);
    assert_eq!(subliminal_text(&t).as_deref(), Some("B"));
    t.advance(12_000);
    assert_eq!(subliminal_text(&t).as_deref(), Some("A"));
}

// =============================================================================
// Escalation and one-off effects
// =============================================================================

#[test]
fn title_gate_opens_after_twenty_seconds() {
    let config = ThemeConfig::quiet().with_escalation(true);
    let mut t = theme(MemorySurface::new("Home"), config, FixedChance::always());
    t.init();

    t.advance(20_000);
    assert_eq!(t.elapsed_ms(), 20_000);
    assert_eq!(t.stats().title_swaps, 0);
    assert_eq!(t.surface().title(), "Home");

    t.advance(1_000);
    assert_eq!(t.stats().title_swaps, 1);
    assert_ne!(t.surface().title(), "Home");

    t.advance(1_000);
    assert_eq!(t.stats().title_swaps, 2);
}

#[test]
fn escalation_never_fires_with_closed_odds() {
    let config = ThemeConfig::quiet().with_escalation(true);
    let mut t = theme(MemorySurface::new("Home"), config, FixedChance::never());
    t.init();
    t.advance(120_000);
    assert_eq!(t.stats().escalation_ticks, 120);
    assert_eq!(t.stats().title_swaps + t.stats().page_pulses + t.stats().jump_scares, 0);
    assert_eq!(t.surface().title(), "Home");
}

#[test]
fn jump_scares_do_not_coalesce() {
    let audio = RecordingAudio::new(100);
    let log = audio.log();
    let config = ThemeConfig::quiet().with_audio(true);
    let mut t = theme(MemorySurface::new("Home"), config, FixedChance::always())
        .with_audio(Box::new(audio));
    t.init();
    t.first_input();

    t.jump_scare();
    t.jump_scare();
    let scares = t.surface().overlays();
    assert_eq!(scares.len(), 2);
    assert!(scares
        .iter()
        .all(|(_, o)| **o == Overlay::Scare { text: SCARE_TEXT.to_string() }));
    let ids: Vec<ElementId> = scares.iter().map(|(id, _)| *id).collect();
    assert_eq!(t.tone_hz(), Some(80.0));

    t.advance(150);
    for id in &ids {
        assert_eq!(t.surface().node(*id).unwrap().opacity, Some(0.0));
    }
    t.advance(200);
    assert!(t.surface().overlays().is_empty());
    assert_eq!(t.tone_hz(), Some(80.0));

    t.advance(150);
    assert_eq!(t.tone_hz(), Some(40.0));
    assert_eq!(log.borrow().frequencies, vec![40.0, 80.0, 80.0, 40.0]);
    assert_eq!(t.stats().jump_scares, 2);
}

#[test]
fn pointer_marker_hide_is_rearmed() {
    let mut t = theme(MemorySurface::new("Home"), ThemeConfig::quiet(), FixedChance::always());
    t.init();
    let marker = t.surface().layer(Layer::CursorMarker).unwrap();

    t.pointer_move(100.0, 50.0);
    let node = t.surface().node(marker).unwrap();
    assert_eq!(node.opacity, Some(0.7));
    assert_eq!(node.position, Some((90.0, 40.0)));
    assert_eq!(t.surface().overlays().len(), 1);

    t.advance(900);
    t.pointer_move(120.0, 60.0);
    t.advance(200);
    assert_eq!(t.surface().node(marker).unwrap().opacity, Some(0.7));
    t.advance(800);
    assert_eq!(t.surface().node(marker).unwrap().opacity, Some(0.0));
    assert!(t.surface().overlays().is_empty());
    assert_eq!(t.stats().marker_reveals, 2);
    assert_eq!(t.stats().interference_marks, 2);
}

#[test]
fn interference_spawns_offset_overlay() {
    let mut t = theme(MemorySurface::new("Home"), ThemeConfig::quiet(), FixedChance::always());
    t.init();
    t.handle_event(SurfaceEvent::PointerMove { x: 40.0, y: 30.0 });
    let overlays = t.surface().overlays();
    assert_eq!(overlays.len(), 1);
    assert_eq!(*overlays[0].1, Overlay::Interference { x: 25.0, y: 15.0 });
    t.advance(600);
    assert!(t.surface().overlays().is_empty());
}

#[test]
fn events_before_init_are_ignored() {
    let audio = RecordingAudio::new(100);
    let log = audio.log();
    let mut t = theme(MemorySurface::new("Home"), ThemeConfig::default(), FixedChance::always())
        .with_audio(Box::new(audio));
    t.pointer_move(10.0, 10.0);
    t.first_input();
    assert!(t.surface().overlays().is_empty());
    assert!(!log.borrow().started);
}

#[test]
fn apply_to_title_adds_glitch_attributes_once() {
    let mut surface = MemorySurface::new("Home");
    let title = surface.add_element("h1", &[], "LOST");
    surface.set_element_id(title, "main-title");
    let mut t = theme(surface, ThemeConfig::quiet(), FixedChance::always());

    assert!(t.apply_to_element("#main-title", ElementKind::Title));
    let node = t.surface().node(title).unwrap();
    assert!(node.classes.iter().any(|c| c == "vhs-title"));
    let attr = |name: &str| node.attributes.get(name).map(String::as_str);
    assert_eq!(attr(names::GLITCH_TEXT_ATTR), Some("████"));
    assert_eq!(attr(names::GLITCH_ALT_ATTR), Some("████"));

    t.surface_mut().set_attribute(title, names::GLITCH_TEXT_ATTR, "custom");
    t.apply_to_element("main-title", ElementKind::Title);
    assert_eq!(t.surface().attribute(title, names::GLITCH_TEXT_ATTR).as_deref(), Some("custom"));

    assert!(!t.apply_to_element("#nowhere", ElementKind::Card));
}

#[test]
fn apply_to_button_only_tags() {
    let mut surface = MemorySurface::new("Home");
    let button = surface.add_element("button", &["play"], "PLAY");
    let mut t = theme(surface, ThemeConfig::quiet(), FixedChance::always());
    assert!(t.apply_to_element(".play", ElementKind::Button));
    let node = t.surface().node(button).unwrap();
    assert!(node.classes.iter().any(|c| c == "vhs-button"));
    assert!(node.attributes.is_empty());
}

// =============================================================================
// Degraded hosts
// =============================================================================

#[test]
fn blocked_canvas_skips_static_only() {
    let surface = MemorySurface::new("Home").block_layer(Layer::StaticCanvas);
    let config = ThemeConfig::quiet().with_static(true).with_subliminal(true);
    let mut t = theme(surface, config, FixedChance::never());
    t.init();

    assert!(t.is_initialized());
    assert!(t.surface().layer(Layer::StaticCanvas).is_none());
    assert!(t.surface().layer(Layer::Subliminal).is_some());
    t.advance(1_000);
    assert_eq!(t.stats().frames, 0);
}

#[test]
fn static_redraws_every_ninety_ms_and_follows_resize() {
    let config = ThemeConfig::quiet().with_static(true);
    let surface = MemorySurface::new("Home").with_viewport(16, 8);
    let mut t = theme(surface, config, FixedChance::never());
    t.init();

    t.advance(60);
    assert_eq!(t.surface().frames_drawn(), 0);
    t.advance(30);
    assert_eq!(t.surface().frames_drawn(), 1);

    t.handle_event(SurfaceEvent::Resize { width: 32, height: 12 });
    assert_eq!(t.surface().canvas(), Some(Viewport::new(32, 12)));
    t.advance(90);
    assert_eq!(t.surface().frames_drawn(), 2);
    assert_eq!(t.stats().frames, 2);
}

#[test]
fn long_gap_draws_one_static_frame() {
    let config = ThemeConfig::quiet().with_static(true).with_corruption(true);
    let (surface, card, _) = page_with_card();
    let mut t = theme(surface.with_viewport(16, 8), config, FixedChance::never());
    t.init();

    // A background tab handing back a whole minute at once
    t.advance(60_000);
    assert_eq!(t.surface().frames_drawn(), 1);
    assert_eq!(t.stats().frames, 1);
    assert_eq!(t.now_ms(), 60_000);

    // Glitches still replay in order; the last one lands at 60 000 ms
    assert_eq!(t.stats().element_glitches, 30);

    t.advance(200);
    assert_eq!(t.stats().frames, 2);
    assert_eq!(t.surface().filter(card).as_deref(), Some("sepia(1)"));
}

#[test]
fn failing_audio_is_not_retried() {
    let config = ThemeConfig::quiet().with_audio(true);
    let mut t = theme(MemorySurface::new("Home"), config, FixedChance::never())
        .with_audio(Box::new(RecordingAudio::failing()));
    t.init();
    t.first_input();
    assert!(!t.audio_active());
    t.first_input();
    assert!(!t.audio_active());
    t.jump_scare();
    assert_eq!(t.tone_hz(), None);
}

#[test]
fn audio_disabled_never_opens() {
    let audio = RecordingAudio::new(100);
    let log = audio.log();
    let mut t = theme(MemorySurface::new("Home"), ThemeConfig::quiet(), FixedChance::never())
        .with_audio(Box::new(audio));
    t.init();
    t.handle_event(SurfaceEvent::FirstInput);
    assert!(!t.audio_active());
    assert!(!log.borrow().started);
}
