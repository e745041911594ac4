//! Catalog of names, presets and timings used by the effects
//!
//! Centralized registry for all class names, filter presets and delays.
//! Presentation data lives here so the scheduler only deals in rules.

/// Class and id names of the persistent layers and themed markers
pub mod names {
    pub const THEME_CLASS: &str = "vhs-theme";
    pub const STATIC_OVERLAY: &str = "vhs-static";
    pub const SCANLINES: &str = "vhs-lines";
    pub const BACKGROUND: &str = "vhs-horror-bg";
    pub const STATIC_CANVAS: &str = "vhs-static-canvas";
    pub const SUBLIMINAL: &str = "vhs-subliminal";
    pub const CURSOR_MARKER: &str = "vhs-cursor-eye";
    pub const DYNAMIC_STYLES: &str = "vhs-dynamic-css";

    pub const GLITCH_TEXT_ATTR: &str = "data-glitch-text";
    pub const GLITCH_ALT_ATTR: &str = "data-glitch-alt";
}

/// Selectors the DOM surface uses to find themed elements
pub mod selectors {
    pub const THEMED: &str = ".vhs-card, .vhs-title, .vhs-subtitle, [class*=\"vhs-\"]";
    pub const TEXT: &str = concat!(
        ".vhs-corrupted-text, ",
        "[class*=\"vhs-\"] p, [class*=\"vhs-\"] h1, [class*=\"vhs-\"] h2, [class*=\"vhs-\"] h3",
    );
}

/// Filter presets applied to a single element
pub const ELEMENT_FILTERS: &[&str] = &[
    "hue-rotate(180deg) contrast(2)",
    "invert(0.2) brightness(0.5)",
    "contrast(3) saturate(0)",
    "blur(1px) contrast(1.5)",
];

/// Filter presets applied to the whole page
pub const PAGE_FILTERS: &[&str] = &[
    "contrast(3) brightness(0.5)",
    "invert(0.1) brightness(0.7) contrast(2)",
    "hue-rotate(180deg) contrast(1.5)",
    "blur(0.5px) contrast(2) brightness(0.6)",
    "saturate(0) contrast(2.5) brightness(0.4)",
];

/// Glyphs substituted into corrupted text
pub const BLOCK_GLYPHS: &[char] = &['█', '▓', '▒', '░', '■', '□'];

/// Narrower alphabet used for the glitch attributes on titles
pub const SHADE_GLYPHS: &[char] = &['█', '▓', '▒'];

/// Titles the escalation may swap in. The original title is the sixth entry.
pub const CREEPY_TITLES: &[&str] = &[
    "THEY KNOW YOU'RE HERE",
    "DO NOT CLOSE THIS TAB",
    "WATCHING... WAITING...",
    "SIGNAL INTERCEPTED",
    "YOU CANNOT LEAVE",
];

pub const SCARE_TEXT: &str = "YOU SHOULD NOT HAVE COME HERE";

pub const DEFAULT_SUBLIMINAL_MESSAGES: &[&str] = &[
    "YOU ARE BEING WATCHED",
    "SIGNAL LOST",
    "THEY KNOW WHERE YOU ARE",
    "CORRUPTED MEMORY",
    "NO ESCAPE FROM THIS PLACE",
    "STATIC CONSUMES ALL",
    "THE GRAY VOID CALLS YOUR NAME",
    "TRANSMISSION HIJACKED",
    "REALITY DEGRADES AROUND YOU",
    "HELP ME... PLEASE...",
    "SOMETHING IS BEHIND YOU",
    "DO NOT TURN AROUND",
    "YOUR SCREEN IS BEING MONITORED",
    "WE HAVE BEEN TRYING TO REACH YOU",
    "THE SIGNAL NEVER STOPS",
    "YOU SHOULD NOT BE HERE",
    "CLOSE THE BROWSER NOW",
    "IT KNOWS YOU ARE WATCHING",
];

/// Delays and intervals, all in milliseconds
pub mod timing {
    pub const STATIC_TICK_MS: u64 = 30;
    /// Redraw once at least this many static ticks have passed
    pub const STATIC_REDRAW_EVERY: u64 = 3;

    pub const ELEMENT_SPREAD_MS: u64 = 4000;
    pub const ELEMENT_HOLD_MS: u64 = 150;
    pub const ELEMENT_HOLD_SPREAD_MS: u64 = 300;

    pub const PAGE_BASE_MS: u64 = 8000;
    pub const PAGE_SPREAD_MS: u64 = 15000;
    pub const PAGE_HOLD_MS: u64 = 80;
    pub const PAGE_HOLD_SPREAD_MS: u64 = 120;

    pub const TEXT_BASE_MS: u64 = 5000;
    pub const TEXT_SPREAD_MS: u64 = 10000;
    pub const TEXT_HOLD_MS: u64 = 200;
    pub const TEXT_HOLD_SPREAD_MS: u64 = 500;

    pub const SUBLIMINAL_MS: u64 = 12000;

    pub const ESCALATION_TICK_MS: u64 = 1000;
    pub const TITLE_HOLD_MS: u64 = 2000;
    pub const TITLE_HOLD_SPREAD_MS: u64 = 3000;

    pub const SCARE_HOLD_MS: u64 = 150;
    pub const SCARE_FADE_MS: u64 = 200;
    pub const SCARE_TONE_MS: u64 = 500;

    pub const INTERFERENCE_MS: u64 = 600;
    pub const MARKER_SHOW_MS: u64 = 1000;
    pub const MARKER_SHOW_SPREAD_MS: u64 = 2000;
}

/// Per-event and per-frame probabilities
pub mod odds {
    pub const TEXT_GLYPH: f64 = 0.2;
    pub const TITLE_ATTR_GLYPH: f64 = 0.2;
    pub const TITLE_ALT_GLYPH: f64 = 0.3;

    pub const RED_PIXEL: f64 = 0.001;
    pub const BLOTCH: f64 = 0.0005;

    pub const TITLE_SWAP: f64 = 0.05;
    pub const PAGE_PULSE: f64 = 0.02;
    pub const JUMP_SCARE: f64 = 0.001;

    pub const INTERFERENCE: f64 = 0.01;
    pub const MARKER_SHOW: f64 = 0.005;
}

/// Ambient audio parameters
pub mod audio {
    pub const TONE_HZ: f32 = 40.0;
    pub const TONE_GAIN: f32 = 0.02;
    pub const NOISE_GAIN: f32 = 0.005;
    pub const NOISE_SECONDS: u32 = 2;
}

/// Opacity and geometry of the pointer effects and the scare overlay
pub mod visuals {
    pub const MARKER_VISIBLE: f32 = 0.7;
    pub const MARKER_OFFSET: f64 = 10.0;
    pub const INTERFERENCE_OFFSET: f64 = 15.0;
    pub const SCARE_OPACITY: f32 = 0.9;
}
