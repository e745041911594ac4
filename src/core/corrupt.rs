//! Text corruption: per-character glyph substitution

use super::catalog::{odds, BLOCK_GLYPHS, SHADE_GLYPHS};
use super::chance::Chance;

/// Replace each character with probability `p` by a glyph drawn uniformly
/// from `alphabet`.
pub fn scramble(text: &str, p: f64, alphabet: &[char], chance: &mut dyn Chance) -> String {
    if alphabet.is_empty() {
        return text.to_string();
    }
    text.chars()
        .map(|c| if chance.fires(p) { alphabet[chance.pick(alphabet.len())] } else { c })
        .collect()
}

/// Transient text glitch: block alphabet at the text-glitch odds.
pub fn glitch_text(text: &str, chance: &mut dyn Chance) -> String {
    scramble(text, odds::TEXT_GLYPH, BLOCK_GLYPHS, chance)
}

/// Static corruption used for title glitch attributes. The `alt` variant
/// is denser.
pub fn corrupt_text(text: &str, alt: bool, chance: &mut dyn Chance) -> String {
    let p = if alt { odds::TITLE_ALT_GLYPH } else { odds::TITLE_ATTR_GLYPH };
    scramble(text, p, SHADE_GLYPHS, chance)
}
