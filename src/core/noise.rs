//! Noise: RGBA static frames and audio noise buffers

use serde::{Deserialize, Serialize};

use super::catalog::odds;
use super::chance::Chance;

const GRAY_MAX: f64 = 120.0;
const ALPHA_MAX: f64 = 40.0;
const RED_MARKER: [u8; 4] = [255, 0, 0, 30];
const BLOTCH: [u8; 4] = [20, 20, 20, 80];
const BLOTCH_RADIUS: i64 = 3;
/// Blotches are placed away from the right and bottom edges
const BLOTCH_MARGIN: usize = 20;

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// What a single [`StaticFrame::regenerate`] call drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub red_pixels: usize,
    pub blotch: Option<(usize, usize)>,
}

/// RGBA pixel buffer that mirrors the static canvas.
#[derive(Debug, Clone)]
pub struct StaticFrame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl StaticFrame {
    pub fn new(viewport: Viewport) -> Self {
        let width = viewport.width as usize;
        let height = viewport.height as usize;
        Self { width, height, pixels: vec![0; width * height * 4] }
    }

    /// Re-fit to a new viewport. Contents are cleared.
    pub fn resize(&mut self, viewport: Viewport) {
        self.width = viewport.width as usize;
        self.height = viewport.height as usize;
        self.pixels.clear();
        self.pixels.resize(self.width * self.height * 4, 0);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Redraw every pixel as independent static, with rare red markers and
    /// the occasional dark blotch.
    pub fn regenerate(&mut self, chance: &mut dyn Chance) -> FrameStats {
        let mut stats = FrameStats::default();

        for px in self.pixels.chunks_exact_mut(4) {
            let intensity = chance.unit();
            if chance.fires(odds::RED_PIXEL) {
                px.copy_from_slice(&RED_MARKER);
                stats.red_pixels += 1;
            } else {
                let gray = (intensity * GRAY_MAX) as u8;
                px[0] = gray;
                px[1] = gray;
                px[2] = gray;
                px[3] = (chance.unit() * ALPHA_MAX) as u8;
            }
        }

        if self.width > 0 && self.height > 0 && chance.fires(odds::BLOTCH) {
            let x = chance.pick(self.width.saturating_sub(BLOTCH_MARGIN).max(1));
            let y = chance.pick(self.height.saturating_sub(BLOTCH_MARGIN).max(1));
            self.stamp_blotch(x, y);
            stats.blotch = Some((x, y));
        }

        stats
    }

    fn stamp_blotch(&mut self, cx: usize, cy: usize) {
        for dy in -BLOTCH_RADIUS..=BLOTCH_RADIUS {
            for dx in -BLOTCH_RADIUS..=BLOTCH_RADIUS {
                if dx * dx + dy * dy > BLOTCH_RADIUS * BLOTCH_RADIUS {
                    continue;
                }
                let x = cx as i64 + dx;
                let y = cy as i64 + dy;
                if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                    continue;
                }
                let i = (y as usize * self.width + x as usize) * 4;
                self.pixels[i..i + 4].copy_from_slice(&BLOTCH);
            }
        }
    }
}

/// Uniform white noise in `[-1, 1]`.
pub fn white_noise(len: usize, chance: &mut dyn Chance) -> Vec<f32> {
    (0..len).map(|_| (chance.unit() * 2.0 - 1.0) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chance::{FixedChance, RandChance};

    #[test]
    fn frame_matches_viewport() {
        let frame = StaticFrame::new(Viewport::new(16, 9));
        assert_eq!(frame.as_rgba().len(), 16 * 9 * 4);
    }

    #[test]
    fn resize_refits_buffer() {
        let mut frame = StaticFrame::new(Viewport::new(4, 4));
        frame.resize(Viewport::new(10, 3));
        assert_eq!(frame.width(), 10);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.as_rgba().len(), 120);
    }

    #[test]
    fn static_pixels_stay_in_bounds() {
        let mut frame = StaticFrame::new(Viewport::new(64, 48));
        let mut chance = RandChance::seeded(3);
        frame.regenerate(&mut chance);
        for px in frame.as_rgba().chunks_exact(4) {
            if px == RED_MARKER || px == BLOTCH {
                continue;
            }
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert!(px[0] < 120);
            assert!(px[3] < 40);
        }
    }

    #[test]
    fn forced_triggers_paint_markers_and_blotch() {
        let mut frame = StaticFrame::new(Viewport::new(40, 30));
        let mut chance = FixedChance::always();
        let stats = frame.regenerate(&mut chance);
        assert_eq!(stats.red_pixels, 40 * 30);
        assert_eq!(stats.blotch, Some((0, 0)));
        // Blotch centred on the origin covers the corner but not (4, 0)
        assert_eq!(frame.pixel(0, 0), Some(BLOTCH));
        assert_eq!(frame.pixel(3, 0), Some(BLOTCH));
        assert_eq!(frame.pixel(4, 0), Some(RED_MARKER));
        assert_eq!(frame.pixel(2, 2), Some(BLOTCH));
        assert_eq!(frame.pixel(3, 3), Some(RED_MARKER));
    }

    #[test]
    fn tiny_canvas_clips_blotch() {
        let mut frame = StaticFrame::new(Viewport::new(2, 2));
        let mut chance = FixedChance::always();
        let stats = frame.regenerate(&mut chance);
        assert_eq!(stats.blotch, Some((0, 0)));
        assert_eq!(frame.pixel(1, 1), Some(BLOTCH));
    }

    #[test]
    fn noise_samples_span_unit_range() {
        let mut chance = RandChance::seeded(9);
        let samples = white_noise(4096, &mut chance);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(samples.iter().any(|s| *s < -0.5));
        assert!(samples.iter().any(|s| *s > 0.5));
    }
}
