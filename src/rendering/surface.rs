//! The drawing-surface contract the card painters draw against.
//!
//! It follows the shape of a 2D canvas context: text is styled by mutating the
//! current [`TextState`] and then filled, images are drawn into a destination
//! rectangle. Each surface is owned by exactly one render.

use crate::assets::DecodedImage;
use crate::{CanvasSize, Result};
use image::Rgba;

/// Which line of the em box a text `y` coordinate refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    Top,
    Bottom,
}

/// Text state applied to subsequent measure and fill calls
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    pub family: String,
    /// Font size in pixels
    pub size: f32,
    pub color: Rgba<u8>,
    pub baseline: Baseline,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 10.0,
            color: Rgba([0, 0, 0, 255]),
            baseline: Baseline::Top,
        }
    }
}

/// Measured extent of a text run.
///
/// `ascent` and `descent` are the distances from the active baseline to the
/// top and bottom of the inked glyph bounds, upward and downward positive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl TextMetrics {
    /// Visual height of the inked glyphs, not the font's line height.
    pub fn height(&self) -> f32 {
        self.descent + self.ascent.abs()
    }
}

pub trait Surface: Send {
    fn size(&self) -> CanvasSize;

    fn text_state(&self) -> &TextState;

    fn text_state_mut(&mut self) -> &mut TextState;

    /// Register a font face under `family`. Registering a family twice is a no-op.
    fn register_font(&mut self, family: &str, data: &[u8]) -> Result<()>;

    fn has_font(&self, family: &str) -> bool;

    /// Measure `text` with the current text state.
    fn measure_text(&self, text: &str) -> Result<TextMetrics>;

    /// Fill `text` with its baseline-relative anchor at (`x`, `y`).
    fn fill_text(&mut self, text: &str, x: f32, y: f32) -> Result<()>;

    /// Draw `image` scaled into the destination rectangle.
    fn draw_image(&mut self, image: &DecodedImage, x: f32, y: f32, width: f32, height: f32);

    fn set_text_state(&mut self, state: TextState) {
        *self.text_state_mut() = state;
    }
}
