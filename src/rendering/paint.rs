//! Display-list surface that records draw calls instead of rasterizing them.
//!
//! Glyph metrics are synthetic and linear in the font size, so layout math
//! can be asserted exactly without a font file.

use crate::assets::DecodedImage;
use crate::rendering::surface::{Baseline, Surface, TextMetrics, TextState};
use crate::{CanvasSize, Error, Result};
use std::collections::HashSet;

/// Advance of every synthetic glyph, as a fraction of the font size
pub const GLYPH_ADVANCE: f32 = 0.5;
/// Inked glyph height, as a fraction of the font size
pub const GLYPH_HEIGHT: f32 = 0.9;
/// Gap between the em top and the inked top, as a fraction of the font size
const EM_TOP_GAP: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    Image {
        url: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        family: String,
        size: f32,
        rgba: (u8, u8, u8, u8),
        baseline: Baseline,
    },
}

#[derive(Debug)]
pub struct RecordingSurface {
    size: CanvasSize,
    state: TextState,
    fonts: HashSet<String>,
    commands: Vec<PaintCommand>,
}

impl RecordingSurface {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            state: TextState::default(),
            fonts: HashSet::new(),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }

    /// Text of every fill call, in draw order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn find_text(&self, needle: &str) -> Option<&PaintCommand> {
        self.commands
            .iter()
            .find(|c| matches!(c, PaintCommand::Text { text, .. } if text == needle))
    }

    pub fn images(&self) -> Vec<&PaintCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::Image { .. }))
            .collect()
    }

    pub fn registered_fonts(&self) -> &HashSet<String> {
        &self.fonts
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn text_state(&self) -> &TextState {
        &self.state
    }

    fn text_state_mut(&mut self) -> &mut TextState {
        &mut self.state
    }

    fn register_font(&mut self, family: &str, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::FontLoadError(format!("empty font data for `{}`", family)));
        }
        self.fonts.insert(family.to_string());
        Ok(())
    }

    fn has_font(&self, family: &str) -> bool {
        self.fonts.contains(family)
    }

    fn measure_text(&self, text: &str) -> Result<TextMetrics> {
        if !self.has_font(&self.state.family) {
            return Err(Error::FontLoadError(format!(
                "font family `{}` is not registered",
                self.state.family
            )));
        }
        let size = self.state.size;
        let width = text.chars().count() as f32 * size * GLYPH_ADVANCE;
        let (ascent, descent) = match self.state.baseline {
            Baseline::Top => (-EM_TOP_GAP * size, (EM_TOP_GAP + GLYPH_HEIGHT) * size),
            Baseline::Bottom => (GLYPH_HEIGHT * size, 0.0),
        };
        Ok(TextMetrics { width, ascent, descent })
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) -> Result<()> {
        // same registration check as measuring
        self.measure_text(text)?;
        let [r, g, b, a] = self.state.color.0;
        self.commands.push(PaintCommand::Text {
            x,
            y,
            text: text.to_string(),
            family: self.state.family.clone(),
            size: self.state.size,
            rgba: (r, g, b, a),
            baseline: self.state.baseline,
        });
        Ok(())
    }

    fn draw_image(&mut self, image: &DecodedImage, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(PaintCommand::Image {
            url: image.url().to_string(),
            x,
            y,
            width,
            height,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> RecordingSurface {
        let mut s = RecordingSurface::new(CanvasSize { width: 100, height: 100 });
        s.register_font("Mono", b"font").unwrap();
        s.text_state_mut().family = "Mono".into();
        s
    }

    #[test]
    fn metrics_scale_linearly_with_size() {
        let mut s = surface();
        s.text_state_mut().size = 20.0;
        let m = s.measure_text("abcd").unwrap();
        assert_eq!(m.width, 40.0);
        assert!((m.height() - 22.0).abs() < 1e-4);

        s.text_state_mut().baseline = Baseline::Bottom;
        let m = s.measure_text("abcd").unwrap();
        assert!((m.height() - 18.0).abs() < 1e-4);
    }

    #[test]
    fn unregistered_family_is_rejected() {
        let mut s = surface();
        s.text_state_mut().family = "Missing".into();
        assert!(matches!(s.fill_text("x", 0.0, 0.0), Err(Error::FontLoadError(_))));
        assert!(s.commands().is_empty());
    }

    #[test]
    fn fill_text_records_state() {
        let mut s = surface();
        s.fill_text("hi", 3.0, 4.0).unwrap();
        match &s.commands()[0] {
            PaintCommand::Text { x, y, text, family, .. } => {
                assert_eq!((*x, *y), (3.0, 4.0));
                assert_eq!(text, "hi");
                assert_eq!(family, "Mono");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(s.texts(), vec!["hi"]);
    }
}
