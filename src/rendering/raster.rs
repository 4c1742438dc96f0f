//! CPU raster surface backed by an RGBA buffer.
//!
//! Images are composited with `image::imageops`, glyphs are rasterized with
//! fontdue and blended source-over. Canvas metrics follow the 2D canvas
//! conventions so the text helpers behave the same on every surface.

use crate::assets::DecodedImage;
use crate::rendering::surface::{Baseline, Surface, TextMetrics, TextState};
use crate::rendering::RenderedImage;
use crate::{CanvasSize, Error, Result};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::collections::HashMap;

/// Largest edge a surface may be allocated with
pub const MAX_DIMENSION: u32 = 8192;

pub struct RasterSurface {
    pixels: RgbaImage,
    fonts: HashMap<String, fontdue::Font>,
    state: TextState,
}

/// Horizontal extent and vertical ink bounds of a laid-out run, relative to
/// the alphabetic baseline (y up).
struct GlyphRun {
    advance: f32,
    top: f32,
    bottom: f32,
}

impl RasterSurface {
    /// Allocate a transparent surface.
    pub fn new(size: CanvasSize) -> Result<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(Error::SurfaceUnavailable(format!(
                "zero-sized surface {}x{}",
                size.width, size.height
            )));
        }
        if size.width > MAX_DIMENSION || size.height > MAX_DIMENSION {
            return Err(Error::SurfaceUnavailable(format!(
                "{}x{} exceeds the {}px limit",
                size.width, size.height, MAX_DIMENSION
            )));
        }
        Ok(Self {
            pixels: RgbaImage::new(size.width, size.height),
            fonts: HashMap::new(),
            state: TextState::default(),
        })
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Encode the surface as PNG. `quality` in `0.0..=1.0` picks the
    /// compression level; PNG is lossless either way.
    pub fn encode_png(&self, quality: f32) -> Result<RenderedImage> {
        let (width, height) = self.pixels.dimensions();
        let mut png_data = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut png_data, compression_for(quality), PngFilter::Adaptive);
        encoder
            .write_image(self.pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| Error::EncodeError(e.to_string()))?;
        Ok(RenderedImage { width, height, png_data })
    }

    fn font(&self) -> Result<&fontdue::Font> {
        self.fonts.get(&self.state.family).ok_or_else(|| {
            Error::FontLoadError(format!("font family `{}` is not registered", self.state.family))
        })
    }

    /// Offset from the active baseline down to the alphabetic baseline
    fn baseline_shift(&self, font: &fontdue::Font) -> f32 {
        let (ascent, descent) = line_metrics(font, self.state.size);
        match self.state.baseline {
            Baseline::Top => ascent,
            Baseline::Bottom => descent,
        }
    }
}

fn compression_for(quality: f32) -> CompressionType {
    if quality >= 0.9 {
        CompressionType::Best
    } else if quality >= 0.5 {
        CompressionType::Default
    } else {
        CompressionType::Fast
    }
}

fn line_metrics(font: &fontdue::Font, px: f32) -> (f32, f32) {
    font.horizontal_line_metrics(px)
        .map(|m| (m.ascent, m.descent))
        .unwrap_or((px * 0.8, -px * 0.2))
}

fn layout_run(font: &fontdue::Font, text: &str, px: f32) -> GlyphRun {
    let mut run = GlyphRun { advance: 0.0, top: f32::MIN, bottom: f32::MAX };
    let mut prev: Option<char> = None;
    for ch in text.chars() {
        if let Some(p) = prev {
            run.advance += font.horizontal_kern(p, ch, px).unwrap_or(0.0);
        }
        let m = font.metrics(ch, px);
        if m.width > 0 && m.height > 0 {
            run.top = run.top.max((m.height as i32 + m.ymin) as f32);
            run.bottom = run.bottom.min(m.ymin as f32);
        }
        run.advance += m.advance_width;
        prev = Some(ch);
    }
    if run.top < run.bottom {
        run.top = 0.0;
        run.bottom = 0.0;
    }
    run
}

fn blend(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: u8) {
    let sa = (coverage as f32 / 255.0) * (color[3] as f32 / 255.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let v = (color[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

impl Surface for RasterSurface {
    fn size(&self) -> CanvasSize {
        let (width, height) = self.pixels.dimensions();
        CanvasSize { width, height }
    }

    fn text_state(&self) -> &TextState {
        &self.state
    }

    fn text_state_mut(&mut self) -> &mut TextState {
        &mut self.state
    }

    fn register_font(&mut self, family: &str, data: &[u8]) -> Result<()> {
        if self.fonts.contains_key(family) {
            return Ok(());
        }
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|e| Error::FontLoadError(format!("{}: {}", family, e)))?;
        self.fonts.insert(family.to_string(), font);
        Ok(())
    }

    fn has_font(&self, family: &str) -> bool {
        self.fonts.contains_key(family)
    }

    fn measure_text(&self, text: &str) -> Result<TextMetrics> {
        let font = self.font()?;
        let run = layout_run(font, text, self.state.size);
        let shift = self.baseline_shift(font);
        Ok(TextMetrics {
            width: run.advance,
            ascent: run.top - shift,
            descent: shift - run.bottom,
        })
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) -> Result<()> {
        let font = self.font()?;
        let px = self.state.size;
        let color = self.state.color;
        let baseline = y + self.baseline_shift(font);
        let (width, height) = self.pixels.dimensions();

        let mut glyphs = Vec::new();
        let mut pen = x;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(p) = prev {
                pen += font.horizontal_kern(p, ch, px).unwrap_or(0.0);
            }
            let (m, bitmap) = font.rasterize(ch, px);
            let left = (pen + m.xmin as f32).round() as i64;
            let top = (baseline - (m.height as i32 + m.ymin) as f32).round() as i64;
            glyphs.push((left, top, m.width, bitmap));
            pen += m.advance_width;
            prev = Some(ch);
        }

        for (left, top, glyph_width, bitmap) in glyphs {
            if glyph_width == 0 {
                continue;
            }
            for (i, coverage) in bitmap.into_iter().enumerate() {
                if coverage == 0 {
                    continue;
                }
                let gx = left + (i % glyph_width) as i64;
                let gy = top + (i / glyph_width) as i64;
                if gx < 0 || gy < 0 || gx >= width as i64 || gy >= height as i64 {
                    continue;
                }
                blend(self.pixels.get_pixel_mut(gx as u32, gy as u32), color, coverage);
            }
        }
        Ok(())
    }

    fn draw_image(&mut self, image: &DecodedImage, x: f32, y: f32, width: f32, height: f32) {
        let w = width.round();
        let h = height.round();
        if w < 1.0 || h < 1.0 {
            return;
        }
        let (w, h) = (w as u32, h as u32);
        let (left, top) = (x.round() as i64, y.round() as i64);
        if (w, h) == image.pixels().dimensions() {
            imageops::overlay(&mut self.pixels, image.pixels(), left, top);
        } else {
            let scaled = imageops::resize(image.pixels(), w, h, FilterType::Triangle);
            imageops::overlay(&mut self.pixels, &scaled, left, top);
        }
    }
}
