//! Styled text drawing with width-constrained scaling.
//!
//! Every draw call first applies one of the fixed [`FontStyle`] presets to the
//! surface, so no text state leaks from one call into the next.

use crate::rendering::surface::{Baseline, Surface, TextMetrics, TextState};
use crate::Result;
use image::Rgba;

/// Horizontal gap between a number and its unit label
pub const UNIT_GAP: f32 = 10.0;

/// Divisor of the vertical correction applied after scaling text down.
///
/// Shrunk text is moved down by a quarter of the height it lost so it does
/// not float above neighbouring baseline-aligned text. The value is empirical.
pub const SCALE_OFFSET_DIVISOR: f32 = 4.0;

const ACCENT: Rgba<u8> = Rgba([0x01, 0x68, 0x7F, 0xFF]);
const WHITE: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

pub const MONTSERRAT: &str = "Montserrat";
pub const BEBAS_NEUE: &str = "Bebas Neue";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Light,
    LightBig,
    Bold,
    Number,
    Unit,
    Big,
}

/// Font family, pixel size, fill color and baseline of a preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleSpec {
    pub family: &'static str,
    pub size: f32,
    pub color: Rgba<u8>,
    pub baseline: Baseline,
}

impl FontStyle {
    pub const ALL: [FontStyle; 6] = [
        FontStyle::Light,
        FontStyle::LightBig,
        FontStyle::Bold,
        FontStyle::Number,
        FontStyle::Unit,
        FontStyle::Big,
    ];

    pub fn spec(self) -> StyleSpec {
        let (family, size, color, baseline) = match self {
            FontStyle::Light => (MONTSERRAT, 28.0, ACCENT, Baseline::Top),
            FontStyle::LightBig => (MONTSERRAT, 32.0, ACCENT, Baseline::Top),
            FontStyle::Bold => (BEBAS_NEUE, 56.0, WHITE, Baseline::Top),
            FontStyle::Number => (BEBAS_NEUE, 76.0, WHITE, Baseline::Top),
            FontStyle::Unit => (MONTSERRAT, 32.0, WHITE, Baseline::Bottom),
            FontStyle::Big => (BEBAS_NEUE, 92.0, WHITE, Baseline::Top),
        };
        StyleSpec { family, size, color, baseline }
    }

    pub fn name(self) -> &'static str {
        match self {
            FontStyle::Light => "light",
            FontStyle::LightBig => "light-big",
            FontStyle::Bold => "bold",
            FontStyle::Number => "number",
            FontStyle::Unit => "unit",
            FontStyle::Big => "big",
        }
    }
}

/// Width and visual height of drawn text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// Result of [`scale_text`]: metrics at the final size and the y correction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledText {
    pub metrics: TextMetrics,
    pub offset_y: f32,
}

/// Apply the preset's font, size, color and baseline to the surface.
pub fn apply_style(surface: &mut dyn Surface, style: FontStyle) {
    let spec = style.spec();
    log::trace!("applying {} style", style.name());
    surface.set_text_state(TextState {
        family: spec.family.to_string(),
        size: spec.size,
        color: spec.color,
        baseline: spec.baseline,
    });
}

/// Shrink the current font so `text` fits into `max_width`.
///
/// Text narrower than `max_width` is left alone. Otherwise the font size is
/// multiplied by `max_width / width` once; there is no second pass even if
/// glyph rounding leaves the run marginally wider.
pub fn scale_text(surface: &mut dyn Surface, text: &str, max_width: f32) -> Result<ScaledText> {
    let measurement = surface.measure_text(text)?;
    if measurement.width < max_width || max_width <= 0.0 {
        return Ok(ScaledText { metrics: measurement, offset_y: 0.0 });
    }

    let ratio = max_width / measurement.width;
    let state = surface.text_state_mut();
    state.size = state.size.trunc() * ratio;

    let after = surface.measure_text(text)?;
    let offset_y = (measurement.height() - after.height()) / SCALE_OFFSET_DIVISOR;
    Ok(ScaledText { metrics: after, offset_y })
}

/// Draw `text` at (`x`, `y`) in `style`, shrinking it to `max_width` if given.
///
/// A `max_width` of zero or less behaves like `None`.
pub fn draw_text(
    surface: &mut dyn Surface,
    text: &str,
    x: f32,
    y: f32,
    style: FontStyle,
    max_width: Option<f32>,
) -> Result<TextSize> {
    apply_style(surface, style);

    let (metrics, offset_y) = match max_width.filter(|m| *m > 0.0) {
        Some(max) => {
            let scaled = scale_text(surface, text, max)?;
            (scaled.metrics, scaled.offset_y)
        }
        None => (surface.measure_text(text)?, 0.0),
    };

    surface.fill_text(text, x, y + offset_y)?;
    Ok(TextSize { width: metrics.width, height: metrics.height() })
}

/// Draw `text` horizontally centered in `[x, x + box_width]`, scaled to fit.
pub fn draw_text_centered(
    surface: &mut dyn Surface,
    text: &str,
    x: f32,
    y: f32,
    style: FontStyle,
    box_width: f32,
) -> Result<()> {
    apply_style(surface, style);
    let scaled = scale_text(surface, text, box_width)?;
    let text_x = x + (box_width - scaled.metrics.width) / 2.0;
    surface.fill_text(text, text_x, y + scaled.offset_y)
}

/// Draw a German-formatted number followed by its unit label.
///
/// The unit uses the bottom baseline and sits at the number's measured
/// height, so both read as one line.
pub fn draw_unit(surface: &mut dyn Surface, value: f64, unit: &str, x: f32, y: f32) -> Result<()> {
    let number = draw_text(surface, &format_de(value), x, y, FontStyle::Number, None)?;
    draw_text(
        surface,
        unit,
        x + number.width + UNIT_GAP,
        y + number.height,
        FontStyle::Unit,
        None,
    )?;
    Ok(())
}

/// Format a number the way `toLocaleString('de-DE')` does: `.` groups
/// thousands, `,` separates at most three fraction digits, exact ties round
/// away from zero and a negative sign survives rounding to zero.
pub fn format_de(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let fixed = round_half_away(value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value.is_sign_negative() {
        out.push('-');
    }
    let digits = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

/// `abs` with exactly three fraction digits, ties rounded up.
///
/// `{:.3}` rounds the exact binary value half-to-even. A tie at the fourth
/// digit needs a value of the form k/2000, and the only such binary values
/// are multiples of 1/16, which print exactly with four digits.
fn round_half_away(abs: f64) -> String {
    if (abs * 16.0).fract() == 0.0 {
        let four = format!("{:.4}", abs);
        if let Some(truncated) = four.strip_suffix('5') {
            return increment_last_digit(truncated);
        }
    }
    format!("{:.3}", abs)
}

/// Add one unit in the last place of a plain decimal string.
fn increment_last_digit(decimal: &str) -> String {
    let mut digits: Vec<u8> = decimal.bytes().collect();
    for i in (0..digits.len()).rev() {
        match digits[i] {
            b'.' => continue,
            b'9' => digits[i] = b'0',
            d => {
                digits[i] = d + 1;
                return String::from_utf8_lossy(&digits).into_owned();
            }
        }
    }
    format!("1{}", String::from_utf8_lossy(&digits))
}
