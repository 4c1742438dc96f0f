//! Card painters.
//!
//! Each card template is a [`CardPainter`]: it names the background layers it
//! needs and knows how to composite them and lay out its statistics. The
//! shared flow (payload check, layer fetch, compositing, fonts, chrome, stats)
//! lives in [`render_card`].
//!
//! Coordinates are fixed pixels in the [`CANVAS_SIZE`](crate::CANVAS_SIZE)
//! frame.

use crate::assets::{fetch_layers, AssetFetcher, CancelToken, DecodedImage, JoinStrategy};
use crate::fonts::load_fonts;
use crate::payload::{CardKind, ShareStats, SharePayload};
use crate::rendering::text::{draw_text, draw_text_centered, draw_unit, FontStyle};
use crate::rendering::Surface;
use crate::{AssetCatalog, Error, FontSource, Result};

/// Vertical distance between a label and the value below it
pub const SPACING: f32 = 40.0;

/// Mascot scale relative to its source size
pub const MASCOT_SCALE: f32 = 0.7;
/// Top edge of the mascot
pub const MASCOT_TOP: f32 = 180.0;

/// Left and right margin of the centered cleanup heading
pub const CONTENT_MARGIN: f32 = 90.0;

/// Maximum width of the name and team values in the chrome
pub const CHROME_VALUE_MAX_WIDTH: f32 = 300.0;

/// Lifecycle of a single render request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Created,
    FetchingAssets,
    Compositing,
    DrawingText,
    Encoding,
    Done,
    Failed,
}

impl RenderState {
    fn next(self) -> Option<RenderState> {
        match self {
            RenderState::Created => Some(RenderState::FetchingAssets),
            RenderState::FetchingAssets => Some(RenderState::Compositing),
            RenderState::Compositing => Some(RenderState::DrawingText),
            RenderState::DrawingText => Some(RenderState::Encoding),
            RenderState::Encoding => Some(RenderState::Done),
            RenderState::Done | RenderState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RenderState::Done | RenderState::Failed)
    }
}

/// Tracks the state of one render and rejects out-of-order transitions
#[derive(Debug)]
pub struct RenderJob {
    kind: CardKind,
    state: RenderState,
}

impl RenderJob {
    pub fn new(kind: CardKind) -> Self {
        Self { kind, state: RenderState::Created }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn advance(&mut self, to: RenderState) -> Result<()> {
        if self.state.next() != Some(to) {
            return Err(Error::Other(format!(
                "illegal render transition {:?} -> {:?}",
                self.state, to
            )));
        }
        log::debug!("{} card: {:?} -> {:?}", self.kind, self.state, to);
        self.state = to;
        Ok(())
    }

    pub fn fail(&mut self, err: &Error) {
        if !self.state.is_terminal() {
            log::debug!("{} card: {:?} -> Failed ({})", self.kind, self.state, err);
            self.state = RenderState::Failed;
        }
    }
}

/// One card template
pub trait CardPainter: Send + Sync {
    fn kind(&self) -> CardKind;

    /// Background layer URLs in back-to-front paint order
    fn required_layers(&self, payload: &SharePayload) -> Result<Vec<String>>;

    /// Paint the fetched layers, releasing each one after it is drawn.
    fn composite(&self, surface: &mut dyn Surface, layers: Vec<DecodedImage>) -> Result<()>;

    /// Draw the template-specific statistics.
    fn draw_stats(&self, surface: &mut dyn Surface, payload: &SharePayload) -> Result<()>;
}

/// Everything a painter needs from outside the surface
pub struct RenderContext<'a> {
    pub fetcher: &'a dyn AssetFetcher,
    pub fonts: &'a [FontSource],
    pub cancel: &'a CancelToken,
}

/// Drive `painter` through fetch, compositing and text for `payload`.
///
/// The payload tag and any layer index are validated before the first fetch
/// is issued; nothing is drawn unless every layer loaded.
pub async fn render_card(
    painter: &dyn CardPainter,
    surface: &mut dyn Surface,
    payload: &SharePayload,
    ctx: &RenderContext<'_>,
    job: &mut RenderJob,
) -> Result<()> {
    payload.expect_kind(painter.kind())?;
    let urls = painter.required_layers(payload)?;

    job.advance(RenderState::FetchingAssets)?;
    let layers = fetch_layers(ctx.fetcher, &urls, JoinStrategy::Strict).await?;
    ctx.cancel.check()?;

    job.advance(RenderState::Compositing)?;
    painter.composite(surface, layers)?;

    job.advance(RenderState::DrawingText)?;
    load_fonts(surface, ctx.fetcher, ctx.fonts).await?;
    ctx.cancel.check()?;
    draw_chrome(surface, payload)?;
    painter.draw_stats(surface, payload)
}

/// Name and team block shared by every card.
///
/// ```text
/// NAME    TEAM
/// ___     ___
/// ```
pub fn draw_chrome(surface: &mut dyn Surface, payload: &SharePayload) -> Result<()> {
    let (name, team) = payload.chrome();

    let x1 = 383.0;
    let y1 = 950.0;
    let x2 = 704.0;
    let y2 = y1 + SPACING;

    draw_text(surface, "NAME", x1, y1, FontStyle::Light, None)?;
    draw_text(surface, &name.to_uppercase(), x1, y2, FontStyle::Bold, Some(CHROME_VALUE_MAX_WIDTH))?;

    draw_text(surface, "TEAM", x2, y1, FontStyle::Light, None)?;
    draw_text(surface, &team.to_uppercase(), x2, y2, FontStyle::Bold, Some(CHROME_VALUE_MAX_WIDTH))?;
    Ok(())
}

fn expect_layers<const N: usize>(layers: Vec<DecodedImage>) -> Result<[DecodedImage; N]> {
    layers.try_into().map_err(|rest: Vec<DecodedImage>| {
        Error::Other(format!("expected {} layers, got {}", N, rest.len()))
    })
}

fn mismatch(expected: CardKind, payload: &SharePayload) -> Error {
    Error::InvalidPayload(format!("expected a {} payload, got {}", expected, payload.kind()))
}

/// Stretch `layer` over the whole canvas and release it.
fn draw_full_frame(surface: &mut dyn Surface, layer: DecodedImage) {
    let size = surface.size();
    surface.draw_image(&layer, 0.0, 0.0, size.width as f32, size.height as f32);
    layer.release();
}

/// Area and volume rows on the right-hand side.
///
/// ```text
/// area
/// ___
/// volume
/// ___
/// ```
fn draw_share_stats(surface: &mut dyn Surface, share: &ShareStats) -> Result<()> {
    let x = 585.0;
    let y1 = 566.0;
    let y2 = 706.0;

    draw_text(surface, "GEREINIGTE FLÄCHE", x, y1, FontStyle::Light, None)?;
    draw_unit(surface, share.area, "m²", x, y1 + SPACING)?;

    draw_text(surface, "GESAMMELTER MÜLL", x, y2, FontStyle::Light, None)?;
    draw_unit(surface, share.volume, "Liter", x, y2 + SPACING)
}

/// Player card: background, mascot, border, level and lifetime stats
#[derive(Debug, Clone)]
pub struct ProfilePainter {
    background: String,
    border: String,
    monsters: [String; 4],
}

impl ProfilePainter {
    pub fn new(assets: &AssetCatalog) -> Self {
        Self {
            background: assets.monster_background.clone(),
            border: assets.border.clone(),
            monsters: assets.monsters.clone(),
        }
    }

    /// Mascot URL for a 1-based index
    pub fn monster(&self, index: i64) -> Result<&str> {
        if !(1..=self.monsters.len() as i64).contains(&index) {
            return Err(Error::AssetIndexOutOfRange(index));
        }
        Ok(&self.monsters[(index - 1) as usize])
    }
}

impl CardPainter for ProfilePainter {
    fn kind(&self) -> CardKind {
        CardKind::Profile
    }

    fn required_layers(&self, payload: &SharePayload) -> Result<Vec<String>> {
        let SharePayload::Profile { monster, .. } = payload else {
            return Err(mismatch(self.kind(), payload));
        };
        Ok(vec![
            self.background.clone(),
            self.monster(*monster)?.to_string(),
            self.border.clone(),
        ])
    }

    fn composite(&self, surface: &mut dyn Surface, layers: Vec<DecodedImage>) -> Result<()> {
        let [background, monster, border] = expect_layers(layers)?;

        draw_full_frame(surface, background);

        // centered horizontally, scaled down
        let width = monster.width() as f32 * MASCOT_SCALE;
        let height = monster.height() as f32 * MASCOT_SCALE;
        let x = (surface.size().width as f32 - width) / 2.0;
        surface.draw_image(&monster, x, MASCOT_TOP, width, height);
        monster.release();

        draw_full_frame(surface, border);
        Ok(())
    }

    //          area
    //          ___
    //  LEVEL
    //  ___     volume
    //          ___
    fn draw_stats(&self, surface: &mut dyn Surface, payload: &SharePayload) -> Result<()> {
        let SharePayload::Profile { profile, share, .. } = payload else {
            return Err(mismatch(self.kind(), payload));
        };

        let x = 122.0;
        draw_text(surface, "LEVEL", x, 615.0, FontStyle::Big, None)?;
        draw_text(surface, &profile.level.to_string(), x, 700.0, FontStyle::Big, None)?;

        draw_share_stats(surface, share)
    }
}

/// Generic share card: "MÜLL ENTSORGT" heading and lifetime stats
#[derive(Debug, Clone)]
pub struct SharePainter {
    background: String,
}

impl SharePainter {
    pub fn new(assets: &AssetCatalog) -> Self {
        Self { background: assets.share_background.clone() }
    }
}

impl CardPainter for SharePainter {
    fn kind(&self) -> CardKind {
        CardKind::Share
    }

    fn required_layers(&self, _payload: &SharePayload) -> Result<Vec<String>> {
        Ok(vec![self.background.clone()])
    }

    fn composite(&self, surface: &mut dyn Surface, layers: Vec<DecodedImage>) -> Result<()> {
        let [background] = expect_layers(layers)?;
        draw_full_frame(surface, background);
        Ok(())
    }

    //              area
    //  MÜLL        ___
    //  ENTSORGT
    //              volume
    //              ___
    fn draw_stats(&self, surface: &mut dyn Surface, payload: &SharePayload) -> Result<()> {
        let SharePayload::Share { share, .. } = payload else {
            return Err(mismatch(self.kind(), payload));
        };

        let x = 111.0;
        draw_text(surface, "MÜLL", x, 634.0, FontStyle::Big, None)?;
        draw_text(surface, "ENTSORGT", x, 719.0, FontStyle::Big, None)?;

        draw_share_stats(surface, share)
    }
}

/// Summary of a single cleanup event
#[derive(Debug, Clone)]
pub struct CleanupPainter {
    background: String,
}

impl CleanupPainter {
    pub fn new(assets: &AssetCatalog) -> Self {
        Self { background: assets.cleanup_background.clone() }
    }
}

impl CardPainter for CleanupPainter {
    fn kind(&self) -> CardKind {
        CardKind::Cleanup
    }

    fn required_layers(&self, _payload: &SharePayload) -> Result<Vec<String>> {
        Ok(vec![self.background.clone()])
    }

    fn composite(&self, surface: &mut dyn Surface, layers: Vec<DecodedImage>) -> Result<()> {
        let [background] = expect_layers(layers)?;
        draw_full_frame(surface, background);
        Ok(())
    }

    //        TITLE
    //       _______
    //
    // volume         area
    // participants   impact
    fn draw_stats(&self, surface: &mut dyn Surface, payload: &SharePayload) -> Result<()> {
        let SharePayload::Cleanup { cleanup, .. } = payload else {
            return Err(mismatch(self.kind(), payload));
        };

        let box_width = surface.size().width as f32 - CONTENT_MARGIN * 2.0;
        draw_text_centered(surface, "ERFOLGREICHES CLEANUP", CONTENT_MARGIN, 390.0, FontStyle::LightBig, box_width)?;
        draw_text_centered(surface, &cleanup.name.to_uppercase(), CONTENT_MARGIN, 444.0, FontStyle::Big, box_width)?;

        let x1 = 152.0;
        let y1 = 590.0;
        let x2 = 585.0;
        let y2 = 748.0;

        draw_text(surface, "MÜLLMENGE", x1, y1, FontStyle::Light, None)?;
        draw_unit(surface, cleanup.volume, "Liter", x1, y1 + SPACING)?;

        draw_text(surface, "TEILNEHMENDE", x1, y2, FontStyle::Light, None)?;
        draw_unit(surface, cleanup.participants as f64, "Grabits", x1, y2 + SPACING)?;

        draw_text(surface, "GEREINIGTE FLÄCHE", x2, y1, FontStyle::Light, None)?;
        draw_unit(surface, cleanup.area, "m²", x2, y1 + SPACING)?;

        draw_text(surface, "GESAMTER IMPACT", x2, y2, FontStyle::Light, None)?;
        draw_unit(surface, cleanup.impact, "Points", x2, y2 + SPACING)
    }
}
