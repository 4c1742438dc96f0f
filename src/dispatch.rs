//! Request dispatch: one payload in, one encoded card (or one error) out.

use crate::assets::{fetch_layers, AssetFetcher, JoinStrategy};
use crate::cards::{
    render_card, CardPainter, CleanupPainter, ProfilePainter, RenderContext, RenderJob, RenderState,
    SharePainter, CONTENT_MARGIN,
};
use crate::fonts::load_fonts;
use crate::payload::{CardKind, SharePayload};
use crate::rendering::text::{draw_text_centered, FontStyle};
use crate::rendering::{RasterSurface, RenderedImage, Surface};
use crate::{Error, RenderConfig, Result, CANVAS_SIZE};
use std::sync::Arc;
use std::time::Instant;

pub use crate::assets::CancelToken;

/// Selects the painter for a payload and drives it to an encoded PNG.
///
/// A dispatcher holds no per-request state; every request gets a fresh
/// surface, fresh layers and fresh font registrations.
pub struct Dispatcher {
    config: RenderConfig,
    fetcher: Arc<dyn AssetFetcher>,
    profile: ProfilePainter,
    share: SharePainter,
    cleanup: CleanupPainter,
}

impl Dispatcher {
    pub fn new(config: RenderConfig, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            profile: ProfilePainter::new(&config.assets),
            share: SharePainter::new(&config.assets),
            cleanup: CleanupPainter::new(&config.assets),
            config,
            fetcher,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn painter(&self, kind: CardKind) -> &dyn CardPainter {
        match kind {
            CardKind::Profile => &self.profile,
            CardKind::Share => &self.share,
            CardKind::Cleanup => &self.cleanup,
        }
    }

    /// Parse a JSON payload and render it.
    pub async fn handle_json(&self, raw: &str) -> Result<RenderedImage> {
        let payload = SharePayload::from_json(raw)?;
        self.handle_request(&payload).await
    }

    /// Render `payload` onto a fresh canvas and encode it as PNG.
    pub async fn handle_request(&self, payload: &SharePayload) -> Result<RenderedImage> {
        self.handle_request_with_cancel(payload, &CancelToken::new()).await
    }

    /// Like [`handle_request`](Self::handle_request), checking `cancel`
    /// whenever an asset or font join completes.
    pub async fn handle_request_with_cancel(
        &self,
        payload: &SharePayload,
        cancel: &CancelToken,
    ) -> Result<RenderedImage> {
        let started = Instant::now();
        let mut job = RenderJob::new(payload.kind());

        let result = self.encode_request(payload, cancel, &mut job).await;
        match &result {
            Ok(image) => log::info!(
                "rendered {} card ({} bytes) in {:?}",
                payload.kind(),
                image.png_data.len(),
                started.elapsed()
            ),
            Err(e) => {
                job.fail(e);
                log::warn!("{} card failed after {:?}: {}", payload.kind(), started.elapsed(), e);
            }
        }
        result
    }

    async fn encode_request(
        &self,
        payload: &SharePayload,
        cancel: &CancelToken,
        job: &mut RenderJob,
    ) -> Result<RenderedImage> {
        let mut surface = RasterSurface::new(CANVAS_SIZE)?;
        self.render_job(&mut surface, payload, cancel, job).await?;

        job.advance(RenderState::Encoding)?;
        let image = surface.encode_png(self.config.png_quality)?;
        job.advance(RenderState::Done)?;
        Ok(image)
    }

    /// Render `payload` onto a caller-provided surface without encoding.
    pub async fn render_on(&self, surface: &mut dyn Surface, payload: &SharePayload) -> Result<()> {
        let mut job = RenderJob::new(payload.kind());
        let result = self.render_job(surface, payload, &CancelToken::new(), &mut job).await;
        if let Err(e) = &result {
            job.fail(e);
        }
        result
    }

    async fn render_job(
        &self,
        surface: &mut dyn Surface,
        payload: &SharePayload,
        cancel: &CancelToken,
        job: &mut RenderJob,
    ) -> Result<()> {
        let painter = self.painter(payload.kind());
        log::debug!("dispatching {} payload", payload.kind());
        let ctx = RenderContext {
            fetcher: self.fetcher.as_ref(),
            fonts: &self.config.fonts,
            cancel,
        };
        render_card(painter, surface, payload, &ctx, job).await
    }

    /// Composite whichever of `layers` load, full-frame in request order,
    /// with an optional centered caption.
    ///
    /// This is the best-effort counterpart of the card templates: missing
    /// layers are skipped and only a render with no layer at all fails.
    pub async fn render_overlay(&self, layers: &[String], caption: Option<&str>) -> Result<RenderedImage> {
        let mut surface = RasterSurface::new(CANVAS_SIZE)?;
        self.render_overlay_on(&mut surface, layers, caption).await?;
        surface.encode_png(self.config.png_quality)
    }

    /// Overlay composite onto a caller-provided surface; returns how many
    /// layers were drawn.
    pub async fn render_overlay_on(
        &self,
        surface: &mut dyn Surface,
        layers: &[String],
        caption: Option<&str>,
    ) -> Result<usize> {
        let images = fetch_layers(self.fetcher.as_ref(), layers, JoinStrategy::BestEffort).await?;
        if images.is_empty() {
            return Err(Error::fetch(layers.join(", "), "no overlay layer could be loaded"));
        }

        let drawn = images.len();
        let size = surface.size();
        for image in images {
            surface.draw_image(&image, 0.0, 0.0, size.width as f32, size.height as f32);
            image.release();
        }

        if let Some(caption) = caption {
            load_fonts(surface, self.fetcher.as_ref(), &self.config.fonts).await?;
            let style = FontStyle::Big;
            let y = (size.height as f32 - style.spec().size) / 2.0;
            let box_width = size.width as f32 - CONTENT_MARGIN * 2.0;
            draw_text_centered(surface, caption, CONTENT_MARGIN, y, style, box_width)?;
        }
        Ok(drawn)
    }
}
