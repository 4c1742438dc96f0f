//! Share card renderer
//!
//! Renders the promotional "share cards" of the cleanup tracker: a fixed
//! 1080x1080 PNG composed from background art, an optional mascot, a border
//! frame and localized statistics.
//!
//! # Overview
//!
//! - **Text layout** ([`rendering::text`]): styled text with one-shot
//!   width-constrained font scaling.
//! - **Asset pipeline** ([`assets`]): concurrent fetch + decode of layers with
//!   strict or best-effort joins.
//! - **Card painters** ([`cards`]): one template per card type over a shared
//!   substrate.
//! - **Dispatch** ([`dispatch`]): picks the painter for a payload and encodes
//!   the finished canvas.
//!
//! # Example
//!
//! ```no_run
//! use sharecard::{RenderConfig, SharePayload};
//!
//! # async fn run() -> sharecard::Result<()> {
//! let config = RenderConfig {
//!     asset_origin: "https://static.example.org/".to_string(),
//!     ..Default::default()
//! };
//! let dispatcher = sharecard::new_dispatcher(config)?;
//! let payload = SharePayload::from_json(
//!     r#"{"type":"share","profile":{"name":"Ana","team":"Blue"},"share":{"area":12.5,"volume":3.2}}"#,
//! )?;
//! let image = dispatcher.handle_request(&payload).await?;
//! std::fs::write("card.png", &image.png_data).ok();
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub mod cards;
pub mod dispatch;
pub mod fonts;
pub mod payload;
pub mod rendering;

// Dedicated-thread worker that owns a dispatcher and an HTTP asset origin
#[cfg(feature = "http")]
pub mod async_api;

pub use assets::{AssetFetcher, DecodedImage, JoinStrategy, StaticAssets};
pub use cards::{CardPainter, RenderState};
pub use dispatch::{CancelToken, Dispatcher};
pub use payload::{CardKind, SharePayload};
pub use rendering::RenderedImage;

#[cfg(feature = "http")]
pub use assets::HttpFetcher;
#[cfg(feature = "http")]
pub use async_api::ShareWorker;

/// Pixel dimensions of a card canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// The one canvas size every card is laid out for.
///
/// Dispatch allocates surfaces of this size and all painter coordinates
/// assume exactly this frame.
pub const CANVAS_SIZE: CanvasSize = CanvasSize {
    width: 1080,
    height: 1080,
};

/// Paths of the background layers used by the card templates.
///
/// Paths are resolved against [`RenderConfig::asset_origin`] by the fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetCatalog {
    pub monster_background: String,
    pub share_background: String,
    pub cleanup_background: String,
    pub border: String,
    pub monsters: [String; 4],
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self {
            monster_background: "/img/monster-background.png".to_string(),
            share_background: "/img/share-background.png".to_string(),
            cleanup_background: "/img/cleanup-background.png".to_string(),
            border: "/img/chrome.png".to_string(),
            monsters: [
                "/img/social-share-monster-1.png".to_string(),
                "/img/social-share-monster-2.png".to_string(),
                "/img/social-share-monster-3.png".to_string(),
                "/img/social-share-monster-4.png".to_string(),
            ],
        }
    }
}

/// A font face registered under a family name before any text is drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSource {
    pub family: String,
    pub url: String,
}

impl FontSource {
    pub fn new(family: &str, url: &str) -> Self {
        Self {
            family: family.to_string(),
            url: url.to_string(),
        }
    }
}

/// Configuration for the renderer
///
/// The defaults point at a local development asset origin and the stock
/// asset layout of the web app.
///
/// # Examples
///
/// ```
/// let cfg = sharecard::RenderConfig::default();
/// assert_eq!(cfg.fonts.len(), 2);
/// assert!((cfg.png_quality - 0.95).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base URL that relative asset and font paths are joined onto
    pub asset_origin: String,
    /// User agent string sent with asset requests
    pub user_agent: String,
    /// Timeout for a single asset request in milliseconds
    pub timeout_ms: u64,
    /// Encoder quality in `0.0..=1.0`; mapped onto PNG compression levels
    pub png_quality: f32,
    /// Background layer paths
    pub assets: AssetCatalog,
    /// Font faces registered before text is drawn
    pub fonts: Vec<FontSource>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            asset_origin: "http://localhost:5173/".to_string(),
            user_agent: concat!("sharecard/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 30000,
            png_quality: 0.95,
            assets: AssetCatalog::default(),
            fonts: vec![
                FontSource::new("Montserrat", "/fonts/Montserrat-Regular.ttf"),
                FontSource::new("Bebas Neue", "/fonts/BebasNeue-Regular.ttf"),
            ],
        }
    }
}

impl RenderConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }
}

/// Create a dispatcher that fetches assets over HTTP from `config.asset_origin`.
#[cfg(feature = "http")]
pub fn new_dispatcher(config: RenderConfig) -> Result<Dispatcher> {
    let fetcher = HttpFetcher::new(&config)?;
    Ok(Dispatcher::new(config, std::sync::Arc::new(fetcher)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.assets.border, "/img/chrome.png");
        assert_eq!(config.fonts[1].family, "Bebas Neue");
    }

    #[test]
    fn test_canvas_size() {
        assert_eq!(CANVAS_SIZE.width, 1080);
        assert_eq!(CANVAS_SIZE.height, 1080);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: RenderConfig =
            serde_json::from_str(r#"{"asset_origin":"https://cdn.example/","png_quality":0.5}"#).unwrap();
        assert_eq!(cfg.asset_origin, "https://cdn.example/");
        assert_eq!(cfg.timeout_ms, 30000);
        assert_eq!(cfg.assets.monsters[3], "/img/social-share-monster-4.png");
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let err = RenderConfig::from_json_file("/nonexistent/sharecard.json").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
