//! Asset pipeline: concurrent fetch and decode of background layers.
//!
//! All fetches of one request are issued together and every outcome is
//! awaited before the results are joined, so a slow failure never leaves
//! sibling fetches running behind the caller's back. The join policy is an
//! explicit [`JoinStrategy`] chosen at each call site.

use crate::{Error, Result};
use futures::future::BoxFuture;
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[cfg(feature = "http")]
use futures::FutureExt;

/// Source of raw asset bytes (images and font faces)
pub trait AssetFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// How the outcomes of a layer fan-out are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    /// Any failed layer fails the whole fetch with the first failure
    Strict,
    /// Failed layers are dropped; the loaded ones keep their request order
    BestEffort,
}

/// A decoded RGBA bitmap.
///
/// Painters call [`DecodedImage::release`] right after compositing so at most
/// the layers of the current draw step are held in memory.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    url: String,
    pixels: RgbaImage,
}

impl DecodedImage {
    pub fn decode(url: &str, bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes).map_err(|e| Error::fetch(url, e))?;
        Ok(Self::from_rgba(url, decoded.to_rgba8()))
    }

    pub fn from_rgba(url: &str, pixels: RgbaImage) -> Self {
        Self { url: url.to_string(), pixels }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Free the bitmap.
    pub fn release(self) {
        log::trace!("released {} ({}x{})", self.url, self.width(), self.height());
    }
}

/// Cooperative cancellation, checked only where a fetch join completes
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Fetch and decode a single layer.
pub async fn fetch_layer(fetcher: &dyn AssetFetcher, url: &str) -> Result<DecodedImage> {
    let bytes = fetcher.fetch(url).await?;
    DecodedImage::decode(url, &bytes)
}

/// Strict join: every layer or the first failure in request order.
pub fn join_all(outcomes: Vec<Result<DecodedImage>>) -> Result<Vec<DecodedImage>> {
    outcomes.into_iter().collect()
}

/// Best-effort join: the layers that loaded, in request order.
pub fn join_best_effort(outcomes: Vec<Result<DecodedImage>>) -> Vec<DecodedImage> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("dropping layer: {}", e);
                None
            }
        })
        .collect()
}

/// Fetch all `urls` concurrently and join them with `strategy`.
pub async fn fetch_layers(
    fetcher: &dyn AssetFetcher,
    urls: &[String],
    strategy: JoinStrategy,
) -> Result<Vec<DecodedImage>> {
    log::debug!("fetching {} layer(s) ({:?})", urls.len(), strategy);
    let outcomes = futures::future::join_all(urls.iter().map(|url| fetch_layer(fetcher, url))).await;
    match strategy {
        JoinStrategy::Strict => join_all(outcomes),
        JoinStrategy::BestEffort => Ok(join_best_effort(outcomes)),
    }
}

/// In-memory asset source keyed by URL.
///
/// Records every requested URL so callers can assert what was fetched.
#[derive(Debug, Default)]
pub struct StaticAssets {
    entries: HashMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

impl StaticAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }

    pub fn insert(&mut self, url: &str, bytes: Vec<u8>) {
        self.entries.insert(url.to_string(), bytes);
    }

    /// URLs requested so far, in request order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl AssetFetcher for StaticAssets {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }
        let outcome = self
            .entries
            .get(url)
            .cloned()
            .ok_or_else(|| Error::fetch(url, "not found"));
        Box::pin(futures::future::ready(outcome))
    }
}

/// Fetches assets over HTTP relative to the configured asset origin
#[cfg(feature = "http")]
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: url::Url,
    timeout_ms: u64,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new(config: &crate::RenderConfig) -> Result<Self> {
        let origin = url::Url::parse(&config.asset_origin)
            .map_err(|e| Error::ConfigError(format!("asset origin {}: {}", config.asset_origin, e)))?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, origin, timeout_ms: config.timeout_ms })
    }

    /// Resolve an asset path against the origin; absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> Result<url::Url> {
        self.origin.join(url).map_err(|e| Error::fetch(url, e))
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::fetch(url, format!("timed out after {}ms", self.timeout_ms))
        } else {
            Error::fetch(url, err)
        }
    }
}

#[cfg(feature = "http")]
impl AssetFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        async move {
            let resolved = self.resolve(url)?;
            let resp = self
                .client
                .get(resolved)
                .send()
                .await
                .map_err(|e| self.transport_error(url, e))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(Error::fetch(url, format!("HTTP {}", status)));
            }
            let body = resp.bytes().await.map_err(|e| self.transport_error(url, e))?;
            Ok(body.to_vec())
        }
        .boxed()
    }
}
