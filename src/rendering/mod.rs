//! Rendering substrate: drawing surfaces, text layout and PNG output

pub mod paint;
pub mod raster;
pub mod surface;
pub mod text;

pub use paint::{PaintCommand, RecordingSurface};
pub use raster::RasterSurface;
pub use surface::{Baseline, Surface, TextMetrics, TextState};

use base64::Engine as _;
use sha2::{Digest, Sha256};

/// An encoded card, handed back to the caller once a render completes.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl RenderedImage {
    /// A `data:` URL the caller can use in place of a blob URL.
    pub fn data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png_data)
        )
    }

    /// Hex SHA-256 of the encoded bytes, a content fingerprint for logs.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_is_base64_png() {
        let img = RenderedImage { width: 1, height: 1, png_data: vec![1, 2, 3] };
        assert_eq!(img.data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn digest_is_stable_hex() {
        let img = RenderedImage { width: 1, height: 1, png_data: Vec::new() };
        assert_eq!(
            img.digest(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
