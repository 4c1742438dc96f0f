//! Font-face loading.
//!
//! Text styles reference font families by name, and a surface silently has
//! nothing to draw with until the family is registered, so the font faces of
//! a render are fetched and registered before its first text draw.

use crate::assets::AssetFetcher;
use crate::rendering::Surface;
use crate::{FontSource, Result};

/// Fetch every not-yet-registered face concurrently and register it on `surface`.
///
/// Registration is idempotent: families already known to the surface are
/// neither fetched nor registered again.
pub async fn load_fonts(
    surface: &mut dyn Surface,
    fetcher: &dyn AssetFetcher,
    fonts: &[FontSource],
) -> Result<()> {
    let pending: Vec<&FontSource> = fonts.iter().filter(|f| !surface.has_font(&f.family)).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let faces = futures::future::join_all(pending.iter().map(|f| fetcher.fetch(&f.url))).await;
    for (source, face) in pending.into_iter().zip(faces) {
        let bytes = face?;
        surface.register_font(&source.family, &bytes)?;
        log::debug!("registered font face {} from {}", source.family, source.url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::StaticAssets;
    use crate::rendering::RecordingSurface;
    use crate::{Error, RenderConfig, CANVAS_SIZE};

    fn font_assets() -> StaticAssets {
        StaticAssets::new()
            .with("/fonts/Montserrat-Regular.ttf", b"montserrat".to_vec())
            .with("/fonts/BebasNeue-Regular.ttf", b"bebas".to_vec())
    }

    #[tokio::test]
    async fn registers_all_configured_families() {
        let assets = font_assets();
        let mut surface = RecordingSurface::new(CANVAS_SIZE);
        load_fonts(&mut surface, &assets, &RenderConfig::default().fonts).await.unwrap();
        assert!(surface.has_font("Montserrat"));
        assert!(surface.has_font("Bebas Neue"));
        assert_eq!(surface.registered_fonts().len(), 2);
    }

    #[tokio::test]
    async fn second_load_fetches_nothing() {
        let assets = font_assets();
        let fonts = RenderConfig::default().fonts;
        let mut surface = RecordingSurface::new(CANVAS_SIZE);
        load_fonts(&mut surface, &assets, &fonts).await.unwrap();
        load_fonts(&mut surface, &assets, &fonts).await.unwrap();
        assert_eq!(assets.requested().len(), 2);
    }

    #[tokio::test]
    async fn missing_face_fails_the_load() {
        let assets = StaticAssets::new().with("/fonts/Montserrat-Regular.ttf", b"m".to_vec());
        let mut surface = RecordingSurface::new(CANVAS_SIZE);
        let err = load_fonts(&mut surface, &assets, &RenderConfig::default().fonts)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AssetFetchFailed { .. }));
    }
}
