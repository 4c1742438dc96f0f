#![cfg(feature = "http")]

use image::{ImageFormat, Rgba, RgbaImage};
use sharecard::{Error, RenderConfig, ShareWorker, StaticAssets};
use std::io::Cursor;
use std::sync::Arc;

fn worker_assets() -> StaticAssets {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::from_pixel(2, 2, Rgba([0, 200, 0, 255]))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    StaticAssets::new().with("/img/green.png", out.into_inner())
}

#[tokio::test]
async fn worker_serves_requests_until_closed() {
    let worker = ShareWorker::spawn_with(RenderConfig::default(), Arc::new(worker_assets()))
        .await
        .unwrap();

    let image = worker
        .render_overlay(vec!["/img/green.png".to_string()], None)
        .await
        .unwrap();
    assert_eq!((image.width, image.height), (1080, 1080));

    let err = worker.render_json(r#"{"type":"poster"}"#).await.unwrap_err();
    assert!(matches!(err, Error::UnknownCardType(_)));

    // a handle clone shares the same worker thread
    let other = worker.clone();
    let err = other
        .render_json(r#"{"type":"share","profile":{"name":"A","team":"B"},"share":{"area":1,"volume":1}}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AssetFetchFailed { .. }));

    worker.close().await.unwrap();
    assert!(other.render_json("{}").await.is_err());
}
