//! Asset pipeline against a local HTTP origin
#![cfg(feature = "http")]

use image::{ImageFormat, Rgba, RgbaImage};
use sharecard::assets::fetch_layers;
use sharecard::{AssetFetcher, Dispatcher, Error, HttpFetcher, JoinStrategy, RenderConfig};
use std::io::Cursor;
use std::sync::{Arc, Once};
use tiny_http::{Response, Server};

static INIT: Once = Once::new();

fn png(rgba: [u8; 4]) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::from_pixel(16, 16, Rgba(rgba))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn start_test_server() -> String {
    INIT.call_once(|| {
        let server = Server::http("127.0.0.1:18093").unwrap();
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                if request.url() == "/img/slow.png" {
                    std::thread::sleep(std::time::Duration::from_millis(400));
                }
                let body = match request.url() {
                    "/img/red.png" => Some(png([255, 0, 0, 255])),
                    "/img/half-blue.png" | "/img/slow.png" => Some(png([0, 0, 255, 128])),
                    "/img/garbage.png" => Some(b"<html>not an image</html>".to_vec()),
                    _ => None,
                };
                let resp = match body {
                    Some(bytes) => Response::from_data(bytes).with_header(
                        "Content-Type: image/png".parse::<tiny_http::Header>().unwrap(),
                    ),
                    None => Response::from_data(b"not found".to_vec()).with_status_code(404),
                };
                let _ = request.respond(resp);
            }
        });
    });

    "http://127.0.0.1:18093/".to_string()
}

fn config() -> RenderConfig {
    RenderConfig { asset_origin: start_test_server(), timeout_ms: 5000, ..Default::default() }
}

fn urls(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

#[tokio::test]
async fn fetches_relative_paths_from_origin() {
    let fetcher = HttpFetcher::new(&config()).unwrap();
    let bytes = fetcher.fetch("/img/red.png").await.unwrap();
    assert_eq!(&bytes[..4], b"\x89PNG");
}

#[tokio::test]
async fn strict_join_surfaces_http_status() {
    let fetcher = HttpFetcher::new(&config()).unwrap();
    let err = fetch_layers(&fetcher, &urls(&["/img/red.png", "/img/missing.png"]), JoinStrategy::Strict)
        .await
        .unwrap_err();
    match err {
        Error::AssetFetchFailed { url, reason } => {
            assert_eq!(url, "/img/missing.png");
            assert!(reason.contains("404"), "reason was {}", reason);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn slow_layer_fails_as_fetch_error_with_url() {
    let config = RenderConfig { timeout_ms: 100, ..config() };
    let fetcher = HttpFetcher::new(&config).unwrap();
    let err = fetch_layers(&fetcher, &urls(&["/img/slow.png"]), JoinStrategy::Strict)
        .await
        .unwrap_err();
    match err {
        Error::AssetFetchFailed { url, reason } => {
            assert_eq!(url, "/img/slow.png");
            assert_eq!(reason, "timed out after 100ms");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn best_effort_join_keeps_loaded_layers_in_order() {
    let fetcher = HttpFetcher::new(&config()).unwrap();
    let layers = fetch_layers(
        &fetcher,
        &urls(&["/img/half-blue.png", "/img/missing.png", "/img/garbage.png", "/img/red.png"]),
        JoinStrategy::BestEffort,
    )
    .await
    .unwrap();
    let loaded: Vec<&str> = layers.iter().map(|l| l.url()).collect();
    assert_eq!(loaded, vec!["/img/half-blue.png", "/img/red.png"]);
}

#[tokio::test]
async fn overlay_render_encodes_png() {
    let config = config();
    let fetcher = HttpFetcher::new(&config).unwrap();
    let d = Dispatcher::new(config, Arc::new(fetcher));

    let image = d
        .render_overlay(&urls(&["/img/red.png", "/img/missing.png"]), None)
        .await
        .unwrap();
    assert_eq!((image.width, image.height), (1080, 1080));

    let decoded = image::load_from_memory(&image.png_data).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(540, 540), &Rgba([255, 0, 0, 255]));
    assert!(image.data_url().starts_with("data:image/png;base64,"));
}
