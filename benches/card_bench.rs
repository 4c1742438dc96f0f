use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{ImageFormat, Rgba, RgbaImage};
use sharecard::rendering::text::format_de;
use sharecard::rendering::RecordingSurface;
use sharecard::{Dispatcher, RenderConfig, SharePayload, StaticAssets, CANVAS_SIZE};
use std::io::Cursor;
use std::sync::Arc;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, Rgba([20, 80, 120, 255]))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn bench_format_de(c: &mut Criterion) {
    c.bench_function("format_de", |b| {
        b.iter(|| format_de(black_box(1234567.891)))
    });
}

// Layout and dispatch only; the recording surface skips rasterization.
fn bench_profile_layout(c: &mut Criterion) {
    let assets = StaticAssets::new()
        .with("/img/monster-background.png", png(64, 64))
        .with("/img/chrome.png", png(64, 64))
        .with("/img/social-share-monster-1.png", png(64, 64))
        .with("/fonts/Montserrat-Regular.ttf", b"m".to_vec())
        .with("/fonts/BebasNeue-Regular.ttf", b"b".to_vec());
    let dispatcher = Dispatcher::new(RenderConfig::default(), Arc::new(assets));
    let payload = SharePayload::from_json(
        r#"{"type":"profile","monster":1,"profile":{"name":"Ana","team":"Blue","level":5},"share":{"area":12.5,"volume":3.2}}"#,
    )
    .unwrap();
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    c.bench_function("profile_layout", |b| {
        b.iter(|| {
            let mut surface = RecordingSurface::new(CANVAS_SIZE);
            runtime.block_on(dispatcher.render_on(&mut surface, &payload)).unwrap();
            surface
        })
    });
}

fn bench_overlay_encode(c: &mut Criterion) {
    let assets = StaticAssets::new().with("/img/layer.png", png(256, 256));
    let dispatcher = Dispatcher::new(RenderConfig { png_quality: 0.1, ..Default::default() }, Arc::new(assets));
    let layers = vec!["/img/layer.png".to_string()];
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    let mut group = c.benchmark_group("overlay");
    group.sample_size(10);
    group.bench_function("overlay_encode_fast", |b| {
        b.iter(|| runtime.block_on(dispatcher.render_overlay(&layers, None)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_format_de, bench_profile_layout, bench_overlay_encode);
criterion_main!(benches);
