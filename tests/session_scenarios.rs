use image::{ImageEncoder, Rgba, RgbaImage};
use pixelator::core_modules::pointer::{CellCoords, MemoryClipboard};
use pixelator::core_modules::records::{ExportStore, RecordColor, offset_records};
use pixelator::core_modules::renderer::RenderState;
use pixelator::pipeline::pixelate_bytes;
use pixelator::{GridSize, PixelRecord, Pixelator, PixelatorError, RenderConfig, RenderEvents, RenderOutcome};

fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    bytes
}

fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    png_bytes(&RgbaImage::from_pixel(width, height, Rgba(color)))
}

#[derive(Default)]
struct Errors(Vec<String>);

impl RenderEvents for Errors {
    fn on_error(&mut self, error: &PixelatorError) {
        self.0.push(error.to_string());
    }
}

#[test_log::test(tokio::test)]
async fn loads_and_renders_a_red_square() {
    let mut pixelator = Pixelator::with_config(RenderConfig::default());
    let outcome = pixelator.load(solid_png(100, 100, [255, 0, 0, 255])).await;
    assert!(matches!(outcome, RenderOutcome::Rendered { records: 625 }));
    assert_eq!(pixelator.state(), &RenderState::Done);

    let surface = pixelator.surface().unwrap();
    assert_eq!((surface.width(), surface.height()), (500, 500));
    let red = RecordColor { red: 255, green: 0, blue: 0 };
    assert!(pixelator.records().iter().all(|record| record.color == red));
    assert_eq!(pixelator.destination().factor, 20);

    let probe = pixelator.probe(499.0, 0.0).unwrap();
    assert_eq!(probe.color_hex, "FF0000");
    assert_eq!(probe.cell, Some(CellCoords { x: 24, y: 0 }));
}

#[test_log::test(tokio::test)]
async fn superseded_decode_is_discarded() {
    let mut pixelator = Pixelator::with_config(RenderConfig::default());
    let first = pixelator.begin_decode(solid_png(100, 100, [255, 0, 0, 255]));
    let second = pixelator.begin_decode(solid_png(100, 100, [0, 0, 255, 255]));
    assert_eq!(pixelator.state(), &RenderState::Loading);

    let late = pixelator.complete_decode(first).await;
    assert!(matches!(late, RenderOutcome::Stale { generation: 1 }));
    assert!(pixelator.surface().is_none());

    assert!(pixelator.complete_decode(second).await.is_rendered());
    let blue = RecordColor { red: 0, green: 0, blue: 255 };
    assert!(pixelator.records().iter().all(|record| record.color == blue));
}

#[test_log::test(tokio::test)]
async fn reset_discards_an_in_flight_decode() {
    let mut pixelator = Pixelator::with_config(RenderConfig::default());
    let pending = pixelator.begin_decode(solid_png(10, 10, [0, 0, 0, 255]));
    pixelator.reset();
    assert!(matches!(
        pixelator.complete_decode(pending).await,
        RenderOutcome::Stale { .. }
    ));
    assert_eq!(pixelator.state(), &RenderState::Idle);
}

#[test_log::test(tokio::test)]
async fn invalid_upload_reports_and_keeps_session_usable() {
    let mut pixelator = Pixelator::new(RenderConfig::default(), Errors::default());
    let outcome = pixelator.load(b"GIF87a but not really".to_vec()).await;
    assert!(matches!(outcome, RenderOutcome::Failed(PixelatorError::DecodeFailed(_))));
    assert!(matches!(pixelator.state(), RenderState::Error(_)));
    assert_eq!(pixelator.events().0.len(), 1);

    let outcome = pixelator.load(b"plain text".to_vec()).await;
    assert!(matches!(outcome, RenderOutcome::Failed(PixelatorError::DecodeFailed(message))
        if message == "Invalid file type. File types supported are PNG, GIF and JPG"));

    assert!(pixelator.load(solid_png(20, 20, [0, 255, 0, 255])).await.is_rendered());
    assert!(pixelator.surface().is_some());
}

#[test_log::test(tokio::test)]
async fn property_changes_apply_to_a_loaded_image() {
    let mut pixelator = Pixelator::with_config(RenderConfig::default().with_pixels_per_grid(1));
    let outcome = pixelator.load(solid_png(300, 200, [0, 0, 0, 255])).await;
    // 1x1 grid over a 300x200 image: one record.
    assert!(matches!(outcome, RenderOutcome::Rendered { records: 1 }));

    let outcome = pixelator.set_grid_size(Some(GridSize::new(3, 2).unwrap()));
    assert!(matches!(outcome, RenderOutcome::Rendered { records: 6 }));
    let locations: Vec<(u32, u32)> = pixelator
        .records()
        .iter()
        .map(|record| (record.location.x, record.location.y))
        .collect();
    assert_eq!(locations, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);

    let outcome = pixelator.set_pixelate(false);
    assert!(matches!(outcome, RenderOutcome::Rendered { records: 0 }));
}

#[test_log::test(tokio::test)]
async fn click_copies_the_block_color() {
    let mut image = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
    for y in 0..4 {
        for x in 0..4 {
            image.put_pixel(x, y, Rgba([18, 52, 86, 255]));
        }
    }
    let mut pixelator = Pixelator::with_config(RenderConfig::default());
    assert!(pixelator.load(png_bytes(&image)).await.is_rendered());

    let mut clipboard = MemoryClipboard::default();
    let outcome = pixelator.pointer_click(5.0, 5.0, &mut clipboard).unwrap();
    assert!(outcome.copied);
    assert_eq!(outcome.color_hex, "123456");
    assert_eq!(clipboard.contents.as_deref(), Some("123456"));
    assert_eq!(pixelator.highlighted_cell(), Some(CellCoords { x: 0, y: 0 }));
}

#[test_log::test]
fn rendered_records_land_in_the_export_store() {
    let output = pixelate_bytes(
        &solid_png(50, 50, [10, 20, 30, 255]),
        &RenderConfig::default(),
    )
    .unwrap();
    assert_eq!(output.records.len(), 625);

    let path = std::env::temp_dir().join(format!(
        "pixelator-{}-session-export.json",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let store = ExportStore::new(&path);

    let first = offset_records(&output.records, 1, 4).unwrap();
    let second = offset_records(&output.records, 6, 4).unwrap();
    assert_eq!(store.append(&first).unwrap(), 625);
    assert_eq!(store.append(&second).unwrap(), 1250);

    let stored: Vec<PixelRecord> = store.load().unwrap();
    assert_eq!(stored[0].location.x, 0);
    assert_eq!(stored[625].location.x, 25);
    assert_eq!(stored[625].location.y, 25);
    assert_eq!(stored[1249].location.x, 49);
    assert_eq!(stored[1249].location.y, 49);
    let _ = std::fs::remove_file(&path);
}
