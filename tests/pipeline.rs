//! End-to-end pipeline tests against the in-memory adapter.

use ube::{
    CompositeMode, Drawable, Engine, LayerOptions, PixelBuffer, Source, UbeError,
};

fn engine() -> Engine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Engine::default()
}

fn checker_4x4() -> PixelBuffer {
    let mut data = Vec::with_capacity(4 * 4 * 4);
    for y in 0..4u32 {
        for x in 0..4u32 {
            let v = if (x + y) % 2 == 0 { 200u8 } else { 40u8 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    PixelBuffer::from_vec(4, 4, data).unwrap()
}

#[test]
fn chained_filters_apply_in_queue_order() {
    let mut s = engine().load(Source::Pixels(checker_4x4())).unwrap();
    s.grayscale().invert().darken(20).apply().unwrap();

    let px = s.pixels().unwrap();
    // 200 -> invert 55 -> darken 35; 40 -> invert 215 -> darken 195.
    assert_eq!(px.pixel(0, 0), [35, 35, 35, 255]);
    assert_eq!(px.pixel(1, 0), [195, 195, 195, 255]);
}

#[test]
fn apply_with_empty_queue_is_identity_after_custom_filters_exist() {
    let mut engine = engine();
    engine.add_filters(|_filters| {});
    let mut s = engine.load(Source::Pixels(checker_4x4())).unwrap();
    let before = s.pixels().unwrap();
    s.apply().unwrap();
    assert_eq!(s.pixels().unwrap(), before);
}

#[test]
fn rect_apply_then_full_apply_sees_committed_pixels() {
    let mut s = engine().load(Source::Pixels(checker_4x4())).unwrap();
    s.invert().apply_rect(0, 0, 2, 2).unwrap();
    s.lighten(5).apply().unwrap();

    let px = s.pixels().unwrap();
    // Top-left quadrant was inverted first, then the whole surface lightened.
    assert_eq!(px.pixel(0, 0), [60, 60, 60, 255]); // 200 -> 55 -> 60
    assert_eq!(px.pixel(3, 2), [45, 45, 45, 255]); // 40 untouched -> 45
}

#[test]
fn custom_apply_masks_a_painted_disc() {
    let mut s = engine().load(Source::Pixels(checker_4x4())).unwrap();

    // Paint a 2x2 opaque square at (1, 1) as the mask.
    s.invert()
        .apply_custom(
            &|d: &mut dyn Drawable| {
                let square = PixelBuffer::from_vec(2, 2, vec![255u8; 16])?;
                d.write_pixels(&square, 1, 1)
            },
            true,
        )
        .unwrap();

    let px = s.pixels().unwrap();
    // Inside the mask: inverted. Outside: untouched.
    assert_eq!(px.pixel(1, 1), [255 - 200, 255 - 200, 255 - 200, 255]);
    assert_eq!(px.pixel(2, 1), [255 - 40, 255 - 40, 255 - 40, 255]);
    assert_eq!(px.pixel(0, 0), [200, 200, 200, 255]);
    assert_eq!(px.pixel(3, 3), [200, 200, 200, 255]);
}

#[test]
fn custom_apply_with_legacy_half_weight() {
    let mut s = engine().load(Source::Pixels(checker_4x4())).unwrap();
    s.invert()
        .apply_custom_with(
            &|d: &mut dyn Drawable| {
                // Faint mask alpha still triggers the fixed-weight path.
                let px = PixelBuffer::from_vec(1, 1, vec![0, 0, 0, 1])?;
                d.write_pixels(&px, 0, 0)
            },
            CompositeMode::HardReplace {
                weight: ube::LEGACY_HARD_REPLACE_WEIGHT,
            },
        )
        .unwrap();

    // 50/50 between 200 and its invert 55 rounds to 128.
    assert_eq!(s.pixels().unwrap().pixel(0, 0), [128, 128, 128, 255]);
}

#[test]
fn custom_apply_empty_mask_raises_empty_region_and_keeps_pixels() {
    let mut s = engine().load(Source::Pixels(checker_4x4())).unwrap();
    let before = s.pixels().unwrap();
    let result = s
        .invert()
        .apply_custom(&|_d: &mut dyn Drawable| Ok(()), true);
    assert!(matches!(result, Err(UbeError::EmptyRegion)));
    assert_eq!(s.pixels().unwrap(), before);
}

#[test]
fn layered_composition_end_to_end() {
    let mut s = engine().load(Source::Pixels(checker_4x4())).unwrap();
    s.layer(
        LayerOptions {
            blendmode: "multiply".to_string(),
            opacity: 1.0,
            copy_parent: false,
        },
        |layer| {
            // Half-gray layer darkens the parent via multiply.
            let gray = PixelBuffer::from_vec(4, 4, [128, 128, 128, 255].repeat(16)).unwrap();
            layer.put_pixels(&gray, 0, 0)?;
            Ok(())
        },
    )
    .unwrap();

    let px = s.pixels().unwrap();
    assert_eq!(px.pixel(0, 0), [100, 100, 100, 255]); // 200*128/255
    assert_eq!(px.pixel(1, 0), [20, 20, 20, 255]); // 40*128/255
}

#[test]
fn unknown_blendmode_leaves_parent_unchanged() {
    let mut s = engine().load(Source::Pixels(checker_4x4())).unwrap();
    let before = s.pixels().unwrap();
    s.layer(
        LayerOptions {
            blendmode: "definitely-not-registered".to_string(),
            ..LayerOptions::default()
        },
        |layer| {
            let white = PixelBuffer::from_vec(4, 4, vec![255u8; 64]).unwrap();
            layer.put_pixels(&white, 0, 0)?;
            Ok(())
        },
    )
    .unwrap();
    assert_eq!(s.pixels().unwrap(), before);
}

#[test]
fn load_url_decodes_a_png_file() {
    let img = image::RgbaImage::from_raw(2, 2, vec![255u8; 16]).unwrap();
    let path = std::env::temp_dir().join(format!("ube-pipeline-{}.png", std::process::id()));
    img.save(&path).unwrap();

    let mut s = engine()
        .load(Source::Url(format!("file://{}", path.display())))
        .unwrap();
    assert_eq!(s.width(), 2);
    assert_eq!(s.height(), 2);
    assert_eq!(s.pixels().unwrap().pixel(0, 0), [255, 255, 255, 255]);

    std::fs::remove_file(&path).ok();
}

#[test]
fn batch_load_mixes_source_kinds() {
    let engine = engine();
    let sources = vec![
        Source::Pixels(PixelBuffer::blank(1, 1).unwrap()),
        Source::Pixels(checker_4x4()),
    ];
    let mut count = 0usize;
    let surfaces = engine.load_batch(sources, |_s| count += 1).unwrap();
    assert_eq!(count, 2);
    assert_eq!(surfaces[0].width(), 1);
    assert_eq!(surfaces[1].width(), 4);
}
