//! Integration tests for end-to-end decoding
//!
//! Fixtures are built with the companion encoder and rendered onto luminance
//! canvases, then damaged, warped or combined. These protect the detector,
//! sampler, Reed-Solomon stage and pass orchestration against regressions.

use std::f32::consts::PI;

use qrscan::decoder::format::{FORMAT_COPY_TOP_LEFT, format_copy_split};
use qrscan::decoder::function_mask::FunctionMask;
use qrscan::encoder::{Canvas, EncodeSegment, EncodedSymbol, encode_segments, encode_text};
use qrscan::models::Mode;
use qrscan::utils::binarization::binarize;
use qrscan::{DecodeOutcome, DecoderConfig, ECLevel, PixelGrid, Point, QrReader, Version};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn render(symbol: &EncodedSymbol, module_px: usize) -> PixelGrid {
    Canvas::for_symbol(&symbol.modules, module_px, 4)
        .into_pixel_grid()
        .expect("fixture canvas is valid")
}

fn decode_text(grid: &PixelGrid) -> Option<String> {
    QrReader::default().decode(grid).text().map(str::to_owned)
}

/// Canvas with `symbol` drawn into the quadrilateral `corners`
fn warped(symbol: &EncodedSymbol, side: usize, corners: [Point; 4]) -> PixelGrid {
    let mut canvas = Canvas::new(side, side);
    canvas
        .draw_warped(&symbol.modules, corners)
        .expect("corners form a proper quadrilateral");
    canvas.into_pixel_grid().expect("fixture canvas is valid")
}

fn rotated_corners(center: Point, half: f32, angle: f32) -> [Point; 4] {
    let (sin, cos) = angle.sin_cos();
    [(-half, -half), (half, -half), (half, half), (-half, half)].map(|(x, y)| {
        Point::new(center.x + x * cos - y * sin, center.y + x * sin + y * cos)
    })
}

#[test]
fn test_round_trip_numeric() {
    let symbol = encode_text("0123456789012345678901", ECLevel::M).unwrap();
    let outcome = QrReader::default().decode(&render(&symbol, 4));
    let code = outcome.code().expect("numeric fixture decodes");
    assert_eq!(code.content, "0123456789012345678901");
    assert_eq!(code.segments[0].mode, Mode::Numeric);
}

#[test]
fn test_round_trip_alphanumeric() {
    let symbol = encode_text("HELLO WORLD $%*+-./:", ECLevel::Q).unwrap();
    let outcome = QrReader::default().decode(&render(&symbol, 4));
    let code = outcome.code().expect("alphanumeric fixture decodes");
    assert_eq!(code.content, "HELLO WORLD $%*+-./:");
    assert_eq!(code.segments[0].mode, Mode::Alphanumeric);
    assert_eq!(code.error_correction, ECLevel::Q);
}

#[test]
fn test_round_trip_byte() {
    let text = "https://example.com/scan?id=42&lang=es";
    let symbol = encode_text(text, ECLevel::L).unwrap();
    assert_eq!(decode_text(&render(&symbol, 4)).as_deref(), Some(text));
}

#[test]
fn test_round_trip_kanji() {
    let segment = EncodeSegment::kanji("こんにちは").unwrap();
    let symbol = encode_segments(&[segment], ECLevel::M, None, None).unwrap();
    let outcome = QrReader::default().decode(&render(&symbol, 4));
    let code = outcome.code().expect("kanji fixture decodes");
    assert_eq!(code.content, "こんにちは");
    assert_eq!(code.segments[0].mode, Mode::Kanji);
}

#[test]
fn test_round_trip_kanji_ideographs() {
    let text = "漢字表記、東京都千代田区";
    let symbol = encode_segments(&[EncodeSegment::kanji(text).unwrap()], ECLevel::Q, None, None)
        .unwrap();
    let outcome = QrReader::default().decode(&render(&symbol, 4));
    let code = outcome.code().expect("kanji fixture decodes");
    assert_eq!(code.content, text);
    assert!(!code.content.contains('\u{FFFD}'));
}

#[test]
fn test_round_trip_eci_shift_jis() {
    // 漢字 in Shift_JIS, carried as byte data under ECI 20
    let segments = [
        EncodeSegment::eci(20).unwrap(),
        EncodeSegment::bytes(&[0x8A, 0xBF, 0x8E, 0x9A]),
    ];
    let symbol = encode_segments(&segments, ECLevel::M, None, None).unwrap();
    assert_eq!(decode_text(&render(&symbol, 4)).as_deref(), Some("漢字"));
}

#[test]
fn test_round_trip_eci_utf8() {
    let symbol = qrscan::encoder::encode_utf8_with_eci("Grüße, 世界", ECLevel::M).unwrap();
    assert_eq!(
        decode_text(&render(&symbol, 4)).as_deref(),
        Some("Grüße, 世界")
    );
}

#[test]
fn test_mixed_segments() {
    let segments = [
        EncodeSegment::alphanumeric("ORDER ").unwrap(),
        EncodeSegment::numeric("20261018").unwrap(),
        EncodeSegment::bytes(b" ok"),
    ];
    let symbol = encode_segments(&segments, ECLevel::M, None, None).unwrap();
    let outcome = QrReader::default().decode(&render(&symbol, 4));
    let code = outcome.code().expect("mixed fixture decodes");
    assert_eq!(code.content, "ORDER 20261018 ok");
    assert_eq!(code.segments.len(), 3);
}

#[test]
fn test_every_ec_level() {
    for level in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
        let symbol = encode_text("EC LEVEL CHECK 0042", level).unwrap();
        let outcome = QrReader::default().decode(&render(&symbol, 4));
        let code = outcome
            .code()
            .unwrap_or_else(|| panic!("level {level:?} failed: {outcome:?}"));
        assert_eq!(code.error_correction, level);
        assert_eq!(code.mask_pattern, symbol.mask);
    }
}

#[test]
fn test_version_information_symbol() {
    let payload = "v".repeat(150);
    let version = Version::new(10);
    let symbol =
        encode_segments(&[EncodeSegment::bytes(payload.as_bytes())], ECLevel::M, version, None)
            .unwrap();
    let outcome = QrReader::default().decode(&render(&symbol, 3));
    let code = outcome.code().expect("version 10 fixture decodes");
    assert_eq!(code.content, payload);
    assert_eq!(code.version.number(), 10);
}

#[test]
fn test_two_symbols_longest_wins() {
    let short = encode_text("SHORT", ECLevel::M).unwrap();
    let long = encode_text("a considerably longer payload", ECLevel::M).unwrap();
    let px = 4;
    let long_x = 16 + short.dimension() * px + 32;
    let width = long_x + long.dimension() * px + 16;
    let height = 32 + long.dimension() * px;

    let mut canvas = Canvas::new(width, height);
    canvas.draw_modules(&short.modules, 16, 16, px);
    canvas.draw_modules(&long.modules, long_x, 16, px);
    let grid = canvas.into_pixel_grid().unwrap();

    let reader = QrReader::default();
    assert_eq!(reader.locate(&grid).len(), 2);
    assert_eq!(
        reader.decode(&grid).text(),
        Some("a considerably longer payload")
    );

    let mut texts: Vec<String> = reader.decode_all(&grid).into_iter().map(|c| c.content).collect();
    texts.sort();
    assert_eq!(texts, ["SHORT", "a considerably longer payload"]);
}

#[test]
fn test_single_symbol_single_location() {
    let symbol = encode_text("ONE", ECLevel::H).unwrap();
    let grid = render(&symbol, 5);
    let locations = QrReader::default().locate(&grid);
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].dimension, symbol.dimension());
}

#[test]
fn test_blank_images_not_found() {
    let reader = QrReader::default();
    for value in [0u8, 128, 255] {
        let grid = PixelGrid::filled(200, 150, value).unwrap();
        assert!(reader.locate(&grid).is_empty());
        assert!(matches!(reader.decode(&grid), DecodeOutcome::NotFound));
    }
}

#[test]
fn test_random_noise_not_found() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let pixels: Vec<u8> = (0..160 * 160).map(|_| rng.random::<u8>()).collect();
    let grid = PixelGrid::new(160, 160, pixels).unwrap();
    let reader = QrReader::default();
    assert!(reader.locate(&grid).is_empty());
    assert!(matches!(reader.decode(&grid), DecodeOutcome::NotFound));
}

#[test]
fn test_light_pixel_noise_still_decodes() {
    let symbol = encode_text("salt and pepper", ECLevel::M).unwrap();
    let mut canvas = Canvas::for_symbol(&symbol.modules, 6, 4);
    let mut rng = StdRng::seed_from_u64(7);
    canvas.map_pixels(|_, _, v| if rng.random_bool(0.02) { 255 - v } else { v });
    let grid = canvas.into_pixel_grid().unwrap();
    assert_eq!(decode_text(&grid).as_deref(), Some("salt and pepper"));
}

/// Canvas of `symbol` at 6 px per module with 4x4 pixel blocks inverted at
/// the given rate
fn block_flipped(symbol: &EncodedSymbol, rate: f64, seed: u64) -> PixelGrid {
    let mut canvas = Canvas::for_symbol(&symbol.modules, 6, 4);
    let blocks_wide = canvas.width().div_ceil(4);
    let blocks_high = canvas.height().div_ceil(4);
    let mut rng = StdRng::seed_from_u64(seed);
    let flipped: Vec<bool> = (0..blocks_wide * blocks_high)
        .map(|_| rng.random_bool(rate))
        .collect();
    canvas.map_pixels(|x, y, v| {
        if flipped[(y / 4) * blocks_wide + x / 4] {
            255 - v
        } else {
            v
        }
    });
    canvas.into_pixel_grid().unwrap()
}

#[test]
fn test_block_flips_still_decode() {
    let symbol = encode_text("BLOCK FLIP CHECK", ECLevel::H).unwrap();
    assert_eq!(symbol.version.number(), 2);
    for (rate, min_decoded) in [(0.005, 9), (0.02, 8)] {
        let decoded = (0..10u64)
            .filter(|&seed| {
                decode_text(&block_flipped(&symbol, rate, seed)).as_deref()
                    == Some("BLOCK FLIP CHECK")
            })
            .count();
        assert!(
            decoded >= min_decoded,
            "{decoded}/10 decoded with {rate} of blocks inverted"
        );
    }
}

#[test]
fn test_damaged_modules_are_corrected() {
    let mut symbol = encode_text("DAMAGE TOLERANCE", ECLevel::H).unwrap();
    let func = FunctionMask::new(symbol.version);
    let mut rng = StdRng::seed_from_u64(11);
    let n = symbol.dimension();
    let mut flipped = 0;
    while flipped < 12 {
        let (x, y) = (rng.random_range(0..n), rng.random_range(0..n));
        if !func.is_function(x, y) {
            symbol.modules.toggle(x, y);
            flipped += 1;
        }
    }
    let outcome = QrReader::default().decode(&render(&symbol, 4));
    let code = outcome.code().expect("level H absorbs a dozen module errors");
    assert_eq!(code.content, "DAMAGE TOLERANCE");
    assert!(code.corrected_codewords > 0);
}

#[test]
fn test_scrambled_data_is_malformed() {
    let mut symbol = encode_text("scrambled beyond repair", ECLevel::L).unwrap();
    let func = FunctionMask::new(symbol.version);
    let mut rng = StdRng::seed_from_u64(99);
    let n = symbol.dimension();
    for y in 0..n {
        for x in 0..n {
            if !func.is_function(x, y) {
                symbol.modules.set(x, y, rng.random_bool(0.5));
            }
        }
    }
    let outcome = QrReader::default().decode(&render(&symbol, 4));
    match outcome {
        DecodeOutcome::Malformed(reason) => assert!(reason.after_format(), "{reason}"),
        other => panic!("expected a malformed outcome, got {other:?}"),
    }
}

#[test]
fn test_damaged_format_copy() {
    let mut symbol = encode_text("FORMAT COPY", ECLevel::M).unwrap();
    for &(x, y) in &FORMAT_COPY_TOP_LEFT[..6] {
        symbol.modules.toggle(x, y);
    }
    assert_eq!(
        decode_text(&render(&symbol, 4)).as_deref(),
        Some("FORMAT COPY")
    );
}

#[test]
fn test_zeroed_format_copy() {
    let symbol = encode_text("ZEROED FORMAT", ECLevel::Q).unwrap();
    let n = symbol.dimension();
    for copy in [FORMAT_COPY_TOP_LEFT, format_copy_split(n)] {
        let mut damaged = symbol.clone();
        for &(x, y) in &copy {
            damaged.modules.set(x, y, false);
        }
        let outcome = QrReader::default().decode(&render(&damaged, 4));
        let code = outcome.code().expect("intact copy carries the format");
        assert_eq!(code.content, "ZEROED FORMAT");
        assert_eq!(code.error_correction, ECLevel::Q);
        assert_eq!(code.mask_pattern, symbol.mask);
    }
}

#[test]
fn test_rotated_symbols() {
    let symbol = encode_text("ROTATION 123", ECLevel::M).unwrap();
    for degrees in [25.0f32, 90.0, 200.0, 315.0] {
        let corners = rotated_corners(Point::new(150.0, 150.0), 60.0, degrees * PI / 180.0);
        let grid = warped(&symbol, 300, corners);
        let outcome = QrReader::default().decode(&grid);
        let code = outcome
            .code()
            .unwrap_or_else(|| panic!("{degrees} degrees: {outcome:?}"));
        assert_eq!(code.content, "ROTATION 123");
        assert!(
            code.position[0].distance(&corners[0]) < 6.0,
            "{degrees} degrees: {:?} vs {:?}",
            code.position[0],
            corners[0]
        );
    }
}

#[test]
fn test_rotation_sweep() {
    let symbol = encode_text("ROTATION 123", ECLevel::M).unwrap();
    let n = symbol.dimension() as f32;
    for module_px in [5.0f32, 8.0] {
        for degrees in (0..=90).step_by(5) {
            let angle = degrees as f32 * PI / 180.0;
            let corners = rotated_corners(Point::new(150.0, 150.0), n * module_px / 2.0, angle);
            let grid = warped(&symbol, 300, corners);
            assert_eq!(
                decode_text(&grid).as_deref(),
                Some("ROTATION 123"),
                "{degrees} degrees at {module_px} px per module"
            );
        }
    }
}

#[test]
fn test_perspective_symbol() {
    let symbol = encode_text("perspective payload 12345", ECLevel::M).unwrap();
    assert!(symbol.version.number() >= 2);
    let corners = [
        Point::new(60.0, 50.0),
        Point::new(250.0, 68.0),
        Point::new(242.0, 252.0),
        Point::new(66.0, 236.0),
    ];
    let grid = warped(&symbol, 300, corners);
    assert_eq!(
        decode_text(&grid).as_deref(),
        Some("perspective payload 12345")
    );
}

#[test]
fn test_brightness_and_contrast_invariance() {
    let symbol = encode_text("LIGHTING", ECLevel::M).unwrap();
    let reference = Canvas::for_symbol(&symbol.modules, 3, 4);
    let expected = binarize(&reference.clone().into_pixel_grid().unwrap());

    for (scale, offset) in [(1.0f32, 0.0f32), (0.33, 80.0), (0.25, 10.0), (0.5, 120.0)] {
        let mut canvas = reference.clone();
        canvas.map_pixels(|_, _, v| (v as f32 * scale + offset).round() as u8);
        let grid = canvas.into_pixel_grid().unwrap();
        assert_eq!(binarize(&grid), expected, "scale {scale} offset {offset}");
        assert_eq!(decode_text(&grid).as_deref(), Some("LIGHTING"));
    }
}

#[test]
fn test_low_resolution_needs_upscale() {
    let symbol = encode_text("TINY", ECLevel::L).unwrap();
    let grid = render(&symbol, 2);
    let original_only =
        QrReader::new(DecoderConfig::default().with_passes(vec![qrscan::Preprocess::Original]));
    let full = QrReader::default();
    let full_text = full.decode(&grid).text().map(str::to_owned);
    assert_eq!(full_text.as_deref(), Some("TINY"));
    // the extra passes never lose a symbol the original pass finds
    if let Some(text) = original_only.decode(&grid).text() {
        assert_eq!(Some(text), full_text.as_deref());
    }
}
