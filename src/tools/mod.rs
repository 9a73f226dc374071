//! Image-file and base64 front ends
//!
//! Decodes image containers (files or base64 text, optionally data URLs)
//! to luminance, reports outcomes as status JSON and saves encoded symbols.

use std::env;
use std::fs;
use std::path::Path;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use image::{DynamicImage, GenericImageView, GrayImage};
use log::debug;

use crate::encoder::{Canvas, EncodedSymbol};
use crate::error::DecodeError;
use crate::models::PixelGrid;
use crate::pipeline::QrReader;
use crate::status::StatusReport;

/// Standard alphabet, padding optional
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Quiet zone written around saved symbols, in modules
const QUIET_ZONE: usize = 4;

fn max_dim_from_env() -> Option<u32> {
    match env::var("QR_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) | Err(_) => None,
            Ok(v) => Some(v),
        },
        Err(_) => None,
    }
}

/// Strip a data-URL header, undo form encoding of `+` and drop every
/// character outside the base64 alphabet.
pub fn clean_base64(input: &str) -> String {
    let body = match input.find(',') {
        Some(comma) => &input[comma + 1..],
        None => input,
    };
    body.chars()
        .map(|c| if c == ' ' { '+' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect()
}

/// Convert a decoded image container to luminance, downsizing first when
/// `QR_MAX_DIM` asks for it.
pub fn to_pixel_grid(img: DynamicImage) -> Result<PixelGrid, DecodeError> {
    let img = match max_dim_from_env() {
        Some(max_dim) if img.width().max(img.height()) > max_dim => {
            debug!(
                "downsizing {}x{} to fit {max_dim}",
                img.width(),
                img.height()
            );
            img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
        }
        _ => img,
    };
    let (width, height) = img.dimensions();
    PixelGrid::new(width as usize, height as usize, img.to_luma8().into_raw())
}

/// Decode base64 text (optionally a data URL) holding an image container
pub fn decode_base64_image(input: &str) -> Result<PixelGrid, DecodeError> {
    if input.trim().is_empty() {
        return Err(DecodeError::MissingInput);
    }
    let cleaned = clean_base64(input);
    if cleaned.is_empty() {
        return Err(DecodeError::MissingInput);
    }
    let bytes = LENIENT_BASE64.decode(cleaned.as_bytes())?;
    debug!("base64 payload holds {} bytes", bytes.len());
    to_pixel_grid(image::load_from_memory(&bytes)?)
}

/// Load an image file as luminance
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<PixelGrid, DecodeError> {
    let bytes = fs::read(path)?;
    to_pixel_grid(image::load_from_memory(&bytes)?)
}

/// Decode a base64 image and report the outcome
pub fn decode_base64_status(reader: &QrReader, input: &str) -> StatusReport {
    decode_base64_image(input)
        .map(|grid| reader.decode(&grid))
        .into()
}

/// Decode an image file and report the outcome
pub fn decode_file_status<P: AsRef<Path>>(reader: &QrReader, path: P) -> StatusReport {
    load_image(path).map(|grid| reader.decode(&grid)).into()
}

/// Canvas as an 8-bit grayscale image
pub fn canvas_to_image(canvas: &Canvas) -> Result<GrayImage, DecodeError> {
    let (width, height) = (canvas.width(), canvas.height());
    let too_large = || DecodeError::ImageTooLarge { width, height };
    let w = u32::try_from(width).map_err(|_| too_large())?;
    let h = u32::try_from(height).map_err(|_| too_large())?;
    GrayImage::from_raw(w, h, canvas.pixels().to_vec()).ok_or(DecodeError::DimensionMismatch {
        width,
        height,
        expected: width * height,
        actual: canvas.pixels().len(),
    })
}

/// Render a symbol with a four-module quiet zone and save it; the format
/// follows the file extension.
pub fn save_symbol<P: AsRef<Path>>(
    symbol: &EncodedSymbol,
    module_px: usize,
    path: P,
) -> Result<(), DecodeError> {
    let canvas = Canvas::for_symbol(&symbol.modules, module_px.max(1), QUIET_ZONE);
    canvas_to_image(&canvas)?.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_text;
    use crate::models::ECLevel;
    use std::io::Cursor;

    fn png_base64(text: &str) -> String {
        let symbol = encode_text(text, ECLevel::M).unwrap();
        let canvas = Canvas::for_symbol(&symbol.modules, 4, QUIET_ZONE);
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(canvas_to_image(&canvas).unwrap())
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();
        LENIENT_BASE64.encode(png)
    }

    #[test]
    fn test_clean_base64() {
        assert_eq!(clean_base64("data:image/png;base64,ab c/="), "ab+c/=");
        assert_eq!(clean_base64("ab\r\ncd%"), "abcd");
        assert_eq!(clean_base64("a,b,c"), "bc");
    }

    #[test]
    fn test_missing_input() {
        assert!(matches!(decode_base64_image("   "), Err(DecodeError::MissingInput)));
        assert!(matches!(
            decode_base64_image("data:image/png;base64,%%%"),
            Err(DecodeError::MissingInput)
        ));
    }

    #[test]
    fn test_bad_payloads() {
        assert!(matches!(decode_base64_image("A"), Err(DecodeError::InvalidBase64(_))));
        assert!(matches!(
            decode_base64_image("aGVsbG8gd29ybGQ="),
            Err(DecodeError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_data_url_round_trip() {
        let url = format!("data:image/png;base64,{}", png_base64("HELLO WORLD"));
        let report = decode_base64_status(&QrReader::default(), &url);
        assert_eq!(report.code, "200");
        assert_eq!(report.data.as_deref(), Some("HELLO WORLD"));
    }

    #[test]
    fn test_form_encoded_spaces() {
        let encoded = png_base64("form data").replace('+', " ");
        let grid = decode_base64_image(&encoded).unwrap();
        assert_eq!(QrReader::default().decode(&grid).text(), Some("form data"));
    }

    #[test]
    fn test_blank_image_reports_not_found() {
        let canvas = Canvas::new(64, 64);
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(canvas_to_image(&canvas).unwrap())
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();
        let report = decode_base64_status(&QrReader::default(), &LENIENT_BASE64.encode(png));
        assert_eq!(report.code, "404");
    }

    #[test]
    fn test_missing_file_is_internal_error() {
        let report = decode_file_status(&QrReader::default(), "/nonexistent/qrscan/input.png");
        assert_eq!(report.code, "500");
    }
}
