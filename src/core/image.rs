use crate::domain::model::EncodedImage;
use crate::utils::error::{Result, TutorError};
use crate::utils::validation::validate_file_extension;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::Path;

pub const JPEG_MIME_TYPE: &str = "image/jpeg";
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

const JPEG_QUALITY: u8 = 85;

/// Decodes an uploaded image, coerces it to 8-bit RGB and re-encodes it as
/// base64 JPEG. Any decode failure is reported as `InvalidImage`.
pub fn normalize(raw: &[u8]) -> Result<EncodedImage> {
    let decoded = image::load_from_memory(raw)
        .map_err(|e| TutorError::invalid_image(format!("cannot decode image: {}", e)))?;

    tracing::debug!(
        "Decoded image {}x{} ({:?})",
        decoded.width(),
        decoded.height(),
        decoded.color()
    );

    // JPEG 只接受三通道，其餘色彩模式 (RGBA、灰階、16-bit) 先轉成 RGB
    let rgb = match decoded {
        DynamicImage::ImageRgb8(buffer) => buffer,
        other => other.to_rgb8(),
    };

    let mut jpeg = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY))
        .map_err(|e| TutorError::invalid_image(format!("cannot encode JPEG: {}", e)))?;

    let data = STANDARD.encode(&jpeg);
    Ok(EncodedImage::new(JPEG_MIME_TYPE, data, jpeg.len()))
}

/// Reads an image file restricted to jpg/jpeg/png and normalizes it.
pub fn load_image_file<P: AsRef<Path>>(path: P) -> Result<EncodedImage> {
    let path = path.as_ref();
    validate_file_extension("image", &path.to_string_lossy(), &ALLOWED_EXTENSIONS)
        .map_err(|e| TutorError::invalid_image(e.to_string()))?;

    let raw = std::fs::read(path).map_err(|e| {
        TutorError::invalid_image(format!("cannot read {}: {}", path.display(), e))
    })?;
    tracing::debug!("Read {} bytes from {}", raw.len(), path.display());
    normalize(&raw)
}

/// Image failures never abort a question: the request proceeds without one.
pub fn attach_image<P: AsRef<Path>>(path: P) -> Option<EncodedImage> {
    let path = path.as_ref();
    match load_image_file(path) {
        Ok(image) => {
            tracing::info!(
                "🖼️ Attached image {} ({} bytes as JPEG)",
                path.display(),
                image.byte_len()
            );
            Some(image)
        }
        Err(e) => {
            tracing::warn!(
                "⚠️ Ignoring image {}: {} ({})",
                path.display(),
                e,
                e.recovery_suggestion()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
    use std::io::{Cursor, Write};
    use tempfile::Builder;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), format)
            .unwrap();
        buffer
    }

    fn decode_jpeg(encoded: &EncodedImage) -> DynamicImage {
        let bytes = STANDARD.decode(encoded.data()).unwrap();
        assert_eq!(bytes.len(), encoded.byte_len());
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap()
    }

    #[test]
    fn test_normalize_rgba_png() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([200, 10, 10, 120]))),
            ImageFormat::Png,
        );

        let encoded = normalize(&png).unwrap();

        assert_eq!(encoded.mime_type(), "image/jpeg");
        let decoded = decode_jpeg(&encoded);
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_normalize_grayscale_png() {
        let png = encode(
            DynamicImage::ImageLuma8(GrayImage::from_pixel(5, 5, Luma([90]))),
            ImageFormat::Png,
        );

        let decoded = decode_jpeg(&normalize(&png).unwrap());
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_normalize_jpeg_input() {
        let jpeg = encode(
            DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]))),
            ImageFormat::Jpeg,
        );

        let decoded = decode_jpeg(&normalize(&jpeg).unwrap());
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
    }

    #[test]
    fn test_normalize_rejects_corrupt_bytes() {
        let result = normalize(b"definitely not an image");
        assert!(matches!(result, Err(TutorError::InvalidImage { .. })));

        let result = normalize(&[]);
        assert!(matches!(result, Err(TutorError::InvalidImage { .. })));
    }

    #[test]
    fn test_load_image_file_extension_restriction() {
        let mut file = Builder::new().suffix(".gif").tempfile().unwrap();
        file.write_all(b"GIF89a").unwrap();

        match load_image_file(file.path()) {
            Err(e @ TutorError::InvalidImage { .. }) => {
                assert!(e.to_string().contains("Unsupported file extension"));
                assert_eq!(e.recovery_suggestion(), "Use a readable .jpg, .jpeg or .png file");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_load_image_file_missing_file_is_invalid_image() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_image_file(dir.path().join("homework.jpg"));

        assert!(matches!(result, Err(TutorError::InvalidImage { .. })));
    }

    #[test]
    fn test_attach_image_recovers_from_corrupt_file() {
        let mut file = Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG broken").unwrap();

        assert!(attach_image(file.path()).is_none());
    }

    #[test]
    fn test_attach_image_from_file() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]))),
            ImageFormat::Png,
        );
        let mut file = Builder::new().suffix(".PNG").tempfile().unwrap();
        file.write_all(&png).unwrap();

        let attached = attach_image(file.path()).unwrap();
        assert_eq!(attached.mime_type(), JPEG_MIME_TYPE);
    }
}
