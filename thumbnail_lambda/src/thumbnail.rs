//! Thumbnail generation: content-sniffed decode, fit-within downscale and
//! JPEG encode.
//!
//! The work is CPU bound, so [`generate_async`] moves it onto the blocking
//! thread pool.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use lambda_runtime::tracing;

use crate::error::ThumbnailError;

/// Content type stored alongside every thumbnail.
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

const THUMB_KEY_PREFIX: &str = "thumb-";

/// Bounding box and encoder settings for thumbnails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThumbnailConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: 128,
            max_height: 128,
            jpeg_quality: 75,
        }
    }
}

/// An encoded thumbnail and its pixel dimensions.
#[derive(Debug)]
pub struct Thumbnail {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Destination key for the thumbnail of `image_key`.
pub fn thumb_key(image_key: &str) -> String {
    format!("{THUMB_KEY_PREFIX}{image_key}")
}

/// Decodes `data`, guessing the format from its content.
pub fn decode(data: &[u8]) -> Result<DynamicImage, ThumbnailError> {
    image::load_from_memory(data).map_err(ThumbnailError::Decode)
}

/// Dimensions of a `width` x `height` image scaled to fit inside
/// `max_width` x `max_height`. Never scales up.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
        return (width, height);
    }

    let ratio = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let scale = |side: u32, max: u32| ((side as f64 * ratio).round() as u32).clamp(1, max.max(1));

    (scale(width, max_width), scale(height, max_height))
}

pub fn resize_to_fit(image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = fit_within(image.width(), image.height(), max_width, max_height);
    if (width, height) == (image.width(), image.height()) {
        return image;
    }
    image.resize_exact(width, height, FilterType::Lanczos3)
}

/// Encodes `image` as baseline JPEG. JPEG has no alpha channel, so the image
/// is flattened to 8-bit RGB first.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Bytes, ThumbnailError> {
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(ThumbnailError::Encode)?;
    Ok(Bytes::from(buf))
}

/// Decode, resize and encode in one go (blocking).
pub fn generate(data: &[u8], config: &ThumbnailConfig) -> Result<Thumbnail, ThumbnailError> {
    let original = decode(data)?;
    tracing::debug!(
        width = original.width(),
        height = original.height(),
        "decoded source image"
    );

    let resized = resize_to_fit(original, config.max_width, config.max_height);
    let data = encode_jpeg(&resized, config.jpeg_quality)?;

    Ok(Thumbnail {
        data,
        width: resized.width(),
        height: resized.height(),
    })
}

/// [`generate`] on the blocking thread pool.
pub async fn generate_async(
    data: Bytes,
    config: ThumbnailConfig,
) -> Result<Thumbnail, ThumbnailError> {
    tokio::task::spawn_blocking(move || generate(&data, &config)).await?
}

#[cfg(test)]
pub(crate) fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
