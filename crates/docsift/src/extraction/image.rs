//! Thumbnails and HTML wrappers for image documents.

use crate::error::{DocsiftError, Result};
use crate::text::string_utils::escape_html;
use crate::types::EncodedImage;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;

const THUMBNAIL_JPEG_QUALITY: u8 = 80;

/// Render a `dim × dim` JPEG thumbnail.
///
/// The canvas starts fully transparent; the decoded image, if any, is scaled
/// to fit while keeping its aspect ratio and centered. Alpha is dropped when
/// encoding, so uncovered areas come out black.
pub fn generate_thumbnail(image: Option<&DynamicImage>, dim: u32) -> Result<EncodedImage> {
    let dim = dim.max(1);
    let mut canvas = RgbaImage::from_pixel(dim, dim, Rgba([0, 0, 0, 0]));

    if let Some(image) = image.filter(|image| image.width() > 0 && image.height() > 0) {
        let scaled = image.resize(dim, dim, FilterType::Triangle).to_rgba8();
        let x = i64::from((dim - scaled.width()) / 2);
        let y = i64::from((dim - scaled.height()) / 2);
        image::imageops::overlay(&mut canvas, &scaled, x, y);
    }

    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut data = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut data, THUMBNAIL_JPEG_QUALITY)
        .write_image(&rgb, dim, dim, image::ColorType::Rgb8.into())
        .map_err(|e| DocsiftError::image_processing_with_source("Failed to encode thumbnail", e))?;

    Ok(EncodedImage {
        mime_type: "image/jpeg".to_string(),
        width: dim,
        height: dim,
        data: data.into_inner(),
    })
}

/// Decode a raster image with the `image` crate, refusing oversized dimensions
/// before allocating pixel buffers.
pub fn decode_raster(bytes: &[u8], max_dimension: u32) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DocsiftError::parsing(format!("Failed to read image format: {}", e)))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| DocsiftError::parsing(format!("Failed to read image dimensions: {}", e)))?;
    if width > max_dimension || height > max_dimension {
        return Err(DocsiftError::validation(format!(
            "Image {}x{} exceeds maximum dimension {}",
            width, height, max_dimension
        )));
    }

    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DocsiftError::parsing(format!("Failed to read image format: {}", e)))?
        .decode()?;
    Ok(image)
}

/// HTML page embedding the original image bytes inline.
pub fn image_html_wrapper(content: &[u8], mime_type: &str, filename: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(content);
    let filename = escape_html(filename);
    format!(
        "<html><head><title>{filename}</title></head><body><img src=\"data:{mime_type};base64,{encoded}\" alt=\"{filename}\"/></body></html>"
    )
}
