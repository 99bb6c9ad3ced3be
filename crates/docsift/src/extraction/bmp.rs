//! Uncompressed BMP decoding.
//!
//! Only 24- and 32-bit `BI_RGB`/`BI_BITFIELDS` bitmaps are decoded. Anything
//! else, and any header that fails validation, yields a blank 0×0 image.
//! The framebuffer only covers the rows the body reaches, and decoding stops
//! at the first out-of-bounds read, keeping the pixels written so far.

use image::{Rgb, RgbImage};

const MAGIC: &[u8; 2] = b"BM";
const FILE_HEADER_LEN: usize = 14;
const DEFAULT_PIXEL_OFFSET: usize = 54;
const OFFSET_PIXEL_DATA: usize = 10;
const OFFSET_WIDTH: usize = 18;
const OFFSET_HEIGHT: usize = 22;
const OFFSET_BITS_PER_PIXEL: usize = 28;
const OFFSET_COMPRESSION: usize = 30;
const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

/// Parsed BMP header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpHeader {
    pub width: u32,
    pub height: u32,
    /// Rows stored top row first (negative height in the header).
    pub top_down: bool,
    pub bits_per_pixel: u16,
    pub pixel_offset: usize,
}

impl BmpHeader {
    /// Parse and validate the header.
    ///
    /// Returns `None` for a wrong magic, unsupported depth or compression, and
    /// dimensions that are zero or exceed `max_dimension`.
    pub fn parse(bytes: &[u8], max_dimension: u32) -> Option<Self> {
        if bytes.len() < OFFSET_COMPRESSION + 4 || &bytes[..2] != MAGIC {
            return None;
        }

        let width = read_i32(bytes, OFFSET_WIDTH)?;
        let raw_height = read_i32(bytes, OFFSET_HEIGHT)?;
        let bits_per_pixel = read_u16(bytes, OFFSET_BITS_PER_PIXEL)?;
        let compression = read_u32(bytes, OFFSET_COMPRESSION)?;

        if bits_per_pixel != 24 && bits_per_pixel != 32 {
            return None;
        }
        if compression != BI_RGB && !(compression == BI_BITFIELDS && bits_per_pixel == 32) {
            return None;
        }
        if width <= 0 || raw_height == 0 || raw_height == i32::MIN {
            return None;
        }

        let width = width as u32;
        let height = raw_height.unsigned_abs();
        if width > max_dimension || height > max_dimension {
            return None;
        }

        let pixel_offset = match read_u32(bytes, OFFSET_PIXEL_DATA) {
            Some(offset) if (offset as usize) >= FILE_HEADER_LEN && (offset as usize) <= bytes.len() => {
                offset as usize
            }
            _ => DEFAULT_PIXEL_OFFSET,
        };

        Some(Self {
            width,
            height,
            top_down: raw_height < 0,
            bits_per_pixel,
            pixel_offset,
        })
    }

    fn bytes_per_pixel(&self) -> usize {
        usize::from(self.bits_per_pixel).div_ceil(8)
    }

    fn unpadded_row_len(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    fn padded_row_len(&self) -> usize {
        self.unpadded_row_len().div_ceil(4) * 4
    }
}

/// Decode a BMP into an RGB framebuffer.
///
/// Never fails: rejected headers and empty bodies give a 0×0 image. A
/// truncated body gives an image cropped to the stored rows it reaches, the
/// last of which may be partially filled.
pub fn decode_bmp(bytes: &[u8], max_dimension: u32) -> RgbImage {
    let Some(header) = BmpHeader::parse(bytes, max_dimension) else {
        return RgbImage::new(0, 0);
    };

    let body = bytes.get(header.pixel_offset..).unwrap_or_default();
    let stride = header.bytes_per_pixel();

    let unpadded = header.unpadded_row_len();
    let padded = header.padded_row_len();
    let height = header.height as usize;
    // Writers that omit padding produce a body too short to contain it.
    let row_len = if padded != unpadded && body.len() >= padded * (height - 1) + unpadded {
        padded
    } else {
        unpadded
    };

    let rows = body.len().div_ceil(row_len).min(height) as u32;
    if rows == 0 {
        tracing::debug!("BMP has no pixel data");
        return RgbImage::new(0, 0);
    }
    if rows < header.height {
        tracing::debug!(rows, declared = header.height, "BMP body truncated, cropping");
    }

    let mut framebuffer = RgbImage::new(header.width, rows);
    'rows: for row in 0..rows {
        let y = if header.top_down { row } else { rows - 1 - row };
        let row_start = row as usize * row_len;
        for x in 0..header.width {
            let at = row_start + x as usize * stride;
            let Some(bgr) = body.get(at..at + 3) else {
                tracing::debug!(row, x, "BMP body truncated, stopping decode");
                break 'rows;
            };
            framebuffer.put_pixel(x, y, Rgb([bgr[2], bgr[1], bgr[0]]));
        }
    }

    framebuffer
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn read_i32(bytes: &[u8], at: usize) -> Option<i32> {
    Some(i32::from_le_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

/// Build an uncompressed bottom-up BMP from RGB rows given top row first.
#[cfg(test)]
pub(crate) fn encode_test_bmp(rows: &[Vec<[u8; 3]>], bits_per_pixel: u16) -> Vec<u8> {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.len()) as u32;
    let bytes_per_pixel = usize::from(bits_per_pixel / 8);
    let row_len = (width as usize * bytes_per_pixel).div_ceil(4) * 4;
    let body_len = row_len * height as usize;

    let mut out = Vec::with_capacity(DEFAULT_PIXEL_OFFSET + body_len);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&((DEFAULT_PIXEL_OFFSET + body_len) as u32).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&(DEFAULT_PIXEL_OFFSET as u32).to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bits_per_pixel.to_le_bytes());
    out.extend_from_slice(&BI_RGB.to_le_bytes());
    out.extend_from_slice(&(body_len as u32).to_le_bytes());
    out.extend_from_slice(&[0; 16]);

    for row in rows.iter().rev() {
        let start = out.len();
        for [r, g, b] in row {
            out.extend_from_slice(&[*b, *g, *r]);
            if bytes_per_pixel == 4 {
                out.push(0xFF);
            }
        }
        out.resize(start + row_len, 0);
    }
    out
}
