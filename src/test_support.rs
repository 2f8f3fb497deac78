// Fixtures shared by unit tests: real QR symbols rendered into rasters and
// encoded images.

use base64::{Engine as _, prelude::BASE64_STANDARD};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use std::io::Cursor;

const MODULE_PIXELS: usize = 8;
const QUIET_ZONE_MODULES: usize = 4;

/// Renders `payload` as a QR symbol with a quiet zone, black on white.
pub fn qr_raster(payload: &str) -> GrayImage {
    let code = QrCode::new(payload.as_bytes()).expect("payload fits in a QR symbol");
    let modules = code.width();
    let colors = code.to_colors();
    let side = ((modules + 2 * QUIET_ZONE_MODULES) * MODULE_PIXELS) as u32;

    GrayImage::from_fn(side, side, |x, y| {
        let mx = (x as usize / MODULE_PIXELS).checked_sub(QUIET_ZONE_MODULES);
        let my = (y as usize / MODULE_PIXELS).checked_sub(QUIET_ZONE_MODULES);
        match (mx, my) {
            (Some(mx), Some(my))
                if mx < modules && my < modules && matches!(colors[my * modules + mx], Color::Dark) =>
            {
                Luma([0])
            }
            _ => Luma([255]),
        }
    })
}

pub fn blank_raster(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

/// Places two rasters next to each other on a white canvas.
pub fn side_by_side(left: &GrayImage, right: &GrayImage) -> GrayImage {
    let width = left.width() + right.width();
    let height = left.height().max(right.height());
    let mut canvas = blank_raster(width, height);
    image::imageops::replace(&mut canvas, left, 0, 0);
    image::imageops::replace(&mut canvas, right, left.width() as i64, 0);
    canvas
}

/// Encodes a grayscale raster as a color image in `format`.
pub fn encode_raster(raster: &GrayImage, format: ImageFormat) -> Vec<u8> {
    let gray = DynamicImage::ImageLuma8(raster.clone());
    let color = match format {
        ImageFormat::Gif => DynamicImage::ImageRgba8(gray.to_rgba8()),
        _ => DynamicImage::ImageRgb8(gray.to_rgb8()),
    };

    let mut buffer = Cursor::new(Vec::new());
    color
        .write_to(&mut buffer, format)
        .expect("in-memory encoding succeeds");
    buffer.into_inner()
}

pub fn to_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// A 24-bit BMP whose headers declare `width`x`height` but carry no pixel data.
pub fn bmp_without_pixels(width: i32, height: i32) -> Vec<u8> {
    let mut bmp = Vec::new();
    bmp.extend_from_slice(b"BM");
    bmp.extend_from_slice(&54u32.to_le_bytes()); // file size
    bmp.extend_from_slice(&[0; 4]);
    bmp.extend_from_slice(&54u32.to_le_bytes()); // pixel data offset
    bmp.extend_from_slice(&40u32.to_le_bytes()); // BITMAPINFOHEADER
    bmp.extend_from_slice(&width.to_le_bytes());
    bmp.extend_from_slice(&height.to_le_bytes());
    bmp.extend_from_slice(&1u16.to_le_bytes()); // planes
    bmp.extend_from_slice(&24u16.to_le_bytes()); // bits per pixel
    // Uncompressed, no explicit sizes, resolution or palette.
    bmp.extend_from_slice(&[0; 24]);
    bmp
}
