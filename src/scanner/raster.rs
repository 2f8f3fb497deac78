use image::{
    DynamicImage, GrayImage, ImageError, ImageFormat, ImageReader, Limits, Luma,
    error::{LimitError, LimitErrorKind},
};
use mime::Mime;
use std::{io::Cursor, path::Path};
use tracing::debug;

use super::error::ScanError;

/// Maps a declared media type to the image format it names.
pub fn format_from_mime(media_type: &Mime) -> Option<ImageFormat> {
    if media_type.type_() != mime::IMAGE {
        return None;
    }

    match media_type.subtype().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpeg" | "jpg" | "pjpeg" => Some(ImageFormat::Jpeg),
        "gif" => Some(ImageFormat::Gif),
        "bmp" | "x-bmp" | "x-ms-bmp" => Some(ImageFormat::Bmp),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Maps a file name's extension to the image format it names.
pub fn format_from_path(path: impl AsRef<Path>) -> Option<ImageFormat> {
    ImageFormat::from_path(path).ok()
}

/// Largest raster accepted for decoding, in pixels. Anything bigger is
/// treated as a decompression bomb.
pub const MAX_IMAGE_PIXELS: u64 = 178_956_970;

// Widest per-pixel layout a decoder may hand back (RGBA, 16 bits per channel).
const MAX_BYTES_PER_PIXEL: u64 = 8;

/// Decodes encoded image bytes into a color raster.
///
/// The format is sniffed from the content first; `hint` is only consulted
/// when the content carries no recognizable signature.
pub fn decode_color_raster(
    bytes: &[u8],
    hint: Option<ImageFormat>,
) -> Result<DynamicImage, ScanError> {
    decode_color_raster_within(bytes, hint, MAX_IMAGE_PIXELS)
}

/// Same as [`decode_color_raster`] with an explicit pixel budget.
///
/// The declared dimensions are read from the header and checked before any
/// pixel data is decoded.
pub fn decode_color_raster_within(
    bytes: &[u8],
    hint: Option<ImageFormat>,
    max_pixels: u64,
) -> Result<DynamicImage, ScanError> {
    let format = match (image::guess_format(bytes), hint) {
        (Ok(format), _) => {
            debug!("Decoding image (sniffed format: {:?})", format);
            format
        }
        (Err(_), Some(format)) => {
            debug!("Decoding image (hinted format: {:?})", format);
            format
        }
        (Err(err), None) => return Err(err.into()),
    };

    let (width, height) =
        ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?;
    let pixels = u64::from(width) * u64::from(height);
    if pixels > max_pixels {
        debug!(
            "Refusing {}x{} raster: {} pixels over the {} pixel budget",
            width, height, pixels, max_pixels
        );
        let limit = LimitError::from_kind(LimitErrorKind::DimensionError);
        return Err(ImageError::Limits(limit).into());
    }

    // Never below the crate's own default allocation cap.
    let mut limits = Limits::default();
    limits.max_alloc = limits
        .max_alloc
        .map(|floor| floor.max(max_pixels.saturating_mul(MAX_BYTES_PER_PIXEL)));

    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    reader.limits(limits);
    Ok(reader.decode()?)
}

/// Converts a color raster to 8-bit luminance using the ITU-R BT.601 weights.
/// Translucent pixels are composited over white first so transparent
/// backgrounds read as light rather than black.
pub fn to_grayscale(image: DynamicImage) -> GrayImage {
    let rgba = match image {
        DynamicImage::ImageLuma8(gray) => return gray,
        other => other.into_rgba8(),
    };

    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let (r, g, b) = (over_white(r, a), over_white(g, a), over_white(b, a));
        Luma([luma_bt601(r, g, b)])
    })
}

fn over_white(channel: u8, alpha: u8) -> u32 {
    let (channel, alpha) = (channel as u32, alpha as u32);
    (channel * alpha + 255 * (255 - alpha) + 127) / 255
}

fn luma_bt601(r: u32, g: u32, b: u32) -> u8 {
    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
}
