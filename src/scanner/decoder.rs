// Symbol decoding capability.
// The pipeline only ever sees a grayscale raster going in and raw symbols coming
// out, so the decoding library can be swapped without touching the handlers.

use image::GrayImage;
use tracing::debug;

use super::models::{RawSymbol, SymbolRect};

/// Type tag reported for QR symbols, matching the zbar naming clients expect.
pub const QR_SYMBOL_TYPE: &str = "QRCODE";

pub trait SymbolDecoder: Send + Sync {
    /// Locates and decodes every symbol in `raster`, in the decoder's native order.
    fn detect(&self, raster: &GrayImage) -> Vec<RawSymbol>;
}

/// QR decoder backed by `rqrr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl SymbolDecoder for RqrrDecoder {
    fn detect(&self, raster: &GrayImage) -> Vec<RawSymbol> {
        let width = raster.width() as usize;
        let height = raster.height() as usize;
        let pixels = raster.as_raw();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
            pixels[y * width + x]
        });

        let grids = prepared.detect_grids();
        debug!("rqrr located {} candidate grid(s)", grids.len());

        grids
            .into_iter()
            .filter_map(|grid| {
                let mut payload = Vec::new();
                if let Err(err) = grid.decode_to(&mut payload) {
                    debug!("Skipping grid that failed to decode: {:?}", err);
                    return None;
                }

                Some(RawSymbol {
                    payload,
                    symbol_type: QR_SYMBOL_TYPE.to_string(),
                    rect: SymbolRect::bounding(grid.bounds.iter().map(|p| (p.x, p.y))),
                })
            })
            .collect()
    }
}
