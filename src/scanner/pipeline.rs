use image::ImageFormat;
use std::{path::Path, sync::Arc};
use tracing::{debug, warn};

use super::{
    data_url::{decode_base64, split_data_url},
    decoder::{RqrrDecoder, SymbolDecoder},
    error::ScanError,
    models::DecodedSymbol,
    raster::{decode_color_raster, format_from_mime, format_from_path, to_grayscale},
};

/// Bytes → color raster → grayscale raster → decoded symbols.
///
/// Holds no per-request state; one instance is shared by every request.
#[derive(Clone)]
pub struct DecodePipeline {
    decoder: Arc<dyn SymbolDecoder>,
}

impl Default for DecodePipeline {
    fn default() -> Self {
        Self::new(Arc::new(RqrrDecoder))
    }
}

impl DecodePipeline {
    pub fn new(decoder: Arc<dyn SymbolDecoder>) -> Self {
        Self { decoder }
    }

    /// Decodes a frame given as raw base64 or as a data URL.
    pub fn decode_frame(&self, image: &str) -> Result<Vec<DecodedSymbol>, ScanError> {
        let payload = split_data_url(image)?;
        let hint = payload.media_type.as_ref().and_then(format_from_mime);
        let bytes = decode_base64(payload.base64)?;

        debug!("Frame payload decoded to {} bytes", bytes.len());
        self.decode_bytes(&bytes, hint)
    }

    /// Decodes an image persisted on disk, using its extension as a format hint.
    pub fn decode_file(&self, path: &Path) -> Result<Vec<DecodedSymbol>, ScanError> {
        let bytes = std::fs::read(path)?;
        self.decode_bytes(&bytes, format_from_path(path))
    }

    pub fn decode_bytes(
        &self,
        bytes: &[u8],
        hint: Option<ImageFormat>,
    ) -> Result<Vec<DecodedSymbol>, ScanError> {
        let raster = decode_color_raster(bytes, hint)?;
        let gray = to_grayscale(raster);
        debug!("Scanning {}x{} grayscale raster", gray.width(), gray.height());

        let symbols = self
            .decoder
            .detect(&gray)
            .into_iter()
            .filter_map(|raw| {
                let symbol_type = raw.symbol_type.clone();
                DecodedSymbol::try_from(raw)
                    .inspect_err(|err| {
                        warn!(
                            "Skipping {} symbol with a non UTF-8 payload: {}",
                            symbol_type, err
                        );
                    })
                    .ok()
            })
            .collect();

        Ok(symbols)
    }
}
