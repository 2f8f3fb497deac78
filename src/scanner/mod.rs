// Image ingestion and symbol decoding shared by the upload and frame endpoints.

mod data_url;
mod decoder;
mod error;
mod models;
mod pipeline;
mod raster;

pub use decoder::{RqrrDecoder, SymbolDecoder};
pub use error::ScanError;
pub use models::{DecodedSymbol, RawSymbol, SymbolRect};
pub use pipeline::DecodePipeline;
