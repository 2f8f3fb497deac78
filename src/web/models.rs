// API-specific data models for the web server

use crate::scanner::DecodedSymbol;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NO_CODES_IN_IMAGE: &str = "No QR codes found in the image";
pub const NO_CODES_IN_FRAME: &str = "No QR codes detected";

/// Body of POST /scan_frame
#[derive(Deserialize, Debug, Default)]
pub struct FrameRequest {
    /// Raw base64 or a `data:image/...;base64,` URL.
    pub image: Option<String>,
}

impl FrameRequest {
    /// Parses a request body. Only a JSON object can carry an `image` key;
    /// any other well-formed value parses as a request without one.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice(body)? {
            value @ Value::Object(_) => Self::deserialize(value),
            _ => Ok(Self::default()),
        }
    }
}

/// Envelope returned by both scanning endpoints.
/// `results` is omitted entirely when nothing was found.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<DecodedSymbol>>,
    pub message: String,
}

impl ScanResponse {
    pub fn from_symbols(symbols: Vec<DecodedSymbol>, empty_message: &str) -> Self {
        if symbols.is_empty() {
            return Self {
                success: false,
                results: None,
                message: empty_message.to_string(),
            };
        }

        Self {
            success: true,
            message: format!("Found {} QR code(s)", symbols.len()),
            results: Some(symbols),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl HealthResponse {
    pub const HEALTHY: Self = Self {
        status: "healthy",
        message: "QR Scanner is running",
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::SymbolRect;
    use serde_json::json;

    #[test]
    fn test_found_envelope() {
        let symbol = DecodedSymbol {
            data: "https://example.com".to_string(),
            symbol_type: "QRCODE".to_string(),
            rect: SymbolRect {
                left: 32,
                top: 32,
                width: 200,
                height: 200,
            },
        };

        let value = serde_json::to_value(ScanResponse::from_symbols(vec![symbol], NO_CODES_IN_IMAGE))
            .unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "results": [{
                    "data": "https://example.com",
                    "type": "QRCODE",
                    "rect": { "left": 32, "top": 32, "width": 200, "height": 200 }
                }],
                "message": "Found 1 QR code(s)"
            })
        );
    }

    #[test]
    fn test_empty_envelope_omits_results() {
        let value =
            serde_json::to_value(ScanResponse::from_symbols(Vec::new(), NO_CODES_IN_FRAME)).unwrap();
        assert_eq!(
            value,
            json!({ "success": false, "message": "No QR codes detected" })
        );
    }

    #[test]
    fn test_frame_request_image_is_optional() {
        let request = FrameRequest::from_json(b"{}").unwrap();
        assert!(request.image.is_none());

        let request = FrameRequest::from_json(br#"{"image": "abc", "extra": 1}"#).unwrap();
        assert_eq!(request.image.as_deref(), Some("abc"));
    }

    #[test]
    fn test_frame_request_only_reads_objects() {
        for body in [&br#"["abc"]"#[..], b"null", b"\"abc\"", b"42"] {
            let request = FrameRequest::from_json(body).unwrap();
            assert!(request.image.is_none(), "{}", String::from_utf8_lossy(body));
        }

        assert!(FrameRequest::from_json(br#"{"image": 42}"#).is_err());
        assert!(FrameRequest::from_json(b"{\"image\":").is_err());
    }
}
