// Frame payload handling: optional data-URL prefix followed by base64 text.

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use mime::Mime;

use super::error::ScanError;

const DATA_URL_SCHEME: &str = "data:";

// Browsers emit padded standard base64, but hand-built clients often drop the padding.
const FRAME_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The base64 body of a frame plus the media type declared by its data-URL prefix, if any.
#[derive(Debug, PartialEq)]
pub struct FramePayload<'a> {
    pub media_type: Option<Mime>,
    pub base64: &'a str,
}

/// Strips a `data:<media type>;base64,` prefix, keeping everything after the first comma.
/// Text without the `data:` scheme is returned untouched.
pub fn split_data_url(input: &str) -> Result<FramePayload<'_>, ScanError> {
    let input = input.trim_start();

    let has_scheme = input
        .get(..DATA_URL_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(DATA_URL_SCHEME));
    if !has_scheme {
        return Ok(FramePayload {
            media_type: None,
            base64: input,
        });
    }

    let (header, body) = input.split_once(',').ok_or(ScanError::MalformedDataUrl)?;
    let header = &header[DATA_URL_SCHEME.len()..];
    let media_type = header
        .split(';')
        .next()
        .and_then(|media_type| media_type.trim().parse::<Mime>().ok());

    Ok(FramePayload {
        media_type,
        base64: body,
    })
}

/// Decodes standard-alphabet base64, ignoring ASCII whitespace and missing padding.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, ScanError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(FRAME_BASE64.decode(compact)?)
}
