//! Unpadded base64url codec for the compact token format.
//!
//! Encoding always emits the url-safe alphabet with trailing `=` stripped.
//! Decoding accepts both unpadded and padded input but rejects characters
//! outside the url-safe alphabet and invalid lengths.

use crate::errors::SignetError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::{alphabet, engine, Engine};

/// Url-safe engine that tolerates optional trailing padding on decode.
const URL_SAFE_INDIFFERENT: engine::GeneralPurpose = engine::GeneralPurpose::new(
    &alphabet::URL_SAFE,
    engine::GeneralPurposeConfig::new()
        .with_decode_padding_mode(engine::DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode a base64url string, with or without padding.
///
/// # Errors
///
/// Returns [`SignetError::MalformedEncoding`] if the input contains
/// characters outside the url-safe alphabet or has an invalid length.
pub fn decode(input: &str) -> Result<Vec<u8>, SignetError> {
    URL_SAFE_INDIFFERENT
        .decode(input)
        .map_err(|e| SignetError::MalformedEncoding(e.to_string()))
}
