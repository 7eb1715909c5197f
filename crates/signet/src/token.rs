//! Compact token codec: `base64url(header).base64url(payload).base64url(signature)`.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (denial-of-service prevention).
//! - The verification algorithm is the one the resolved key is bound to,
//!   never the one the header declares; disagreement fails with
//!   [`SignetError::AlgorithmMismatch`] (see [`crate::algorithms`]).
//! - No partial results: claims are returned only after signature and
//!   temporal validation both pass.

use crate::algorithms::{self, AlgorithmId};
use crate::base64url;
use crate::claims::{Claims, ClaimsValidator};
use crate::errors::SignetError;
use crate::key::Key;
use crate::resolver::KeyResolver;
use serde::{Deserialize, Serialize};

/// Maximum accepted token size in bytes (8KB).
///
/// Typical tokens are a few hundred bytes; anything near this limit is
/// either misuse or an attempted resource-exhaustion attack, and is rejected
/// before any base64 decoding or cryptographic work.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Algorithm name (required).
    pub alg: String,

    /// Token type, conventionally `"JWT"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Id of the key that signed this token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl Header {
    /// Header declaring the given algorithm, with `typ` set to `"JWT"`.
    #[must_use]
    pub fn new(algorithm: AlgorithmId) -> Self {
        Self {
            alg: algorithm.name().to_string(),
            typ: Some("JWT".to_string()),
            kid: None,
        }
    }

    /// Header matching the algorithm a key is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`SignetError::UnsupportedAlgorithm`] if the key's bound
    /// algorithm name is not in the registry.
    pub fn for_key(key: &Key) -> Result<Self, SignetError> {
        AlgorithmId::from_name(key.algorithm()).map(Self::new)
    }

    /// Attach a key id.
    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }
}

/// Encode and sign a token.
///
/// Header and payload are serialized to canonical JSON (object keys
/// sorted), base64url-encoded, joined with `.`, and signed under the key's
/// bound algorithm. Output is deterministic for identical inputs except
/// where the signature scheme itself is probabilistic (RSA-PSS).
///
/// # Errors
///
/// - [`SignetError::UnsupportedAlgorithm`] if the header declares an
///   algorithm outside the registry.
/// - [`SignetError::AlgorithmMismatch`] if the header's algorithm disagrees
///   with the key's bound algorithm.
/// - Any signing failure from the registry (see [`algorithms::sign`]).
pub fn encode(header: &Header, claims: &Claims, key: &Key) -> Result<String, SignetError> {
    let algorithm = AlgorithmId::from_name(&header.alg)?;
    let header_json = serde_json::to_vec(header)
        .map_err(|e| SignetError::MalformedHeader(e.to_string()))?;
    let payload_json = serde_json::to_vec(claims)
        .map_err(|e| SignetError::MalformedPayload(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        base64url::encode(&header_json),
        base64url::encode(&payload_json)
    );
    let signature = algorithms::sign(algorithm, key, signing_input.as_bytes())?;

    Ok(format!("{signing_input}.{}", base64url::encode(&signature)))
}

/// Decode a token, verify its signature, and validate its temporal claims.
///
/// The verification key comes from `keys`: a single [`Key`], a kid-keyed
/// mapping, a [`CachedKeySet`](crate::cache::CachedKeySet), or a closure.
/// Returns the claims mapping only on full success.
///
/// # Errors
///
/// Every failure mode is distinguishable; see [`SignetError`]. In
/// particular: [`SignetError::MalformedToken`] for a wrong part count,
/// [`SignetError::SignatureInvalid`] for a signature mismatch,
/// [`SignetError::KeyIdNotFound`] when a kid-keyed resolver exhausts its
/// options, and the temporal errors from [`ClaimsValidator::validate`].
pub fn decode<R: KeyResolver + ?Sized>(
    token: &str,
    keys: &R,
    validator: &ClaimsValidator,
) -> Result<Claims, SignetError> {
    check_size(token)?;
    let (header_part, payload_part, signature_part) = split_token(token)?;

    let header = decode_header_part(header_part)?;
    let algorithm = AlgorithmId::from_name(&header.alg)?;

    let key = keys.resolve(header.kid.as_deref())?;

    let signature = base64url::decode(signature_part)?;
    let signing_input = format!("{header_part}.{payload_part}");
    if !algorithms::verify(algorithm, &key, signing_input.as_bytes(), &signature)? {
        tracing::debug!(target: "signet.token", alg = %algorithm, "signature verification failed");
        return Err(SignetError::SignatureInvalid);
    }

    let payload = base64url::decode(payload_part)?;
    let claims = parse_claims(&payload)?;
    validator.validate(&claims)?;

    Ok(claims)
}

/// Read a token's header without verifying anything.
///
/// # Security
///
/// This does NOT validate the token. Use it only to pre-select keys (for
/// example by `kid`); the token must still be fully verified afterwards.
///
/// # Errors
///
/// Same structural failure modes as [`decode`] up to the header stage.
pub fn decode_header(token: &str) -> Result<Header, SignetError> {
    check_size(token)?;
    let (header_part, _, _) = split_token(token)?;
    decode_header_part(header_part)
}

fn check_size(token: &str) -> Result<(), SignetError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "signet.token",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "token rejected: size exceeds maximum allowed"
        );
        return Err(SignetError::TokenTooLarge {
            size: token.len(),
            max: MAX_TOKEN_SIZE_BYTES,
        });
    }
    Ok(())
}

fn split_token(token: &str) -> Result<(&str, &str, &str), SignetError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => Err(SignetError::MalformedToken(
            "expected three non-empty dot-separated segments".to_string(),
        )),
    }
}

fn decode_header_part(part: &str) -> Result<Header, SignetError> {
    let bytes = base64url::decode(part)?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| SignetError::MalformedHeader(format!("header is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(SignetError::MalformedHeader(
            "header must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value)
        .map_err(|e| SignetError::MalformedHeader(format!("unusable header fields: {e}")))
}

fn parse_claims(payload: &[u8]) -> Result<Claims, SignetError> {
    let value: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| SignetError::MalformedPayload(format!("payload is not valid JSON: {e}")))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(SignetError::MalformedPayload(
            "payload must be a JSON object".to_string(),
        )),
    }
}
