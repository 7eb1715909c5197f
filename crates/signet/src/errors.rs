//! Error taxonomy for token encoding, verification, and key resolution.
//!
//! Every failure mode is a distinct variant so that callers can react
//! differently to, say, an expired token versus a transport failure. None of
//! these are retried internally; retry policy belongs to the caller.

use crate::algorithms::AlgorithmId;
use thiserror::Error;

/// Errors produced by the token codec, algorithm registry, claims validator,
/// JWK parser, and cached key set.
#[derive(Debug, Error)]
pub enum SignetError {
    /// Input is not valid unpadded base64url.
    #[error("malformed base64url encoding: {0}")]
    MalformedEncoding(String),

    /// Token does not have the three-part `header.payload.signature` shape.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Token exceeds the maximum accepted size. Rejected before any parsing
    /// or cryptographic work.
    #[error("token size {size} exceeds maximum of {max} bytes")]
    TokenTooLarge { size: usize, max: usize },

    /// Token header is not a JSON object or is missing required fields.
    #[error("malformed token header: {0}")]
    MalformedHeader(String),

    /// Token payload is not a JSON object.
    #[error("malformed token payload: {0}")]
    MalformedPayload(String),

    /// Key material or a JWK entry is structurally unusable.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// A reserved temporal claim is present but not numeric.
    #[error("malformed claim `{claim}`: {reason}")]
    MalformedClaim { claim: &'static str, reason: String },

    /// The algorithm identifier is not one the registry recognizes.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The JWK `kty` is not one of RSA, EC, OKP, or oct.
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// A JWK entry carries no `alg` and no algorithm can be derived from its
    /// key type and curve.
    #[error("unable to determine algorithm for key entry")]
    AlgorithmUndeterminable,

    /// The key's family (or curve) does not match what the algorithm
    /// requires, e.g. an RSA algorithm handed symmetric key material.
    #[error("key of type {key_type} cannot be used with algorithm {algorithm}")]
    KeyTypeMismatch {
        algorithm: AlgorithmId,
        key_type: String,
    },

    /// The algorithm declared for the operation disagrees with the algorithm
    /// the key is bound to. Raised before any cryptographic operation runs;
    /// this is the algorithm-confusion defense.
    #[error("declared algorithm {declared} disagrees with key-bound algorithm {bound}")]
    AlgorithmMismatch {
        declared: AlgorithmId,
        bound: AlgorithmId,
    },

    /// The signature does not verify under the resolved key.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// `exp` has passed (beyond leeway).
    #[error("token has expired")]
    TokenExpired,

    /// `nbf` has not been reached yet (beyond leeway).
    #[error("token is not yet valid")]
    TokenNotYetValid,

    /// `iat` lies in the future (beyond leeway).
    #[error("token issued-at timestamp is in the future")]
    TokenIssuedInFuture,

    /// No key with this id could be resolved, even after a fresh fetch of
    /// the key-set document.
    #[error("key id not found: {0}")]
    KeyIdNotFound(String),

    /// The key-set source URI is unusable.
    #[error("invalid key set URI: {0}")]
    InvalidKeySetUri(String),

    /// Fetching the key-set document failed at the transport layer. The
    /// in-memory set and the cache store are left untouched.
    #[error("failed to fetch key set from {uri}")]
    KeySetFetchFailed {
        uri: String,
        #[source]
        source: TransportError,
    },

    /// A cryptographic primitive failed operationally, e.g. signing with a
    /// damaged private key document.
    #[error("cryptographic operation failed: {0}")]
    Crypto(String),
}

/// Failure reported by a [`KeySetFetcher`](crate::cache::KeySetFetcher)
/// collaborator.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Failure reported by a [`CacheStore`](crate::cache::CacheStore) write.
///
/// Non-fatal to the lookup that triggered it: the freshly fetched key set is
/// still usable in memory even when persisting it fails.
#[derive(Debug, Error)]
#[error("cache store write failed: {0}")]
pub struct CacheWriteError(pub String);

/// Result type alias using [`SignetError`].
pub type Result<T> = std::result::Result<T, SignetError>;
