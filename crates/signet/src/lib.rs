//! Compact signed token issuing and validation.
//!
//! `signet` signs and verifies three-part compact tokens
//! (`base64url(header).base64url(payload).base64url(signature)`) used to
//! assert authenticated claims between services, and resolves verification
//! keys from published JWK key-set documents with caching across a remote
//! fetch boundary.
//!
//! # Security
//!
//! - The algorithm used to verify is always the one the resolved key is
//!   bound to; a header declaring anything else is rejected before any
//!   cryptographic operation runs (algorithm-confusion defense).
//! - HMAC comparison is constant-time; asymmetric verification comes from
//!   the underlying primitive's own verify operation.
//! - Tokens are size-checked before parsing.
//! - Secrets and private key material are redacted from `Debug` output.
//!
//! # Example
//!
//! ```rust,ignore
//! use signet::{decode, encode, ClaimsValidator, Header, Key, KeyMaterial};
//!
//! let key = Key::new(KeyMaterial::Secret(secret_bytes), "HS256")?;
//! let token = encode(&Header::for_key(&key)?.with_kid("2025-09"), &claims, &key)?;
//!
//! let validator = ClaimsValidator::with_leeway(60);
//! let claims = decode(&token, &key, &validator)?;
//! ```
//!
//! Decoding against a remote key set:
//!
//! ```rust,ignore
//! use signet::{CachedKeySet, HttpKeySetFetcher, MemoryCacheStore};
//!
//! let keys = CachedKeySet::new(
//!     "https://issuer.example/.well-known/jwks.json",
//!     HttpKeySetFetcher::new(),
//!     MemoryCacheStore::new(),
//! )?
//! .with_ttl(std::time::Duration::from_secs(300));
//!
//! let claims = signet::decode(&token, &keys, &validator)?;
//! ```

#![warn(clippy::pedantic)]

/// Base64url codec for the compact serialization.
pub mod base64url;

/// Signing-algorithm registry and the algorithm-confusion gate.
pub mod algorithms;

/// Cached key set, collaborator traits, and the in-process cache store.
pub mod cache;

/// Temporal claims validation with an injectable time source.
pub mod claims;

/// Error taxonomy.
pub mod errors;

/// Default blocking HTTP key-set fetcher.
pub mod fetch;

/// JWK key-set document parsing.
pub mod jwk;

/// Key value type.
pub mod key;

/// Key resolution strategies for decoding.
pub mod resolver;

/// Compact token codec.
pub mod token;

pub use algorithms::{sign, verify, AlgorithmId, EcCurve, KeyFamily};
pub use cache::{CacheStore, CachedKeySet, KeySetFetcher, MemoryCacheStore};
pub use claims::{
    Claims, ClaimsValidator, FixedTimeSource, SystemTimeSource, TimeSource,
    DEFAULT_LEEWAY_SECONDS,
};
pub use errors::{CacheWriteError, Result, SignetError, TransportError};
pub use fetch::HttpKeySetFetcher;
pub use jwk::{parse_key, parse_key_set, Jwk, KeySet};
pub use key::{Key, KeyMaterial};
pub use resolver::{KeyResolver, ResolverFn};
pub use token::{decode, decode_header, encode, Header, MAX_TOKEN_SIZE_BYTES};
