//! Key value type binding material to the one algorithm it may perform.

use crate::algorithms::EcCurve;
use crate::errors::SignetError;
use std::fmt;

/// Raw material backing a [`Key`].
///
/// Public material carries the decoded JWK components; private material is a
/// PKCS#8 DER document whose family is implied by the key's bound algorithm.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// Shared secret for HMAC algorithms (JWK `oct`).
    Secret(Vec<u8>),

    /// Asymmetric private key, PKCS#8 DER. Usable for signing and, by
    /// deriving the public half, for verification.
    Pkcs8(Vec<u8>),

    /// RSA public key as big-endian modulus and exponent (JWK `n`/`e`).
    RsaComponents { n: Vec<u8>, e: Vec<u8> },

    /// Elliptic-curve public point as big-endian affine coordinates
    /// (JWK `crv`/`x`/`y`).
    EcPoint {
        curve: EcCurve,
        x: Vec<u8>,
        y: Vec<u8>,
    },

    /// Ed25519 public key bytes (JWK OKP `x`).
    Ed25519Public(Vec<u8>),
}

impl KeyMaterial {
    /// Human-readable material type, used in mismatch errors.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            KeyMaterial::Secret(_) => "oct".to_string(),
            KeyMaterial::Pkcs8(_) => "PKCS#8".to_string(),
            KeyMaterial::RsaComponents { .. } => "RSA".to_string(),
            KeyMaterial::EcPoint { curve, .. } => format!("EC ({curve})"),
            KeyMaterial::Ed25519Public(_) => "OKP".to_string(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            KeyMaterial::Secret(bytes)
            | KeyMaterial::Pkcs8(bytes)
            | KeyMaterial::Ed25519Public(bytes) => bytes.is_empty(),
            // Structured public components are a value in their own right;
            // zero-length integers surface as MalformedKey at use time.
            KeyMaterial::RsaComponents { .. } | KeyMaterial::EcPoint { .. } => false,
        }
    }
}

/// Secrets and private keys must not leak through logs or debug output.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Secret(_) => f.debug_tuple("Secret").field(&"[REDACTED]").finish(),
            KeyMaterial::Pkcs8(_) => f.debug_tuple("Pkcs8").field(&"[REDACTED]").finish(),
            KeyMaterial::RsaComponents { n, e } => f
                .debug_struct("RsaComponents")
                .field("n_len", &n.len())
                .field("e_len", &e.len())
                .finish(),
            KeyMaterial::EcPoint { curve, x, y } => f
                .debug_struct("EcPoint")
                .field("curve", curve)
                .field("x_len", &x.len())
                .field("y_len", &y.len())
                .finish(),
            KeyMaterial::Ed25519Public(x) => f
                .debug_struct("Ed25519Public")
                .field("len", &x.len())
                .finish(),
        }
    }
}

/// Immutable pairing of key material with the one algorithm it is authorized
/// to perform.
///
/// The algorithm is stored as a string and is deliberately not validated
/// against the registry at construction: a key may be built (for example by
/// the JWK parser) before the registry is ever consulted. The registry
/// rejects unknown algorithm names at the moment of use with
/// [`SignetError::UnsupportedAlgorithm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    material: KeyMaterial,
    algorithm: String,
}

impl Key {
    /// Create a key.
    ///
    /// # Errors
    ///
    /// Returns [`SignetError::MalformedKey`] if the byte material or the
    /// algorithm name is empty.
    pub fn new(material: KeyMaterial, algorithm: impl Into<String>) -> Result<Self, SignetError> {
        let algorithm = algorithm.into();
        if material.is_empty() {
            return Err(SignetError::MalformedKey(
                "key material must not be empty".to_string(),
            ));
        }
        if algorithm.is_empty() {
            return Err(SignetError::MalformedKey(
                "key algorithm must not be empty".to_string(),
            ));
        }
        Ok(Self {
            material,
            algorithm,
        })
    }

    /// The material backing this key.
    #[must_use]
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// The algorithm name this key is bound to.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }
}
