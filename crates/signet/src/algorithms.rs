//! Signing-algorithm registry.
//!
//! Maps each algorithm identifier to its key-family requirement, digest, and
//! sign/verify operation, dispatching over a closed enum so that adding or
//! auditing an algorithm is a compile-time-checked, single-location change.
//!
//! # Security
//!
//! This module is the single gate deciding which operation a given key may
//! perform. The algorithm used to verify is always the algorithm the *key*
//! is bound to, never the one a token header happens to declare: when the
//! two disagree, verification fails with [`SignetError::AlgorithmMismatch`]
//! before any cryptographic code path runs. HMAC verification uses a
//! constant-time comparison; asymmetric verification outcome comes from the
//! underlying primitive's own verify operation.

use crate::errors::SignetError;
use crate::key::{Key, KeyMaterial};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use rsa::pkcs8::DecodePrivateKey;
use sha2::{Sha256, Sha384, Sha512};
use signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use std::fmt;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Closed enumeration of the signing algorithms the registry recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmId {
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
    ES256,
    ES256K,
    ES384,
    ES512,
    EdDSA,
}

/// Key family an algorithm requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Symmetric,
    Rsa,
    EllipticCurve,
    Okp,
}

impl fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyFamily::Symmetric => "symmetric",
            KeyFamily::Rsa => "RSA",
            KeyFamily::EllipticCurve => "EC",
            KeyFamily::Okp => "OKP",
        };
        f.write_str(name)
    }
}

/// Elliptic curves supported by the ES* algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
    P521,
    Secp256k1,
}

impl EcCurve {
    /// JWK `crv` name for this curve.
    #[must_use]
    pub fn crv_name(self) -> &'static str {
        match self {
            EcCurve::P256 => "P-256",
            EcCurve::P384 => "P-384",
            EcCurve::P521 => "P-521",
            EcCurve::Secp256k1 => "secp256k1",
        }
    }

    /// Map a JWK `crv` name onto a curve, if supported.
    #[must_use]
    pub fn from_crv_name(name: &str) -> Option<Self> {
        match name {
            "P-256" => Some(EcCurve::P256),
            "P-384" => Some(EcCurve::P384),
            "P-521" => Some(EcCurve::P521),
            "secp256k1" => Some(EcCurve::Secp256k1),
            _ => None,
        }
    }
}

impl fmt::Display for EcCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.crv_name())
    }
}

impl AlgorithmId {
    /// Wire name of this algorithm, as carried in token headers and JWKs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmId::HS256 => "HS256",
            AlgorithmId::HS384 => "HS384",
            AlgorithmId::HS512 => "HS512",
            AlgorithmId::RS256 => "RS256",
            AlgorithmId::RS384 => "RS384",
            AlgorithmId::RS512 => "RS512",
            AlgorithmId::PS256 => "PS256",
            AlgorithmId::PS384 => "PS384",
            AlgorithmId::PS512 => "PS512",
            AlgorithmId::ES256 => "ES256",
            AlgorithmId::ES256K => "ES256K",
            AlgorithmId::ES384 => "ES384",
            AlgorithmId::ES512 => "ES512",
            AlgorithmId::EdDSA => "EdDSA",
        }
    }

    /// Look an algorithm up by its wire name.
    ///
    /// # Errors
    ///
    /// Returns [`SignetError::UnsupportedAlgorithm`] for any name not in the
    /// closed set. Unsupported names are rejected here, before any
    /// cryptographic code path is reached.
    pub fn from_name(name: &str) -> Result<Self, SignetError> {
        match name {
            "HS256" => Ok(AlgorithmId::HS256),
            "HS384" => Ok(AlgorithmId::HS384),
            "HS512" => Ok(AlgorithmId::HS512),
            "RS256" => Ok(AlgorithmId::RS256),
            "RS384" => Ok(AlgorithmId::RS384),
            "RS512" => Ok(AlgorithmId::RS512),
            "PS256" => Ok(AlgorithmId::PS256),
            "PS384" => Ok(AlgorithmId::PS384),
            "PS512" => Ok(AlgorithmId::PS512),
            "ES256" => Ok(AlgorithmId::ES256),
            "ES256K" => Ok(AlgorithmId::ES256K),
            "ES384" => Ok(AlgorithmId::ES384),
            "ES512" => Ok(AlgorithmId::ES512),
            "EdDSA" => Ok(AlgorithmId::EdDSA),
            other => Err(SignetError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// Key family this algorithm requires.
    #[must_use]
    pub fn family(self) -> KeyFamily {
        match self {
            AlgorithmId::HS256 | AlgorithmId::HS384 | AlgorithmId::HS512 => KeyFamily::Symmetric,
            AlgorithmId::RS256
            | AlgorithmId::RS384
            | AlgorithmId::RS512
            | AlgorithmId::PS256
            | AlgorithmId::PS384
            | AlgorithmId::PS512 => KeyFamily::Rsa,
            AlgorithmId::ES256
            | AlgorithmId::ES256K
            | AlgorithmId::ES384
            | AlgorithmId::ES512 => KeyFamily::EllipticCurve,
            AlgorithmId::EdDSA => KeyFamily::Okp,
        }
    }

    /// Curve required by ES* algorithms; `None` for other families.
    #[must_use]
    pub fn curve(self) -> Option<EcCurve> {
        match self {
            AlgorithmId::ES256 => Some(EcCurve::P256),
            AlgorithmId::ES256K => Some(EcCurve::Secp256k1),
            AlgorithmId::ES384 => Some(EcCurve::P384),
            AlgorithmId::ES512 => Some(EcCurve::P521),
            _ => None,
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sign a message under the algorithm the key is bound to.
///
/// # Errors
///
/// - [`SignetError::UnsupportedAlgorithm`] if the key's bound algorithm name
///   is not in the registry.
/// - [`SignetError::AlgorithmMismatch`] if `algorithm` disagrees with the
///   key's bound algorithm.
/// - [`SignetError::KeyTypeMismatch`] if the material's family or curve does
///   not match the algorithm's requirement.
/// - [`SignetError::MalformedKey`] if the material cannot be turned into a
///   usable signing key.
/// - [`SignetError::Crypto`] if the primitive itself fails.
pub fn sign(algorithm: AlgorithmId, key: &Key, message: &[u8]) -> Result<Vec<u8>, SignetError> {
    let algorithm = bound_algorithm(algorithm, key)?;
    match algorithm {
        AlgorithmId::HS256 => hmac_tag::<HmacSha256>(hmac_secret(algorithm, key)?, message),
        AlgorithmId::HS384 => hmac_tag::<HmacSha384>(hmac_secret(algorithm, key)?, message),
        AlgorithmId::HS512 => hmac_tag::<HmacSha512>(hmac_secret(algorithm, key)?, message),
        AlgorithmId::RS256 => {
            let signing_key =
                rsa::pkcs1v15::SigningKey::<Sha256>::new(rsa_private_key(algorithm, key)?);
            encode_signature(signing_key.try_sign(message))
        }
        AlgorithmId::RS384 => {
            let signing_key =
                rsa::pkcs1v15::SigningKey::<Sha384>::new(rsa_private_key(algorithm, key)?);
            encode_signature(signing_key.try_sign(message))
        }
        AlgorithmId::RS512 => {
            let signing_key =
                rsa::pkcs1v15::SigningKey::<Sha512>::new(rsa_private_key(algorithm, key)?);
            encode_signature(signing_key.try_sign(message))
        }
        AlgorithmId::PS256 => {
            let signing_key = rsa::pss::SigningKey::<Sha256>::new(rsa_private_key(algorithm, key)?);
            encode_signature(signing_key.try_sign_with_rng(&mut rand::thread_rng(), message))
        }
        AlgorithmId::PS384 => {
            let signing_key = rsa::pss::SigningKey::<Sha384>::new(rsa_private_key(algorithm, key)?);
            encode_signature(signing_key.try_sign_with_rng(&mut rand::thread_rng(), message))
        }
        AlgorithmId::PS512 => {
            let signing_key = rsa::pss::SigningKey::<Sha512>::new(rsa_private_key(algorithm, key)?);
            encode_signature(signing_key.try_sign_with_rng(&mut rand::thread_rng(), message))
        }
        AlgorithmId::ES256 => {
            let signing_key = p256::ecdsa::SigningKey::from_pkcs8_der(private_der(algorithm, key)?)
                .map_err(|e| SignetError::MalformedKey(format!("invalid P-256 private key: {e}")))?;
            let result: Result<p256::ecdsa::Signature, _> = signing_key.try_sign(message);
            encode_signature(result)
        }
        AlgorithmId::ES256K => {
            let signing_key = k256::ecdsa::SigningKey::from_pkcs8_der(private_der(algorithm, key)?)
                .map_err(|e| {
                    SignetError::MalformedKey(format!("invalid secp256k1 private key: {e}"))
                })?;
            let result: Result<k256::ecdsa::Signature, _> = signing_key.try_sign(message);
            encode_signature(result)
        }
        AlgorithmId::ES384 => {
            let signing_key = p384::ecdsa::SigningKey::from_pkcs8_der(private_der(algorithm, key)?)
                .map_err(|e| SignetError::MalformedKey(format!("invalid P-384 private key: {e}")))?;
            let result: Result<p384::ecdsa::Signature, _> = signing_key.try_sign(message);
            encode_signature(result)
        }
        AlgorithmId::ES512 => {
            let signing_key = p521_signing_key_from_der(private_der(algorithm, key)?)?;
            let result: Result<p521::ecdsa::Signature, _> = signing_key.try_sign(message);
            encode_signature(result)
        }
        AlgorithmId::EdDSA => {
            let signing_key = ed25519_signing_key(algorithm, key)?;
            encode_signature(signing_key.try_sign(message))
        }
    }
}

/// Verify a signature under the algorithm the key is bound to.
///
/// Returns `Ok(false)` for a signature that does not verify, including one
/// that is structurally invalid (wrong length). Errors are reserved for
/// configuration and policy violations, which are detected before any
/// cryptographic operation runs.
///
/// # Errors
///
/// Same failure modes as [`sign`], minus [`SignetError::Crypto`].
pub fn verify(
    algorithm: AlgorithmId,
    key: &Key,
    message: &[u8],
    signature: &[u8],
) -> Result<bool, SignetError> {
    let algorithm = bound_algorithm(algorithm, key)?;
    match algorithm {
        AlgorithmId::HS256 => hmac_check::<HmacSha256>(hmac_secret(algorithm, key)?, message, signature),
        AlgorithmId::HS384 => hmac_check::<HmacSha384>(hmac_secret(algorithm, key)?, message, signature),
        AlgorithmId::HS512 => hmac_check::<HmacSha512>(hmac_secret(algorithm, key)?, message, signature),
        AlgorithmId::RS256 => {
            let verifying_key =
                rsa::pkcs1v15::VerifyingKey::<Sha256>::new(rsa_public_key(algorithm, key)?);
            let Ok(sig) = rsa::pkcs1v15::Signature::try_from(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::RS384 => {
            let verifying_key =
                rsa::pkcs1v15::VerifyingKey::<Sha384>::new(rsa_public_key(algorithm, key)?);
            let Ok(sig) = rsa::pkcs1v15::Signature::try_from(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::RS512 => {
            let verifying_key =
                rsa::pkcs1v15::VerifyingKey::<Sha512>::new(rsa_public_key(algorithm, key)?);
            let Ok(sig) = rsa::pkcs1v15::Signature::try_from(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::PS256 => {
            let verifying_key =
                rsa::pss::VerifyingKey::<Sha256>::new(rsa_public_key(algorithm, key)?);
            let Ok(sig) = rsa::pss::Signature::try_from(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::PS384 => {
            let verifying_key =
                rsa::pss::VerifyingKey::<Sha384>::new(rsa_public_key(algorithm, key)?);
            let Ok(sig) = rsa::pss::Signature::try_from(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::PS512 => {
            let verifying_key =
                rsa::pss::VerifyingKey::<Sha512>::new(rsa_public_key(algorithm, key)?);
            let Ok(sig) = rsa::pss::Signature::try_from(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::ES256 => {
            let verifying_key = p256_verifying_key(algorithm, key)?;
            let Ok(sig) = p256::ecdsa::Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::ES256K => {
            let verifying_key = k256_verifying_key(algorithm, key)?;
            let Ok(sig) = k256::ecdsa::Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::ES384 => {
            let verifying_key = p384_verifying_key(algorithm, key)?;
            let Ok(sig) = p384::ecdsa::Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::ES512 => {
            let verifying_key = p521_verifying_key(algorithm, key)?;
            let Ok(sig) = p521::ecdsa::Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
        AlgorithmId::EdDSA => {
            let verifying_key = ed25519_verifying_key(algorithm, key)?;
            let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &sig).is_ok())
        }
    }
}

/// Resolve the key's bound algorithm and enforce the confusion gate.
///
/// The declared algorithm must be exactly the key's bound algorithm, and the
/// material must belong to the family (and curve) that algorithm requires.
fn bound_algorithm(declared: AlgorithmId, key: &Key) -> Result<AlgorithmId, SignetError> {
    let bound = AlgorithmId::from_name(key.algorithm())?;
    if bound != declared {
        return Err(SignetError::AlgorithmMismatch { declared, bound });
    }
    check_key_type(bound, key)?;
    Ok(bound)
}

fn check_key_type(algorithm: AlgorithmId, key: &Key) -> Result<(), SignetError> {
    let usable = match (algorithm.family(), key.material()) {
        (KeyFamily::Symmetric, KeyMaterial::Secret(_)) => true,
        (KeyFamily::Rsa, KeyMaterial::RsaComponents { .. } | KeyMaterial::Pkcs8(_)) => true,
        (KeyFamily::EllipticCurve, KeyMaterial::EcPoint { curve, .. }) => {
            algorithm.curve() == Some(*curve)
        }
        (KeyFamily::EllipticCurve, KeyMaterial::Pkcs8(_)) => true,
        (KeyFamily::Okp, KeyMaterial::Ed25519Public(_) | KeyMaterial::Pkcs8(_)) => true,
        _ => false,
    };
    if usable {
        Ok(())
    } else {
        Err(key_type_mismatch(algorithm, key))
    }
}

fn key_type_mismatch(algorithm: AlgorithmId, key: &Key) -> SignetError {
    SignetError::KeyTypeMismatch {
        algorithm,
        key_type: key.material().type_name(),
    }
}

fn encode_signature<S: SignatureEncoding>(
    result: Result<S, signature::Error>,
) -> Result<Vec<u8>, SignetError> {
    result
        .map(|sig| sig.to_vec())
        .map_err(|e| SignetError::Crypto(format!("signing operation failed: {e}")))
}

fn hmac_secret<'a>(algorithm: AlgorithmId, key: &'a Key) -> Result<&'a [u8], SignetError> {
    match key.material() {
        KeyMaterial::Secret(secret) => Ok(secret),
        _ => Err(key_type_mismatch(algorithm, key)),
    }
}

fn hmac_tag<M: Mac + KeyInit>(secret: &[u8], message: &[u8]) -> Result<Vec<u8>, SignetError> {
    let mut mac = <M as KeyInit>::new_from_slice(secret)
        .map_err(|e| SignetError::MalformedKey(format!("HMAC secret rejected: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_check<M: Mac + KeyInit>(
    secret: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, SignetError> {
    let mut mac = <M as KeyInit>::new_from_slice(secret)
        .map_err(|e| SignetError::MalformedKey(format!("HMAC secret rejected: {e}")))?;
    mac.update(message);
    // verify_slice compares in constant time; cost does not depend on the
    // position of the first differing byte.
    Ok(mac.verify_slice(signature).is_ok())
}

fn private_der<'a>(algorithm: AlgorithmId, key: &'a Key) -> Result<&'a [u8], SignetError> {
    match key.material() {
        KeyMaterial::Pkcs8(der) => Ok(der),
        KeyMaterial::EcPoint { .. }
        | KeyMaterial::RsaComponents { .. }
        | KeyMaterial::Ed25519Public(_) => Err(SignetError::MalformedKey(format!(
            "signing with {algorithm} requires PKCS#8 private key material"
        ))),
        KeyMaterial::Secret(_) => Err(key_type_mismatch(algorithm, key)),
    }
}

fn rsa_private_key(algorithm: AlgorithmId, key: &Key) -> Result<rsa::RsaPrivateKey, SignetError> {
    rsa::RsaPrivateKey::from_pkcs8_der(private_der(algorithm, key)?)
        .map_err(|e| SignetError::MalformedKey(format!("invalid RSA private key: {e}")))
}

fn rsa_public_key(algorithm: AlgorithmId, key: &Key) -> Result<rsa::RsaPublicKey, SignetError> {
    match key.material() {
        KeyMaterial::RsaComponents { n, e } => rsa::RsaPublicKey::new(
            rsa::BigUint::from_bytes_be(n),
            rsa::BigUint::from_bytes_be(e),
        )
        .map_err(|e| SignetError::MalformedKey(format!("invalid RSA public components: {e}"))),
        KeyMaterial::Pkcs8(_) => rsa_private_key(algorithm, key).map(|private| private.to_public_key()),
        _ => Err(key_type_mismatch(algorithm, key)),
    }
}

fn uncompressed_point(x: &[u8], y: &[u8]) -> Vec<u8> {
    let mut sec1 = Vec::with_capacity(1 + x.len() + y.len());
    sec1.push(0x04);
    sec1.extend_from_slice(x);
    sec1.extend_from_slice(y);
    sec1
}

fn p256_verifying_key(
    algorithm: AlgorithmId,
    key: &Key,
) -> Result<p256::ecdsa::VerifyingKey, SignetError> {
    match key.material() {
        KeyMaterial::EcPoint { x, y, .. } => {
            p256::ecdsa::VerifyingKey::from_sec1_bytes(&uncompressed_point(x, y))
                .map_err(|e| SignetError::MalformedKey(format!("invalid P-256 public key: {e}")))
        }
        KeyMaterial::Pkcs8(der) => p256::ecdsa::SigningKey::from_pkcs8_der(der)
            .map(|signing| *signing.verifying_key())
            .map_err(|e| SignetError::MalformedKey(format!("invalid P-256 private key: {e}"))),
        _ => Err(key_type_mismatch(algorithm, key)),
    }
}

fn p384_verifying_key(
    algorithm: AlgorithmId,
    key: &Key,
) -> Result<p384::ecdsa::VerifyingKey, SignetError> {
    match key.material() {
        KeyMaterial::EcPoint { x, y, .. } => {
            p384::ecdsa::VerifyingKey::from_sec1_bytes(&uncompressed_point(x, y))
                .map_err(|e| SignetError::MalformedKey(format!("invalid P-384 public key: {e}")))
        }
        KeyMaterial::Pkcs8(der) => p384::ecdsa::SigningKey::from_pkcs8_der(der)
            .map(|signing| *signing.verifying_key())
            .map_err(|e| SignetError::MalformedKey(format!("invalid P-384 private key: {e}"))),
        _ => Err(key_type_mismatch(algorithm, key)),
    }
}

fn p521_verifying_key(
    algorithm: AlgorithmId,
    key: &Key,
) -> Result<p521::ecdsa::VerifyingKey, SignetError> {
    match key.material() {
        KeyMaterial::EcPoint { x, y, .. } => {
            p521::ecdsa::VerifyingKey::from_sec1_bytes(&uncompressed_point(x, y))
                .map_err(|e| SignetError::MalformedKey(format!("invalid P-521 public key: {e}")))
        }
        KeyMaterial::Pkcs8(der) => {
            p521_signing_key_from_der(der).map(|signing| p521::ecdsa::VerifyingKey::from(&signing))
        }
        _ => Err(key_type_mismatch(algorithm, key)),
    }
}

/// Decode a PKCS#8 DER P-521 private key into an ECDSA signing key.
///
/// The `p521` crate's ECDSA `SigningKey` is a newtype wrapper that does not
/// itself implement `DecodePrivateKey`, so the key is decoded through
/// [`p521::SecretKey`] (which does) and the scalar is reconstructed.
fn p521_signing_key_from_der(der: &[u8]) -> Result<p521::ecdsa::SigningKey, SignetError> {
    let secret = p521::SecretKey::from_pkcs8_der(der)
        .map_err(|e| SignetError::MalformedKey(format!("invalid P-521 private key: {e}")))?;
    p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
        .map_err(|e| SignetError::MalformedKey(format!("invalid P-521 private key: {e}")))
}

fn k256_verifying_key(
    algorithm: AlgorithmId,
    key: &Key,
) -> Result<k256::ecdsa::VerifyingKey, SignetError> {
    match key.material() {
        KeyMaterial::EcPoint { x, y, .. } => {
            k256::ecdsa::VerifyingKey::from_sec1_bytes(&uncompressed_point(x, y)).map_err(|e| {
                SignetError::MalformedKey(format!("invalid secp256k1 public key: {e}"))
            })
        }
        KeyMaterial::Pkcs8(der) => k256::ecdsa::SigningKey::from_pkcs8_der(der)
            .map(|signing| *signing.verifying_key())
            .map_err(|e| {
                SignetError::MalformedKey(format!("invalid secp256k1 private key: {e}"))
            }),
        _ => Err(key_type_mismatch(algorithm, key)),
    }
}

fn ed25519_signing_key(
    algorithm: AlgorithmId,
    key: &Key,
) -> Result<ed25519_dalek::SigningKey, SignetError> {
    ed25519_dalek::SigningKey::from_pkcs8_der(private_der(algorithm, key)?)
        .map_err(|e| SignetError::MalformedKey(format!("invalid Ed25519 private key: {e}")))
}

fn ed25519_verifying_key(
    algorithm: AlgorithmId,
    key: &Key,
) -> Result<ed25519_dalek::VerifyingKey, SignetError> {
    match key.material() {
        KeyMaterial::Ed25519Public(x) => {
            let bytes: [u8; 32] = x.as_slice().try_into().map_err(|_| {
                SignetError::MalformedKey(format!(
                    "Ed25519 public key must be 32 bytes, got {}",
                    x.len()
                ))
            })?;
            ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                .map_err(|e| SignetError::MalformedKey(format!("invalid Ed25519 public key: {e}")))
        }
        KeyMaterial::Pkcs8(der) => ed25519_dalek::SigningKey::from_pkcs8_der(der)
            .map(|signing| signing.verifying_key())
            .map_err(|e| SignetError::MalformedKey(format!("invalid Ed25519 private key: {e}"))),
        _ => Err(key_type_mismatch(algorithm, key)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rsa::pkcs8::EncodePrivateKey;

    fn hmac_key(algorithm: &str) -> Key {
        Key::new(KeyMaterial::Secret(b"0123456789abcdef".to_vec()), algorithm).unwrap()
    }

    #[test]
    fn test_from_name_round_trip() {
        for name in [
            "HS256", "HS384", "HS512", "RS256", "RS384", "RS512", "PS256", "PS384", "PS512",
            "ES256", "ES256K", "ES384", "ES512", "EdDSA",
        ] {
            let algorithm = AlgorithmId::from_name(name).unwrap();
            assert_eq!(algorithm.name(), name);
        }
    }

    #[test]
    fn test_from_name_rejects_unknown() {
        for name in ["none", "hs256", "foo", ""] {
            assert!(
                matches!(
                    AlgorithmId::from_name(name),
                    Err(SignetError::UnsupportedAlgorithm(_))
                ),
                "should reject {name:?}"
            );
        }
    }

    #[test]
    fn test_hmac_sign_verify_round_trip() {
        for algorithm in [AlgorithmId::HS256, AlgorithmId::HS384, AlgorithmId::HS512] {
            let key = hmac_key(algorithm.name());
            let tag = sign(algorithm, &key, b"message").unwrap();
            assert!(verify(algorithm, &key, b"message", &tag).unwrap());
            assert!(!verify(algorithm, &key, b"other message", &tag).unwrap());
        }
    }

    #[test]
    fn test_hmac_rejects_wrong_secret() {
        let key = hmac_key("HS256");
        let other = Key::new(KeyMaterial::Secret(b"another-secret!!".to_vec()), "HS256").unwrap();
        let tag = sign(AlgorithmId::HS256, &key, b"message").unwrap();
        assert!(!verify(AlgorithmId::HS256, &other, b"message", &tag).unwrap());
    }

    #[test]
    fn test_hmac_rejects_truncated_tag() {
        let key = hmac_key("HS256");
        let mut tag = sign(AlgorithmId::HS256, &key, b"message").unwrap();
        tag.pop();
        assert!(!verify(AlgorithmId::HS256, &key, b"message", &tag).unwrap());
    }

    #[test]
    fn test_algorithm_mismatch_detected_before_crypto() {
        // Key bound to HS256; declared algorithm says HS512. Must fail with
        // AlgorithmMismatch, never a cross-algorithm comparison.
        let key = hmac_key("HS256");
        let tag = sign(AlgorithmId::HS256, &key, b"message").unwrap();
        let result = verify(AlgorithmId::HS512, &key, b"message", &tag);
        assert!(matches!(
            result,
            Err(SignetError::AlgorithmMismatch {
                declared: AlgorithmId::HS512,
                bound: AlgorithmId::HS256,
            })
        ));
    }

    #[test]
    fn test_unregistered_key_algorithm_rejected() {
        let key = Key::new(KeyMaterial::Secret(b"secret".to_vec()), "foo").unwrap();
        let result = verify(AlgorithmId::HS256, &key, b"message", b"signature");
        assert!(matches!(
            result,
            Err(SignetError::UnsupportedAlgorithm(name)) if name == "foo"
        ));
    }

    #[test]
    fn test_key_type_mismatch_symmetric_material_for_rsa() {
        let key = Key::new(KeyMaterial::Secret(b"secret".to_vec()), "RS256").unwrap();
        let result = verify(AlgorithmId::RS256, &key, b"message", b"signature");
        assert!(matches!(
            result,
            Err(SignetError::KeyTypeMismatch {
                algorithm: AlgorithmId::RS256,
                ..
            })
        ));
    }

    #[test]
    fn test_key_type_mismatch_wrong_curve() {
        let key = Key::new(
            KeyMaterial::EcPoint {
                curve: EcCurve::P384,
                x: vec![1; 48],
                y: vec![2; 48],
            },
            "ES256",
        )
        .unwrap();
        let result = verify(AlgorithmId::ES256, &key, b"message", b"signature");
        assert!(matches!(result, Err(SignetError::KeyTypeMismatch { .. })));
    }

    #[test]
    fn test_signing_with_public_material_rejected() {
        let key = Key::new(
            KeyMaterial::RsaComponents {
                n: vec![1, 2, 3],
                e: vec![1, 0, 1],
            },
            "RS256",
        )
        .unwrap();
        let result = sign(AlgorithmId::RS256, &key, b"message");
        assert!(matches!(result, Err(SignetError::MalformedKey(_))));
    }

    #[test]
    fn test_garbage_rsa_components_fail_at_use_time() {
        // Parses fine as a Key; the registry rejects it when asked to verify.
        let key = Key::new(
            KeyMaterial::RsaComponents {
                n: Vec::new(),
                e: Vec::new(),
            },
            "RS256",
        )
        .unwrap();
        let result = verify(AlgorithmId::RS256, &key, b"message", &[0u8; 256]);
        assert!(matches!(result, Err(SignetError::MalformedKey(_))));
    }

    #[test]
    fn test_ed25519_sign_verify_round_trip() {
        let signing = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let der = signing.to_pkcs8_der().unwrap().as_bytes().to_vec();
        let private = Key::new(KeyMaterial::Pkcs8(der), "EdDSA").unwrap();
        let public = Key::new(
            KeyMaterial::Ed25519Public(signing.verifying_key().to_bytes().to_vec()),
            "EdDSA",
        )
        .unwrap();

        let signature = sign(AlgorithmId::EdDSA, &private, b"message").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify(AlgorithmId::EdDSA, &public, b"message", &signature).unwrap());
        assert!(!verify(AlgorithmId::EdDSA, &public, b"tampered", &signature).unwrap());
        // Private material can verify too, by deriving its public half.
        assert!(verify(AlgorithmId::EdDSA, &private, b"message", &signature).unwrap());
    }

    #[test]
    fn test_ed25519_wrong_length_signature_is_invalid_not_error() {
        let signing = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let public = Key::new(
            KeyMaterial::Ed25519Public(signing.verifying_key().to_bytes().to_vec()),
            "EdDSA",
        )
        .unwrap();
        assert!(!verify(AlgorithmId::EdDSA, &public, b"message", &[0u8; 10]).unwrap());
    }

    #[test]
    fn test_es256_sign_verify_round_trip() {
        let signing = p256::ecdsa::SigningKey::random(&mut OsRng);
        let der = signing.to_pkcs8_der().unwrap().as_bytes().to_vec();
        let private = Key::new(KeyMaterial::Pkcs8(der), "ES256").unwrap();

        let point = signing.verifying_key().to_encoded_point(false);
        let public = Key::new(
            KeyMaterial::EcPoint {
                curve: EcCurve::P256,
                x: point.x().unwrap().to_vec(),
                y: point.y().unwrap().to_vec(),
            },
            "ES256",
        )
        .unwrap();

        let signature = sign(AlgorithmId::ES256, &private, b"message").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify(AlgorithmId::ES256, &public, b"message", &signature).unwrap());
        assert!(!verify(AlgorithmId::ES256, &public, b"tampered", &signature).unwrap());
    }

    #[test]
    fn test_es256k_sign_verify_round_trip() {
        let signing = k256::ecdsa::SigningKey::random(&mut OsRng);
        let der = signing.to_pkcs8_der().unwrap().as_bytes().to_vec();
        let private = Key::new(KeyMaterial::Pkcs8(der), "ES256K").unwrap();

        let signature = sign(AlgorithmId::ES256K, &private, b"message").unwrap();
        assert!(verify(AlgorithmId::ES256K, &private, b"message", &signature).unwrap());
        assert!(!verify(AlgorithmId::ES256K, &private, b"tampered", &signature).unwrap());
    }

    #[test]
    fn test_curve_name_round_trip() {
        for curve in [
            EcCurve::P256,
            EcCurve::P384,
            EcCurve::P521,
            EcCurve::Secp256k1,
        ] {
            assert_eq!(EcCurve::from_crv_name(curve.crv_name()), Some(curve));
        }
        assert_eq!(EcCurve::from_crv_name("P-512"), None);
    }
}
