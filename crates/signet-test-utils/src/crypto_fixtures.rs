//! Throwaway keypairs and key-set documents for tests.
//!
//! Every call generates a fresh random keypair; nothing here is suitable
//! for production use.

use rand::rngs::OsRng;
use rsa::pkcs8::EncodePrivateKey;
use rsa::traits::PublicKeyParts;
use serde_json::json;
use signet::{base64url, Key, KeyMaterial};

/// A generated keypair: the private [`Key`] for signing plus the public JWK
/// entry a key-set document would publish for it.
pub struct TestKeypair {
    pub kid: String,
    pub private_key: Key,
    pub public_jwk: serde_json::Value,
}

/// Symmetric key for the HS* algorithms.
pub fn hmac_key(algorithm: &str) -> Key {
    Key::new(
        KeyMaterial::Secret(b"an-hmac-secret-of-adequate-size!".to_vec()),
        algorithm,
    )
    .expect("static HMAC key material is valid")
}

/// Fresh Ed25519 keypair bound to EdDSA.
pub fn ed25519_keypair(kid: &str) -> TestKeypair {
    let signing = ed25519_dalek::SigningKey::generate(&mut OsRng);
    let der = signing
        .to_pkcs8_der()
        .expect("freshly generated key encodes")
        .as_bytes()
        .to_vec();
    let x = signing.verifying_key().to_bytes();

    TestKeypair {
        kid: kid.to_string(),
        private_key: Key::new(KeyMaterial::Pkcs8(der), "EdDSA").expect("valid key"),
        public_jwk: json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "kid": kid,
            "alg": "EdDSA",
            "use": "sig",
            "x": base64url::encode(&x),
        }),
    }
}

/// Fresh P-256 keypair bound to ES256.
pub fn p256_keypair(kid: &str) -> TestKeypair {
    let signing = p256::ecdsa::SigningKey::random(&mut OsRng);
    let der = signing
        .to_pkcs8_der()
        .expect("freshly generated key encodes")
        .as_bytes()
        .to_vec();
    let point = signing.verifying_key().to_encoded_point(false);
    let x = point.x().expect("uncompressed point has x");
    let y = point.y().expect("uncompressed point has y");

    TestKeypair {
        kid: kid.to_string(),
        private_key: Key::new(KeyMaterial::Pkcs8(der), "ES256").expect("valid key"),
        public_jwk: json!({
            "kty": "EC",
            "crv": "P-256",
            "kid": kid,
            "alg": "ES256",
            "use": "sig",
            "x": base64url::encode(x),
            "y": base64url::encode(y),
        }),
    }
}

/// Fresh secp256k1 keypair bound to ES256K.
pub fn es256k_keypair(kid: &str) -> TestKeypair {
    let signing = k256::ecdsa::SigningKey::random(&mut OsRng);
    let der = signing
        .to_pkcs8_der()
        .expect("freshly generated key encodes")
        .as_bytes()
        .to_vec();
    let point = signing.verifying_key().to_encoded_point(false);
    let x = point.x().expect("uncompressed point has x");
    let y = point.y().expect("uncompressed point has y");

    TestKeypair {
        kid: kid.to_string(),
        private_key: Key::new(KeyMaterial::Pkcs8(der), "ES256K").expect("valid key"),
        public_jwk: json!({
            "kty": "EC",
            "crv": "secp256k1",
            "kid": kid,
            "alg": "ES256K",
            "use": "sig",
            "x": base64url::encode(x),
            "y": base64url::encode(y),
        }),
    }
}

/// Fresh 2048-bit RSA keypair bound to the given RS*/PS* algorithm.
///
/// Generation takes a moment in debug builds; reuse the keypair within a
/// test where possible.
pub fn rsa_keypair(kid: &str, algorithm: &str) -> TestKeypair {
    let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
        .expect("RSA key generation succeeds");
    let der = private
        .to_pkcs8_der()
        .expect("freshly generated key encodes")
        .as_bytes()
        .to_vec();
    let public = private.to_public_key();
    let n = public.n().to_bytes_be();
    let e = public.e().to_bytes_be();

    TestKeypair {
        kid: kid.to_string(),
        private_key: Key::new(KeyMaterial::Pkcs8(der), algorithm).expect("valid key"),
        public_jwk: json!({
            "kty": "RSA",
            "kid": kid,
            "alg": algorithm,
            "use": "sig",
            "n": base64url::encode(&n),
            "e": base64url::encode(&e),
        }),
    }
}

/// Serialize a key-set document publishing the given keypairs.
pub fn jwks_document(keypairs: &[&TestKeypair]) -> Vec<u8> {
    let keys: Vec<_> = keypairs
        .iter()
        .map(|keypair| keypair.public_jwk.clone())
        .collect();
    serde_json::to_vec(&json!({ "keys": keys })).expect("document serializes")
}
