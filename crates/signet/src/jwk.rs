//! JWK key-set document parsing.
//!
//! Converts a published key-set document (`{"keys": [...]}`) into a
//! [`KeySet`] mapping key ids onto usable [`Key`]s. Parsing the whole
//! document fails only on structural malformation; individual unusable
//! entries are skipped with a warning so that a document with some bad
//! entries still yields a partial, usable set.

use crate::algorithms::EcCurve;
use crate::base64url;
use crate::errors::SignetError;
use crate::key::{Key, KeyMaterial};
use serde::Deserialize;
use std::collections::HashMap;

/// A single JSON Web Key entry.
///
/// Only the attributes this library consumes are modeled; unknown attributes
/// are ignored by deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type: RSA, EC, OKP, or oct.
    pub kty: String,

    /// Key ID. Entries without one cannot be indexed and are skipped.
    #[serde(default)]
    pub kid: Option<String>,

    /// Algorithm name. Derived from `kty`+`crv` when absent.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (e.g. "sig"). Carried for callers; not enforced here.
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// Curve name (EC and OKP keys).
    #[serde(default)]
    pub crv: Option<String>,

    /// Public key or x coordinate (EC, OKP), base64url.
    #[serde(default)]
    pub x: Option<String>,

    /// y coordinate (EC), base64url.
    #[serde(default)]
    pub y: Option<String>,

    /// RSA modulus, base64url big-endian.
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent, base64url big-endian.
    #[serde(default)]
    pub e: Option<String>,

    /// Symmetric key bytes (oct), base64url.
    #[serde(default)]
    pub k: Option<String>,
}

/// Mapping of key id onto [`Key`], built wholesale from one key-set
/// document. A fresh parse fully replaces a prior set; sets are never merged
/// incrementally.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, Key>,
}

impl KeySet {
    /// Wrap an already-built mapping.
    #[must_use]
    pub fn new(keys: HashMap<String, Key>) -> Self {
        Self { keys }
    }

    /// Look up a key by id.
    #[must_use]
    pub fn get(&self, kid: &str) -> Option<&Key> {
        self.keys.get(kid)
    }

    /// Whether a key with this id is present.
    #[must_use]
    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over `(kid, key)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Key)> {
        self.keys.iter().map(|(kid, key)| (kid.as_str(), key))
    }
}

impl FromIterator<(String, Key)> for KeySet {
    fn from_iter<I: IntoIterator<Item = (String, Key)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Parse a key-set document into a [`KeySet`].
///
/// Entries missing a `kid`, or failing [`parse_key`], are skipped (logged at
/// warn level) rather than failing the parse.
///
/// # Errors
///
/// Returns [`SignetError::MalformedKey`] only on structural malformation:
/// the document is not valid JSON, not a JSON object, or its `keys` member
/// is missing or not an array.
pub fn parse_key_set(document: &[u8]) -> Result<KeySet, SignetError> {
    let value: serde_json::Value = serde_json::from_slice(document).map_err(|e| {
        SignetError::MalformedKey(format!("key set document is not valid JSON: {e}"))
    })?;
    let object = value.as_object().ok_or_else(|| {
        SignetError::MalformedKey("key set document must be a JSON object".to_string())
    })?;
    let entries = object
        .get("keys")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| {
            SignetError::MalformedKey(
                "key set document must contain a `keys` array".to_string(),
            )
        })?;

    let mut keys = HashMap::new();
    for entry in entries {
        let jwk: Jwk = match serde_json::from_value(entry.clone()) {
            Ok(jwk) => jwk,
            Err(error) => {
                tracing::warn!(
                    target: "signet.jwk",
                    error = %error,
                    "skipping undecodable key set entry"
                );
                continue;
            }
        };
        let Some(kid) = jwk.kid.clone().filter(|kid| !kid.is_empty()) else {
            tracing::debug!(target: "signet.jwk", "skipping key set entry without kid");
            continue;
        };
        match parse_key(&jwk) {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(error) => {
                tracing::warn!(
                    target: "signet.jwk",
                    kid = %kid,
                    error = %error,
                    "skipping unusable key set entry"
                );
            }
        }
    }

    tracing::debug!(target: "signet.jwk", key_count = keys.len(), "parsed key set");
    Ok(KeySet::new(keys))
}

/// Parse a single JWK entry into a [`Key`].
///
/// The resulting key is bound to the entry's `alg` when present, otherwise
/// to the algorithm derived from `kty`+`crv`. The algorithm *string* is not
/// validated against the registry here; that check happens at verification
/// time.
///
/// # Errors
///
/// - [`SignetError::UnsupportedKeyType`] for a `kty` outside
///   RSA/EC/OKP/oct.
/// - [`SignetError::AlgorithmUndeterminable`] when `alg` is absent and no
///   derivation exists for the key type and curve.
/// - [`SignetError::MalformedKey`] when required fields for the family are
///   missing or not valid base64url.
pub fn parse_key(jwk: &Jwk) -> Result<Key, SignetError> {
    match jwk.kty.as_str() {
        "RSA" => {
            let algorithm = jwk
                .alg
                .clone()
                .ok_or(SignetError::AlgorithmUndeterminable)?;
            let n = decode_field(jwk.n.as_deref(), "RSA", "n")?;
            let e = decode_field(jwk.e.as_deref(), "RSA", "e")?;
            Key::new(KeyMaterial::RsaComponents { n, e }, algorithm)
        }
        "EC" => {
            let curve = ec_curve(jwk)?;
            let algorithm = match jwk.alg.clone() {
                Some(algorithm) => algorithm,
                None => derived_ec_algorithm(curve).to_string(),
            };
            let x = decode_field(jwk.x.as_deref(), "EC", "x")?;
            let y = decode_field(jwk.y.as_deref(), "EC", "y")?;
            Key::new(KeyMaterial::EcPoint { curve, x, y }, algorithm)
        }
        "OKP" => {
            let crv = jwk.crv.as_deref().ok_or_else(|| {
                SignetError::MalformedKey("OKP keys require a `crv` parameter".to_string())
            })?;
            if crv != "Ed25519" {
                return Err(match jwk.alg {
                    Some(_) => {
                        SignetError::MalformedKey(format!("unsupported OKP curve `{crv}`"))
                    }
                    None => SignetError::AlgorithmUndeterminable,
                });
            }
            let algorithm = jwk.alg.clone().unwrap_or_else(|| "EdDSA".to_string());
            let x = decode_field(jwk.x.as_deref(), "OKP", "x")?;
            Key::new(KeyMaterial::Ed25519Public(x), algorithm)
        }
        "oct" => {
            let algorithm = jwk
                .alg
                .clone()
                .ok_or(SignetError::AlgorithmUndeterminable)?;
            let k = decode_field(jwk.k.as_deref(), "oct", "k")?;
            Key::new(KeyMaterial::Secret(k), algorithm)
        }
        other => Err(SignetError::UnsupportedKeyType(other.to_string())),
    }
}

fn ec_curve(jwk: &Jwk) -> Result<EcCurve, SignetError> {
    let crv = jwk.crv.as_deref().ok_or_else(|| {
        SignetError::MalformedKey("EC keys require a `crv` parameter".to_string())
    })?;
    EcCurve::from_crv_name(crv).ok_or_else(|| match jwk.alg {
        Some(_) => SignetError::MalformedKey(format!("unsupported EC curve `{crv}`")),
        None => SignetError::AlgorithmUndeterminable,
    })
}

/// Fixed derivation table used when `alg` is absent.
fn derived_ec_algorithm(curve: EcCurve) -> &'static str {
    match curve {
        EcCurve::P256 => "ES256",
        EcCurve::P384 => "ES384",
        EcCurve::P521 => "ES512",
        EcCurve::Secp256k1 => "ES256K",
    }
}

fn decode_field(
    value: Option<&str>,
    family: &str,
    field: &str,
) -> Result<Vec<u8>, SignetError> {
    let value = value.ok_or_else(|| {
        SignetError::MalformedKey(format!("{family} keys require a `{field}` parameter"))
    })?;
    base64url::decode(value).map_err(|e| {
        SignetError::MalformedKey(format!("{family} key field `{field}` is not base64url: {e}"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn jwk(json: serde_json::Value) -> Jwk {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_parse_rsa_key_with_unvalidated_algorithm() {
        // The parser binds whatever algorithm string the document declares;
        // registry validation happens at verification time.
        let document = br#"{"keys":[{"kid":"foo","kty":"RSA","alg":"foo","n":"","e":""}]}"#;
        let set = parse_key_set(document).unwrap();
        assert_eq!(set.len(), 1);
        let key = set.get("foo").unwrap();
        assert_eq!(key.algorithm(), "foo");
    }

    #[test]
    fn test_parse_key_set_skips_entries_without_kid() {
        let document = br#"{"keys":[
            {"kty":"oct","alg":"HS256","k":"c2VjcmV0"},
            {"kid":"good","kty":"oct","alg":"HS256","k":"c2VjcmV0"}
        ]}"#;
        let set = parse_key_set(document).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("good"));
    }

    #[test]
    fn test_parse_key_set_is_partial_on_bad_entries() {
        let document = br#"{"keys":[
            {"kid":"bad-kty","kty":"XYZ"},
            {"kid":"bad-fields","kty":"RSA","alg":"RS256"},
            {"kid":"not-even-close","kty":7},
            {"kid":"good","kty":"OKP","crv":"Ed25519","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"}
        ]}"#;
        let set = parse_key_set(document).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("good").unwrap().algorithm(), "EdDSA");
    }

    #[test]
    fn test_parse_key_set_structural_failures() {
        for document in [
            &b"not json"[..],
            &br#""just a string""#[..],
            &br#"{"no_keys":[]}"#[..],
            &br#"{"keys":{"kid":"x"}}"#[..],
        ] {
            assert!(
                matches!(parse_key_set(document), Err(SignetError::MalformedKey(_))),
                "should fail structurally: {document:?}"
            );
        }
    }

    #[test]
    fn test_parse_key_set_empty_keys_yields_empty_set() {
        let set = parse_key_set(br#"{"keys":[]}"#).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_parse_key_unsupported_kty() {
        let result = parse_key(&jwk(serde_json::json!({"kty": "PQC", "kid": "x"})));
        assert!(matches!(
            result,
            Err(SignetError::UnsupportedKeyType(kty)) if kty == "PQC"
        ));
    }

    #[test]
    fn test_parse_key_derives_es256_from_curve() {
        let key = parse_key(&jwk(serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4",
            "y": "4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM",
        })))
        .unwrap();
        assert_eq!(key.algorithm(), "ES256");
    }

    #[test]
    fn test_parse_key_derives_eddsa_from_okp_curve() {
        let key = parse_key(&jwk(serde_json::json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo",
        })))
        .unwrap();
        assert_eq!(key.algorithm(), "EdDSA");
    }

    #[test]
    fn test_parse_key_explicit_alg_wins_over_derivation() {
        let key = parse_key(&jwk(serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "alg": "ES256K",
            "x": "MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4",
            "y": "4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM",
        })))
        .unwrap();
        // Bound as declared; the registry rejects the curve mismatch later.
        assert_eq!(key.algorithm(), "ES256K");
    }

    #[test]
    fn test_parse_key_rsa_without_alg_is_undeterminable() {
        let result = parse_key(&jwk(serde_json::json!({
            "kty": "RSA",
            "n": "AQAB",
            "e": "AQAB",
        })));
        assert!(matches!(result, Err(SignetError::AlgorithmUndeterminable)));
    }

    #[test]
    fn test_parse_key_oct_without_alg_is_undeterminable() {
        let result = parse_key(&jwk(serde_json::json!({"kty": "oct", "k": "c2VjcmV0"})));
        assert!(matches!(result, Err(SignetError::AlgorithmUndeterminable)));
    }

    #[test]
    fn test_parse_key_unknown_curve_without_alg_is_undeterminable() {
        let result = parse_key(&jwk(serde_json::json!({
            "kty": "EC",
            "crv": "P-512",
            "x": "AA",
            "y": "AA",
        })));
        assert!(matches!(result, Err(SignetError::AlgorithmUndeterminable)));
    }

    #[test]
    fn test_parse_key_missing_required_fields() {
        let result = parse_key(&jwk(serde_json::json!({"kty": "RSA", "alg": "RS256"})));
        assert!(matches!(result, Err(SignetError::MalformedKey(_))));

        let result = parse_key(&jwk(serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "alg": "ES256",
            "x": "AA",
        })));
        assert!(matches!(result, Err(SignetError::MalformedKey(_))));
    }

    #[test]
    fn test_parse_key_rejects_bad_field_encoding() {
        let result = parse_key(&jwk(serde_json::json!({
            "kty": "oct",
            "alg": "HS256",
            "k": "not+valid/base64url",
        })));
        assert!(matches!(result, Err(SignetError::MalformedKey(_))));
    }

    #[test]
    fn test_parse_key_oct_round_trips_secret() {
        let key = parse_key(&jwk(serde_json::json!({
            "kty": "oct",
            "alg": "HS256",
            "k": "c2VjcmV0",
        })))
        .unwrap();
        assert!(
            matches!(key.material(), crate::key::KeyMaterial::Secret(s) if s.as_slice() == b"secret")
        );
    }
}
