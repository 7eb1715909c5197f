//! Temporal claims validation.
//!
//! Enforces `exp`, `nbf`, and `iat` against an injectable time source with a
//! configurable leeway. Temporal checks are opt-in per token: the absence of
//! a claim is never an error.

use crate::errors::SignetError;
use serde_json::Value;

/// Token payload: claim name onto value. Reserved claims `exp`, `nbf`, and
/// `iat` are interpreted as numeric Unix timestamps when present; everything
/// else passes through opaque.
pub type Claims = serde_json::Map<String, Value>;

/// Source of "now" in Unix seconds.
///
/// Always injected explicitly rather than read from an ambient process-wide
/// clock, so that boundary conditions are testable without wall-clock
/// dependence.
pub trait TimeSource: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall-clock time source, the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A frozen time source for deterministic validation.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource(pub i64);

impl TimeSource for FixedTimeSource {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

/// Default clock-skew leeway in seconds.
pub const DEFAULT_LEEWAY_SECONDS: i64 = 0;

/// Validator for the reserved temporal claims.
pub struct ClaimsValidator {
    leeway_seconds: i64,
    time_source: Box<dyn TimeSource>,
}

impl ClaimsValidator {
    /// Validator with zero leeway and the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_leeway(DEFAULT_LEEWAY_SECONDS)
    }

    /// Validator with the given leeway (seconds) and the wall clock.
    #[must_use]
    pub fn with_leeway(leeway_seconds: i64) -> Self {
        Self {
            leeway_seconds,
            time_source: Box::new(SystemTimeSource),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_time_source<T: TimeSource + 'static>(mut self, time_source: T) -> Self {
        self.time_source = Box::new(time_source);
        self
    }

    /// Configured leeway in seconds.
    #[must_use]
    pub fn leeway_seconds(&self) -> i64 {
        self.leeway_seconds
    }

    /// Check every temporal claim that is present. All checks must pass.
    ///
    /// # Errors
    ///
    /// - [`SignetError::TokenExpired`] when `now > exp + leeway`.
    /// - [`SignetError::TokenNotYetValid`] when `now + leeway < nbf`.
    /// - [`SignetError::TokenIssuedInFuture`] when `now + leeway < iat`.
    /// - [`SignetError::MalformedClaim`] when a present claim is not numeric.
    pub fn validate(&self, claims: &Claims) -> Result<(), SignetError> {
        let now = self.time_source.now_unix();
        let leeway = self.leeway_seconds;

        if let Some(exp) = numeric_claim(claims, "exp")? {
            if now > exp.saturating_add(leeway) {
                tracing::debug!(target: "signet.claims", exp, now, leeway, "token expired");
                return Err(SignetError::TokenExpired);
            }
        }

        if let Some(nbf) = numeric_claim(claims, "nbf")? {
            if now.saturating_add(leeway) < nbf {
                tracing::debug!(target: "signet.claims", nbf, now, leeway, "token not yet valid");
                return Err(SignetError::TokenNotYetValid);
            }
        }

        if let Some(iat) = numeric_claim(claims, "iat")? {
            if now.saturating_add(leeway) < iat {
                tracing::debug!(target: "signet.claims", iat, now, leeway, "token issued in the future");
                return Err(SignetError::TokenIssuedInFuture);
            }
        }

        Ok(())
    }
}

impl Default for ClaimsValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClaimsValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsValidator")
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

fn numeric_claim(claims: &Claims, name: &'static str) -> Result<Option<i64>, SignetError> {
    match claims.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or(SignetError::MalformedClaim {
                claim: name,
                reason: "must be a numeric Unix timestamp".to_string(),
            }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn claims(json: serde_json::Value) -> Claims {
        match json {
            Value::Object(map) => map,
            other => panic!("not an object: {other:?}"),
        }
    }

    fn validator(leeway: i64) -> ClaimsValidator {
        ClaimsValidator::with_leeway(leeway).with_time_source(FixedTimeSource(NOW))
    }

    #[test]
    fn test_absent_claims_pass() {
        assert!(validator(0).validate(&claims(json!({"sub": "svc"}))).is_ok());
        assert!(validator(0).validate(&Claims::new()).is_ok());
    }

    #[test]
    fn test_exp_boundary() {
        let leeway = 60;
        // exp = T decodes successfully at now = T + leeway...
        let c = claims(json!({"exp": NOW - leeway}));
        assert!(validator(leeway).validate(&c).is_ok());
        // ...and fails at T + leeway + 1.
        let c = claims(json!({"exp": NOW - leeway - 1}));
        assert!(matches!(
            validator(leeway).validate(&c),
            Err(SignetError::TokenExpired)
        ));
    }

    #[test]
    fn test_exp_zero_leeway() {
        assert!(validator(0).validate(&claims(json!({"exp": NOW}))).is_ok());
        assert!(matches!(
            validator(0).validate(&claims(json!({"exp": NOW - 1}))),
            Err(SignetError::TokenExpired)
        ));
    }

    #[test]
    fn test_nbf_boundary() {
        let leeway = 60;
        // nbf exactly at now + leeway is accepted.
        let c = claims(json!({"nbf": NOW + leeway}));
        assert!(validator(leeway).validate(&c).is_ok());
        let c = claims(json!({"nbf": NOW + leeway + 1}));
        assert!(matches!(
            validator(leeway).validate(&c),
            Err(SignetError::TokenNotYetValid)
        ));
    }

    #[test]
    fn test_iat_boundary() {
        let leeway = 300;
        let c = claims(json!({"iat": NOW + leeway}));
        assert!(validator(leeway).validate(&c).is_ok());
        let c = claims(json!({"iat": NOW + leeway + 1}));
        assert!(matches!(
            validator(leeway).validate(&c),
            Err(SignetError::TokenIssuedInFuture)
        ));
    }

    #[test]
    fn test_iat_in_past_accepted() {
        let c = claims(json!({"iat": NOW - 86_400}));
        assert!(validator(0).validate(&c).is_ok());
    }

    #[test]
    fn test_all_checks_run_together() {
        let c = claims(json!({"exp": NOW + 60, "nbf": NOW - 60, "iat": NOW - 60}));
        assert!(validator(0).validate(&c).is_ok());

        let c = claims(json!({"exp": NOW + 60, "nbf": NOW + 120}));
        assert!(matches!(
            validator(0).validate(&c),
            Err(SignetError::TokenNotYetValid)
        ));
    }

    #[test]
    fn test_non_numeric_claim_is_malformed() {
        for (name, value) in [
            ("exp", json!("soon")),
            ("nbf", json!(true)),
            ("iat", json!([1, 2])),
            ("exp", json!(null)),
        ] {
            let mut c = Claims::new();
            c.insert(name.to_string(), value);
            let result = validator(0).validate(&c);
            assert!(
                matches!(result, Err(SignetError::MalformedClaim { claim, .. }) if claim == name),
                "claim {name} with non-numeric value should be malformed"
            );
        }
    }

    #[test]
    fn test_float_timestamps_accepted() {
        let c = claims(json!({"exp": (NOW as f64) + 0.5}));
        assert!(validator(0).validate(&c).is_ok());
    }

    #[test]
    fn test_system_time_source_is_wall_clock() {
        let now = SystemTimeSource.now_unix();
        // Sanity: after 2020-01-01 and before 2100.
        assert!(now > 1_577_836_800);
        assert!(now < 4_102_444_800);
    }
}
