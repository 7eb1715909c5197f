//! Builder pattern for test claims.
//!
//! # Example
//! ```rust,ignore
//! let claims = TestClaimsBuilder::new()
//!     .for_subject("svc-a")
//!     .with_scope("meetings:create")
//!     .expires_in(3600)
//!     .build();
//! ```

use chrono::Utc;
use serde_json::json;
use signet::Claims;

/// Builder for test token claims.
pub struct TestClaimsBuilder {
    sub: String,
    scope: String,
    exp: i64,
    iat: i64,
}

impl TestClaimsBuilder {
    /// Builder with defaults: one-hour expiry from now.
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: "test-subject".to_string(),
            scope: String::new(),
            exp: now + 3600,
            iat: now,
        }
    }

    /// Set the subject.
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the scope (space-separated).
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    /// Set expiry relative to now (seconds; may be negative for an
    /// already-expired token).
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Utc::now().timestamp() + seconds;
        self
    }

    /// Set the issued-at timestamp.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Build the claims mapping.
    pub fn build(self) -> Claims {
        match json!({
            "sub": self.sub,
            "scope": self.scope,
            "exp": self.exp,
            "iat": self.iat,
        }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!("json! object literal"),
        }
    }
}

impl Default for TestClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
