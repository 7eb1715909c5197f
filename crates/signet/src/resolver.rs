//! Key resolution strategies used by token decoding.
//!
//! The decoder asks a [`KeyResolver`] for the verification key, passing the
//! token header's `kid` when present. Callers may supply a single [`Key`], a
//! kid-keyed mapping, a [`CachedKeySet`](crate::cache::CachedKeySet), or a
//! closure wrapped in [`ResolverFn`].

use crate::errors::SignetError;
use crate::jwk::KeySet;
use crate::key::Key;
use std::collections::HashMap;

/// Resolves the verification key for a token.
pub trait KeyResolver {
    /// Resolve a key, given the token header's `kid` (if any).
    ///
    /// # Errors
    ///
    /// Implementations keyed by kid fail with
    /// [`SignetError::KeyIdNotFound`] when the id resolves to nothing, and
    /// with [`SignetError::MalformedHeader`] when the token carries no kid
    /// at all.
    fn resolve(&self, kid: Option<&str>) -> Result<Key, SignetError>;
}

/// A single key: used directly, regardless of the header's `kid`.
impl KeyResolver for Key {
    fn resolve(&self, _kid: Option<&str>) -> Result<Key, SignetError> {
        Ok(self.clone())
    }
}

impl KeyResolver for KeySet {
    fn resolve(&self, kid: Option<&str>) -> Result<Key, SignetError> {
        let kid = require_kid(kid)?;
        self.get(kid)
            .cloned()
            .ok_or_else(|| SignetError::KeyIdNotFound(kid.to_string()))
    }
}

impl KeyResolver for HashMap<String, Key> {
    fn resolve(&self, kid: Option<&str>) -> Result<Key, SignetError> {
        let kid = require_kid(kid)?;
        self.get(kid)
            .cloned()
            .ok_or_else(|| SignetError::KeyIdNotFound(kid.to_string()))
    }
}

/// Adapter turning a caller-supplied closure into a [`KeyResolver`].
pub struct ResolverFn<F>(pub F);

impl<F> KeyResolver for ResolverFn<F>
where
    F: Fn(Option<&str>) -> Result<Key, SignetError>,
{
    fn resolve(&self, kid: Option<&str>) -> Result<Key, SignetError> {
        (self.0)(kid)
    }
}

pub(crate) fn require_kid(kid: Option<&str>) -> Result<&str, SignetError> {
    kid.ok_or_else(|| {
        SignetError::MalformedHeader(
            "token header must carry a `kid` to resolve against a key set".to_string(),
        )
    })
}
