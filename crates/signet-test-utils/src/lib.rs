//! Test utilities for the `signet` workspace.
//!
//! Provides throwaway keypairs, JWKS document builders, a claims builder,
//! and scripted collaborator doubles (fetchers and cache stores) for
//! exercising the cached key-set state machine without a network.

/// Throwaway keypairs and key-set document builders.
pub mod crypto_fixtures;

/// Scripted fetcher and cache-store doubles.
pub mod doubles;

/// Builder for test claims.
pub mod claims_builder;

pub use claims_builder::TestClaimsBuilder;
pub use crypto_fixtures::{
    ed25519_keypair, es256k_keypair, hmac_key, jwks_document, p256_keypair, rsa_keypair,
    TestKeypair,
};
pub use doubles::{CountingCacheStore, FailingCacheStore, ScriptedFetcher};
