//! Signing request coordination
//!
//! Owns the life of a signing request from decoded payload to finished
//! signature blob: renders the exact hex the key must sign, dispatches to
//! one of the signing backends, and tags the result for the families that
//! expect it. The signature math itself lives behind [`SigningCapability`].

pub mod coordinator;

pub use coordinator::SignSession;

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by an external signing capability.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct CapabilityError(pub String);

/// Coordinator errors.
#[derive(Error, Debug)]
pub enum SignError {
    #[error("request was already signed")]
    AlreadySigned,

    #[error("no request staged for signing")]
    NoRequest,

    #[error("data cannot be rendered signable: {0}")]
    UnsignableData(String),

    #[error("signing backend failed: {0}")]
    Backend(String),
}

/// The device's signing primitives, consumed as opaque asynchronous
/// operations. Any failure is reported as-is; this core never retries.
#[async_trait]
pub trait SigningCapability: Send + Sync {
    /// Hardware-backed biometric signing.
    async fn sign_biometric(
        &self,
        app_id: &str,
        key_handle: &str,
        signable_hex: &str,
        encrypted_seed: &str,
    ) -> Result<String, CapabilityError>;

    /// Raw seed/derivation-path signing.
    async fn sign_with_suri(&self, suri: &str, signable_hex: &str)
        -> Result<String, CapabilityError>;

    /// Legacy seed decryption; yields the SURI for [`Self::sign_with_suri`].
    async fn decrypt_seed(&self, encrypted_seed: &str, pin: &str)
        -> Result<String, CapabilityError>;
}
