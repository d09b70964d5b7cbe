//! Core configuration
//!
//! Value-object settings handed to the session by the host application.

use serde::{Deserialize, Serialize};

/// Default byte length above which a structured signing payload is
/// pre-hashed instead of signed whole.
pub const DEFAULT_PAYLOAD_HASH_THRESHOLD: usize = 256;

/// Default fragment payload size when splitting a blob into frames.
pub const DEFAULT_FRAGMENT_SIZE: usize = 512;

/// Settings for a signer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Application identity forwarded to the biometric signing capability.
    pub app_id: String,
    /// Structured payloads longer than this are pre-hashed before signing.
    pub payload_hash_threshold: usize,
    /// Fragment payload size used when encoding multipart frames.
    pub fragment_size: usize,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            app_id: "coldsign".to_string(),
            payload_hash_threshold: DEFAULT_PAYLOAD_HASH_THRESHOLD,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
        }
    }
}
