//! Shared types for Coldsign Core
//!
//! Data structures that cross module boundaries are defined here
//! for consistent serialization toward the host application.

use serde::{Deserialize, Serialize};

// =============================================================================
// Network families
// =============================================================================

/// The two protocol families a signing request can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFamily {
    /// EVM chains; requests arrive as a legacy JSON envelope.
    Ethereum,
    /// SS58 chains; requests arrive as a binary envelope.
    Substrate,
}

impl NetworkFamily {
    /// Whether final signatures carry a one-byte scheme tag.
    pub fn uses_tagged_signature(self) -> bool {
        matches!(self, NetworkFamily::Substrate)
    }
}

// =============================================================================
// Request kinds
// =============================================================================

/// What the scanned request asks the holder to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Transaction,
    Message,
}

// =============================================================================
// Crypto schemes
// =============================================================================

/// Signature scheme declared by a request envelope or an account.
///
/// The envelope byte doubles as the one-byte tag prepended to finished
/// signatures on the tagged family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryptoScheme {
    Ed25519,
    Sr25519,
    Ecdsa,
}

impl CryptoScheme {
    pub fn from_envelope_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Ed25519),
            0x01 => Some(Self::Sr25519),
            0x02 => Some(Self::Ecdsa),
            _ => None,
        }
    }

    /// Wire byte for this scheme; also used as the signature tag.
    pub fn envelope_byte(self) -> u8 {
        match self {
            Self::Ed25519 => 0x00,
            Self::Sr25519 => 0x01,
            Self::Ecdsa => 0x02,
        }
    }

    /// Which network family derives keys for this scheme.
    pub fn family(self) -> NetworkFamily {
        match self {
            Self::Ecdsa => NetworkFamily::Ethereum,
            Self::Ed25519 | Self::Sr25519 => NetworkFamily::Substrate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::Sr25519 => "sr25519",
            Self::Ecdsa => "ecdsa",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_byte_roundtrip() {
        for scheme in [CryptoScheme::Ed25519, CryptoScheme::Sr25519, CryptoScheme::Ecdsa] {
            assert_eq!(CryptoScheme::from_envelope_byte(scheme.envelope_byte()), Some(scheme));
        }
        assert_eq!(CryptoScheme::from_envelope_byte(0x7f), None);
    }

    #[test]
    fn tagged_signature_family() {
        assert!(NetworkFamily::Substrate.uses_tagged_signature());
        assert!(!NetworkFamily::Ethereum.uses_tagged_signature());
        assert_eq!(CryptoScheme::Ecdsa.family(), NetworkFamily::Ethereum);
        assert_eq!(CryptoScheme::Sr25519.family(), NetworkFamily::Substrate);
    }
}
