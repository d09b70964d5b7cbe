//! Account store boundary
//!
//! The core never persists accounts; it reads them through [`AccountLookup`]
//! and treats key material as an opaque handle owned by the secure-storage
//! collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::CryptoScheme;

/// A locally-held identity, addressable by `(address, network_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub network_key: String,
    pub name: String,
    /// Signature scheme the account's key was derived for, when declared.
    pub scheme: Option<CryptoScheme>,
    /// Opaque handle to encrypted key material; consumed by the signing
    /// capability, never interpreted here.
    pub encrypted_seed: String,
    pub derivation_path: String,
}

impl Account {
    /// Synthetic stand-in for a recipient that is not locally known.
    pub fn placeholder(address: impl Into<String>, network_key: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            network_key: network_key.into(),
            name: String::new(),
            scheme: None,
            encrypted_seed: String::new(),
            derivation_path: String::new(),
        }
    }

    /// True when this account was synthesized rather than loaded; it has
    /// no key material and can never sign.
    pub fn is_placeholder(&self) -> bool {
        self.encrypted_seed.is_empty()
    }
}

/// Read-only asynchronous account lookup, implemented by the host's
/// account storage.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn get_by_address(&self, address: &str) -> Option<Account>;
    async fn get_by_id(&self, address: &str, network_key: &str) -> Option<Account>;
}
