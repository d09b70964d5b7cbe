//! SS58 addresses and cross-network resolution
//!
//! Address format reference: https://docs.substrate.io/reference/address-formats/
//!
//! The resolver re-derives an unknown address under every known network
//! prefix of the same key-derivation family and retries the account lookup,
//! so a request encoded for one chain can still find the key it belongs to.

use blake2::{Blake2b512, Digest};
use std::fmt;
use thiserror::Error;

use crate::accounts::{Account, AccountLookup};
use crate::networks;
use crate::types::{CryptoScheme, NetworkFamily};

/// Address decoding errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("address too short")]
    TooShort,

    #[error("invalid address prefix")]
    InvalidPrefix,

    #[error("invalid address length")]
    InvalidLength,

    #[error("address checksum mismatch")]
    BadChecksum,
}

/// An SS58 address: a 32-byte public key plus a network prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ss58Address {
    pub public_key: [u8; 32],
    pub prefix: u16,
}

impl Ss58Address {
    pub fn new(public_key: [u8; 32], prefix: u16) -> Self {
        Self { public_key, prefix }
    }

    /// Parse from an SS58-encoded string, verifying the checksum.
    pub fn from_string(s: &str) -> Result<Self, AddressError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;

        if bytes.len() < 35 {
            return Err(AddressError::TooShort);
        }

        let (prefix, prefix_len) = if bytes[0] < 64 {
            (bytes[0] as u16, 1)
        } else if bytes[0] < 128 {
            // Two-byte prefix
            let lower = (bytes[0] & 0x3f) as u16;
            let upper = (bytes[1] as u16) << 6;
            (lower | upper, 2)
        } else {
            return Err(AddressError::InvalidPrefix);
        };

        let pk_start = prefix_len;
        let pk_end = pk_start + 32;
        if bytes.len() != pk_end + 2 {
            return Err(AddressError::InvalidLength);
        }

        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&bytes[pk_start..pk_end]);

        let checksum = &bytes[pk_end..pk_end + 2];
        if checksum != ss58_checksum(&bytes[0..pk_end]) {
            return Err(AddressError::BadChecksum);
        }

        Ok(Self { public_key, prefix })
    }

    /// Encode to an SS58 string.
    pub fn to_ss58(&self) -> String {
        let mut data = Vec::with_capacity(37);

        if self.prefix < 64 {
            data.push(self.prefix as u8);
        } else {
            // Two-byte prefix
            data.push(((self.prefix & 0x003f) | 0x0040) as u8);
            data.push((self.prefix >> 6) as u8);
        }

        data.extend_from_slice(&self.public_key);

        let checksum = ss58_checksum(&data);
        data.extend_from_slice(&checksum);

        bs58::encode(data).into_string()
    }

    /// Same public key under a different network prefix.
    pub fn with_prefix(mut self, prefix: u16) -> Self {
        self.prefix = prefix;
        self
    }
}

impl fmt::Display for Ss58Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ss58())
    }
}

/// Compute SS58 checksum (first 2 bytes of Blake2b-512)
fn ss58_checksum(data: &[u8]) -> [u8; 2] {
    const SS58_PREFIX: &[u8] = b"SS58PRE";

    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX);
    hasher.update(data);
    let hash = hasher.finalize();

    [hash[0], hash[1]]
}

/// Re-derive `raw_address` under every known network prefix of the scheme's
/// key-derivation family and query the store for each candidate, in
/// network-table declaration order. First match wins.
pub async fn resolve_across_networks<S: AccountLookup>(
    store: &S,
    raw_address: &str,
    scheme: CryptoScheme,
) -> Option<Account> {
    match scheme.family() {
        // EVM addresses carry no network prefix; the literal lookup the
        // caller already performed is the only encoding there is.
        NetworkFamily::Ethereum => None,
        NetworkFamily::Substrate => {
            let parsed = Ss58Address::from_string(raw_address).ok()?;
            for network in networks::by_family(NetworkFamily::Substrate) {
                let candidate = Ss58Address::new(parsed.public_key, network.ss58_prefix).to_ss58();
                if let Some(account) = store.get_by_address(&candidate).await {
                    tracing::debug!(network = network.title, "address resolved under alternate prefix");
                    return Some(account);
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn address_roundtrip() {
        let pk = [1u8; 32];
        let addr = Ss58Address::new(pk, 0);
        let parsed = Ss58Address::from_string(&addr.to_ss58()).unwrap();
        assert_eq!(parsed.public_key, pk);
        assert_eq!(parsed.prefix, 0);
    }

    #[test]
    fn prefix_change_keeps_public_key() {
        let pk = [7u8; 32];
        let polkadot = Ss58Address::new(pk, 0);
        let kusama = polkadot.clone().with_prefix(2);
        assert_ne!(polkadot.to_ss58(), kusama.to_ss58());
        assert_eq!(
            Ss58Address::from_string(&kusama.to_ss58()).unwrap().public_key,
            pk
        );
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let encoded = Ss58Address::new([9u8; 32], 2).to_ss58();
        let mut bytes = bs58::decode(&encoded).into_vec().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let corrupted = bs58::encode(bytes).into_string();
        assert_eq!(
            Ss58Address::from_string(&corrupted),
            Err(AddressError::BadChecksum)
        );
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(
            Ss58Address::from_string("not-an-address"),
            Err(AddressError::InvalidBase58(_))
        ));
        assert_eq!(Ss58Address::from_string("1"), Err(AddressError::TooShort));
    }

    struct OneAccountStore {
        account: Account,
    }

    #[async_trait]
    impl AccountLookup for OneAccountStore {
        async fn get_by_address(&self, address: &str) -> Option<Account> {
            (self.account.address == address).then(|| self.account.clone())
        }

        async fn get_by_id(&self, address: &str, network_key: &str) -> Option<Account> {
            (self.account.address == address && self.account.network_key == network_key)
                .then(|| self.account.clone())
        }
    }

    #[tokio::test]
    async fn resolves_under_alternate_prefix() {
        let pk = [5u8; 32];
        // The account is stored under the Kusama encoding...
        let kusama_address = Ss58Address::new(pk, 2).to_ss58();
        let store = OneAccountStore {
            account: Account {
                address: kusama_address.clone(),
                network_key: "b0a8d493285c2df73290dfb7e61f870f17b41801197a149ca93654499ea3dafe"
                    .to_string(),
                name: "stash".to_string(),
                scheme: Some(CryptoScheme::Sr25519),
                encrypted_seed: "sealed".to_string(),
                derivation_path: "//kusama".to_string(),
            },
        };

        // ...but the request arrives encoded for Polkadot.
        let polkadot_address = Ss58Address::new(pk, 0).to_ss58();
        let found = resolve_across_networks(&store, &polkadot_address, CryptoScheme::Sr25519)
            .await
            .unwrap();
        assert_eq!(found.address, kusama_address);
    }

    #[tokio::test]
    async fn unknown_key_resolves_to_none() {
        let store = OneAccountStore {
            account: Account::placeholder("nowhere", "1"),
        };
        let address = Ss58Address::new([3u8; 32], 0).to_ss58();
        assert!(
            resolve_across_networks(&store, &address, CryptoScheme::Sr25519)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn ethereum_family_has_no_alternate_encodings() {
        let store = OneAccountStore {
            account: Account::placeholder("0xabc", "1"),
        };
        assert!(
            resolve_across_networks(&store, "0xdef", CryptoScheme::Ecdsa)
                .await
                .is_none()
        );
    }
}
