//! Hash transforms
//!
//! The digest primitives the decoder and coordinator apply to signable
//! material. Signature math itself lives behind the signing capability;
//! only hashing happens here.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use tiny_keccak::{Hasher, Keccak};

type Blake2b256 = Blake2b<U32>;

/// Ethereum message prefix for personal_sign (EIP-191)
const ETH_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Hash a message with the Ethereum personal sign prefix.
///
/// Format: "\x19Ethereum Signed Message:\n" + len(message) + message
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("{}{}", ETH_MESSAGE_PREFIX, message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Compute Blake2b-256, the pre-hash applied to oversized signing payloads.
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Create a checksummed Ethereum address (EIP-55)
pub fn to_checksum_address(address: &str) -> String {
    let address = address.trim_start_matches("0x").to_lowercase();
    let hash = keccak256(address.as_bytes());

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (i, c) in address.chars().enumerate() {
        if c.is_ascii_digit() {
            result.push(c);
        } else {
            let nibble = hash[i / 2];
            let should_upper = if i % 2 == 0 {
                nibble >> 4 >= 8
            } else {
                nibble & 0x0f >= 8
            };
            result.push(if should_upper { c.to_ascii_uppercase() } else { c });
        }
    }

    result
}
