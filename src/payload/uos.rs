//! Binary envelope (Substrate-like family)
//!
//! Layout: `[0x53, crypto scheme, action, 32-byte public key, payload…]`.
//! Transaction payloads end in the 32-byte block hash that identifies the
//! chain (equal to the genesis hash for immortal transactions); message
//! payloads carry no network key and the sender is resolved by address
//! alone.

use super::{DecodeError, PayloadDecoder, SignableData, TransactionDecoder, UnsignedRequest};
use crate::accounts::{Account, AccountLookup};
use crate::address::{self, Ss58Address};
use crate::crypto;
use crate::networks;
use crate::types::{CryptoScheme, NetworkFamily, RequestKind};

/// Reserved first byte of the binary envelope (`'S'`).
pub(crate) const SUBSTRATE_PREFIX: u8 = 0x53;

const ACTION_MORTAL_PAYLOAD: u8 = 0x00;
const ACTION_PAYLOAD_HASH: u8 = 0x01;
const ACTION_IMMORTAL_PAYLOAD: u8 = 0x02;
const ACTION_MESSAGE: u8 = 0x03;

/// Prefix, scheme byte, action byte and public key.
const ENVELOPE_HEAD_LEN: usize = 35;

/// A structured transaction signing payload.
///
/// The payload body is opaque call data plus signed extras; the trailing
/// 32 bytes are the chain-identifying block hash. The canonical signable
/// form is the bare body; the length-prefixed form is used when the
/// payload is embedded in an enclosing encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtrinsicPayload {
    bytes: Vec<u8>,
}

impl ExtrinsicPayload {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        if bytes.len() < 32 {
            return Err(DecodeError::MissingTransactionFields("the signing payload"));
        }
        Ok(Self { bytes })
    }

    /// Chain-identifying hash carried in the payload tail.
    pub fn network_hash(&self) -> [u8; 32] {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&self.bytes[self.bytes.len() - 32..]);
        hash
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Canonical encoding. With `length_prefixed` the body is preceded by
    /// its SCALE compact length; the signable form suppresses the prefix.
    pub fn encode(&self, length_prefixed: bool) -> Vec<u8> {
        if length_prefixed {
            let mut out = compact_encode(self.bytes.len() as u128);
            out.extend_from_slice(&self.bytes);
            out
        } else {
            self.bytes.clone()
        }
    }
}

/// SCALE compact encoding
pub(crate) fn compact_encode(value: u128) -> Vec<u8> {
    if value < 0x40 {
        vec![(value << 2) as u8]
    } else if value < 0x4000 {
        let v = (value << 2) | 0x01;
        (v as u16).to_le_bytes().to_vec()
    } else if value < 0x40000000 {
        let v = (value << 2) | 0x02;
        (v as u32).to_le_bytes().to_vec()
    } else {
        // Big integer mode
        let bytes_needed = (128 - value.leading_zeros()).div_ceil(8);
        let mut result = vec![((bytes_needed - 4) << 2 | 0x03) as u8];
        for i in 0..bytes_needed {
            result.push((value >> (8 * i)) as u8);
        }
        result
    }
}

impl<'a, S: AccountLookup, D: TransactionDecoder> PayloadDecoder<'a, S, D> {
    pub(super) async fn decode_uos(&self, body: &[u8]) -> Result<UnsignedRequest, DecodeError> {
        if body.len() < ENVELOPE_HEAD_LEN {
            return Err(DecodeError::MalformedEnvelope(
                "envelope shorter than scheme, action and public key".to_string(),
            ));
        }

        let scheme = CryptoScheme::from_envelope_byte(body[1]).ok_or_else(|| {
            DecodeError::MalformedEnvelope(format!("unknown crypto scheme byte {:#04x}", body[1]))
        })?;
        let action = body[2];
        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&body[3..ENVELOPE_HEAD_LEN]);
        let payload = &body[ENVELOPE_HEAD_LEN..];

        match action {
            ACTION_MORTAL_PAYLOAD | ACTION_IMMORTAL_PAYLOAD => {
                self.decode_extrinsic(scheme, public_key, payload, false).await
            }
            ACTION_PAYLOAD_HASH => self.decode_extrinsic(scheme, public_key, payload, true).await,
            ACTION_MESSAGE => self.decode_substrate_message(scheme, public_key, payload).await,
            other => Err(DecodeError::UnrecognizedOperation(format!("{other:#04x}"))),
        }
    }

    async fn decode_extrinsic(
        &self,
        scheme: CryptoScheme,
        public_key: [u8; 32],
        payload: &[u8],
        pre_hashed: bool,
    ) -> Result<UnsignedRequest, DecodeError> {
        if payload.len() < 32 {
            return Err(DecodeError::MissingTransactionFields("the signing payload"));
        }

        let network_key = hex::encode(&payload[payload.len() - 32..]);
        let network = networks::get(&network_key)
            .ok_or_else(|| DecodeError::UnknownNetwork(network_key.clone()))?;

        let literal = Ss58Address::new(public_key, network.ss58_prefix).to_ss58();
        let sender = self
            .find_substrate_sender(&literal, Some(network_key.as_str()), scheme, hex::encode(payload))
            .await?;

        let (signable, is_hash, is_oversized) = if pre_hashed {
            // Payload already hashed upstream: 32-byte digest plus the
            // 32-byte network hash, nothing else.
            if payload.len() != 64 {
                return Err(DecodeError::MissingTransactionFields("the payload digest"));
            }
            (SignableData::Hash(payload[..32].to_vec()), true, false)
        } else if payload.len() > self.config.payload_hash_threshold {
            (
                SignableData::Hash(crypto::blake2b256(payload).to_vec()),
                true,
                true,
            )
        } else {
            (
                SignableData::Extrinsic(ExtrinsicPayload::from_bytes(payload.to_vec())?),
                false,
                false,
            )
        };

        Ok(UnsignedRequest {
            kind: RequestKind::Transaction,
            family: NetworkFamily::Substrate,
            signable,
            is_hash,
            is_oversized,
            network_key: network_key.clone(),
            scheme: Some(scheme),
            sender,
            // Call data is opaque without chain metadata; the true
            // recipient is unknown to this device.
            recipient: Some(Account::placeholder(String::new(), network_key)),
        })
    }

    async fn decode_substrate_message(
        &self,
        scheme: CryptoScheme,
        public_key: [u8; 32],
        message: &[u8],
    ) -> Result<UnsignedRequest, DecodeError> {
        let literal =
            Ss58Address::new(public_key, networks::SUBSTRATE_GENERIC_PREFIX).to_ss58();
        let sender = self
            .find_substrate_sender(
                &literal,
                None,
                scheme,
                String::from_utf8_lossy(message).into_owned(),
            )
            .await?;

        let signable = match std::str::from_utf8(message) {
            Ok(text) if is_printable(text) => SignableData::Text(text.to_string()),
            _ => SignableData::Bytes(message.to_vec()),
        };

        Ok(UnsignedRequest {
            kind: RequestKind::Message,
            family: NetworkFamily::Substrate,
            signable,
            is_hash: false,
            is_oversized: false,
            network_key: sender.network_key.clone(),
            scheme: Some(scheme),
            sender,
            recipient: None,
        })
    }

    /// Exact lookup, then the cross-network fallback; the pre-hash payload
    /// rides along on failure for display.
    async fn find_substrate_sender(
        &self,
        literal_address: &str,
        network_key: Option<&str>,
        scheme: CryptoScheme,
        display_payload: String,
    ) -> Result<Account, DecodeError> {
        if let Some(key) = network_key {
            if let Some(found) = self.accounts.get_by_id(literal_address, key).await {
                return Ok(found);
            }
        }
        if let Some(found) = self.accounts.get_by_address(literal_address).await {
            return Ok(found);
        }
        if let Some(found) =
            address::resolve_across_networks(self.accounts, literal_address, scheme).await
        {
            return Ok(found);
        }
        Err(DecodeError::UnknownAccount {
            address: literal_address.to_string(),
            display_payload: Some(display_payload),
        })
    }
}

fn is_printable(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii() && (!c.is_ascii_control() || c.is_ascii_whitespace()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignerConfig;
    use crate::payload::DecodedTransaction;
    use async_trait::async_trait;

    const POLKADOT_GENESIS: &str =
        "91b171bb158e2d3848fa23a9f1c25182fb8e20313b2c1eb49219da7a70ce90c3";
    const KUSAMA_GENESIS: &str =
        "b0a8d493285c2df73290dfb7e61f870f17b41801197a149ca93654499ea3dafe";

    struct Store(Vec<Account>);

    #[async_trait]
    impl AccountLookup for Store {
        async fn get_by_address(&self, address: &str) -> Option<Account> {
            self.0.iter().find(|a| a.address == address).cloned()
        }

        async fn get_by_id(&self, address: &str, network_key: &str) -> Option<Account> {
            self.0
                .iter()
                .find(|a| a.address == address && a.network_key == network_key)
                .cloned()
        }
    }

    struct NoDecoder;

    impl TransactionDecoder for NoDecoder {
        fn decode_raw_transaction(&self, _rlp: &[u8]) -> Result<DecodedTransaction, String> {
            Err("not an EVM request".to_string())
        }
    }

    fn account_for(public_key: [u8; 32], prefix: u16, genesis: &str) -> Account {
        Account {
            address: Ss58Address::new(public_key, prefix).to_ss58(),
            network_key: genesis.to_string(),
            name: "stash".to_string(),
            scheme: Some(CryptoScheme::Sr25519),
            encrypted_seed: "sealed".to_string(),
            derivation_path: "//stash".to_string(),
        }
    }

    fn envelope(scheme: u8, action: u8, public_key: [u8; 32], payload: &[u8]) -> Vec<u8> {
        let mut blob = vec![SUBSTRATE_PREFIX, scheme, action];
        blob.extend_from_slice(&public_key);
        blob.extend_from_slice(payload);
        blob
    }

    fn tx_payload(body: &[u8], genesis: &str) -> Vec<u8> {
        let mut payload = body.to_vec();
        payload.extend_from_slice(&hex::decode(genesis).unwrap());
        payload
    }

    #[tokio::test]
    async fn small_payload_stays_structured() {
        let pk = [4u8; 32];
        let store = Store(vec![account_for(pk, 0, POLKADOT_GENESIS)]);
        let tx_decoder = NoDecoder;
        let config = SignerConfig::default();
        let decoder = PayloadDecoder::new(&store, &tx_decoder, &config);

        let payload = tx_payload(b"call-and-extras", POLKADOT_GENESIS);
        let blob = envelope(0x01, ACTION_MORTAL_PAYLOAD, pk, &payload);

        let request = decoder.decode(&blob, false).await.unwrap();
        assert_eq!(request.kind, RequestKind::Transaction);
        assert_eq!(request.family, NetworkFamily::Substrate);
        assert_eq!(request.network_key, POLKADOT_GENESIS);
        assert_eq!(request.scheme, Some(CryptoScheme::Sr25519));
        assert!(!request.is_hash);
        assert!(!request.is_oversized);
        match &request.signable {
            SignableData::Extrinsic(extrinsic) => {
                assert_eq!(extrinsic.as_bytes(), payload.as_slice());
                assert_eq!(hex::encode(extrinsic.network_hash()), POLKADOT_GENESIS);
            }
            other => panic!("expected structured payload, got {other:?}"),
        }
        assert!(request.recipient.unwrap().is_placeholder());
    }

    #[tokio::test]
    async fn oversized_payload_is_pre_hashed() {
        let pk = [4u8; 32];
        let store = Store(vec![account_for(pk, 0, POLKADOT_GENESIS)]);
        let tx_decoder = NoDecoder;
        let config = SignerConfig::default();
        let decoder = PayloadDecoder::new(&store, &tx_decoder, &config);

        let payload = tx_payload(&vec![0xCC; 300], POLKADOT_GENESIS);
        let blob = envelope(0x01, ACTION_IMMORTAL_PAYLOAD, pk, &payload);

        let request = decoder.decode(&blob, false).await.unwrap();
        assert!(request.is_hash);
        assert!(request.is_oversized);
        assert_eq!(
            request.signable,
            SignableData::Hash(crypto::blake2b256(&payload).to_vec())
        );
    }

    #[tokio::test]
    async fn pre_hashed_action_takes_digest_verbatim() {
        let pk = [4u8; 32];
        let store = Store(vec![account_for(pk, 0, POLKADOT_GENESIS)]);
        let tx_decoder = NoDecoder;
        let config = SignerConfig::default();
        let decoder = PayloadDecoder::new(&store, &tx_decoder, &config);

        let digest = [0xABu8; 32];
        let payload = tx_payload(&digest, POLKADOT_GENESIS);
        let blob = envelope(0x01, ACTION_PAYLOAD_HASH, pk, &payload);

        let request = decoder.decode(&blob, false).await.unwrap();
        assert!(request.is_hash);
        assert!(!request.is_oversized);
        assert_eq!(request.signable, SignableData::Hash(digest.to_vec()));
    }

    #[tokio::test]
    async fn sender_found_under_alternate_network_prefix() {
        let pk = [6u8; 32];
        // Key is stored under its Kusama encoding, request targets Polkadot.
        let store = Store(vec![account_for(pk, 2, KUSAMA_GENESIS)]);
        let tx_decoder = NoDecoder;
        let config = SignerConfig::default();
        let decoder = PayloadDecoder::new(&store, &tx_decoder, &config);

        let payload = tx_payload(b"transfer", POLKADOT_GENESIS);
        let blob = envelope(0x01, ACTION_MORTAL_PAYLOAD, pk, &payload);

        let request = decoder.decode(&blob, false).await.unwrap();
        assert_eq!(request.sender.address, Ss58Address::new(pk, 2).to_ss58());
    }

    #[tokio::test]
    async fn unknown_sender_surfaces_payload_hex() {
        let pk = [6u8; 32];
        let store = Store(Vec::new());
        let tx_decoder = NoDecoder;
        let config = SignerConfig::default();
        let decoder = PayloadDecoder::new(&store, &tx_decoder, &config);

        let payload = tx_payload(b"transfer", POLKADOT_GENESIS);
        let blob = envelope(0x01, ACTION_MORTAL_PAYLOAD, pk, &payload);

        let err = decoder.decode(&blob, false).await.unwrap_err();
        match err {
            DecodeError::UnknownAccount { display_payload, .. } => {
                assert_eq!(display_payload, Some(hex::encode(&payload)));
            }
            other => panic!("expected UnknownAccount, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_genesis_hash_is_rejected() {
        let pk = [6u8; 32];
        let store = Store(Vec::new());
        let tx_decoder = NoDecoder;
        let config = SignerConfig::default();
        let decoder = PayloadDecoder::new(&store, &tx_decoder, &config);

        let payload = tx_payload(b"transfer", &"ee".repeat(32));
        let blob = envelope(0x01, ACTION_MORTAL_PAYLOAD, pk, &payload);

        let err = decoder.decode(&blob, false).await.unwrap_err();
        assert!(matches!(err, DecodeError::UnknownNetwork(_)));
    }

    #[tokio::test]
    async fn printable_message_decodes_as_text() {
        let pk = [8u8; 32];
        let store = Store(vec![account_for(pk, 42, KUSAMA_GENESIS)]);
        let tx_decoder = NoDecoder;
        let config = SignerConfig::default();
        let decoder = PayloadDecoder::new(&store, &tx_decoder, &config);

        let blob = envelope(0x00, ACTION_MESSAGE, pk, b"I hereby approve.");
        let request = decoder.decode(&blob, false).await.unwrap();
        assert_eq!(request.kind, RequestKind::Message);
        assert_eq!(request.scheme, Some(CryptoScheme::Ed25519));
        assert_eq!(
            request.signable,
            SignableData::Text("I hereby approve.".to_string())
        );
        assert_eq!(request.network_key, KUSAMA_GENESIS);
    }

    #[tokio::test]
    async fn binary_message_decodes_as_bytes() {
        let pk = [8u8; 32];
        let store = Store(vec![account_for(pk, 42, KUSAMA_GENESIS)]);
        let tx_decoder = NoDecoder;
        let config = SignerConfig::default();
        let decoder = PayloadDecoder::new(&store, &tx_decoder, &config);

        let message = [0xFFu8, 0x00, 0x10];
        let blob = envelope(0x00, ACTION_MESSAGE, pk, &message);
        let request = decoder.decode(&blob, false).await.unwrap();
        assert_eq!(request.signable, SignableData::Bytes(message.to_vec()));
    }

    #[tokio::test]
    async fn unknown_action_byte_is_rejected() {
        let store = Store(Vec::new());
        let tx_decoder = NoDecoder;
        let config = SignerConfig::default();
        let decoder = PayloadDecoder::new(&store, &tx_decoder, &config);

        let blob = envelope(0x00, 0x09, [1u8; 32], b"x");
        let err = decoder.decode(&blob, false).await.unwrap_err();
        assert!(matches!(err, DecodeError::UnrecognizedOperation(_)));
    }

    #[test]
    fn compact_encoding_matches_scale() {
        assert_eq!(compact_encode(0), vec![0x00]);
        assert_eq!(compact_encode(1), vec![0x04]);
        assert_eq!(compact_encode(63), vec![0xfc]);
        assert_eq!(compact_encode(64), vec![0x01, 0x01]);
        assert_eq!(compact_encode(16384), vec![0x02, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn length_prefix_is_suppressed_for_signing() {
        let payload = ExtrinsicPayload::from_bytes(vec![0xAA; 40]).unwrap();
        let bare = payload.encode(false);
        let prefixed = payload.encode(true);
        assert_eq!(bare.len(), 40);
        assert_eq!(prefixed.len(), 41);
        assert_eq!(&prefixed[1..], bare.as_slice());
        assert_eq!(prefixed[0], compact_encode(40)[0]);
    }
}
