//! Payload decoding and classification
//!
//! Turns a complete scanned blob (single capture or reassembled multipart
//! sequence) into a typed signing request: which family, transaction or
//! message, which local account signs, and the exact material to sign.
//! The payload's shape is decided once here as [`SignableData`]; the
//! signing coordinator never re-infers it.

pub mod legacy;
pub mod uos;

pub use uos::ExtrinsicPayload;

use thiserror::Error;
use tracing::debug;

use crate::accounts::{Account, AccountLookup};
use crate::config::SignerConfig;
use crate::qr::{FRAME_HEADER_LEN, JSON_ENVELOPE_OPEN, MULTIPART_MARKER};
use crate::types::{CryptoScheme, NetworkFamily, RequestKind};

/// Decoding errors; all are fatal to the current request.
///
/// `UnknownAccount` still carries the pre-hash payload so the caller can
/// show what was asked for even though no key can sign it.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty payload")]
    EmptyPayload,

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("unrecognized operation: {0}")]
    UnrecognizedOperation(String),

    #[error("transaction request is missing {0}")]
    MissingTransactionFields(&'static str),

    #[error("no local account for address {address}")]
    UnknownAccount {
        address: String,
        /// Pre-hash payload, surfaced for display despite the failure.
        display_payload: Option<String>,
    },

    #[error("unknown network key {0}")]
    UnknownNetwork(String),
}

/// The material to sign, shaped once at decode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignableData {
    /// Structured transaction payload, signed in its canonical encoding
    /// without a length prefix.
    Extrinsic(ExtrinsicPayload),
    /// An already-computed digest; signed as-is.
    Hash(Vec<u8>),
    /// Raw message bytes.
    Bytes(Vec<u8>),
    /// Printable message text.
    Text(String),
}

/// A decoded, classified signing request. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct UnsignedRequest {
    pub kind: RequestKind,
    pub family: NetworkFamily,
    pub signable: SignableData,
    /// The signable material is a digest of the original payload.
    pub is_hash: bool,
    /// The original payload exceeded the size threshold and was pre-hashed.
    pub is_oversized: bool,
    pub network_key: String,
    /// Scheme declared by the envelope, when any.
    pub scheme: Option<CryptoScheme>,
    pub sender: Account,
    /// Transaction recipient; synthesized placeholder when not locally
    /// known, absent for message requests.
    pub recipient: Option<Account>,
}

/// Structured view of an EVM raw transaction, produced by the external
/// decoder the host supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    /// Destination ("action") address of the transaction.
    pub action_address: String,
    pub chain_id: u64,
}

/// Opaque raw-transaction decoder for the Ethereum-like family.
pub trait TransactionDecoder: Send + Sync {
    fn decode_raw_transaction(&self, rlp: &[u8]) -> Result<DecodedTransaction, String>;
}

/// Decoder/classifier over the external account store and transaction
/// decoder. Stateless; one instance per decode is fine.
pub struct PayloadDecoder<'a, S, D> {
    accounts: &'a S,
    tx_decoder: &'a D,
    config: &'a SignerConfig,
}

impl<'a, S: AccountLookup, D: TransactionDecoder> PayloadDecoder<'a, S, D> {
    pub fn new(accounts: &'a S, tx_decoder: &'a D, config: &'a SignerConfig) -> Self {
        Self { accounts, tx_decoder, config }
    }

    /// Decode a complete blob into a typed signing request.
    ///
    /// `already_reassembled` marks the blob as the re-wrapped output of the
    /// frame assembler: the synthetic frame header is stripped and the
    /// multipart check skipped.
    pub async fn decode(
        &self,
        blob: &[u8],
        already_reassembled: bool,
    ) -> Result<UnsignedRequest, DecodeError> {
        let body: &[u8] = if already_reassembled {
            if blob.len() <= FRAME_HEADER_LEN {
                return Err(DecodeError::EmptyPayload);
            }
            &blob[FRAME_HEADER_LEN..]
        } else {
            match blob.first() {
                None => return Err(DecodeError::EmptyPayload),
                Some(&MULTIPART_MARKER) => {
                    return Err(DecodeError::MalformedEnvelope(
                        "multipart fragment must be reassembled before decoding".to_string(),
                    ))
                }
                Some(_) => blob,
            }
        };

        debug!(len = body.len(), prefix = body[0], "classifying payload envelope");

        match body[0] {
            JSON_ENVELOPE_OPEN => self.decode_legacy(body).await,
            uos::SUBSTRATE_PREFIX => self.decode_uos(body).await,
            other => Err(DecodeError::MalformedEnvelope(format!(
                "unrecognized envelope prefix {other:#04x}"
            ))),
        }
    }
}
