//! Coldsign Core Library
//!
//! Rust signing core for an air-gapped cold-storage wallet.
//!
//! # Architecture
//!
//! This crate provides:
//! - **qr**: multipart frame protocol and reassembly with missed-frame tracking
//! - **payload**: decoding scanned blobs into typed signing requests
//! - **address**: SS58 handling and cross-network account resolution
//! - **signing**: the signing state machine and backend dispatch
//! - **session**: the per-interaction coordinator tying the above together
//!
//! The host application supplies the collaborators this core consumes:
//! an [`accounts::AccountLookup`] over its account storage, a
//! [`payload::TransactionDecoder`] for EVM raw transactions, and a
//! [`signing::SigningCapability`] wrapping the device's key primitives.
//!
//! # Data flow
//!
//! Scanned captures enter through [`session::SignerSession::submit_scan`];
//! multipart fragments accumulate until the sequence completes, the blob is
//! classified into a typed request, the signing account is resolved (falling
//! back across network prefixes when the literal encoding is unknown), and
//! one of the signing backends produces the final signature blob.
//!
//! # Security
//!
//! Key material never enters this crate: accounts carry opaque encrypted
//! handles, signatures are produced behind the signing capability, and
//! SURIs recovered on the legacy PIN path are zeroized on drop. Log events
//! never include payload bytes, seeds, PINs or SURIs.
//!
//! # Example
//!
//! ```rust,ignore
//! use coldsign::{ScanOutcome, SignerConfig, SignerSession};
//!
//! let mut session = SignerSession::new(SignerConfig::default(), accounts, tx_decoder);
//! for capture in scanner {
//!     if let ScanOutcome::Ready(summary) = session.submit_scan(&capture).await? {
//!         println!("request from {}", summary.sender_address);
//!         break;
//!     }
//! }
//! let signature = session.sign_with_suri(&capability, &suri).await?;
//! ```

pub mod accounts;
pub mod address;
pub mod config;
pub mod crypto;
pub mod networks;
pub mod payload;
pub mod qr;
pub mod session;
pub mod signing;
pub mod types;

// Re-export key types for convenience
pub use accounts::{Account, AccountLookup};
pub use address::{resolve_across_networks, AddressError, Ss58Address};
pub use config::SignerConfig;
pub use networks::NetworkSpec;
pub use payload::{
    DecodeError, DecodedTransaction, ExtrinsicPayload, PayloadDecoder, SignableData,
    TransactionDecoder, UnsignedRequest,
};
pub use qr::{AssemblyOutcome, FrameAssembler, FramingError, MultipartFrame};
pub use session::{RequestSummary, ScanError, ScanOutcome, SignerSession};
pub use signing::{CapabilityError, SignError, SignSession, SigningCapability};
pub use types::{CryptoScheme, NetworkFamily, RequestKind};
