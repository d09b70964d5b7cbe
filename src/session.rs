//! End-to-end signer session
//!
//! One coordinating object per scan-and-sign interaction. It owns the
//! frame assembler and the staged sign session as explicit values, routes
//! scanned blobs through reassembly and decoding, and enforces the busy
//! lock: once signing has started, no scan or decode mutates the session
//! until cleanup.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::accounts::AccountLookup;
use crate::config::SignerConfig;
use crate::payload::{DecodeError, PayloadDecoder, TransactionDecoder, UnsignedRequest};
use crate::qr::{AssemblyOutcome, FrameAssembler, FramingError, MultipartFrame, MULTIPART_MARKER};
use crate::signing::{SignError, SignSession, SigningCapability};
use crate::types::{NetworkFamily, RequestKind};

/// Scan-path errors.
#[derive(Error, Debug)]
pub enum ScanError {
    /// A signing operation is under way; the scan was refused.
    #[error("signing in progress, scan refused")]
    Busy,

    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// What a submitted capture produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Multipart session still in progress.
    NeedMoreFrames {
        received: usize,
        total: usize,
        /// Frames the scanner skipped that still need a re-scan.
        missed: Vec<u16>,
    },
    /// A request was decoded and staged for signing.
    Ready(RequestSummary),
}

/// Display-oriented digest of a staged request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    pub kind: RequestKind,
    pub family: NetworkFamily,
    pub sender_address: String,
    pub network_key: String,
    pub is_hash: bool,
    pub is_oversized: bool,
}

impl RequestSummary {
    fn from_request(request: &UnsignedRequest) -> Self {
        Self {
            kind: request.kind,
            family: request.family,
            sender_address: request.sender.address.clone(),
            network_key: request.network_key.clone(),
            is_hash: request.is_hash,
            is_oversized: request.is_oversized,
        }
    }
}

/// The signer session: scan source in, signature blob out.
pub struct SignerSession<S, D> {
    config: SignerConfig,
    accounts: S,
    tx_decoder: D,
    assembler: FrameAssembler,
    sign: Option<SignSession>,
}

impl<S: AccountLookup, D: TransactionDecoder> SignerSession<S, D> {
    pub fn new(config: SignerConfig, accounts: S, tx_decoder: D) -> Self {
        Self {
            config,
            accounts,
            tx_decoder,
            assembler: FrameAssembler::new(),
            sign: None,
        }
    }

    /// Feed one scanned capture into the session.
    ///
    /// Multipart fragments accumulate in the assembler; a completed
    /// sequence (or a single-capture blob) is decoded and staged as the
    /// active sign session, replacing any previously staged request that
    /// had not started signing.
    pub async fn submit_scan(&mut self, raw: &[u8]) -> Result<ScanOutcome, ScanError> {
        if self.is_busy() {
            return Err(ScanError::Busy);
        }

        if raw.first() == Some(&MULTIPART_MARKER) {
            let frame = MultipartFrame::parse(raw)?;
            match self.assembler.submit_frame(frame)? {
                AssemblyOutcome::NeedMoreFrames { received, total } => {
                    Ok(ScanOutcome::NeedMoreFrames {
                        received,
                        total,
                        missed: self.assembler.missed_frames().collect(),
                    })
                }
                AssemblyOutcome::Completed(blob) => self.stage(&blob, true).await,
            }
        } else {
            self.stage(raw, false).await
        }
    }

    async fn stage(&mut self, blob: &[u8], already_reassembled: bool) -> Result<ScanOutcome, ScanError> {
        let decoder = PayloadDecoder::new(&self.accounts, &self.tx_decoder, &self.config);
        let request = decoder.decode(blob, already_reassembled).await?;
        let summary = RequestSummary::from_request(&request);
        debug!(kind = ?summary.kind, family = ?summary.family, "request staged for signing");
        self.sign = Some(SignSession::new(request));
        Ok(ScanOutcome::Ready(summary))
    }

    /// The staged sign session, if a request has been decoded.
    pub fn sign_session(&self) -> Option<&SignSession> {
        self.sign.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.sign.as_ref().is_some_and(SignSession::is_busy)
    }

    /// Frames the scanner skipped in the current multipart session.
    pub fn missed_frames(&self) -> Vec<u16> {
        self.assembler.missed_frames().collect()
    }

    /// Finished signature blob, once signing succeeded.
    pub fn signed_data(&self) -> Option<&str> {
        self.sign.as_ref().and_then(SignSession::signed_data)
    }

    /// Sign the staged request through the biometric backend.
    pub async fn sign_with_biometric<C: SigningCapability + ?Sized>(
        &mut self,
        capability: &C,
        legacy: bool,
    ) -> Result<String, SignError> {
        let app_id = self.config.app_id.clone();
        let session = self.sign.as_mut().ok_or(SignError::NoRequest)?;
        session.sign_with_biometric(capability, &app_id, legacy).await
    }

    /// Sign the staged request with a caller-provided SURI.
    pub async fn sign_with_suri<C: SigningCapability + ?Sized>(
        &mut self,
        capability: &C,
        suri: &str,
    ) -> Result<String, SignError> {
        let session = self.sign.as_mut().ok_or(SignError::NoRequest)?;
        session.sign_with_suri(capability, suri).await
    }

    /// Sign the staged request through the legacy PIN-unlocked path.
    pub async fn sign_with_pin<C: SigningCapability + ?Sized>(
        &mut self,
        capability: &C,
        pin: &str,
    ) -> Result<String, SignError> {
        let session = self.sign.as_mut().ok_or(SignError::NoRequest)?;
        session.sign_with_pin(capability, pin).await
    }

    /// Reset assembler and sign state to their initial empty values.
    /// Always succeeds; idempotent; safe mid-session.
    pub fn cleanup(&mut self) {
        self.assembler.reset();
        self.sign = None;
    }
}
