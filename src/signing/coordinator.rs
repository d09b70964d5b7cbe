//! The signing state machine
//!
//! `Idle → Busy(Pending) → Busy(Signed) → Idle`. Busy is entered when the
//! first signing attempt starts and held through success and failure alike;
//! only [`SignSession::cleanup`] (or dropping the session) returns to idle.
//! A failed backend call leaves the session busy with nothing signed so the
//! caller decides between retry and reset.

use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::{CapabilityError, SignError, SigningCapability};
use crate::accounts::Account;
use crate::payload::{SignableData, UnsignedRequest};
use crate::types::{CryptoScheme, NetworkFamily};

/// Signing context for one decoded request.
#[derive(Debug)]
pub struct SignSession {
    sender: Account,
    recipient: Option<Account>,
    signable: SignableData,
    family: NetworkFamily,
    is_hash: bool,
    busy: bool,
    signed_data: Option<String>,
}

impl SignSession {
    /// Stage a decoded request for signing.
    pub fn new(request: UnsignedRequest) -> Self {
        Self {
            sender: request.sender,
            recipient: request.recipient,
            signable: request.signable,
            family: request.family,
            is_hash: request.is_hash,
            busy: false,
            signed_data: None,
        }
    }

    pub fn sender(&self) -> &Account {
        &self.sender
    }

    pub fn recipient(&self) -> Option<&Account> {
        self.recipient.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_hash(&self) -> bool {
        self.is_hash
    }

    pub fn signed_data(&self) -> Option<&str> {
        self.signed_data.as_deref()
    }

    /// The exact hex string handed to the signing capability.
    pub fn build_signable(&self) -> Result<String, SignError> {
        match &self.signable {
            SignableData::Extrinsic(payload) => Ok(hex::encode(payload.encode(false))),
            SignableData::Hash(digest) => Ok(hex::encode(digest)),
            SignableData::Bytes(bytes) => Ok(hex::encode(bytes)),
            SignableData::Text(text) => {
                if text.is_ascii() {
                    Ok(hex::encode(text.as_bytes()))
                } else {
                    Err(SignError::UnsignableData(
                        "message text is not ASCII".to_string(),
                    ))
                }
            }
        }
    }

    /// Sign through the hardware-backed biometric backend.
    ///
    /// `legacy` selects the pre-derivation key handling: the capability
    /// unlocks the encrypted seed directly instead of a derived key handle.
    pub async fn sign_with_biometric<C: SigningCapability + ?Sized>(
        &mut self,
        capability: &C,
        app_id: &str,
        legacy: bool,
    ) -> Result<String, SignError> {
        let signable = self.begin()?;
        let key_handle = if legacy { "" } else { self.sender.derivation_path.as_str() };
        let outcome = capability
            .sign_biometric(app_id, key_handle, &signable, &self.sender.encrypted_seed)
            .await;
        self.conclude(outcome)
    }

    /// Sign with a caller-provided SURI.
    pub async fn sign_with_suri<C: SigningCapability + ?Sized>(
        &mut self,
        capability: &C,
        suri: &str,
    ) -> Result<String, SignError> {
        let signable = self.begin()?;
        let outcome = capability.sign_with_suri(suri, &signable).await;
        self.conclude(outcome)
    }

    /// Legacy path: decrypt the account's seed with a PIN, then sign with
    /// the recovered SURI.
    pub async fn sign_with_pin<C: SigningCapability + ?Sized>(
        &mut self,
        capability: &C,
        pin: &str,
    ) -> Result<String, SignError> {
        let signable = self.begin()?;
        let suri = match capability.decrypt_seed(&self.sender.encrypted_seed, pin).await {
            Ok(suri) => Zeroizing::new(suri),
            Err(CapabilityError(reason)) => {
                warn!("seed decryption refused");
                return Err(SignError::Backend(reason));
            }
        };
        let outcome = capability.sign_with_suri(&suri, &signable).await;
        self.conclude(outcome)
    }

    /// Reset to the idle state. Always succeeds; idempotent.
    pub fn cleanup(&mut self) {
        self.busy = false;
        self.signed_data = None;
    }

    /// Enter the busy state and render the signable material. A request
    /// signs at most once; retrying after a failure is allowed and stays
    /// within the same busy period.
    fn begin(&mut self) -> Result<String, SignError> {
        if self.signed_data.is_some() {
            return Err(SignError::AlreadySigned);
        }
        let signable = self.build_signable()?;
        self.busy = true;
        debug!(family = ?self.family, len = signable.len(), "signing initiated");
        Ok(signable)
    }

    /// Record the backend outcome. Failure keeps the session busy and the
    /// signed data unset.
    fn conclude(&mut self, outcome: Result<String, CapabilityError>) -> Result<String, SignError> {
        match outcome {
            Ok(raw) => {
                let encoded = self.encode_signature(&raw)?;
                self.signed_data = Some(encoded.clone());
                debug!("signing concluded");
                Ok(encoded)
            }
            Err(CapabilityError(reason)) => {
                warn!("signing backend failure");
                Err(SignError::Backend(reason))
            }
        }
    }

    /// Final signature encoding: hex without a `0x` prefix, with the
    /// scheme tag byte prepended on the tagged family. The tag follows the
    /// account's declared scheme and falls back to Sr25519 when the
    /// account does not declare one.
    fn encode_signature(&self, raw_hex: &str) -> Result<String, SignError> {
        let stripped = raw_hex.trim_start_matches("0x");
        if !self.family.uses_tagged_signature() {
            return Ok(stripped.to_lowercase());
        }

        let raw = hex::decode(stripped)
            .map_err(|e| SignError::Backend(format!("backend returned invalid hex: {e}")))?;
        let tag = self
            .sender
            .scheme
            .unwrap_or(CryptoScheme::Sr25519)
            .envelope_byte();
        let mut tagged = Vec::with_capacity(raw.len() + 1);
        tagged.push(tag);
        tagged.extend_from_slice(&raw);
        Ok(hex::encode(tagged))
    }
}
