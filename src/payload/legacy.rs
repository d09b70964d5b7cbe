//! Legacy JSON envelope (Ethereum-like family)
//!
//! Single-capture JSON requests:
//! `{"action":"signTransaction","data":{"account":…,"rlp":…}}` or
//! `{"action":"signData","data":{"account":…,"data":…}}`.

use serde::Deserialize;

use super::{
    DecodeError, PayloadDecoder, SignableData, TransactionDecoder, UnsignedRequest,
};
use crate::accounts::{Account, AccountLookup};
use crate::crypto;
use crate::networks;
use crate::types::{CryptoScheme, NetworkFamily, RequestKind};

#[derive(Debug, Deserialize)]
struct Envelope {
    action: String,
    #[serde(default)]
    data: EnvelopeData,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeData {
    account: Option<String>,
    rlp: Option<String>,
    data: Option<String>,
}

impl<'a, S: AccountLookup, D: TransactionDecoder> PayloadDecoder<'a, S, D> {
    pub(super) async fn decode_legacy(&self, body: &[u8]) -> Result<UnsignedRequest, DecodeError> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))?;

        match envelope.action.as_str() {
            "signTransaction" => self.decode_eth_transaction(envelope.data).await,
            "signData" => self.decode_eth_message(envelope.data).await,
            other => Err(DecodeError::UnrecognizedOperation(other.to_string())),
        }
    }

    async fn decode_eth_transaction(
        &self,
        data: EnvelopeData,
    ) -> Result<UnsignedRequest, DecodeError> {
        let account = data
            .account
            .ok_or(DecodeError::MissingTransactionFields("the sender account"))?;
        let rlp_hex = data
            .rlp
            .ok_or(DecodeError::MissingTransactionFields("the rlp body"))?;
        let rlp = hex::decode(rlp_hex.trim_start_matches("0x"))
            .map_err(|e| DecodeError::MalformedEnvelope(format!("invalid rlp hex: {e}")))?;

        let tx = self
            .tx_decoder
            .decode_raw_transaction(&rlp)
            .map_err(DecodeError::MalformedEnvelope)?;
        let network_key = tx.chain_id.to_string();
        if networks::get(&network_key).is_none() {
            return Err(DecodeError::UnknownNetwork(network_key));
        }

        let address = crypto::to_checksum_address(&account);
        let sender = match self.accounts.get_by_id(&address, &network_key).await {
            Some(found) => found,
            None => match self.accounts.get_by_address(&address).await {
                Some(found) => found,
                None => {
                    return Err(DecodeError::UnknownAccount {
                        address,
                        display_payload: Some(hex::encode(&rlp)),
                    })
                }
            },
        };

        let recipient = match self.accounts.get_by_id(&tx.action_address, &network_key).await {
            Some(found) => found,
            None => Account::placeholder(tx.action_address.clone(), network_key.clone()),
        };

        Ok(UnsignedRequest {
            kind: RequestKind::Transaction,
            family: NetworkFamily::Ethereum,
            signable: SignableData::Hash(crypto::keccak256(&rlp).to_vec()),
            is_hash: true,
            is_oversized: false,
            network_key,
            scheme: Some(CryptoScheme::Ecdsa),
            sender,
            recipient: Some(recipient),
        })
    }

    async fn decode_eth_message(&self, data: EnvelopeData) -> Result<UnsignedRequest, DecodeError> {
        let account = data
            .account
            .ok_or(DecodeError::MissingTransactionFields("the sender account"))?;
        let message = data
            .data
            .ok_or(DecodeError::MissingTransactionFields("the message body"))?;

        let address = crypto::to_checksum_address(&account);
        let sender = match self.accounts.get_by_address(&address).await {
            Some(found) => found,
            None => {
                return Err(DecodeError::UnknownAccount {
                    address,
                    display_payload: Some(message),
                })
            }
        };

        Ok(UnsignedRequest {
            kind: RequestKind::Message,
            family: NetworkFamily::Ethereum,
            signable: SignableData::Hash(
                crypto::personal_message_hash(message.as_bytes()).to_vec(),
            ),
            is_hash: true,
            is_oversized: false,
            network_key: sender.network_key.clone(),
            scheme: Some(CryptoScheme::Ecdsa),
            sender,
            recipient: None,
        })
    }
}
