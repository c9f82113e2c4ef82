// Cryptographic signing module
// This file defines the signer capability the submitter consumes and an
// Ed25519 implementation backed by a locally held key

use crate::errors::SubmitError;
use crate::execution::transaction::{SignedTransaction, Transaction};
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use hex::FromHex;

/// External wallet capability: signs the transaction message exactly once.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Address of the signing account, used as fee payer.
    fn address(&self) -> String;

    async fn sign_transaction(&self, tx: &Transaction) -> Result<SignedTransaction, SubmitError>;
}

pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Parse a hex-encoded 32-byte secret (optionally `0x`-prefixed).
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, SubmitError> {
        let sk_bytes = <[u8; 32]>::from_hex(secret_hex.trim().trim_start_matches("0x"))
            .map_err(|e| SubmitError::Signing(format!("bad hex key: {e}")))?;
        Ok(Self::new(SigningKey::from_bytes(&sk_bytes)))
    }

    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut rand_core::OsRng))
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }
}

#[async_trait]
impl TransactionSigner for Ed25519Signer {
    fn address(&self) -> String {
        bs58::encode(self.public_key()).into_string()
    }

    async fn sign_transaction(&self, tx: &Transaction) -> Result<SignedTransaction, SubmitError> {
        if tx.fee_payer != self.address() {
            return Err(SubmitError::Signing(format!(
                "fee payer {} is not the signing account {}",
                tx.fee_payer,
                self.address()
            )));
        }
        if tx.recent_block_ref.is_none() {
            return Err(SubmitError::Signing(
                "transaction has no recent block reference".into(),
            ));
        }
        let message = tx.message_bytes()?;
        let signature = self.key.sign(&message).to_bytes();
        Ok(SignedTransaction::new(message, signature))
    }
}

/// Stand-in used when no key is configured; every signing attempt fails.
pub struct MissingSigner;

#[async_trait]
impl TransactionSigner for MissingSigner {
    fn address(&self) -> String {
        String::new()
    }

    async fn sign_transaction(&self, _tx: &Transaction) -> Result<SignedTransaction, SubmitError> {
        Err(SubmitError::Signing("no signing key configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    #[tokio::test]
    async fn signs_message_bytes_deterministically() {
        let signer = Ed25519Signer::from_secret_hex(&"11".repeat(32)).unwrap();
        let mut tx = Transaction::new(signer.address(), Vec::new());
        tx.recent_block_ref = Some("blockhash".into());

        let first = signer.sign_transaction(&tx).await.unwrap();
        let second = signer.sign_transaction(&tx).await.unwrap();
        assert_eq!(first, second);

        let sig_bytes: [u8; 64] = first.serialize()[1..65].try_into().unwrap();
        signer
            .key
            .verifying_key()
            .verify(first.message(), &Signature::from_bytes(&sig_bytes))
            .unwrap();
    }

    #[tokio::test]
    async fn refuses_foreign_fee_payer() {
        let signer = Ed25519Signer::generate();
        let mut tx = Transaction::new("someone-else", Vec::new());
        tx.recent_block_ref = Some("blockhash".into());
        assert!(matches!(
            signer.sign_transaction(&tx).await,
            Err(SubmitError::Signing(_))
        ));
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(Ed25519Signer::from_secret_hex("zz").is_err());
    }
}
