// Transaction model for the account-model submission chain
// This file defines instructions, compute-budget pricing instructions and the
// signed wire form whose bytes are reused verbatim on every resend

use crate::errors::SubmitError;
use serde::{Deserialize, Serialize};

pub const COMPUTE_BUDGET_PROGRAM_ID: &str = "ComputeBudget111111111111111111111111111111";

const SET_COMPUTE_UNIT_LIMIT: u8 = 2;
const SET_COMPUTE_UNIT_PRICE: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(pubkey: impl Into<String>, is_signer: bool) -> Self {
        Self {
            pubkey: pubkey.into(),
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            is_signer: false,
            is_writable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub program_id: String,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: impl Into<String>, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id: program_id.into(),
            accounts,
            data,
        }
    }

    pub fn set_compute_unit_limit(units: u32) -> Self {
        let mut data = vec![SET_COMPUTE_UNIT_LIMIT];
        data.extend_from_slice(&units.to_le_bytes());
        Self::new(COMPUTE_BUDGET_PROGRAM_ID, Vec::new(), data)
    }

    pub fn set_compute_unit_price(micro_units: u64) -> Self {
        let mut data = vec![SET_COMPUTE_UNIT_PRICE];
        data.extend_from_slice(&micro_units.to_le_bytes());
        Self::new(COMPUTE_BUDGET_PROGRAM_ID, Vec::new(), data)
    }

    pub fn is_compute_budget(&self) -> bool {
        self.program_id == COMPUTE_BUDGET_PROGRAM_ID
    }
}

/// An unsigned transaction. Mutable until it is handed to a signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub fee_payer: String,
    pub recent_block_ref: Option<String>,
    pub instructions: Vec<Instruction>,
}

impl Transaction {
    pub fn new(fee_payer: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            fee_payer: fee_payer.into(),
            recent_block_ref: None,
            instructions,
        }
    }

    /// Drop compute-budget instructions added by whoever built the transaction.
    /// Returns how many were removed.
    pub fn strip_compute_budget(&mut self) -> usize {
        let before = self.instructions.len();
        self.instructions.retain(|ix| !ix.is_compute_budget());
        before - self.instructions.len()
    }

    pub fn compute_unit_limit(&self) -> Option<u32> {
        self.instructions
            .iter()
            .filter(|ix| ix.is_compute_budget())
            .find(|ix| ix.data.first() == Some(&SET_COMPUTE_UNIT_LIMIT) && ix.data.len() == 5)
            .map(|ix| u32::from_le_bytes([ix.data[1], ix.data[2], ix.data[3], ix.data[4]]))
    }

    pub fn compute_unit_price(&self) -> Option<u64> {
        self.instructions
            .iter()
            .filter(|ix| ix.is_compute_budget())
            .find(|ix| ix.data.first() == Some(&SET_COMPUTE_UNIT_PRICE) && ix.data.len() == 9)
            .map(|ix| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&ix.data[1..9]);
                u64::from_le_bytes(buf)
            })
    }

    /// Accounts the transaction writes to; the priority-fee oracle samples these.
    pub fn writable_accounts(&self) -> Vec<String> {
        let mut out = vec![self.fee_payer.clone()];
        for meta in self.instructions.iter().flat_map(|ix| ix.accounts.iter()) {
            if meta.is_writable && !out.contains(&meta.pubkey) {
                out.push(meta.pubkey.clone());
            }
        }
        out
    }

    /// BCS encoding of the message; this is what gets signed.
    pub fn message_bytes(&self) -> Result<Vec<u8>, SubmitError> {
        bcs::to_bytes(self).map_err(|e| SubmitError::Serialization(format!("encode message: {e}")))
    }

    /// Wire form with an all-zero signature, accepted by simulators that skip
    /// signature verification.
    pub fn unsigned_wire(&self) -> Result<Vec<u8>, SubmitError> {
        Ok(SignedTransaction::new(self.message_bytes()?, [0u8; 64]).serialize())
    }
}

/// A signed transaction. Its serialized bytes are fixed once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    message: Vec<u8>,
    signature: [u8; 64],
}

impl SignedTransaction {
    pub fn new(message: Vec<u8>, signature: [u8; 64]) -> Self {
        Self { message, signature }
    }

    /// Base58 signature; doubles as the transaction id.
    pub fn signature(&self) -> String {
        bs58::encode(self.signature).into_string()
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// `count || signature || message`, single signer.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 64 + self.message.len());
        out.push(1);
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.message);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_ix() -> Instruction {
        Instruction::new(
            "TokenBridge1111111111111111111111111111111",
            vec![
                AccountMeta::writable("payer", true),
                AccountMeta::writable("custody", false),
                AccountMeta::readonly("config"),
            ],
            vec![1, 2, 3],
        )
    }

    #[test]
    fn strips_existing_compute_budget_instructions() {
        let mut tx = Transaction::new(
            "payer",
            vec![
                Instruction::set_compute_unit_limit(1_400_000),
                transfer_ix(),
                Instruction::set_compute_unit_price(5),
            ],
        );
        assert_eq!(tx.strip_compute_budget(), 2);
        assert_eq!(tx.instructions, vec![transfer_ix()]);
        assert_eq!(tx.strip_compute_budget(), 0);
    }

    #[test]
    fn reads_back_compute_budget_values() {
        let tx = Transaction::new(
            "payer",
            vec![
                transfer_ix(),
                Instruction::set_compute_unit_limit(120_000),
                Instruction::set_compute_unit_price(42),
            ],
        );
        assert_eq!(tx.compute_unit_limit(), Some(120_000));
        assert_eq!(tx.compute_unit_price(), Some(42));
    }

    #[test]
    fn writable_accounts_start_with_fee_payer_and_dedupe() {
        let tx = Transaction::new("payer", vec![transfer_ix(), transfer_ix()]);
        assert_eq!(tx.writable_accounts(), vec!["payer", "custody"]);
    }

    #[test]
    fn wire_form_prefixes_signature() {
        let signed = SignedTransaction::new(vec![9, 9], [7u8; 64]);
        let wire = signed.serialize();
        assert_eq!(wire[0], 1);
        assert_eq!(&wire[1..65], &[7u8; 64]);
        assert_eq!(&wire[65..], &[9, 9]);
        assert_eq!(signed.signature(), bs58::encode([7u8; 64]).into_string());
    }
}
