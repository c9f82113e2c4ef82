// Signed message and receipt decoding
// This file decodes attested cross-chain messages (header, guardian signatures,
// body, token-transfer payloads) and source-chain receipts with their event logs

use crate::errors::MessageError;
use crate::types::ChainId;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

const SIGNATURE_LEN: usize = 66;
const BODY_FIXED_LEN: usize = 4 + 4 + 2 + 32 + 8 + 1;

/// Event signature emitted by the CCTP token messenger when USDC is burned.
pub const DEPOSIT_FOR_BURN_EVENT: &str =
    "DepositForBurn(uint64,address,uint256,address,bytes32,uint32,bytes32,bytes32)";

static DEPOSIT_FOR_BURN_TOPIC: Lazy<String> = Lazy::new(|| event_topic(DEPOSIT_FOR_BURN_EVENT));

/// Topic-0 of the CCTP `DepositForBurn` log, `0x`-prefixed lowercase hex.
pub fn deposit_for_burn_topic() -> &'static str {
    DEPOSIT_FOR_BURN_TOPIC.as_str()
}

pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    Keccak256::digest(bytes).into()
}

/// Leading byte of a token-transfer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// Plain transfer, redeemed manually by the recipient.
    Manual,
    AssetMeta,
    /// Transfer with payload, picked up by the automatic relayer.
    Automatic,
    Other(u8),
}

impl From<u8> for PayloadKind {
    fn from(byte: u8) -> Self {
        match byte {
            1 => PayloadKind::Manual,
            2 => PayloadKind::AssetMeta,
            3 => PayloadKind::Automatic,
            other => PayloadKind::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSignature {
    pub guardian_index: u8,
    pub signature: Vec<u8>,
}

/// An attested message. Immutable once decoded; `raw` holds the exact bytes
/// that were fetched and are later submitted for redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<GuardianSignature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: ChainId,
    pub emitter_address: [u8; 32],
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Vec<u8>,
    pub raw: Vec<u8>,
    body_offset: usize,
}

impl SignedMessage {
    pub fn parse(bytes: &[u8]) -> Result<Self, MessageError> {
        let mut r = Reader::new(bytes);
        let version = r.u8()?;
        if version != 1 {
            return Err(MessageError::Version(version));
        }
        let guardian_set_index = r.u32()?;
        let count = r.u8()? as usize;
        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            let sig = r.take(SIGNATURE_LEN)?;
            signatures.push(GuardianSignature {
                guardian_index: sig[0],
                signature: sig[1..].to_vec(),
            });
        }
        let body_offset = r.offset;
        r.ensure(BODY_FIXED_LEN)?;
        let timestamp = r.u32()?;
        let nonce = r.u32()?;
        let emitter_chain = ChainId(r.u16()?);
        let emitter_address = r.bytes32()?;
        let sequence = r.u64()?;
        let consistency_level = r.u8()?;
        let payload = r.rest().to_vec();

        Ok(Self {
            version,
            guardian_set_index,
            signatures,
            timestamp,
            nonce,
            emitter_chain,
            emitter_address,
            sequence,
            consistency_level,
            payload,
            raw: bytes.to_vec(),
            body_offset,
        })
    }

    pub fn body(&self) -> &[u8] {
        &self.raw[self.body_offset..]
    }

    /// Double keccak of the body; the key under which redemptions are recorded.
    pub fn digest(&self) -> [u8; 32] {
        keccak256(&keccak256(self.body()))
    }

    pub fn payload_kind(&self) -> Option<PayloadKind> {
        self.payload.first().copied().map(PayloadKind::from)
    }

    /// Emitter rendered as a 20-byte EVM contract address.
    pub fn emitter_evm_address(&self) -> String {
        format!("0x{}", hex::encode(&self.emitter_address[12..]))
    }
}

/// Decoded token-transfer payload. The common prefix is shared by every
/// payload kind; the trailing fields depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransferPayload {
    pub kind: PayloadKind,
    pub amount: u128,
    pub token_address: [u8; 32],
    pub token_chain: ChainId,
    pub to: [u8; 32],
    pub to_chain: ChainId,
    /// Relayer fee carried by manual transfers.
    pub fee: Option<u128>,
    /// Sender carried by transfers with payload.
    pub from_address: Option<[u8; 32]>,
    pub extra: Vec<u8>,
}

impl TokenTransferPayload {
    pub fn parse(payload: &[u8]) -> Result<Self, MessageError> {
        let mut r = Reader::new(payload);
        let kind = PayloadKind::from(r.u8()?);
        let amount = r.u256()?;
        let token_address = r.bytes32()?;
        let token_chain = ChainId(r.u16()?);
        let to = r.bytes32()?;
        let to_chain = ChainId(r.u16()?);

        let (fee, from_address, extra) = match kind {
            PayloadKind::Manual => (Some(r.u256()?), None, Vec::new()),
            PayloadKind::Automatic => (None, Some(r.bytes32()?), r.rest().to_vec()),
            _ => (None, None, r.rest().to_vec()),
        };

        Ok(Self {
            kind,
            amount,
            token_address,
            token_chain,
            to,
            to_chain,
            fee,
            from_address,
            extra,
        })
    }
}

/// A source-chain event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: String,
    pub topics: Vec<String>,
    /// `0x`-prefixed hex.
    pub data: String,
}

impl LogEntry {
    pub fn topic0_is(&self, topic: &str) -> bool {
        self.topics
            .first()
            .map(|t| t.eq_ignore_ascii_case(topic))
            .unwrap_or(false)
    }

    pub fn data_bytes(&self) -> Result<Vec<u8>, MessageError> {
        hex::decode(self.data.trim_start_matches("0x"))
            .map_err(|e| MessageError::Log(format!("bad log data: {e}")))
    }
}

/// Source-chain transaction receipt, used by routes that emit no signed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_id: String,
    pub chain: ChainId,
    pub block_number: Option<u64>,
    pub from: Option<String>,
    pub success: bool,
    pub logs: Vec<LogEntry>,
}

impl TransactionReceipt {
    pub fn find_log(&self, topic: &str) -> Option<&LogEntry> {
        self.logs.iter().find(|log| log.topic0_is(topic))
    }
}

/// Decoded CCTP `DepositForBurn` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositForBurn {
    pub nonce: u64,
    pub burn_token: String,
    pub depositor: String,
    pub amount: u128,
    pub mint_recipient: [u8; 32],
    pub destination_domain: u32,
}

impl DepositForBurn {
    pub fn from_log(log: &LogEntry) -> Result<Self, MessageError> {
        if !log.topic0_is(deposit_for_burn_topic()) {
            return Err(MessageError::Log("not a DepositForBurn log".into()));
        }
        if log.topics.len() < 4 {
            return Err(MessageError::Log(format!(
                "DepositForBurn needs 4 topics, got {}",
                log.topics.len()
            )));
        }
        let nonce_word = topic_word(&log.topics[1])?;
        let nonce = Reader::new(&nonce_word[24..]).u64()?;
        let burn_token = format!("0x{}", hex::encode(&topic_word(&log.topics[2])?[12..]));
        let depositor = format!("0x{}", hex::encode(&topic_word(&log.topics[3])?[12..]));

        let data = log.data_bytes()?;
        let mut r = Reader::new(&data);
        let amount = r.u256()?;
        let mint_recipient = r.bytes32()?;
        let domain_word = r.bytes32()?;
        let destination_domain = Reader::new(&domain_word[28..]).u32()?;

        Ok(Self {
            nonce,
            burn_token,
            depositor,
            amount,
            mint_recipient,
            destination_domain,
        })
    }

    /// Key of the destination message transmitter's used-nonce map.
    pub fn nonce_key(&self, source_domain: u32) -> [u8; 32] {
        cctp_nonce_key(source_domain, self.nonce)
    }
}

/// Key of a message transmitter's used-nonce map for a burn from `source_domain`.
pub fn cctp_nonce_key(source_domain: u32, nonce: u64) -> [u8; 32] {
    let mut packed = Vec::with_capacity(12);
    packed.extend_from_slice(&source_domain.to_be_bytes());
    packed.extend_from_slice(&nonce.to_be_bytes());
    keccak256(&packed)
}

/// Core bridge event carrying an outbound message before it is attested.
pub const LOG_MESSAGE_PUBLISHED_EVENT: &str = "LogMessagePublished(address,uint64,uint32,bytes,uint8)";

/// Message transmitter event carrying the raw CCTP message to be attested.
pub const MESSAGE_SENT_EVENT: &str = "MessageSent(bytes)";

static LOG_MESSAGE_PUBLISHED_TOPIC: Lazy<String> = Lazy::new(|| event_topic(LOG_MESSAGE_PUBLISHED_EVENT));
static MESSAGE_SENT_TOPIC: Lazy<String> = Lazy::new(|| event_topic(MESSAGE_SENT_EVENT));

pub fn log_message_published_topic() -> &'static str {
    LOG_MESSAGE_PUBLISHED_TOPIC.as_str()
}

pub fn message_sent_topic() -> &'static str {
    MESSAGE_SENT_TOPIC.as_str()
}

fn event_topic(signature: &str) -> String {
    format!("0x{}", hex::encode(keccak256(signature.as_bytes())))
}

/// A message as published on the source chain, before guardians sign it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub emitter: String,
    pub sequence: u64,
    pub nonce: u32,
    pub payload: Vec<u8>,
    pub consistency_level: u8,
}

impl PublishedMessage {
    pub fn from_log(log: &LogEntry) -> Result<Self, MessageError> {
        if !log.topic0_is(log_message_published_topic()) {
            return Err(MessageError::Log("not a LogMessagePublished log".into()));
        }
        let sender = log
            .topics
            .get(1)
            .ok_or_else(|| MessageError::Log("LogMessagePublished without sender topic".into()))?;
        let emitter = format!("0x{}", hex::encode(&topic_word(sender)?[12..]));
        let data = log.data_bytes()?;
        let sequence = u64::try_from(abi_word(&data, 0)?)
            .map_err(|_| MessageError::Log("sequence exceeds 64 bits".into()))?;
        let nonce = u32::try_from(abi_word(&data, 1)?)
            .map_err(|_| MessageError::Log("nonce exceeds 32 bits".into()))?;
        let payload = abi_bytes(&data, 2)?;
        let consistency_level = u8::try_from(abi_word(&data, 3)?)
            .map_err(|_| MessageError::Log("consistency level exceeds 8 bits".into()))?;
        Ok(Self {
            emitter,
            sequence,
            nonce,
            payload,
            consistency_level,
        })
    }
}

/// Raw CCTP message from a `MessageSent` log.
pub fn message_sent_bytes(log: &LogEntry) -> Result<Vec<u8>, MessageError> {
    if !log.topic0_is(message_sent_topic()) {
        return Err(MessageError::Log("not a MessageSent log".into()));
    }
    abi_bytes(&log.data_bytes()?, 0)
}

/// Automatic relayer instructions carried in the extra payload of an
/// automatic transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayInstructions {
    pub relayer_fee: u128,
    pub to_native_token_amount: u128,
    pub recipient: [u8; 32],
}

impl RelayInstructions {
    pub fn parse(extra: &[u8]) -> Result<Self, MessageError> {
        let mut r = Reader::new(extra);
        let id = r.u8()?;
        if id != 1 {
            return Err(MessageError::PayloadKind(id));
        }
        Ok(Self {
            relayer_fee: r.u256()?,
            to_native_token_amount: r.u256()?,
            recipient: r.bytes32()?,
        })
    }
}

/// Deposit payload emitted by the wormhole CCTP integration contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CctpDeposit {
    pub token: [u8; 32],
    pub amount: u128,
    pub source_domain: u32,
    pub target_domain: u32,
    pub nonce: u64,
    pub from_address: [u8; 32],
    pub mint_recipient: [u8; 32],
    pub payload: Vec<u8>,
}

impl CctpDeposit {
    pub fn parse(payload: &[u8]) -> Result<Self, MessageError> {
        let mut r = Reader::new(payload);
        let id = r.u8()?;
        if id != 1 {
            return Err(MessageError::PayloadKind(id));
        }
        let token = r.bytes32()?;
        let amount = r.u256()?;
        let source_domain = r.u32()?;
        let target_domain = r.u32()?;
        let nonce = r.u64()?;
        let from_address = r.bytes32()?;
        let mint_recipient = r.bytes32()?;
        let len = r.u16()? as usize;
        let payload = r.take(len)?.to_vec();
        Ok(Self {
            token,
            amount,
            source_domain,
            target_domain,
            nonce,
            from_address,
            mint_recipient,
            payload,
        })
    }
}

/// Token-bridge amounts carry at most 8 decimals; scale back to the token's own.
pub fn denormalize_amount(amount: u128, decimals: u8) -> u128 {
    if decimals > 8 {
        amount.saturating_mul(10u128.saturating_pow((decimals - 8) as u32))
    } else {
        amount
    }
}

/// Head word `index` of ABI-encoded `data`.
fn abi_word(data: &[u8], index: usize) -> Result<u128, MessageError> {
    let mut r = Reader::new(data);
    r.offset = index * 32;
    r.u256()
}

/// Dynamic `bytes` whose offset sits in head word `index`.
fn abi_bytes(data: &[u8], index: usize) -> Result<Vec<u8>, MessageError> {
    let offset = usize::try_from(abi_word(data, index)?)
        .map_err(|_| MessageError::Log("abi offset out of range".into()))?;
    let mut r = Reader::new(data);
    r.offset = offset;
    let len = usize::try_from(r.u256()?)
        .map_err(|_| MessageError::Log("abi length out of range".into()))?;
    Ok(r.take(len)?.to_vec())
}

fn topic_word(topic: &str) -> Result<[u8; 32], MessageError> {
    let bytes = hex::decode(topic.trim_start_matches("0x"))
        .map_err(|e| MessageError::Log(format!("bad topic: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| MessageError::Log("topic is not 32 bytes".into()))
}

/// Big-endian cursor over a byte slice.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn ensure(&self, needed: usize) -> Result<(), MessageError> {
        if self.bytes.len() < self.offset + needed {
            return Err(MessageError::Truncated {
                offset: self.offset,
                needed,
                len: self.bytes.len(),
            });
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], MessageError> {
        self.ensure(n)?;
        let out = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, MessageError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, MessageError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, MessageError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn u64(&mut self) -> Result<u64, MessageError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn bytes32(&mut self) -> Result<[u8; 32], MessageError> {
        let mut buf = [0u8; 32];
        buf.copy_from_slice(self.take(32)?);
        Ok(buf)
    }

    /// uint256 that must fit in 128 bits.
    fn u256(&mut self) -> Result<u128, MessageError> {
        let offset = self.offset;
        let word = self.bytes32()?;
        if word[..16].iter().any(|b| *b != 0) {
            return Err(MessageError::Log(format!(
                "uint256 at offset {offset} exceeds 128 bits"
            )));
        }
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(buf))
    }

    fn rest(&mut self) -> &'a [u8] {
        let out = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        out
    }
}
