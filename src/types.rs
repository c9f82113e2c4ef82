// Chain and token identifiers
// This file defines the chain ids, chain platforms and token descriptors
// shared by every route and transport

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wormhole chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u16);

impl ChainId {
    pub const SOLANA: ChainId = ChainId(1);
    pub const ETHEREUM: ChainId = ChainId(2);
    pub const BSC: ChainId = ChainId(4);
    pub const POLYGON: ChainId = ChainId(5);
    pub const AVALANCHE: ChainId = ChainId(6);
    pub const FANTOM: ChainId = ChainId(10);
    pub const CELO: ChainId = ChainId(14);
    pub const MOONBEAM: ChainId = ChainId(16);
    pub const SUI: ChainId = ChainId(21);
    pub const APTOS: ChainId = ChainId(22);
    pub const ARBITRUM: ChainId = ChainId(23);
    pub const OPTIMISM: ChainId = ChainId(24);
    pub const BASE: ChainId = ChainId(30);
    pub const SEI: ChainId = ChainId(32);

    const NAMES: [(ChainId, &'static str); 14] = [
        (Self::SOLANA, "solana"),
        (Self::ETHEREUM, "ethereum"),
        (Self::BSC, "bsc"),
        (Self::POLYGON, "polygon"),
        (Self::AVALANCHE, "avalanche"),
        (Self::FANTOM, "fantom"),
        (Self::CELO, "celo"),
        (Self::MOONBEAM, "moonbeam"),
        (Self::SUI, "sui"),
        (Self::APTOS, "aptos"),
        (Self::ARBITRUM, "arbitrum"),
        (Self::OPTIMISM, "optimism"),
        (Self::BASE, "base"),
        (Self::SEI, "sei"),
    ];

    pub fn name(&self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(id, _)| id == self)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "chain-{}", self.0),
        }
    }
}

impl FromStr for ChainId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if let Some((id, _)) = Self::NAMES.iter().find(|(_, name)| *name == lower) {
            return Ok(*id);
        }
        lower
            .parse::<u16>()
            .map(ChainId)
            .map_err(|_| format!("unknown chain: {s}"))
    }
}

/// Execution environment of a chain; decides address formatting and which
/// rpc flavour talks to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainPlatform {
    Evm,
    Solana,
    Sui,
    Aptos,
    Cosmos,
}

impl ChainPlatform {
    /// Render a 32-byte wormhole-normalised address in the platform's native form.
    pub fn format_address(&self, raw: &[u8; 32]) -> String {
        match self {
            ChainPlatform::Evm => format!("0x{}", hex::encode(&raw[12..])),
            ChainPlatform::Solana => bs58::encode(raw).into_string(),
            ChainPlatform::Sui | ChainPlatform::Aptos | ChainPlatform::Cosmos => {
                format!("0x{}", hex::encode(raw))
            }
        }
    }
}

/// A token as identified by its origin chain and address there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId {
    pub chain: ChainId,
    pub address: String,
}

/// The token a transfer moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    Native,
    Id(TokenId),
}

/// Token table entry, supplied by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub key: String,
    pub symbol: String,
    pub native_chain: ChainId,
    /// Origin token id; `None` for a chain's gas token.
    #[serde(default)]
    pub token_id: Option<TokenId>,
    pub decimals: u8,
    /// Native USDC, eligible for the CCTP routes.
    #[serde(default)]
    pub cctp: bool,
    /// Whether the automatic relayer accepts this token.
    #[serde(default)]
    pub relayable: bool,
}

impl TokenConfig {
    pub fn is_native(&self) -> bool {
        self.token_id.is_none()
    }
}

/// Convert a human amount into base units for a token with `decimals`.
pub fn to_base_units(amount: f64, decimals: u8) -> u128 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    (amount * 10f64.powi(decimals as i32)).round() as u128
}

/// Convert base units back into a human amount.
pub fn from_base_units(amount: u128, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}
