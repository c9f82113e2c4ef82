// Configuration management module
// This file handles loading and parsing of configuration settings
// from an optional config file layered under environment variables

use crate::routes::Route;
use crate::types::{ChainId, ChainPlatform, TokenConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Routes enabled when the config does not list any.
pub const DEFAULT_ROUTES: [Route; 4] = [
    Route::StandardBridge,
    Route::CctpManual,
    Route::CctpRelay,
    Route::AutomaticRelay,
];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Attestation network API, e.g. https://api.wormholescan.io
    pub attestation_api: Url,
    /// Circle attestation API for manual CCTP redemption (optional)
    pub cctp_attestation_api: Option<Url>,
    /// Per-chain RPC endpoints and contract addresses
    #[serde(default)]
    pub chains: Vec<ChainSettings>,
    /// Enabled routes, in preference order
    pub routes: Option<Vec<Route>>,
    /// Destination chains whose transfers are always relayed
    pub relay_only_chains: Option<Vec<ChainId>>,
    /// Chains whose wormhole CCTP integration contracts identify relayed CCTP messages
    pub cctp_emitter_chains: Option<Vec<ChainId>>,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    /// Hex-encoded 32-byte Ed25519 private key (do not use in prod; replace with a wallet signer)
    pub signer_secret_hex: Option<String>,
}

impl AppConfig {
    /// Load from the file named by `APP_CONFIG` (if any), then `APP__*` env overrides.
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var("APP_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }
        let cfg = builder
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()
            .context("build configuration sources")?;
        cfg.try_deserialize().context("deserialize configuration")
    }

    pub fn from_yaml(source: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Yaml))
            .build()
            .context("parse yaml configuration")?;
        cfg.try_deserialize().context("deserialize configuration")
    }

    pub fn enabled_routes(&self) -> Vec<Route> {
        self.routes
            .clone()
            .unwrap_or_else(|| DEFAULT_ROUTES.to_vec())
    }

    pub fn relay_only_chains(&self) -> Vec<ChainId> {
        self.relay_only_chains
            .clone()
            .unwrap_or_else(|| vec![ChainId::SEI])
    }

    pub fn cctp_emitter_chains(&self) -> Vec<ChainId> {
        self.cctp_emitter_chains
            .clone()
            .unwrap_or_else(|| vec![ChainId::ETHEREUM, ChainId::AVALANCHE])
    }

    pub fn chain(&self, id: ChainId) -> Option<&ChainSettings> {
        self.chains.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    pub id: ChainId,
    pub name: String,
    pub platform: ChainPlatform,
    pub rpc: Url,
    /// Token bridge contract / program
    pub token_bridge: Option<String>,
    /// Automatic relayer contract / program
    pub relayer: Option<String>,
    pub cctp: Option<CctpContracts>,
    /// Relayer fee charged on this source chain, keyed by token key (base units)
    #[serde(default)]
    pub relayer_fees: HashMap<String, u64>,
    #[serde(default = "default_native_decimals")]
    pub native_decimals: u8,
}

impl ChainSettings {
    pub fn new(id: ChainId, platform: ChainPlatform, rpc: Url) -> Self {
        Self {
            id,
            name: id.to_string(),
            platform,
            rpc,
            token_bridge: None,
            relayer: None,
            cctp: None,
            relayer_fees: HashMap::new(),
            native_decimals: default_native_decimals(),
        }
    }

    /// Config keys are case-folded by the loader, so compare case-insensitively.
    pub fn relayer_fee(&self, token_key: &str) -> Option<u64> {
        self.relayer_fees
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(token_key))
            .map(|(_, fee)| *fee)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CctpContracts {
    /// Circle domain of this chain
    pub domain: u32,
    pub token_messenger: String,
    pub message_transmitter: String,
    /// Wormhole CCTP integration contract (emitter of relayed CCTP messages)
    pub wormhole_cctp: Option<String>,
}

fn default_native_decimals() -> u8 {
    18
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// How long to wait for a confirmation before resending
    pub resend_interval_ms: u64,
    pub max_simulation_attempts: u32,
    /// Pause before re-simulating after a transient failure
    pub simulation_retry_delay_ms: u64,
    /// Compute unit limit as a percentage of simulated usage
    pub compute_unit_margin_pct: u64,
    /// Units assumed when the simulator reports zero
    pub default_compute_units: u64,
    pub priority_fee_percentile: f64,
    pub min_priority_fee: u64,
    pub max_priority_fee: u64,
    pub commitment: String,
    /// Poll interval of the JSON-RPC confirmation watch
    pub confirm_poll_interval_ms: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            resend_interval_ms: 5_000,
            max_simulation_attempts: 5,
            simulation_retry_delay_ms: 1_000,
            compute_unit_margin_pct: 120,
            default_compute_units: 200_000,
            priority_fee_percentile: 0.95,
            min_priority_fee: 1,
            max_priority_fee: 100_000_000,
            commitment: "finalized".to_string(),
            confirm_poll_interval_ms: 500,
        }
    }
}

impl SubmissionConfig {
    pub fn resend_interval(&self) -> Duration {
        Duration::from_millis(self.resend_interval_ms)
    }

    pub fn simulation_retry_delay(&self) -> Duration {
        Duration::from_millis(self.simulation_retry_delay_ms)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
attestation_api: "https://api.wormholescan.io"
routes: ["bridge", "relay"]
chains:
  - id: 1
    name: solana
    platform: solana
    rpc: "https://api.mainnet-beta.solana.com"
    token_bridge: "wormDTUJ6AWPNvk59vGQbDvGJmqbDTdgWgAqcLBCgUb"
    relayer_fees:
      USDCsol: 250000
  - id: 2
    name: ethereum
    platform: evm
    rpc: "https://eth.example.org"
    cctp:
      domain: 0
      token_messenger: "0xbd3fa81b58ba92a82136038b25adec7066af3155"
      message_transmitter: "0x0a992d191deec32afe36203ad87d7d289a738f81"
      wormhole_cctp: "0xaada05bd399372f0b0463744c09113c137636f6a"
submission:
  resend_interval_ms: 2000
"#;

    #[test]
    fn parses_yaml_and_fills_defaults() {
        let cfg = AppConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(cfg.chains.len(), 2);
        assert_eq!(
            cfg.enabled_routes(),
            vec![Route::StandardBridge, Route::AutomaticRelay]
        );
        assert_eq!(cfg.relay_only_chains(), vec![ChainId::SEI]);
        assert_eq!(
            cfg.cctp_emitter_chains(),
            vec![ChainId::ETHEREUM, ChainId::AVALANCHE]
        );
        assert_eq!(cfg.submission.resend_interval_ms, 2000);
        assert_eq!(cfg.submission.max_simulation_attempts, 5);
        assert_eq!(cfg.submission.compute_unit_margin_pct, 120);

        let eth = cfg.chain(ChainId::ETHEREUM).unwrap();
        assert_eq!(eth.platform, ChainPlatform::Evm);
        assert_eq!(eth.native_decimals, 18);
        assert_eq!(eth.cctp.as_ref().unwrap().domain, 0);

        let sol = cfg.chain(ChainId::SOLANA).unwrap();
        assert_eq!(sol.relayer_fee("USDCsol"), Some(250_000));
        assert_eq!(sol.relayer_fee("WETH"), None);
    }

    #[test]
    fn default_routes_exclude_aggregator() {
        assert!(!DEFAULT_ROUTES.contains(&Route::Aggregator));
    }
}
