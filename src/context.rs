// Route context - the chain collaborators every route and the classifier share
// This file wires per-chain settings and RPC handles, the message fetcher, the
// signer and the clock into one value passed explicitly to each component

use crate::config::{AppConfig, ChainSettings, SubmissionConfig};
use crate::errors::RouteError;
use crate::execution::clock::{Clock, TokioClock};
use crate::execution::fee::FeeEstimator;
use crate::execution::submitter::TransactionSubmitter;
use crate::signing::{Ed25519Signer, MissingSigner, TransactionSigner};
use crate::transport::{AttestationApi, ChainRpc, EvmRpc, MessageFetcher, SolanaRpc};
use crate::types::{ChainId, ChainPlatform, TokenConfig, TokenId};
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

pub struct RouteContext {
    chains: HashMap<ChainId, ChainSettings>,
    rpcs: HashMap<ChainId, Arc<dyn ChainRpc>>,
    messages: Arc<dyn MessageFetcher>,
    signer: Arc<dyn TransactionSigner>,
    clock: Arc<dyn Clock>,
    submission: SubmissionConfig,
    tokens: Vec<TokenConfig>,
    relay_only_chains: Vec<ChainId>,
    cctp_emitter_chains: Vec<ChainId>,
}

impl RouteContext {
    pub fn new(messages: Arc<dyn MessageFetcher>, signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            chains: HashMap::new(),
            rpcs: HashMap::new(),
            messages,
            signer,
            clock: Arc::new(TokioClock),
            submission: SubmissionConfig::default(),
            tokens: Vec::new(),
            relay_only_chains: vec![ChainId::SEI],
            cctp_emitter_chains: vec![ChainId::ETHEREUM, ChainId::AVALANCHE],
        }
    }

    pub fn with_chain(mut self, settings: ChainSettings, rpc: Arc<dyn ChainRpc>) -> Self {
        self.rpcs.insert(settings.id, rpc);
        self.chains.insert(settings.id, settings);
        self
    }

    pub fn with_tokens(mut self, tokens: Vec<TokenConfig>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_submission(mut self, submission: SubmissionConfig) -> Self {
        self.submission = submission;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_relay_only_chains(mut self, chains: Vec<ChainId>) -> Self {
        self.relay_only_chains = chains;
        self
    }

    pub fn with_cctp_emitter_chains(mut self, chains: Vec<ChainId>) -> Self {
        self.cctp_emitter_chains = chains;
        self
    }

    /// Build live collaborators from configuration. Chains on platforms
    /// without an RPC flavour are kept for display but have no RPC handle.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut messages = AttestationApi::new(config.attestation_api.clone())
            .context("initialize attestation client")?;
        if let Some(cctp) = &config.cctp_attestation_api {
            messages = messages.with_cctp(cctp.clone());
        }

        let signer: Arc<dyn TransactionSigner> = match &config.signer_secret_hex {
            Some(secret) => Arc::new(
                Ed25519Signer::from_secret_hex(secret).context("parse signer secret")?,
            ),
            None => {
                warn!("no signer key configured; send and redeem will fail");
                Arc::new(MissingSigner)
            }
        };

        let mut ctx = Self::new(Arc::new(messages), signer)
            .with_tokens(config.tokens.clone())
            .with_submission(config.submission.clone())
            .with_relay_only_chains(config.relay_only_chains())
            .with_cctp_emitter_chains(config.cctp_emitter_chains());

        for chain in &config.chains {
            let rpc: Arc<dyn ChainRpc> = match chain.platform {
                ChainPlatform::Solana => Arc::new(
                    SolanaRpc::new(chain.rpc.clone(), chain.id)
                        .with_context(|| format!("rpc client for {}", chain.name))?
                        .with_commitment(config.submission.commitment.clone())
                        .with_poll_interval(config.submission.confirm_poll_interval()),
                ),
                ChainPlatform::Evm => Arc::new(
                    EvmRpc::new(chain.rpc.clone(), chain.id)
                        .with_context(|| format!("rpc client for {}", chain.name))?,
                ),
                other => {
                    warn!(chain = %chain.id, platform = ?other, "no rpc flavour for platform; chain is display-only");
                    ctx.chains.insert(chain.id, chain.clone());
                    continue;
                }
            };
            info!(chain = %chain.id, rpc = %chain.rpc, "registered chain");
            ctx = ctx.with_chain(chain.clone(), rpc);
        }
        Ok(ctx)
    }

    pub fn chain(&self, id: ChainId) -> Result<&ChainSettings, RouteError> {
        self.chains.get(&id).ok_or(RouteError::UnknownChain(id))
    }

    pub fn rpc(&self, id: ChainId) -> Result<Arc<dyn ChainRpc>, RouteError> {
        self.rpcs
            .get(&id)
            .cloned()
            .ok_or(RouteError::UnknownChain(id))
    }

    pub fn messages(&self) -> &Arc<dyn MessageFetcher> {
        &self.messages
    }

    pub fn signer(&self) -> &Arc<dyn TransactionSigner> {
        &self.signer
    }

    pub fn submission(&self) -> &SubmissionConfig {
        &self.submission
    }

    pub fn tokens(&self) -> &[TokenConfig] {
        &self.tokens
    }

    pub fn token(&self, key: &str) -> Option<&TokenConfig> {
        self.tokens.iter().find(|t| t.key == key)
    }

    pub fn token_by_id(&self, id: &TokenId) -> Option<&TokenConfig> {
        self.tokens
            .iter()
            .find(|t| t.token_id.as_ref() == Some(id))
    }

    pub fn is_relay_only(&self, chain: ChainId) -> bool {
        self.relay_only_chains.contains(&chain)
    }

    /// Lowercased wormhole CCTP integration addresses on the emitter chains.
    pub fn cctp_emitters(&self) -> HashSet<String> {
        self.cctp_emitter_chains
            .iter()
            .filter_map(|id| self.chains.get(id))
            .filter_map(|c| c.cctp.as_ref()?.wormhole_cctp.as_ref())
            .map(|addr| addr.to_ascii_lowercase())
            .collect()
    }

    /// Chain whose CCTP contracts sit in `domain`.
    pub fn chain_for_domain(&self, domain: u32) -> Option<ChainId> {
        self.chains
            .values()
            .find(|c| c.cctp.as_ref().map(|cctp| cctp.domain) == Some(domain))
            .map(|c| c.id)
    }

    pub fn fee_estimator(&self, chain: ChainId) -> Result<FeeEstimator, RouteError> {
        Ok(FeeEstimator::new(
            self.rpc(chain)?,
            self.clock.clone(),
            self.submission.clone(),
        ))
    }

    pub fn submitter(&self, chain: ChainId) -> Result<TransactionSubmitter, RouteError> {
        Ok(TransactionSubmitter::new(
            self.rpc(chain)?,
            self.signer.clone(),
            self.clock.clone(),
            self.submission.clone(),
        ))
    }
}
