// Shared fakes and fixtures for the integration tests
// Scripted chain rpc, scripted message fetcher, a manual clock and builders
// for signed messages and receipts

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use xchain_router::config::{CctpContracts, ChainSettings};
use xchain_router::context::RouteContext;
use xchain_router::errors::{FetchError, RpcError};
use xchain_router::execution::clock::Clock;
use xchain_router::execution::transaction::Transaction;
use xchain_router::message::{deposit_for_burn_topic, LogEntry, SignedMessage, TransactionReceipt};
use xchain_router::signing::{Ed25519Signer, TransactionSigner};
use xchain_router::transport::{
    BlockRef, ChainRpc, ConfirmResult, MessageFetcher, SimulationResult,
};
use xchain_router::types::{ChainId, ChainPlatform, TokenConfig, TokenId};

pub const CCTP_INTEGRATION: &str = "0xaada05bd399372f0b0463744c09113c137636f6a";
pub const TOKEN_BRIDGE_EMITTER: [u8; 32] = [0x3e; 32];

/// Clock whose `sleep` returns at once and counts a tick.
#[derive(Default)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
    slept: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn tick_counter(&self) -> Arc<AtomicU64> {
        self.ticks.clone()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }
}

/// How the confirmation watch resolves: after the clock has ticked
/// `after_ticks` times, with `outcome`. The first `transient_failures`
/// watches fail at once with a transport error.
#[derive(Clone)]
pub struct ConfirmScript {
    pub after_ticks: u64,
    pub outcome: Result<ConfirmResult, RpcError>,
    pub transient_failures: usize,
}

impl ConfirmScript {
    pub fn confirmed_after(after_ticks: u64) -> Self {
        Self {
            after_ticks,
            outcome: Ok(ConfirmResult {
                slot: Some(1_000),
                err: None,
            }),
            transient_failures: 0,
        }
    }

    pub fn with_transient_failures(mut self, count: usize) -> Self {
        self.transient_failures = count;
        self
    }

    pub fn expired_after(after_ticks: u64) -> Self {
        Self {
            after_ticks,
            outcome: Err(RpcError::BlockHeightExceeded {
                signature: "expired".into(),
            }),
            transient_failures: 0,
        }
    }

    pub fn failed_after(after_ticks: u64, detail: &str) -> Self {
        Self {
            after_ticks,
            outcome: Ok(ConfirmResult {
                slot: Some(1_000),
                err: Some(detail.to_string()),
            }),
            transient_failures: 0,
        }
    }
}

/// Scripted chain rpc. Simulations are served from a queue (then the default),
/// every raw send is recorded.
pub struct FakeChainRpc {
    ticks: Arc<AtomicU64>,
    simulations: Mutex<VecDeque<SimulationResult>>,
    default_simulation: SimulationResult,
    simulated: Mutex<Vec<Transaction>>,
    sent: Mutex<Vec<Vec<u8>>>,
    fail_resends: bool,
    confirm: ConfirmScript,
    confirm_calls: AtomicUsize,
    receipts: HashMap<String, TransactionReceipt>,
    receipt_lookups: AtomicUsize,
    priority_fees: Vec<u64>,
    consumed: HashSet<[u8; 32]>,
    used_nonces: HashSet<[u8; 32]>,
    block_height: u64,
}

impl FakeChainRpc {
    pub fn new(clock: &ManualClock) -> Self {
        Self {
            ticks: clock.tick_counter(),
            simulations: Mutex::new(VecDeque::new()),
            default_simulation: SimulationResult {
                units_consumed: Some(100_000),
                err: None,
                logs: vec!["Program log: ok".into()],
            },
            simulated: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            fail_resends: false,
            confirm: ConfirmScript::confirmed_after(0),
            confirm_calls: AtomicUsize::new(0),
            receipts: HashMap::new(),
            receipt_lookups: AtomicUsize::new(0),
            priority_fees: Vec::new(),
            consumed: HashSet::new(),
            used_nonces: HashSet::new(),
            block_height: 500,
        }
    }

    pub fn with_simulations(self, sims: Vec<SimulationResult>) -> Self {
        *self.simulations.lock().unwrap() = sims.into();
        self
    }

    pub fn with_default_simulation(mut self, sim: SimulationResult) -> Self {
        self.default_simulation = sim;
        self
    }

    pub fn with_confirm(mut self, confirm: ConfirmScript) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_failing_resends(mut self) -> Self {
        self.fail_resends = true;
        self
    }

    pub fn with_receipt(mut self, receipt: TransactionReceipt) -> Self {
        self.receipts.insert(receipt.tx_id.clone(), receipt);
        self
    }

    pub fn with_priority_fees(mut self, fees: Vec<u64>) -> Self {
        self.priority_fees = fees;
        self
    }

    pub fn with_consumed(mut self, digest: [u8; 32]) -> Self {
        self.consumed.insert(digest);
        self
    }

    pub fn with_used_nonce(mut self, key: [u8; 32]) -> Self {
        self.used_nonces.insert(key);
        self
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn simulated(&self) -> Vec<Transaction> {
        self.simulated.lock().unwrap().clone()
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_lookups(&self) -> usize {
        self.receipt_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainRpc for FakeChainRpc {
    async fn latest_block_ref(&self) -> Result<BlockRef, RpcError> {
        Ok(BlockRef {
            blockhash: "4sGjMW1sUnHzSxGspuhpqLDx6wiyjNtZAMdL4VZHirAn".into(),
            last_valid_block_height: self.block_height + 150,
        })
    }

    async fn simulate(&self, tx: &Transaction) -> Result<SimulationResult, RpcError> {
        self.simulated.lock().unwrap().push(tx.clone());
        let next = self.simulations.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.default_simulation.clone()))
    }

    async fn send_raw(&self, bytes: &[u8]) -> Result<String, RpcError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(bytes.to_vec());
        if self.fail_resends && sent.len() > 1 {
            return Err(RpcError::Provider("transaction already processed".into()));
        }
        Ok(bs58::encode(&bytes[1..65]).into_string())
    }

    async fn confirm(
        &self,
        _signature: &str,
        _block_ref: &BlockRef,
    ) -> Result<ConfirmResult, RpcError> {
        let call = self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.confirm.transient_failures {
            return Err(RpcError::Transport("connection reset by peer".into()));
        }
        while self.ticks.load(Ordering::SeqCst) < self.confirm.after_ticks {
            tokio::task::yield_now().await;
        }
        self.confirm.outcome.clone()
    }

    async fn get_receipt(&self, tx_id: &str) -> Result<Option<TransactionReceipt>, RpcError> {
        self.receipt_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.receipts.get(tx_id).cloned())
    }

    async fn recent_priority_fees(&self, _accounts: &[String]) -> Result<Vec<u64>, RpcError> {
        Ok(self.priority_fees.clone())
    }

    async fn native_balance(&self, _address: &str) -> Result<Option<u128>, RpcError> {
        Ok(Some(2_000_000_000))
    }

    async fn is_message_consumed(&self, _contract: &str, key: &[u8; 32]) -> Result<bool, RpcError> {
        Ok(self.consumed.contains(key))
    }

    async fn is_nonce_used(&self, _contract: &str, key: &[u8; 32]) -> Result<bool, RpcError> {
        Ok(self.used_nonces.contains(key))
    }
}

/// Scripted attestation network. Unknown transactions are `NotFound`.
#[derive(Default)]
pub struct FakeMessageFetcher {
    messages: HashMap<String, Result<Vec<u8>, FetchError>>,
    calls: AtomicUsize,
}

impl FakeMessageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, tx_id: &str, vaa: Vec<u8>) -> Self {
        self.messages.insert(tx_id.to_string(), Ok(vaa));
        self
    }

    pub fn with_error(mut self, tx_id: &str, err: FetchError) -> Self {
        self.messages.insert(tx_id.to_string(), Err(err));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageFetcher for FakeMessageFetcher {
    async fn fetch(&self, tx_id: &str, chain: ChainId) -> Result<SignedMessage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.messages.get(tx_id) {
            Some(Ok(bytes)) => {
                SignedMessage::parse(bytes).map_err(|e| FetchError::Decode(e.to_string()))
            }
            Some(Err(err)) => Err(err.clone()),
            None => Err(FetchError::NotFound {
                tx_id: tx_id.to_string(),
                chain,
            }),
        }
    }
}

pub fn word(v: u128) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[16..].copy_from_slice(&v.to_be_bytes());
    w
}

pub fn evm_word(address_byte: u8) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[12..].copy_from_slice(&[address_byte; 20]);
    w
}

/// Token-transfer payload with the given leading kind byte and destination.
pub fn transfer_payload(kind: u8, to_chain: ChainId) -> Vec<u8> {
    let mut p = vec![kind];
    p.extend_from_slice(&word(1_500_000));
    p.extend_from_slice(&evm_word(0xc0));
    p.extend_from_slice(&ChainId::ETHEREUM.0.to_be_bytes());
    p.extend_from_slice(&[0x42; 32]);
    p.extend_from_slice(&to_chain.0.to_be_bytes());
    match kind {
        1 => p.extend_from_slice(&word(0)),
        3 => {
            p.extend_from_slice(&evm_word(0xf0));
            p.push(1);
            p.extend_from_slice(&word(20_000));
            p.extend_from_slice(&word(5_000));
            p.extend_from_slice(&[0x43; 32]);
        }
        _ => {}
    }
    p
}

/// Signed message with one guardian signature.
pub fn vaa(emitter_chain: ChainId, emitter: [u8; 32], sequence: u64, payload: &[u8]) -> Vec<u8> {
    let mut v = vec![1u8];
    v.extend_from_slice(&4u32.to_be_bytes());
    v.push(1);
    v.push(0);
    v.extend_from_slice(&[0xab; 65]);
    v.extend_from_slice(&1_700_000_000u32.to_be_bytes());
    v.extend_from_slice(&7u32.to_be_bytes());
    v.extend_from_slice(&emitter_chain.0.to_be_bytes());
    v.extend_from_slice(&emitter);
    v.extend_from_slice(&sequence.to_be_bytes());
    v.push(15);
    v.extend_from_slice(payload);
    v
}

/// 32-byte emitter word of an EVM contract address.
pub fn emitter_of(address: &str) -> [u8; 32] {
    let raw = hex::decode(address.trim_start_matches("0x")).unwrap();
    let mut w = [0u8; 32];
    w[32 - raw.len()..].copy_from_slice(&raw);
    w
}

pub fn deposit_for_burn_log(nonce: u64, destination_domain: u32) -> LogEntry {
    let mut data = Vec::new();
    data.extend_from_slice(&word(2_500_000));
    data.extend_from_slice(&[0x42; 32]);
    data.extend_from_slice(&word(destination_domain as u128));
    data.extend_from_slice(&[0u8; 64]);
    LogEntry {
        address: "0xbd3fa81b58ba92a82136038b25adec7066af3155".into(),
        topics: vec![
            deposit_for_burn_topic().to_string(),
            format!("0x{}", hex::encode(word(nonce as u128))),
            format!("0x{}", hex::encode(evm_word(0xa0))),
            format!("0x{}", hex::encode(evm_word(0xd0))),
        ],
        data: format!("0x{}", hex::encode(&data)),
    }
}

pub fn receipt(tx_id: &str, chain: ChainId, logs: Vec<LogEntry>) -> TransactionReceipt {
    TransactionReceipt {
        tx_id: tx_id.to_string(),
        chain,
        block_number: Some(19_000_000),
        from: Some(format!("0x{}", "d0".repeat(20))),
        success: true,
        logs,
    }
}

pub fn transfer_log() -> LogEntry {
    LogEntry {
        address: "0x98f3c9e6e3face36baad05fe09d375ef1464288b".into(),
        topics: vec![format!("0x{}", "11".repeat(32))],
        data: "0x".into(),
    }
}

fn url(host: &str) -> Url {
    Url::parse(&format!("https://{host}.example.org")).unwrap()
}

pub fn solana_settings() -> ChainSettings {
    let mut s = ChainSettings::new(ChainId::SOLANA, ChainPlatform::Solana, url("solana"));
    s.token_bridge = Some("wormDTUJ6AWPNvk59vGQbDvGJmqbDTdgWgAqcLBCgUb".into());
    s.relayer = Some("3vxKRPwUTiEkeUVyoZ9MXFe1V71sRLbLqu1gRYaWmehQ".into());
    s.native_decimals = 9;
    s.cctp = Some(CctpContracts {
        domain: 5,
        token_messenger: "CCTPiPYPc6AsJuwueEnWgSgucamXDZwBd53dQ11YiKX3".into(),
        message_transmitter: "CCTPmbSD7gX1bxKPAmg77w8oFzNFpaQiQUWD43TKaecd".into(),
        wormhole_cctp: Some("Wormho1eCirc1e1ntegration111111111111111111".into()),
    });
    s.relayer_fees.insert("USDCsol".into(), 250_000);
    s
}

pub fn ethereum_settings() -> ChainSettings {
    let mut s = ChainSettings::new(ChainId::ETHEREUM, ChainPlatform::Evm, url("eth"));
    s.token_bridge = Some("0x3ee18b2214aff97000d974cf647e7c347e8fa585".into());
    s.relayer = Some("0xcafd2f0a35a4459fa40c0517e17e6fa2939441ca".into());
    s.cctp = Some(CctpContracts {
        domain: 0,
        token_messenger: "0xbd3fa81b58ba92a82136038b25adec7066af3155".into(),
        message_transmitter: "0x0a992d191deec32afe36203ad87d7d289a738f81".into(),
        wormhole_cctp: Some(CCTP_INTEGRATION.into()),
    });
    s.relayer_fees.insert("USDCeth".into(), 500_000);
    s
}

pub fn tokens() -> Vec<TokenConfig> {
    let usdc = |key: &str, chain: ChainId, address: &str, relayable: bool| TokenConfig {
        key: key.into(),
        symbol: "USDC".into(),
        native_chain: chain,
        token_id: Some(TokenId {
            chain,
            address: address.into(),
        }),
        decimals: 6,
        cctp: true,
        relayable,
    };
    vec![
        usdc("USDCeth", ChainId::ETHEREUM, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", true),
        usdc("USDCsol", ChainId::SOLANA, "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", false),
        TokenConfig {
            key: "WETH".into(),
            symbol: "WETH".into(),
            native_chain: ChainId::ETHEREUM,
            token_id: Some(TokenId {
                chain: ChainId::ETHEREUM,
                address: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".into(),
            }),
            decimals: 18,
            cctp: false,
            relayable: true,
        },
    ]
}

/// Context over Ethereum and Solana backed by the given fakes.
pub fn context(
    fetcher: Arc<FakeMessageFetcher>,
    eth: Arc<FakeChainRpc>,
    sol: Arc<FakeChainRpc>,
    clock: Arc<ManualClock>,
) -> RouteContext {
    RouteContext::new(fetcher, signer())
        .with_clock(clock)
        .with_chain(ethereum_settings(), eth)
        .with_chain(solana_settings(), sol)
}

pub fn signer() -> Arc<dyn TransactionSigner> {
    Arc::new(Ed25519Signer::from_secret_hex(&"07".repeat(32)).unwrap())
}
