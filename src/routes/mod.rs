// Route strategies - the uniform capability set behind every bridging mechanism
// This file defines the route tag, the per-route option variants, the request and
// message handles passed between the operator and the strategies, and the
// RouteStrategy trait itself

pub mod aggregator;
pub mod bridge;
pub mod cctp_manual;
pub mod cctp_relay;
pub mod relay;

pub use aggregator::AggregatorRoute;
pub use bridge::BridgeRoute;
pub use cctp_manual::CctpManualRoute;
pub use cctp_relay::CctpRelayRoute;
pub use relay::RelayRoute;

use crate::context::RouteContext;
use crate::errors::RouteError;
use crate::execution::transaction::{AccountMeta, Instruction, Transaction};
use crate::message::{
    denormalize_amount, log_message_published_topic, PayloadKind, PublishedMessage,
    RelayInstructions, SignedMessage, TokenTransferPayload, TransactionReceipt,
};
use crate::transport::jsonrpc::address_word;
use crate::types::{from_base_units, ChainId, ChainPlatform, Token, TokenConfig, TokenId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Signature fee charged per transaction on the account-model chain, in base units.
pub const BASE_SIGNATURE_FEE: u128 = 5_000;

/// Closed set of bridging mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "bridge")]
    StandardBridge,
    #[serde(rename = "relay")]
    AutomaticRelay,
    #[serde(rename = "cctp_manual", alias = "cctpManual")]
    CctpManual,
    #[serde(rename = "cctp_relay", alias = "cctpRelay")]
    CctpRelay,
    #[serde(rename = "aggregator", alias = "hashflow")]
    Aggregator,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::StandardBridge,
        Route::AutomaticRelay,
        Route::CctpManual,
        Route::CctpRelay,
        Route::Aggregator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::StandardBridge => "bridge",
            Route::AutomaticRelay => "relay",
            Route::CctpManual => "cctp_manual",
            Route::CctpRelay => "cctp_relay",
            Route::Aggregator => "aggregator",
        }
    }

    /// Whether a third party completes the transfer on the destination chain.
    pub fn is_relayed(&self) -> bool {
        matches!(self, Route::AutomaticRelay | Route::CctpRelay)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bridge" | "standard_bridge" => Ok(Route::StandardBridge),
            "relay" | "automatic_relay" => Ok(Route::AutomaticRelay),
            "cctp_manual" | "cctpmanual" => Ok(Route::CctpManual),
            "cctp_relay" | "cctprelay" => Ok(Route::CctpRelay),
            "aggregator" | "hashflow" => Ok(Route::Aggregator),
            other => Err(format!("unknown route: {other}")),
        }
    }
}

/// Relayer options, in human units of the transferred token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayOptions {
    /// Portion of the transfer swapped into destination gas.
    pub to_native_token: f64,
    pub relayer_fee: f64,
}

/// Per-route option bag, checked against the route before any call uses it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum RouteOptions {
    #[default]
    None,
    Relay(RelayOptions),
    Aggregator { slippage_bps: u16 },
}

impl RouteOptions {
    pub fn check(&self, route: Route) -> Result<(), RouteError> {
        match (route, self) {
            (_, RouteOptions::None) => Ok(()),
            (Route::AutomaticRelay | Route::CctpRelay, RouteOptions::Relay(opts)) => {
                let valid = [opts.to_native_token, opts.relayer_fee]
                    .iter()
                    .all(|v| v.is_finite() && *v >= 0.0);
                if valid {
                    Ok(())
                } else {
                    Err(RouteError::InvalidOptions(route))
                }
            }
            (Route::Aggregator, RouteOptions::Aggregator { slippage_bps }) if *slippage_bps <= 10_000 => {
                Ok(())
            }
            _ => Err(RouteError::InvalidOptions(route)),
        }
    }

    pub fn relay(&self) -> RelayOptions {
        match self {
            RouteOptions::Relay(opts) => *opts,
            _ => RelayOptions::default(),
        }
    }
}

/// One transfer attempt. Never mutated; retries build a new request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub token: Token,
    /// Base units of `token`
    pub amount: u128,
    pub source_chain: ChainId,
    pub sender: String,
    pub dest_chain: ChainId,
    pub recipient: String,
    #[serde(default)]
    pub options: RouteOptions,
}

impl TransferRequest {
    pub fn new(
        token: Token,
        amount: u128,
        source_chain: ChainId,
        sender: impl Into<String>,
        dest_chain: ChainId,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            token,
            amount,
            source_chain,
            sender: sender.into(),
            dest_chain,
            recipient: recipient.into(),
            options: RouteOptions::None,
        }
    }

    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }
}

/// Handle passed to redeem/parse/completion: an attested message, or the
/// source receipt for routes (and lookups) without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageInfo {
    Signed {
        message: Arc<SignedMessage>,
        tx_id: String,
    },
    Receipt(TransactionReceipt),
}

impl MessageInfo {
    pub fn tx_id(&self) -> &str {
        match self {
            MessageInfo::Signed { tx_id, .. } => tx_id,
            MessageInfo::Receipt(receipt) => &receipt.tx_id,
        }
    }

    pub fn source_chain(&self) -> ChainId {
        match self {
            MessageInfo::Signed { message, .. } => message.emitter_chain,
            MessageInfo::Receipt(receipt) => receipt.chain,
        }
    }

    pub fn signed(&self) -> Option<&SignedMessage> {
        match self {
            MessageInfo::Signed { message, .. } => Some(message),
            MessageInfo::Receipt(_) => None,
        }
    }

    pub fn receipt(&self) -> Option<&TransactionReceipt> {
        match self {
            MessageInfo::Receipt(receipt) => Some(receipt),
            MessageInfo::Signed { .. } => None,
        }
    }
}

/// Structured description of a transfer decoded from its message or receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub route: Route,
    pub tx_id: String,
    pub source_chain: ChainId,
    pub dest_chain: ChainId,
    pub sender: Option<String>,
    pub recipient: String,
    pub token: TokenId,
    /// Base units of `token`, using `decimals`
    pub amount: u128,
    pub decimals: u8,
    pub sequence: Option<u64>,
    pub emitter: Option<String>,
    pub relayer_fee: Option<u128>,
    pub to_native_token: Option<u128>,
    pub payload_kind: Option<PayloadKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub title: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<DisplayRow>,
}

impl DisplayRow {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<DisplayRow>) -> Self {
        self.rows = rows;
        self
    }
}

pub type TransferDisplayData = Vec<DisplayRow>;

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewParams {
    pub token: TokenConfig,
    pub dest_token: TokenConfig,
    /// Human units
    pub amount: f64,
    pub source_chain: ChainId,
    pub dest_chain: ChainId,
    pub send_gas_estimate: String,
    pub claim_gas_estimate: String,
    pub options: RouteOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferInfoParams {
    pub message: ParsedMessage,
    pub receive_tx: Option<String>,
    pub gas_estimate: Option<String>,
}

/// Capability set every route implements. The operator forwards to it
/// without branching on the route kind.
#[async_trait]
pub trait RouteStrategy: Send + Sync {
    fn route(&self) -> Route;

    fn context(&self) -> &RouteContext;

    async fn is_route_available(
        &self,
        source_token: &str,
        dest_token: &str,
        amount: f64,
        source_chain: ChainId,
        dest_chain: ChainId,
    ) -> Result<bool, RouteError>;

    async fn is_supported_source_token(
        &self,
        token: Option<&TokenConfig>,
        dest_token: Option<&TokenConfig>,
        source_chain: Option<ChainId>,
        dest_chain: Option<ChainId>,
    ) -> Result<bool, RouteError>;

    async fn is_supported_dest_token(
        &self,
        token: Option<&TokenConfig>,
        source_token: Option<&TokenConfig>,
        source_chain: Option<ChainId>,
        dest_chain: Option<ChainId>,
    ) -> Result<bool, RouteError>;

    async fn supported_source_tokens(
        &self,
        tokens: &[TokenConfig],
        dest_token: Option<&TokenConfig>,
        source_chain: Option<ChainId>,
        dest_chain: Option<ChainId>,
    ) -> Result<Vec<TokenConfig>, RouteError> {
        let mut supported = Vec::new();
        for token in tokens {
            if self
                .is_supported_source_token(Some(token), dest_token, source_chain, dest_chain)
                .await?
            {
                supported.push(token.clone());
            }
        }
        Ok(supported)
    }

    async fn supported_dest_tokens(
        &self,
        tokens: &[TokenConfig],
        source_token: Option<&TokenConfig>,
        source_chain: Option<ChainId>,
        dest_chain: Option<ChainId>,
    ) -> Result<Vec<TokenConfig>, RouteError> {
        let mut supported = Vec::new();
        for token in tokens {
            if self
                .is_supported_dest_token(Some(token), source_token, source_chain, dest_chain)
                .await?
            {
                supported.push(token.clone());
            }
        }
        Ok(supported)
    }

    async fn compute_receive_amount(
        &self,
        send_amount: Option<f64>,
        options: &RouteOptions,
    ) -> Result<f64, RouteError>;

    async fn compute_send_amount(
        &self,
        receive_amount: Option<f64>,
        options: &RouteOptions,
    ) -> Result<f64, RouteError>;

    async fn validate(&self, request: &TransferRequest) -> Result<bool, RouteError>;

    /// Native-token fee of the source transaction, formatted in human units.
    async fn estimate_send_gas(&self, request: &TransferRequest) -> Result<String, RouteError>;

    async fn estimate_claim_gas(&self, dest_chain: ChainId) -> Result<String, RouteError> {
        if self.route().is_relayed() {
            return Ok("0".to_string());
        }
        claim_fee_estimate(self.context(), dest_chain)
    }

    async fn send(&self, request: &TransferRequest) -> Result<String, RouteError>;

    async fn redeem(
        &self,
        dest_chain: ChainId,
        info: &MessageInfo,
        payer: &str,
    ) -> Result<String, RouteError>;

    async fn parse_message(&self, info: &MessageInfo) -> Result<ParsedMessage, RouteError>;

    async fn get_preview(&self, params: &PreviewParams) -> Result<TransferDisplayData, RouteError>;

    async fn get_native_balance(
        &self,
        address: &str,
        chain: ChainId,
    ) -> Result<Option<u128>, RouteError> {
        Ok(self.context().rpc(chain)?.native_balance(address).await?)
    }

    async fn get_token_balance(
        &self,
        address: &str,
        token: &TokenId,
        chain: ChainId,
    ) -> Result<Option<u128>, RouteError> {
        let local = match self.get_foreign_asset(token, chain).await? {
            Some(local_address) => TokenId {
                chain,
                address: local_address,
            },
            None => return Ok(None),
        };
        Ok(self.context().rpc(chain)?.token_balance(address, &local).await?)
    }

    /// Relayer fee in base units; manual routes charge none.
    async fn get_relayer_fee(
        &self,
        _source_chain: ChainId,
        _dest_chain: ChainId,
        _token_key: &str,
    ) -> Result<u128, RouteError> {
        Ok(0)
    }

    /// Address of `token`'s representation on `chain`.
    async fn get_foreign_asset(
        &self,
        token: &TokenId,
        chain: ChainId,
    ) -> Result<Option<String>, RouteError> {
        if token.chain == chain {
            return Ok(Some(token.address.clone()));
        }
        let settings = self.context().chain(chain)?;
        let Some(token_bridge) = &settings.token_bridge else {
            return Err(RouteError::unsupported(self.route(), "get_foreign_asset"));
        };
        Ok(self
            .context()
            .rpc(chain)?
            .foreign_asset(token_bridge, token)
            .await?)
    }

    async fn is_transfer_completed(
        &self,
        dest_chain: ChainId,
        info: &MessageInfo,
    ) -> Result<bool, RouteError>;

    /// Attested message for `tx_id`; with `unsigned`, the source receipt
    /// instead, so callers can inspect a transfer before it is attested.
    async fn get_message_info(
        &self,
        tx_id: &str,
        chain: ChainId,
        unsigned: bool,
    ) -> Result<MessageInfo, RouteError> {
        if unsigned {
            return Ok(MessageInfo::Receipt(
                fetch_receipt(self.context(), tx_id, chain).await?,
            ));
        }
        let message = self.context().messages().fetch(tx_id, chain).await?;
        Ok(MessageInfo::Signed {
            message: Arc::new(message),
            tx_id: tx_id.to_string(),
        })
    }

    async fn get_transfer_source_info(
        &self,
        params: &TransferInfoParams,
    ) -> Result<TransferDisplayData, RouteError> {
        let msg = &params.message;
        Ok(vec![
            DisplayRow::new("Amount", format_token_amount(self.context(), msg, msg.amount)),
            DisplayRow::new("Sender", msg.sender.clone().unwrap_or_else(|| "Unknown".into())),
            DisplayRow::new(
                "Gas fee",
                params
                    .gas_estimate
                    .clone()
                    .unwrap_or_else(|| "Not available".into()),
            ),
        ])
    }

    async fn get_transfer_dest_info(
        &self,
        params: &TransferInfoParams,
    ) -> Result<TransferDisplayData, RouteError> {
        let msg = &params.message;
        let fee = msg.relayer_fee.unwrap_or(0);
        let native = msg.to_native_token.unwrap_or(0);
        let received = msg.amount.saturating_sub(fee).saturating_sub(native);
        let mut rows = vec![
            DisplayRow::new("Amount", format_token_amount(self.context(), msg, received)),
            DisplayRow::new("Recipient", msg.recipient.clone()),
        ];
        if msg.relayer_fee.is_some() {
            rows.push(DisplayRow::new(
                "Relayer fee",
                format_token_amount(self.context(), msg, fee),
            ));
        }
        if native > 0 {
            rows.push(DisplayRow::new(
                "Native gas swap",
                format_token_amount(self.context(), msg, native),
            ));
        }
        if let Some(tx) = &params.receive_tx {
            rows.push(DisplayRow::new("Claim transaction", tx.clone()));
        }
        Ok(rows)
    }

    async fn native_token_amount(
        &self,
        _dest_chain: ChainId,
        _token: &TokenId,
        _amount: u128,
        _wallet: &str,
    ) -> Result<u128, RouteError> {
        Err(RouteError::unsupported(self.route(), "native_token_amount"))
    }

    async fn max_swap_amount(
        &self,
        _dest_chain: ChainId,
        _token: &TokenId,
        _wallet: &str,
    ) -> Result<u128, RouteError> {
        Err(RouteError::unsupported(self.route(), "max_swap_amount"))
    }
}

pub(crate) async fn fetch_receipt(
    ctx: &RouteContext,
    tx_id: &str,
    chain: ChainId,
) -> Result<TransactionReceipt, RouteError> {
    ctx.rpc(chain)?
        .get_receipt(tx_id)
        .await?
        .ok_or_else(|| RouteError::ReceiptNotFound {
            tx_id: tx_id.to_string(),
            chain,
        })
}

/// Platform of `chain`, falling back to EVM formatting for chains not configured.
pub(crate) fn platform_of(ctx: &RouteContext, chain: ChainId) -> ChainPlatform {
    ctx.chain(chain)
        .map(|c| c.platform)
        .unwrap_or(ChainPlatform::Evm)
}

/// Decode a token-bridge transfer from either handle kind.
pub(crate) fn parse_token_transfer(
    ctx: &RouteContext,
    route: Route,
    info: &MessageInfo,
) -> Result<ParsedMessage, RouteError> {
    let (payload, sequence, emitter, sender) = match info {
        MessageInfo::Signed { message, .. } => (
            message.payload.clone(),
            message.sequence,
            platform_of(ctx, message.emitter_chain).format_address(&message.emitter_address),
            None,
        ),
        MessageInfo::Receipt(receipt) => {
            let log = receipt
                .find_log(log_message_published_topic())
                .ok_or_else(|| {
                    RouteError::InvalidRequest(format!(
                        "receipt {} carries no published message",
                        receipt.tx_id
                    ))
                })?;
            let published = PublishedMessage::from_log(log)?;
            (
                published.payload,
                published.sequence,
                published.emitter,
                receipt.from.clone(),
            )
        }
    };

    let transfer = TokenTransferPayload::parse(&payload)?;
    let token = TokenId {
        chain: transfer.token_chain,
        address: platform_of(ctx, transfer.token_chain).format_address(&transfer.token_address),
    };
    let decimals = ctx.token_by_id(&token).map(|t| t.decimals).unwrap_or(8);
    let dest_platform = platform_of(ctx, transfer.to_chain);

    let relay = match transfer.kind {
        PayloadKind::Automatic => RelayInstructions::parse(&transfer.extra).ok(),
        _ => None,
    };
    let recipient = match &relay {
        Some(relay) => dest_platform.format_address(&relay.recipient),
        None => dest_platform.format_address(&transfer.to),
    };
    let sender = sender.or_else(|| {
        transfer
            .from_address
            .map(|from| platform_of(ctx, info.source_chain()).format_address(&from))
    });
    let scale = |v: u128| denormalize_amount(v, decimals);

    Ok(ParsedMessage {
        route,
        tx_id: info.tx_id().to_string(),
        source_chain: info.source_chain(),
        dest_chain: transfer.to_chain,
        sender,
        recipient,
        token,
        amount: scale(transfer.amount),
        decimals,
        sequence: Some(sequence),
        emitter: Some(emitter),
        relayer_fee: relay
            .as_ref()
            .map(|r| scale(r.relayer_fee))
            .or(transfer.fee.filter(|f| *f > 0).map(scale)),
        to_native_token: relay.as_ref().map(|r| scale(r.to_native_token_amount)),
        payload_kind: Some(transfer.kind),
    })
}

/// Native-token fee for `tx` on `chain`: base signature fee plus the priority
/// bid, formatted in human units.
pub(crate) async fn estimate_transaction_fee(
    ctx: &RouteContext,
    chain: ChainId,
    mut tx: Transaction,
) -> Result<String, RouteError> {
    tx.strip_compute_budget();
    let bid = ctx.fee_estimator(chain)?.estimate(&mut tx).await?;
    let priority = (bid.compute_unit_limit as u128 * bid.compute_unit_price as u128).div_ceil(1_000_000);
    let decimals = ctx.chain(chain)?.native_decimals;
    Ok(from_base_units(BASE_SIGNATURE_FEE + priority, decimals).to_string())
}

/// Claim fee estimate at the baseline compute budget and the minimum price.
pub(crate) fn claim_fee_estimate(ctx: &RouteContext, chain: ChainId) -> Result<String, RouteError> {
    let submission = ctx.submission();
    let priority = (submission.default_compute_units as u128 * submission.min_priority_fee as u128)
        .div_ceil(1_000_000);
    let decimals = ctx.chain(chain)?.native_decimals;
    Ok(from_base_units(BASE_SIGNATURE_FEE + priority, decimals).to_string())
}

pub(crate) fn format_token_amount(ctx: &RouteContext, msg: &ParsedMessage, amount: u128) -> String {
    let symbol = ctx
        .token_by_id(&msg.token)
        .map(|t| t.symbol.clone())
        .unwrap_or_else(|| msg.token.address.clone());
    format!("{} {}", from_base_units(amount, msg.decimals), symbol)
}

/// Program instruction: `tag || bcs(data)`, with the sender as signing fee payer.
pub(crate) fn program_call<T: Serialize>(
    program: &str,
    payer: &str,
    extra_accounts: Vec<AccountMeta>,
    tag: u8,
    data: &T,
) -> Result<Transaction, RouteError> {
    let mut bytes = vec![tag];
    bytes.extend(
        bcs::to_bytes(data)
            .map_err(|e| RouteError::InvalidRequest(format!("encode instruction: {e}")))?,
    );
    let mut accounts = vec![AccountMeta::writable(payer, true)];
    accounts.extend(extra_accounts);
    Ok(Transaction::new(
        payer,
        vec![Instruction::new(program, accounts, bytes)],
    ))
}

/// 32-byte form of a user-supplied address.
pub(crate) fn address_bytes(address: &str) -> Result<[u8; 32], RouteError> {
    address_word(address).map_err(|e| RouteError::InvalidRequest(e.to_string()))
}

pub(crate) fn amount_u64(amount: u128) -> Result<u64, RouteError> {
    u64::try_from(amount)
        .map_err(|_| RouteError::InvalidRequest(format!("amount {amount} exceeds 64 bits")))
}

/// Source token id for `request`; the chain's gas token has none.
pub(crate) fn request_token_address(request: &TransferRequest) -> String {
    match &request.token {
        Token::Native => "native".to_string(),
        Token::Id(id) => id.address.clone(),
    }
}

/// Token table entry for the token `request` moves.
pub(crate) fn request_token_config<'a>(
    ctx: &'a RouteContext,
    request: &TransferRequest,
) -> Option<&'a TokenConfig> {
    match &request.token {
        Token::Native => ctx
            .tokens()
            .iter()
            .find(|t| t.is_native() && t.native_chain == request.source_chain),
        Token::Id(id) => ctx.token_by_id(id),
    }
}

/// Whether two token table entries are representations of the same asset.
pub(crate) fn same_asset(a: &TokenConfig, b: &TokenConfig) -> bool {
    match (&a.token_id, &b.token_id) {
        (Some(x), Some(y)) => x == y,
        _ => a.key == b.key,
    }
}

/// Common preview rows: what is sent, what arrives, and both gas estimates.
pub(crate) fn preview_rows(
    params: &PreviewParams,
    receive_amount: f64,
    fee_rows: Vec<DisplayRow>,
) -> TransferDisplayData {
    let mut rows = vec![
        DisplayRow::new("Amount", format!("{} {}", params.amount, params.token.symbol)),
        DisplayRow::new(
            "Receive",
            format!("{} {}", receive_amount, params.dest_token.symbol),
        ),
        DisplayRow::new("Source chain gas estimate", params.send_gas_estimate.clone()),
        DisplayRow::new("Destination chain gas estimate", params.claim_gas_estimate.clone()),
    ];
    if !fee_rows.is_empty() {
        rows.push(DisplayRow::new("Fees", String::new()).with_rows(fee_rows));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_tags_parse_and_display() {
        for route in Route::ALL {
            assert_eq!(route.as_str().parse::<Route>().unwrap(), route);
        }
        assert_eq!("hashflow".parse::<Route>().unwrap(), Route::Aggregator);
        assert!("teleport".parse::<Route>().is_err());
    }

    #[test]
    fn options_must_match_route() {
        let relay = RouteOptions::Relay(RelayOptions {
            to_native_token: 0.1,
            relayer_fee: 0.5,
        });
        assert!(relay.check(Route::AutomaticRelay).is_ok());
        assert!(relay.check(Route::CctpRelay).is_ok());
        assert_eq!(
            relay.check(Route::StandardBridge),
            Err(RouteError::InvalidOptions(Route::StandardBridge))
        );
        let negative = RouteOptions::Relay(RelayOptions {
            to_native_token: -1.0,
            relayer_fee: 0.0,
        });
        assert!(negative.check(Route::AutomaticRelay).is_err());
        assert!(RouteOptions::None.check(Route::CctpManual).is_ok());
        assert!(RouteOptions::Aggregator { slippage_bps: 20_000 }
            .check(Route::Aggregator)
            .is_err());
    }
}
