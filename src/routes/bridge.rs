// Standard token bridge route
// Lock-or-burn on the source chain, attested message, manual redemption by the
// recipient on the destination chain

use crate::context::RouteContext;
use crate::errors::RouteError;
use crate::execution::transaction::{AccountMeta, Transaction};
use crate::router::validation::validate_transfer;
use crate::routes::{
    address_bytes, amount_u64, estimate_transaction_fee, parse_token_transfer, preview_rows,
    program_call, request_token_address, same_asset, MessageInfo, ParsedMessage, PreviewParams,
    Route, RouteOptions, RouteStrategy, TransferDisplayData, TransferRequest,
};
use crate::types::{ChainId, Token, TokenConfig};
use async_trait::async_trait;
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub(crate) const TRANSFER_TOKENS_IX: u8 = 1;
pub(crate) const COMPLETE_TRANSFER_IX: u8 = 2;

#[derive(Debug, Serialize)]
struct TransferTokens {
    nonce: u32,
    token: String,
    amount: u64,
    relayer_fee: u64,
    recipient: [u8; 32],
    recipient_chain: u16,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompleteTransfer {
    pub vaa: Vec<u8>,
}

pub struct BridgeRoute {
    ctx: Arc<RouteContext>,
}

impl BridgeRoute {
    pub fn new(ctx: Arc<RouteContext>) -> Self {
        Self { ctx }
    }

    fn token_bridge(&self, chain: ChainId) -> Result<String, RouteError> {
        self.ctx
            .chain(chain)?
            .token_bridge
            .clone()
            .ok_or(RouteError::unsupported(Route::StandardBridge, "token bridge"))
    }

    fn has_token_bridge(&self, chain: ChainId) -> bool {
        self.ctx
            .chain(chain)
            .map(|c| c.token_bridge.is_some())
            .unwrap_or(false)
    }

    fn transfer_tx(&self, request: &TransferRequest) -> Result<Transaction, RouteError> {
        let program = self.token_bridge(request.source_chain)?;
        let token_accounts = match &request.token {
            Token::Native => Vec::new(),
            Token::Id(id) => vec![AccountMeta::readonly(id.address.clone())],
        };
        program_call(
            &program,
            &request.sender,
            token_accounts,
            TRANSFER_TOKENS_IX,
            &TransferTokens {
                nonce: OsRng.next_u32(),
                token: request_token_address(request),
                amount: amount_u64(request.amount)?,
                relayer_fee: 0,
                recipient: address_bytes(&request.recipient)?,
                recipient_chain: request.dest_chain.0,
            },
        )
    }

    /// Submit the manual completion for an attested transfer. Shared with the
    /// automatic relay route, whose transfers can also be completed by hand.
    pub(crate) async fn complete_transfer(
        ctx: &RouteContext,
        dest_chain: ChainId,
        info: &MessageInfo,
        payer: &str,
    ) -> Result<String, RouteError> {
        let message = info.signed().ok_or_else(|| {
            RouteError::InvalidRequest("redeem needs the attested message".into())
        })?;
        let program = ctx
            .chain(dest_chain)?
            .token_bridge
            .clone()
            .ok_or(RouteError::UnknownChain(dest_chain))?;
        let tx = program_call(
            &program,
            payer,
            Vec::new(),
            COMPLETE_TRANSFER_IX,
            &CompleteTransfer {
                vaa: message.raw.clone(),
            },
        )?;
        let signature = ctx.submitter(dest_chain)?.sign_and_send(tx).await?;
        info!(chain = %dest_chain, sequence = message.sequence, signature = %signature, "redeemed transfer");
        Ok(signature)
    }

    pub(crate) async fn message_consumed(
        ctx: &RouteContext,
        dest_chain: ChainId,
        info: &MessageInfo,
    ) -> Result<bool, RouteError> {
        let message = info.signed().ok_or_else(|| {
            RouteError::InvalidRequest("completion check needs the attested message".into())
        })?;
        let program = ctx
            .chain(dest_chain)?
            .token_bridge
            .clone()
            .ok_or(RouteError::UnknownChain(dest_chain))?;
        Ok(ctx
            .rpc(dest_chain)?
            .is_message_consumed(&program, &message.digest())
            .await?)
    }
}

#[async_trait]
impl RouteStrategy for BridgeRoute {
    fn route(&self) -> Route {
        Route::StandardBridge
    }

    fn context(&self) -> &RouteContext {
        &self.ctx
    }

    async fn is_route_available(
        &self,
        source_token: &str,
        dest_token: &str,
        amount: f64,
        source_chain: ChainId,
        dest_chain: ChainId,
    ) -> Result<bool, RouteError> {
        let (Some(src), Some(dst)) = (self.ctx.token(source_token), self.ctx.token(dest_token)) else {
            return Ok(false);
        };
        if amount <= 0.0 || source_chain == dest_chain {
            return Ok(false);
        }
        Ok(self
            .is_supported_source_token(Some(src), Some(dst), Some(source_chain), Some(dest_chain))
            .await?
            && self
                .is_supported_dest_token(Some(dst), Some(src), Some(source_chain), Some(dest_chain))
                .await?)
    }

    async fn is_supported_source_token(
        &self,
        token: Option<&TokenConfig>,
        dest_token: Option<&TokenConfig>,
        source_chain: Option<ChainId>,
        _dest_chain: Option<ChainId>,
    ) -> Result<bool, RouteError> {
        let Some(token) = token else {
            return Ok(false);
        };
        if source_chain.is_some_and(|c| !self.has_token_bridge(c)) {
            return Ok(false);
        }
        Ok(dest_token.map(|d| same_asset(token, d)).unwrap_or(true))
    }

    async fn is_supported_dest_token(
        &self,
        token: Option<&TokenConfig>,
        source_token: Option<&TokenConfig>,
        _source_chain: Option<ChainId>,
        dest_chain: Option<ChainId>,
    ) -> Result<bool, RouteError> {
        let Some(token) = token else {
            return Ok(false);
        };
        if dest_chain.is_some_and(|c| !self.has_token_bridge(c)) {
            return Ok(false);
        }
        Ok(source_token.map(|s| same_asset(token, s)).unwrap_or(true))
    }

    async fn compute_receive_amount(
        &self,
        send_amount: Option<f64>,
        _options: &RouteOptions,
    ) -> Result<f64, RouteError> {
        Ok(send_amount.unwrap_or(0.0))
    }

    async fn compute_send_amount(
        &self,
        receive_amount: Option<f64>,
        _options: &RouteOptions,
    ) -> Result<f64, RouteError> {
        Ok(receive_amount.unwrap_or(0.0))
    }

    async fn validate(&self, request: &TransferRequest) -> Result<bool, RouteError> {
        let mut result = validate_transfer(&self.ctx, self.route(), request);
        for chain in [request.source_chain, request.dest_chain] {
            result.check(self.has_token_bridge(chain), || {
                format!("no token bridge on {chain}")
            });
        }
        result.check(u64::try_from(request.amount).is_ok(), || {
            "amount exceeds 64 bits".into()
        });
        Ok(result.finish(self.route()))
    }

    async fn estimate_send_gas(&self, request: &TransferRequest) -> Result<String, RouteError> {
        let tx = self.transfer_tx(request)?;
        estimate_transaction_fee(&self.ctx, request.source_chain, tx).await
    }

    #[tracing::instrument(skip_all, fields(route = %self.route(), from = %request.source_chain, to = %request.dest_chain))]
    async fn send(&self, request: &TransferRequest) -> Result<String, RouteError> {
        let tx = self.transfer_tx(request)?;
        let signature = self
            .ctx
            .submitter(request.source_chain)?
            .sign_and_send(tx)
            .await?;
        info!(signature = %signature, amount = request.amount, "transfer sent");
        Ok(signature)
    }

    async fn redeem(
        &self,
        dest_chain: ChainId,
        info: &MessageInfo,
        payer: &str,
    ) -> Result<String, RouteError> {
        Self::complete_transfer(&self.ctx, dest_chain, info, payer).await
    }

    async fn parse_message(&self, info: &MessageInfo) -> Result<ParsedMessage, RouteError> {
        parse_token_transfer(&self.ctx, self.route(), info)
    }

    async fn get_preview(&self, params: &PreviewParams) -> Result<TransferDisplayData, RouteError> {
        let receive = self
            .compute_receive_amount(Some(params.amount), &params.options)
            .await?;
        Ok(preview_rows(params, receive, Vec::new()))
    }

    async fn is_transfer_completed(
        &self,
        dest_chain: ChainId,
        info: &MessageInfo,
    ) -> Result<bool, RouteError> {
        Self::message_consumed(&self.ctx, dest_chain, info).await
    }
}
