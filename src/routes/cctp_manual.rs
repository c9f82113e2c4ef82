// Manual CCTP route
// Native USDC burn on the source chain; the recipient redeems on the destination
// chain with the issuer's attestation. No attested message is produced, so every
// handle is the source receipt

use crate::config::CctpContracts;
use crate::context::RouteContext;
use crate::errors::RouteError;
use crate::execution::transaction::{AccountMeta, Transaction};
use crate::message::{
    deposit_for_burn_topic, keccak256, message_sent_bytes, message_sent_topic, DepositForBurn,
    TransactionReceipt,
};
use crate::router::validation::validate_transfer;
use crate::routes::{
    address_bytes, amount_u64, estimate_transaction_fee, fetch_receipt, platform_of,
    preview_rows, program_call, request_token_address, request_token_config, MessageInfo,
    ParsedMessage, PreviewParams, Route, RouteOptions, RouteStrategy, TransferDisplayData,
    TransferRequest,
};
use crate::types::{ChainId, TokenConfig, TokenId};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub(crate) const DEPOSIT_FOR_BURN_IX: u8 = 4;
pub(crate) const RECEIVE_MESSAGE_IX: u8 = 5;

/// Decimals of native USDC.
pub(crate) const USDC_DECIMALS: u8 = 6;

#[derive(Debug, Serialize)]
struct DepositForBurnData {
    amount: u64,
    destination_domain: u32,
    mint_recipient: [u8; 32],
    burn_token: String,
}

#[derive(Debug, Serialize)]
struct ReceiveMessage {
    message: Vec<u8>,
    attestation: Vec<u8>,
}

pub(crate) fn cctp_contracts(ctx: &RouteContext, chain: ChainId) -> Result<&CctpContracts, RouteError> {
    ctx.chain(chain)?
        .cctp
        .as_ref()
        .ok_or_else(|| RouteError::InvalidRequest(format!("{chain} has no CCTP contracts")))
}

pub(crate) fn has_cctp(ctx: &RouteContext, chain: ChainId) -> bool {
    cctp_contracts(ctx, chain).is_ok()
}

/// Chain whose CCTP domain is `domain`, or a request error naming it.
pub(crate) fn domain_chain(ctx: &RouteContext, domain: u32) -> Result<ChainId, RouteError> {
    ctx.chain_for_domain(domain)
        .ok_or_else(|| RouteError::InvalidRequest(format!("no chain configured for CCTP domain {domain}")))
}

pub struct CctpManualRoute {
    ctx: Arc<RouteContext>,
}

impl CctpManualRoute {
    pub fn new(ctx: Arc<RouteContext>) -> Self {
        Self { ctx }
    }

    fn receipt<'a>(&self, info: &'a MessageInfo) -> Result<&'a TransactionReceipt, RouteError> {
        info.receipt().ok_or_else(|| {
            RouteError::InvalidRequest("manual CCTP transfers are tracked by receipt".into())
        })
    }

    fn burn(&self, receipt: &TransactionReceipt) -> Result<DepositForBurn, RouteError> {
        let log = receipt.find_log(deposit_for_burn_topic()).ok_or_else(|| {
            RouteError::InvalidRequest(format!("{} has no DepositForBurn log", receipt.tx_id))
        })?;
        Ok(DepositForBurn::from_log(log)?)
    }

    fn burn_tx(&self, request: &TransferRequest) -> Result<Transaction, RouteError> {
        let source = cctp_contracts(&self.ctx, request.source_chain)?;
        let dest = cctp_contracts(&self.ctx, request.dest_chain)?;
        program_call(
            &source.token_messenger,
            &request.sender,
            vec![AccountMeta::writable(request_token_address(request), false)],
            DEPOSIT_FOR_BURN_IX,
            &DepositForBurnData {
                amount: amount_u64(request.amount)?,
                destination_domain: dest.domain,
                mint_recipient: address_bytes(&request.recipient)?,
                burn_token: request_token_address(request),
            },
        )
    }
}

#[async_trait]
impl RouteStrategy for CctpManualRoute {
    fn route(&self) -> Route {
        Route::CctpManual
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
        Ok(token.cctp
            && source_chain.map_or(true, |c| token.native_chain == c && has_cctp(&self.ctx, c))
            && dest_token.map_or(true, |d| d.cctp))
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
        Ok(token.cctp
            && dest_chain.map_or(true, |c| token.native_chain == c && has_cctp(&self.ctx, c))
            && source_token.map_or(true, |s| s.cctp))
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
            result.check(has_cctp(&self.ctx, chain), || format!("no CCTP contracts on {chain}"));
        }
        result.check(
            request_token_config(&self.ctx, request).is_some_and(|t| t.cctp),
            || "token is not native USDC".into(),
        );
        Ok(result.finish(self.route()))
    }

    async fn estimate_send_gas(&self, request: &TransferRequest) -> Result<String, RouteError> {
        let tx = self.burn_tx(request)?;
        estimate_transaction_fee(&self.ctx, request.source_chain, tx).await
    }

    #[tracing::instrument(skip_all, fields(route = %self.route(), from = %request.source_chain, to = %request.dest_chain))]
    async fn send(&self, request: &TransferRequest) -> Result<String, RouteError> {
        let tx = self.burn_tx(request)?;
        let signature = self
            .ctx
            .submitter(request.source_chain)?
            .sign_and_send(tx)
            .await?;
        info!(signature = %signature, amount = request.amount, "burn sent");
        Ok(signature)
    }

    #[tracing::instrument(skip_all, fields(route = %self.route(), to = %dest_chain, tx = %info.tx_id()))]
    async fn redeem(
        &self,
        dest_chain: ChainId,
        info: &MessageInfo,
        payer: &str,
    ) -> Result<String, RouteError> {
        let receipt = self.receipt(info)?;
        let log = receipt.find_log(message_sent_topic()).ok_or_else(|| {
            RouteError::InvalidRequest(format!("{} has no MessageSent log", receipt.tx_id))
        })?;
        let message = message_sent_bytes(log)?;
        let attestation = self
            .ctx
            .messages()
            .fetch_cctp_attestation(&keccak256(&message))
            .await?;

        let transmitter = cctp_contracts(&self.ctx, dest_chain)?.message_transmitter.clone();
        let tx = program_call(
            &transmitter,
            payer,
            Vec::new(),
            RECEIVE_MESSAGE_IX,
            &ReceiveMessage {
                message,
                attestation,
            },
        )?;
        let signature = self.ctx.submitter(dest_chain)?.sign_and_send(tx).await?;
        info!(signature = %signature, "minted on destination");
        Ok(signature)
    }

    async fn parse_message(&self, info: &MessageInfo) -> Result<ParsedMessage, RouteError> {
        let receipt = self.receipt(info)?;
        let burn = self.burn(receipt)?;
        let dest_chain = domain_chain(&self.ctx, burn.destination_domain)?;
        let token = TokenId {
            chain: receipt.chain,
            address: burn.burn_token.clone(),
        };
        let decimals = self
            .ctx
            .token_by_id(&token)
            .map(|t| t.decimals)
            .unwrap_or(USDC_DECIMALS);
        Ok(ParsedMessage {
            route: self.route(),
            tx_id: receipt.tx_id.clone(),
            source_chain: receipt.chain,
            dest_chain,
            sender: Some(burn.depositor.clone()),
            recipient: platform_of(&self.ctx, dest_chain).format_address(&burn.mint_recipient),
            token,
            amount: burn.amount,
            decimals,
            sequence: Some(burn.nonce),
            emitter: None,
            relayer_fee: None,
            to_native_token: None,
            payload_kind: None,
        })
    }

    async fn get_preview(&self, params: &PreviewParams) -> Result<TransferDisplayData, RouteError> {
        let receive = self
            .compute_receive_amount(Some(params.amount), &params.options)
            .await?;
        Ok(preview_rows(params, receive, Vec::new()))
    }

    async fn get_foreign_asset(
        &self,
        token: &TokenId,
        chain: ChainId,
    ) -> Result<Option<String>, RouteError> {
        if token.chain == chain {
            return Ok(Some(token.address.clone()));
        }
        Ok(usdc_on(&self.ctx, chain).map(|id| id.address.clone()))
    }

    async fn is_transfer_completed(
        &self,
        dest_chain: ChainId,
        info: &MessageInfo,
    ) -> Result<bool, RouteError> {
        let receipt = self.receipt(info)?;
        let burn = self.burn(receipt)?;
        let source_domain = cctp_contracts(&self.ctx, receipt.chain)?.domain;
        let transmitter = cctp_contracts(&self.ctx, dest_chain)?.message_transmitter.clone();
        Ok(self
            .ctx
            .rpc(dest_chain)?
            .is_nonce_used(&transmitter, &burn.nonce_key(source_domain))
            .await?)
    }

    /// The burn has no attested message; the handle is always the receipt.
    async fn get_message_info(
        &self,
        tx_id: &str,
        chain: ChainId,
        _unsigned: bool,
    ) -> Result<MessageInfo, RouteError> {
        let receipt = fetch_receipt(&self.ctx, tx_id, chain).await?;
        self.burn(&receipt)?;
        Ok(MessageInfo::Receipt(receipt))
    }
}

/// Native USDC token id on `chain`, from the token table.
pub(crate) fn usdc_on(ctx: &RouteContext, chain: ChainId) -> Option<&TokenId> {
    ctx.tokens()
        .iter()
        .filter(|t| t.cctp && t.native_chain == chain)
        .find_map(|t| t.token_id.as_ref())
}
