// Relayed CCTP route
// Native USDC burn through the wormhole CCTP integration contract, which also
// publishes an attested deposit message the relayer acts on

use crate::context::RouteContext;
use crate::errors::RouteError;
use crate::execution::transaction::{AccountMeta, Transaction};
use crate::message::{cctp_nonce_key, CctpDeposit, RelayInstructions, SignedMessage};
use crate::router::validation::validate_transfer;
use crate::routes::cctp_manual::{cctp_contracts, domain_chain, has_cctp, usdc_on, USDC_DECIMALS};
use crate::routes::{
    address_bytes, amount_u64, estimate_transaction_fee, platform_of, preview_rows,
    program_call, request_token_address, request_token_config, DisplayRow, MessageInfo,
    ParsedMessage, PreviewParams, Route, RouteOptions, RouteStrategy, TransferDisplayData,
    TransferRequest,
};
use crate::types::{from_base_units, to_base_units, ChainId, TokenConfig, TokenId};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub(crate) const TRANSFER_USDC_WITH_RELAY_IX: u8 = 6;

#[derive(Debug, Serialize)]
struct TransferUsdcWithRelay {
    token: String,
    amount: u64,
    to_native_token: u64,
    relayer_fee: u64,
    target_chain: u16,
    recipient: [u8; 32],
}

pub struct CctpRelayRoute {
    ctx: Arc<RouteContext>,
}

impl CctpRelayRoute {
    pub fn new(ctx: Arc<RouteContext>) -> Self {
        Self { ctx }
    }

    fn integration(&self, chain: ChainId) -> Option<String> {
        cctp_contracts(&self.ctx, chain)
            .ok()
            .and_then(|c| c.wormhole_cctp.clone())
    }

    fn source_fee(&self, source_chain: ChainId, token_key: &str) -> Option<u128> {
        self.ctx
            .chain(source_chain)
            .ok()?
            .relayer_fee(token_key)
            .map(u128::from)
    }

    fn deposit<'a>(&self, info: &'a MessageInfo) -> Result<(&'a SignedMessage, CctpDeposit), RouteError> {
        let message = info.signed().ok_or_else(|| {
            RouteError::InvalidRequest("relayed CCTP transfers are tracked by attested message".into())
        })?;
        Ok((message, CctpDeposit::parse(&message.payload)?))
    }

    fn transfer_tx(&self, request: &TransferRequest) -> Result<Transaction, RouteError> {
        let program = self
            .integration(request.source_chain)
            .ok_or(RouteError::unsupported(Route::CctpRelay, "wormhole cctp"))?;
        let token = request_token_config(&self.ctx, request)
            .ok_or_else(|| RouteError::InvalidRequest("token is not in the token table".into()))?;
        let fee = self
            .source_fee(request.source_chain, &token.key)
            .ok_or_else(|| RouteError::InvalidRequest(format!("no relayer fee for {}", token.key)))?;
        let to_native = to_base_units(request.options.relay().to_native_token, token.decimals);
        program_call(
            &program,
            &request.sender,
            vec![AccountMeta::writable(request_token_address(request), false)],
            TRANSFER_USDC_WITH_RELAY_IX,
            &TransferUsdcWithRelay {
                token: request_token_address(request),
                amount: amount_u64(request.amount)?,
                to_native_token: amount_u64(to_native)?,
                relayer_fee: amount_u64(fee)?,
                target_chain: request.dest_chain.0,
                recipient: address_bytes(&request.recipient)?,
            },
        )
    }

    fn supported_on(&self, token: &TokenConfig, chain: ChainId) -> bool {
        token.native_chain == chain && has_cctp(&self.ctx, chain) && self.integration(chain).is_some()
    }
}

#[async_trait]
impl RouteStrategy for CctpRelayRoute {
    fn route(&self) -> Route {
        Route::CctpRelay
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
        if source_chain == dest_chain {
            return Ok(false);
        }
        let supported = self
            .is_supported_source_token(Some(src), Some(dst), Some(source_chain), Some(dest_chain))
            .await?
            && self
                .is_supported_dest_token(Some(dst), Some(src), Some(source_chain), Some(dest_chain))
                .await?;
        let Some(fee) = self.source_fee(source_chain, &src.key) else {
            return Ok(false);
        };
        Ok(supported && amount > from_base_units(fee, src.decimals))
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
            && source_chain.map_or(true, |c| self.supported_on(token, c))
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
            && dest_chain.map_or(true, |c| self.supported_on(token, c))
            && source_token.map_or(true, |s| s.cctp))
    }

    async fn compute_receive_amount(
        &self,
        send_amount: Option<f64>,
        options: &RouteOptions,
    ) -> Result<f64, RouteError> {
        let opts = options.relay();
        Ok((send_amount.unwrap_or(0.0) - opts.relayer_fee - opts.to_native_token).max(0.0))
    }

    async fn compute_send_amount(
        &self,
        receive_amount: Option<f64>,
        options: &RouteOptions,
    ) -> Result<f64, RouteError> {
        let opts = options.relay();
        Ok(receive_amount.unwrap_or(0.0) + opts.relayer_fee + opts.to_native_token)
    }

    async fn validate(&self, request: &TransferRequest) -> Result<bool, RouteError> {
        let mut result = validate_transfer(&self.ctx, self.route(), request);
        for chain in [request.source_chain, request.dest_chain] {
            result.check(self.integration(chain).is_some(), || {
                format!("no wormhole CCTP integration on {chain}")
            });
        }
        match request_token_config(&self.ctx, request) {
            Some(token) if token.cctp => match self.source_fee(request.source_chain, &token.key) {
                Some(fee) => {
                    let native = to_base_units(request.options.relay().to_native_token, token.decimals);
                    result.check(request.amount > fee.saturating_add(native), || {
                        format!("amount does not cover relayer fee {fee} and gas swap {native}")
                    });
                }
                None => result.add_error(format!("no relayer fee for {}", token.key)),
            },
            _ => result.add_error("token is not native USDC".into()),
        }
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
        info!(signature = %signature, amount = request.amount, "relayed burn sent");
        Ok(signature)
    }

    async fn redeem(
        &self,
        _dest_chain: ChainId,
        _info: &MessageInfo,
        _payer: &str,
    ) -> Result<String, RouteError> {
        Err(RouteError::unsupported(self.route(), "redeem"))
    }

    async fn parse_message(&self, info: &MessageInfo) -> Result<ParsedMessage, RouteError> {
        let (message, deposit) = self.deposit(info)?;
        let dest_chain = domain_chain(&self.ctx, deposit.target_domain)?;
        let relay = RelayInstructions::parse(&deposit.payload).ok();
        let dest_platform = platform_of(&self.ctx, dest_chain);
        let token = TokenId {
            chain: message.emitter_chain,
            address: platform_of(&self.ctx, message.emitter_chain).format_address(&deposit.token),
        };
        let decimals = self
            .ctx
            .token_by_id(&token)
            .map(|t| t.decimals)
            .unwrap_or(USDC_DECIMALS);
        Ok(ParsedMessage {
            route: self.route(),
            tx_id: info.tx_id().to_string(),
            source_chain: message.emitter_chain,
            dest_chain,
            sender: Some(platform_of(&self.ctx, message.emitter_chain).format_address(&deposit.from_address)),
            recipient: dest_platform.format_address(
                relay.as_ref().map(|r| &r.recipient).unwrap_or(&deposit.mint_recipient),
            ),
            token,
            amount: deposit.amount,
            decimals,
            sequence: Some(message.sequence),
            emitter: Some(message.emitter_evm_address()),
            relayer_fee: relay.as_ref().map(|r| r.relayer_fee),
            to_native_token: relay.as_ref().map(|r| r.to_native_token_amount),
            payload_kind: None,
        })
    }

    async fn get_preview(&self, params: &PreviewParams) -> Result<TransferDisplayData, RouteError> {
        let receive = self
            .compute_receive_amount(Some(params.amount), &params.options)
            .await?;
        let opts = params.options.relay();
        let mut fees = vec![DisplayRow::new(
            "Relayer fee",
            format!("{} {}", opts.relayer_fee, params.token.symbol),
        )];
        if opts.to_native_token > 0.0 {
            fees.push(DisplayRow::new(
                "Native gas swap",
                format!("{} {}", opts.to_native_token, params.token.symbol),
            ));
        }
        Ok(preview_rows(params, receive, fees))
    }

    async fn get_relayer_fee(
        &self,
        source_chain: ChainId,
        dest_chain: ChainId,
        token_key: &str,
    ) -> Result<u128, RouteError> {
        if self.integration(dest_chain).is_none() {
            return Err(RouteError::unsupported(self.route(), "get_relayer_fee"));
        }
        self.source_fee(source_chain, token_key).ok_or_else(|| {
            RouteError::InvalidRequest(format!("no relayer fee for {token_key} on {source_chain}"))
        })
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
        let (_, deposit) = self.deposit(info)?;
        let transmitter = cctp_contracts(&self.ctx, dest_chain)?.message_transmitter.clone();
        let key = cctp_nonce_key(deposit.source_domain, deposit.nonce);
        Ok(self.ctx.rpc(dest_chain)?.is_nonce_used(&transmitter, &key).await?)
    }

    async fn native_token_amount(
        &self,
        dest_chain: ChainId,
        _token: &TokenId,
        amount: u128,
        _wallet: &str,
    ) -> Result<u128, RouteError> {
        let relayer = self
            .integration(dest_chain)
            .ok_or(RouteError::unsupported(self.route(), "native_token_amount"))?;
        let usdc = usdc_on(&self.ctx, dest_chain)
            .ok_or_else(|| RouteError::InvalidRequest(format!("no USDC configured on {dest_chain}")))?;
        Ok(self
            .ctx
            .rpc(dest_chain)?
            .native_swap_quote(&relayer, usdc, amount)
            .await?)
    }

    async fn max_swap_amount(
        &self,
        dest_chain: ChainId,
        _token: &TokenId,
        _wallet: &str,
    ) -> Result<u128, RouteError> {
        let relayer = self
            .integration(dest_chain)
            .ok_or(RouteError::unsupported(self.route(), "max_swap_amount"))?;
        let usdc = usdc_on(&self.ctx, dest_chain)
            .ok_or_else(|| RouteError::InvalidRequest(format!("no USDC configured on {dest_chain}")))?;
        Ok(self.ctx.rpc(dest_chain)?.max_native_swap(&relayer, usdc).await?)
    }
}
