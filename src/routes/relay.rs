// Automatic relay route
// Token bridge transfer with a relayer payload: the relayer completes delivery on
// the destination chain for a fee and can swap part of the amount into gas

use crate::context::RouteContext;
use crate::errors::RouteError;
use crate::execution::transaction::{AccountMeta, Transaction};
use crate::router::validation::validate_transfer;
use crate::routes::bridge::BridgeRoute;
use crate::routes::{
    address_bytes, amount_u64, estimate_transaction_fee, parse_token_transfer, preview_rows,
    program_call, request_token_address, request_token_config, same_asset, DisplayRow,
    MessageInfo, ParsedMessage, PreviewParams, Route, RouteOptions, RouteStrategy,
    TransferDisplayData, TransferRequest,
};
use crate::types::{from_base_units, to_base_units, ChainId, Token, TokenConfig, TokenId};
use async_trait::async_trait;
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub(crate) const TRANSFER_WITH_RELAY_IX: u8 = 3;

#[derive(Debug, Serialize)]
struct TransferWithRelay {
    nonce: u32,
    token: String,
    amount: u64,
    to_native_token: u64,
    relayer_fee: u64,
    recipient: [u8; 32],
    recipient_chain: u16,
}

pub struct RelayRoute {
    ctx: Arc<RouteContext>,
}

impl RelayRoute {
    pub fn new(ctx: Arc<RouteContext>) -> Self {
        Self { ctx }
    }

    fn relayer(&self, chain: ChainId) -> Option<String> {
        self.ctx.chain(chain).ok().and_then(|c| c.relayer.clone())
    }

    /// Relayer fee for `token_key` charged on `source_chain`, in base units.
    fn source_fee(&self, source_chain: ChainId, token_key: &str) -> Option<u128> {
        self.ctx
            .chain(source_chain)
            .ok()?
            .relayer_fee(token_key)
            .map(u128::from)
    }

    async fn local_token(&self, token: &TokenId, chain: ChainId) -> Result<TokenId, RouteError> {
        let address = self
            .get_foreign_asset(token, chain)
            .await?
            .ok_or_else(|| RouteError::InvalidRequest(format!("token is not registered on {chain}")))?;
        Ok(TokenId { chain, address })
    }

    fn transfer_tx(&self, request: &TransferRequest) -> Result<Transaction, RouteError> {
        let program = self
            .relayer(request.source_chain)
            .ok_or(RouteError::unsupported(Route::AutomaticRelay, "relayer"))?;
        let token = request_token_config(&self.ctx, request).ok_or_else(|| {
            RouteError::InvalidRequest("token is not in the token table".into())
        })?;
        let fee = self
            .source_fee(request.source_chain, &token.key)
            .ok_or_else(|| RouteError::InvalidRequest(format!("no relayer fee for {}", token.key)))?;
        let to_native = to_base_units(request.options.relay().to_native_token, token.decimals);
        let token_accounts = match &request.token {
            Token::Native => Vec::new(),
            Token::Id(id) => vec![AccountMeta::readonly(id.address.clone())],
        };
        program_call(
            &program,
            &request.sender,
            token_accounts,
            TRANSFER_WITH_RELAY_IX,
            &TransferWithRelay {
                nonce: OsRng.next_u32(),
                token: request_token_address(request),
                amount: amount_u64(request.amount)?,
                to_native_token: amount_u64(to_native)?,
                relayer_fee: amount_u64(fee)?,
                recipient: address_bytes(&request.recipient)?,
                recipient_chain: request.dest_chain.0,
            },
        )
    }
}

#[async_trait]
impl RouteStrategy for RelayRoute {
    fn route(&self) -> Route {
        Route::AutomaticRelay
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
        if !supported {
            return Ok(false);
        }
        let fee = self.source_fee(source_chain, &src.key).unwrap_or(0);
        Ok(amount > from_base_units(fee, src.decimals))
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
        if !token.relayable {
            return Ok(false);
        }
        if let Some(chain) = source_chain {
            if self.relayer(chain).is_none() || self.source_fee(chain, &token.key).is_none() {
                return Ok(false);
            }
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
        if !token.relayable || dest_chain.is_some_and(|c| self.relayer(c).is_none()) {
            return Ok(false);
        }
        Ok(source_token.map(|s| same_asset(token, s)).unwrap_or(true))
    }

    async fn compute_receive_amount(
        &self,
        send_amount: Option<f64>,
        options: &RouteOptions,
    ) -> Result<f64, RouteError> {
        let opts = options.relay();
        let receive = send_amount.unwrap_or(0.0) - opts.relayer_fee - opts.to_native_token;
        Ok(receive.max(0.0))
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
            result.check(self.relayer(chain).is_some(), || format!("no relayer on {chain}"));
        }
        match request_token_config(&self.ctx, request) {
            Some(token) => {
                result.check(token.relayable, || format!("{} is not relayable", token.key));
                match self.source_fee(request.source_chain, &token.key) {
                    Some(fee) => {
                        let native = to_base_units(request.options.relay().to_native_token, token.decimals);
                        result.check(request.amount > fee.saturating_add(native), || {
                            format!("amount does not cover relayer fee {fee} and gas swap {native}")
                        });
                    }
                    None => result.add_error(format!("no relayer fee for {}", token.key)),
                }
            }
            None => result.add_error("token is not in the token table".into()),
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
        info!(signature = %signature, amount = request.amount, "relayed transfer sent");
        Ok(signature)
    }

    /// Relayed transfers can still be completed by hand if the relayer stalls.
    async fn redeem(
        &self,
        dest_chain: ChainId,
        info: &MessageInfo,
        payer: &str,
    ) -> Result<String, RouteError> {
        BridgeRoute::complete_transfer(&self.ctx, dest_chain, info, payer).await
    }

    async fn parse_message(&self, info: &MessageInfo) -> Result<ParsedMessage, RouteError> {
        parse_token_transfer(&self.ctx, self.route(), info)
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
        if self.relayer(dest_chain).is_none() {
            return Err(RouteError::unsupported(self.route(), "get_relayer_fee"));
        }
        self.source_fee(source_chain, token_key).ok_or_else(|| {
            RouteError::InvalidRequest(format!("no relayer fee for {token_key} on {source_chain}"))
        })
    }

    async fn is_transfer_completed(
        &self,
        dest_chain: ChainId,
        info: &MessageInfo,
    ) -> Result<bool, RouteError> {
        BridgeRoute::message_consumed(&self.ctx, dest_chain, info).await
    }

    async fn native_token_amount(
        &self,
        dest_chain: ChainId,
        token: &TokenId,
        amount: u128,
        _wallet: &str,
    ) -> Result<u128, RouteError> {
        let relayer = self
            .relayer(dest_chain)
            .ok_or(RouteError::unsupported(self.route(), "native_token_amount"))?;
        let local = self.local_token(token, dest_chain).await?;
        Ok(self
            .ctx
            .rpc(dest_chain)?
            .native_swap_quote(&relayer, &local, amount)
            .await?)
    }

    async fn max_swap_amount(
        &self,
        dest_chain: ChainId,
        token: &TokenId,
        _wallet: &str,
    ) -> Result<u128, RouteError> {
        let relayer = self
            .relayer(dest_chain)
            .ok_or(RouteError::unsupported(self.route(), "max_swap_amount"))?;
        let local = self.local_token(token, dest_chain).await?;
        Ok(self
            .ctx
            .rpc(dest_chain)?
            .max_native_swap(&relayer, &local)
            .await?)
    }
}
