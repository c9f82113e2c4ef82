// Swap aggregator route
// Registered so the tag resolves, but never offered: availability is always
// false and every operation reports Unsupported

use crate::context::RouteContext;
use crate::errors::RouteError;
use crate::routes::{
    MessageInfo, ParsedMessage, PreviewParams, Route, RouteOptions, RouteStrategy,
    TransferDisplayData, TransferInfoParams, TransferRequest,
};
use crate::types::{ChainId, TokenConfig, TokenId};
use async_trait::async_trait;
use std::sync::Arc;

pub struct AggregatorRoute {
    ctx: Arc<RouteContext>,
}

impl AggregatorRoute {
    pub fn new(ctx: Arc<RouteContext>) -> Self {
        Self { ctx }
    }

    fn unsupported<T>(&self, operation: &'static str) -> Result<T, RouteError> {
        Err(RouteError::unsupported(Route::Aggregator, operation))
    }
}

#[async_trait]
impl RouteStrategy for AggregatorRoute {
    fn route(&self) -> Route {
        Route::Aggregator
    }

    fn context(&self) -> &RouteContext {
        &self.ctx
    }

    async fn is_route_available(
        &self,
        _source_token: &str,
        _dest_token: &str,
        _amount: f64,
        _source_chain: ChainId,
        _dest_chain: ChainId,
    ) -> Result<bool, RouteError> {
        Ok(false)
    }

    async fn is_supported_source_token(
        &self,
        _token: Option<&TokenConfig>,
        _dest_token: Option<&TokenConfig>,
        _source_chain: Option<ChainId>,
        _dest_chain: Option<ChainId>,
    ) -> Result<bool, RouteError> {
        Ok(false)
    }

    async fn is_supported_dest_token(
        &self,
        _token: Option<&TokenConfig>,
        _source_token: Option<&TokenConfig>,
        _source_chain: Option<ChainId>,
        _dest_chain: Option<ChainId>,
    ) -> Result<bool, RouteError> {
        Ok(false)
    }

    async fn compute_receive_amount(
        &self,
        _send_amount: Option<f64>,
        _options: &RouteOptions,
    ) -> Result<f64, RouteError> {
        self.unsupported("compute_receive_amount")
    }

    async fn compute_send_amount(
        &self,
        _receive_amount: Option<f64>,
        _options: &RouteOptions,
    ) -> Result<f64, RouteError> {
        self.unsupported("compute_send_amount")
    }

    async fn validate(&self, _request: &TransferRequest) -> Result<bool, RouteError> {
        self.unsupported("validate")
    }

    async fn estimate_send_gas(&self, _request: &TransferRequest) -> Result<String, RouteError> {
        self.unsupported("estimate_send_gas")
    }

    async fn estimate_claim_gas(&self, _dest_chain: ChainId) -> Result<String, RouteError> {
        self.unsupported("estimate_claim_gas")
    }

    async fn send(&self, _request: &TransferRequest) -> Result<String, RouteError> {
        self.unsupported("send")
    }

    async fn redeem(
        &self,
        _dest_chain: ChainId,
        _info: &MessageInfo,
        _payer: &str,
    ) -> Result<String, RouteError> {
        self.unsupported("redeem")
    }

    async fn parse_message(&self, _info: &MessageInfo) -> Result<ParsedMessage, RouteError> {
        self.unsupported("parse_message")
    }

    async fn get_preview(&self, _params: &PreviewParams) -> Result<TransferDisplayData, RouteError> {
        self.unsupported("get_preview")
    }

    async fn get_native_balance(
        &self,
        _address: &str,
        _chain: ChainId,
    ) -> Result<Option<u128>, RouteError> {
        self.unsupported("get_native_balance")
    }

    async fn get_token_balance(
        &self,
        _address: &str,
        _token: &TokenId,
        _chain: ChainId,
    ) -> Result<Option<u128>, RouteError> {
        self.unsupported("get_token_balance")
    }

    async fn get_relayer_fee(
        &self,
        _source_chain: ChainId,
        _dest_chain: ChainId,
        _token_key: &str,
    ) -> Result<u128, RouteError> {
        self.unsupported("get_relayer_fee")
    }

    async fn get_foreign_asset(
        &self,
        _token: &TokenId,
        _chain: ChainId,
    ) -> Result<Option<String>, RouteError> {
        self.unsupported("get_foreign_asset")
    }

    async fn is_transfer_completed(
        &self,
        _dest_chain: ChainId,
        _info: &MessageInfo,
    ) -> Result<bool, RouteError> {
        self.unsupported("is_transfer_completed")
    }

    async fn get_message_info(
        &self,
        _tx_id: &str,
        _chain: ChainId,
        _unsigned: bool,
    ) -> Result<MessageInfo, RouteError> {
        self.unsupported("get_message_info")
    }

    async fn get_transfer_source_info(
        &self,
        _params: &TransferInfoParams,
    ) -> Result<TransferDisplayData, RouteError> {
        self.unsupported("get_transfer_source_info")
    }

    async fn get_transfer_dest_info(
        &self,
        _params: &TransferInfoParams,
    ) -> Result<TransferDisplayData, RouteError> {
        self.unsupported("get_transfer_dest_info")
    }
}
