// Route operator - single entry point over the route strategies
// This file holds the strategy registry, resolves route tags, forwards every
// capability call to the resolved strategy and owns route classification

use crate::config::DEFAULT_ROUTES;
use crate::context::RouteContext;
use crate::errors::RouteError;
use crate::router::classifier::RouteClassifier;
use crate::routes::{
    AggregatorRoute, BridgeRoute, CctpManualRoute, CctpRelayRoute, MessageInfo, ParsedMessage,
    PreviewParams, RelayRoute, Route, RouteOptions, RouteStrategy, TransferDisplayData,
    TransferInfoParams, TransferRequest,
};
use crate::types::{ChainId, TokenConfig, TokenId};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Operator {
    registry: HashMap<Route, Arc<dyn RouteStrategy>>,
    enabled: Vec<Route>,
    classifier: RouteClassifier,
}

impl Operator {
    /// Operator with every built-in strategy registered and the default routes enabled.
    pub fn new(ctx: Arc<RouteContext>) -> Self {
        Self::empty(ctx.clone())
            .with_strategy(Arc::new(BridgeRoute::new(ctx.clone())))
            .with_strategy(Arc::new(RelayRoute::new(ctx.clone())))
            .with_strategy(Arc::new(CctpManualRoute::new(ctx.clone())))
            .with_strategy(Arc::new(CctpRelayRoute::new(ctx.clone())))
            .with_strategy(Arc::new(AggregatorRoute::new(ctx)))
            .with_enabled_routes(DEFAULT_ROUTES.to_vec())
    }

    /// Operator with no strategies; tags resolve only once registered.
    pub fn empty(ctx: Arc<RouteContext>) -> Self {
        Self {
            registry: HashMap::new(),
            enabled: Vec::new(),
            classifier: RouteClassifier::new(ctx),
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn RouteStrategy>) -> Self {
        self.registry.insert(strategy.route(), strategy);
        self
    }

    /// Routes offered to callers, in preference order. Unregistered tags are dropped.
    pub fn with_enabled_routes(mut self, routes: Vec<Route>) -> Self {
        let mut enabled = Vec::with_capacity(routes.len());
        for route in routes {
            if !self.registry.contains_key(&route) {
                warn!(route = %route, "ignoring enabled route with no registered strategy");
                continue;
            }
            if !enabled.contains(&route) {
                enabled.push(route);
            }
        }
        info!(routes = ?enabled, "enabled routes");
        self.enabled = enabled;
        self
    }

    pub fn enabled_routes(&self) -> &[Route] {
        &self.enabled
    }

    pub fn get_route(&self, route: Route) -> Result<Arc<dyn RouteStrategy>, RouteError> {
        self.registry
            .get(&route)
            .cloned()
            .ok_or(RouteError::UnknownRoute(route))
    }

    fn route_with(
        &self,
        route: Route,
        options: &RouteOptions,
    ) -> Result<Arc<dyn RouteStrategy>, RouteError> {
        let strategy = self.get_route(route)?;
        options.check(route)?;
        Ok(strategy)
    }

    pub async fn get_route_from_tx(&self, tx_id: &str, chain: ChainId) -> Result<Route, RouteError> {
        self.classifier.classify(tx_id, chain).await
    }

    /// Enabled routes able to carry this transfer, in preference order. A route
    /// whose availability check fails is treated as unavailable.
    pub async fn available_routes(
        &self,
        source_token: &str,
        dest_token: &str,
        amount: f64,
        source_chain: ChainId,
        dest_chain: ChainId,
    ) -> Vec<Route> {
        let checks = self.enabled.iter().map(|route| async move {
            let available = match self.get_route(*route) {
                Ok(strategy) => {
                    strategy
                        .is_route_available(source_token, dest_token, amount, source_chain, dest_chain)
                        .await
                }
                Err(e) => Err(e),
            };
            (*route, available)
        });

        join_all(checks)
            .await
            .into_iter()
            .filter_map(|(route, available)| match available {
                Ok(true) => Some(route),
                Ok(false) => None,
                Err(e) => {
                    warn!(route = %route, error = %e, "availability check failed");
                    None
                }
            })
            .collect()
    }

    pub async fn is_route_available(
        &self,
        route: Route,
        source_token: &str,
        dest_token: &str,
        amount: f64,
        source_chain: ChainId,
        dest_chain: ChainId,
    ) -> Result<bool, RouteError> {
        self.get_route(route)?
            .is_route_available(source_token, dest_token, amount, source_chain, dest_chain)
            .await
    }

    pub async fn is_supported_source_token(
        &self,
        route: Route,
        token: Option<&TokenConfig>,
        dest_token: Option<&TokenConfig>,
        source_chain: Option<ChainId>,
        dest_chain: Option<ChainId>,
    ) -> Result<bool, RouteError> {
        self.get_route(route)?
            .is_supported_source_token(token, dest_token, source_chain, dest_chain)
            .await
    }

    pub async fn is_supported_dest_token(
        &self,
        route: Route,
        token: Option<&TokenConfig>,
        source_token: Option<&TokenConfig>,
        source_chain: Option<ChainId>,
        dest_chain: Option<ChainId>,
    ) -> Result<bool, RouteError> {
        self.get_route(route)?
            .is_supported_dest_token(token, source_token, source_chain, dest_chain)
            .await
    }

    pub async fn supported_source_tokens(
        &self,
        route: Route,
        tokens: &[TokenConfig],
        dest_token: Option<&TokenConfig>,
        source_chain: Option<ChainId>,
        dest_chain: Option<ChainId>,
    ) -> Result<Vec<TokenConfig>, RouteError> {
        self.get_route(route)?
            .supported_source_tokens(tokens, dest_token, source_chain, dest_chain)
            .await
    }

    pub async fn supported_dest_tokens(
        &self,
        route: Route,
        tokens: &[TokenConfig],
        source_token: Option<&TokenConfig>,
        source_chain: Option<ChainId>,
        dest_chain: Option<ChainId>,
    ) -> Result<Vec<TokenConfig>, RouteError> {
        self.get_route(route)?
            .supported_dest_tokens(tokens, source_token, source_chain, dest_chain)
            .await
    }

    pub async fn compute_receive_amount(
        &self,
        route: Route,
        send_amount: Option<f64>,
        options: &RouteOptions,
    ) -> Result<f64, RouteError> {
        self.route_with(route, options)?
            .compute_receive_amount(send_amount, options)
            .await
    }

    pub async fn compute_send_amount(
        &self,
        route: Route,
        receive_amount: Option<f64>,
        options: &RouteOptions,
    ) -> Result<f64, RouteError> {
        self.route_with(route, options)?
            .compute_send_amount(receive_amount, options)
            .await
    }

    pub async fn validate(&self, route: Route, request: &TransferRequest) -> Result<bool, RouteError> {
        self.route_with(route, &request.options)?
            .validate(request)
            .await
    }

    pub async fn estimate_send_gas(
        &self,
        route: Route,
        request: &TransferRequest,
    ) -> Result<String, RouteError> {
        self.route_with(route, &request.options)?
            .estimate_send_gas(request)
            .await
    }

    pub async fn estimate_claim_gas(
        &self,
        route: Route,
        dest_chain: ChainId,
    ) -> Result<String, RouteError> {
        self.get_route(route)?.estimate_claim_gas(dest_chain).await
    }

    pub async fn send(&self, route: Route, request: &TransferRequest) -> Result<String, RouteError> {
        self.route_with(route, &request.options)?.send(request).await
    }

    pub async fn redeem(
        &self,
        route: Route,
        dest_chain: ChainId,
        info: &MessageInfo,
        payer: &str,
    ) -> Result<String, RouteError> {
        self.get_route(route)?.redeem(dest_chain, info, payer).await
    }

    pub async fn parse_message(
        &self,
        route: Route,
        info: &MessageInfo,
    ) -> Result<ParsedMessage, RouteError> {
        self.get_route(route)?.parse_message(info).await
    }

    pub async fn get_preview(
        &self,
        route: Route,
        params: &PreviewParams,
    ) -> Result<TransferDisplayData, RouteError> {
        self.route_with(route, &params.options)?
            .get_preview(params)
            .await
    }

    pub async fn get_native_balance(
        &self,
        route: Route,
        address: &str,
        chain: ChainId,
    ) -> Result<Option<u128>, RouteError> {
        self.get_route(route)?.get_native_balance(address, chain).await
    }

    pub async fn get_token_balance(
        &self,
        route: Route,
        address: &str,
        token: &TokenId,
        chain: ChainId,
    ) -> Result<Option<u128>, RouteError> {
        self.get_route(route)?
            .get_token_balance(address, token, chain)
            .await
    }

    pub async fn get_relayer_fee(
        &self,
        route: Route,
        source_chain: ChainId,
        dest_chain: ChainId,
        token_key: &str,
    ) -> Result<u128, RouteError> {
        self.get_route(route)?
            .get_relayer_fee(source_chain, dest_chain, token_key)
            .await
    }

    pub async fn get_foreign_asset(
        &self,
        route: Route,
        token: &TokenId,
        chain: ChainId,
    ) -> Result<Option<String>, RouteError> {
        self.get_route(route)?.get_foreign_asset(token, chain).await
    }

    pub async fn is_transfer_completed(
        &self,
        route: Route,
        dest_chain: ChainId,
        info: &MessageInfo,
    ) -> Result<bool, RouteError> {
        self.get_route(route)?
            .is_transfer_completed(dest_chain, info)
            .await
    }

    pub async fn get_message_info(
        &self,
        route: Route,
        tx_id: &str,
        chain: ChainId,
        unsigned: bool,
    ) -> Result<MessageInfo, RouteError> {
        self.get_route(route)?
            .get_message_info(tx_id, chain, unsigned)
            .await
    }

    pub async fn get_transfer_source_info(
        &self,
        route: Route,
        params: &TransferInfoParams,
    ) -> Result<TransferDisplayData, RouteError> {
        self.get_route(route)?.get_transfer_source_info(params).await
    }

    pub async fn get_transfer_dest_info(
        &self,
        route: Route,
        params: &TransferInfoParams,
    ) -> Result<TransferDisplayData, RouteError> {
        self.get_route(route)?.get_transfer_dest_info(params).await
    }

    pub async fn native_token_amount(
        &self,
        route: Route,
        dest_chain: ChainId,
        token: &TokenId,
        amount: u128,
        wallet: &str,
    ) -> Result<u128, RouteError> {
        self.get_route(route)?
            .native_token_amount(dest_chain, token, amount, wallet)
            .await
    }

    pub async fn max_swap_amount(
        &self,
        route: Route,
        dest_chain: ChainId,
        token: &TokenId,
        wallet: &str,
    ) -> Result<u128, RouteError> {
        self.get_route(route)?
            .max_swap_amount(dest_chain, token, wallet)
            .await
    }
}
