// Route classifier
// This file infers which route produced a source transaction from its attested
// message, falling back to the source receipt when the attestation network has
// no record of one

use crate::context::RouteContext;
use crate::errors::{FetchError, RouteError};
use crate::message::{deposit_for_burn_topic, PayloadKind, SignedMessage, TokenTransferPayload};
use crate::metrics::ROUTE_CLASSIFICATIONS;
use crate::routes::{fetch_receipt, Route};
use crate::types::ChainId;
use std::sync::Arc;
use tracing::debug;

pub struct RouteClassifier {
    ctx: Arc<RouteContext>,
}

impl RouteClassifier {
    pub fn new(ctx: Arc<RouteContext>) -> Self {
        Self { ctx }
    }

    /// Route that handled `tx_id` on `chain`. First match wins:
    /// burn receipt without a message, CCTP emitter, relay-only destination,
    /// then the payload's leading byte.
    #[tracing::instrument(skip(self), fields(chain = %chain))]
    pub async fn classify(&self, tx_id: &str, chain: ChainId) -> Result<Route, RouteError> {
        let route = match self.ctx.messages().fetch(tx_id, chain).await {
            Ok(message) => self.classify_message(&message)?,
            Err(err @ FetchError::NotFound { .. }) => self.classify_receipt(tx_id, chain, err).await?,
            Err(err) => return Err(err.into()),
        };
        ROUTE_CLASSIFICATIONS
            .with_label_values(&[route.as_str()])
            .inc();
        debug!(route = %route, "classified transaction");
        Ok(route)
    }

    async fn classify_receipt(
        &self,
        tx_id: &str,
        chain: ChainId,
        not_found: FetchError,
    ) -> Result<Route, RouteError> {
        let receipt = fetch_receipt(&self.ctx, tx_id, chain).await?;
        if receipt.find_log(deposit_for_burn_topic()).is_some() {
            return Ok(Route::CctpManual);
        }
        Err(not_found.into())
    }

    fn classify_message(&self, message: &SignedMessage) -> Result<Route, RouteError> {
        if self
            .ctx
            .cctp_emitters()
            .contains(&message.emitter_evm_address())
        {
            return Ok(Route::CctpRelay);
        }

        let transfer = TokenTransferPayload::parse(&message.payload)?;
        if self.ctx.is_relay_only(transfer.to_chain) {
            return Ok(Route::AutomaticRelay);
        }

        Ok(match transfer.kind {
            PayloadKind::Automatic => Route::AutomaticRelay,
            _ => Route::StandardBridge,
        })
    }
}
