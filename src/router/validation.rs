// Pre-send validation module
// Checks transfer request shape and chain configuration before a route builds
// or submits anything

use crate::context::RouteContext;
use crate::routes::{Route, TransferRequest};
use crate::transport::jsonrpc::address_word;
use tracing::warn;

/// Pre-send validation result
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn check(&mut self, ok: bool, error: impl FnOnce() -> String) {
        if !ok {
            self.add_error(error());
        }
    }

    /// Log accumulated errors and collapse to the boolean the routes return.
    pub fn finish(self, route: Route) -> bool {
        if !self.is_valid {
            warn!(route = %route, errors = %self.errors.join("; "), "transfer request rejected");
        }
        self.is_valid
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks shared by every route: options match the route, the amount is
/// positive, both chains are configured and distinct, and the addresses decode.
pub fn validate_transfer(ctx: &RouteContext, route: Route, request: &TransferRequest) -> ValidationResult {
    let mut result = ValidationResult::new();

    if let Err(err) = request.options.check(route) {
        result.add_error(err.to_string());
    }
    result.check(request.amount > 0, || "amount must be positive".into());
    result.check(request.source_chain != request.dest_chain, || {
        format!("source and destination are both {}", request.source_chain)
    });
    for chain in [request.source_chain, request.dest_chain] {
        result.check(ctx.chain(chain).is_ok(), || format!("chain {chain} is not configured"));
    }
    result.check(!request.sender.trim().is_empty(), || "sender is empty".into());
    result.check(address_word(&request.recipient).is_ok(), || {
        format!("recipient {} is not a valid address", request.recipient)
    });

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_every_failure() {
        let mut result = ValidationResult::new();
        result.check(true, || "unused".into());
        result.check(false, || "first".into());
        result.add_error("second".into());
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["first".to_string(), "second".to_string()]);
        assert!(!result.finish(Route::StandardBridge));
    }
}
