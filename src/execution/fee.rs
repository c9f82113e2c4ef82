// Fee estimator - simulates a candidate transaction and prices its priority
// This file turns simulated compute usage into a compute-unit limit and samples
// the recent priority-fee market for a compute-unit price

use crate::config::SubmissionConfig;
use crate::errors::SubmitError;
use crate::execution::clock::Clock;
use crate::execution::transaction::{Instruction, Transaction};
use crate::metrics::SIMULATION_RETRIES;
use crate::transport::ChainRpc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Log fragments that mark a failed simulation as worth repeating, with the
/// metric label recorded for each.
pub const RETRYABLE_SIMULATION_LOGS: [(&str, &str); 2] = [
    ("BlockhashNotFound", "stale_block_ref"),
    ("SlippageToleranceExceeded", "slippage"),
];

/// Compute budget derived from one simulation. Recomputed per submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityFeeBid {
    pub compute_unit_limit: u32,
    /// Micro-units of the native token per compute unit
    pub compute_unit_price: u64,
}

impl PriorityFeeBid {
    pub fn instructions(&self) -> [Instruction; 2] {
        [
            Instruction::set_compute_unit_limit(self.compute_unit_limit),
            Instruction::set_compute_unit_price(self.compute_unit_price),
        ]
    }
}

pub struct FeeEstimator {
    rpc: Arc<dyn ChainRpc>,
    clock: Arc<dyn Clock>,
    config: SubmissionConfig,
}

impl FeeEstimator {
    pub fn new(rpc: Arc<dyn ChainRpc>, clock: Arc<dyn Clock>, config: SubmissionConfig) -> Self {
        Self { rpc, clock, config }
    }

    /// Simulate `tx` and derive a bid. Fills in a block reference if the
    /// transaction has none, since the simulator rejects an empty one.
    #[tracing::instrument(skip_all, fields(payer = %tx.fee_payer))]
    pub async fn estimate(&self, tx: &mut Transaction) -> Result<PriorityFeeBid, SubmitError> {
        let max_attempts = self.config.max_simulation_attempts.max(1);
        let mut seen_logs: Vec<String> = Vec::new();
        let mut last_error = String::new();
        let mut units_used = None;

        for attempt in 1..=max_attempts {
            if tx.recent_block_ref.is_none() {
                let block = self.rpc.latest_block_ref().await?;
                tx.recent_block_ref = Some(block.blockhash);
            }

            let sim = self.rpc.simulate(tx).await?;
            let Some(error) = sim.err else {
                units_used = Some(
                    sim.units_consumed
                        .filter(|units| *units > 0)
                        .unwrap_or(self.config.default_compute_units),
                );
                debug!(attempt, units = ?sim.units_consumed, "simulation succeeded");
                break;
            };

            let Some(reason) = retryable_reason(&sim.logs) else {
                return Err(SubmitError::SimulationFailed {
                    error,
                    logs: sim.logs,
                });
            };

            SIMULATION_RETRIES.with_label_values(&[reason]).inc();
            info!(attempt, max_attempts, reason, "transient simulation failure; trying again");
            seen_logs.extend(sim.logs);
            last_error = error;
            if attempt < max_attempts {
                self.clock.sleep(self.config.simulation_retry_delay()).await;
            }
        }

        let Some(units) = units_used else {
            return Err(SubmitError::SimulationFailed {
                error: format!("gave up after {max_attempts} attempts: {last_error}"),
                logs: seen_logs,
            });
        };

        let compute_unit_limit = compute_unit_limit(units, self.config.compute_unit_margin_pct);
        let fees = self.rpc.recent_priority_fees(&tx.writable_accounts()).await?;
        let compute_unit_price = priority_fee(
            &fees,
            self.config.priority_fee_percentile,
            self.config.min_priority_fee,
            self.config.max_priority_fee,
        );

        info!(
            units_consumed = units,
            compute_unit_limit,
            compute_unit_price,
            fee_samples = fees.len(),
            "priced transaction"
        );

        Ok(PriorityFeeBid {
            compute_unit_limit,
            compute_unit_price,
        })
    }
}

fn retryable_reason(logs: &[String]) -> Option<&'static str> {
    logs.iter().find_map(|line| {
        RETRYABLE_SIMULATION_LOGS
            .iter()
            .find(|(needle, _)| line.contains(needle))
            .map(|(_, reason)| *reason)
    })
}

/// `ceil(units * margin_pct / 100)`, never under-provisioning.
pub fn compute_unit_limit(units: u64, margin_pct: u64) -> u32 {
    let scaled = (units as u128 * margin_pct as u128).div_ceil(100);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Fee at `percentile` of the recent samples, clamped to `[min, max]`.
pub fn priority_fee(samples: &[u64], percentile: f64, min: u64, max: u64) -> u64 {
    if samples.is_empty() {
        return min;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let rank = (sorted.len() as f64 * percentile.clamp(0.0, 1.0)).ceil() as usize;
    let idx = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx].clamp(min, max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_ceiling_of_margin() {
        assert_eq!(compute_unit_limit(100_000, 120), 120_000);
        assert_eq!(compute_unit_limit(1, 120), 2);
        assert_eq!(compute_unit_limit(12_345, 120), 14_814);
        assert_eq!(compute_unit_limit(u64::MAX, 120), u32::MAX);
    }

    #[test]
    fn fee_takes_percentile_and_clamps() {
        let samples: Vec<u64> = (1..=100).collect();
        assert_eq!(priority_fee(&samples, 0.95, 1, 1_000), 95);
        assert_eq!(priority_fee(&samples, 0.95, 1, 50), 50);
        assert_eq!(priority_fee(&[0, 0, 0], 0.95, 7, 1_000), 7);
        assert_eq!(priority_fee(&[], 0.95, 3, 1_000), 3);
        assert_eq!(priority_fee(&[40], 0.95, 1, 1_000), 40);
    }

    #[test]
    fn only_named_log_fragments_are_retryable() {
        let logs = vec!["Program log: Error: BlockhashNotFound".to_string()];
        assert_eq!(retryable_reason(&logs), Some("stale_block_ref"));
        let logs = vec!["custom program error: SlippageToleranceExceeded".to_string()];
        assert_eq!(retryable_reason(&logs), Some("slippage"));
        let logs = vec!["insufficient funds for rent".to_string()];
        assert_eq!(retryable_reason(&logs), None);
    }
}
