// Execution module - pricing, signing and durable submission of transactions
// This file wires the transaction model, the injectable clock, the fee
// estimator and the confirm/resend submitter

pub mod clock;
pub mod fee;
pub mod submitter;
pub mod transaction;

pub use clock::{Clock, TokioClock};
pub use fee::{FeeEstimator, PriorityFeeBid};
pub use submitter::{SubmissionAttempt, SubmissionState, TransactionSubmitter};
pub use transaction::{AccountMeta, Instruction, SignedTransaction, Transaction};
