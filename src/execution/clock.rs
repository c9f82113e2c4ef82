// Injectable clock for the submission loops

use async_trait::async_trait;
use std::time::Duration;

/// Source of timer ticks. The submitter races confirmations against
/// `sleep`, so tests can drive timeouts without wall-clock waits.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
