use crate::error::Interrupt;
use tokio::time::{sleep, Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Sleep for `total` unless `cancel` fires first. A token that is already
/// cancelled returns immediately, even for a zero-length wait.
pub async fn sleep_cancellable(
    total: Duration,
    cancel: &CancellationToken,
) -> Result<(), Interrupt> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        _ = sleep(total) => Ok(()),
    }
}

/// Enforces a minimum interval between actions, measured from the previous
/// action's completion. Actions are delayed, never merged or dropped.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_action: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_action: None,
        }
    }

    pub async fn wait_turn(&self, cancel: &CancellationToken) -> Result<(), Interrupt> {
        let Some(last) = self.last_action else {
            return Ok(());
        };
        let ready_at = last + self.interval;
        let now = Instant::now();
        if ready_at > now {
            sleep_cancellable(ready_at - now, cancel).await?;
        }
        Ok(())
    }

    pub fn mark_done(&mut self) {
        self.last_action = Some(Instant::now());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_action_does_not_wait() {
        let pacer = Pacer::new(Duration::from_secs(10));
        let started = Instant::now();
        pacer.wait_turn(&CancellationToken::new()).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_interval_measured_from_completion() {
        let mut pacer = Pacer::new(Duration::from_millis(150));
        pacer.mark_done();
        let started = Instant::now();
        pacer.wait_turn(&CancellationToken::new()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(140));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_wait_quickly() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = sleep_cancellable(Duration::from_secs(30), &cancel).await;
        assert_eq!(result, Err(Interrupt::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_sleep() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = sleep_cancellable(Duration::ZERO, &cancel).await;
        assert_eq!(result, Err(Interrupt::Cancelled));
    }
}
