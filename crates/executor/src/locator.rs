use crate::driver::{Locator, LocatorStrategy};
use crate::error::DriverError;
use std::future::Future;
use tracing::debug;

/// Try `action` with each strategy of the cascade in turn.
///
/// `NotFound` moves on to the next strategy; any other driver error aborts
/// immediately. When every strategy misses, the last `NotFound` is returned.
pub async fn cascade<F, Fut>(target: &str, mut action: F) -> Result<Locator, DriverError>
where
    F: FnMut(Locator) -> Fut,
    Fut: Future<Output = Result<(), DriverError>>,
{
    let target = target.trim();
    let value = target.strip_prefix('#').unwrap_or(target);

    for strategy in LocatorStrategy::CASCADE {
        let locator = Locator::new(strategy, value);
        match action(locator.clone()).await {
            Ok(()) => {
                debug!("Resolved '{}' via {}", target, locator);
                return Ok(locator);
            }
            Err(DriverError::NotFound(_)) => {
                debug!("Locator {} found nothing", locator);
            }
            Err(other) => return Err(other),
        }
    }

    Err(DriverError::NotFound(target.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_cascade_order_and_first_hit() {
        let tried = Mutex::new(Vec::new());
        let found = cascade("Email", |locator| {
            tried.lock().push(locator.strategy);
            let hit = locator.strategy == LocatorStrategy::Label;
            async move {
                if hit {
                    Ok(())
                } else {
                    Err(DriverError::NotFound(locator.value))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(found.strategy, LocatorStrategy::Label);
        assert_eq!(
            *tried.lock(),
            vec![LocatorStrategy::Id, LocatorStrategy::Name, LocatorStrategy::Label]
        );
    }

    #[tokio::test]
    async fn test_cascade_exhausted() {
        let err = cascade("missing", |l| async move { Err(DriverError::NotFound(l.value)) })
            .await
            .unwrap_err();
        assert_eq!(err, DriverError::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_other_errors_abort() {
        let calls = Mutex::new(0);
        let err = cascade("x", |_| {
            *calls.lock() += 1;
            async { Err(DriverError::Failed("detached".into())) }
        })
        .await
        .unwrap_err();
        assert_eq!(err, DriverError::Failed("detached".into()));
        assert_eq!(*calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_hash_prefix_stripped() {
        let found = cascade("#submit", |_| async { Ok(()) }).await.unwrap();
        assert_eq!(found.value, "submit");
    }
}
