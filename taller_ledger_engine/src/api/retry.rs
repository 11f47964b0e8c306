//! Bounded retry for transient storage conflicts.
use std::{fmt::Display, future::Future, time::Duration};

use log::*;
use rand::Rng;

/// Attempts per operation before a transient conflict is surfaced to the caller.
pub(crate) const MAX_ATTEMPTS: u32 = 4;

/// Re-runs `op` while it keeps failing with a transient conflict, with a short linear backoff
/// and jitter between attempts.
///
/// The operation must be safe to re-execute from scratch. Every backend operation here runs as a
/// single transaction, so a failed attempt leaves nothing behind.
pub(crate) async fn with_retry<T, E, F, Fut>(label: &str, is_transient: fn(&E) -> bool, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Err(e) if is_transient(&e) && attempt < MAX_ATTEMPTS => {
                let jitter = rand::thread_rng().gen_range(0..25);
                let delay = Duration::from_millis(u64::from(attempt) * 25 + jitter);
                warn!("🔄️ {label} hit a transient conflict (attempt {attempt}/{MAX_ATTEMPTS}): {e}. Retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
            other => return other,
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("busy")]
        Busy,
        #[error("broken")]
        Broken,
    }

    fn transient(e: &TestError) -> bool {
        matches!(e, TestError::Busy)
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test op", transient, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TestError::Busy)
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test op", transient, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Busy) }
        })
        .await;
        assert!(matches!(result, Err(TestError::Busy)));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn permanent_errors_fail_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test op", transient, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Broken) }
        })
        .await;
        assert!(matches!(result, Err(TestError::Broken)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
