//! Fixed per-call deadlines
//!
//! Commands carry a deadline set at dispatch time. There is no mid-flight
//! cancellation: a call either completes or the deadline turns it into a
//! [`Error::Timeout`].

use std::future::Future;
use std::time::Duration;

use devdeck_core::prelude::*;

/// Default deadline for reads (status fetches)
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for writes (saves and destructive actions)
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Await `fut`, failing with [`Error::Timeout`] once `deadline` elapses.
pub async fn with_deadline<T, F>(operation: &str, deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} timed out after {:?}", operation, deadline);
            Err(Error::timeout(operation, deadline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_call_passes_result_through() {
        let result = tokio_test::block_on(with_deadline("fetch", READ_TIMEOUT, async {
            Ok::<_, Error>(7)
        }));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_failed_call_keeps_its_error() {
        let result: Result<()> = tokio_test::block_on(with_deadline("save", WRITE_TIMEOUT, async {
            Err(Error::rpc("busy"))
        }));
        assert!(matches!(result, Err(Error::Rpc { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let result: Result<()> =
            with_deadline("fetch ble_status", READ_TIMEOUT, std::future::pending()).await;

        match result {
            Err(Error::Timeout { operation, after }) => {
                assert_eq!(operation, "fetch ble_status");
                assert_eq!(after, READ_TIMEOUT);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_writes_get_longer_deadline_than_reads() {
        assert!(WRITE_TIMEOUT > READ_TIMEOUT);
    }
}
