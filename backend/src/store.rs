use std::future::Future;
use std::time::Duration;

use tokio::time;

/// Maximum retries for transient store failures; the first call plus the
/// retries gives 4 total attempts.
pub const MAX_RETRIES: u32 = 3;

/// Classify a store error as transient (worth retrying) or not.
///
/// I/O and pool exhaustion are always transient; database-level errors are
/// matched on message since the driver surfaces backend conditions
/// (unavailable, deadline exceeded, internal, lock contention) as text.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_lowercase();
            message.contains("unavailable")
                || message.contains("deadline")
                || message.contains("internal")
                || message.contains("network")
                || message.contains("locked")
                || message.contains("busy")
        }
        other => {
            let message = other.to_string().to_lowercase();
            message.contains("network") || message.contains("unavailable")
        }
    }
}

/// Detect the store reporting a missing/unusable index for a query.
///
/// Read paths with a fallback switch to an unfiltered fetch plus in-memory
/// filtering; read paths without one surface this as a distinct condition.
pub fn is_index_missing(err: &sqlx::Error) -> bool {
    let message = match err {
        sqlx::Error::Database(db_err) => db_err.message().to_lowercase(),
        other => other.to_string().to_lowercase(),
    };
    message.contains("no such index")
        || message.contains("missing index")
        || message.contains("requires an index")
        || message.contains("no index defined")
}

/// Run a store operation, retrying transient failures up to [`MAX_RETRIES`]
/// times with linear backoff (attempt number x 1 second). Non-transient
/// errors propagate immediately.
pub async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_RETRIES && is_transient(&err) => {
                attempt += 1;
                log::warn!(
                    "Transient store error (attempt {}/{}): {}",
                    attempt,
                    MAX_RETRIES,
                    err
                );
                time::sleep(Duration::from_secs(u64::from(attempt))).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn io_error() -> sqlx::Error {
        sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "network reset",
        ))
    }

    #[test]
    fn test_is_transient_classification() {
        assert!(is_transient(&io_error()));
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
        assert!(!is_transient(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_is_index_missing() {
        let err = sqlx::Error::Protocol("no such index: idx_events_family_start".to_string());
        assert!(is_index_missing(&err));
        assert!(!is_index_missing(&sqlx::Error::RowNotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_after_three_retries() {
        let attempts = Cell::new(0u32);

        let result: Result<(), sqlx::Error> = with_retry(|| {
            attempts.set(attempts.get() + 1);
            async { Err(io_error()) }
        })
        .await;

        assert!(result.is_err());
        // Initial attempt plus MAX_RETRIES retries.
        assert_eq!(attempts.get(), MAX_RETRIES + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_mid_sequence() {
        let attempts = Cell::new(0u32);

        let result: Result<u32, sqlx::Error> = with_retry(|| {
            attempts.set(attempts.get() + 1);
            let n = attempts.get();
            async move {
                if n < 3 {
                    Err(io_error())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.get(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_error_not_retried() {
        let attempts = Cell::new(0u32);

        let result: Result<(), sqlx::Error> = with_retry(|| {
            attempts.set(attempts.get() + 1);
            async { Err(sqlx::Error::RowNotFound) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }
}
