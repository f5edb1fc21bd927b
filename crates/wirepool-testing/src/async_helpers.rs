//! Async testing utilities.
//!
//! Timeout wrappers so a pool that hangs fails the test instead of the CI job.

use std::future::Future;
use std::time::Duration;

/// Default timeout for async operations in tests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async function with a timeout.
///
/// # Panics
///
/// Panics if the future does not complete within the timeout.
///
/// # Example
///
/// ```rust,ignore
/// use wirepool_testing::async_helpers::with_timeout;
/// use std::time::Duration;
///
/// #[tokio::test]
/// async fn test_with_timeout() {
///     let result = with_timeout(Duration::from_secs(1), async {
///         "hello"
///     }).await;
///     assert_eq!(result, "hello");
/// }
/// ```
pub async fn with_timeout<T, F>(timeout: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(timeout, future)
        .await
        .expect("Test timed out")
}

/// Run an async function with the default timeout.
///
/// Uses [`DEFAULT_TIMEOUT`] (5 seconds) as the timeout.
pub async fn with_default_timeout<T, F>(future: F) -> T
where
    F: Future<Output = T>,
{
    with_timeout(DEFAULT_TIMEOUT, future).await
}

/// Assert that an async operation completes within a timeout.
///
/// # Panics
///
/// Panics if the future does not complete within the timeout.
pub async fn assert_completes_within<T, F>(timeout: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(timeout, future)
        .await
        .expect("Operation did not complete within timeout")
}

/// Assert that an async operation times out.
///
/// # Panics
///
/// Panics if the future completes before the timeout.
pub async fn assert_times_out<T, F>(timeout: Duration, future: F)
where
    F: Future<Output = T>,
{
    let result = tokio::time::timeout(timeout, future).await;
    assert!(
        result.is_err(),
        "Expected operation to timeout, but it completed"
    );
}

/// Wait for an async condition to become true.
///
/// # Panics
///
/// Panics if the condition is not met within the timeout.
pub async fn wait_for_async<F, Fut>(timeout: Duration, interval: Duration, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    loop {
        if condition().await {
            return;
        }
        assert!(
            start.elapsed() <= timeout,
            "Condition not met within timeout"
        );
        tokio::time::sleep(interval).await;
    }
}
