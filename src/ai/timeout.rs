//! Provider Call Timeouts
//!
//! Every provider call in a generation run is wrapped in [`with_timeout`],
//! independently of the HTTP client's own deadline, so a stalled client
//! implementation still ends in `ForgeError::Timeout`.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::with_timeout;
//!
//! let completion = with_timeout(
//!     Duration::from_secs(180),
//!     client.complete(&request),
//!     "initial generation",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::{ForgeError, Result};

/// Execute an async operation with a timeout
///
/// Returns `ForgeError::Timeout` if the operation doesn't complete within the
/// specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ForgeError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, ForgeError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_passes_inner_error() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Err::<u32, _>(ForgeError::api(500, "boom")) },
            "test operation",
        )
        .await;
        assert!(matches!(result, Err(ForgeError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, ForgeError>(42)
            },
            "slow operation",
        )
        .await;
        match result {
            Err(ForgeError::Timeout { operation, .. }) => assert_eq!(operation, "slow operation"),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
