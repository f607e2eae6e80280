//! Store access under the configured retry policy

use std::future::Future;

use platform::retry::{RetryPolicy, with_retry};

use crate::error::{OpError, OpResult};

/// Run a store call, retrying transient database failures
pub(crate) async fn retry_store<T, F, Fut>(policy: RetryPolicy, op: F) -> OpResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = OpResult<T>>,
{
    with_retry(policy, OpError::is_transient, op)
        .await
        .map_err(OpError::from)
}
