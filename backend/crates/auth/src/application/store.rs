//! Store access under the configured retry policy

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};

use platform::retry::{RetryPolicy, with_retry};

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

/// Run a store call, retrying transient database failures
///
/// Exhaustion surfaces as `AuthError::ServiceUnavailable`; any other error is
/// returned unchanged on first occurrence.
pub(crate) async fn retry_store<T, F, Fut>(policy: RetryPolicy, op: F) -> AuthResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AuthResult<T>>,
{
    with_retry(policy, AuthError::is_transient, op)
        .await
        .map_err(AuthError::from)
}

/// Insert a new user under the retry policy
///
/// A duplicate email seen on a retried attempt may be this call's own insert
/// whose reply was lost. It counts as success when the stored row carries
/// the new user's id.
pub(crate) async fn create_user<U>(policy: RetryPolicy, repo: &U, user: &User) -> AuthResult<()>
where
    U: UserRepository,
{
    let attempts = AtomicU32::new(0);
    let attempts = &attempts;
    retry_store(policy, move || async move {
        let retried = attempts.fetch_add(1, Ordering::SeqCst) > 0;
        match repo.create(user).await {
            Err(AuthError::EmailTaken) if retried => match repo.find_by_email(&user.email).await? {
                Some(stored) if stored.user_id == user.user_id => Ok(()),
                _ => Err(AuthError::EmailTaken),
            },
            other => other,
        }
    })
    .await
}
