//! In-process revocation registry and backend selection

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::repository::RevocationStore;
use crate::error::AuthResult;
use crate::infra::postgres::PgRevocationStore;

struct Revocation {
    expires_at: DateTime<Utc>,
    claim: Option<Uuid>,
}

/// Mutex-guarded registry for single-process deployments
#[derive(Default)]
pub struct MemoryRevocationStore {
    revoked: Mutex<HashMap<String, Revocation>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.revoked.lock().await.len()
    }
}

impl RevocationStore for MemoryRevocationStore {
    async fn try_revoke(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
        claim: Uuid,
    ) -> AuthResult<bool> {
        let mut revoked = self.revoked.lock().await;
        let entry = revoked.entry(jti.to_string()).or_insert(Revocation {
            expires_at,
            claim: Some(claim),
        });
        Ok(entry.claim == Some(claim))
    }

    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> AuthResult<()> {
        self.revoked
            .lock()
            .await
            .entry(jti.to_string())
            .or_insert(Revocation {
                expires_at,
                claim: None,
            });
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> AuthResult<bool> {
        Ok(self.revoked.lock().await.contains_key(jti))
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let mut revoked = self.revoked.lock().await;
        let before = revoked.len();
        revoked.retain(|_, entry| entry.expires_at >= now);
        Ok((before - revoked.len()) as u64)
    }
}

/// Revocation backend chosen at startup
pub enum RevocationBackend {
    Memory(MemoryRevocationStore),
    Postgres(PgRevocationStore),
}

impl RevocationStore for RevocationBackend {
    async fn try_revoke(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
        claim: Uuid,
    ) -> AuthResult<bool> {
        match self {
            RevocationBackend::Memory(store) => store.try_revoke(jti, expires_at, claim).await,
            RevocationBackend::Postgres(store) => store.try_revoke(jti, expires_at, claim).await,
        }
    }

    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> AuthResult<()> {
        match self {
            RevocationBackend::Memory(store) => store.revoke(jti, expires_at).await,
            RevocationBackend::Postgres(store) => store.revoke(jti, expires_at).await,
        }
    }

    async fn is_revoked(&self, jti: &str) -> AuthResult<bool> {
        match self {
            RevocationBackend::Memory(store) => store.is_revoked(jti).await,
            RevocationBackend::Postgres(store) => store.is_revoked(jti).await,
        }
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        match self {
            RevocationBackend::Memory(store) => store.purge_expired().await,
            RevocationBackend::Postgres(store) => store.purge_expired().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_try_revoke_is_single_shot() {
        let store = MemoryRevocationStore::new();
        let exp = Utc::now() + Duration::days(7);

        assert!(!store.is_revoked("a").await.unwrap());
        assert!(store.try_revoke("a", exp, Uuid::new_v4()).await.unwrap());
        assert!(!store.try_revoke("a", exp, Uuid::new_v4()).await.unwrap());
        assert!(store.is_revoked("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_try_revoke_repeated_by_same_claim_still_owns() {
        let store = MemoryRevocationStore::new();
        let exp = Utc::now() + Duration::days(7);
        let claim = Uuid::new_v4();

        assert!(store.try_revoke("a", exp, claim).await.unwrap());
        assert!(store.try_revoke("a", exp, claim).await.unwrap());
        assert!(!store.try_revoke("a", exp, Uuid::new_v4()).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = MemoryRevocationStore::new();
        let exp = Utc::now() + Duration::days(7);

        store.revoke("b", exp).await.unwrap();
        store.revoke("b", exp).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(!store.try_revoke("b", exp, Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_try_revoke_exactly_one_wins() {
        let store = Arc::new(MemoryRevocationStore::new());
        let exp = Utc::now() + Duration::days(7);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .try_revoke("shared", exp, Uuid::new_v4())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn test_purge_drops_only_expired() {
        let store = MemoryRevocationStore::new();
        store
            .try_revoke("old", Utc::now() - Duration::hours(1), Uuid::new_v4())
            .await
            .unwrap();
        store
            .try_revoke("live", Utc::now() + Duration::hours(1), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
        assert!(store.is_revoked("live").await.unwrap());
    }
}
