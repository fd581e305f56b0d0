use dashmap::DashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::auth::issuer::TokenIssuer;
use crate::errors::AppError;
use crate::models::token::{CacheKey, Permission, ScopedToken};

/// In-memory cache of scoped database tokens, keyed by
/// (database, permission).
///
/// Entries are checked on read and evicted lazily; a background sweep
/// can be triggered with `evict_expired()`. Nothing is persisted:
/// contents are lost on restart and re-issued on demand.
///
/// Two requests racing on the same key may both reach the issuer; both
/// tokens are valid and the last store wins. Entries are never
/// partially visible.
#[derive(Clone)]
pub struct TokenCache {
    entries: Arc<DashMap<CacheKey, ScopedToken>>,
    issuer: Arc<TokenIssuer>,
}

impl TokenCache {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            issuer: Arc::new(issuer),
        }
    }

    /// Return a valid token for (database, permission), minting one if
    /// the slot is empty or stale. Nothing is stored when issuance
    /// fails, so the next call re-attempts it.
    pub async fn get_token(
        &self,
        database: &str,
        permission: Permission,
    ) -> Result<ScopedToken, AppError> {
        let key = CacheKey::new(database, permission);

        if let Some(entry) = self.entries.get(&key) {
            if Utc::now() < entry.expires_at {
                tracing::trace!(database = %database, permission = %permission, "token cache hit");
                return Ok(entry.value().clone());
            }
            // expired — drop the ref before removing
            drop(entry);
            self.entries.remove(&key);
        }

        let token = self.issuer.issue(database, permission).await?;
        self.entries.insert(key, token.clone());
        Ok(token)
    }

    /// Remove all expired entries. Call this periodically from a
    /// background task to bound memory when databases are queried once
    /// and never again. The read path rejects expired entries anyway.
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, token| token.expires_at > now);
        before - self.entries.len()
    }

    /// Current number of cached tokens (for metrics / debugging).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
