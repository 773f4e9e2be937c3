//! Authority list cache

use crate::error::Result;
use crate::store::AuthorityStore;
use crate::types::Authority;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

#[derive(Default)]
struct Snapshot {
    authorities: Arc<Vec<Authority>>,
    generation: u64,
}

/// Cache of every authority, refreshed wholesale from the store
///
/// Readers get an `Arc` to an immutable snapshot; a reload builds the new
/// list off-lock and only takes the write lock to swap the pointer.
#[derive(Default)]
pub struct AuthorityCache {
    snapshot: RwLock<Snapshot>,
}

impl AuthorityCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached list with the store's current content
    ///
    /// On store failure the previous snapshot is kept and the error returned.
    pub async fn load(&self, store: &dyn AuthorityStore) -> Result<()> {
        let authorities = match store.fetch_all_authorities().await {
            Ok(authorities) => authorities,
            Err(e) => {
                error!(error = %e, "Failed to load authorities");
                return Err(e);
            }
        };

        let count = authorities.len();
        let fresh = Arc::new(authorities);

        let generation = {
            let mut snapshot = self.snapshot.write().await;
            snapshot.authorities = fresh;
            snapshot.generation += 1;
            snapshot.generation
        };

        info!(authorities = count, generation, "Loaded authorities");
        Ok(())
    }

    /// Current snapshot in stored order (empty before the first load)
    pub async fn read(&self) -> Arc<Vec<Authority>> {
        Arc::clone(&self.snapshot.read().await.authorities)
    }

    /// Number of successful loads so far
    pub async fn generation(&self) -> u64 {
        self.snapshot.read().await.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAuthorityStore;

    #[tokio::test]
    async fn test_empty_before_load() {
        let cache = AuthorityCache::new();
        assert!(cache.read().await.is_empty());
        assert_eq!(cache.generation().await, 0);
    }

    #[tokio::test]
    async fn test_load_publishes_store_order() {
        let store = InMemoryAuthorityStore::new();
        store
            .seed_authorities(vec![
                Authority::new(2, "Users", "/admin/users").with_menu1(1),
                Authority::new(1, "Admin", "/admin"),
            ])
            .await;

        let cache = AuthorityCache::new();
        cache.load(&store).await.unwrap();

        let snapshot = cache.read().await;
        assert_eq!(snapshot.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(cache.generation().await, 1);
    }

    #[tokio::test]
    async fn test_held_snapshot_survives_reload() {
        let store = InMemoryAuthorityStore::new();
        store.seed_authorities(vec![Authority::new(1, "Admin", "/admin")]).await;

        let cache = AuthorityCache::new();
        cache.load(&store).await.unwrap();
        let before = cache.read().await;

        store.seed_authorities(vec![Authority::new(2, "Posts", "/posts")]).await;
        cache.load(&store).await.unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(cache.read().await.len(), 2);
    }
}
