//! User -> authorized authority resolution and route checks

use crate::cache::{AuthorityCache, RoleAuthorityIndex};
use crate::error::Result;
use crate::store::AuthorityStore;
use crate::types::{AuthorityId, RoleId, UserId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the authorities reachable from a user through their roles
///
/// Role assignments are read from the store on every call; role grants come
/// from the [`RoleAuthorityIndex`], authority records from the
/// [`AuthorityCache`].
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn AuthorityStore>,
    authorities: Arc<AuthorityCache>,
    role_index: Arc<RoleAuthorityIndex>,
}

impl PermissionResolver {
    pub fn new(
        store: Arc<dyn AuthorityStore>,
        authorities: Arc<AuthorityCache>,
        role_index: Arc<RoleAuthorityIndex>,
    ) -> Self {
        Self {
            store,
            authorities,
            role_index,
        }
    }

    /// Authority ids granted to any of the user's roles
    ///
    /// A store failure is returned as an error, never as an empty set. A user
    /// without roles resolves to an empty set.
    pub async fn authorized_authority_ids(&self, user_id: UserId) -> Result<HashSet<AuthorityId>> {
        let mut role_ids: Vec<RoleId> = self.store.fetch_user_role_ids(user_id).await?;
        role_ids.sort_unstable();
        role_ids.dedup();

        let ids = self.role_index.authorized_ids(&role_ids).await;
        debug!(user_id, roles = role_ids.len(), authorities = ids.len(), "Resolved authorities");
        Ok(ids)
    }

    /// Check whether the user holds an authority guarding exactly `route`
    ///
    /// Errors are surfaced; see [`has_authority`](Self::has_authority) for the
    /// collapsing variant.
    pub async fn check_authority(&self, user_id: UserId, route: &str) -> Result<bool> {
        let authorized = self.authorized_authority_ids(user_id).await?;
        if authorized.is_empty() {
            return Ok(false);
        }

        let authorities = self.authorities.read().await;
        Ok(authorities
            .iter()
            .any(|authority| authorized.contains(&authority.id) && authority.route == route))
    }

    /// Route check where a failed lookup counts as "not authorized"
    pub async fn has_authority(&self, user_id: UserId, route: &str) -> bool {
        match self.check_authority(user_id, route).await {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!(user_id, route, error = %e, "Authority lookup failed, denying");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAuthorityStore;
    use crate::types::Authority;

    async fn resolver_for(store: InMemoryAuthorityStore) -> PermissionResolver {
        let authorities = Arc::new(AuthorityCache::new());
        let role_index = Arc::new(RoleAuthorityIndex::default());
        authorities.load(&store).await.unwrap();
        role_index.load(&store).await.unwrap();
        PermissionResolver::new(Arc::new(store), authorities, role_index)
    }

    #[tokio::test]
    async fn test_union_over_roles() {
        let store = InMemoryAuthorityStore::new();
        store.grant_role_authority(10, 1).await;
        store.grant_role_authority(11, 2).await;
        store.grant_role_authority(12, 3).await;
        store.assign_user_role(5, 10).await;
        store.assign_user_role(5, 11).await;

        let resolver = resolver_for(store).await;
        let ids = resolver.authorized_authority_ids(5).await.unwrap();
        assert_eq!(ids, HashSet::from([1, 2]));
    }

    #[tokio::test]
    async fn test_user_without_roles() {
        let store = InMemoryAuthorityStore::new();
        store.seed_authorities(vec![Authority::new(1, "Admin", "/admin")]).await;
        store.grant_role_authority(10, 1).await;

        let resolver = resolver_for(store).await;
        assert!(resolver.authorized_authority_ids(42).await.unwrap().is_empty());
        assert!(!resolver.has_authority(42, "/admin").await);
    }

    #[tokio::test]
    async fn test_route_match_is_exact() {
        let store = InMemoryAuthorityStore::new();
        store.seed_authorities(vec![Authority::new(1, "Admin", "/admin")]).await;
        store.grant_role_authority(10, 1).await;
        store.assign_user_role(5, 10).await;

        let resolver = resolver_for(store).await;
        assert!(resolver.has_authority(5, "/admin").await);
        assert!(!resolver.has_authority(5, "/Admin").await);
        assert!(!resolver.has_authority(5, "/admin/").await);
        assert!(!resolver.has_authority(5, "").await);
    }

    #[tokio::test]
    async fn test_shared_route_any_authorized_match() {
        let store = InMemoryAuthorityStore::new();
        store
            .seed_authorities(vec![
                Authority::new(1, "Reports", "/reports"),
                Authority::new(2, "Reports (legacy)", "/reports"),
            ])
            .await;
        store.grant_role_authority(10, 2).await;
        store.assign_user_role(5, 10).await;

        let resolver = resolver_for(store).await;
        assert!(resolver.has_authority(5, "/reports").await);
    }
}
