//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use menu_authz::{
    Authority, AuthorityFilter, AuthorityId, AuthorityStore, AuthzConfig, AuthzError, AuthzService,
    InMemoryAuthorityStore, RoleAuthority, RoleId, UserId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Store wrapper that fails every call while `failing` is set
pub struct FlakyStore {
    pub inner: InMemoryAuthorityStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: InMemoryAuthorityStore) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> menu_authz::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(AuthzError::DatabaseError("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthorityStore for FlakyStore {
    async fn fetch_all_authorities(&self) -> menu_authz::Result<Vec<Authority>> {
        self.check()?;
        self.inner.fetch_all_authorities().await
    }

    async fn fetch_all_role_authorities(&self) -> menu_authz::Result<Vec<RoleAuthority>> {
        self.check()?;
        self.inner.fetch_all_role_authorities().await
    }

    async fn fetch_user_role_ids(&self, user_id: UserId) -> menu_authz::Result<Vec<RoleId>> {
        self.check()?;
        self.inner.fetch_user_role_ids(user_id).await
    }

    async fn create(&self, authority: Authority) -> menu_authz::Result<Authority> {
        self.check()?;
        self.inner.create(authority).await
    }

    async fn update_full(&self, authority: &Authority) -> menu_authz::Result<()> {
        self.check()?;
        self.inner.update_full(authority).await
    }

    async fn delete(&self, id: AuthorityId) -> menu_authz::Result<()> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn find(&self, id: AuthorityId) -> menu_authz::Result<Option<Authority>> {
        self.check()?;
        self.inner.find(id).await
    }

    async fn find_page(
        &self,
        filter: &AuthorityFilter,
        offset: u64,
        limit: u64,
    ) -> menu_authz::Result<(Vec<Authority>, u64)> {
        self.check()?;
        self.inner.find_page(filter, offset, limit).await
    }
}

/// Admin (1, "/admin") with Users (2, "/admin/users") under it; role 10
/// holds both, user 5 holds role 10
pub async fn admin_scenario_store() -> InMemoryAuthorityStore {
    let store = InMemoryAuthorityStore::new();
    store
        .seed_authorities(vec![
            Authority::new(1, "Admin", "/admin"),
            Authority::new(2, "Users", "/admin/users").with_menu1(1),
        ])
        .await;
    store.grant_role_authority(10, 1).await;
    store.grant_role_authority(10, 2).await;
    store.assign_user_role(5, 10).await;
    store
}

/// Service over `store` with both caches loaded
pub async fn loaded_service(store: Arc<dyn AuthorityStore>) -> AuthzService {
    let service = AuthzService::new(AuthzConfig::default(), store).unwrap();
    service.init().await.unwrap();
    service
}

/// Poll `check` until it holds, failing the test after five seconds
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
