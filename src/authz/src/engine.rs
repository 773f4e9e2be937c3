//! Authority service: wires the caches, resolver, menu builder and reload path
//!
//! # Architecture
//!
//! ```text
//! (user, route) → PermissionResolver → RoleAuthorityIndex ─┐
//!                        ↓                                 │
//!                 AuthorityStore (user roles)              ↓
//!                                              AuthorityCache → MenuBuilder / route check
//!
//! AuthorityAdmin → AuthorityStore → ReloadSignal → ReloadWorker → load()
//! ```

use crate::admin::AuthorityAdmin;
use crate::cache::{AuthorityCache, RoleAuthorityIndex};
use crate::config::AuthzConfig;
use crate::error::Result;
use crate::menu::MenuBuilder;
use crate::reload::{ReloadReceiver, ReloadSignal, ReloadWorker};
use crate::resolver::PermissionResolver;
use crate::store::AuthorityStore;
use crate::types::{AuthorityId, FullMenu, UserId, UserMenu};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Query API over the cached authorities
pub struct AuthzService {
    config: AuthzConfig,
    store: Arc<dyn AuthorityStore>,
    authorities: Arc<AuthorityCache>,
    role_index: Arc<RoleAuthorityIndex>,
    resolver: PermissionResolver,
    menus: MenuBuilder,
    signal: ReloadSignal,
    receiver: Mutex<Option<ReloadReceiver>>,
}

impl AuthzService {
    /// Create a service with empty caches
    ///
    /// Nothing is loaded until [`init`](Self::init) or one of the `load_*`
    /// methods runs.
    pub fn new(config: AuthzConfig, store: Arc<dyn AuthorityStore>) -> Result<Self> {
        config.validate()?;

        let authorities = Arc::new(AuthorityCache::new());
        let role_index = Arc::new(RoleAuthorityIndex::new(config.role_index_reload));
        let resolver = PermissionResolver::new(
            Arc::clone(&store),
            Arc::clone(&authorities),
            Arc::clone(&role_index),
        );
        let menus = MenuBuilder::new(Arc::clone(&authorities), resolver.clone());
        let (signal, receiver) = ReloadSignal::channel(config.reload_channel_capacity);

        Ok(Self {
            config,
            store,
            authorities,
            role_index,
            resolver,
            menus,
            signal,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    /// Load both caches when `load_on_start` is set
    pub async fn init(&self) -> Result<()> {
        if !self.config.load_on_start {
            info!("Skipping initial authority load");
            return Ok(());
        }

        self.load_authorities().await?;
        self.load_role_authorities().await?;
        info!("Authority service initialized");
        Ok(())
    }

    /// Reload the authority list from the store
    pub async fn load_authorities(&self) -> Result<()> {
        self.authorities.load(self.store.as_ref()).await
    }

    /// Reload the role-authority index from the store
    pub async fn load_role_authorities(&self) -> Result<()> {
        self.role_index.load(self.store.as_ref()).await
    }

    /// Menu visible to `user_id`; empty when the lookup fails
    pub async fn get_user_menu(&self, user_id: UserId, uri: &str) -> UserMenu {
        self.menus.user_menu(user_id, uri).await
    }

    /// Menu visible to `user_id`, surfacing lookup failures
    pub async fn try_get_user_menu(&self, user_id: UserId, uri: &str) -> Result<UserMenu> {
        self.menus.try_user_menu(user_id, uri).await
    }

    /// Complete menu for administrative screens
    pub async fn get_menus(&self) -> FullMenu {
        self.menus.full_menu().await
    }

    /// Whether `user_id` may access `route`; false when the lookup fails
    pub async fn has_authority(&self, user_id: UserId, route: &str) -> bool {
        self.resolver.has_authority(user_id, route).await
    }

    /// Whether `user_id` may access `route`, surfacing lookup failures
    pub async fn check_authority(&self, user_id: UserId, route: &str) -> Result<bool> {
        self.resolver.check_authority(user_id, route).await
    }

    /// Authority ids reachable from `user_id`
    pub async fn authorized_authority_ids(&self, user_id: UserId) -> Result<HashSet<AuthorityId>> {
        self.resolver.authorized_authority_ids(user_id).await
    }

    /// Write path that signals this service's caches
    pub fn admin(&self) -> AuthorityAdmin {
        AuthorityAdmin::new(Arc::clone(&self.store), self.signal.clone())
    }

    /// Handle for requesting reloads from elsewhere in the application
    pub fn reload_signal(&self) -> ReloadSignal {
        self.signal.clone()
    }

    /// Start the background reload consumer
    ///
    /// Returns `None` when the worker was already started.
    pub async fn spawn_reload_worker(&self) -> Option<JoinHandle<()>> {
        let Some(receiver) = self.receiver.lock().await.take() else {
            warn!("Reload worker already running");
            return None;
        };

        let worker = ReloadWorker::new(
            Arc::clone(&self.store),
            Arc::clone(&self.authorities),
            Arc::clone(&self.role_index),
        );
        Some(worker.spawn(receiver))
    }

    /// The authority list cache
    pub fn authorities(&self) -> &Arc<AuthorityCache> {
        &self.authorities
    }

    /// The role-authority index
    pub fn role_index(&self) -> &Arc<RoleAuthorityIndex> {
        &self.role_index
    }

    /// Active configuration
    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }
}
