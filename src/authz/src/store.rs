//! Authority storage

use crate::error::{AuthzError, Result};
use crate::types::{
    Authority, AuthorityFilter, AuthorityId, RoleAuthority, RoleId, UserId, UserRole,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresAuthorityStore;

/// Authority storage trait
///
/// The caches only depend on the three `fetch_*` queries; the remaining
/// methods back the administrative write path.
#[async_trait]
pub trait AuthorityStore: Send + Sync {
    /// All authorities in stored order (ascending id)
    async fn fetch_all_authorities(&self) -> Result<Vec<Authority>>;

    /// All role-authority rows
    async fn fetch_all_role_authorities(&self) -> Result<Vec<RoleAuthority>>;

    /// Role ids assigned to a user
    async fn fetch_user_role_ids(&self, user_id: UserId) -> Result<Vec<RoleId>>;

    /// Insert a new authority; the store assigns the id
    async fn create(&self, authority: Authority) -> Result<Authority>;

    /// Replace every column of an existing authority
    async fn update_full(&self, authority: &Authority) -> Result<()>;

    /// Delete an authority by id
    async fn delete(&self, id: AuthorityId) -> Result<()>;

    /// Get an authority by id
    async fn find(&self, id: AuthorityId) -> Result<Option<Authority>>;

    /// One page of authorities matching `filter`, plus the total match count
    async fn find_page(
        &self,
        filter: &AuthorityFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Authority>, u64)>;
}

/// Serialized store content, used to seed an in-memory store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub authorities: Vec<Authority>,

    #[serde(default)]
    pub role_authorities: Vec<RoleAuthority>,

    #[serde(default)]
    pub user_roles: Vec<UserRole>,
}

impl StoreSnapshot {
    /// Read a JSON snapshot from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[derive(Default)]
struct StoreState {
    authorities: BTreeMap<AuthorityId, Authority>,
    role_authorities: Vec<RoleAuthority>,
    user_roles: Vec<UserRole>,
    /// Highest id ever stored; never lowered by deletes
    last_id: AuthorityId,
}

/// In-memory authority store implementation
#[derive(Clone)]
pub struct InMemoryAuthorityStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryAuthorityStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    /// Create a store holding the snapshot content
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let authorities: BTreeMap<AuthorityId, Authority> = snapshot
            .authorities
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let state = StoreState {
            last_id: authorities.keys().next_back().copied().unwrap_or(0),
            authorities,
            role_authorities: snapshot.role_authorities,
            user_roles: snapshot.user_roles,
        };

        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Insert authorities with their given ids, replacing existing ones
    pub async fn seed_authorities(&self, authorities: impl IntoIterator<Item = Authority>) {
        let mut state = self.state.write().await;
        for authority in authorities {
            state.last_id = state.last_id.max(authority.id);
            state.authorities.insert(authority.id, authority);
        }
    }

    /// Append a role-authority row (rows are not de-duplicated)
    pub async fn grant_role_authority(&self, role_id: RoleId, authority_id: AuthorityId) {
        let mut state = self.state.write().await;
        state
            .role_authorities
            .push(RoleAuthority::new(role_id, authority_id));
    }

    /// Remove every row granting `authority_id` to `role_id`
    pub async fn revoke_role_authority(&self, role_id: RoleId, authority_id: AuthorityId) {
        let mut state = self.state.write().await;
        state
            .role_authorities
            .retain(|ra| !(ra.role_id == role_id && ra.authority_id == authority_id));
    }

    /// Assign a role to a user
    pub async fn assign_user_role(&self, user_id: UserId, role_id: RoleId) {
        let mut state = self.state.write().await;
        let assignment = UserRole::new(user_id, role_id);
        if !state.user_roles.contains(&assignment) {
            state.user_roles.push(assignment);
        }
    }
}

impl Default for InMemoryAuthorityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorityStore for InMemoryAuthorityStore {
    async fn fetch_all_authorities(&self) -> Result<Vec<Authority>> {
        let state = self.state.read().await;
        Ok(state.authorities.values().cloned().collect())
    }

    async fn fetch_all_role_authorities(&self) -> Result<Vec<RoleAuthority>> {
        let state = self.state.read().await;
        Ok(state.role_authorities.clone())
    }

    async fn fetch_user_role_ids(&self, user_id: UserId) -> Result<Vec<RoleId>> {
        let state = self.state.read().await;
        Ok(state
            .user_roles
            .iter()
            .filter(|ur| ur.user_id == user_id)
            .map(|ur| ur.role_id)
            .collect())
    }

    async fn create(&self, mut authority: Authority) -> Result<Authority> {
        let mut state = self.state.write().await;
        authority.id = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| AuthzError::Internal("authority id space exhausted".to_string()))?;
        state.last_id = authority.id;
        state.authorities.insert(authority.id, authority.clone());
        Ok(authority)
    }

    async fn update_full(&self, authority: &Authority) -> Result<()> {
        let mut state = self.state.write().await;
        match state.authorities.get_mut(&authority.id) {
            Some(existing) => {
                *existing = authority.clone();
                Ok(())
            }
            None => Err(AuthzError::NotFound(authority.id.to_string())),
        }
    }

    async fn delete(&self, id: AuthorityId) -> Result<()> {
        let mut state = self.state.write().await;
        state.authorities.remove(&id);
        Ok(())
    }

    async fn find(&self, id: AuthorityId) -> Result<Option<Authority>> {
        let state = self.state.read().await;
        Ok(state.authorities.get(&id).cloned())
    }

    async fn find_page(
        &self,
        filter: &AuthorityFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Authority>, u64)> {
        let state = self.state.read().await;
        let matching: Vec<&Authority> = state
            .authorities
            .values()
            .filter(|a| filter.matches(a))
            .collect();

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok((items, total))
    }
}
