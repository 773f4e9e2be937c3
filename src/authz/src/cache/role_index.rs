//! Role -> authority id index

use crate::error::{AuthzError, Result};
use crate::store::AuthorityStore;
use crate::types::{AuthorityId, RoleAuthority, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

type RoleMap = HashMap<RoleId, Vec<AuthorityId>>;

/// How `RoleAuthorityIndex::load` folds store rows into the index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleIndexReload {
    /// Build a fresh, de-duplicated index and swap it in
    #[default]
    Replace,
    /// Append every row to the existing index; repeated loads keep
    /// accumulating the same ids
    Accumulate,
}

impl FromStr for RoleIndexReload {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "accumulate" => Ok(Self::Accumulate),
            other => Err(AuthzError::InvalidInput(format!(
                "unknown role index reload policy `{}` (expected `replace` or `accumulate`)",
                other
            ))),
        }
    }
}

#[derive(Default)]
struct IndexState {
    roles: Arc<RoleMap>,
    generation: u64,
}

/// Index of the authority ids granted to each role
pub struct RoleAuthorityIndex {
    state: RwLock<IndexState>,
    policy: RoleIndexReload,
}

impl RoleAuthorityIndex {
    /// Create an empty index using the given reload policy
    pub fn new(policy: RoleIndexReload) -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            policy,
        }
    }

    /// Reload policy in use
    pub fn policy(&self) -> RoleIndexReload {
        self.policy
    }

    /// Fold every role-authority row of the store into the index
    ///
    /// On store failure the index is left untouched and the error returned.
    pub async fn load(&self, store: &dyn AuthorityStore) -> Result<()> {
        let rows = match store.fetch_all_role_authorities().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "Failed to load role authorities");
                return Err(e);
            }
        };

        let row_count = rows.len();
        let (roles, generation) = match self.policy {
            RoleIndexReload::Replace => {
                let fresh = Arc::new(Self::build(&rows));
                let mut state = self.state.write().await;
                state.roles = fresh;
                state.generation += 1;
                (state.roles.len(), state.generation)
            }
            RoleIndexReload::Accumulate => {
                let mut state = self.state.write().await;
                // Copy-on-write: snapshots held by readers are not mutated.
                let roles = Arc::make_mut(&mut state.roles);
                for row in &rows {
                    roles.entry(row.role_id).or_default().push(row.authority_id);
                }
                state.generation += 1;
                (state.roles.len(), state.generation)
            }
        };

        info!(rows = row_count, roles, generation, policy = ?self.policy, "Loaded role authorities");
        Ok(())
    }

    fn build(rows: &[RoleAuthority]) -> RoleMap {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut roles = RoleMap::new();
        for row in rows {
            if seen.insert((row.role_id, row.authority_id)) {
                roles.entry(row.role_id).or_default().push(row.authority_id);
            }
        }
        roles
    }

    /// Authority ids granted to a role (empty when the role is unknown)
    pub async fn authority_ids_for_role(&self, role_id: RoleId) -> Vec<AuthorityId> {
        self.state
            .read()
            .await
            .roles
            .get(&role_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Union of the authority ids granted to any of `role_ids`
    pub async fn authorized_ids(&self, role_ids: &[RoleId]) -> HashSet<AuthorityId> {
        let roles = Arc::clone(&self.state.read().await.roles);

        role_ids
            .iter()
            .filter_map(|role_id| roles.get(role_id))
            .flatten()
            .copied()
            .collect()
    }

    /// Number of successful loads so far
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }
}

impl Default for RoleAuthorityIndex {
    fn default() -> Self {
        Self::new(RoleIndexReload::default())
    }
}
