//! Administrative write path for authorities

use crate::error::{AuthzError, Result};
use crate::reload::{ReloadSignal, ReloadTarget};
use crate::store::AuthorityStore;
use crate::types::{Authority, AuthorityDraft, AuthorityFilter, AuthorityId, AuthorityPage};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// Mutates authorities in the store and signals the caches to reload
///
/// The reload is only requested; it completes asynchronously on the
/// [`ReloadWorker`](crate::reload::ReloadWorker).
#[derive(Clone)]
pub struct AuthorityAdmin {
    store: Arc<dyn AuthorityStore>,
    signal: ReloadSignal,
}

impl AuthorityAdmin {
    pub fn new(store: Arc<dyn AuthorityStore>, signal: ReloadSignal) -> Self {
        Self { store, signal }
    }

    /// Create or fully update an authority from an admin form
    pub async fn save_authority(&self, draft: AuthorityDraft, operator: &str) -> Result<Authority> {
        Self::validate(&draft)?;

        let saved = match draft.existing_id() {
            Some(id) => {
                let existing = self
                    .store
                    .find(id)
                    .await?
                    .ok_or_else(|| AuthzError::NotFound(id.to_string()))?;

                let authority = Authority {
                    id,
                    name: draft.name,
                    route: draft.route,
                    menu1: draft.menu1,
                    menu2: draft.menu2,
                    created_at: existing.created_at,
                    operator: operator.to_string(),
                };
                self.store.update_full(&authority).await.map_err(|e| {
                    error!(id, error = %e, "Failed to update authority");
                    e
                })?;
                authority
            }
            None => {
                let authority = Authority {
                    id: 0,
                    name: draft.name,
                    route: draft.route,
                    menu1: draft.menu1,
                    menu2: draft.menu2,
                    created_at: Utc::now(),
                    operator: operator.to_string(),
                };
                self.store.create(authority).await.map_err(|e| {
                    error!(error = %e, "Failed to create authority");
                    e
                })?
            }
        };

        info!(id = saved.id, operator, "Saved authority");
        self.signal.notify(ReloadTarget::Authorities);
        Ok(saved)
    }

    /// Delete an authority
    ///
    /// The reload is requested even when the delete fails, so the cache
    /// re-syncs with whatever the store holds.
    pub async fn delete_authority(&self, id: AuthorityId) -> Result<()> {
        let result = self.store.delete(id).await;
        self.signal.notify(ReloadTarget::Authorities);

        match &result {
            Ok(()) => info!(id, "Deleted authority"),
            Err(e) => error!(id, error = %e, "Failed to delete authority"),
        }
        result
    }

    /// Get an authority straight from the store
    pub async fn find_authority(&self, id: AuthorityId) -> Result<Option<Authority>> {
        self.store.find(id).await
    }

    /// One 0-based page of authorities matching `filter`
    pub async fn find_authorities_by_page(
        &self,
        filter: &AuthorityFilter,
        page: u64,
        limit: u64,
    ) -> Result<AuthorityPage> {
        if limit == 0 {
            return Err(AuthzError::InvalidInput("page size must be positive".to_string()));
        }
        let offset = page
            .checked_mul(limit)
            .ok_or_else(|| AuthzError::InvalidInput(format!("page {} out of range", page)))?;

        let (items, total) = self.store.find_page(filter, offset, limit).await?;
        Ok(AuthorityPage { items, total })
    }

    /// Request a role-authority index reload after changing role grants
    pub fn notify_role_authorities_changed(&self) -> bool {
        self.signal.notify(ReloadTarget::RoleAuthorities)
    }

    fn validate(draft: &AuthorityDraft) -> Result<()> {
        if draft.name.trim().is_empty() {
            return Err(AuthzError::InvalidInput("authority name is required".to_string()));
        }
        if draft.menu1 < 0 || draft.menu2 < 0 {
            return Err(AuthzError::InvalidInput("menu ids must not be negative".to_string()));
        }
        if draft.menu2 != 0 && draft.menu1 == 0 {
            return Err(AuthzError::InvalidInput(
                "a node under a second-level entry needs its top-level entry".to_string(),
            ));
        }
        Ok(())
    }
}
