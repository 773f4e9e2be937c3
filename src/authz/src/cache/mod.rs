//! In-memory projections of the authority store
//!
//! Two independent caches, each behind its own `RwLock`:
//!
//! - [`AuthorityCache`]: the full authority list in stored order
//! - [`RoleAuthorityIndex`]: role id -> granted authority ids
//!
//! Both start empty, are filled by `load`, and publish a new immutable
//! snapshot on every successful load. The two locks are never held together,
//! so a reader may briefly see the authority list and the index at different
//! generations.

pub mod authorities;
pub mod role_index;

pub use authorities::AuthorityCache;
pub use role_index::{RoleAuthorityIndex, RoleIndexReload};
