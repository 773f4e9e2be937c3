//! # Menu Authorization Cache
//!
//! In-process, read-optimized authorization cache for web applications.
//! Answers "which menu entries can this user see" and "may this user access
//! this route" from two in-memory projections of the authority store.
//!
//! ## Features
//!
//! - **Authority cache**: full authority list, replaced wholesale on reload
//! - **Role index**: role id -> granted authority ids
//! - **Route checks** by exact route match over the user's authorized set
//! - **Two-level menus** for users and administrative screens
//! - **Non-blocking reload signal** with a background reload worker
//! - **PostgreSQL store** behind the `postgres` feature
//!
//! ## Example
//!
//! ```rust
//! use menu_authz::{AuthzConfig, AuthzService, Authority, InMemoryAuthorityStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryAuthorityStore::new();
//!     store.seed_authorities(vec![
//!         Authority::new(1, "Admin", "/admin"),
//!         Authority::new(2, "Users", "/admin/users").with_menu1(1),
//!     ]).await;
//!     store.grant_role_authority(10, 1).await;
//!     store.grant_role_authority(10, 2).await;
//!     store.assign_user_role(5, 10).await;
//!
//!     let service = AuthzService::new(AuthzConfig::default(), Arc::new(store))?;
//!     service.init().await?;
//!
//!     if service.has_authority(5, "/admin/users").await {
//!         println!("Access granted!");
//!     }
//!
//!     let menu = service.get_user_menu(5, "/admin").await;
//!     assert_eq!(menu.active_top_level, 1);
//!
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod menu;
pub mod reload;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use types::{
    Authority, AuthorityDraft, AuthorityFilter, AuthorityId, AuthorityPage, FullMenu, MenuEntry,
    MenuLevel, RoleAuthority, RoleId, UserId, UserMenu, UserRole,
};
pub use admin::AuthorityAdmin;
pub use cache::{AuthorityCache, RoleAuthorityIndex, RoleIndexReload};
pub use config::AuthzConfig;
pub use engine::AuthzService;
pub use error::{AuthzError, Result};
pub use menu::MenuBuilder;
pub use reload::{ReloadReceiver, ReloadSignal, ReloadTarget, ReloadWorker};
pub use resolver::PermissionResolver;
pub use store::{AuthorityStore, InMemoryAuthorityStore, StoreSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
