//! Two-level menu assembly over the authority cache

use crate::cache::AuthorityCache;
use crate::error::Result;
use crate::resolver::PermissionResolver;
use crate::types::{FullMenu, MenuEntry, MenuLevel, UserId, UserMenu};
use std::sync::Arc;
use tracing::warn;

/// Builds user and administrative menus from the cached authority list
///
/// Both menus follow the cache's stored order; nothing is re-sorted.
#[derive(Clone)]
pub struct MenuBuilder {
    authorities: Arc<AuthorityCache>,
    resolver: PermissionResolver,
}

impl MenuBuilder {
    pub fn new(authorities: Arc<AuthorityCache>, resolver: PermissionResolver) -> Self {
        Self {
            authorities,
            resolver,
        }
    }

    /// Menu visible to `user_id`, with the section containing `current_route`
    ///
    /// Errors from role resolution are surfaced.
    pub async fn try_user_menu(&self, user_id: UserId, current_route: &str) -> Result<UserMenu> {
        let authorized = self.resolver.authorized_authority_ids(user_id).await?;
        let authorities = self.authorities.read().await;

        let mut menu = UserMenu::default();
        for authority in authorities.iter().filter(|a| authorized.contains(&a.id)) {
            match authority.level() {
                MenuLevel::TopLevel => {
                    menu.top_level.push(authority.clone());
                    menu.children.insert(authority.id, Vec::new());
                }
                MenuLevel::SecondLevel => {
                    menu.children
                        .entry(authority.menu1)
                        .or_default()
                        .push(authority.clone());
                }
                MenuLevel::Nested => {}
            }

            if authority.route == current_route {
                // A top-level node is its own section.
                menu.active_top_level = match authority.level() {
                    MenuLevel::TopLevel => authority.id,
                    _ => authority.menu1,
                };
            }
        }

        Ok(menu)
    }

    /// Menu visible to `user_id`; a failed lookup yields an empty menu
    pub async fn user_menu(&self, user_id: UserId, current_route: &str) -> UserMenu {
        match self.try_user_menu(user_id, current_route).await {
            Ok(menu) => menu,
            Err(e) => {
                warn!(user_id, route = current_route, error = %e, "Menu lookup failed, returning empty menu");
                UserMenu::default()
            }
        }
    }

    /// Every menu entry, unfiltered
    pub async fn full_menu(&self) -> FullMenu {
        let authorities = self.authorities.read().await;

        let mut menu = FullMenu::default();
        for authority in authorities.iter() {
            match authority.level() {
                MenuLevel::TopLevel => {
                    menu.top_level.push(authority.clone());
                    menu.children.insert(authority.id, Vec::new());
                }
                MenuLevel::SecondLevel => {
                    menu.children
                        .entry(authority.menu1)
                        .or_default()
                        .push(MenuEntry::from(authority));
                }
                MenuLevel::Nested => {}
            }
        }

        menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RoleAuthorityIndex;
    use crate::store::InMemoryAuthorityStore;
    use crate::types::Authority;

    async fn builder_for(store: InMemoryAuthorityStore) -> MenuBuilder {
        let authorities = Arc::new(AuthorityCache::new());
        let role_index = Arc::new(RoleAuthorityIndex::default());
        authorities.load(&store).await.unwrap();
        role_index.load(&store).await.unwrap();
        let resolver = PermissionResolver::new(Arc::new(store), Arc::clone(&authorities), role_index);
        MenuBuilder::new(authorities, resolver)
    }

    fn tree() -> Vec<Authority> {
        vec![
            Authority::new(1, "Admin", ""),
            Authority::new(2, "Users", "/admin/users").with_menu1(1),
            Authority::new(3, "Edit user", "/admin/users/edit").with_menu1(1).with_menu2(2),
            Authority::new(4, "Content", ""),
            Authority::new(5, "Posts", "/content/posts").with_menu1(4),
            Authority::new(6, "Roles", "/admin/roles").with_menu1(1),
        ]
    }

    #[tokio::test]
    async fn test_full_menu_structure() {
        let store = InMemoryAuthorityStore::new();
        store.seed_authorities(tree()).await;

        let menu = builder_for(store).await.full_menu().await;

        assert_eq!(menu.top_level.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(
            menu.children[&1],
            vec![
                MenuEntry { id: 2, name: "Users".to_string() },
                MenuEntry { id: 6, name: "Roles".to_string() },
            ]
        );
        assert_eq!(menu.children[&4], vec![MenuEntry { id: 5, name: "Posts".to_string() }]);
        assert_eq!(menu.children.len(), 2);
    }

    #[tokio::test]
    async fn test_nested_route_marks_section() {
        let store = InMemoryAuthorityStore::new();
        store.seed_authorities(tree()).await;
        for id in 1..=6 {
            store.grant_role_authority(10, id).await;
        }
        store.assign_user_role(5, 10).await;

        let builder = builder_for(store).await;

        let menu = builder.user_menu(5, "/admin/users/edit").await;
        assert_eq!(menu.active_top_level, 1);
        assert!(menu.children[&1].iter().all(|a| a.id != 3));

        let menu = builder.user_menu(5, "/content/posts").await;
        assert_eq!(menu.active_top_level, 4);

        let menu = builder.user_menu(5, "/nowhere").await;
        assert_eq!(menu.active_top_level, 0);
    }

    #[tokio::test]
    async fn test_orphan_second_level_gets_bucket() {
        let store = InMemoryAuthorityStore::new();
        store.seed_authorities(tree()).await;
        store.grant_role_authority(10, 5).await;
        store.assign_user_role(5, 10).await;

        let menu = builder_for(store).await.user_menu(5, "").await;

        assert!(menu.top_level.is_empty());
        assert_eq!(menu.children[&4].iter().map(|a| a.id).collect::<Vec<_>>(), vec![5]);
    }

    #[tokio::test]
    async fn test_menu_before_load_is_empty() {
        let store: Arc<dyn crate::store::AuthorityStore> = Arc::new(InMemoryAuthorityStore::new());
        let authorities = Arc::new(AuthorityCache::new());
        let resolver = PermissionResolver::new(
            store,
            Arc::clone(&authorities),
            Arc::new(RoleAuthorityIndex::default()),
        );
        let builder = MenuBuilder::new(authorities, resolver);

        assert_eq!(builder.full_menu().await, FullMenu::default());
        assert_eq!(builder.user_menu(5, "/admin").await, UserMenu::default());
    }
}
