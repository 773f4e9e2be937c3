//! Core authority types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique authority identifier
pub type AuthorityId = i64;

/// Unique role identifier
pub type RoleId = i64;

/// Unique user identifier
pub type UserId = i64;

/// Position of an authority in the two-level menu tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuLevel {
    /// `menu1 == 0`: a top-level menu entry
    TopLevel,
    /// `menu1 != 0 && menu2 == 0`: a second-level entry under `menu1`
    SecondLevel,
    /// Anything deeper; guards a route but is never placed in a menu
    Nested,
}

/// A named, route-guarding permission/menu node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    /// Unique authority identifier
    pub id: AuthorityId,

    /// Display label
    pub name: String,

    /// URI this authority guards (empty for pure menu-grouping nodes)
    #[serde(default)]
    pub route: String,

    /// Owning top-level node, `0` when this node is itself top-level
    #[serde(default)]
    pub menu1: AuthorityId,

    /// Owning second-level node, `0` for top-level and second-level nodes
    #[serde(default)]
    pub menu2: AuthorityId,

    /// Creation time
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last writer (audit field)
    #[serde(default)]
    pub operator: String,
}

impl Authority {
    /// Create a new top-level authority
    pub fn new(id: AuthorityId, name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            route: route.into(),
            menu1: 0,
            menu2: 0,
            created_at: Utc::now(),
            operator: String::new(),
        }
    }

    /// Place this authority under a top-level node
    pub fn with_menu1(mut self, menu1: AuthorityId) -> Self {
        self.menu1 = menu1;
        self
    }

    /// Place this authority under a second-level node
    pub fn with_menu2(mut self, menu2: AuthorityId) -> Self {
        self.menu2 = menu2;
        self
    }

    /// Set the audit operator
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    /// Classify this node in the menu tree
    pub fn level(&self) -> MenuLevel {
        if self.menu1 == 0 {
            MenuLevel::TopLevel
        } else if self.menu2 == 0 {
            MenuLevel::SecondLevel
        } else {
            MenuLevel::Nested
        }
    }
}

/// Grant of an authority to a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAuthority {
    pub role_id: RoleId,
    pub authority_id: AuthorityId,
}

impl RoleAuthority {
    pub fn new(role_id: RoleId, authority_id: AuthorityId) -> Self {
        Self { role_id, authority_id }
    }
}

/// Assignment of a role to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
}

impl UserRole {
    pub fn new(user_id: UserId, role_id: RoleId) -> Self {
        Self { user_id, role_id }
    }
}

/// Administrative form content for creating or updating an authority
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityDraft {
    /// Existing authority to update; `None` or `Some(0)` creates a new one
    #[serde(default)]
    pub id: Option<AuthorityId>,

    pub name: String,

    #[serde(default)]
    pub route: String,

    #[serde(default)]
    pub menu1: AuthorityId,

    #[serde(default)]
    pub menu2: AuthorityId,
}

impl AuthorityDraft {
    /// Draft for a new authority
    pub fn new(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route: route.into(),
            ..Default::default()
        }
    }

    /// Id of the authority to update, if any
    pub fn existing_id(&self) -> Option<AuthorityId> {
        self.id.filter(|id| *id != 0)
    }
}

/// Equality conditions for paged authority listing (all conditions AND-ed)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu1: Option<AuthorityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu2: Option<AuthorityId>,
}

impl AuthorityFilter {
    /// Check whether an authority satisfies every condition
    pub fn matches(&self, authority: &Authority) -> bool {
        self.name.as_ref().map_or(true, |name| *name == authority.name)
            && self.route.as_ref().map_or(true, |route| *route == authority.route)
            && self.menu1.map_or(true, |menu1| menu1 == authority.menu1)
            && self.menu2.map_or(true, |menu2| menu2 == authority.menu2)
    }
}

/// One page of authorities plus the number of all matching rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorityPage {
    pub items: Vec<Authority>,
    pub total: u64,
}

/// `(id, name)` pair used in the second level of the full menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub id: AuthorityId,
    pub name: String,
}

impl From<&Authority> for MenuEntry {
    fn from(authority: &Authority) -> Self {
        Self {
            id: authority.id,
            name: authority.name.clone(),
        }
    }
}

/// Menu visible to a single user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserMenu {
    /// Authorized top-level entries in stored order
    pub top_level: Vec<Authority>,

    /// Second-level entries keyed by their top-level id
    pub children: HashMap<AuthorityId, Vec<Authority>>,

    /// Top-level section containing the current route, `0` when none matched
    pub active_top_level: AuthorityId,
}

/// Complete menu tree, unfiltered, for administrative screens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FullMenu {
    /// Every top-level entry in stored order
    pub top_level: Vec<Authority>,

    /// `(id, name)` entries keyed by their top-level id
    pub children: HashMap<AuthorityId, Vec<MenuEntry>>,
}
