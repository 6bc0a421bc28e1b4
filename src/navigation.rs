use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{auth::Session, models::Role};

/// NavItem
///
/// One entry of the side navigation. `public` items are shown to everyone;
/// otherwise `roles` narrows visibility among authenticated users, and an
/// unset `roles` means any authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavItem {
    pub label: String,
    pub target: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
}

impl NavItem {
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
            public: false,
            roles: None,
        }
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn for_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = Some(roles.into_iter().collect());
        self
    }

    fn is_visible(&self, is_authenticated: bool, role: Option<Role>) -> bool {
        if self.public {
            return true;
        }
        if !is_authenticated {
            return false;
        }
        match (&self.roles, role) {
            (None, _) => true,
            (Some(roles), Some(role)) => roles.contains(&role),
            (Some(_), None) => false,
        }
    }
}

/// visible_items
///
/// Filters `items` down to what a visitor may see, preserving order. The
/// input slice is left untouched.
pub fn visible_items(items: &[NavItem], is_authenticated: bool, role: Option<Role>) -> Vec<NavItem> {
    items
        .iter()
        .filter(|item| item.is_visible(is_authenticated, role))
        .cloned()
        .collect()
}

/// Primary navigation: content sections plus the admin panel.
pub fn main_nav_items() -> Vec<NavItem> {
    vec![
        NavItem::new("Home", "/").public(),
        NavItem::new("Courses", "/courses").public(),
        NavItem::new("Series", "/series").public(),
        NavItem::new("Browse", "/browse").public(),
        NavItem::new("Admin Panel", "/admin").for_roles([Role::Admin]),
    ]
}

/// Account navigation, only rendered for signed-in users.
pub fn secondary_nav_items() -> Vec<NavItem> {
    vec![
        NavItem::new("Profile", "/profile"),
        NavItem::new("Settings", "/settings"),
    ]
}

/// NavigationMenu
///
/// The side drawer contents for one session. A section that filters down to
/// nothing is omitted instead of rendered empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationMenu {
    pub main: Option<Vec<NavItem>>,
    pub secondary: Option<Vec<NavItem>>,
}

impl NavigationMenu {
    pub fn for_session(session: &Session) -> Self {
        Self::build(&main_nav_items(), &secondary_nav_items(), session)
    }

    pub fn build(main: &[NavItem], secondary: &[NavItem], session: &Session) -> Self {
        let role = Some(session.role);
        let section = |items: &[NavItem]| {
            let visible = visible_items(items, session.is_authenticated, role);
            (!visible.is_empty()).then_some(visible)
        };

        Self {
            main: section(main),
            secondary: if session.is_authenticated {
                section(secondary)
            } else {
                None
            },
        }
    }
}
