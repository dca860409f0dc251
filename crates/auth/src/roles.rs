use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Unique role name, the identity key of a role record (e.g. `ROLE_ADMIN`).
///
/// Names are opaque at this layer; only the four tier names carry meaning
/// for the privilege engine (see [`Tier`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub const SUPER_ADMIN_STR: &'static str = "ROLE_SUPER_ADMIN";
    pub const ADMIN_STR: &'static str = "ROLE_ADMIN";
    pub const EDITOR_STR: &'static str = "ROLE_EDITOR";
    pub const USER_STR: &'static str = "ROLE_USER";
    pub const ACADEMIC_VIEWER_STR: &'static str = "ACADEMIC_VIEWER";
    pub const ACADEMIC_EDITOR_STR: &'static str = "ACADEMIC_EDITOR";
    pub const PROGRAMME_VIEWER_STR: &'static str = "PROGRAMME_VIEWER";
    pub const PROGRAMME_EDITOR_STR: &'static str = "PROGRAMME_EDITOR";

    pub const SUPER_ADMIN: RoleName = RoleName::from_static(Self::SUPER_ADMIN_STR);
    pub const ADMIN: RoleName = RoleName::from_static(Self::ADMIN_STR);
    pub const EDITOR: RoleName = RoleName::from_static(Self::EDITOR_STR);
    pub const USER: RoleName = RoleName::from_static(Self::USER_STR);
    pub const ACADEMIC_VIEWER: RoleName = RoleName::from_static(Self::ACADEMIC_VIEWER_STR);
    pub const ACADEMIC_EDITOR: RoleName = RoleName::from_static(Self::ACADEMIC_EDITOR_STR);
    pub const PROGRAMME_VIEWER: RoleName = RoleName::from_static(Self::PROGRAMME_VIEWER_STR);
    pub const PROGRAMME_EDITOR: RoleName = RoleName::from_static(Self::PROGRAMME_EDITOR_STR);

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tier this name denotes, if it is one of the four identity tiers.
    pub fn tier(&self) -> Option<Tier> {
        Tier::from_role_name(self.as_str())
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleName {
    fn from(value: &str) -> Self {
        Self(Cow::Owned(value.to_owned()))
    }
}

impl From<String> for RoleName {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Roles seeded at start-up: the four tiers, then the functional roles.
pub const SEEDED_ROLES: [RoleName; 8] = [
    RoleName::SUPER_ADMIN,
    RoleName::ADMIN,
    RoleName::EDITOR,
    RoleName::USER,
    RoleName::ACADEMIC_VIEWER,
    RoleName::ACADEMIC_EDITOR,
    RoleName::PROGRAMME_VIEWER,
    RoleName::PROGRAMME_EDITOR,
];

/// Identity tier. Strict total order: `SuperAdmin > Admin > Editor > User`.
///
/// The order is fixed at compile time; there is no runtime hierarchy object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    User,
    Editor,
    Admin,
    SuperAdmin,
}

impl Tier {
    /// All tiers, highest first.
    pub const DESCENDING: [Tier; 4] = [Tier::SuperAdmin, Tier::Admin, Tier::Editor, Tier::User];

    pub fn role_name(self) -> RoleName {
        match self {
            Tier::SuperAdmin => RoleName::SUPER_ADMIN,
            Tier::Admin => RoleName::ADMIN,
            Tier::Editor => RoleName::EDITOR,
            Tier::User => RoleName::USER,
        }
    }

    pub fn from_role_name(name: &str) -> Option<Tier> {
        match name {
            RoleName::SUPER_ADMIN_STR => Some(Tier::SuperAdmin),
            RoleName::ADMIN_STR => Some(Tier::Admin),
            RoleName::EDITOR_STR => Some(Tier::Editor),
            RoleName::USER_STR => Some(Tier::User),
            _ => None,
        }
    }

    /// Highest tier among `roles`, or `None` when no tier role is present.
    pub fn highest<'a, I>(roles: I) -> Option<Tier>
    where
        I: IntoIterator<Item = &'a RoleName>,
    {
        roles.into_iter().filter_map(RoleName::tier).max()
    }

    /// True for the tiers whose holders are shielded by the escalation guard.
    pub fn is_administrative(self) -> bool {
        self >= Tier::Admin
    }
}

impl core::fmt::Display for Tier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.role_name().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_strictly_ordered() {
        assert!(Tier::SuperAdmin > Tier::Admin);
        assert!(Tier::Admin > Tier::Editor);
        assert!(Tier::Editor > Tier::User);
        let mut sorted = Tier::DESCENDING.to_vec();
        sorted.sort();
        sorted.reverse();
        assert_eq!(sorted, Tier::DESCENDING.to_vec());
    }

    #[test]
    fn tier_names_round_trip() {
        for tier in Tier::DESCENDING {
            assert_eq!(Tier::from_role_name(tier.role_name().as_str()), Some(tier));
        }
        assert_eq!(Tier::from_role_name("ACADEMIC_EDITOR"), None);
    }

    #[test]
    fn highest_ignores_functional_roles() {
        let roles = [RoleName::ACADEMIC_EDITOR, RoleName::USER, RoleName::EDITOR];
        assert_eq!(Tier::highest(&roles), Some(Tier::Editor));
        assert_eq!(Tier::highest(&[RoleName::PROGRAMME_VIEWER]), None);
    }

    #[test]
    fn owned_and_static_names_compare_equal() {
        assert_eq!(RoleName::from("ROLE_ADMIN"), RoleName::ADMIN);
        assert_eq!(RoleName::new(String::from("ROLE_USER")), RoleName::USER);
    }

    #[test]
    fn only_admin_tiers_are_administrative() {
        assert!(Tier::SuperAdmin.is_administrative());
        assert!(Tier::Admin.is_administrative());
        assert!(!Tier::Editor.is_administrative());
        assert!(!Tier::User.is_administrative());
    }
}
