use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::claims::TokenClaims;
use crate::permissions::{self, Permission};
use crate::roles::{RoleName, Tier};
use crate::user::Role;

/// Authority set of an authenticated caller.
///
/// Populated either from a verified token's claims (request path) or from the
/// store at login. Nothing else is consulted when making authorization
/// decisions, so the value is all the privilege engine ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorities {
    pub username: String,
    pub roles: BTreeSet<RoleName>,
    pub permissions: BTreeSet<Permission>,
}

impl Authorities {
    pub fn new(
        username: impl Into<String>,
        roles: impl IntoIterator<Item = RoleName>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            username: username.into(),
            roles: roles.into_iter().collect(),
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Authorities carried by a verified token.
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self::new(claims.sub, claims.roles, claims.permissions)
    }

    /// Fresh authorities for `username` holding `roles`: the role names, the
    /// catalog permissions of every role, and whatever the role records grant.
    pub fn from_role_records<'a>(
        username: impl Into<String>,
        roles: impl IntoIterator<Item = &'a Role>,
    ) -> Self {
        let mut names = BTreeSet::new();
        let mut perms = BTreeSet::new();
        for role in roles {
            perms.extend(permissions::permissions_for_role(role.name.as_str()));
            perms.extend(role.permissions.iter().cloned());
            names.insert(role.name.clone());
        }
        Self {
            username: username.into(),
            roles: names,
            permissions: perms,
        }
    }

    pub fn has_role(&self, role: &RoleName) -> bool {
        self.roles.contains(role)
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Highest identity tier held, if any.
    pub fn highest_tier(&self) -> Option<Tier> {
        Tier::highest(&self.roles)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(&RoleName::SUPER_ADMIN)
    }

    /// Role names in token order.
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.as_str().to_string()).collect()
    }

    /// Permission codes in token order.
    pub fn permission_codes(&self) -> Vec<String> {
        self.permissions.iter().map(|p| p.as_str().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{ACADEMIC_READ, ACADEMIC_UPDATE, MANAGE_USER_PERMISSIONS, PROGRAMME_READ};
    use warden_core::RoleId;

    fn role(name: RoleName, perms: &[Permission]) -> Role {
        Role {
            id: RoleId::new(),
            name,
            permissions: perms.iter().cloned().collect(),
        }
    }

    #[test]
    fn role_records_union_catalog_and_stored_grants() {
        let roles = vec![
            role(RoleName::ADMIN, &[]),
            role(RoleName::ACADEMIC_VIEWER, &[]),
            role(RoleName::USER, &[PROGRAMME_READ]),
        ];
        let auth = Authorities::from_role_records("carol", &roles);

        assert_eq!(auth.username, "carol");
        assert_eq!(auth.roles.len(), 3);
        assert!(auth.has_permission(&MANAGE_USER_PERMISSIONS));
        assert!(auth.has_permission(&ACADEMIC_READ));
        assert!(auth.has_permission(&PROGRAMME_READ));
        assert!(!auth.has_permission(&ACADEMIC_UPDATE));
        assert_eq!(auth.highest_tier(), Some(Tier::Admin));
        assert!(!auth.is_super_admin());
    }

    #[test]
    fn codes_come_out_sorted_and_deduplicated() {
        let auth = Authorities::new(
            "dave",
            [RoleName::USER, RoleName::EDITOR, RoleName::USER],
            [ACADEMIC_UPDATE, ACADEMIC_READ, ACADEMIC_READ],
        );
        assert_eq!(auth.role_names(), vec!["ROLE_EDITOR", "ROLE_USER"]);
        assert_eq!(
            auth.permission_codes(),
            vec!["PROGRAM:ACADEMIC:READ", "PROGRAM:ACADEMIC:UPDATE"]
        );
    }

    #[test]
    fn caller_without_tier_role_has_no_tier() {
        let auth = Authorities::new("eve", [RoleName::PROGRAMME_EDITOR], []);
        assert_eq!(auth.highest_tier(), None);
    }
}
