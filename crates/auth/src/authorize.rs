//! Authorization checks evaluated at the top of every administrative operation.
//!
//! - No IO
//! - No panics
//! - Pure functions of the caller's authorities and the target's current state

use std::collections::BTreeSet;

use warden_core::{AccessError, AccessResult};

use crate::permissions::Permission;
use crate::principal::Authorities;
use crate::roles::{RoleName, Tier};

/// Outcome of the escalation guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed,
    Denied,
}

impl GuardDecision {
    pub fn into_result(self) -> AccessResult<()> {
        match self {
            GuardDecision::Allowed => Ok(()),
            GuardDecision::Denied => Err(AccessError::forbidden(
                "only ROLE_SUPER_ADMIN can operate on ROLE_ADMIN/ROLE_SUPER_ADMIN accounts",
            )),
        }
    }
}

/// Escalation guard.
///
/// A target currently holding `ROLE_ADMIN` or `ROLE_SUPER_ADMIN` may only be
/// acted on by a caller holding `ROLE_SUPER_ADMIN`. Evaluate against the
/// target's roles *before* any mutation is applied.
pub fn guard_target_access(caller: &Authorities, target_roles: &BTreeSet<RoleName>) -> GuardDecision {
    let target_is_administrative = target_roles
        .iter()
        .filter_map(RoleName::tier)
        .any(Tier::is_administrative);

    if target_is_administrative && !caller.is_super_admin() {
        GuardDecision::Denied
    } else {
        GuardDecision::Allowed
    }
}

/// Require the caller's highest tier to be at least `required`.
pub fn require_tier(caller: &Authorities, required: Tier) -> AccessResult<()> {
    match caller.highest_tier() {
        Some(tier) if tier >= required => Ok(()),
        _ => Err(AccessError::forbidden(format!("requires {required} or higher"))),
    }
}

/// Require `required` tier, or that the caller is the account's owner.
pub fn require_tier_or_self(caller: &Authorities, required: Tier, owner: &str) -> AccessResult<()> {
    if caller.username == owner {
        return Ok(());
    }
    require_tier(caller, required)
}

/// Require a functional permission code.
pub fn require_permission(caller: &Authorities, required: &Permission) -> AccessResult<()> {
    if caller.has_permission(required) {
        Ok(())
    } else {
        Err(AccessError::forbidden(format!(
            "missing permission '{}'",
            required.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{ACADEMIC_READ, MANAGE_USER_PERMISSIONS};
    use proptest::prelude::*;

    fn caller(roles: &[RoleName]) -> Authorities {
        Authorities::new("caller", roles.iter().cloned(), [])
    }

    fn set(roles: &[RoleName]) -> BTreeSet<RoleName> {
        roles.iter().cloned().collect()
    }

    #[test]
    fn admin_cannot_touch_super_admin() {
        let decision = guard_target_access(&caller(&[RoleName::ADMIN]), &set(&[RoleName::SUPER_ADMIN]));
        assert_eq!(decision, GuardDecision::Denied);
        assert!(matches!(decision.into_result(), Err(AccessError::Forbidden(_))));
    }

    #[test]
    fn admin_cannot_touch_peer_admin() {
        let decision = guard_target_access(&caller(&[RoleName::ADMIN]), &set(&[RoleName::ADMIN]));
        assert_eq!(decision, GuardDecision::Denied);
    }

    #[test]
    fn super_admin_may_touch_anyone() {
        let super_admin = caller(&[RoleName::SUPER_ADMIN]);
        for tier in Tier::DESCENDING {
            assert_eq!(guard_target_access(&super_admin, &set(&[tier.role_name()])), GuardDecision::Allowed);
        }
    }

    #[test]
    fn non_administrative_targets_are_open() {
        let editor = caller(&[RoleName::EDITOR]);
        assert_eq!(guard_target_access(&editor, &set(&[RoleName::EDITOR])), GuardDecision::Allowed);
        assert_eq!(
            guard_target_access(&editor, &set(&[RoleName::USER, RoleName::ACADEMIC_EDITOR])),
            GuardDecision::Allowed
        );
    }

    #[test]
    fn tier_gate_follows_hierarchy() {
        let admin = caller(&[RoleName::ADMIN]);
        assert!(require_tier(&admin, Tier::Editor).is_ok());
        assert!(require_tier(&admin, Tier::Admin).is_ok());
        assert!(require_tier(&admin, Tier::SuperAdmin).is_err());
        assert!(require_tier(&caller(&[RoleName::ACADEMIC_EDITOR]), Tier::User).is_err());
    }

    #[test]
    fn self_access_bypasses_tier_gate() {
        let user = caller(&[RoleName::USER]);
        assert!(require_tier_or_self(&user, Tier::Admin, "caller").is_ok());
        assert!(require_tier_or_self(&user, Tier::Admin, "someone-else").is_err());
    }

    #[test]
    fn permission_gate() {
        let admin = Authorities::new("a", [RoleName::ADMIN], [MANAGE_USER_PERMISSIONS]);
        assert!(require_permission(&admin, &MANAGE_USER_PERMISSIONS).is_ok());
        let err = require_permission(&admin, &ACADEMIC_READ).unwrap_err();
        assert!(err.to_string().contains("PROGRAM:ACADEMIC:READ"));
    }

    fn any_role() -> impl Strategy<Value = RoleName> {
        (0usize..crate::roles::SEEDED_ROLES.len()).prop_map(|i| crate::roles::SEEDED_ROLES[i].clone())
    }

    proptest! {
        /// Any target holding an administrative tier is denied to every caller lacking ROLE_SUPER_ADMIN.
        #[test]
        fn administrative_targets_denied_without_super_admin(
            caller_roles in prop::collection::btree_set(any_role(), 0..5),
            mut target_roles in prop::collection::btree_set(any_role(), 0..5),
            admin_tier in prop::bool::ANY,
        ) {
            let mut caller_roles = caller_roles;
            caller_roles.remove(&RoleName::SUPER_ADMIN);
            target_roles.insert(if admin_tier { RoleName::ADMIN } else { RoleName::SUPER_ADMIN });

            let caller = Authorities::new("c", caller_roles, []);
            prop_assert_eq!(guard_target_access(&caller, &target_roles), GuardDecision::Denied);
        }
    }
}
