//! Privilege resolution engine.
//!
//! Decides which roles a caller may hand out and which permission codes a
//! role may carry. The allow-list tables below are the single source of
//! truth; handlers call these functions directly before touching the store.

use std::collections::BTreeSet;

use warden_core::{AccessError, AccessResult};

use crate::authorize::guard_target_access;
use crate::permissions::{self, ACADEMIC_READ, ACADEMIC_UPDATE, Permission, PROGRAMME_READ, PROGRAMME_UPDATE};
use crate::principal::Authorities;
use crate::roles::{RoleName, Tier};

/// Assignable tiers and fallback for account creation, by caller tier.
struct CreationPolicy {
    assignable: &'static [Tier],
    default: Tier,
}

const SUPER_ADMIN_ASSIGNABLE: &[Tier] = &[Tier::Admin, Tier::Editor, Tier::User];
const ADMIN_ASSIGNABLE: &[Tier] = &[Tier::Editor];
const EDITOR_ASSIGNABLE: &[Tier] = &[Tier::User];
const BASE_ASSIGNABLE: &[Tier] = &[Tier::User];

fn creation_policy(caller_tier: Option<Tier>) -> CreationPolicy {
    match caller_tier {
        Some(Tier::SuperAdmin) => CreationPolicy {
            assignable: SUPER_ADMIN_ASSIGNABLE,
            default: Tier::User,
        },
        Some(Tier::Admin) => CreationPolicy {
            assignable: ADMIN_ASSIGNABLE,
            default: Tier::Editor,
        },
        Some(Tier::Editor) => CreationPolicy {
            assignable: EDITOR_ASSIGNABLE,
            default: Tier::User,
        },
        Some(Tier::User) | None => CreationPolicy {
            assignable: BASE_ASSIGNABLE,
            default: Tier::User,
        },
    }
}

/// Tiers a caller may set on an existing account. `None` means role updates
/// are not available to the caller at all.
fn update_allow_list(caller_tier: Option<Tier>) -> Option<&'static [Tier]> {
    match caller_tier {
        Some(Tier::SuperAdmin) => Some(SUPER_ADMIN_ASSIGNABLE),
        Some(Tier::Admin) => Some(ADMIN_ASSIGNABLE),
        _ => None,
    }
}

fn allows(list: &[Tier], name: &RoleName) -> bool {
    name.tier().is_some_and(|tier| list.contains(&tier))
}

/// Roles for a newly created account.
///
/// Requested names are intersected with the allow-list of the caller's
/// highest tier; names outside it are dropped. An empty intersection yields
/// the tier default, so the result is never empty and never above the
/// creator's own tier.
pub fn resolve_roles_for_creation<'a>(
    caller: &Authorities,
    requested: impl IntoIterator<Item = &'a RoleName>,
) -> BTreeSet<RoleName> {
    let policy = creation_policy(caller.highest_tier());

    let effective: BTreeSet<RoleName> = requested
        .into_iter()
        .filter(|name| allows(policy.assignable, name))
        .cloned()
        .collect();

    if effective.is_empty() {
        BTreeSet::from([policy.default.role_name()])
    } else {
        effective
    }
}

/// Roles for an existing account whose current roles are `target_roles`.
///
/// Order of checks: escalation guard against the target's current roles,
/// then the caller's update allow-list (callers below ADMIN are rejected
/// outright), then every requested name must be on the list (one stray name
/// rejects the whole request), then the result must be non-empty.
pub fn resolve_roles_for_update<'a>(
    caller: &Authorities,
    requested: impl IntoIterator<Item = &'a RoleName>,
    target_roles: &BTreeSet<RoleName>,
) -> AccessResult<BTreeSet<RoleName>> {
    guard_target_access(caller, target_roles).into_result()?;

    let allow_list = update_allow_list(caller.highest_tier())
        .ok_or_else(|| AccessError::forbidden("insufficient privileges to update roles"))?;

    let mut effective = BTreeSet::new();
    for name in requested {
        if !allows(allow_list, name) {
            return Err(AccessError::forbidden(format!("not allowed to assign role: {name}")));
        }
        effective.insert(name.clone());
    }

    if effective.is_empty() {
        return Err(AccessError::validation("at least one valid role must be provided"));
    }
    Ok(effective)
}

/// Validate a replacement permission set for a role.
///
/// Every code must be in the catalog; a single unknown code rejects the whole
/// set. Duplicates collapse.
pub fn resolve_role_permissions<'a>(
    requested: impl IntoIterator<Item = &'a str>,
) -> AccessResult<BTreeSet<Permission>> {
    let mut resolved = BTreeSet::new();
    for code in requested {
        let permission = permissions::lookup(code)
            .ok_or_else(|| AccessError::validation(format!("unknown permission code: {code}")))?;
        resolved.insert(permission);
    }
    Ok(resolved)
}

/// Map requested functional permission codes onto functional roles, keeping
/// the target's tier roles.
///
/// `READ` without `UPDATE` selects the viewer role, `UPDATE` selects the
/// editor role (which includes read). Codes must be in the catalog, and codes
/// that no functional role grants are rejected instead of dropped.
pub fn resolve_functional_roles<'a>(
    requested: impl IntoIterator<Item = &'a str>,
    target_roles: &BTreeSet<RoleName>,
) -> AccessResult<BTreeSet<RoleName>> {
    let codes = resolve_role_permissions(requested)?;

    let grantable = [ACADEMIC_READ, ACADEMIC_UPDATE, PROGRAMME_READ, PROGRAMME_UPDATE];
    if let Some(code) = codes.iter().find(|c| !grantable.contains(c)) {
        return Err(AccessError::validation(format!(
            "permission cannot be granted through a functional role: {code}"
        )));
    }

    let mut roles: BTreeSet<RoleName> = target_roles
        .iter()
        .filter(|name| name.tier().is_some())
        .cloned()
        .collect();

    let pairs = [
        (ACADEMIC_READ, ACADEMIC_UPDATE, RoleName::ACADEMIC_VIEWER, RoleName::ACADEMIC_EDITOR),
        (PROGRAMME_READ, PROGRAMME_UPDATE, RoleName::PROGRAMME_VIEWER, RoleName::PROGRAMME_EDITOR),
    ];
    for (read, update, viewer, editor) in pairs {
        if codes.contains(&update) {
            roles.insert(editor);
        } else if codes.contains(&read) {
            roles.insert(viewer);
        }
    }

    if roles.is_empty() {
        return Err(AccessError::validation("at least one role must remain"));
    }
    Ok(roles)
}
