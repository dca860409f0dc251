//! Permission catalog.
//!
//! Permission codes are a closed set. Anything not listed in [`ALL`] is not a
//! permission and must be rejected by whoever receives it.

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::roles::RoleName;

/// Permission code, formatted `DOMAIN:RESOURCE:ACTION` (e.g. `PROGRAM:ACADEMIC:READ`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the final `:` segment.
    pub fn resource(&self) -> &str {
        self.0.rsplit_once(':').map(|(r, _)| r).unwrap_or(&self.0)
    }

    /// The final `:` segment.
    pub fn action(&self) -> &str {
        self.0.rsplit_once(':').map(|(_, a)| a).unwrap_or("")
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const ACADEMIC_READ: Permission = Permission::from_static("PROGRAM:ACADEMIC:READ");
pub const ACADEMIC_UPDATE: Permission = Permission::from_static("PROGRAM:ACADEMIC:UPDATE");
pub const PROGRAMME_READ: Permission = Permission::from_static("PROGRAM:PROGRAMME:READ");
pub const PROGRAMME_UPDATE: Permission = Permission::from_static("PROGRAM:PROGRAMME:UPDATE");
pub const MANAGE_USER_PERMISSIONS: Permission =
    Permission::from_static("IAM:MANAGE_USER_PERMISSIONS");

/// The complete catalog, in declaration order.
pub const ALL: [Permission; 5] = [
    ACADEMIC_READ,
    ACADEMIC_UPDATE,
    PROGRAMME_READ,
    PROGRAMME_UPDATE,
    MANAGE_USER_PERMISSIONS,
];

/// Every permission code in the catalog.
pub fn all_permission_codes() -> BTreeSet<Permission> {
    ALL.into_iter().collect()
}

/// Look up a caller-supplied code. Returns `None` for anything outside the catalog.
pub fn lookup(code: &str) -> Option<Permission> {
    ALL.into_iter().find(|p| p.as_str() == code)
}

/// Fixed permission set for a role name. Unrecognized names map to the empty set.
pub fn permissions_for_role(role_name: &str) -> BTreeSet<Permission> {
    let codes = match role_name {
        RoleName::ACADEMIC_VIEWER_STR => vec![ACADEMIC_READ],
        RoleName::ACADEMIC_EDITOR_STR => vec![ACADEMIC_READ, ACADEMIC_UPDATE],
        RoleName::PROGRAMME_VIEWER_STR => vec![PROGRAMME_READ],
        RoleName::PROGRAMME_EDITOR_STR => vec![PROGRAMME_READ, PROGRAMME_UPDATE],
        RoleName::SUPER_ADMIN_STR => ALL.to_vec(),
        RoleName::ADMIN_STR => vec![MANAGE_USER_PERMISSIONS],
        _ => Vec::new(),
    };
    codes.into_iter().collect()
}
