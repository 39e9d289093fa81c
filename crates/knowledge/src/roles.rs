//! Role permission model.
//!
//! Roles are a logical filter over retrieved content, not a security
//! boundary. Each department role reads its own content plus the shared
//! baseline (`employee`); `admin` reads everything.

use crate::types::SearchResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Access-control identity of the person asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Finance,
    Engineering,
    Hr,
    Marketing,
    Employee,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Finance,
        Role::Engineering,
        Role::Hr,
        Role::Marketing,
        Role::Employee,
    ];

    /// The shared baseline every role can read.
    pub const BASELINE: Role = Role::Employee;

    /// Parse a role name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "finance" => Some(Self::Finance),
            "engineering" => Some(Self::Engineering),
            "hr" => Some(Self::Hr),
            "marketing" => Some(Self::Marketing),
            "employee" => Some(Self::Employee),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Finance => "finance",
            Self::Engineering => "engineering",
            Self::Hr => "hr",
            Self::Marketing => "marketing",
            Self::Employee => "employee",
        }
    }

    /// Roles whose content this role may read. Always contains `self`.
    pub fn accessible_roles(&self) -> BTreeSet<Role> {
        match self {
            Self::Admin => Role::ALL.into_iter().collect(),
            Self::Employee => BTreeSet::from([Self::Employee]),
            department => BTreeSet::from([*department, Self::BASELINE]),
        }
    }

    /// Name of the boolean chunk flag the vector store filters on.
    ///
    /// Chunk metadata stores the baseline as `role_general`, not
    /// `role_employee`, so the baseline role is translated here.
    pub fn filter_key(&self) -> &'static str {
        match self {
            Self::Admin => "role_admin",
            Self::Finance => "role_finance",
            Self::Engineering => "role_engineering",
            Self::Hr => "role_hr",
            Self::Marketing => "role_marketing",
            Self::Employee => "role_general",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role named in a chunk's `allowed_roles`; ingestion writes `general` for the baseline.
fn parse_required(s: &str) -> Option<Role> {
    match s.trim().to_lowercase().as_str() {
        "general" => Some(Role::BASELINE),
        other => Role::parse(other),
    }
}

/// Whether `user_role` may read content restricted to `required_roles`.
///
/// Unknown user roles never have access. Unknown entries in
/// `required_roles` are ignored.
pub fn can_access<S: AsRef<str>>(user_role: &str, required_roles: &[S]) -> bool {
    let Some(role) = Role::parse(user_role) else {
        return false;
    };

    let accessible = role.accessible_roles();
    required_roles
        .iter()
        .filter_map(|r| parse_required(r.as_ref()))
        .any(|r| accessible.contains(&r))
}

/// Drop entries whose `allowed_roles` the role may not read.
pub fn filter_results(results: SearchResult, role: Role) -> SearchResult {
    let keep: Vec<usize> = results
        .metadatas()
        .iter()
        .enumerate()
        .filter(|(_, meta)| can_access(role.as_str(), &meta.allowed_roles))
        .map(|(i, _)| i)
        .collect();

    if keep.len() == results.len() {
        results
    } else {
        results.select(&keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;

    #[test]
    fn test_accessible_roles_reflexive() {
        for role in Role::ALL {
            assert!(role.accessible_roles().contains(&role), "{} not reflexive", role);
        }
    }

    #[test]
    fn test_admin_superset() {
        let admin = Role::Admin.accessible_roles();
        for role in Role::ALL {
            assert!(role.accessible_roles().is_subset(&admin));
        }
    }

    #[test]
    fn test_department_roles_see_self_and_baseline() {
        for role in [Role::Finance, Role::Engineering, Role::Hr, Role::Marketing] {
            assert_eq!(role.accessible_roles(), BTreeSet::from([role, Role::Employee]));
        }
        assert_eq!(Role::Employee.accessible_roles(), BTreeSet::from([Role::Employee]));
    }

    #[test]
    fn test_filter_key_mapping() {
        assert_eq!(Role::Employee.filter_key(), "role_general");
        assert_eq!(Role::Admin.filter_key(), "role_admin");
        assert_eq!(Role::Hr.filter_key(), "role_hr");
        for role in Role::ALL {
            assert!(crate::types::RoleFlags::KEYS.contains(&role.filter_key()));
        }
    }

    #[test]
    fn test_can_access() {
        assert!(can_access("finance", &["finance", "admin"]));
        assert!(can_access("admin", &["finance", "admin"]));
        assert!(!can_access("employee", &["finance", "admin"]));
        assert!(can_access("engineering", &["employee"]));
        assert!(can_access("hr", &["general"]));
    }

    #[test]
    fn test_unknown_role_has_no_access() {
        assert!(!can_access("intern", &["employee", "admin"]));
        assert!(!can_access("", &["employee"]));
        assert!(Role::parse("Intern").is_none());
        assert_eq!(Role::parse(" HR "), Some(Role::Hr));
    }

    #[test]
    fn test_filter_results() {
        let mut results = SearchResult::default();
        results.push("a", "finance numbers", ChunkMetadata::for_roles("q3.md", &["finance", "admin"]), 0.1);
        results.push("b", "holiday list", ChunkMetadata::for_roles("handbook.md", &["employee", "admin"]), 0.2);

        let filtered = filter_results(results.clone(), Role::Employee);
        assert_eq!(filtered.ids(), ["b"]);

        let filtered = filter_results(results, Role::Finance);
        assert_eq!(filtered.len(), 2);
    }
}
