/// Role vocabulary and role-set handling
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

/// Roles a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account, the default
    User,
    /// Can publish under an editorial byline
    Author,
    /// Can assign roles to other accounts
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Author => "author",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "author" => Ok(Role::Author),
            "admin" => Ok(Role::Admin),
            _ => Err(ApiError::Validation(format!("Invalid role: {}", s))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a stored comma-separated role list
pub fn parse_list(s: &str) -> ApiResult<Vec<Role>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Role::from_str)
        .collect()
}

/// Format a role list for storage
pub fn format_list(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Validate a submitted role set: every name known, result non-empty.
/// Duplicates collapse; order of first appearance is kept.
pub fn parse_set(names: &[String]) -> ApiResult<Vec<Role>> {
    if names.is_empty() {
        return Err(ApiError::Validation("Invalid roles input".to_string()));
    }

    let mut parsed = Vec::new();
    for name in names {
        let role = Role::from_str(name)
            .map_err(|_| ApiError::Validation("Invalid role(s) provided".to_string()))?;
        if !parsed.contains(&role) {
            parsed.push(role);
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert_eq!(Role::from_str("author").unwrap(), Role::Author);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);

        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn list_round_trip() {
        let roles = vec![Role::User, Role::Admin];
        let formatted = format_list(&roles);
        assert_eq!(formatted, "user,admin");
        assert_eq!(parse_list(&formatted).unwrap(), roles);
    }

    #[test]
    fn parse_set_rejects_empty_and_unknown() {
        assert!(parse_set(&[]).is_err());
        assert!(parse_set(&["superuser".to_string()]).is_err());
    }

    #[test]
    fn parse_set_collapses_duplicates() {
        let roles =
            parse_set(&["admin".to_string(), "user".to_string(), "admin".to_string()]).unwrap();
        assert_eq!(roles, vec![Role::Admin, Role::User]);
    }
}
