use std::fmt;

use serde::{Deserialize, Serialize};

/// Staff and customer roles issued by the auth service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "manager")]
    Admin,
    Rider,
    Chef,
    #[default]
    Customer,
}

impl Role {
    /// The command a user of this role usually starts from after login.
    pub fn landing_command(&self) -> &'static str {
        match self {
            Role::Customer => "order",
            Role::Admin => "edit-item",
            Role::Chef => "kitchen",
            Role::Rider => "history",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Rider => "rider",
            Role::Chef => "chef",
            Role::Customer => "customer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Response of `POST /token/` and `POST /refresh/`.
///
/// Some deployments answer with `token` instead of `access`; refresh
/// responses may omit the refresh token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(default, alias = "token")]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_pair_aliases() {
        let pair: TokenPair = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(pair.access.as_deref(), Some("abc"));
        assert_eq!(pair.refresh, None);

        let empty: TokenPair = serde_json::from_str("{}").unwrap();
        assert!(empty.access.is_none());
    }

    #[test]
    fn test_profile_role_defaults_to_customer() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"id": 1, "username": "ama"}"#).unwrap();
        assert_eq!(profile.role, Role::Customer);

        let manager: UserProfile =
            serde_json::from_str(r#"{"username": "kofi", "role": "manager"}"#).unwrap();
        assert_eq!(manager.role, Role::Admin);
        assert_eq!(manager.role.landing_command(), "edit-item");
    }
}
