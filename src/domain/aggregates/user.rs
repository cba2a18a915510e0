//! Signed-in user, as supplied by the identity service

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role { #[default] Customer, Admin }

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub token: String,
}

impl User {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("token", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token() {
        let user = User { name: "Ada".into(), email: "ada@example.com".into(), role: Role::Admin, token: "s3cr3t".into() };
        let out = format!("{user:?}");
        assert!(!out.contains("s3cr3t"));
        assert!(user.is_admin());
    }

    #[test]
    fn test_role_defaults_to_customer() {
        let user: User = serde_json::from_str(r#"{"name":"B","email":"b@example.com","token":"t"}"#).unwrap();
        assert_eq!(user.role, Role::Customer);
    }
}
