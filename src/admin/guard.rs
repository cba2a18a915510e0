use crate::domain::aggregates::User;
use crate::{Result, StorefrontError};

/// Proof that the admin surface was authorized. Only [`AdminGuard::authorize`] makes one.
#[derive(Clone, Debug)]
pub struct AdminSession {
    user: User,
}

impl AdminSession {
    pub fn user(&self) -> &User { &self.user }
    pub fn token(&self) -> &str { &self.user.token }
}

/// The single authorization check in front of every admin operation.
pub struct AdminGuard;

impl AdminGuard {
    pub fn authorize(user: Option<&User>) -> Result<AdminSession> {
        let user = user.ok_or_else(|| StorefrontError::Authorization("sign in required".into()))?;
        if !user.is_admin() {
            tracing::warn!(email = %user.email, "Non-admin attempted admin access");
            return Err(StorefrontError::Authorization("administrator role required".into()));
        }
        if user.token.trim().is_empty() {
            return Err(StorefrontError::Authorization("session token missing".into()));
        }
        Ok(AdminSession { user: user.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Role;

    fn user(role: Role, token: &str) -> User {
        User { name: "U".into(), email: "u@example.com".into(), role, token: token.into() }
    }

    #[test]
    fn test_only_admins_with_tokens_pass() {
        assert!(AdminGuard::authorize(None).is_err());
        assert!(matches!(AdminGuard::authorize(Some(&user(Role::Customer, "t"))), Err(StorefrontError::Authorization(_))));
        assert!(AdminGuard::authorize(Some(&user(Role::Admin, " "))).is_err());
        let session = AdminGuard::authorize(Some(&user(Role::Admin, "t"))).unwrap();
        assert_eq!(session.token(), "t");
    }
}
