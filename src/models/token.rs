//! Scoped database credentials and the cache key they are stored under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Permission level baked into a database token at issuance time.
/// Never changes for the lifetime of the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    FullAccess,
    ReadOnly,
}

impl Permission {
    /// Wire string understood by the platform token-issuance endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FullAccess => "full-access",
            Permission::ReadOnly => "read-only",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-access" => Ok(Permission::FullAccess),
            "read-only" => Ok(Permission::ReadOnly),
            other => Err(format!(
                "unknown permission level '{}' (expected 'full-access' or 'read-only')",
                other
            )),
        }
    }
}

/// Cache slot identifier. A full-access token never occupies a read-only
/// slot for the same database, even though it could satisfy the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub database: String,
    pub permission: Permission,
}

impl CacheKey {
    pub fn new(database: impl Into<String>, permission: Permission) -> Self {
        Self {
            database: database.into(),
            permission,
        }
    }
}

/// A minted per-database credential together with its decoded expiry.
#[derive(Debug, Clone)]
pub struct ScopedToken {
    pub database: String,
    pub permission: Permission,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ScopedToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_permission_wire_strings() {
        assert_eq!(Permission::FullAccess.as_str(), "full-access");
        assert_eq!(Permission::ReadOnly.as_str(), "read-only");
        assert_eq!(
            serde_json::to_value(Permission::ReadOnly).unwrap(),
            serde_json::json!("read-only")
        );
    }

    #[test]
    fn test_permission_from_str() {
        assert_eq!("full-access".parse(), Ok(Permission::FullAccess));
        assert_eq!("read-only".parse(), Ok(Permission::ReadOnly));
        assert!("admin".parse::<Permission>().is_err());
    }

    #[test]
    fn test_cache_keys_distinguish_permissions() {
        let full = CacheKey::new("shop", Permission::FullAccess);
        let ro = CacheKey::new("shop", Permission::ReadOnly);
        assert_ne!(full, ro);
        assert_eq!(full, CacheKey::new("shop", Permission::FullAccess));
    }

    #[test]
    fn test_scoped_token_expiry() {
        let mut token = ScopedToken {
            database: "shop".into(),
            permission: Permission::ReadOnly,
            token: "jwt".into(),
            expires_at: Utc::now() + Duration::hours(1),
        };
        assert!(!token.is_expired());

        token.expires_at = Utc::now() - Duration::seconds(1);
        assert!(token.is_expired());
    }
}
