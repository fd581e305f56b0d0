//! Session database context — tracks the "current database" and resolves
//! an effective database name for every data-plane operation.

use std::sync::RwLock;

use crate::errors::AppError;

/// Resolution order: explicit argument, then the session's current
/// database, then the configured default, then `NoDatabaseSelected`.
///
/// Owned by the server instance, not process-global; tests build
/// isolated instances.
pub struct DatabaseContext {
    current: RwLock<Option<String>>,
    default_database: Option<String>,
}

impl DatabaseContext {
    pub fn new(default_database: Option<String>) -> Self {
        Self {
            current: RwLock::new(None),
            default_database,
        }
    }

    /// Resolve the effective database name for one operation.
    ///
    /// A non-empty explicit name also binds the session to it, so a
    /// subsequent operation that omits the name inherits it. Fallback
    /// reads never mutate the session.
    pub fn resolve(&self, explicit: Option<&str>) -> Result<String, AppError> {
        if let Some(name) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
            self.set_current(name);
            return Ok(name.to_string());
        }

        if let Some(current) = self.current.read().expect("context lock poisoned").clone() {
            return Ok(current);
        }

        if let Some(default) = &self.default_database {
            return Ok(default.clone());
        }

        Err(AppError::NoDatabaseSelected)
    }

    /// Bind the session to a database. Once bound, the session never
    /// returns to the unbound state.
    pub fn set_current(&self, name: &str) {
        let mut current = self.current.write().expect("context lock poisoned");
        if current.as_deref() != Some(name) {
            tracing::debug!(database = %name, "session database bound");
        }
        *current = Some(name.to_string());
    }

    pub fn current(&self) -> Option<String> {
        self.current.read().expect("context lock poisoned").clone()
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_name_wins_and_binds_session() {
        let ctx = DatabaseContext::new(None);
        assert_eq!(ctx.resolve(Some("db1")).unwrap(), "db1");
        // A later call without an explicit name inherits the session.
        assert_eq!(ctx.resolve(None).unwrap(), "db1");
    }

    #[test]
    fn test_no_database_selected() {
        let ctx = DatabaseContext::new(None);
        let err = ctx.resolve(None).unwrap_err();
        assert!(matches!(err, AppError::NoDatabaseSelected));
        // The session stays unbound after a failed resolution.
        assert_eq!(ctx.current(), None);
    }

    #[test]
    fn test_default_then_explicit_then_session() {
        let ctx = DatabaseContext::new(Some("shop".into()));
        assert_eq!(ctx.resolve(None).unwrap(), "shop");

        assert_eq!(ctx.resolve(Some("reports")).unwrap(), "reports");
        assert_eq!(ctx.current().as_deref(), Some("reports"));

        // The session now shadows the configured default.
        assert_eq!(ctx.resolve(None).unwrap(), "reports");
    }

    #[test]
    fn test_default_fallback_does_not_bind_session() {
        let ctx = DatabaseContext::new(Some("shop".into()));
        assert_eq!(ctx.resolve(None).unwrap(), "shop");
        assert_eq!(ctx.current(), None);
    }

    #[test]
    fn test_blank_explicit_name_is_ignored() {
        let ctx = DatabaseContext::new(Some("shop".into()));
        assert_eq!(ctx.resolve(Some("   ")).unwrap(), "shop");
        assert_eq!(ctx.current(), None);
    }

    #[test]
    fn test_rebinding_overwrites() {
        let ctx = DatabaseContext::new(None);
        ctx.set_current("a");
        ctx.set_current("b");
        assert_eq!(ctx.resolve(None).unwrap(), "b");
    }
}
