//! Tenant identity.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};

/// The identity under which all local storage is scoped.
///
/// Every store and queue access requires a resolved `TenantContext`.
/// Construction fails closed: no component may be empty, so code that holds
/// a `TenantContext` is guaranteed a complete identity.
///
/// # Example
///
/// ```rust
/// use vetsync_protocol::TenantContext;
///
/// let ctx = TenantContext::new("clinic-7", "user-42", "practice-1").unwrap();
/// assert_eq!(ctx.tenant_id(), "clinic-7");
///
/// assert!(TenantContext::new("", "user-42", "practice-1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantContext {
    tenant_id: String,
    user_id: String,
    practice_id: String,
}

impl TenantContext {
    /// Creates a new tenant context.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::IncompleteTenantContext`] if any component
    /// is empty.
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        practice_id: impl Into<String>,
    ) -> ProtocolResult<Self> {
        let tenant_id = tenant_id.into();
        let user_id = user_id.into();
        let practice_id = practice_id.into();

        if tenant_id.is_empty() {
            return Err(ProtocolError::IncompleteTenantContext { field: "tenant_id" });
        }
        if user_id.is_empty() {
            return Err(ProtocolError::IncompleteTenantContext { field: "user_id" });
        }
        if practice_id.is_empty() {
            return Err(ProtocolError::IncompleteTenantContext {
                field: "practice_id",
            });
        }

        Ok(Self {
            tenant_id,
            user_id,
            practice_id,
        })
    }

    /// Returns the tenant identifier.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Returns the user identifier.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the practice identifier.
    #[must_use]
    pub fn practice_id(&self) -> &str {
        &self.practice_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_context_constructs() {
        let ctx = TenantContext::new("t1", "u1", "p1").unwrap();
        assert_eq!(ctx.tenant_id(), "t1");
        assert_eq!(ctx.user_id(), "u1");
        assert_eq!(ctx.practice_id(), "p1");
    }

    #[test]
    fn empty_components_fail_closed() {
        assert!(matches!(
            TenantContext::new("", "u1", "p1"),
            Err(ProtocolError::IncompleteTenantContext { field: "tenant_id" })
        ));
        assert!(matches!(
            TenantContext::new("t1", "", "p1"),
            Err(ProtocolError::IncompleteTenantContext { field: "user_id" })
        ));
        assert!(matches!(
            TenantContext::new("t1", "u1", ""),
            Err(ProtocolError::IncompleteTenantContext {
                field: "practice_id"
            })
        ));
    }
}
