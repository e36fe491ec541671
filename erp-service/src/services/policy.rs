//! Role capabilities.
//!
//! Handlers gate operations through a capability set per role instead of
//! comparing role strings in place.

use crate::models::UserRole;
use erp_core::error::AppError;

/// Operations a role may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageUsers,
    ManageCustomers,
    ManageCatalog,
    ManageBilling,
    ViewDashboard,
    ViewRecords,
}

/// Capability set for a role.
pub fn capabilities(role: UserRole) -> &'static [Capability] {
    match role {
        UserRole::Admin => &[
            Capability::ManageUsers,
            Capability::ManageCustomers,
            Capability::ManageCatalog,
            Capability::ManageBilling,
            Capability::ViewDashboard,
            Capability::ViewRecords,
        ],
        UserRole::InternalUser => &[
            Capability::ManageCustomers,
            Capability::ManageCatalog,
            Capability::ManageBilling,
            Capability::ViewDashboard,
            Capability::ViewRecords,
        ],
        UserRole::Customer => &[Capability::ViewRecords],
    }
}

/// Reject with 403 unless the role holds the capability.
pub fn require(role: &str, capability: Capability) -> Result<(), AppError> {
    let role = UserRole::from_string(role);
    if capabilities(role).contains(&capability) {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!(
            "Insufficient permissions for this operation"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_capability() {
        for cap in [
            Capability::ManageUsers,
            Capability::ManageCustomers,
            Capability::ManageCatalog,
            Capability::ManageBilling,
            Capability::ViewDashboard,
            Capability::ViewRecords,
        ] {
            assert!(require("ADMIN", cap).is_ok());
        }
    }

    #[test]
    fn internal_user_cannot_manage_users() {
        assert!(require("INTERNAL_USER", Capability::ManageUsers).is_err());
        assert!(require("INTERNAL_USER", Capability::ManageBilling).is_ok());
    }

    #[test]
    fn customer_is_read_only() {
        assert!(require("CUSTOMER", Capability::ViewRecords).is_ok());
        assert!(require("CUSTOMER", Capability::ManageBilling).is_err());
        assert!(require("CUSTOMER", Capability::ViewDashboard).is_err());
    }

    #[test]
    fn unknown_role_falls_back_to_customer() {
        assert!(require("WIZARD", Capability::ManageCatalog).is_err());
        assert!(require("WIZARD", Capability::ViewRecords).is_ok());
    }
}
