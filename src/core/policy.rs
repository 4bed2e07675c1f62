//! Role gate.
//!
//! Roles collapse into two capabilities. Every authorization decision in the
//! crate goes through [`can`].

use crate::entities::Role;
use crate::errors::{Error, Result};

/// Coarse capability a role grants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Owners and administrators
    BackOffice,
    /// Sellers and read-only accounts
    PointOfSale,
}

/// Guarded operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewCatalog,
    ManageCatalog,
    CreateInvoice,
    ViewInvoices,
    CancelSameDayInvoice,
    CancelPastInvoice,
    ViewReports,
    ManageBilling,
}

impl Action {
    /// Every action, used to walk the full matrix.
    pub const ALL: [Self; 8] = [
        Self::ViewCatalog,
        Self::ManageCatalog,
        Self::CreateInvoice,
        Self::ViewInvoices,
        Self::CancelSameDayInvoice,
        Self::CancelPastInvoice,
        Self::ViewReports,
        Self::ManageBilling,
    ];
}

/// Capability granted by a role.
#[must_use]
pub const fn capability(role: Role) -> Capability {
    match role {
        Role::Owner | Role::Admin => Capability::BackOffice,
        Role::Vendedor | Role::SoloLectura => Capability::PointOfSale,
    }
}

const BACK_OFFICE: &[Role] = &[Role::Owner, Role::Admin];
const ANY_ROLE: &[Role] = &[Role::Owner, Role::Admin, Role::Vendedor, Role::SoloLectura];

impl Action {
    /// Roles permitted to perform this action.
    #[must_use]
    pub const fn permitted_roles(self) -> &'static [Role] {
        match self {
            Self::ViewCatalog
            | Self::CreateInvoice
            | Self::ViewInvoices
            | Self::CancelSameDayInvoice => ANY_ROLE,
            Self::ManageCatalog
            | Self::CancelPastInvoice
            | Self::ViewReports
            | Self::ManageBilling => BACK_OFFICE,
        }
    }
}

/// Whether `role` may perform `action`.
#[must_use]
pub fn can(role: Role, action: Action) -> bool {
    allows(action.permitted_roles(), role)
}

/// Fails with [`Error::Forbidden`] when `role` may not perform `action`.
pub fn authorize(role: Role, action: Action) -> Result<()> {
    if can(role, action) {
        Ok(())
    } else {
        Err(Error::forbidden("You do not have permission to perform this action"))
    }
}

/// Whether `role` is one of `required`.
#[must_use]
pub fn allows(required: &[Role], role: Role) -> bool {
    required.contains(&role)
}

/// Landing page of the client for `role`; denied clients are sent here.
#[must_use]
pub const fn home_path(role: Role) -> &'static str {
    match capability(role) {
        Capability::BackOffice => "/admin/dashboard",
        Capability::PointOfSale => "/seller/dashboard",
    }
}
