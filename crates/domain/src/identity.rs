use fusionboard_core::TenantId;

use crate::security::Role;
use crate::user::UserId;

/// Authenticated caller snapshot resolved once per request.
///
/// Built from the session plus a fresh user store lookup so that role,
/// tenant and lock status reflect the current row, not the login-time state.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    user_id: UserId,
    role: Role,
    tenant_id: TenantId,
    is_locked: bool,
}

impl CallerIdentity {
    /// Creates an identity snapshot from freshly loaded user data.
    #[must_use]
    pub fn new(user_id: UserId, role: Role, tenant_id: TenantId, is_locked: bool) -> Self {
        Self {
            user_id,
            role,
            tenant_id,
            is_locked,
        }
    }

    /// Returns the caller's user id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the caller's account-level role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the tenant the caller belongs to.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns whether the account is locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    /// Returns whether the caller holds the platform-operator bypass role.
    #[must_use]
    pub fn is_system_admin(&self) -> bool {
        self.role == Role::SystemAdmin
    }
}
