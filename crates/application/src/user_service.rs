//! User lifecycle ports and application service.
//!
//! Owns registration, login, identity resolution, tenant provisioning and
//! user removal. Follows OWASP guidance on generic authentication errors.

use std::sync::Arc;

use async_trait::async_trait;
use fusionboard_core::{AppError, AppResult, NonEmptyString, TenantId};
use fusionboard_domain::{
    CallerIdentity, EmailAddress, Permission, Role, UserId, validate_password,
};

use crate::authorization_service::{AuthorizationService, Scope};


// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// User row returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Canonical lowercased email address.
    pub email: String,
    /// Stored password hash.
    pub password_hash: String,
    /// Account-level role.
    pub role: Role,
    /// Tenant the user belongs to.
    pub tenant_id: TenantId,
    /// Whether the account is locked out.
    pub is_locked: bool,
}

/// Parameters for inserting a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Canonical lowercased email address.
    pub email: String,
    /// Stored password hash.
    pub password_hash: String,
    /// Account-level role.
    pub role: Role,
    /// Tenant the user is provisioned into.
    pub tenant_id: TenantId,
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Finds a user by their unique identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Lists every user across all tenants.
    async fn list_all(&self) -> AppResult<Vec<UserRecord>>;

    /// Lists the users of one tenant.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<UserRecord>>;

    /// Creates a user row together with its tenant membership row.
    async fn create(&self, user: NewUser) -> AppResult<UserRecord>;

    /// Deletes a user. Removes their tenant and project memberships and
    /// clears their task assignments in the same transaction.
    async fn delete(&self, user_id: UserId) -> AppResult<()>;
}

/// Repository port for tenant persistence.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Creates a tenant and returns its id.
    async fn create(&self, name: &str) -> AppResult<TenantId>;

    /// Ensures the reserved system tenant exists and returns its id.
    async fn ensure_system_tenant(&self) -> AppResult<TenantId>;
}

/// Port for password hashing operations. Keeps the application layer free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    /// Must run in constant time regardless of validity.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Parameters for self-service registration.
#[derive(Debug, Clone)]
pub struct RegisterParams {
    /// Display name for the new account.
    pub name: String,
    /// Email address for the new account.
    pub email: String,
    /// Plaintext password, validated before hashing.
    pub password: String,
}

/// Parameters for administrative user provisioning.
#[derive(Debug, Clone)]
pub struct CreateUserParams {
    /// Display name for the new account.
    pub name: String,
    /// Email address for the new account.
    pub email: String,
    /// Plaintext password, validated before hashing.
    pub password: String,
    /// Role the new user is provisioned with.
    pub role: Role,
}

/// Roles a tenant administrator may provision into their own tenant.
const TENANT_PROVISIONABLE_ROLES: &[Role] = &[
    Role::Pm,
    Role::Ba,
    Role::Support,
    Role::Dev,
    Role::Qa,
    Role::Customer,
];

/// Roles a system administrator may provision (never another system admin).
const SYSTEM_PROVISIONABLE_ROLES: &[Role] = &[
    Role::TenantAdmin,
    Role::Pm,
    Role::Ba,
    Role::Support,
    Role::Dev,
    Role::Qa,
    Role::Customer,
];

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for user authentication and lifecycle.
#[derive(Clone)]
pub struct UserService {
    authorization_service: AuthorizationService,
    user_repository: Arc<dyn UserRepository>,
    tenant_repository: Arc<dyn TenantRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        user_repository: Arc<dyn UserRepository>,
        tenant_repository: Arc<dyn TenantRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            authorization_service,
            user_repository,
            tenant_repository,
            password_hasher,
        }
    }

    /// Registers a new account.
    ///
    /// Every self-registered user becomes the tenant administrator of a
    /// fresh tenant.
    pub async fn register(&self, params: RegisterParams) -> AppResult<UserRecord> {
        let name = NonEmptyString::new(params.name)?;
        let email = EmailAddress::new(&params.email)?;
        validate_password(&params.password)?;

        if self
            .user_repository
            .find_by_email(email.as_str())
            .await?
            .is_some()
        {
            // Hash anyway so response timing does not reveal the account.
            let _ = self.password_hasher.hash_password(&params.password);
            return Err(AppError::Conflict("email is already registered".to_owned()));
        }

        let password_hash = self.password_hasher.hash_password(&params.password)?;
        let tenant_id = self
            .tenant_repository
            .create(&format!("{} Workspace", name.as_str()))
            .await?;

        self.user_repository
            .create(NewUser {
                name: name.into(),
                email: email.into(),
                password_hash,
                role: Role::TenantAdmin,
                tenant_id,
            })
            .await
    }

    /// Authenticates a user with email and password.
    ///
    /// Unknown email and wrong password produce the same generic error to
    /// prevent account enumeration. Locked accounts never authenticate.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<UserRecord> {
        let Some(user) = self.user_repository.find_by_email(email).await? else {
            // Hash anyway to keep unknown-email timing in line with the rest.
            let _ = self.password_hasher.hash_password(password);
            return Err(AppError::Unauthorized(
                "invalid email or password".to_owned(),
            ));
        };

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            return Err(AppError::Unauthorized(
                "invalid email or password".to_owned(),
            ));
        }

        if user.is_locked {
            return Err(AppError::Unauthorized("account is locked".to_owned()));
        }

        Ok(user)
    }

    /// Resolves the authenticated identity for a session user id.
    ///
    /// Reads the user row fresh so role changes and account locks apply on
    /// the next request, not at next login.
    pub async fn resolve_identity(&self, user_id: UserId) -> AppResult<Option<CallerIdentity>> {
        Ok(self
            .user_repository
            .find_by_id(user_id)
            .await?
            .map(|user| CallerIdentity::new(user.id, user.role, user.tenant_id, user.is_locked)))
    }

    /// Returns a user record by id, if it exists.
    pub async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        self.user_repository.find_by_id(user_id).await
    }

    /// Lists users visible to the caller.
    ///
    /// System administrators see every user; tenant administrators see their
    /// own tenant; everyone else is denied.
    pub async fn list_users(&self, identity: &CallerIdentity) -> AppResult<Vec<UserRecord>> {
        self.authorization_service
            .require_permission(
                identity,
                Permission::TenantViewAll,
                Scope::tenant(identity.tenant_id()),
            )
            .await?;

        if identity.is_system_admin() {
            return self.user_repository.list_all().await;
        }

        self.user_repository
            .list_by_tenant(identity.tenant_id())
            .await
    }

    /// Provisions a user on behalf of an administrator.
    ///
    /// A system administrator provisions into a fresh tenant and may assign
    /// any role except system administrator; a tenant administrator
    /// provisions into their own tenant and may not assign administrator
    /// roles.
    pub async fn create_user(
        &self,
        identity: &CallerIdentity,
        params: CreateUserParams,
    ) -> AppResult<UserRecord> {
        self.authorization_service
            .require_permission(
                identity,
                Permission::TenantUserInvite,
                Scope::tenant(identity.tenant_id()),
            )
            .await?;

        let provisionable: &[Role] = if identity.is_system_admin() {
            SYSTEM_PROVISIONABLE_ROLES
        } else {
            TENANT_PROVISIONABLE_ROLES
        };

        if !provisionable.contains(&params.role) {
            return Err(AppError::Forbidden(format!(
                "cannot provision role '{}'",
                params.role.as_str()
            )));
        }

        let name = NonEmptyString::new(params.name)?;
        let email = EmailAddress::new(&params.email)?;
        validate_password(&params.password)?;

        if self
            .user_repository
            .find_by_email(email.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("email is already registered".to_owned()));
        }

        let tenant_id = if identity.is_system_admin() {
            self.tenant_repository
                .create(&format!("{} Workspace", name.as_str()))
                .await?
        } else {
            identity.tenant_id()
        };

        let password_hash = self.password_hasher.hash_password(&params.password)?;

        self.user_repository
            .create(NewUser {
                name: name.into(),
                email: email.into(),
                password_hash,
                role: params.role,
                tenant_id,
            })
            .await
    }

    /// Deletes a user and cascades their memberships and task assignments.
    ///
    /// Cross-tenant targets read as missing for tenant administrators so the
    /// response does not reveal that the user exists.
    pub async fn delete_user(&self, identity: &CallerIdentity, user_id: UserId) -> AppResult<()> {
        if user_id == identity.user_id() {
            return Err(AppError::Validation(
                "cannot delete your own account".to_owned(),
            ));
        }

        self.authorization_service
            .require_permission(
                identity,
                Permission::TenantUserRemove,
                Scope::tenant(identity.tenant_id()),
            )
            .await?;

        let Some(target) = self.user_repository.find_by_id(user_id).await? else {
            return Err(AppError::NotFound("user not found".to_owned()));
        };

        if !identity.is_system_admin() {
            if target.tenant_id != identity.tenant_id() {
                return Err(AppError::NotFound("user not found".to_owned()));
            }

            if target.role == Role::SystemAdmin {
                return Err(AppError::Forbidden(
                    "cannot delete a system administrator".to_owned(),
                ));
            }
        }

        self.user_repository.delete(target.id).await
    }

    /// Seeds the bootstrap system administrator if it does not exist.
    ///
    /// Idempotent; intended to run once at process start. The account is
    /// parked on the reserved system tenant.
    pub async fn bootstrap_system_admin(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<UserRecord> {
        let email = EmailAddress::new(email)?;

        if let Some(existing) = self.user_repository.find_by_email(email.as_str()).await? {
            return Ok(existing);
        }

        validate_password(password)?;

        let tenant_id = self.tenant_repository.ensure_system_tenant().await?;
        let password_hash = self.password_hasher.hash_password(password)?;

        self.user_repository
            .create(NewUser {
                name: "System Administrator".to_owned(),
                email: email.into(),
                password_hash,
                role: Role::SystemAdmin,
                tenant_id,
            })
            .await
    }
}
