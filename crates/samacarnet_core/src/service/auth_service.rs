//! Tenant-scoped login and bearer-token authentication.
//!
//! # Responsibility
//! - Check tenant state before looking at credentials.
//! - Issue bearer tokens and persist only their SHA-256 hash.
//!
//! # Invariants
//! - Unknown user, inactive user and wrong password are indistinguishable
//!   to callers (`InvalidCredentials`).
//! - A successful login records `last_login_at` and the token in one
//!   transaction.
//! - Events never carry emails, passwords or tokens.

use crate::model::tenant::{Tenant, TenantId, TenantStatus};
use crate::model::user::{RoleName, User, UserId};
use crate::password::{generate_token, hash_token, verify_password};
use crate::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use crate::repo::token_repo::{ApiTokenRepository, SqliteApiTokenRepository};
use crate::repo::user_repo::{role_name, SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default bearer-token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Errors from authentication operations.
#[derive(Debug)]
pub enum AuthError {
    /// Tenant id does not exist or is soft-deleted.
    UnknownTenant(TenantId),
    /// Tenant exists but is `inactive` or `suspended`.
    TenantInactive(TenantId),
    InvalidCredentials,
    /// Bearer token is unknown, expired or owned by a disabled user.
    InvalidToken,
    Repo(RepoError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTenant(id) => write!(f, "unknown tenant: {id}"),
            Self::TenantInactive(id) => write!(f, "tenant is not active: {id}"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::InvalidToken => write!(f, "invalid or expired token"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Public view of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: RoleName,
    pub tenant_id: Option<TenantId>,
}

/// Successful login result. `token` is the only copy of the raw token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: i64,
    pub user: UserSummary,
}

pub struct AuthService<'conn> {
    conn: &'conn Connection,
    token_ttl_ms: i64,
}

impl<'conn> AuthService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_token_ttl(conn, DEFAULT_TOKEN_TTL_MS)
    }

    pub fn with_token_ttl(conn: &'conn Connection, token_ttl_ms: i64) -> Self {
        Self { conn, token_ttl_ms }
    }

    /// Ensures `tenant_id` names a live, active tenant.
    pub fn check_tenant(&self, tenant_id: TenantId) -> Result<Tenant, AuthError> {
        let tenant = SqliteTenantRepository::new(self.conn)
            .get_tenant(tenant_id, false)?
            .ok_or(AuthError::UnknownTenant(tenant_id))?;
        if tenant.status != TenantStatus::Active {
            warn!(
                "event=auth_login module=auth status=error tenant_id={tenant_id} reason=tenant_{}",
                tenant.status
            );
            return Err(AuthError::TenantInactive(tenant_id));
        }
        Ok(tenant)
    }

    /// Authenticates `email`/`password` inside one tenant.
    ///
    /// # Errors
    /// - `UnknownTenant` / `TenantInactive` are checked before credentials.
    /// - `InvalidCredentials` for any credential mismatch.
    pub fn login(
        &self,
        tenant_id: TenantId,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        self.check_tenant(tenant_id)?;

        let users = SqliteUserRepository::new(self.conn);
        let user = match users.find_by_email(Some(tenant_id), email)? {
            Some(user) if user.is_active && verify_password(password, &user.password_hash) => user,
            _ => {
                warn!(
                    "event=auth_login module=auth status=error tenant_id={tenant_id} reason=invalid_credentials"
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        let role = role_name(self.conn, user.role_id)?.ok_or_else(|| {
            AuthError::Repo(RepoError::NotFound {
                entity: "role",
                id: user.role_id,
            })
        })?;

        let now = crate::now_epoch_ms();
        let token = generate_token();
        let expires_at = now.saturating_add(self.token_ttl_ms);

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        SqliteUserRepository::new(&tx).record_login(user.id, now)?;
        SqliteApiTokenRepository::new(&tx).store_token(user.id, &hash_token(&token), expires_at)?;
        tx.commit()?;

        info!(
            "event=auth_login module=auth status=ok tenant_id={tenant_id} user_id={}",
            user.id
        );
        Ok(LoginOutcome {
            token,
            expires_at,
            user: summarize(&user, role),
        })
    }

    /// Resolves a bearer token to its active user.
    pub fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = SqliteApiTokenRepository::new(self.conn)
            .find_active_user(&hash_token(token), crate::now_epoch_ms())?
            .ok_or(AuthError::InvalidToken)?;
        match SqliteUserRepository::new(self.conn).get_user(user_id, false)? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AuthError::InvalidToken),
        }
    }
}

fn summarize(user: &User, role: RoleName) -> UserSummary {
    UserSummary {
        id: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        role,
        tenant_id: user.tenant_id,
    }
}
