//! First-run administrator account.
//!
//! When no active admin exists and `BOOTSTRAP_ADMIN_USERNAME`,
//! `BOOTSTRAP_ADMIN_EMAIL` and `BOOTSTRAP_ADMIN_PASSWORD` are all set, an
//! admin account is created at startup. Otherwise nothing happens.

use spmc_core::roles::Role;
use spmc_core::types::DbId;
use spmc_db::models::user::CreateUser;
use spmc_db::repositories::UserRepo;
use spmc_db::DbPool;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};

/// Credentials for the bootstrap administrator.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdmin {
    /// `None` unless all three variables are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Some(Self {
            username: var("BOOTSTRAP_ADMIN_USERNAME")?,
            email: var("BOOTSTRAP_ADMIN_EMAIL")?,
            password: var("BOOTSTRAP_ADMIN_PASSWORD")?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bootstrap password rejected: {0}")]
    WeakPassword(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Create the admin account unless an active admin is already present.
///
/// Returns the new user's id, or `None` when nothing was created.
pub async fn ensure_admin(
    pool: &DbPool,
    admin: &BootstrapAdmin,
) -> Result<Option<DbId>, BootstrapError> {
    if UserRepo::admin_exists(pool).await? {
        return Ok(None);
    }

    validate_password_strength(&admin.password, MIN_PASSWORD_LENGTH)
        .map_err(BootstrapError::WeakPassword)?;
    let password_hash =
        hash_password(&admin.password).map_err(|e| BootstrapError::Hashing(e.to_string()))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            role: Role::Admin,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "Bootstrap admin created");
    Ok(Some(user.id))
}
