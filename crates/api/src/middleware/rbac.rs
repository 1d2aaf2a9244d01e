//! Role guards layered on [`AuthUser`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use spmc_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Any signed-in user, admin or classifier.
pub struct RequireAuth(pub AuthUser);

/// Signed-in user holding [`Role::Admin`](spmc_core::roles::Role::Admin).
/// Anyone else gets 403.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        AuthUser::from_request_parts(parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "You do not have permission to perform this action".into(),
            )));
        }
        Ok(Self(user))
    }
}
