//! Request extractors for caller identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use skinny_core::error::CoreError;
use skinny_db::models::profile::Profile;
use skinny_db::repositories::ProfileRepo;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the external commerce platform's user id.
pub const PLATFORM_USER_HEADER: &str = "x-platform-user-id";

/// The calling user's profile, resolved from the platform user header.
///
/// Use this as an extractor parameter in any handler that acts on behalf
/// of an end user:
///
/// ```ignore
/// async fn my_handler(CurrentUser(profile): CurrentUser) -> AppResult<Json<()>> {
///     tracing::info!(profile_id = profile.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Profile);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let platform_user_id = parts
            .headers
            .get(PLATFORM_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(format!(
                    "Missing {PLATFORM_USER_HEADER} header"
                )))
            })?;

        let profile = ProfileRepo::find_by_platform_user_id(&state.pool, platform_user_id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Unknown platform user".into()))
            })?;

        Ok(CurrentUser(profile))
    }
}

/// Marker extractor guarding the admin surface with the configured
/// bearer token. Admin routes are disabled when no token is configured.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin_token.as_deref() else {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin API is not configured".into(),
            )));
        };

        let provided = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing admin bearer token".into(),
                ))
            })?;

        if provided != expected {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid admin token".into(),
            )));
        }

        Ok(RequireAdmin)
    }
}
