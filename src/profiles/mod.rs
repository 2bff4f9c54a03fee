use crate::error::ApiError;
use crate::state::AppState;
use axum::Router;
use sqlx::PgPool;
use uuid::Uuid;

mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::profile_routes())
}

/// Resolve the authenticated principal to its owner profile id. Every
/// owner-scoped endpoint goes through this before touching tenant data.
pub async fn require_owner(db: &PgPool, user_id: Uuid) -> Result<Uuid, ApiError> {
    let profile_id = repo::Profile::id_for_user(db, user_id)
        .await
        .map_err(ApiError::Internal)?;
    owner_or_error(profile_id, user_id)
}

/// Profiles are provisioned inside the registration transaction, so an
/// authenticated user without one is a broken invariant, not a denial.
fn owner_or_error(profile_id: Option<Uuid>, user_id: Uuid) -> Result<Uuid, ApiError> {
    profile_id.ok_or_else(|| {
        tracing::error!(%user_id, "profile missing for authenticated user");
        ApiError::Internal(anyhow::anyhow!("profile missing for user {user_id}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn missing_profile_is_an_internal_error_not_a_denial() {
        let err = owner_or_error(None, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn present_profile_resolves_to_its_id() {
        let profile_id = Uuid::new_v4();
        let resolved = owner_or_error(Some(profile_id), Uuid::new_v4()).unwrap();
        assert_eq!(resolved, profile_id);
    }
}
