use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use anyhow::anyhow;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        repo::{unique_violation_field, User},
        services::is_valid_email,
        AuthUser,
    },
    error::ApiError,
    profiles::{
        dto::{AccountResponse, ProfileResponse, UpdateAccountRequest, UpdateProfileRequest},
        repo::Profile,
    },
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/user/profile", get(get_account).put(update_account))
}

fn profile_response(p: Profile) -> ProfileResponse {
    ProfileResponse {
        full_name: p.full_name,
        business_name: p.business_name,
        upi_id: p.upi_id,
    }
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = Profile::find_by_user(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| {
            // Provisioned at registration; absence means the principal is stale.
            error!(%user_id, "profile missing for authenticated user");
            ApiError::Internal(anyhow!("profile missing for user {user_id}"))
        })?;
    Ok(Json(profile_response(profile)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = Profile::update_by_user(
        &state.db,
        user_id,
        payload.full_name.trim(),
        payload.business_name.trim(),
        payload.upi_id.trim(),
    )
    .await
    .map_err(ApiError::Internal)?
    .ok_or_else(|| {
        error!(%user_id, "profile missing for authenticated user");
        ApiError::Internal(anyhow!("profile missing for user {user_id}"))
    })?;

    info!(%user_id, "profile updated");
    Ok(Json(profile_response(profile)))
}

fn account_response(u: &User) -> AccountResponse {
    AccountResponse {
        id: u.id,
        username: u.username.clone(),
        email: u.email.clone(),
        first_name: u.first_name.clone(),
        last_name: u.last_name.clone(),
    }
}

#[instrument(skip(state))]
pub async fn get_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::Authentication)?;
    Ok(Json(account_response(&user)))
}

#[instrument(skip(state, payload))]
pub async fn update_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let current = User::find_by_id(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::Authentication)?;

    let username = payload
        .username
        .map(|u| u.trim().to_string())
        .unwrap_or(current.username);
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .unwrap_or(current.email);
    let first_name = payload.first_name.unwrap_or(current.first_name);
    let last_name = payload.last_name.unwrap_or(current.last_name);

    if username.is_empty() {
        return Err(ApiError::Validation("Username is required.".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email address.".into()));
    }

    let user = match User::update_account(
        &state.db,
        user_id,
        &username,
        &email,
        &first_name,
        &last_name,
    )
    .await
    {
        Ok(u) => u,
        Err(e) => {
            return Err(match unique_violation_field(&e) {
                Some("username") => {
                    ApiError::Validation("This username is already taken.".into())
                }
                Some("email") => {
                    ApiError::Validation("An account with this email already exists.".into())
                }
                _ => {
                    error!(error = %e, "update account failed");
                    ApiError::Internal(e.into())
                }
            });
        }
    };

    info!(%user_id, "account updated");
    Ok(Json(account_response(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_response_serializes_owner_fields() {
        let json = serde_json::to_string(&profile_response(Profile {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            full_name: "Jane Doe".into(),
            business_name: "Jane Studios".into(),
            upi_id: "jane@upi".into(),
        }))
        .unwrap();
        assert!(json.contains("Jane Studios"));
        assert!(json.contains("jane@upi"));
        // Internal ids stay internal.
        assert!(!json.contains("user_id"));
    }
}
