use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, PublicUser, RefreshRequest, RegisterRequest, RegisterResponse,
            TokenPairResponse,
        },
        repo::{unique_violation_field, User},
        services::{hash_password, is_valid_email, verify_password, JwtKeys},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh))
}

fn public_user(user: &User) -> PublicUser {
    PublicUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

fn sign_pair(keys: &JwtKeys, user_id: uuid::Uuid) -> Result<(String, String), ApiError> {
    let access = keys.sign_access(user_id).map_err(ApiError::Internal)?;
    let refresh = keys.sign_refresh(user_id).map_err(ApiError::Internal)?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty() {
        return Err(ApiError::Validation("Username is required.".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email address.".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short.".into()));
    }

    // Field-specific uniqueness messages; the DB constraints remain the
    // authority if two registrations race past these checks.
    if User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        warn!(username = %payload.username, "username already taken");
        return Err(ApiError::Validation(
            "This username is already taken.".into(),
        ));
    }
    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Validation(
            "An account with this email already exists.".into(),
        ));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;

    let user = match User::create_with_profile(
        &state.db,
        &payload.username,
        &payload.email,
        &payload.first_name,
        &payload.last_name,
        &hash,
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
                    error!(error = %e, "create user failed");
                    ApiError::Internal(e.into())
                }
            });
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let (access, refresh) = sign_pair(&keys, user.id)?;

    info!(user_id = %user.id, username = %user.username, "owner registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: public_user(&user),
            refresh,
            access,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    payload.username = payload.username.trim().to_string();

    // Username first, then the identifier re-tried as an email. Every
    // failure path collapses into the same generic 401 so the response
    // never distinguishes unknown accounts from wrong passwords.
    let mut user = User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(ApiError::Internal)?;
    if user.is_none() {
        user = User::find_by_email(&state.db, &payload.username.to_lowercase())
            .await
            .map_err(ApiError::Internal)?;
    }
    let user = match user {
        Some(u) => u,
        None => {
            warn!(identifier = %payload.username, "login unknown identifier");
            return Err(ApiError::Authentication);
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(ApiError::Internal)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Authentication);
    }

    User::touch_last_login(&state.db, user.id)
        .await
        .map_err(ApiError::Internal)?;

    let keys = JwtKeys::from_ref(&state);
    let (access, refresh) = sign_pair(&keys, user.id)?;

    info!(user_id = %user.id, username = %user.username, "owner logged in");
    Ok(Json(TokenPairResponse { access, refresh }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh)
        .map_err(|_| ApiError::Authentication)?;

    // The subject must still exist; tokens outlive account deletion.
    if User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::Authentication);
    }

    let (access, refresh) = sign_pair(&keys, claims.sub)?;
    Ok(Json(TokenPairResponse { access, refresh }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_never_serializes_password_hash() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "$argon2id$secret".into(),
            last_login: None,
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&public_user(&user)).unwrap();
        assert!(json.contains("alice@x.com"));
        assert!(!json.contains("argon2id"));

        // The row type itself also skips the hash.
        let row_json = serde_json::to_string(&user).unwrap();
        assert!(!row_json.contains("password_hash"));
    }

    #[test]
    fn token_pair_uses_access_and_refresh_keys() {
        let json = serde_json::to_string(&TokenPairResponse {
            access: "a".into(),
            refresh: "r".into(),
        })
        .unwrap();
        assert!(json.contains("\"access\""));
        assert!(json.contains("\"refresh\""));
    }
}
