use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    customers::{
        dto::{CreateCustomerRequest, CustomerResponse, Pagination, UpdateCustomerRequest},
        repo::{self, Customer},
    },
    error::ApiError,
    profiles::require_owner,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers))
        .route("/customers/:id", get(get_customer))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", post(create_customer))
        .route(
            "/customers/:id",
            axum::routing::put(update_customer).delete(delete_customer),
        )
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        // E.164-like: optional +, 7-15 digits, no leading zero.
        static ref PHONE_RE: Regex = Regex::new(r"^\+?[1-9][0-9]{6,14}$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

fn customer_response(c: Customer) -> CustomerResponse {
    CustomerResponse {
        id: c.id,
        name: c.name,
        email: c.email,
        phone_number: c.phone_number,
        created_at: c.created_at,
    }
}

/// Normalize and validate the optional contact fields shared by create
/// and update payloads.
fn validate_contact(
    name: &str,
    email: Option<String>,
    phone_number: Option<String>,
) -> Result<(String, Option<String>, Option<String>), ApiError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Customer name is required.".into()));
    }

    let email = match email.map(|e| e.trim().to_lowercase()) {
        Some(e) if e.is_empty() => None,
        other => other,
    };
    if let Some(e) = &email {
        if !crate::auth::services::is_valid_email(e) {
            return Err(ApiError::Validation("Invalid customer email address.".into()));
        }
    }

    let phone_number = match phone_number.map(|p| p.trim().to_string()) {
        Some(p) if p.is_empty() => None,
        other => other,
    };
    if let Some(p) = &phone_number {
        if !is_valid_phone(p) {
            return Err(ApiError::Validation(
                "Phone number must be in E.164 format (e.g. +919876543210).".into(),
            ));
        }
    }

    Ok((name, email, phone_number))
}

#[instrument(skip(state))]
pub async fn list_customers(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let customers = repo::list_by_owner(&state.db, owner_id, p.limit, p.offset)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(customers.into_iter().map(customer_response).collect()))
}

#[instrument(skip(state))]
pub async fn get_customer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let customer = repo::get_scoped(&state.db, owner_id, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Customer not found.".into()))?;
    Ok(Json(customer_response(customer)))
}

#[instrument(skip(state, payload))]
pub async fn create_customer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let (name, email, phone_number) =
        validate_contact(&payload.name, payload.email, payload.phone_number)?;

    let customer = repo::create(
        &state.db,
        owner_id,
        &name,
        email.as_deref(),
        phone_number.as_deref(),
    )
    .await
    .map_err(ApiError::Internal)?;

    info!(customer_id = %customer.id, %owner_id, "customer created");
    Ok((StatusCode::CREATED, Json(customer_response(customer))))
}

#[instrument(skip(state, payload))]
pub async fn update_customer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let (name, email, phone_number) =
        validate_contact(&payload.name, payload.email, payload.phone_number)?;

    let customer = repo::update_scoped(
        &state.db,
        owner_id,
        id,
        &name,
        email.as_deref(),
        phone_number.as_deref(),
    )
    .await
    .map_err(ApiError::Internal)?
    .ok_or_else(|| ApiError::NotFound("Customer not found.".into()))?;

    Ok(Json(customer_response(customer)))
}

#[instrument(skip(state))]
pub async fn delete_customer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let deleted = repo::delete_scoped(&state.db, owner_id, id)
        .await
        .map_err(ApiError::Internal)?;
    if !deleted {
        warn!(%owner_id, customer_id = %id, "delete on customer outside subtree");
        return Err(ApiError::NotFound("Customer not found.".into()));
    }
    info!(customer_id = %id, %owner_id, "customer deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_validation_accepts_e164() {
        assert!(is_valid_phone("+919876543210"));
        assert!(is_valid_phone("4915123456789"));
        assert!(!is_valid_phone("0123456"));
        assert!(!is_valid_phone("+1-202-555-0143"));
        assert!(!is_valid_phone("12345"));
    }

    #[test]
    fn contact_validation_requires_name() {
        let err = validate_contact("   ", None, None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn contact_validation_normalizes_blank_fields_to_none() {
        let (name, email, phone) = validate_contact(
            " Bob ",
            Some("  ".into()),
            Some(String::new()),
        )
        .unwrap();
        assert_eq!(name, "Bob");
        assert!(email.is_none());
        assert!(phone.is_none());
    }

    #[test]
    fn contact_validation_lowercases_email() {
        let (_, email, _) =
            validate_contact("Bob", Some(" Bob@Example.COM ".into()), None).unwrap();
        assert_eq!(email.as_deref(), Some("bob@example.com"));
    }

    #[test]
    fn contact_validation_rejects_bad_email_and_phone() {
        assert!(validate_contact("Bob", Some("nope".into()), None).is_err());
        assert!(validate_contact("Bob", None, Some("call-me".into())).is_err());
    }
}
