use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    deals::{
        dto::{CreateDealRequest, DealResponse, Pagination, ReminderResponse, UpdateDealRequest},
        repo,
        services::{reminder_email, reminder_preconditions, verification_link},
    },
    error::ApiError,
    profiles::require_owner,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/deals", get(list_deals))
        .route("/deals/:id", get(get_deal))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/deals", post(create_deal))
        .route(
            "/deals/:id",
            axum::routing::put(update_deal).delete(delete_deal),
        )
        .route("/deals/:id/send_reminder", post(send_reminder))
}

#[instrument(skip(state))]
pub async fn list_deals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<DealResponse>>, ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let deals = repo::list_by_owner(&state.db, owner_id, p.limit, p.offset)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(deals.into_iter().map(DealResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_deal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DealResponse>, ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let deal = repo::get_scoped(&state.db, owner_id, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Deal not found.".into()))?;
    Ok(Json(DealResponse::from(deal)))
}

#[instrument(skip(state, payload))]
pub async fn create_deal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<DealResponse>), ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;

    let description = payload.description.trim().to_string();
    if description.is_empty() {
        return Err(ApiError::Validation("Description is required.".into()));
    }
    if payload.amount.is_sign_negative() || payload.amount.is_zero() {
        return Err(ApiError::Validation("Amount must be positive.".into()));
    }

    let deal = repo::create_scoped(
        &state.db,
        owner_id,
        payload.customer_id,
        &description,
        payload.amount,
        payload.due_date,
    )
    .await
    .map_err(ApiError::Internal)?
    .ok_or_else(|| {
        // The customer id did not resolve inside the requester's subtree.
        warn!(%owner_id, customer_id = %payload.customer_id, "deal create against foreign customer");
        ApiError::NotFound("Customer not found.".into())
    })?;

    info!(deal_id = %deal.id, %owner_id, "deal created");
    Ok((StatusCode::CREATED, Json(DealResponse::from(deal))))
}

#[instrument(skip(state, payload))]
pub async fn update_deal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDealRequest>,
) -> Result<Json<DealResponse>, ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let current = repo::get_scoped(&state.db, owner_id, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Deal not found.".into()))?;

    let description = match payload.description {
        Some(d) => {
            let d = d.trim().to_string();
            if d.is_empty() {
                return Err(ApiError::Validation("Description is required.".into()));
            }
            d
        }
        None => current.description.clone(),
    };
    let due_date = payload.due_date.unwrap_or(current.due_date);

    let deal = repo::update_scoped(&state.db, owner_id, id, &description, due_date)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Deal not found.".into()))?;

    Ok(Json(DealResponse::from(deal)))
}

#[instrument(skip(state))]
pub async fn delete_deal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let deleted = repo::delete_scoped(&state.db, owner_id, id)
        .await
        .map_err(ApiError::Internal)?;
    if !deleted {
        return Err(ApiError::NotFound("Deal not found.".into()));
    }
    info!(deal_id = %id, %owner_id, "deal deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Owner-triggered reminder: emails the customer a verification link and
/// appends an audit row. The log write happens strictly after the
/// transport confirms the send; a failed send leaves no trace.
#[instrument(skip(state))]
pub async fn send_reminder(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReminderResponse>, ApiError> {
    let owner_id = require_owner(&state.db, user_id).await?;
    let deal = repo::get_scoped(&state.db, owner_id, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Deal not found.".into()))?;

    let to = reminder_preconditions(&deal)?;

    let link = verification_link(&state.config.frontend_base_url, deal.id);
    let email = reminder_email(&deal.customer_name, &deal.description, deal.amount, &link);

    if let Err(e) = state
        .mailer
        .send(&to, &email.subject, &email.text, Some(&email.html))
        .await
    {
        error!(error = %e, deal_id = %deal.id, "reminder email send failed");
        return Err(ApiError::Transport(e.to_string()));
    }

    repo::insert_reminder_log(&state.db, deal.id, "Email")
        .await
        .map_err(ApiError::Internal)?;

    info!(deal_id = %deal.id, %owner_id, "reminder sent");
    Ok(Json(ReminderResponse {
        success: true,
        message: "Reminder email sent successfully!".into(),
        link,
    }))
}
