use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::services::is_valid_email,
    deals::{
        dto::DealResponse,
        repo::{self, PaymentOutcome},
        services::names_match,
    },
    error::ApiError,
    public::dto::{ContactRequest, ContactResponse, PayResponse, VerifyRequest, VerifyResponse},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/verify/:deal_id", post(verify_identity))
        .route("/pay/:deal_id", post(simulate_payment))
        .route("/contact", post(contact))
}

/// Deal ids arrive as opaque path segments; anything that does not parse
/// as a UUID cannot name a deal, so it gets the same not-found envelope
/// as an unknown link rather than a bare framework rejection.
fn parse_deal_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::NotFound("Invalid invoice link.".into()))
}

/// Capability-based access: the unguessable deal id in the path is the
/// only credential. The claimed name is compared to the customer on file
/// before any deal details are disclosed.
#[instrument(skip(state, payload))]
pub async fn verify_identity(
    State(state): State<AppState>,
    Path(deal_id): Path<String>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let deal_id = parse_deal_id(&deal_id)?;
    let deal = repo::get_public(&state.db, deal_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Invalid invoice link.".into()))?;

    if !names_match(&payload.full_name, &deal.customer_name) {
        warn!(%deal_id, "verification name mismatch");
        return Err(ApiError::Validation("Name does not match.".into()));
    }

    Ok(Json(VerifyResponse {
        success: true,
        deal: DealResponse::from(deal),
    }))
}

#[instrument(skip(state))]
pub async fn simulate_payment(
    State(state): State<AppState>,
    Path(deal_id): Path<String>,
) -> Result<Json<PayResponse>, ApiError> {
    let deal_id = parse_deal_id(&deal_id)?;
    match repo::mark_paid(&state.db, deal_id)
        .await
        .map_err(ApiError::Internal)?
    {
        PaymentOutcome::Paid => {
            info!(%deal_id, "deal paid");
            Ok(Json(PayResponse {
                success: true,
                message: "Payment successful! Thank you.".into(),
            }))
        }
        PaymentOutcome::AlreadyPaid => Err(ApiError::Conflict(
            "This deal has already been paid.".into(),
        )),
        PaymentOutcome::NotFound => Err(ApiError::NotFound("Invalid invoice link.".into())),
    }
}

/// Subject and body of the operator notification for a contact-form
/// submission.
pub(crate) fn contact_email(
    name: &str,
    email: &str,
    subject: &str,
    message: &str,
) -> (String, String) {
    let mail_subject = format!("New Contact Form Submission: {subject}");
    let body = format!(
        "New contact form submission received:\n\n\
         Name: {name}\n\
         Email: {email}\n\
         Subject: {subject}\n\n\
         Message:\n{message}\n\n\
         ---\n\
         This message was sent from the BizPulse contact form.\n"
    );
    (mail_subject, body)
}

#[instrument(skip(state, payload))]
pub async fn contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    let subject = payload.subject.trim();
    let message = payload.message.trim();

    if name.is_empty() || email.is_empty() || subject.is_empty() || message.is_empty() {
        return Err(ApiError::Validation("All fields are required.".into()));
    }
    if !is_valid_email(email) {
        return Err(ApiError::Validation(
            "Please enter a valid email address.".into(),
        ));
    }

    let (mail_subject, body) = contact_email(name, email, subject, message);
    if let Err(e) = state
        .mailer
        .send(&state.config.admin_email, &mail_subject, &body, None)
        .await
    {
        error!(error = %e, "contact form email send failed");
        return Err(ApiError::Transport(
            "Failed to send message. Please try again later.".into(),
        ));
    }

    Ok(Json(ContactResponse {
        success: true,
        message: "Thank you for your message! We'll get back to you soon.".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_deal_ids_get_the_not_found_envelope() {
        for raw in ["not-a-uuid", "", "12345", "deadbeef"] {
            let err = parse_deal_id(raw).unwrap_err();
            assert!(matches!(err, ApiError::NotFound(_)));
            assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn well_formed_deal_ids_parse_even_with_whitespace() {
        let id = Uuid::new_v4();
        assert_eq!(parse_deal_id(&id.to_string()).unwrap(), id);
        assert_eq!(parse_deal_id(&format!(" {id} ")).unwrap(), id);
    }

    #[test]
    fn contact_email_carries_sender_details() {
        let (subject, body) = contact_email(
            "Jane",
            "jane@example.com",
            "Pricing",
            "How much for a yearly plan?",
        );
        assert_eq!(subject, "New Contact Form Submission: Pricing");
        assert!(body.contains("Name: Jane"));
        assert!(body.contains("Email: jane@example.com"));
        assert!(body.contains("How much for a yearly plan?"));
    }
}
