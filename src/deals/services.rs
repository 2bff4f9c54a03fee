use rust_decimal::Decimal;
use uuid::Uuid;

use crate::deals::repo::{DealStatus, DealWithCustomer};
use crate::error::ApiError;

/// Gate the reminder dispatch. Returns the recipient address; any failure
/// here must happen before side effects, so a Paid deal or a customer
/// without an email never sends mail or writes a log row.
pub fn reminder_preconditions(deal: &DealWithCustomer) -> Result<String, ApiError> {
    if deal.status == DealStatus::Paid {
        return Err(ApiError::Conflict(
            "This deal has already been paid.".into(),
        ));
    }
    match deal.customer_email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => Ok(email.to_string()),
        _ => Err(ApiError::Validation(
            "This customer does not have an email address saved.".into(),
        )),
    }
}

/// Verification link embedding the deal's unguessable id.
pub fn verification_link(base_url: &str, deal_id: Uuid) -> String {
    format!("{}/verify/{}/", base_url.trim_end_matches('/'), deal_id)
}

pub struct ReminderEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Plain-text and rich variants of the payment reminder.
pub fn reminder_email(
    customer_name: &str,
    description: &str,
    amount: Decimal,
    link: &str,
) -> ReminderEmail {
    let subject = format!("Payment Reminder: {description}");
    let text = format!(
        "Hi {customer_name}, your payment of \u{20b9}{amount} is due. Pay here: {link}"
    );
    let html = format!(
        "<h3>Hi {customer_name},</h3>\
         <p>This is a friendly reminder that your payment of <strong>\u{20b9}{amount}</strong> is due.</p>\
         <p>Please use the secure link below to verify and complete your payment:</p>\
         <p><a href='{link}' style='background-color:#4F46E5; color:white; padding:10px 20px; \
         text-decoration:none; border-radius:5px;'><strong>Click Here to Pay</strong></a></p>"
    );
    ReminderEmail {
        subject,
        text,
        html,
    }
}

/// Case-insensitive, whitespace-trimmed comparison used by the public
/// identity verification flow.
pub fn names_match(submitted: &str, actual: &str) -> bool {
    submitted.trim().to_lowercase() == actual.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use time::macros::date;

    fn deal(status: DealStatus, email: Option<&str>) -> DealWithCustomer {
        DealWithCustomer {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            description: "Logo design".into(),
            amount: Decimal::from_str("500.00").unwrap(),
            due_date: date!(2025 - 01 - 01),
            status,
            created_at: time::OffsetDateTime::now_utc(),
            customer_name: "Jane Doe".into(),
            customer_email: email.map(String::from),
            customer_phone_number: None,
        }
    }

    #[test]
    fn reminder_rejected_for_paid_deal() {
        let err = reminder_preconditions(&deal(DealStatus::Paid, Some("j@x.com"))).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn reminder_rejected_without_customer_email() {
        let err = reminder_preconditions(&deal(DealStatus::Pending, None)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = reminder_preconditions(&deal(DealStatus::Pending, Some("   "))).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn reminder_allowed_for_pending_deal_with_email() {
        let to = reminder_preconditions(&deal(DealStatus::Pending, Some(" j@x.com "))).unwrap();
        assert_eq!(to, "j@x.com");
    }

    #[test]
    fn verification_link_embeds_deal_id() {
        let id = Uuid::new_v4();
        let link = verification_link("https://app.test.local/", id);
        assert_eq!(link, format!("https://app.test.local/verify/{id}/"));
    }

    #[test]
    fn reminder_email_contains_amount_and_link() {
        let amount = Decimal::from_str("500.00").unwrap();
        let email = reminder_email("Jane", "Logo design", amount, "https://x/verify/abc/");
        assert_eq!(email.subject, "Payment Reminder: Logo design");
        assert!(email.text.contains("500.00"));
        assert!(email.text.contains("https://x/verify/abc/"));
        assert!(email.html.contains("Click Here to Pay"));
        assert!(email.html.contains("https://x/verify/abc/"));
    }

    #[test]
    fn name_match_ignores_case_and_whitespace() {
        assert!(names_match("  Jane Doe ", "Jane Doe"));
        assert!(names_match("jane doe", " JANE DOE "));
        assert!(!names_match("Jane D", "Jane Doe"));
    }
}
