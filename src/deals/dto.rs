use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::deals::repo::{DealStatus, DealWithCustomer};

/// Customer details nested inside a deal, read-only.
#[derive(Debug, Serialize)]
pub struct DealCustomer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DealResponse {
    pub id: Uuid,
    pub customer: DealCustomer,
    pub description: String,
    pub amount: Decimal,
    pub due_date: Date,
    pub status: DealStatus,
    pub created_at: OffsetDateTime,
}

impl From<DealWithCustomer> for DealResponse {
    fn from(d: DealWithCustomer) -> Self {
        Self {
            id: d.id,
            customer: DealCustomer {
                id: d.customer_id,
                name: d.customer_name,
                email: d.customer_email,
                phone_number: d.customer_phone_number,
            },
            description: d.description,
            amount: d.amount,
            due_date: d.due_date,
            status: d.status,
            created_at: d.created_at,
        }
    }
}

/// `customer_id` is write-only: it selects one of the requester's own
/// customers and never appears in responses.
#[derive(Debug, Deserialize)]
pub struct CreateDealRequest {
    pub customer_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub due_date: Date,
}

/// Amount is immutable after creation and status only moves through the
/// payment flow, so updates carry neither.
#[derive(Debug, Deserialize)]
pub struct UpdateDealRequest {
    pub description: Option<String>,
    pub due_date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub success: bool,
    pub message: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use time::macros::date;

    fn sample() -> DealResponse {
        DealResponse {
            id: Uuid::new_v4(),
            customer: DealCustomer {
                id: Uuid::new_v4(),
                name: "Bob".into(),
                email: Some("bob@example.com".into()),
                phone_number: None,
            },
            description: "Logo".into(),
            amount: Decimal::from_str("500.00").unwrap(),
            due_date: date!(2025 - 01 - 01),
            status: DealStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn amount_serializes_with_two_decimal_places() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"500.00\""));
    }

    #[test]
    fn status_and_nested_customer_serialize() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"Pending\""));
        assert!(json.contains("\"bob@example.com\""));
        assert!(json.contains("\"2025-01-01\""));
    }
}
