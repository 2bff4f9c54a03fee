use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The owner-facing view of a business profile.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub full_name: String,
    pub business_name: String,
    pub upi_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub upi_id: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Partial update; omitted fields keep their current values.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
