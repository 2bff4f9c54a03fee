use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Business owner profile row; the tenant boundary for all scoped data.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub business_name: String,
    pub upi_id: String,
}

impl Profile {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, user_id, full_name, business_name, upi_id
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    /// Resolve the requester's profile id. Every owner-scoped query starts
    /// here; profiles are provisioned at registration, so a missing row
    /// means the principal is stale, not that the resource is absent.
    pub async fn id_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
        Ok(id)
    }

    pub async fn update_by_user(
        db: &PgPool,
        user_id: Uuid,
        full_name: &str,
        business_name: &str,
        upi_id: &str,
    ) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET full_name = $2, business_name = $3, upi_id = $4
            WHERE user_id = $1
            RETURNING id, user_id, full_name, business_name, upi_id
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(business_name)
        .bind(upi_id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }
}
