use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Customer record; every query below is filtered by the owning profile,
/// so a row outside the requester's subtree is indistinguishable from a
/// missing one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: OffsetDateTime,
}

pub async fn list_by_owner(
    db: &PgPool,
    owner_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Customer>> {
    let rows = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, owner_id, name, email, phone_number, created_at
        FROM customers
        WHERE owner_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(owner_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_scoped(
    db: &PgPool,
    owner_id: Uuid,
    customer_id: Uuid,
) -> anyhow::Result<Option<Customer>> {
    let row = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, owner_id, name, email, phone_number, created_at
        FROM customers
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(customer_id)
    .bind(owner_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    owner_id: Uuid,
    name: &str,
    email: Option<&str>,
    phone_number: Option<&str>,
) -> anyhow::Result<Customer> {
    let row = sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (owner_id, name, email, phone_number)
        VALUES ($1, $2, $3, $4)
        RETURNING id, owner_id, name, email, phone_number, created_at
        "#,
    )
    .bind(owner_id)
    .bind(name)
    .bind(email)
    .bind(phone_number)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_scoped(
    db: &PgPool,
    owner_id: Uuid,
    customer_id: Uuid,
    name: &str,
    email: Option<&str>,
    phone_number: Option<&str>,
) -> anyhow::Result<Option<Customer>> {
    let row = sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers
        SET name = $3, email = $4, phone_number = $5
        WHERE id = $1 AND owner_id = $2
        RETURNING id, owner_id, name, email, phone_number, created_at
        "#,
    )
    .bind(customer_id)
    .bind(owner_id)
    .bind(name)
    .bind(email)
    .bind(phone_number)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Delete cascades to the customer's deals and their reminder logs.
pub async fn delete_scoped(db: &PgPool, owner_id: Uuid, customer_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND owner_id = $2")
        .bind(customer_id)
        .bind(owner_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
