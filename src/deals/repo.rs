use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Deal status lifecycle: Pending is initial, Paid is terminal. The only
/// transition is Pending -> Paid, performed by `mark_paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum DealStatus {
    Pending,
    Paid,
}

/// Deal row joined with its customer; the join is also how every
/// owner-scoped query walks the ownership chain up to the profile.
#[derive(Debug, Clone, FromRow)]
pub struct DealWithCustomer {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub due_date: Date,
    pub status: DealStatus,
    pub created_at: OffsetDateTime,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone_number: Option<String>,
}

const DEAL_COLUMNS: &str = r#"
    d.id, d.customer_id, d.description, d.amount, d.due_date, d.status, d.created_at,
    c.name AS customer_name, c.email AS customer_email, c.phone_number AS customer_phone_number
"#;

pub async fn list_by_owner(
    db: &PgPool,
    owner_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<DealWithCustomer>> {
    let rows = sqlx::query_as::<_, DealWithCustomer>(&format!(
        r#"
        SELECT {DEAL_COLUMNS}
        FROM deals d
        JOIN customers c ON c.id = d.customer_id
        WHERE c.owner_id = $1
        ORDER BY d.created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
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
    deal_id: Uuid,
) -> anyhow::Result<Option<DealWithCustomer>> {
    let row = sqlx::query_as::<_, DealWithCustomer>(&format!(
        r#"
        SELECT {DEAL_COLUMNS}
        FROM deals d
        JOIN customers c ON c.id = d.customer_id
        WHERE d.id = $1 AND c.owner_id = $2
        "#
    ))
    .bind(deal_id)
    .bind(owner_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Unscoped lookup for the public verification/payment flow: the random
/// deal id is the capability, so no owner filter applies here.
pub async fn get_public(db: &PgPool, deal_id: Uuid) -> anyhow::Result<Option<DealWithCustomer>> {
    let row = sqlx::query_as::<_, DealWithCustomer>(&format!(
        r#"
        SELECT {DEAL_COLUMNS}
        FROM deals d
        JOIN customers c ON c.id = d.customer_id
        WHERE d.id = $1
        "#
    ))
    .bind(deal_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Insert a deal against one of the owner's customers. Returns `None`
/// when the customer is outside the requester's subtree; the id is a
/// fresh random v4 since it doubles as the public payment-link token.
pub async fn create_scoped(
    db: &PgPool,
    owner_id: Uuid,
    customer_id: Uuid,
    description: &str,
    amount: Decimal,
    due_date: Date,
) -> anyhow::Result<Option<DealWithCustomer>> {
    let owned = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM customers WHERE id = $1 AND owner_id = $2",
    )
    .bind(customer_id)
    .bind(owner_id)
    .fetch_optional(db)
    .await?;
    if owned.is_none() {
        return Ok(None);
    }

    let deal_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO deals (id, customer_id, description, amount, due_date)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(deal_id)
    .bind(customer_id)
    .bind(description)
    .bind(amount)
    .bind(due_date)
    .execute(db)
    .await?;

    get_public(db, deal_id).await
}

pub async fn update_scoped(
    db: &PgPool,
    owner_id: Uuid,
    deal_id: Uuid,
    description: &str,
    due_date: Date,
) -> anyhow::Result<Option<DealWithCustomer>> {
    let result = sqlx::query(
        r#"
        UPDATE deals d
        SET description = $3, due_date = $4
        FROM customers c
        WHERE d.id = $1 AND c.id = d.customer_id AND c.owner_id = $2
        "#,
    )
    .bind(deal_id)
    .bind(owner_id)
    .bind(description)
    .bind(due_date)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_scoped(db, owner_id, deal_id).await
}

pub async fn delete_scoped(db: &PgPool, owner_id: Uuid, deal_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM deals d
        USING customers c
        WHERE d.id = $1 AND c.id = d.customer_id AND c.owner_id = $2
        "#,
    )
    .bind(deal_id)
    .bind(owner_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid,
    AlreadyPaid,
    NotFound,
}

/// Distinguish the two reasons the compare-and-set can touch zero rows.
pub(crate) fn disambiguate_payment(updated: bool, exists: bool) -> PaymentOutcome {
    match (updated, exists) {
        (true, _) => PaymentOutcome::Paid,
        (false, true) => PaymentOutcome::AlreadyPaid,
        (false, false) => PaymentOutcome::NotFound,
    }
}

/// Atomic Pending -> Paid transition. The status check and the write are
/// one statement, so two concurrent calls can never both observe Pending
/// and both report success.
pub async fn mark_paid(db: &PgPool, deal_id: Uuid) -> anyhow::Result<PaymentOutcome> {
    let result = sqlx::query("UPDATE deals SET status = 'Paid' WHERE id = $1 AND status = 'Pending'")
        .bind(deal_id)
        .execute(db)
        .await?;
    let updated = result.rows_affected() > 0;

    let exists = if updated {
        true
    } else {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM deals WHERE id = $1)")
            .bind(deal_id)
            .fetch_one(db)
            .await?
    };

    Ok(disambiguate_payment(updated, exists))
}

/// Append-only audit record of a dispatched reminder. Written only after
/// the mail transport has confirmed the send.
pub async fn insert_reminder_log(db: &PgPool, deal_id: Uuid, method: &str) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO reminder_logs (deal_id, method) VALUES ($1, $2)")
        .bind(deal_id)
        .bind(method)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_disambiguation_covers_all_outcomes() {
        assert_eq!(disambiguate_payment(true, true), PaymentOutcome::Paid);
        assert_eq!(disambiguate_payment(false, true), PaymentOutcome::AlreadyPaid);
        assert_eq!(disambiguate_payment(false, false), PaymentOutcome::NotFound);
    }

    #[test]
    fn second_payment_is_a_failed_noop_not_a_success() {
        // First call wins the CAS, second finds zero Pending rows but an
        // existing deal: it must report a conflict, never Paid again.
        let first = disambiguate_payment(true, true);
        let second = disambiguate_payment(false, true);
        assert_eq!(first, PaymentOutcome::Paid);
        assert_eq!(second, PaymentOutcome::AlreadyPaid);
    }

    #[test]
    fn status_serializes_verbatim() {
        assert_eq!(serde_json::to_string(&DealStatus::Pending).unwrap(), "\"Pending\"");
        assert_eq!(serde_json::to_string(&DealStatus::Paid).unwrap(), "\"Paid\"");
    }
}
