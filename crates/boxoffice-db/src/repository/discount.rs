//! # Discount Repository
//!
//! CRUD operations for coupon discounts.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Discount Creation                                  │
//! │                                                                         │
//! │  create(clock)                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  codegen::generate(attempt, now) ── "1-5f3a9c01d2b4e"                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT (UNIQUE index on code)                                         │
//! │       │                                                                 │
//! │       ├── ok ───────────────► Discount with entity defaults            │
//! │       └── UniqueViolation ──► bump attempt, regenerate, retry          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Restriction Columns
//! The three restriction sets are stored as JSON arrays in TEXT columns
//! (`'[]'` = unrestricted). They are opaque identifier lists, never queried
//! by element in SQL, so JSON keeps the schema flat without join tables.

use sqlx::SqlitePool;
use tracing::debug;

use boxoffice_core::clock::Clock;
use boxoffice_core::types::{AppliesTo, Discount, DiscountType};
use boxoffice_core::{codegen, validation};
use chrono::{DateTime, Utc};

use crate::error::{DbError, DbResult};

/// How many generated codes to try before giving up on create.
///
/// A collision needs two codes generated in the same microsecond with the
/// same attempt counter, so more than one retry is already paranoia.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Column list shared by every discount SELECT, in `DiscountRow` order.
pub(crate) const DISCOUNT_COLUMNS: &str = "id, code, title, description, discount_type, \
     applies_to, amount, max_uses, valid_from, valid_till, once_per_email, \
     restricted_ticket_types, restricted_groups, restricted_events, \
     created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw discount row; restriction sets still JSON-encoded.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DiscountRow {
    id: String,
    code: String,
    title: String,
    description: Option<String>,
    discount_type: DiscountType,
    applies_to: AppliesTo,
    amount: i64,
    max_uses: i64,
    valid_from: Option<DateTime<Utc>>,
    valid_till: Option<DateTime<Utc>>,
    once_per_email: bool,
    restricted_ticket_types: String,
    restricted_groups: String,
    restricted_events: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DiscountRow> for Discount {
    type Error = DbError;

    fn try_from(row: DiscountRow) -> DbResult<Discount> {
        let parse_set = |column: &str, raw: &str| -> DbResult<Vec<String>> {
            serde_json::from_str(raw)
                .map_err(|e| DbError::Internal(format!("discount {}.{}: {}", row.id, column, e)))
        };

        Ok(Discount {
            restricted_ticket_types: parse_set(
                "restricted_ticket_types",
                &row.restricted_ticket_types,
            )?,
            restricted_groups: parse_set("restricted_groups", &row.restricted_groups)?,
            restricted_events: parse_set("restricted_events", &row.restricted_events)?,
            id: row.id,
            code: row.code,
            title: row.title,
            description: row.description,
            discount_type: row.discount_type,
            applies_to: row.applies_to,
            amount: row.amount,
            max_uses: row.max_uses,
            valid_from: row.valid_from,
            valid_till: row.valid_till,
            once_per_email: row.once_per_email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn encode_set(column: &'static str, set: &[String]) -> DbResult<String> {
    serde_json::to_string(set)
        .map_err(|e| DbError::Internal(format!("encoding {}: {}", column, e)))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for discount CRUD.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.discounts();
///
/// let mut discount = repo.create(&SystemClock).await?;
/// discount.amount = 500;
/// repo.update(&discount).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Creates a discount with a freshly generated unique code and entity
    /// defaults (title = code, usage cap of one, no restrictions).
    ///
    /// ## Retry
    /// Code uniqueness is enforced by the database index, not the generator.
    /// On a unique violation the attempt counter is bumped and a new code is
    /// generated, up to [`MAX_CODE_ATTEMPTS`] times.
    pub async fn create(&self, clock: &dyn Clock) -> DbResult<Discount> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let now = clock.now();
            let discount = Discount::new(codegen::generate(attempt, now), now);

            match self.insert(&discount).await {
                Ok(()) => {
                    debug!(code = %discount.code, "Created discount");
                    return Ok(discount);
                }
                Err(DbError::UniqueViolation { .. }) => {
                    debug!(attempt, "Generated code collided, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(DbError::Internal(format!(
            "could not generate a unique coupon code in {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }

    /// Inserts a fully-specified discount.
    ///
    /// Validates the configuration first; a duplicate code surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn insert(&self, discount: &Discount) -> DbResult<()> {
        validation::validate_discount(discount)?;

        sqlx::query(
            "INSERT INTO discounts (
                 id, code, title, description, discount_type, applies_to,
                 amount, max_uses, valid_from, valid_till, once_per_email,
                 restricted_ticket_types, restricted_groups, restricted_events,
                 created_at, updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )
        .bind(&discount.id)
        .bind(&discount.code)
        .bind(&discount.title)
        .bind(&discount.description)
        .bind(discount.discount_type)
        .bind(discount.applies_to)
        .bind(discount.amount)
        .bind(discount.max_uses)
        .bind(discount.valid_from)
        .bind(discount.valid_till)
        .bind(discount.once_per_email)
        .bind(encode_set("restricted_ticket_types", &discount.restricted_ticket_types)?)
        .bind(encode_set("restricted_groups", &discount.restricted_groups)?)
        .bind(encode_set("restricted_events", &discount.restricted_events)?)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a discount by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Discount>> {
        let row: Option<DiscountRow> = sqlx::query_as(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Discount::try_from).transpose()
    }

    /// Fetches a discount by coupon code.
    ///
    /// The match is exact and case-sensitive (BINARY collation): `"CODE"`
    /// and `"code"` are different coupons.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Discount>> {
        let row: Option<DiscountRow> = sqlx::query_as(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Discount::try_from).transpose()
    }

    /// Lists all discounts, newest first.
    pub async fn list(&self) -> DbResult<Vec<Discount>> {
        let rows: Vec<DiscountRow> = sqlx::query_as(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Discount::try_from).collect()
    }

    /// Updates a discount's configuration by id.
    ///
    /// ## Snapshot Independence
    /// Past price modifications are frozen copies; nothing here touches them,
    /// so editing a discount never changes what earlier reservations paid.
    pub async fn update(&self, discount: &Discount) -> DbResult<()> {
        validation::validate_discount(discount)?;

        let result = sqlx::query(
            "UPDATE discounts SET
                 code = ?2, title = ?3, description = ?4, discount_type = ?5,
                 applies_to = ?6, amount = ?7, max_uses = ?8, valid_from = ?9,
                 valid_till = ?10, once_per_email = ?11,
                 restricted_ticket_types = ?12, restricted_groups = ?13,
                 restricted_events = ?14, updated_at = ?15
             WHERE id = ?1",
        )
        .bind(&discount.id)
        .bind(&discount.code)
        .bind(&discount.title)
        .bind(&discount.description)
        .bind(discount.discount_type)
        .bind(discount.applies_to)
        .bind(discount.amount)
        .bind(discount.max_uses)
        .bind(discount.valid_from)
        .bind(discount.valid_till)
        .bind(discount.once_per_email)
        .bind(encode_set("restricted_ticket_types", &discount.restricted_ticket_types)?)
        .bind(encode_set("restricted_groups", &discount.restricted_groups)?)
        .bind(encode_set("restricted_events", &discount.restricted_events)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", &discount.id));
        }

        debug!(id = %discount.id, "Updated discount");
        Ok(())
    }

    /// Deletes a discount by id.
    ///
    /// Refused with [`DbError::ForeignKeyViolation`] while redemption
    /// snapshots still reference it (they are the audit trail).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        debug!(id, "Deleted discount");
        Ok(())
    }

    /// Counts all discounts.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use boxoffice_core::clock::SystemClock;
    use chrono::Duration;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_applies_entity_defaults() {
        let db = setup().await;
        let repo = db.discounts();

        let discount = repo.create(&SystemClock).await.unwrap();

        assert!(!discount.code.is_empty());
        assert_eq!(discount.title, discount.code);
        assert_eq!(discount.max_uses, 1);
        assert_eq!(discount.discount_type, DiscountType::FixedPrice);

        let stored = repo.get_by_id(&discount.id).await.unwrap().unwrap();
        assert_eq!(stored, discount);
    }

    #[tokio::test]
    async fn test_create_twice_yields_distinct_codes() {
        let db = setup().await;
        let repo = db.discounts();

        let a = repo.create(&SystemClock).await.unwrap();
        let b = repo.create(&SystemClock).await.unwrap();

        assert_ne!(a.code, b.code);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_duplicate_code_is_unique_violation() {
        let db = setup().await;
        let repo = db.discounts();
        let now = Utc::now();

        repo.insert(&Discount::new("TWIN", now)).await.unwrap();
        let err = repo.insert(&Discount::new("TWIN", now)).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_config() {
        let db = setup().await;
        let repo = db.discounts();

        let mut discount = Discount::new("BROKEN", Utc::now());
        discount.amount = -500;

        let err = repo.insert(&discount).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_by_code_is_case_sensitive() {
        let db = setup().await;
        let repo = db.discounts();

        repo.insert(&Discount::new("Spring10", Utc::now()))
            .await
            .unwrap();

        assert!(repo.find_by_code("Spring10").await.unwrap().is_some());
        assert!(repo.find_by_code("spring10").await.unwrap().is_none());
        assert!(repo.find_by_code("SPRING10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_roundtrips_restriction_sets() {
        let db = setup().await;
        let repo = db.discounts();
        let now = Utc::now();

        let mut discount = Discount::new("SCOPED", now);
        repo.insert(&discount).await.unwrap();

        discount.discount_type = DiscountType::Percentage;
        discount.amount = 1_500; // 15%
        discount.max_uses = -1;
        discount.valid_till = Some(now + Duration::days(30));
        discount.once_per_email = true;
        discount.restricted_events = vec!["spring-gala".into(), "winter-ball".into()];
        discount.restricted_groups = vec!["members".into()];
        repo.update(&discount).await.unwrap();

        let stored = repo.get_by_id(&discount.id).await.unwrap().unwrap();
        assert_eq!(stored.discount_type, DiscountType::Percentage);
        assert_eq!(stored.amount, 1_500);
        assert_eq!(stored.max_uses, -1);
        assert!(stored.once_per_email);
        assert_eq!(
            stored.restricted_events,
            vec!["spring-gala".to_string(), "winter-ball".to_string()]
        );
        assert_eq!(stored.restricted_groups, vec!["members".to_string()]);
        assert!(stored.restricted_ticket_types.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_discount_is_not_found() {
        let db = setup().await;
        let repo = db.discounts();

        let ghost = Discount::new("GHOST", Utc::now());
        let err = repo.update(&ghost).await.unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let repo = db.discounts();

        let discount = repo.create(&SystemClock).await.unwrap();
        repo.delete(&discount.id).await.unwrap();

        assert!(repo.get_by_id(&discount.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&discount.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let db = setup().await;
        let repo = db.discounts();
        let now = Utc::now();

        repo.insert(&Discount::new("OLD", now - Duration::days(2)))
            .await
            .unwrap();
        repo.insert(&Discount::new("NEW", now)).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].code, "NEW");
        assert_eq!(all[1].code, "OLD");
    }
}
