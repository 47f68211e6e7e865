use async_trait::async_trait;
use common::{BoxId, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    AuditDraft, AuditEntry, AuditQuery, LedgerError, MutationKind, Result, SequenceId, StockRecord,
    store::{AuditStream, LedgerStore, MutationOutcome, validate_mutation},
};

/// PostgreSQL-backed ledger store.
///
/// The conditional update runs in a single transaction with the current
/// row locked (`SELECT ... FOR UPDATE`), so the record write and the audit
/// append commit together and mutations on one product serialize while
/// different products proceed in parallel.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: &PgRow) -> Result<StockRecord> {
        Ok(StockRecord {
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            item_name: row.try_get("item_name")?,
            quantity: quantity_from_db(row.try_get("quantity")?)?,
            box_id: BoxId::new(row.try_get::<String, _>("box_id")?),
        })
    }

    fn row_to_entry(row: &PgRow) -> Result<AuditEntry> {
        let kind: String = row.try_get("kind")?;
        let kind = MutationKind::parse(&kind)
            .ok_or_else(|| LedgerError::Corrupt(format!("unknown mutation kind {kind:?}")))?;

        Ok(AuditEntry {
            sequence_id: SequenceId::new(row.try_get("sequence_id")?),
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            item_name: row.try_get("item_name")?,
            old_quantity: quantity_from_db(row.try_get("old_quantity")?)?,
            new_quantity: quantity_from_db(row.try_get("new_quantity")?)?,
            kind,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

fn quantity_from_db(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| LedgerError::Corrupt(format!("stored quantity {value} is out of range")))
}

#[async_trait]
impl LedgerStore for PostgresLedger {
    async fn get(&self, product_id: &ProductId) -> Result<Option<StockRecord>> {
        let row = sqlx::query(
            r#"
            SELECT product_id, item_name, quantity, box_id
            FROM stock_records
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn list(&self) -> Result<Vec<StockRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, item_name, quantity, box_id
            FROM stock_records
            ORDER BY product_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn update_conditional(
        &self,
        expected: Option<&StockRecord>,
        updated: StockRecord,
        draft: AuditDraft,
    ) -> Result<MutationOutcome> {
        validate_mutation(expected, &updated, &draft)
            .map_err(|e| LedgerError::RejectedMutation(e.message))?;

        let mut tx = self.pool.begin().await?;

        // Lock the row for the duration of the transaction.
        let row = sqlx::query(
            r#"
            SELECT product_id, item_name, quantity, box_id
            FROM stock_records
            WHERE product_id = $1
            FOR UPDATE
            "#,
        )
        .bind(updated.product_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let stored = row.as_ref().map(Self::row_to_record).transpose()?;

        let matches = match (expected, stored.as_ref()) {
            (None, None) => true,
            (Some(expected), Some(stored)) => expected == stored,
            _ => false,
        };
        if !matches {
            tracing::debug!(product_id = %updated.product_id, "conditional update conflict");
            return Err(LedgerError::Conflict {
                product_id: updated.product_id.clone(),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO stock_records (product_id, item_name, quantity, box_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id) DO UPDATE SET
                item_name = EXCLUDED.item_name,
                quantity = EXCLUDED.quantity,
                box_id = EXCLUDED.box_id
            "#,
        )
        .bind(updated.product_id.as_str())
        .bind(&updated.item_name)
        .bind(i64::from(updated.quantity))
        .bind(updated.box_id.as_str())
        .execute(&mut *tx)
        .await?;

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO audit_log (product_id, item_name, old_quantity, new_quantity, kind, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING sequence_id
            "#,
        )
        .bind(draft.product_id.as_str())
        .bind(&draft.item_name)
        .bind(i64::from(draft.old_quantity))
        .bind(i64::from(draft.new_quantity))
        .bind(draft.kind.as_str())
        .bind(draft.timestamp)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let entry = draft.into_entry(SequenceId::new(sequence));
        Ok(MutationOutcome {
            record: updated,
            entry,
        })
    }

    async fn audit_by_product(&self, product_id: &ProductId) -> Result<AuditStream> {
        use futures_util::StreamExt;

        let stream = sqlx::query(
            r#"
            SELECT sequence_id, product_id, item_name, old_quantity, new_quantity, kind, timestamp
            FROM audit_log
            WHERE product_id = $1
            ORDER BY sequence_id ASC
            "#,
        )
        .bind(product_id.as_str().to_string())
        .fetch(&self.pool)
        .map(|result| match result {
            Ok(row) => Self::row_to_entry(&row),
            Err(e) => Err(LedgerError::Database(e)),
        });

        Ok(Box::pin(stream))
    }

    async fn query_audit(&self, query: AuditQuery) -> Result<Vec<AuditEntry>> {
        let mut sql = String::from(
            "SELECT sequence_id, product_id, item_name, old_quantity, new_quantity, kind, timestamp FROM audit_log WHERE 1=1",
        );
        let mut param_count = 0;

        // Build dynamic query
        if query.product_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND product_id = ${param_count}"));
        }
        if query.kind.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND kind = ${param_count}"));
        }
        if query.from_timestamp.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND timestamp >= ${param_count}"));
        }
        if query.to_timestamp.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND timestamp <= ${param_count}"));
        }

        sql.push_str(" ORDER BY sequence_id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(ref id) = query.product_id {
            sqlx_query = sqlx_query.bind(id.as_str().to_string());
        }
        if let Some(kind) = query.kind {
            sqlx_query = sqlx_query.bind(kind.as_str());
        }
        if let Some(from) = query.from_timestamp {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(to) = query.to_timestamp {
            sqlx_query = sqlx_query.bind(to);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_entry).collect()
    }
}
