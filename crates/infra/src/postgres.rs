//! Postgres-backed database implementation.
//!
//! Implements [`Committer`], [`RowSource`] and [`ProductReadModel`] over a
//! SQLx connection pool. A batch is applied inside a single transaction, so
//! either every write of the batch is committed or none is.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | CommitError |
//! |------------|----------------------|-------------|
//! | Database (unique violation) on insert | `23505` | `Conflict` |
//! | Update affecting zero rows | N/A | `MissingRow` |
//! | PoolClosed / Io / PoolTimedOut | N/A | `Unavailable` |
//! | Other | Any other | `Backend` |
//!
//! ## Sync Bridge
//!
//! The store traits are synchronous. Calls are bridged onto the pool with
//! `block_in_place` + `Handle::block_on`, which requires a multi-threaded
//! tokio runtime context (or a thread that has entered one).

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row as _};
use tracing::{Span, debug, instrument};

use pricebook_products::{ProductId, ProductStatus};

use crate::committer::{CommitError, Committer};
use crate::mutation::{ColumnKind, ColumnValue, MutationBatch, Row, TableSchema, WriteOp};
use crate::read_model::{Page, ProductReadModel, served_page_size};
use crate::store::product_row::{CATEGORY, PRODUCT_ID, STATUS};
use crate::store::{PRODUCTS, ProductRecord, RowSource, StoreError};

const SCHEMA_SQL: &str = include_str!("../migrations/0001_pricebook.sql");

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: Arc<PgPool>,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the `products` and `outbox_events` tables if missing.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&*self.pool).await?;
        Ok(())
    }

    /// Apply a batch in one transaction.
    #[instrument(skip(self, batch), fields(ops = batch.len()), err)]
    pub async fn apply_batch(&self, batch: MutationBatch) -> Result<(), CommitError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for op in batch.ops() {
            match op {
                WriteOp::Insert { table, key, row } => {
                    let sql = insert_sql(table, row);
                    let query = bind_row(sqlx::query(&sql), table, row)?;
                    query.execute(&mut *tx).await.map_err(|e| {
                        if is_unique_violation(&e) {
                            CommitError::Conflict {
                                table: table.name.to_string(),
                                key: key.clone(),
                            }
                        } else {
                            map_sqlx_error("insert", e)
                        }
                    })?;
                }
                WriteOp::Update { table, key, changes } => {
                    if changes.is_empty() {
                        continue;
                    }
                    let sql = update_sql(table, changes);
                    let query = bind_row(sqlx::query(&sql), table, changes)?.bind(key.clone());
                    let result = query
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| map_sqlx_error("update", e))?;
                    if result.rows_affected() == 0 {
                        // Dropping `tx` rolls back.
                        return Err(CommitError::MissingRow {
                            table: table.name.to_string(),
                            key: key.clone(),
                        });
                    }
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        debug!("batch committed");
        Ok(())
    }

    #[instrument(skip(self, table), fields(table = table.name), err)]
    pub async fn fetch_row(
        &self,
        table: &'static TableSchema,
        key: &str,
    ) -> Result<Option<Row>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            select_list(table),
            table.name,
            table.key_column
        );
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("fetch_row: {e}")))?;
        row.map(|r| decode_row(table, &r)).transpose()
    }

    #[instrument(skip(self), fields(fetched = tracing::field::Empty), err)]
    pub async fn fetch_active_products(
        &self,
        category: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<Page<ProductRecord>, StoreError> {
        let sql = format!(
            "SELECT {columns} FROM {table} \
             WHERE {status} = $1 \
               AND ($2::text IS NULL OR {category} = $2) \
               AND ($3::text IS NULL OR {key} > $3) \
             ORDER BY {key} ASC \
             LIMIT $4",
            columns = select_list(&PRODUCTS),
            table = PRODUCTS.name,
            status = STATUS,
            category = CATEGORY,
            key = PRODUCT_ID,
        );
        let page_size = served_page_size(page_size);
        let limit = i64::try_from(page_size.saturating_add(1)).unwrap_or(i64::MAX);

        let rows = sqlx::query(&sql)
            .bind(ProductStatus::Active.as_str())
            .bind(category)
            .bind(page_token)
            .bind(limit)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("list_active: {e}")))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(ProductRecord::from_row(&decode_row(&PRODUCTS, row)?)?);
        }
        Span::current().record("fetched", records.len());

        Ok(Page::from_overfetch(records, page_size, |r| {
            r.product_id.as_str().to_string()
        }))
    }

    fn block_on<F: Future>(&self, fut: F) -> Result<F::Output, String> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            "PostgresDatabase requires a tokio runtime context. Call from within a multi-threaded runtime."
                .to_string()
        })?;
        Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
    }
}

impl Committer for PostgresDatabase {
    fn apply(&self, batch: MutationBatch) -> Result<(), CommitError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.block_on(self.apply_batch(batch))
            .map_err(CommitError::Unavailable)?
    }
}

impl RowSource for PostgresDatabase {
    fn read_row(&self, table: &'static TableSchema, key: &str) -> Result<Option<Row>, StoreError> {
        self.block_on(self.fetch_row(table, key))
            .map_err(StoreError::Backend)?
    }
}

impl ProductReadModel for PostgresDatabase {
    fn get_by_id(&self, id: &ProductId) -> Result<ProductRecord, StoreError> {
        let row = self.read_row(&PRODUCTS, id.as_str())?.ok_or(StoreError::NotFound)?;
        ProductRecord::from_row(&row)
    }

    fn list_active(
        &self,
        category: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<Page<ProductRecord>, StoreError> {
        self.block_on(self.fetch_active_products(category, page_size, page_token))
            .map_err(StoreError::Backend)?
    }
}

fn select_list(table: &TableSchema) -> String {
    table
        .columns
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn insert_sql(table: &TableSchema, row: &Row) -> String {
    let columns: Vec<_> = row.iter().map(|(column, _)| column).collect();
    let placeholders: Vec<_> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// `UPDATE .. SET c1 = $1, .. WHERE key = $n+1`; the key is bound last.
fn update_sql(table: &TableSchema, changes: &Row) -> String {
    let assignments: Vec<_> = changes
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{column} = ${}", i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        table.name,
        assignments.join(", "),
        table.key_column,
        changes.len() + 1
    )
}

fn bind_row<'q>(
    mut query: PgQuery<'q>,
    table: &TableSchema,
    row: &Row,
) -> Result<PgQuery<'q>, CommitError> {
    for (column, value) in row.iter() {
        let kind = table.kind_of(column).ok_or_else(|| {
            CommitError::Backend(format!("unknown column '{column}' for table '{}'", table.name))
        })?;
        query = bind_value(query, kind, value);
    }
    Ok(query)
}

fn bind_value<'q>(query: PgQuery<'q>, kind: ColumnKind, value: &ColumnValue) -> PgQuery<'q> {
    match (value, kind) {
        (ColumnValue::Text(v), _) => query.bind(v.clone()),
        (ColumnValue::Int(v), _) => query.bind(*v),
        (ColumnValue::Timestamp(v), _) => query.bind(*v),
        (ColumnValue::Json(v), _) => query.bind(v.clone()),
        // NULLs still need the column's type.
        (ColumnValue::Null, ColumnKind::Text) => query.bind(None::<String>),
        (ColumnValue::Null, ColumnKind::Int) => query.bind(None::<i64>),
        (ColumnValue::Null, ColumnKind::Timestamp) => query.bind(None::<DateTime<Utc>>),
        (ColumnValue::Null, ColumnKind::Json) => query.bind(None::<JsonValue>),
    }
}

fn decode_row(table: &'static TableSchema, pg: &PgRow) -> Result<Row, StoreError> {
    let mut row = Row::new();
    for (column, kind) in table.columns {
        let value = match kind {
            ColumnKind::Text => pg.try_get::<Option<String>, _>(*column).map(ColumnValue::from),
            ColumnKind::Int => pg.try_get::<Option<i64>, _>(*column).map(ColumnValue::from),
            ColumnKind::Timestamp => pg
                .try_get::<Option<DateTime<Utc>>, _>(*column)
                .map(ColumnValue::from),
            ColumnKind::Json => pg
                .try_get::<Option<JsonValue>, _>(*column)
                .map(|v| v.map_or(ColumnValue::Null, ColumnValue::Json)),
        }
        .map_err(|e| StoreError::Corrupt(format!("column '{column}': {e}")))?;
        row.set(*column, value);
    }
    Ok(row)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> CommitError {
    match err {
        sqlx::Error::Database(db_err) => CommitError::Backend(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            CommitError::Unavailable(format!("{operation}: {err}"))
        }
        _ => CommitError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
