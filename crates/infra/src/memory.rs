//! In-memory database backend.
//!
//! Intended for tests/dev. Not optimized for performance: every commit stages
//! against a copy of the touched tables and swaps it in only if every write
//! succeeded.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use pricebook_products::{ProductId, ProductStatus};

use crate::committer::{CommitError, Committer};
use crate::mutation::{MutationBatch, Row, TableSchema, WriteOp};
use crate::read_model::{Page, ProductReadModel, served_page_size};
use crate::store::product_row::{CATEGORY, STATUS};
use crate::store::{PRODUCTS, ProductRecord, RowSource, StoreError};

type Table = BTreeMap<String, Row>;

/// Tables keyed by name, rows keyed (and ordered) by primary key.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: RwLock<HashMap<&'static str, Table>>,
    insert_log: RwLock<HashMap<&'static str, Vec<String>>>,
    fail_next: AtomicUsize,
    applied: AtomicUsize,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` commits fail with [`CommitError::Unavailable`]
    /// before anything is written.
    pub fn fail_next_commits(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Number of batches applied successfully.
    pub fn applied_batches(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }

    /// Snapshot of a table's rows in key order.
    pub fn rows(&self, table: &TableSchema) -> Vec<(String, Row)> {
        let Ok(tables) = self.tables.read() else {
            return Vec::new();
        };
        tables
            .get(table.name)
            .map(|rows| rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Rows of a table in the order they were inserted.
    pub fn rows_in_insert_order(&self, table: &TableSchema) -> Vec<Row> {
        let (Ok(tables), Ok(log)) = (self.tables.read(), self.insert_log.read()) else {
            return Vec::new();
        };
        let (Some(rows), Some(keys)) = (tables.get(table.name), log.get(table.name)) else {
            return Vec::new();
        };
        keys.iter().filter_map(|key| rows.get(key).cloned()).collect()
    }

    pub fn row_count(&self, table: &TableSchema) -> usize {
        self.tables
            .read()
            .map(|tables| tables.get(table.name).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    /// Write a row directly, bypassing the batch protocol (test fixtures).
    pub fn put_row(&self, table: &TableSchema, key: impl Into<String>, row: Row) {
        let key = key.into();
        if let (Ok(mut tables), Ok(mut log)) = (self.tables.write(), self.insert_log.write()) {
            if tables.entry(table.name).or_default().insert(key.clone(), row).is_none() {
                log.entry(table.name).or_default().push(key);
            }
        }
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Apply one write to the staged tables, returning the key of an inserted row.
    fn stage(
        staged: &mut HashMap<&'static str, Table>,
        op: WriteOp,
    ) -> Result<Option<(&'static str, String)>, CommitError> {
        match op {
            WriteOp::Insert { table, key, row } => {
                let rows = staged.entry(table.name).or_default();
                if rows.contains_key(&key) {
                    return Err(CommitError::Conflict {
                        table: table.name.to_string(),
                        key,
                    });
                }
                rows.insert(key.clone(), row);
                Ok(Some((table.name, key)))
            }
            WriteOp::Update { table, key, changes } => {
                let Some(existing) = staged.get_mut(table.name).and_then(|rows| rows.get_mut(&key))
                else {
                    return Err(CommitError::MissingRow {
                        table: table.name.to_string(),
                        key,
                    });
                };
                existing.merge(&changes);
                Ok(None)
            }
        }
    }
}

impl Committer for InMemoryDatabase {
    fn apply(&self, batch: MutationBatch) -> Result<(), CommitError> {
        if self.take_injected_failure() {
            warn!(ops = batch.len(), "injected commit failure");
            return Err(CommitError::Unavailable("injected commit failure".to_string()));
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|_| CommitError::Backend("lock poisoned".to_string()))?;

        let mut staged: HashMap<&'static str, Table> = HashMap::new();
        for op in batch.ops() {
            let name = op.table().name;
            if !staged.contains_key(name) {
                staged.insert(name, tables.get(name).cloned().unwrap_or_default());
            }
        }

        let ops = batch.len();
        let mut inserted = Vec::new();
        for op in batch.into_ops() {
            if let Some(entry) = Self::stage(&mut staged, op)? {
                inserted.push(entry);
            }
        }

        let mut log = self
            .insert_log
            .write()
            .map_err(|_| CommitError::Backend("lock poisoned".to_string()))?;
        tables.extend(staged);
        for (table, key) in inserted {
            log.entry(table).or_default().push(key);
        }
        self.applied.fetch_add(1, Ordering::SeqCst);
        debug!(ops, "batch applied");
        Ok(())
    }
}

impl RowSource for InMemoryDatabase {
    fn read_row(&self, table: &'static TableSchema, key: &str) -> Result<Option<Row>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(tables.get(table.name).and_then(|rows| rows.get(key)).cloned())
    }
}

impl ProductReadModel for InMemoryDatabase {
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
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        let Some(rows) = tables.get(PRODUCTS.name) else {
            return Ok(Page::empty());
        };

        let page_size = served_page_size(page_size);
        let mut fetched = Vec::with_capacity(page_size.min(rows.len()).saturating_add(1));
        for (key, row) in rows {
            if page_token.is_some_and(|token| key.as_str() <= token) {
                continue;
            }
            if row.text(STATUS)? != ProductStatus::Active.as_str() {
                continue;
            }
            if category.is_some_and(|c| row.text(CATEGORY).ok() != Some(c)) {
                continue;
            }
            fetched.push(ProductRecord::from_row(row)?);
            if fetched.len() > page_size {
                break;
            }
        }

        Ok(Page::from_overfetch(fetched, page_size, |r| {
            r.product_id.as_str().to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{ColumnKind, ColumnValue};
    use crate::store::product_row;
    use chrono::{TimeZone, Utc};
    use pricebook_core::Money;
    use pricebook_products::Product;

    static ITEMS: TableSchema = TableSchema {
        name: "items",
        key_column: "id",
        columns: &[("id", ColumnKind::Text), ("qty", ColumnKind::Int)],
    };

    fn insert(key: &str, qty: i64) -> WriteOp {
        WriteOp::Insert {
            table: &ITEMS,
            key: key.to_string(),
            row: Row::new().with("id", key).with("qty", qty),
        }
    }

    fn update(key: &str, qty: i64) -> WriteOp {
        WriteOp::Update {
            table: &ITEMS,
            key: key.to_string(),
            changes: Row::new().with("qty", qty),
        }
    }

    fn batch(ops: Vec<WriteOp>) -> MutationBatch {
        let mut batch = MutationBatch::new();
        for op in ops {
            batch.push(op);
        }
        batch
    }

    #[test]
    fn applies_inserts_and_updates_in_order() {
        let db = InMemoryDatabase::new();
        db.apply(batch(vec![insert("a", 1), update("a", 4)])).unwrap();

        let row = db.read_row(&ITEMS, "a").unwrap().unwrap();
        assert_eq!(row.get("qty"), Some(&ColumnValue::Int(4)));
        assert_eq!(db.applied_batches(), 1);
    }

    #[test]
    fn failing_op_leaves_no_partial_writes() {
        let db = InMemoryDatabase::new();
        db.apply(batch(vec![insert("a", 1)])).unwrap();

        let err = db
            .apply(batch(vec![insert("b", 2), update("a", 9), insert("a", 3)]))
            .unwrap_err();

        assert_eq!(
            err,
            CommitError::Conflict {
                table: "items".to_string(),
                key: "a".to_string()
            }
        );
        assert!(db.read_row(&ITEMS, "b").unwrap().is_none());
        let a = db.read_row(&ITEMS, "a").unwrap().unwrap();
        assert_eq!(a.get("qty"), Some(&ColumnValue::Int(1)));
        assert_eq!(db.applied_batches(), 1);
    }

    #[test]
    fn update_of_missing_row_fails() {
        let db = InMemoryDatabase::new();
        let err = db.apply(batch(vec![update("ghost", 1)])).unwrap_err();
        assert!(matches!(err, CommitError::MissingRow { .. }));
    }

    #[test]
    fn injected_failures_are_consumed_one_per_commit() {
        let db = InMemoryDatabase::new();
        db.fail_next_commits(2);

        assert!(matches!(
            db.apply(batch(vec![insert("a", 1)])),
            Err(CommitError::Unavailable(_))
        ));
        assert!(db.apply(batch(vec![insert("a", 1)])).is_err());
        db.apply(batch(vec![insert("a", 1)])).unwrap();

        assert_eq!(db.row_count(&ITEMS), 1);
    }

    fn seed_active(db: &InMemoryDatabase, id: &str) {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let mut product = Product::new(
            id.parse().unwrap(),
            "Cable",
            "",
            "accessories",
            Money::from_fraction(5, 1).unwrap(),
            now,
        )
        .unwrap();
        product.activate(now);
        db.put_row(&PRODUCTS, id, product_row::full_row(&product).unwrap());
    }

    #[test]
    fn list_active_serves_zero_page_size_as_one() {
        let db = InMemoryDatabase::new();
        seed_active(&db, "p-1");
        seed_active(&db, "p-2");

        let page = db.list_active(None, 0, None).unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("p-1"));
    }

    #[test]
    fn list_active_accepts_unbounded_page_size() {
        let db = InMemoryDatabase::new();
        seed_active(&db, "p-1");
        seed_active(&db, "p-2");

        let page = db.list_active(None, usize::MAX, None).unwrap();

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.next_page_token, None);
    }
}
