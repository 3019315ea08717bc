//! Aggregate repositories: translate aggregates to and from rows.
//!
//! A repository never performs a write. `insert_op` / `update_op` return the
//! [`WriteOp`] that the orchestration adds to the atomic batch; only reads go
//! through the underlying [`RowSource`].

pub mod product_row;
pub mod product_store;

use std::sync::Arc;

use thiserror::Error;

use pricebook_core::AggregateRoot;

use crate::mutation::{ColumnValue, Row, TableSchema, WriteOp};

pub use product_row::{DiscountColumns, PRODUCTS, ProductRecord};
pub use product_store::ProductStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    /// A stored row does not match the expected shape or violates a domain rule.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Aggregate state could not be expressed as column values.
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn column(column: &str, expected: &str, found: Option<&ColumnValue>) -> Self {
        match found {
            None => StoreError::Corrupt(format!("column '{column}' is missing")),
            Some(value) => StoreError::Corrupt(format!(
                "column '{column}' expected {expected}, found {value:?}"
            )),
        }
    }
}

/// Point reads by primary key.
pub trait RowSource: Send + Sync {
    fn read_row(&self, table: &'static TableSchema, key: &str) -> Result<Option<Row>, StoreError>;
}

impl<T: RowSource + ?Sized> RowSource for Arc<T> {
    fn read_row(&self, table: &'static TableSchema, key: &str) -> Result<Option<Row>, StoreError> {
        (**self).read_row(table, key)
    }
}

/// Repository contract for one aggregate type.
pub trait AggregateStore<A: AggregateRoot>: Send + Sync {
    /// Full-row insert for a newly created aggregate.
    fn insert_op(&self, aggregate: &A) -> Result<WriteOp, StoreError>;

    /// Update of the dirty columns only, or `None` when nothing is dirty.
    fn update_op(&self, aggregate: &A) -> Result<Option<WriteOp>, StoreError>;

    /// Load and rehydrate. A missing row is [`StoreError::NotFound`].
    fn find_by_id(&self, id: &A::Id) -> Result<A, StoreError>;
}

impl<A: AggregateRoot, T: AggregateStore<A> + ?Sized> AggregateStore<A> for Arc<T> {
    fn insert_op(&self, aggregate: &A) -> Result<WriteOp, StoreError> {
        (**self).insert_op(aggregate)
    }

    fn update_op(&self, aggregate: &A) -> Result<Option<WriteOp>, StoreError> {
        (**self).update_op(aggregate)
    }

    fn find_by_id(&self, id: &A::Id) -> Result<A, StoreError> {
        (**self).find_by_id(id)
    }
}
