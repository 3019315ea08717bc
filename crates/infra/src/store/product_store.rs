use tracing::instrument;

use pricebook_core::AggregateRoot;
use pricebook_products::{Product, ProductId};

use crate::mutation::{Row, WriteOp};
use crate::store::product_row::{self, PRODUCTS, ProductRecord, UPDATED_AT};
use crate::store::{AggregateStore, RowSource, StoreError};

/// Product repository over any [`RowSource`].
#[derive(Debug, Clone)]
pub struct ProductStore<R> {
    source: R,
}

impl<R> ProductStore<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: RowSource> AggregateStore<Product> for ProductStore<R> {
    fn insert_op(&self, product: &Product) -> Result<WriteOp, StoreError> {
        Ok(WriteOp::Insert {
            table: &PRODUCTS,
            key: product.id_typed().as_str().to_string(),
            row: product_row::full_row(product)?,
        })
    }

    /// Only dirty columns plus `updated_at` are written.
    fn update_op(&self, product: &Product) -> Result<Option<WriteOp>, StoreError> {
        let changes = product.changes();
        if changes.is_empty() {
            return Ok(None);
        }

        let mut row = Row::new();
        for field in changes.dirty_fields() {
            product_row::write_field(&mut row, product, field)?;
        }
        row.set(UPDATED_AT, product.updated_at());

        Ok(Some(WriteOp::Update {
            table: &PRODUCTS,
            key: product.id_typed().as_str().to_string(),
            changes: row,
        }))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    fn find_by_id(&self, id: &ProductId) -> Result<Product, StoreError> {
        let row = self
            .source
            .read_row(&PRODUCTS, id.as_str())?
            .ok_or(StoreError::NotFound)?;
        let snapshot = ProductRecord::from_row(&row)?.into_snapshot()?;
        Ok(Product::rehydrate(snapshot))
    }
}
