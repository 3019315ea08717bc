//! Row layout of the `products` table.
//!
//! Money and percentages are stored as `(numerator, denominator)` integer
//! column pairs. A NULL `discount_percent_numerator` means "no discount".

use chrono::{DateTime, Utc};

use pricebook_core::Money;
use pricebook_products::{Discount, Product, ProductField, ProductId, ProductSnapshot, ProductStatus};

use crate::mutation::{ColumnKind, ColumnValue, Row, TableSchema};
use crate::store::StoreError;

pub const PRODUCT_ID: &str = "product_id";
pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const CATEGORY: &str = "category";
pub const BASE_PRICE_NUMERATOR: &str = "base_price_numerator";
pub const BASE_PRICE_DENOMINATOR: &str = "base_price_denominator";
pub const DISCOUNT_PERCENT_NUMERATOR: &str = "discount_percent_numerator";
pub const DISCOUNT_PERCENT_DENOMINATOR: &str = "discount_percent_denominator";
pub const DISCOUNT_START_AT: &str = "discount_start_at";
pub const DISCOUNT_END_AT: &str = "discount_end_at";
pub const STATUS: &str = "status";
pub const ARCHIVED_AT: &str = "archived_at";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

pub static PRODUCTS: TableSchema = TableSchema {
    name: "products",
    key_column: PRODUCT_ID,
    columns: &[
        (PRODUCT_ID, ColumnKind::Text),
        (NAME, ColumnKind::Text),
        (DESCRIPTION, ColumnKind::Text),
        (CATEGORY, ColumnKind::Text),
        (BASE_PRICE_NUMERATOR, ColumnKind::Int),
        (BASE_PRICE_DENOMINATOR, ColumnKind::Int),
        (DISCOUNT_PERCENT_NUMERATOR, ColumnKind::Int),
        (DISCOUNT_PERCENT_DENOMINATOR, ColumnKind::Int),
        (DISCOUNT_START_AT, ColumnKind::Timestamp),
        (DISCOUNT_END_AT, ColumnKind::Timestamp),
        (STATUS, ColumnKind::Text),
        (ARCHIVED_AT, ColumnKind::Timestamp),
        (CREATED_AT, ColumnKind::Timestamp),
        (UPDATED_AT, ColumnKind::Timestamp),
    ],
};

/// Discount columns as stored, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountColumns {
    pub percentage: (i64, i64),
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// A `products` row decoded into typed fields.
///
/// Decoding checks column types only. Domain validation of the price and
/// discount happens in [`ProductRecord::into_snapshot`] (strict) or
/// [`ProductRecord::valid_discount`] (lenient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub base_price: (i64, i64),
    pub discount: Option<DiscountColumns>,
    pub status: ProductStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        let product_id = row
            .text(PRODUCT_ID)?
            .parse::<ProductId>()
            .map_err(|e| StoreError::Corrupt(format!("product_id: {e}")))?;
        let status = row
            .text(STATUS)?
            .parse::<ProductStatus>()
            .map_err(|e| StoreError::Corrupt(format!("status: {e}")))?;

        let discount = match row.opt_int(DISCOUNT_PERCENT_NUMERATOR)? {
            None => None,
            Some(numerator) => Some(DiscountColumns {
                percentage: (numerator, row.int(DISCOUNT_PERCENT_DENOMINATOR)?),
                start_at: row.timestamp(DISCOUNT_START_AT)?,
                end_at: row.timestamp(DISCOUNT_END_AT)?,
            }),
        };

        Ok(Self {
            product_id,
            name: row.text(NAME)?.to_string(),
            description: row.text(DESCRIPTION)?.to_string(),
            category: row.text(CATEGORY)?.to_string(),
            base_price: (row.int(BASE_PRICE_NUMERATOR)?, row.int(BASE_PRICE_DENOMINATOR)?),
            discount,
            status,
            archived_at: row.opt_timestamp(ARCHIVED_AT)?,
            created_at: row.timestamp(CREATED_AT)?,
            updated_at: row.timestamp(UPDATED_AT)?,
        })
    }

    pub fn base_price(&self) -> Result<Money, StoreError> {
        Money::from_fraction(self.base_price.0, self.base_price.1)
            .map_err(|e| StoreError::Corrupt(format!("base price: {e}")))
    }

    /// The stored discount, or `None` if it is absent or fails validation.
    pub fn valid_discount(&self) -> Option<Discount> {
        self.discount.as_ref().and_then(|d| d.to_discount().ok())
    }

    /// Validate every field and build a snapshot for rehydration.
    pub fn into_snapshot(self) -> Result<ProductSnapshot, StoreError> {
        let base_price = self.base_price()?;
        let discount = match &self.discount {
            None => None,
            Some(columns) => Some(
                columns
                    .to_discount()
                    .map_err(|e| StoreError::Corrupt(format!("discount: {e}")))?,
            ),
        };

        Ok(ProductSnapshot {
            id: self.product_id,
            name: self.name,
            description: self.description,
            category: self.category,
            base_price,
            discount,
            status: self.status,
            archived_at: self.archived_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DiscountColumns {
    fn to_discount(&self) -> pricebook_core::DomainResult<Discount> {
        Discount::from_fraction(self.percentage.0, self.percentage.1, self.start_at, self.end_at)
    }
}

/// Every column of a freshly created product.
pub fn full_row(product: &Product) -> Result<Row, StoreError> {
    let mut row = Row::new()
        .with(PRODUCT_ID, product.id_typed().as_str())
        .with(CREATED_AT, product.created_at())
        .with(UPDATED_AT, product.updated_at());

    for field in [
        ProductField::Name,
        ProductField::Description,
        ProductField::Category,
        ProductField::BasePrice,
        ProductField::Discount,
        ProductField::Status,
        ProductField::ArchivedAt,
    ] {
        write_field(&mut row, product, field)?;
    }
    Ok(row)
}

/// Columns backing one tracked field.
pub fn write_field(row: &mut Row, product: &Product, field: ProductField) -> Result<(), StoreError> {
    match field {
        ProductField::Name => row.set(NAME, product.name()),
        ProductField::Description => row.set(DESCRIPTION, product.description()),
        ProductField::Category => row.set(CATEGORY, product.category()),
        ProductField::BasePrice => {
            let (numerator, denominator) = product
                .base_price()
                .fraction()
                .map_err(|e| StoreError::Encode(format!("base price: {e}")))?;
            row.set(BASE_PRICE_NUMERATOR, numerator);
            row.set(BASE_PRICE_DENOMINATOR, denominator);
        }
        ProductField::Discount => match product.discount() {
            Some(discount) => {
                let (numerator, denominator) = discount.percentage_fraction();
                row.set(DISCOUNT_PERCENT_NUMERATOR, numerator);
                row.set(DISCOUNT_PERCENT_DENOMINATOR, denominator);
                row.set(DISCOUNT_START_AT, discount.start_at());
                row.set(DISCOUNT_END_AT, discount.end_at());
            }
            None => {
                for column in [
                    DISCOUNT_PERCENT_NUMERATOR,
                    DISCOUNT_PERCENT_DENOMINATOR,
                    DISCOUNT_START_AT,
                    DISCOUNT_END_AT,
                ] {
                    row.set(column, ColumnValue::Null);
                }
            }
        },
        ProductField::Status => row.set(STATUS, product.status().as_str()),
        ProductField::ArchivedAt => row.set(ARCHIVED_AT, product.archived_at()),
    }
    Ok(())
}
