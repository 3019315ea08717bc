//! Read-side queries returning priced product views.
//!
//! Records are rehydrated without events or dirty flags and priced with
//! [`PricingCalculator`] at an as-of time: the caller's when given, otherwise
//! the clock's `now`. A stored discount that no longer validates is treated as
//! absent rather than failing the read.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{instrument, warn};

use pricebook_products::{PricingCalculator, Product, ProductId, ProductSnapshot, ProductStatus};

use crate::clock::Clock;
use crate::config::PageLimits;
use crate::read_model::ProductReadModel;
use crate::store::{ProductRecord, StoreError};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("not found")]
    NotFound,

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for QueryError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => QueryError::NotFound,
            other => QueryError::Store(other),
        }
    }
}

/// A product as shown to readers, with its effective price at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub status: ProductStatus,
    pub base_price_numerator: i64,
    pub base_price_denominator: i64,
    pub effective_price_numerator: i64,
    pub effective_price_denominator: i64,
    pub discount_active: bool,
    pub priced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductViewPage {
    pub products: Vec<ProductView>,
    pub next_page_token: Option<String>,
}

fn price_record(
    record: ProductRecord,
    pricing: &PricingCalculator,
    at: DateTime<Utc>,
) -> Result<ProductView, StoreError> {
    let base_price = record.base_price()?;
    let discount = record.valid_discount();
    let product = Product::rehydrate(ProductSnapshot {
        id: record.product_id,
        name: record.name,
        description: record.description,
        category: record.category,
        base_price,
        discount,
        status: record.status,
        archived_at: record.archived_at,
        created_at: record.created_at,
        updated_at: record.updated_at,
    });

    let encode = |e: pricebook_core::DomainError| StoreError::Encode(e.to_string());
    let (base_price_numerator, base_price_denominator) = product.base_price().fraction().map_err(encode)?;
    let (effective_price_numerator, effective_price_denominator) = pricing
        .effective_price(&product, at)
        .fraction()
        .map_err(encode)?;

    Ok(ProductView {
        product_id: product.id_typed().clone(),
        name: product.name().to_string(),
        description: product.description().to_string(),
        category: product.category().to_string(),
        status: product.status(),
        base_price_numerator,
        base_price_denominator,
        effective_price_numerator,
        effective_price_denominator,
        discount_active: product.discount().is_some_and(|d| d.is_valid_at(at)),
        priced_at: at,
        created_at: product.created_at(),
        updated_at: product.updated_at(),
    })
}

/// Single product by id.
#[derive(Debug)]
pub struct GetProductQuery<R, K> {
    read_model: R,
    clock: K,
    pricing: PricingCalculator,
}

impl<R: ProductReadModel, K: Clock> GetProductQuery<R, K> {
    pub fn new(read_model: R, clock: K) -> Self {
        Self {
            read_model,
            clock,
            pricing: PricingCalculator::new(),
        }
    }

    /// Priced at the clock's current time.
    pub fn execute(&self, id: &ProductId) -> Result<ProductView, QueryError> {
        self.execute_at(id, self.clock.now())
    }

    /// Priced as of `at`, e.g. to quote a future-dated discount.
    #[instrument(skip(self, id), fields(product_id = %id), err)]
    pub fn execute_at(&self, id: &ProductId, at: DateTime<Utc>) -> Result<ProductView, QueryError> {
        let record = self.read_model.get_by_id(id)?;
        Ok(price_record(record, &self.pricing, at)?)
    }
}

/// Input of [`ListProductsQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListProducts {
    pub category: Option<String>,
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
    /// As-of pricing time; the clock's `now` when absent.
    pub at: Option<DateTime<Utc>>,
}

/// Active products, optionally in one category, paged by id.
#[derive(Debug)]
pub struct ListProductsQuery<R, K> {
    read_model: R,
    clock: K,
    pricing: PricingCalculator,
    limits: PageLimits,
}

impl<R: ProductReadModel, K: Clock> ListProductsQuery<R, K> {
    pub fn new(read_model: R, clock: K, limits: PageLimits) -> Self {
        Self {
            read_model,
            clock,
            pricing: PricingCalculator::new(),
            limits,
        }
    }

    /// Records that cannot be priced are skipped and logged.
    #[instrument(skip(self), err)]
    pub fn execute(&self, request: ListProducts) -> Result<ProductViewPage, QueryError> {
        let page_size = self.limits.clamp(request.page_size);
        let page = self.read_model.list_active(
            request.category.as_deref(),
            page_size,
            request.page_token.as_deref(),
        )?;

        let at = request.at.unwrap_or_else(|| self.clock.now());
        let mut products = Vec::with_capacity(page.records.len());
        for record in page.records {
            let product_id = record.product_id.clone();
            match price_record(record, &self.pricing, at) {
                Ok(view) => products.push(view),
                Err(e) => warn!(%product_id, error = %e, "skipping unpriceable product"),
            }
        }

        Ok(ProductViewPage {
            products,
            next_page_token: page.next_page_token,
        })
    }
}
