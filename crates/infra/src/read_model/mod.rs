//! Read-side access to stored products.
//!
//! The read model returns raw [`ProductRecord`]s; turning them into priced
//! views is the job of [`crate::queries`].

use std::sync::Arc;

use pricebook_products::ProductId;

use crate::store::{ProductRecord, StoreError};

/// One page of results plus the token for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            next_page_token: None,
        }
    }

    /// Build a page from up to `page_size + 1` fetched items ordered by key.
    ///
    /// The extra item only signals that another page exists; the token is the
    /// key of the last item kept.
    pub fn from_overfetch(mut items: Vec<T>, page_size: usize, key: impl Fn(&T) -> String) -> Self {
        if items.len() > page_size {
            items.truncate(page_size);
            let next_page_token = items.last().map(key);
            Self {
                records: items,
                next_page_token,
            }
        } else {
            Self {
                records: items,
                next_page_token: None,
            }
        }
    }
}

/// Page size actually served by a read model: at least one record.
///
/// Upper bounds are a query concern (see [`crate::config::PageLimits`]).
pub fn served_page_size(page_size: usize) -> usize {
    page_size.max(1)
}

/// Queries over the `products` table.
pub trait ProductReadModel: Send + Sync {
    fn get_by_id(&self, id: &ProductId) -> Result<ProductRecord, StoreError>;

    /// Active products ordered by id, starting after `page_token`.
    ///
    /// A `page_size` of zero is served as one.
    fn list_active(
        &self,
        category: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<Page<ProductRecord>, StoreError>;
}

impl<T: ProductReadModel + ?Sized> ProductReadModel for Arc<T> {
    fn get_by_id(&self, id: &ProductId) -> Result<ProductRecord, StoreError> {
        (**self).get_by_id(id)
    }

    fn list_active(
        &self,
        category: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<Page<ProductRecord>, StoreError> {
        (**self).list_active(category, page_size, page_token)
    }
}
