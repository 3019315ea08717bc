//! Product write operations.
//!
//! Each operation reads "now" once, runs the domain method and commits the
//! resulting state change plus events through [`MutationDispatcher::commit`].

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use pricebook_core::DomainResult;
use pricebook_products::{
    AGGREGATE_TYPE, ApplyDiscount, CreateProduct, Product, ProductId, UpdateProduct,
};

use crate::clock::Clock;
use crate::command_dispatcher::{AggregateWrite, CommitOutcome, DispatchError, MutationDispatcher};
use crate::committer::Committer;
use crate::outbox::OutboxStore;
use crate::store::AggregateStore;

#[derive(Debug)]
pub struct ProductCommandService<S, O, C, K> {
    dispatcher: MutationDispatcher<S, O, C, K>,
}

impl<S, O, C, K> ProductCommandService<S, O, C, K>
where
    S: AggregateStore<Product>,
    O: OutboxStore,
    C: Committer,
    K: Clock,
{
    pub fn new(dispatcher: MutationDispatcher<S, O, C, K>) -> Self {
        Self { dispatcher }
    }

    /// Create a product (initially inactive) and record `product.created`.
    ///
    /// A supplied id that already exists fails with a commit conflict.
    #[instrument(skip(self, cmd), fields(name = %cmd.name), err)]
    pub fn create_product(&self, cmd: CreateProduct) -> Result<ProductId, DispatchError> {
        let base_price = cmd.base_price()?;
        let id = cmd.product_id.unwrap_or_else(ProductId::generate);
        let now = self.dispatcher.now();

        let mut product = Product::new(
            id.clone(),
            cmd.name,
            cmd.description,
            cmd.category,
            base_price,
            now,
        )?;
        self.dispatcher
            .commit(&mut product, AGGREGATE_TYPE, AggregateWrite::Insert)?;

        info!(product_id = %id, "product created");
        Ok(id)
    }

    #[instrument(skip(self, cmd), fields(product_id = %cmd.product_id), err)]
    pub fn update_product(&self, cmd: UpdateProduct) -> Result<CommitOutcome, DispatchError> {
        self.mutate(&cmd.product_id, |product, now| {
            product.update_details(
                cmd.name.as_deref(),
                cmd.description.as_deref(),
                cmd.category.as_deref(),
                now,
            );
            Ok(())
        })
    }

    #[instrument(skip(self, id), fields(product_id = %id), err)]
    pub fn activate_product(&self, id: &ProductId) -> Result<CommitOutcome, DispatchError> {
        self.mutate(id, |product, now| {
            product.activate(now);
            Ok(())
        })
    }

    #[instrument(skip(self, id), fields(product_id = %id), err)]
    pub fn deactivate_product(&self, id: &ProductId) -> Result<CommitOutcome, DispatchError> {
        self.mutate(id, |product, now| {
            product.deactivate(now);
            Ok(())
        })
    }

    /// Archive a product. Writes status and `archived_at`; records no event.
    #[instrument(skip(self, id), fields(product_id = %id), err)]
    pub fn archive_product(&self, id: &ProductId) -> Result<CommitOutcome, DispatchError> {
        self.mutate(id, |product, now| {
            product.archive(now);
            Ok(())
        })
    }

    /// Input is validated before the product is loaded.
    #[instrument(skip(self, cmd), fields(product_id = %cmd.product_id), err)]
    pub fn apply_discount(&self, cmd: ApplyDiscount) -> Result<CommitOutcome, DispatchError> {
        let discount = cmd.discount()?;
        self.mutate(&cmd.product_id, |product, now| product.apply_discount(discount, now))
    }

    #[instrument(skip(self, id), fields(product_id = %id), err)]
    pub fn remove_discount(&self, id: &ProductId) -> Result<CommitOutcome, DispatchError> {
        self.mutate(id, |product, now| {
            product.remove_discount(now);
            Ok(())
        })
    }

    /// Load, run `op`, commit. A domain error aborts before anything is built.
    fn mutate(
        &self,
        id: &ProductId,
        op: impl FnOnce(&mut Product, DateTime<Utc>) -> DomainResult<()>,
    ) -> Result<CommitOutcome, DispatchError> {
        let mut product: Product = self.dispatcher.load(id)?;
        let now = self.dispatcher.now();
        op(&mut product, now)?;
        self.dispatcher
            .commit(&mut product, AGGREGATE_TYPE, AggregateWrite::Update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::InMemoryDatabase;
    use crate::outbox::{OUTBOX_EVENTS, OutboxRecord, OutboxRepository};
    use crate::store::ProductStore;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    type Service = ProductCommandService<
        ProductStore<Arc<InMemoryDatabase>>,
        OutboxRepository,
        Arc<InMemoryDatabase>,
        Arc<FixedClock>,
    >;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap()
    }

    fn setup() -> (Arc<InMemoryDatabase>, Arc<FixedClock>, Service) {
        let db = Arc::new(InMemoryDatabase::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let service = ProductCommandService::new(MutationDispatcher::new(
            ProductStore::new(db.clone()),
            OutboxRepository::new(),
            db.clone(),
            clock.clone(),
        ));
        (db, clock, service)
    }

    fn create(service: &Service) -> ProductId {
        service
            .create_product(CreateProduct {
                product_id: Some("prod-svc-1".parse().unwrap()),
                name: "Blender".to_string(),
                description: "700W".to_string(),
                category: "kitchen".to_string(),
                base_price_numerator: 4999,
                base_price_denominator: 100,
            })
            .unwrap()
    }

    fn event_types(db: &InMemoryDatabase) -> Vec<String> {
        db.rows_in_insert_order(&OUTBOX_EVENTS)
            .iter()
            .map(|row| OutboxRecord::from_row(row).unwrap().event_type)
            .collect()
    }

    #[test]
    fn create_rejects_zero_denominator_without_writing() {
        let (db, _clock, service) = setup();
        let err = service
            .create_product(CreateProduct {
                product_id: None,
                name: "Broken".to_string(),
                description: String::new(),
                category: String::new(),
                base_price_numerator: 1,
                base_price_denominator: 0,
            })
            .unwrap_err();

        assert!(matches!(err, DispatchError::InvalidInput(_)));
        assert_eq!(db.applied_batches(), 0);
    }

    #[test]
    fn operations_on_missing_product_are_not_found() {
        let (_db, _clock, service) = setup();
        let id: ProductId = "nope".parse().unwrap();

        assert!(matches!(service.activate_product(&id), Err(DispatchError::NotFound)));
        assert!(matches!(service.archive_product(&id), Err(DispatchError::NotFound)));
    }

    #[test]
    fn apply_discount_requires_active_product() {
        let (db, _clock, service) = setup();
        let id = create(&service);

        let err = service
            .apply_discount(ApplyDiscount {
                product_id: id,
                percentage_numerator: 10,
                percentage_denominator: 100,
                start_at: t0(),
                end_at: t0() + Duration::days(1),
            })
            .unwrap_err();

        assert!(matches!(err, DispatchError::ProductNotActive));
        assert_eq!(event_types(&db), vec!["product.created"]);
    }

    #[test]
    fn apply_discount_rejects_out_of_range_percentage_before_loading() {
        let (_db, _clock, service) = setup();

        let err = service
            .apply_discount(ApplyDiscount {
                product_id: "missing".parse().unwrap(),
                percentage_numerator: 3,
                percentage_denominator: 2,
                start_at: t0(),
                end_at: t0() + Duration::days(1),
            })
            .unwrap_err();

        assert!(matches!(err, DispatchError::InvalidInput(_)));
    }

    #[test]
    fn repeated_activation_writes_nothing() {
        let (db, clock, service) = setup();
        let id = create(&service);
        service.activate_product(&id).unwrap();
        clock.advance(Duration::minutes(1));

        let outcome = service.activate_product(&id).unwrap();

        assert!(outcome.is_noop());
        assert_eq!(db.applied_batches(), 2);
        assert_eq!(event_types(&db), vec!["product.created", "product.activated"]);
    }
}
