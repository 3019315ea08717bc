use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricebook_core::{AggregateId, AggregateRoot, ChangeTracker, DomainError, DomainResult, Money};

use crate::discount::Discount;
use crate::event::{
    DiscountApplied, DiscountRemoved, ProductActivated, ProductCreated, ProductDeactivated,
    ProductEvent, ProductUpdated,
};

/// Product identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::generate())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<ProductId> for AggregateId {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl core::str::FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Product status lifecycle.
///
/// `Inactive` is the initial state and `Archived` is terminal. `Draft` is
/// reserved for a future review workflow; no transition enters or leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Inactive,
    Active,
    Archived,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Active => "active",
            ProductStatus::Archived => "archived",
        }
    }
}

impl core::str::FromStr for ProductStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ProductStatus::Draft),
            "inactive" => Ok(ProductStatus::Inactive),
            "active" => Ok(ProductStatus::Active),
            "archived" => Ok(ProductStatus::Archived),
            other => Err(DomainError::invalid_input(format!(
                "unknown product status '{other}'"
            ))),
        }
    }
}

/// Persisted attributes of a product, as tracked by the change tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Name,
    Description,
    Category,
    BasePrice,
    Discount,
    Status,
    ArchivedAt,
}

/// Full persisted state of a product, used to rehydrate the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub base_price: Money,
    pub discount: Option<Discount>,
    pub status: ProductStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate root: Product.
///
/// All transitions take the current time from the caller; the aggregate never
/// reads a wall clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    category: String,
    base_price: Money,
    discount: Option<Discount>,
    status: ProductStatus,
    archived_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    changes: ChangeTracker<ProductField>,
    events: Vec<ProductEvent>,
}

impl Product {
    /// Create a brand-new product: `Inactive`, one `ProductCreated` event, and
    /// every initially written field marked dirty.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        base_price: Money,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("name cannot be empty"));
        }
        if base_price.is_negative() {
            return Err(DomainError::invalid_input("base price cannot be negative"));
        }
        base_price.fraction()?;

        let mut product = Self {
            id,
            name,
            description: description.into(),
            category: category.into(),
            base_price,
            discount: None,
            status: ProductStatus::Inactive,
            archived_at: None,
            created_at: now,
            updated_at: now,
            changes: ChangeTracker::new(),
            events: Vec::new(),
        };

        for field in [
            ProductField::Name,
            ProductField::Description,
            ProductField::Category,
            ProductField::BasePrice,
            ProductField::Status,
        ] {
            product.changes.mark_dirty(field);
        }

        product.events.push(ProductEvent::ProductCreated(ProductCreated {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            occurred_at: now,
        }));

        Ok(product)
    }

    /// Rebuild from persisted state. Emits no events and marks nothing dirty.
    pub fn rehydrate(snapshot: ProductSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            description: snapshot.description,
            category: snapshot.category,
            base_price: snapshot.base_price,
            discount: snapshot.discount,
            status: snapshot.status,
            archived_at: snapshot.archived_at,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            changes: ChangeTracker::new(),
            events: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            base_price: self.base_price.clone(),
            discount: self.discount.clone(),
            status: self.status,
            archived_at: self.archived_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id_typed(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn base_price(&self) -> &Money {
        &self.base_price
    }

    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_archived(&self) -> bool {
        self.status == ProductStatus::Archived
    }

    /// Archived and Draft products accept no lifecycle transition.
    fn is_frozen(&self) -> bool {
        matches!(self.status, ProductStatus::Archived | ProductStatus::Draft)
    }

    /// Update name, description and category.
    ///
    /// `None` or empty values (blank for the name) leave a field untouched. A single
    /// `ProductUpdated` event is raised only if something actually changed.
    /// Archived products are immutable, so this is a no-op for them.
    pub fn update_details(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        now: DateTime<Utc>,
    ) {
        if self.is_archived() {
            return;
        }

        let name = name.filter(|n| !n.trim().is_empty());

        let mut changed = Vec::new();
        if Self::replace_text(&mut self.name, name) {
            changed.push(ProductField::Name);
        }
        if Self::replace_text(&mut self.description, description) {
            changed.push(ProductField::Description);
        }
        if Self::replace_text(&mut self.category, category) {
            changed.push(ProductField::Category);
        }

        if changed.is_empty() {
            return;
        }

        for field in &changed {
            self.changes.mark_dirty(*field);
        }
        self.updated_at = now;
        self.events.push(ProductEvent::ProductUpdated(ProductUpdated {
            product_id: self.id.clone(),
            changed_fields: changed,
            occurred_at: now,
        }));
    }

    /// Inactive -> Active. No-op when already Active, Archived or Draft.
    pub fn activate(&mut self, now: DateTime<Utc>) {
        if self.status == ProductStatus::Active || self.is_frozen() {
            return;
        }

        self.status = ProductStatus::Active;
        self.updated_at = now;
        self.changes.mark_dirty(ProductField::Status);
        self.events.push(ProductEvent::ProductActivated(ProductActivated {
            product_id: self.id.clone(),
            occurred_at: now,
        }));
    }

    /// Active -> Inactive. No-op when already Inactive, Archived or Draft.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        if self.status == ProductStatus::Inactive || self.is_frozen() {
            return;
        }

        self.status = ProductStatus::Inactive;
        self.updated_at = now;
        self.changes.mark_dirty(ProductField::Status);
        self.events.push(ProductEvent::ProductDeactivated(ProductDeactivated {
            product_id: self.id.clone(),
            occurred_at: now,
        }));
    }

    /// Inactive or Active -> Archived (terminal). Sets `archived_at` exactly once.
    ///
    /// Archival raises no domain event. Draft products stay Draft.
    pub fn archive(&mut self, now: DateTime<Utc>) {
        if self.is_frozen() {
            return;
        }

        self.status = ProductStatus::Archived;
        self.archived_at = Some(now);
        self.updated_at = now;
        self.changes.mark_dirty(ProductField::Status);
        self.changes.mark_dirty(ProductField::ArchivedAt);
    }

    /// Apply (or replace) the product's discount.
    ///
    /// Requires an Active product and a discount that is valid at `now`. The
    /// discounted price must stay representable as an `i64` fraction.
    /// On failure the aggregate is left untouched.
    pub fn apply_discount(&mut self, discount: Discount, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ProductStatus::Active {
            return Err(DomainError::ProductNotActive);
        }
        if !discount.is_valid_at(now) {
            return Err(DomainError::InvalidDiscountPeriod);
        }
        discount.discounted(&self.base_price).fraction().map_err(|_| {
            DomainError::invalid_input("discounted price exceeds i64 precision")
        })?;

        let (percentage_numerator, percentage_denominator) = discount.percentage_fraction();
        let event = DiscountApplied {
            product_id: self.id.clone(),
            percentage_numerator,
            percentage_denominator,
            start_at: discount.start_at(),
            end_at: discount.end_at(),
            occurred_at: now,
        };

        self.discount = Some(discount);
        self.updated_at = now;
        self.changes.mark_dirty(ProductField::Discount);
        self.events.push(ProductEvent::DiscountApplied(event));
        Ok(())
    }

    /// Clear the current discount. No-op when none is held or when archived.
    pub fn remove_discount(&mut self, now: DateTime<Utc>) {
        if self.discount.is_none() || self.is_archived() {
            return;
        }

        self.discount = None;
        self.updated_at = now;
        self.changes.mark_dirty(ProductField::Discount);
        self.events.push(ProductEvent::DiscountRemoved(DiscountRemoved {
            product_id: self.id.clone(),
            occurred_at: now,
        }));
    }

    fn replace_text(slot: &mut String, value: Option<&str>) -> bool {
        match value {
            Some(v) if !v.is_empty() && v != slot.as_str() => {
                *slot = v.to_string();
                true
            }
            _ => false,
        }
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;
    type Event = ProductEvent;
    type Field = ProductField;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn pending_events(&self) -> &[Self::Event] {
        &self.events
    }

    fn changes(&self) -> &ChangeTracker<Self::Field> {
        &self.changes
    }

    fn mark_committed(&mut self) {
        self.events.clear();
        self.changes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pricebook_events::Event;

    fn test_product_id() -> ProductId {
        ProductId::new("prod-001".parse().unwrap())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn new_product() -> Product {
        Product::new(
            test_product_id(),
            "Espresso Machine",
            "15 bar pump",
            "kitchen",
            Money::from_fraction(1999, 100).unwrap(),
            t0(),
        )
        .unwrap()
    }

    /// A committed Active product (no pending events, no dirty fields).
    fn active_product() -> Product {
        let mut product = new_product();
        product.activate(t0());
        product.mark_committed();
        product
    }

    fn week_long_discount(start: DateTime<Utc>) -> Discount {
        Discount::from_fraction(20, 100, start, start + Duration::days(7)).unwrap()
    }

    #[test]
    fn new_product_is_inactive_with_single_created_event() {
        let product = new_product();

        assert_eq!(product.status(), ProductStatus::Inactive);
        assert_eq!(product.created_at(), t0());
        assert_eq!(product.updated_at(), t0());
        assert!(product.discount().is_none());
        assert!(product.archived_at().is_none());

        assert_eq!(product.pending_events().len(), 1);
        match &product.pending_events()[0] {
            ProductEvent::ProductCreated(e) => {
                assert_eq!(e.product_id, test_product_id());
                assert_eq!(e.name, "Espresso Machine");
                assert_eq!(e.occurred_at, t0());
            }
            _ => panic!("Expected ProductCreated event"),
        }
    }

    #[test]
    fn new_product_marks_initial_fields_dirty() {
        let product = new_product();
        let changes = product.changes();

        assert!(changes.is_dirty(ProductField::Name));
        assert!(changes.is_dirty(ProductField::Description));
        assert!(changes.is_dirty(ProductField::Category));
        assert!(changes.is_dirty(ProductField::BasePrice));
        assert!(changes.is_dirty(ProductField::Status));
        assert!(!changes.is_dirty(ProductField::Discount));
        assert!(!changes.is_dirty(ProductField::ArchivedAt));
    }

    #[test]
    fn new_product_rejects_blank_name() {
        let err = Product::new(
            test_product_id(),
            "   ",
            "",
            "",
            Money::from_fraction(1, 1).unwrap(),
            t0(),
        )
        .unwrap_err();
        match err {
            DomainError::InvalidInput(_) => {}
            _ => panic!("Expected InvalidInput error for blank name"),
        }
    }

    #[test]
    fn new_product_rejects_negative_price() {
        let err = Product::new(
            test_product_id(),
            "Mug",
            "",
            "",
            Money::from_fraction(-1, 100).unwrap(),
            t0(),
        )
        .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn rehydrate_emits_nothing_and_tracks_nothing() {
        let snapshot = new_product().snapshot();
        let product = Product::rehydrate(snapshot.clone());

        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
        assert_eq!(product.snapshot(), snapshot);
    }

    #[test]
    fn activate_then_deactivate_returns_to_inactive() {
        let mut product = new_product();
        product.mark_committed();

        let t1 = t0() + Duration::minutes(1);
        product.activate(t1);
        assert_eq!(product.status(), ProductStatus::Active);
        assert_eq!(product.updated_at(), t1);
        assert!(product.changes().is_dirty(ProductField::Status));

        let t2 = t1 + Duration::minutes(1);
        product.deactivate(t2);
        assert_eq!(product.status(), ProductStatus::Inactive);
        assert_eq!(product.updated_at(), t2);

        let types: Vec<_> = product.pending_events().iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["product.activated", "product.deactivated"]);
    }

    #[test]
    fn activate_is_idempotent() {
        let mut product = active_product();

        product.activate(t0() + Duration::hours(1));

        assert_eq!(product.status(), ProductStatus::Active);
        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
        assert_eq!(product.updated_at(), t0());
    }

    #[test]
    fn deactivate_inactive_product_is_noop() {
        let mut product = new_product();
        product.mark_committed();

        product.deactivate(t0() + Duration::hours(1));

        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
    }

    #[test]
    fn archive_sets_archived_at_once_without_events() {
        let mut product = active_product();
        let t1 = t0() + Duration::days(1);

        product.archive(t1);
        assert_eq!(product.status(), ProductStatus::Archived);
        assert_eq!(product.archived_at(), Some(t1));
        assert!(product.changes().is_dirty(ProductField::Status));
        assert!(product.changes().is_dirty(ProductField::ArchivedAt));
        assert!(product.pending_events().is_empty());

        product.mark_committed();
        product.archive(t1 + Duration::days(1));
        assert_eq!(product.archived_at(), Some(t1));
        assert!(product.changes().is_empty());
    }

    #[test]
    fn archive_from_inactive() {
        let mut product = new_product();
        product.mark_committed();

        product.archive(t0());
        assert_eq!(product.status(), ProductStatus::Archived);
        assert_eq!(product.archived_at(), Some(t0()));
    }

    #[test]
    fn archived_product_ignores_lifecycle_and_detail_changes() {
        let mut product = active_product();
        product.apply_discount(week_long_discount(t0()), t0()).unwrap();
        product.archive(t0());
        product.mark_committed();
        let before = product.snapshot();

        let later = t0() + Duration::hours(2);
        product.activate(later);
        product.deactivate(later);
        product.update_details(Some("Renamed"), None, None, later);
        product.remove_discount(later);

        assert_eq!(product.snapshot(), before);
        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
    }

    #[test]
    fn apply_discount_on_archived_fails_without_altering_state() {
        let mut product = active_product();
        product.archive(t0());
        product.mark_committed();
        let before = product.snapshot();

        let err = product.apply_discount(week_long_discount(t0()), t0()).unwrap_err();
        assert_eq!(err, DomainError::ProductNotActive);
        assert_eq!(product.snapshot(), before);
    }

    #[test]
    fn apply_discount_on_inactive_fails_with_no_event_and_no_dirty_fields() {
        let mut product = new_product();
        product.mark_committed();

        let err = product.apply_discount(week_long_discount(t0()), t0()).unwrap_err();

        assert_eq!(err, DomainError::ProductNotActive);
        assert!(product.discount().is_none());
        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
    }

    #[test]
    fn apply_discount_not_yet_valid_fails() {
        let mut product = active_product();
        let future = week_long_discount(t0() + Duration::days(1));

        let err = product.apply_discount(future, t0()).unwrap_err();

        assert_eq!(err, DomainError::InvalidDiscountPeriod);
        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
    }

    #[test]
    fn apply_discount_replaces_existing_one() {
        let mut product = active_product();

        product.apply_discount(week_long_discount(t0()), t0()).unwrap();
        let replacement =
            Discount::from_fraction(35, 100, t0(), t0() + Duration::days(2)).unwrap();
        product.apply_discount(replacement.clone(), t0()).unwrap();

        assert_eq!(product.discount(), Some(&replacement));
        assert!(product.changes().is_dirty(ProductField::Discount));
        assert_eq!(product.pending_events().len(), 2);
        match &product.pending_events()[1] {
            ProductEvent::DiscountApplied(e) => {
                assert_eq!((e.percentage_numerator, e.percentage_denominator), (7, 20));
            }
            _ => panic!("Expected DiscountApplied event"),
        }
    }

    #[test]
    fn remove_discount_clears_and_emits() {
        let mut product = active_product();
        product.apply_discount(week_long_discount(t0()), t0()).unwrap();
        product.mark_committed();

        product.remove_discount(t0() + Duration::minutes(5));

        assert!(product.discount().is_none());
        assert!(product.changes().is_dirty(ProductField::Discount));
        assert_eq!(product.pending_events().len(), 1);
        assert_eq!(product.pending_events()[0].event_type(), "discount.removed");
    }

    #[test]
    fn remove_discount_without_discount_is_noop() {
        let mut product = active_product();
        product.remove_discount(t0());

        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
    }

    #[test]
    fn update_details_marks_only_changed_fields() {
        let mut product = new_product();
        product.mark_committed();
        let t1 = t0() + Duration::minutes(3);

        product.update_details(Some("Espresso Machine Pro"), Some(""), Some("kitchen"), t1);

        assert_eq!(product.name(), "Espresso Machine Pro");
        assert_eq!(product.description(), "15 bar pump");
        assert_eq!(product.category(), "kitchen");
        assert_eq!(product.updated_at(), t1);
        assert_eq!(
            product.changes().dirty_fields().collect::<Vec<_>>(),
            vec![ProductField::Name]
        );
        match &product.pending_events()[..] {
            [ProductEvent::ProductUpdated(e)] => {
                assert_eq!(e.changed_fields, vec![ProductField::Name]);
            }
            _ => panic!("Expected exactly one ProductUpdated event"),
        }
    }

    #[test]
    fn update_details_without_changes_is_silent() {
        let mut product = new_product();
        product.mark_committed();

        product.update_details(Some("Espresso Machine"), None, None, t0() + Duration::hours(1));

        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
        assert_eq!(product.updated_at(), t0());
    }

    #[test]
    fn events_keep_operation_order() {
        let mut product = new_product();
        product.activate(t0());
        product.apply_discount(week_long_discount(t0()), t0()).unwrap();
        product.update_details(None, None, Some("appliances"), t0());
        product.remove_discount(t0());
        product.deactivate(t0());

        let types: Vec<_> = product.pending_events().iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "product.created",
                "product.activated",
                "discount.applied",
                "product.updated",
                "discount.removed",
                "product.deactivated",
            ]
        );
    }

    #[test]
    fn mark_committed_clears_events_and_dirty_flags() {
        let mut product = new_product();
        product.mark_committed();

        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ProductStatus::Draft,
            ProductStatus::Inactive,
            ProductStatus::Active,
            ProductStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<ProductStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn draft_product_accepts_no_lifecycle_transition() {
        let mut snapshot = new_product().snapshot();
        snapshot.status = ProductStatus::Draft;
        let mut product = Product::rehydrate(snapshot.clone());

        let later = t0() + Duration::hours(1);
        product.activate(later);
        product.deactivate(later);
        product.archive(later);

        assert_eq!(product.snapshot(), snapshot);
        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
        assert_eq!(
            product.apply_discount(week_long_discount(t0()), t0()).unwrap_err(),
            DomainError::ProductNotActive
        );
    }

    #[test]
    fn apply_discount_rejects_unrepresentable_discounted_price() {
        let mut product = Product::new(
            test_product_id(),
            "Odd Lot",
            "",
            "misc",
            Money::from_fraction(1, 999_999_937).unwrap(),
            t0(),
        )
        .unwrap();
        product.activate(t0());
        product.mark_committed();
        let before = product.snapshot();

        let discount =
            Discount::from_fraction(1, 9_999_999_967, t0(), t0() + Duration::days(1)).unwrap();
        let err = product.apply_discount(discount, t0()).unwrap_err();

        match err {
            DomainError::InvalidInput(_) => {}
            _ => panic!("Expected InvalidInput error for oversized price"),
        }
        assert_eq!(product.snapshot(), before);
        assert!(product.pending_events().is_empty());
        assert!(product.changes().is_empty());
    }

    #[test]
    fn update_details_ignores_blank_name() {
        let mut product = new_product();
        product.mark_committed();

        product.update_details(Some("   "), Some("  "), None, t0() + Duration::minutes(5));

        assert_eq!(product.name(), "Espresso Machine");
        assert_eq!(product.description(), "  ");
        assert!(!product.changes().is_dirty(ProductField::Name));
        assert!(product.changes().is_dirty(ProductField::Description));
    }

    #[test]
    fn events_serialize_with_stable_shape() {
        let product = new_product();
        let json = serde_json::to_value(&product.pending_events()[0]).unwrap();

        assert_eq!(json["ProductCreated"]["product_id"], "prod-001");
        assert_eq!(json["ProductCreated"]["category"], "kitchen");
    }
}
