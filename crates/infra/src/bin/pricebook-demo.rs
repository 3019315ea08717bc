//! Walks one product through its lifecycle and prints the priced views.
//!
//! Backend and log format come from the environment (see `CatalogConfig`).

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use tracing::info;

use pricebook_infra::clock::{Clock, SystemClock};
use pricebook_infra::command_dispatcher::MutationDispatcher;
use pricebook_infra::committer::Committer;
use pricebook_infra::config::{Backend, CatalogConfig};
use pricebook_infra::memory::InMemoryDatabase;
use pricebook_infra::outbox::OutboxRepository;
use pricebook_infra::postgres::PostgresDatabase;
use pricebook_infra::product_service::ProductCommandService;
use pricebook_infra::queries::{GetProductQuery, ListProducts, ListProductsQuery};
use pricebook_infra::read_model::ProductReadModel;
use pricebook_infra::store::{ProductStore, RowSource};
use pricebook_products::{ApplyDiscount, CreateProduct};

fn main() -> anyhow::Result<()> {
    let config = CatalogConfig::from_env().context("loading configuration")?;
    pricebook_observability::init_with(config.log_format);

    match &config.backend {
        Backend::Memory => run(Arc::new(InMemoryDatabase::new()), &config),
        Backend::Postgres { database_url } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("building tokio runtime")?;
            let db = runtime.block_on(async {
                let db = PostgresDatabase::connect(database_url).await?;
                db.migrate().await?;
                Ok::<_, sqlx::Error>(db)
            })?;
            let _guard = runtime.enter();
            run(Arc::new(db), &config)
        }
    }
}

fn run<D>(db: Arc<D>, config: &CatalogConfig) -> anyhow::Result<()>
where
    D: RowSource + Committer + ProductReadModel + 'static,
{
    let clock = Arc::new(SystemClock);
    let service = ProductCommandService::new(MutationDispatcher::new(
        ProductStore::new(db.clone()),
        OutboxRepository::new(),
        db.clone(),
        clock.clone(),
    ));
    let get = GetProductQuery::new(db.clone(), clock.clone());
    let list = ListProductsQuery::new(db, clock.clone(), config.page_limits);

    let id = service.create_product(CreateProduct {
        product_id: None,
        name: "Pour-over Kettle".to_string(),
        description: "Gooseneck, 1L".to_string(),
        category: "kitchen".to_string(),
        base_price_numerator: 1999,
        base_price_denominator: 100,
    })?;
    info!(product_id = %id, "created");
    print_json("created", &get.execute(&id)?)?;

    service.activate_product(&id)?;
    let now = clock.now();
    service.apply_discount(ApplyDiscount {
        product_id: id.clone(),
        percentage_numerator: 20,
        percentage_denominator: 100,
        start_at: now,
        end_at: now + Duration::days(7),
    })?;
    print_json("discounted", &get.execute(&id)?)?;
    print_json("quoted after the sale", &get.execute_at(&id, now + Duration::days(8))?)?;

    service.remove_discount(&id)?;
    print_json("discount removed", &get.execute(&id)?)?;

    let page = list.execute(ListProducts {
        category: Some("kitchen".to_string()),
        ..ListProducts::default()
    })?;
    print_json("active kitchen products", &page)?;

    service.archive_product(&id)?;
    print_json("archived", &get.execute(&id)?)?;
    Ok(())
}

fn print_json(label: &str, value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{label}:\n{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
