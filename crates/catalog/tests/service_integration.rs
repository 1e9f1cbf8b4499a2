//! Integration tests for the catalog mutation workflow.

use broker::{InMemoryBroker, MessageBroker};
use catalog::{
    CacheConfig, CatalogError, CatalogService, InMemoryProductCache, InMemoryProductRepository,
    ProductCache, ProductRepository, UpdateProduct,
};
use catalog::service::CreateProduct;
use common::UserId;
use events::{
    ProductEvent, TOPIC_PRODUCT_CREATED, TOPIC_PRODUCT_DELETED, TOPIC_PRODUCT_UPDATED,
};
use futures_util::StreamExt;

fn create_input(name: &str) -> CreateProduct {
    CreateProduct {
        name: name.to_string(),
        price_cents: 2_500,
        stock: 10,
        tags: vec!["kitchen".to_string()],
        category: Some("home".to_string()),
        description: Some("Ceramic, 350ml".to_string()),
        user_id: UserId::new(),
    }
}

fn setup() -> (
    CatalogService<InMemoryProductRepository, InMemoryProductCache, InMemoryBroker>,
    InMemoryProductRepository,
    InMemoryProductCache,
    InMemoryBroker,
) {
    let repo = InMemoryProductRepository::new();
    let cache = InMemoryProductCache::new(CacheConfig::default());
    let broker = InMemoryBroker::new();
    let service = CatalogService::new(repo.clone(), cache.clone(), broker.clone());
    (service, repo, cache, broker)
}

#[tokio::test]
async fn create_commits_then_publishes() {
    let (service, repo, _cache, broker) = setup();
    let mut created = broker.subscribe(TOPIC_PRODUCT_CREATED).await.unwrap();

    let product = service.create(create_input("Coffee Mug")).await.unwrap();

    assert_eq!(repo.count().await, 1);
    let delivery = created.next().await.unwrap();
    assert_eq!(delivery.key, product.id.to_string());
    let event: ProductEvent = serde_json::from_slice(&delivery.payload).unwrap();
    assert!(matches!(event, ProductEvent::Created(s) if s.id == product.id));
}

#[tokio::test]
async fn persistence_failure_publishes_nothing() {
    let (service, repo, _cache, broker) = setup();
    repo.fail_next_write();

    let err = service.create(create_input("Coffee Mug")).await.unwrap_err();
    assert!(matches!(err, CatalogError::PersistenceFailed(_)));
    assert_eq!(repo.count().await, 0);
    assert_eq!(broker.published_count(TOPIC_PRODUCT_CREATED).await, 0);
}

#[tokio::test]
async fn publish_failure_is_a_degraded_write() {
    let (service, repo, _cache, broker) = setup();
    // A dropped subscriber makes the next publish fail.
    drop(broker.subscribe(TOPIC_PRODUCT_CREATED).await.unwrap());

    let err = service.create(create_input("Coffee Mug")).await.unwrap_err();

    // The mutation is durable even though the projection is stale.
    assert!(matches!(err, CatalogError::ProjectionPublishFailed { .. }));
    assert_eq!(repo.count().await, 1);
}

#[tokio::test]
async fn update_publishes_patch_with_changed_fields_only() {
    let (service, _repo, _cache, broker) = setup();
    let product = service.create(create_input("Coffee Mug")).await.unwrap();

    let mut updated = broker.subscribe(TOPIC_PRODUCT_UPDATED).await.unwrap();
    service
        .update(
            product.id,
            UpdateProduct {
                price_cents: Some(1_900),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let delivery = updated.next().await.unwrap();
    let event: ProductEvent = serde_json::from_slice(&delivery.payload).unwrap();
    match event {
        ProductEvent::Updated(patch) => {
            assert_eq!(patch.id, product.id);
            assert_eq!(patch.price_cents, Some(1_900));
            assert!(patch.name.is_none());
            assert!(patch.stock.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn update_evicts_the_cache_entry() {
    let (service, _repo, cache, _broker) = setup();
    let product = service.create(create_input("Coffee Mug")).await.unwrap();

    // Warm the cache.
    service.get(product.id).await.unwrap();
    assert!(cache.get(product.id).await.is_some());

    service
        .update(
            product.id,
            UpdateProduct {
                stock: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(cache.get(product.id).await.is_none());
}

#[tokio::test]
async fn delete_publishes_only_the_id() {
    let (service, repo, _cache, broker) = setup();
    let product = service.create(create_input("Coffee Mug")).await.unwrap();

    let mut deleted = broker.subscribe(TOPIC_PRODUCT_DELETED).await.unwrap();
    service.delete(product.id).await.unwrap();

    assert_eq!(repo.count().await, 0);
    let delivery = deleted.next().await.unwrap();
    assert_eq!(delivery.key, product.id.to_string());
    let event: ProductEvent = serde_json::from_slice(&delivery.payload).unwrap();
    assert!(matches!(event, ProductEvent::Deleted(d) if d.id == product.id));
}

#[tokio::test]
async fn delete_missing_product_is_not_found() {
    let (service, _repo, _cache, _broker) = setup();
    let err = service.delete(common::ProductId::new()).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
}

#[tokio::test]
async fn get_reads_through_the_cache() {
    let (service, repo, cache, _broker) = setup();
    let product = service.create(create_input("Coffee Mug")).await.unwrap();

    assert!(cache.get(product.id).await.is_none());
    let fetched = service.get(product.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, product.id);
    assert!(cache.get(product.id).await.is_some());

    // A cache hit survives the repository losing the row.
    repo.delete_by_id(product.id).await.unwrap();
    assert!(service.get(product.id).await.unwrap().is_some());
}
