//! Product CRUD and search endpoints.
//!
//! Mutations and the point read go through the catalog service (primary
//! store plus read-through cache). The list endpoint queries only the
//! projected read model, so its results trail mutations until the
//! consumer catches up.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use broker::InMemoryBroker;
use catalog::{
    CatalogService, InMemoryProductCache, InMemoryProductRepository, Product, UpdateProduct,
};
use catalog::service::CreateProduct;
use common::ProductId;
use search::{ProductQuery, ReadStore, row::split_tags};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ReadStore> {
    pub catalog: CatalogService<InMemoryProductRepository, InMemoryProductCache, InMemoryBroker>,
    pub read_store: S,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub name_prefix: Option<String>,
    pub category: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: u32,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price_cents: product.price_cents,
            stock: product.stock,
            tags: product.tags.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            user_id: product.user_id.to_string(),
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub items: Vec<ProductResponse>,
    pub total: u64,
}

// -- Handlers --

/// POST /products — create a product through the catalog service.
#[tracing::instrument(skip(state, req), fields(name = %req.name))]
pub async fn create<S: ReadStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProduct>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.catalog.create(req).await?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(ProductResponse::from(&product)),
    ))
}

/// GET /products/:id — point read through the catalog cache.
#[tracing::instrument(skip(state))]
pub async fn get<S: ReadStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = parse_product_id(&id)?;
    let product = state
        .catalog
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(ProductResponse::from(&product)))
}

/// GET /products — filtered query against the projected read model.
#[tracing::instrument(skip(state))]
pub async fn list<S: ReadStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = ProductQuery {
        name_prefix: params.name_prefix,
        category: params.category,
        min_price_cents: params.min_price_cents,
        max_price_cents: params.max_price_cents,
        limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
        offset: params.offset.unwrap_or(0),
    };

    let rows = state.read_store.query(&query).await?;
    let total = state.read_store.count().await?;

    let items = rows
        .iter()
        .map(|row| ProductResponse {
            id: row.id.to_string(),
            name: row.name.clone(),
            price_cents: row.price_cents,
            stock: row.stock,
            tags: split_tags(&row.tags),
            category: row.category.clone(),
            description: row.description.clone(),
            user_id: row.user_id.to_string(),
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(SearchResponse { items, total }))
}

/// PUT /products/:id — partial update; unset fields keep their values.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: ReadStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProduct>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = parse_product_id(&id)?;
    let product = state.catalog.update(id, req).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// DELETE /products/:id — delete a product and publish the tombstone
/// event.
#[tracing::instrument(skip(state))]
pub async fn remove<S: ReadStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ApiError> {
    let id = parse_product_id(&id)?;
    state.catalog.delete(id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid product id: {e}")))?;
    Ok(ProductId::from(uuid))
}
