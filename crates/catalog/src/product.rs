//! The write-side product entity.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use events::{ProductPatch, ProductSnapshot};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const TAGS_MAX: usize = 5;

/// A product as stored in the primary (document) store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price_cents: i64,
    pub stock: u32,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a caller may change on an existing product.
///
/// `None` leaves the stored value untouched. The patch published for
/// the mutation carries exactly the fields that were set here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub description: Option<String>,
}

fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if name.trim().is_empty() {
        return Err(CatalogError::Validation("name cannot be blank".to_string()));
    }
    if len < NAME_MIN || len > NAME_MAX {
        return Err(CatalogError::Validation(format!(
            "name must be between {NAME_MIN} and {NAME_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<()> {
    if tags.is_empty() {
        return Err(CatalogError::Validation("tags cannot be empty".to_string()));
    }
    if tags.len() > TAGS_MAX {
        return Err(CatalogError::Validation(format!(
            "tags cannot be more than {TAGS_MAX}"
        )));
    }
    Ok(())
}

fn validate_price(price_cents: i64) -> Result<()> {
    if price_cents <= 0 {
        return Err(CatalogError::Validation(
            "price must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

impl Product {
    /// Creates a new product with a fresh time-ordered id.
    ///
    /// `created_at` and `updated_at` start equal; `created_at` never
    /// changes afterwards.
    pub fn create(
        name: impl Into<String>,
        price_cents: i64,
        stock: u32,
        tags: Vec<String>,
        category: Option<String>,
        description: Option<String>,
        user_id: UserId,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        validate_tags(&tags)?;
        validate_price(price_cents)?;
        if stock == 0 {
            return Err(CatalogError::Validation(
                "stock must be greater than zero".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            name,
            price_cents,
            stock,
            tags,
            category,
            description,
            user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an update, returning the new entity state and the patch
    /// describing exactly what changed (for the `Updated` event).
    pub fn apply_update(&self, update: UpdateProduct) -> Result<(Self, ProductPatch)> {
        if let Some(ref name) = update.name {
            validate_name(name)?;
        }
        if let Some(ref tags) = update.tags {
            validate_tags(tags)?;
        }
        if let Some(price_cents) = update.price_cents {
            validate_price(price_cents)?;
        }

        let now = Utc::now();
        let next = Self {
            id: self.id,
            name: update.name.clone().unwrap_or_else(|| self.name.clone()),
            price_cents: update.price_cents.unwrap_or(self.price_cents),
            stock: update.stock.unwrap_or(self.stock),
            tags: update.tags.clone().unwrap_or_else(|| self.tags.clone()),
            category: update.category.clone().or_else(|| self.category.clone()),
            description: update
                .description
                .clone()
                .or_else(|| self.description.clone()),
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: now,
        };

        let patch = ProductPatch {
            id: self.id,
            name: update.name,
            price_cents: update.price_cents,
            stock: update.stock,
            tags: update.tags,
            category: update.category,
            description: update.description,
            user_id: None,
            created_at: None,
            updated_at: now,
        };

        Ok((next, patch))
    }

    /// Full state snapshot for the `Created` event.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            name: self.name.clone(),
            price_cents: self.price_cents,
            stock: self.stock,
            tags: self.tags.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
