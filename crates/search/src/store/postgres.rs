//! PostgreSQL-backed read store.

use async_trait::async_trait;
use common::{ProductId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, SearchError};
use crate::row::ProductRow;
use crate::store::{ProductQuery, ReadStore};

const SELECT_COLUMNS: &str =
    "id, name, price_cents, stock, tags, category, description, user_id, created_at, updated_at";

/// Read store over a PostgreSQL pool.
///
/// The `products` table is indexed by id, name (prefix), category and
/// price; see `migrations/001_create_products_table.sql`.
#[derive(Clone)]
pub struct PostgresReadStore {
    pool: PgPool,
}

impl PostgresReadStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<ProductRow> {
        let stock: i64 = row.try_get("stock")?;
        let stock = u32::try_from(stock)
            .map_err(|_| SearchError::StoreUnavailable(format!("stock out of range: {stock}")))?;

        Ok(ProductRow {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price_cents: row.try_get("price_cents")?,
            stock,
            tags: row.try_get("tags")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Escapes LIKE metacharacters so a prefix filter matches literally.
fn escape_like(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl ReadStore for PostgresReadStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<ProductRow>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn upsert(&self, row: &ProductRow) -> Result<()> {
        // Single atomic statement: concurrent consumers processing the
        // same id cannot interleave a lost insert-then-update.
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, price_cents, stock, tags, category, description, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price_cents = EXCLUDED.price_cents,
                stock = EXCLUDED.stock,
                tags = EXCLUDED.tags,
                category = EXCLUDED.category,
                description = EXCLUDED.description,
                user_id = EXCLUDED.user_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(&row.name)
        .bind(row.price_cents)
        .bind(row.stock as i64)
        .bind(&row.tags)
        .bind(&row.category)
        .bind(&row.description)
        .bind(row.user_id.as_uuid())
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_by_id(&self, id: ProductId) -> Result<()> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query(&self, query: &ProductQuery) -> Result<Vec<ProductRow>> {
        let mut builder = sqlx::QueryBuilder::new(format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE TRUE"
        ));

        if let Some(ref prefix) = query.name_prefix {
            builder.push(" AND name LIKE ");
            builder.push_bind(format!("{}%", escape_like(prefix)));
        }
        if let Some(ref category) = query.category {
            builder.push(" AND category = ");
            builder.push_bind(category.clone());
        }
        if let Some(min) = query.min_price_cents {
            builder.push(" AND price_cents >= ");
            builder.push_bind(min);
        }
        if let Some(max) = query.max_price_cents {
            builder.push(" AND price_cents <= ");
            builder.push_bind(max);
        }

        builder.push(" ORDER BY id ASC LIMIT ");
        builder.push_bind(query.limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
