/// Product persistence
///
/// Products are soft-deleted: a deleted product keeps its row but is hidden
/// from every read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_file_name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

/// Page request, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn offset(&self) -> u64 {
        u64::from(self.number.saturating_sub(1)) * u64::from(self.size)
    }
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, product: &Product) -> Result<(), AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    /// Overwrites name, description, price, image and the update audit fields.
    async fn update(&self, product: &Product) -> Result<(), AppError>;

    async fn soft_delete(
        &self,
        id: Uuid,
        deleted_at: DateTime<Utc>,
        deleted_by: &str,
    ) -> Result<(), AppError>;

    /// One page of live products, newest first, plus the total live count.
    async fn list(&self, page: Page) -> Result<(Vec<Product>, u64), AppError>;
}

type ProductRow = (
    Uuid,
    String,
    String,
    f64,
    String,
    DateTime<Utc>,
    String,
    Option<DateTime<Utc>>,
    Option<String>,
);

fn product_from_row(row: ProductRow) -> Product {
    let (id, name, description, price, image_file_name, created_at, created_by, updated_at, updated_by) =
        row;
    Product {
        id,
        name,
        description,
        price,
        image_file_name,
        created_at,
        created_by,
        updated_at,
        updated_by,
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image_file_name, created_at, created_by, updated_at, updated_by";

/// Postgres-backed product store
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn create(&self, product: &Product) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, image_file_name, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_file_name)
        .bind(product.created_at)
        .bind(&product.created_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let query = format!(
            "SELECT {} FROM products WHERE id = $1 AND is_deleted = false",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query_as::<_, ProductRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(product_from_row))
    }

    async fn update(&self, product: &Product) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE products
            SET name = $1, description = $2, price = $3, image_file_name = $4,
                updated_at = $5, updated_by = $6
            WHERE id = $7 AND is_deleted = false
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_file_name)
        .bind(product.updated_at)
        .bind(&product.updated_by)
        .bind(product.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn soft_delete(
        &self,
        id: Uuid,
        deleted_at: DateTime<Utc>,
        deleted_by: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE products
            SET is_deleted = true, deleted_at = $1, deleted_by = $2
            WHERE id = $3
            "#,
        )
        .bind(deleted_at)
        .bind(deleted_by)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, page: Page) -> Result<(Vec<Product>, u64), AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE is_deleted = false",
        )
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {} FROM products WHERE is_deleted = false ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProductRow>(&query)
            .bind(i64::from(page.size))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(product_from_row).collect(), total.max(0) as u64))
    }
}

/// Product store held in process memory
#[derive(Default)]
pub struct InMemoryProductStore {
    // id -> (product, deleted)
    products: RwLock<HashMap<Uuid, (Product, bool)>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AppError {
        AppError::Internal("product store lock poisoned".to_string())
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn create(&self, product: &Product) -> Result<(), AppError> {
        let mut products = self.products.write().map_err(|_| Self::poisoned())?;
        products.insert(product.id, (product.clone(), false));
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        Ok(products
            .get(&id)
            .filter(|(_, deleted)| !deleted)
            .map(|(product, _)| product.clone()))
    }

    async fn update(&self, product: &Product) -> Result<(), AppError> {
        let mut products = self.products.write().map_err(|_| Self::poisoned())?;
        if let Some((existing, false)) = products.get_mut(&product.id) {
            existing.name = product.name.clone();
            existing.description = product.description.clone();
            existing.price = product.price;
            existing.image_file_name = product.image_file_name.clone();
            existing.updated_at = product.updated_at;
            existing.updated_by = product.updated_by.clone();
        }
        Ok(())
    }

    async fn soft_delete(
        &self,
        id: Uuid,
        _deleted_at: DateTime<Utc>,
        _deleted_by: &str,
    ) -> Result<(), AppError> {
        let mut products = self.products.write().map_err(|_| Self::poisoned())?;
        if let Some((_, deleted)) = products.get_mut(&id) {
            *deleted = true;
        }
        Ok(())
    }

    async fn list(&self, page: Page) -> Result<(Vec<Product>, u64), AppError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        let mut live: Vec<Product> = products
            .values()
            .filter(|(_, deleted)| !deleted)
            .map(|(product, _)| product.clone())
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = live.len() as u64;
        let items = live
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();
        Ok((items, total))
    }
}
