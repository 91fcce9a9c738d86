/// Product administration
///
/// Every operation here is admin-only and checks the caller's role before
/// touching the store.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{require_role, Claims, ExecutionScope, Role};
use crate::error::AppError;
use crate::store::{Page, Product, ProductStore};

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationResponse {
    pub current_page: u32,
    pub items_per_page: u32,
    pub total_item_count: u64,
    pub total_page_count: u64,
}

impl PaginationResponse {
    fn new(page: Page, total_item_count: u64) -> Self {
        let per_page = u64::from(page.size.max(1));
        Self {
            current_page: page.number,
            items_per_page: page.size,
            total_item_count,
            total_page_count: (total_item_count + per_page - 1) / per_page,
        }
    }
}

pub struct ProductService {
    products: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    fn admin(scope: &ExecutionScope) -> Result<&Claims, AppError> {
        let claims = scope.claims()?;
        require_role(claims, Role::Admin)?;
        Ok(claims)
    }

    pub async fn create_product(
        &self,
        scope: &ExecutionScope,
        input: ProductInput,
    ) -> Result<Uuid, AppError> {
        let claims = Self::admin(scope)?;

        let product = Product {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            price: input.price,
            image_file_name: input.image_file_name,
            created_at: Utc::now(),
            created_by: claims.full_name().to_string(),
            updated_at: None,
            updated_by: None,
        };
        self.products.create(&product).await?;

        tracing::info!(product_id = %product.id, user_id = %claims.subject(), "Product created");
        Ok(product.id)
    }

    pub async fn detail_product(
        &self,
        scope: &ExecutionScope,
        id: Uuid,
    ) -> Result<Option<Product>, AppError> {
        Self::admin(scope)?;
        self.products.get_by_id(id).await
    }

    /// Returns `None` if no live product has `id`.
    pub async fn edit_product(
        &self,
        scope: &ExecutionScope,
        id: Uuid,
        input: ProductInput,
    ) -> Result<Option<Uuid>, AppError> {
        let claims = Self::admin(scope)?;

        let Some(mut product) = self.products.get_by_id(id).await? else {
            return Ok(None);
        };

        product.name = input.name;
        product.description = input.description;
        product.price = input.price;
        product.image_file_name = input.image_file_name;
        product.updated_at = Some(Utc::now());
        product.updated_by = Some(claims.full_name().to_string());
        self.products.update(&product).await?;

        tracing::info!(product_id = %id, user_id = %claims.subject(), "Product edited");
        Ok(Some(id))
    }

    /// Returns `false` if no live product has `id`.
    pub async fn delete_product(&self, scope: &ExecutionScope, id: Uuid) -> Result<bool, AppError> {
        let claims = Self::admin(scope)?;

        if self.products.get_by_id(id).await?.is_none() {
            return Ok(false);
        }
        self.products
            .soft_delete(id, Utc::now(), claims.full_name())
            .await?;

        tracing::info!(product_id = %id, user_id = %claims.subject(), "Product deleted");
        Ok(true)
    }

    pub async fn list_products_admin(
        &self,
        scope: &ExecutionScope,
        page: Page,
    ) -> Result<(Vec<Product>, PaginationResponse), AppError> {
        Self::admin(scope)?;
        let (items, total) = self.products.list(page).await?;
        Ok((items, PaginationResponse::new(page, total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::store::InMemoryProductStore;
    use chrono::Duration;

    fn scope_for(role: Role) -> ExecutionScope {
        let claims = Claims::new(
            Uuid::new_v4(),
            "someone@example.com",
            "Store Admin",
            role,
            Utc::now(),
            Duration::hours(1),
            "test",
        )
        .unwrap();
        ExecutionScope::root("/product.ProductService/CreateProduct").attach(claims)
    }

    fn input(name: &str) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: "A thing".to_string(),
            price: 12.5,
            image_file_name: "thing.png".to_string(),
        }
    }

    fn service() -> ProductService {
        ProductService::new(Arc::new(InMemoryProductStore::new()))
    }

    #[tokio::test]
    async fn test_customer_is_forbidden_everywhere() {
        let service = service();
        let customer = scope_for(Role::Customer);
        let id = Uuid::new_v4();
        let page = Page { number: 1, size: 10 };

        let forbidden = |r: Result<(), AppError>| {
            matches!(r, Err(AppError::Auth(AuthError::Forbidden)))
        };

        assert!(forbidden(service.create_product(&customer, input("x")).await.map(|_| ())));
        assert!(forbidden(service.detail_product(&customer, id).await.map(|_| ())));
        assert!(forbidden(service.edit_product(&customer, id, input("x")).await.map(|_| ())));
        assert!(forbidden(service.delete_product(&customer, id).await.map(|_| ())));
        assert!(forbidden(service.list_products_admin(&customer, page).await.map(|_| ())));
    }

    #[tokio::test]
    async fn test_admin_product_lifecycle() {
        let service = service();
        let admin = scope_for(Role::Admin);

        let id = service.create_product(&admin, input("Lamp")).await.unwrap();
        let created = service.detail_product(&admin, id).await.unwrap().unwrap();
        assert_eq!(created.name, "Lamp");
        assert_eq!(created.created_by, "Store Admin");

        assert_eq!(
            service.edit_product(&admin, id, input("Desk Lamp")).await.unwrap(),
            Some(id)
        );
        let edited = service.detail_product(&admin, id).await.unwrap().unwrap();
        assert_eq!(edited.name, "Desk Lamp");
        assert_eq!(edited.updated_by.as_deref(), Some("Store Admin"));

        assert!(service.delete_product(&admin, id).await.unwrap());
        assert_eq!(service.detail_product(&admin, id).await.unwrap(), None);
        assert!(!service.delete_product(&admin, id).await.unwrap());
        assert_eq!(service.edit_product(&admin, id, input("Gone")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_pagination_counts() {
        let service = service();
        let admin = scope_for(Role::Admin);
        for i in 0..7 {
            service.create_product(&admin, input(&format!("p{}", i))).await.unwrap();
        }

        let (items, pagination) = service
            .list_products_admin(&admin, Page { number: 2, size: 3 })
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(
            pagination,
            PaginationResponse {
                current_page: 2,
                items_per_page: 3,
                total_item_count: 7,
                total_page_count: 3,
            }
        );
    }

    #[test]
    fn test_page_count_of_empty_catalog() {
        assert_eq!(PaginationResponse::new(Page { number: 1, size: 10 }, 0).total_page_count, 0);
    }
}
