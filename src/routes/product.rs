/// Product administration RPCs
///
/// `product.ProductService`. All operations require the admin role; the role
/// check happens inside `ProductService`.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::ExecutionScope;
use crate::error::AppError;
use crate::routes::response::{BaseOnly, BaseResponse};
use crate::services::{PaginationResponse, ProductInput, ProductService};
use crate::store::Product;
use crate::validators::{is_valid_description, is_valid_name, is_valid_page, is_valid_price};

#[derive(Deserialize)]
pub struct ProductFields {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image_file_name: String,
}

impl ProductFields {
    fn validate(self) -> Result<ProductInput, AppError> {
        Ok(ProductInput {
            name: is_valid_name("name", &self.name)?,
            description: is_valid_description(&self.description)?,
            price: is_valid_price(self.price)?,
            image_file_name: self.image_file_name.trim().to_string(),
        })
    }
}

#[derive(Deserialize)]
pub struct ProductIdRequest {
    pub id: Uuid,
}

#[derive(Deserialize)]
pub struct EditProductRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: ProductFields,
}

#[derive(Deserialize, Default)]
pub struct PaginationRequest {
    pub current_page: Option<u32>,
    pub items_per_page: Option<u32>,
}

#[derive(Deserialize, Default)]
pub struct ListProductAdminRequest {
    #[serde(default)]
    pub pagination: PaginationRequest,
}

#[derive(Serialize)]
pub struct ProductIdResponse {
    pub base: BaseResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ProductDetail {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_file_name: String,
}

impl From<Product> for ProductDetail {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            image_file_name: product.image_file_name,
        }
    }
}

#[derive(Serialize)]
pub struct DetailProductResponse {
    pub base: BaseResponse,
    #[serde(flatten)]
    pub product: Option<ProductDetail>,
}

#[derive(Serialize)]
pub struct ListProductAdminResponse {
    pub base: BaseResponse,
    pub pagination: PaginationResponse,
    pub data: Vec<ProductDetail>,
}

/// POST /product.ProductService/CreateProduct
pub async fn create_product(
    form: web::Json<ProductFields>,
    scope: ExecutionScope,
    products: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let input = form.into_inner().validate()?;
    let id = products.create_product(&scope, input).await?;

    Ok(HttpResponse::Ok().json(ProductIdResponse {
        base: BaseResponse::success("New Product Created"),
        id: Some(id),
    }))
}

/// POST /product.ProductService/DetailProduct
pub async fn detail_product(
    form: web::Json<ProductIdRequest>,
    scope: ExecutionScope,
    products: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let response = match products.detail_product(&scope, form.id).await? {
        Some(product) => DetailProductResponse {
            base: BaseResponse::success("Product fetched"),
            product: Some(product.into()),
        },
        None => DetailProductResponse {
            base: BaseResponse::not_found("Product not found"),
            product: None,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// POST /product.ProductService/EditProduct
pub async fn edit_product(
    form: web::Json<EditProductRequest>,
    scope: ExecutionScope,
    products: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let EditProductRequest { id, fields } = form.into_inner();
    let input = fields.validate()?;

    let response = match products.edit_product(&scope, id, input).await? {
        Some(id) => ProductIdResponse {
            base: BaseResponse::success("Product updated"),
            id: Some(id),
        },
        None => ProductIdResponse {
            base: BaseResponse::not_found("Product not found"),
            id: None,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// POST /product.ProductService/DeleteProduct
pub async fn delete_product(
    form: web::Json<ProductIdRequest>,
    scope: ExecutionScope,
    products: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let base = if products.delete_product(&scope, form.id).await? {
        BaseResponse::success("Product deleted")
    } else {
        BaseResponse::not_found("Product not found")
    };

    Ok(HttpResponse::Ok().json(BaseOnly::from(base)))
}

/// POST /product.ProductService/ListProductAdmin
pub async fn list_products_admin(
    form: Option<web::Json<ListProductAdminRequest>>,
    scope: ExecutionScope,
    products: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let request = form.map(web::Json::into_inner).unwrap_or_default();
    let page = is_valid_page(
        request.pagination.current_page,
        request.pagination.items_per_page,
    )?;

    let (items, pagination) = products.list_products_admin(&scope, page).await?;

    Ok(HttpResponse::Ok().json(ListProductAdminResponse {
        base: BaseResponse::success("List product admin"),
        pagination,
        data: items.into_iter().map(ProductDetail::from).collect(),
    }))
}
