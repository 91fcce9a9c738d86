/// Operations reachable without a credential

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::routes::response::BaseResponse;
use crate::validators::is_valid_name;

#[derive(Deserialize)]
pub struct HelloWorldRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct HelloWorldResponse {
    pub base: BaseResponse,
    pub message: String,
}

/// POST /service.HelloWorldService/HelloWorld
///
/// Public demo operation.
pub async fn hello_world(form: web::Json<HelloWorldRequest>) -> Result<HttpResponse, AppError> {
    let name = is_valid_name("name", &form.name)?;

    Ok(HttpResponse::Ok().json(HelloWorldResponse {
        base: BaseResponse::success("Success"),
        message: format!("Hello {}", name),
    }))
}

/// GET /health_check
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}
