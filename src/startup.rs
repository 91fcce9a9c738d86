use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{RevocationStore, TokenCodec};
use crate::middleware::{AuthGate, AuthMiddleware, RequestTracing};
use crate::routes::{
    create_product, delete_product, detail_product, edit_product, get_profile, health_check,
    hello_world, list_products_admin, login, logout, register,
};
use crate::services::{ProductService, SessionService};
use crate::store::{IdentityStore, ProductStore};

/// Process-wide collaborators, built once at boot and shared by every worker
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub revocations: Arc<dyn RevocationStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub products: Arc<dyn ProductStore>,
    pub public_operations: Vec<String>,
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let gate = Arc::new(AuthGate::new(
        state.codec.clone(),
        state.revocations.clone(),
        state.public_operations,
    ));
    let sessions = web::Data::new(SessionService::new(
        state.identities,
        state.codec,
        state.revocations,
    ));
    let products = web::Data::new(ProductService::new(state.products));

    let server = HttpServer::new(move || {
        App::new()
            // Registered last runs first: tracing sees rejected calls too
            .wrap(AuthMiddleware::new(gate.clone()))
            .wrap(RequestTracing)
            .app_data(sessions.clone())
            .app_data(products.clone())
            .route("/health_check", web::get().to(health_check))
            .route("/service.HelloWorldService/HelloWorld", web::post().to(hello_world))
            .service(
                web::scope("/auth.AuthService")
                    .route("/Register", web::post().to(register))
                    .route("/Login", web::post().to(login))
                    .route("/Logout", web::post().to(logout))
                    .route("/GetProfile", web::post().to(get_profile)),
            )
            .service(
                web::scope("/product.ProductService")
                    .route("/CreateProduct", web::post().to(create_product))
                    .route("/DetailProduct", web::post().to(detail_product))
                    .route("/EditProduct", web::post().to(edit_product))
                    .route("/DeleteProduct", web::post().to(delete_product))
                    .route("/ListProductAdmin", web::post().to(list_products_admin)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
