/// Middleware module
///
/// Interceptors composed around every RPC route in `startup::run`.

mod auth_middleware;
mod request_tracing;

pub use auth_middleware::{AuthGate, AuthMiddleware, GateDecision};
pub use request_tracing::RequestTracing;
