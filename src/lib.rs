//! Authentication gateway for the shop RPC services.
//!
//! Every call passes the `AuthMiddleware` gate before reaching a handler.
//! Verified claims travel to handlers in an `ExecutionScope`; revoked tokens
//! are tracked in a process-local `RevocationCache` until they expire.

pub mod auth;
pub mod configuration;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;
