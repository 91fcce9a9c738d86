/// Persistence collaborators
///
/// Traits consumed by the services, with Postgres implementations for
/// production and in-memory ones for tests and local runs.

mod identity;
mod product;

pub use identity::{Identity, IdentityStore, InMemoryIdentityStore, PgIdentityStore};
pub use product::{InMemoryProductStore, Page, PgProductStore, Product, ProductStore};
