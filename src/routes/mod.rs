mod auth;
mod product;
mod public;
pub mod response;

pub use auth::{get_profile, login, logout, register};
pub use product::{
    create_product, delete_product, detail_product, edit_product, list_products_admin,
};
pub use public::{health_check, hello_world};
