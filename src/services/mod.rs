mod product;
mod session;

pub use product::{PaginationResponse, ProductInput, ProductService};
pub use session::{
    LoginOutcome, ProfileView, RegisterOutcome, Registration, SessionService,
};
