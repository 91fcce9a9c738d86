/// Authentication module
///
/// Credential codec, revocation cache, execution scope, role policy and
/// password hashing.

mod claims;
mod jwt;
mod password;
mod policy;
mod revocation;
mod scope;

pub use claims::{Claims, Role};
pub use jwt::{extract_bearer, TokenCodec};
pub use password::{hash_password, verify_password, HASH_COST};
pub use policy::require_role;
pub use revocation::{RevocationCache, RevocationStore};
pub use scope::ExecutionScope;
