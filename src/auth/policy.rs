/// Role-based authorization
///
/// Authentication only establishes identity. Each privileged operation states
/// the role it needs by calling `require_role` before doing any work.

use crate::auth::claims::{Claims, Role};
use crate::error::AuthError;

pub fn require_role(claims: &Claims, role: Role) -> Result<(), AuthError> {
    if claims.role() == role {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %claims.subject(),
            required = %role,
            actual = %claims.role(),
            "Role check failed"
        );
        Err(AuthError::Forbidden)
    }
}
