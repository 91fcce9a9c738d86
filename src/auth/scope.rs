/// Request Execution Scope
///
/// Carries verified claims from the authentication middleware to route
/// handlers and services. Scopes are immutable: `attach` derives a new scope
/// and leaves the original untouched.

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone)]
pub struct ExecutionScope {
    request_id: Arc<str>,
    operation: Arc<str>,
    claims: Option<Arc<Claims>>,
}

impl ExecutionScope {
    /// Fresh scope for one inbound call, carrying no identity.
    pub fn root(operation: &str) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string().into(),
            operation: operation.into(),
            claims: None,
        }
    }

    /// Derive a scope carrying `claims`.
    pub fn attach(&self, claims: Claims) -> Self {
        Self {
            request_id: Arc::clone(&self.request_id),
            operation: Arc::clone(&self.operation),
            claims: Some(Arc::new(claims)),
        }
    }

    /// Claims attached by the authentication middleware.
    ///
    /// # Errors
    /// `NoClaimsPresent` if the call never passed authentication. Handlers
    /// behind the middleware never see this.
    pub fn claims(&self) -> Result<&Claims, AuthError> {
        self.claims.as_deref().ok_or(AuthError::NoClaimsPresent)
    }

    pub fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl FromRequest for ExecutionScope {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let scope = req.extensions().get::<ExecutionScope>().cloned();
        ready(scope.ok_or_else(|| {
            AppError::Internal("execution scope missing; is AuthMiddleware installed?".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use chrono::{Duration, Utc};

    fn sample_claims() -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "user@example.com",
            "Some User",
            Role::Customer,
            Utc::now(),
            Duration::hours(1),
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_root_scope_has_no_claims() {
        let scope = ExecutionScope::root("/auth.AuthService/Login");
        assert_eq!(scope.claims(), Err(AuthError::NoClaimsPresent));
        assert!(!scope.is_authenticated());
        assert_eq!(scope.operation(), "/auth.AuthService/Login");
    }

    #[test]
    fn test_attach_leaves_original_untouched() {
        let root = ExecutionScope::root("/auth.AuthService/GetProfile");
        let claims = sample_claims();

        let derived = root.attach(claims.clone());

        assert!(root.claims().is_err());
        assert_eq!(derived.claims().unwrap(), &claims);
        assert_eq!(derived.request_id(), root.request_id());
        assert_eq!(derived.operation(), root.operation());
    }

    #[test]
    fn test_extractor_reads_scope_from_extensions() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        let scope = ExecutionScope::root("/x").attach(sample_claims());
        req.extensions_mut().insert(scope.clone());

        let extracted = futures::executor::block_on(ExecutionScope::extract(&req)).unwrap();
        assert_eq!(extracted.request_id(), scope.request_id());
        assert!(extracted.is_authenticated());
    }

    #[test]
    fn test_extractor_fails_without_middleware() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        assert!(futures::executor::block_on(ExecutionScope::extract(&req)).is_err());
    }
}
