/// Authentication Middleware
///
/// Every call passes through here. Public operations are forwarded with an
/// anonymous scope; everything else needs a bearer token that is neither
/// revoked nor invalid. On success the verified claims are attached to the
/// call's `ExecutionScope`, which handlers extract from request extensions.
///
/// Rejections all render the same 401 body; the reason is only logged.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::{extract_bearer, ExecutionScope, RevocationStore, TokenCodec};
use crate::error::{AppError, AuthError};

/// Terminal state of the gate for one call
#[derive(Debug)]
pub enum GateDecision {
    Anonymous(ExecutionScope),
    Authenticated(ExecutionScope),
    Rejected(AuthError),
}

/// Shared state of the gate
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    revocations: Arc<dyn RevocationStore>,
    public_operations: HashSet<String>,
}

impl AuthGate {
    pub fn new(
        codec: Arc<TokenCodec>,
        revocations: Arc<dyn RevocationStore>,
        public_operations: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            codec,
            revocations,
            public_operations: public_operations.into_iter().collect(),
        }
    }

    pub fn is_public(&self, operation: &str) -> bool {
        self.public_operations.contains(operation)
    }

    /// Run the gate for a call to `operation` carrying `headers`.
    ///
    /// The revocation check runs before signature verification.
    pub fn decide(
        &self,
        operation: &str,
        headers: &actix_web::http::header::HeaderMap,
    ) -> GateDecision {
        let scope = ExecutionScope::root(operation);

        if self.is_public(operation) {
            return GateDecision::Anonymous(scope);
        }

        let token = match extract_bearer(headers) {
            Ok(token) => token,
            Err(e) => return GateDecision::Rejected(e),
        };

        if self.revocations.contains(&token) {
            return GateDecision::Rejected(AuthError::Revoked);
        }

        match self.codec.verify(&token) {
            Ok(claims) => GateDecision::Authenticated(scope.attach(claims)),
            Err(e) => {
                tracing::debug!(operation, cause = %e, "Token verification failed");
                GateDecision::Rejected(AuthError::InvalidOrExpired)
            }
        }
    }
}

/// actix middleware factory wrapping `AuthGate`
pub struct AuthMiddleware {
    gate: Arc<AuthGate>,
}

impl AuthMiddleware {
    pub fn new(gate: Arc<AuthGate>) -> Self {
        Self { gate }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            gate: Arc::clone(&self.gate),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    gate: Arc<AuthGate>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let operation = req.path().to_string();

        let scope = match self.gate.decide(&operation, req.headers()) {
            GateDecision::Anonymous(scope) => scope,
            GateDecision::Authenticated(scope) => {
                if let Ok(claims) = scope.claims() {
                    tracing::debug!(
                        operation = %operation,
                        user_id = %claims.subject(),
                        "Call authenticated"
                    );
                }
                scope
            }
            GateDecision::Rejected(reason) => {
                tracing::warn!(operation = %operation, reason = %reason, "Call rejected");
                let err: Error = AppError::Auth(reason).into();
                return Box::pin(async move { Err::<ServiceResponse<B>, Error>(err) });
            }
        };

        req.extensions_mut().insert(scope);

        let service = Rc::clone(&self.service);
        Box::pin(async move { service.call(req).await })
    }
}
