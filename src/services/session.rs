/// Session Lifecycle
///
/// Registration, login, logout and profile lookup. Expected business
/// outcomes (unknown email, duplicate registration) come back as outcome
/// enums; only faults and failed password checks are errors.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{
    hash_password, verify_password, ExecutionScope, RevocationStore, Role, TokenCodec,
};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::store::{Identity, IdentityStore};

#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, PartialEq)]
pub enum RegisterOutcome {
    Registered { user_id: Uuid },
    PasswordMismatch,
    EmailAlreadyRegistered,
}

#[derive(Debug, PartialEq)]
pub enum LoginOutcome {
    Issued { access_token: String, expires_at: i64 },
    NotRegistered,
}

/// Public view of the caller's identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub role_code: String,
    pub member_since: String,
}

impl From<Identity> for ProfileView {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.id.to_string(),
            full_name: identity.full_name,
            email: identity.email,
            role_code: identity.role.as_str().to_string(),
            member_since: identity.created_at.to_rfc3339(),
        }
    }
}

pub struct SessionService {
    identities: Arc<dyn IdentityStore>,
    codec: Arc<TokenCodec>,
    revocations: Arc<dyn RevocationStore>,
}

impl SessionService {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        codec: Arc<TokenCodec>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            identities,
            codec,
            revocations,
        }
    }

    /// Create a customer identity.
    pub async fn register(&self, registration: Registration) -> Result<RegisterOutcome, AppError> {
        if registration.password != registration.password_confirmation {
            return Ok(RegisterOutcome::PasswordMismatch);
        }

        if self
            .identities
            .get_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Ok(RegisterOutcome::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(&registration.password).await?;
        let identity = Identity {
            id: Uuid::new_v4(),
            created_by: registration.full_name.clone(),
            full_name: registration.full_name,
            email: registration.email,
            password_hash,
            role: Role::Customer,
            created_at: Utc::now(),
            updated_at: None,
            updated_by: None,
        };

        match self.identities.insert(&identity).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration of the same email
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_))) => {
                return Ok(RegisterOutcome::EmailAlreadyRegistered);
            }
            Err(e) => return Err(e),
        }

        tracing::info!(user_id = %identity.id, "User registered");
        Ok(RegisterOutcome::Registered {
            user_id: identity.id,
        })
    }

    /// Check a password and issue an access token.
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` when the email exists but the password
    /// does not match.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let identity = match self.identities.get_by_email(email).await? {
            Some(identity) => identity,
            None => return Ok(LoginOutcome::NotRegistered),
        };

        if !verify_password(password, &identity.password_hash).await? {
            tracing::warn!(user_id = %identity.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let (access_token, claims) = self.codec.issue_for(
            identity.id,
            &identity.email,
            &identity.full_name,
            identity.role,
            Utc::now(),
        )?;

        tracing::info!(user_id = %identity.id, "User logged in");
        Ok(LoginOutcome::Issued {
            access_token,
            expires_at: claims.expires_at(),
        })
    }

    /// Revoke the caller's token for the rest of its natural lifetime.
    /// Repeating the call for the same token succeeds without effect.
    pub async fn logout(&self, scope: &ExecutionScope, raw_token: &str) -> Result<(), AppError> {
        let claims = scope.claims()?;

        match claims.remaining_lifetime(Utc::now()) {
            Some(ttl) => {
                self.revocations.insert(raw_token, ttl);
                tracing::info!(user_id = %claims.subject(), ttl_secs = ttl.as_secs(), "Token revoked");
            }
            None => {
                tracing::debug!(user_id = %claims.subject(), "Token already expired; nothing to revoke");
            }
        }

        Ok(())
    }

    /// Current stored profile of the caller, `None` if the identity is gone.
    pub async fn get_profile(&self, scope: &ExecutionScope) -> Result<Option<ProfileView>, AppError> {
        let claims = scope.claims()?;
        let identity = self.identities.get_by_email(claims.email()).await?;
        Ok(identity.map(ProfileView::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RevocationCache;
    use crate::configuration::JwtSettings;
    use crate::store::InMemoryIdentityStore;

    struct Fixture {
        service: SessionService,
        codec: Arc<TokenCodec>,
        revocations: Arc<RevocationCache>,
        identities: Arc<InMemoryIdentityStore>,
    }

    fn fixture() -> Fixture {
        let codec = Arc::new(TokenCodec::new(&JwtSettings {
            secret: "session-test-secret-0123456789abcdef".to_string(),
            access_token_expiry: 24 * 60 * 60,
            issuer: "test".to_string(),
        }));
        let revocations = Arc::new(RevocationCache::new());
        let identities = Arc::new(InMemoryIdentityStore::new());
        let service = SessionService::new(identities.clone(), codec.clone(), revocations.clone());
        Fixture {
            service,
            codec,
            revocations,
            identities,
        }
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            full_name: "Jane Doe".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirmation: password.to_string(),
        }
    }

    async fn logged_in(f: &Fixture) -> (String, ExecutionScope) {
        f.service
            .register(registration("jane@example.com", "Secret123"))
            .await
            .unwrap();
        let token = match f.service.login("jane@example.com", "Secret123").await.unwrap() {
            LoginOutcome::Issued { access_token, .. } => access_token,
            other => panic!("expected token, got {:?}", other),
        };
        let claims = f.codec.verify(&token).unwrap();
        (token, ExecutionScope::root("/auth.AuthService/Logout").attach(claims))
    }

    #[tokio::test]
    async fn test_register_creates_customer() {
        let f = fixture();
        let outcome = f
            .service
            .register(registration("jane@example.com", "Secret123"))
            .await
            .unwrap();

        let stored = f.identities.get_by_email("jane@example.com").await.unwrap().unwrap();
        assert_eq!(outcome, RegisterOutcome::Registered { user_id: stored.id });
        assert_eq!(stored.role, Role::Customer);
        assert_eq!(stored.created_by, "Jane Doe");
        assert_ne!(stored.password_hash, "Secret123");
    }

    #[tokio::test]
    async fn test_register_soft_failures() {
        let f = fixture();
        let mut mismatched = registration("jane@example.com", "Secret123");
        mismatched.password_confirmation = "Other123".to_string();
        assert_eq!(
            f.service.register(mismatched).await.unwrap(),
            RegisterOutcome::PasswordMismatch
        );

        f.service
            .register(registration("jane@example.com", "Secret123"))
            .await
            .unwrap();
        assert_eq!(
            f.service
                .register(registration("jane@example.com", "Secret123"))
                .await
                .unwrap(),
            RegisterOutcome::EmailAlreadyRegistered
        );
    }

    #[tokio::test]
    async fn test_login_issues_24h_token() {
        let f = fixture();
        let (token, _) = logged_in(&f).await;

        let claims = f.codec.verify(&token).unwrap();
        assert_eq!(claims.email(), "jane@example.com");
        assert_eq!(claims.role(), Role::Customer);
        assert_eq!(claims.expires_at() - claims.issued_at(), 86_400);
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_soft_failure() {
        let f = fixture();
        let outcome = f.service.login("ghost@example.com", "Secret123").await.unwrap();
        assert_eq!(outcome, LoginOutcome::NotRegistered);
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthenticated() {
        let f = fixture();
        f.service
            .register(registration("jane@example.com", "Secret123"))
            .await
            .unwrap();

        let result = f.service.login("jane@example.com", "Wrong123").await;
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_and_is_idempotent() {
        let f = fixture();
        let (token, scope) = logged_in(&f).await;

        f.service.logout(&scope, &token).await.unwrap();
        assert!(f.revocations.contains(&token));

        f.service.logout(&scope, &token).await.unwrap();
        assert!(f.revocations.contains(&token));
        assert_eq!(f.revocations.len(), 1);
    }

    #[tokio::test]
    async fn test_logout_in_final_second_still_revokes() {
        let f = fixture();

        let mut now = Utc::now();
        while now.timestamp_subsec_millis() >= 500 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            now = Utc::now();
        }
        let next_second = chrono::DateTime::<Utc>::from_timestamp(now.timestamp() + 1, 0).unwrap();
        let claims = crate::auth::Claims::new(
            Uuid::new_v4(),
            "jane@example.com",
            "Jane Doe",
            Role::Customer,
            next_second - chrono::Duration::seconds(60),
            chrono::Duration::seconds(60),
            "test",
        )
        .unwrap();
        let token = f.codec.issue(&claims).unwrap();
        let scope = ExecutionScope::root("/auth.AuthService/Logout").attach(claims);

        f.service.logout(&scope, &token).await.unwrap();
        assert!(f.revocations.contains(&token));
    }

    #[tokio::test]
    async fn test_logout_without_claims_is_contract_violation() {
        let f = fixture();
        let scope = ExecutionScope::root("/auth.AuthService/Logout");

        let result = f.service.logout(&scope, "whatever").await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::NoClaimsPresent))));
        assert!(f.revocations.is_empty());
    }

    #[tokio::test]
    async fn test_get_profile_reads_current_record() {
        let f = fixture();
        let (_, scope) = logged_in(&f).await;

        let profile = f.service.get_profile(&scope).await.unwrap().unwrap();
        assert_eq!(profile.email, "jane@example.com");
        assert_eq!(profile.full_name, "Jane Doe");
        assert_eq!(profile.role_code, "customer");
    }

    #[tokio::test]
    async fn test_get_profile_for_missing_identity() {
        let f = fixture();
        let (_, claims) = f
            .codec
            .issue_for(Uuid::new_v4(), "gone@example.com", "Gone", Role::Customer, Utc::now())
            .unwrap();
        let scope = ExecutionScope::root("/auth.AuthService/GetProfile").attach(claims);

        assert_eq!(f.service.get_profile(&scope).await.unwrap(), None);
    }
}
