/// JWT Token Generation and Validation
///
/// `TokenCodec` is the only component that understands the credential wire
/// format. It is built once at startup from `JwtSettings` and shared
/// read-only across workers.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, Role};
use crate::configuration::JwtSettings;
use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    has_secret: bool,
    issuer: String,
    lifetime: chrono::Duration,
}

impl TokenCodec {
    pub fn new(config: &JwtSettings) -> Self {
        let secret = config.secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            has_secret: !config.secret.trim().is_empty(),
            issuer: config.issuer.clone(),
            lifetime: config.access_token_lifetime(),
        }
    }

    /// Validity window applied by `issue_for`
    pub fn lifetime(&self) -> chrono::Duration {
        self.lifetime
    }

    /// Sign `claims` into a compact token.
    ///
    /// # Errors
    /// `SigningError` if no secret is configured or encoding fails
    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        if !self.has_secret {
            return Err(AuthError::SigningError(
                "signing secret is not configured".to_string(),
            ));
        }

        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::SigningError(e.to_string()))
    }

    /// Build claims for an identity valid from `now` for the configured
    /// lifetime, and sign them.
    pub fn issue_for(
        &self,
        user_id: Uuid,
        email: &str,
        full_name: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<(String, Claims), AuthError> {
        let claims = Claims::new(
            user_id,
            email,
            full_name,
            role,
            now,
            self.lifetime,
            self.issuer.clone(),
        )?;
        let token = self.issue(&claims)?;
        Ok((token, claims))
    }

    /// Check signature and expiry, then return the embedded claims.
    ///
    /// # Errors
    /// - `Expired` if `now > exp`, whatever the state of the signature
    /// - `InvalidSignature` if the signature does not match
    /// - `MalformedToken` for anything that is not a well-formed token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation()) {
            // jsonwebtoken compares against whole seconds; `exp` is exact here
            Ok(data) if data.claims.is_expired_at(Utc::now()) => Err(AuthError::Expired),
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::Expired),
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAlgorithm => {
                    if self.is_expired_unverified(token) {
                        Err(AuthError::Expired)
                    } else {
                        Err(AuthError::InvalidSignature)
                    }
                }
                _ => {
                    tracing::debug!(error = %e, "Token could not be decoded");
                    Err(AuthError::MalformedToken)
                }
            },
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation
    }

    /// Expiry probe used only to classify an already-rejected token; the
    /// decoded payload is discarded.
    fn is_expired_unverified(&self, token: &str) -> bool {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.insecure_disable_signature_validation();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.is_expired_at(Utc::now()))
            .unwrap_or(false)
    }
}

/// Pull the bearer credential out of call metadata.
///
/// # Errors
/// `MissingCredential` if the header is absent, not valid ASCII, uses another
/// scheme, or carries an empty token.
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthError::MissingCredential)?;

    if token.is_empty() || token.contains(' ') {
        return Err(AuthError::MissingCredential);
    }

    Ok(token.to_string())
}
