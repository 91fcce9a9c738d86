/// JWT Claims structure
///
/// The identity and role payload signed into every access token. Claims are
/// immutable once built: fields are private and only readable through the
/// accessors below.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Role code carried in claims and stored with each identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(code: &str) -> Option<Role> {
        match code {
            "customer" => Some(Role::Customer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    sub: String,
    email: String,
    full_name: String,
    role: Role,
    /// Issued at (Unix timestamp)
    iat: i64,
    /// Expiration time (Unix timestamp)
    exp: i64,
    iss: String,
}

impl Claims {
    /// Build claims valid from `issued_at` for `lifetime`.
    ///
    /// # Errors
    /// Returns `InvalidClaims` unless `exp > iat` at second resolution.
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        full_name: impl Into<String>,
        role: Role,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
        issuer: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let iat = issued_at.timestamp();
        let exp = (issued_at + lifetime).timestamp();
        if exp <= iat {
            return Err(AuthError::InvalidClaims);
        }

        Ok(Self {
            sub: user_id.to_string(),
            email: email.into(),
            full_name: full_name.into(),
            role,
            iat,
            exp,
            iss: issuer.into(),
        })
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `InvalidOrExpired` if the subject is not a valid UUID
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidOrExpired)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn issuer(&self) -> &str {
        &self.iss
    }

    pub fn issued_at(&self) -> i64 {
        self.iat
    }

    pub fn expires_at(&self) -> i64 {
        self.exp
    }

    /// Exact instant the token stops being valid. `None` if `exp` is out of
    /// chrono's range.
    fn expiry_instant(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }

    /// Lifetime left at `now`, at full clock precision, or `None` once the
    /// token has expired.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        let remaining = (self.expiry_instant()? - now).to_std().ok()?;
        if remaining.is_zero() {
            None
        } else {
            Some(remaining)
        }
    }

    /// Zero leeway: a token is expired strictly after the instant `exp`,
    /// not after the end of that second.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry_instant() {
            Some(expiry) => now > expiry,
            None => true,
        }
    }
}
