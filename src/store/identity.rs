/// Identity persistence
///
/// The gateway only reads identities during login and profile lookups and
/// inserts them on registration. Role and password are never changed here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::auth::Role;
use crate::error::{AppError, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_by_email(&self, email: &str) -> Result<Option<Identity>, AppError>;

    /// # Errors
    /// `DatabaseError::UniqueConstraintViolation` if the email is taken
    async fn insert(&self, identity: &Identity) -> Result<(), AppError>;
}

type IdentityRow = (
    Uuid,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    String,
    Option<DateTime<Utc>>,
    Option<String>,
);

/// Postgres-backed identity store
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn get_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, full_name, email, password, role_code, created_at, created_by, updated_at, updated_by
            FROM users
            WHERE email = $1 AND is_deleted = false
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(identity_from_row).transpose()
    }

    async fn insert(&self, identity: &Identity) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, email, password, role_code, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(identity.id)
        .bind(&identity.full_name)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.created_at)
        .bind(&identity.created_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn identity_from_row(row: IdentityRow) -> Result<Identity, AppError> {
    let (id, full_name, email, password_hash, role_code, created_at, created_by, updated_at, updated_by) =
        row;
    let role = Role::parse(&role_code).ok_or_else(|| {
        AppError::Database(DatabaseError::UnexpectedError(format!(
            "unknown role code {:?} for user {}",
            role_code, id
        )))
    })?;

    Ok(Identity {
        id,
        full_name,
        email,
        password_hash,
        role,
        created_at,
        created_by,
        updated_at,
        updated_by,
    })
}

/// Identity store held in process memory, keyed by email
#[derive(Default)]
pub struct InMemoryIdentityStore {
    users: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn get_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        let users = self
            .users
            .read()
            .map_err(|_| AppError::Internal("identity store lock poisoned".to_string()))?;
        Ok(users.get(email).cloned())
    }

    async fn insert(&self, identity: &Identity) -> Result<(), AppError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| AppError::Internal("identity store lock poisoned".to_string()))?;
        if users.contains_key(&identity.email) {
            return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
                "email already registered".to_string(),
            )));
        }
        users.insert(identity.email.clone(), identity.clone());
        Ok(())
    }
}
