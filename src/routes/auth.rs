/// Authentication RPCs
///
/// `auth.AuthService`: Register, Login, Logout and GetProfile.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{extract_bearer, ExecutionScope};
use crate::error::AppError;
use crate::routes::response::{BaseOnly, BaseResponse};
use crate::services::{LoginOutcome, ProfileView, RegisterOutcome, Registration, SessionService};
use crate::validators::{is_valid_email, is_valid_name, is_valid_password};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub base: BaseResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<&'static str>,
    /// Unix timestamp of token expiry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

#[derive(Serialize)]
pub struct GetProfileResponse {
    pub base: BaseResponse,
    #[serde(flatten)]
    pub profile: Option<ProfileView>,
}

/// POST /auth.AuthService/Register
///
/// Public. Creates a customer account.
pub async fn register(
    form: web::Json<RegisterRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let registration = Registration {
        full_name: is_valid_name("full_name", &form.full_name)?,
        email: is_valid_email(&form.email)?,
        password: {
            is_valid_password(&form.password)?;
            form.password
        },
        password_confirmation: form.password_confirmation,
    };

    let base = match sessions.register(registration).await? {
        RegisterOutcome::Registered { .. } => BaseResponse::success("User is registered"),
        RegisterOutcome::PasswordMismatch => BaseResponse::bad_request("Password is not match"),
        RegisterOutcome::EmailAlreadyRegistered => BaseResponse::bad_request("User already exist"),
    };

    Ok(HttpResponse::Ok().json(BaseOnly::from(base)))
}

/// POST /auth.AuthService/Login
///
/// Public. An unknown email is a soft failure; a wrong password is a 401.
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let response = match sessions.login(&email, &form.password).await? {
        LoginOutcome::Issued {
            access_token,
            expires_at,
        } => LoginResponse {
            base: BaseResponse::success("Login success"),
            access_token: Some(access_token),
            token_type: Some("Bearer"),
            expires_at: Some(expires_at),
        },
        LoginOutcome::NotRegistered => LoginResponse {
            base: BaseResponse::bad_request("User is not registered"),
            access_token: None,
            token_type: None,
            expires_at: None,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth.AuthService/Logout
///
/// Revokes the bearer token the call was made with.
pub async fn logout(
    req: HttpRequest,
    scope: ExecutionScope,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let token = extract_bearer(req.headers())?;
    sessions.logout(&scope, &token).await?;

    Ok(HttpResponse::Ok().json(BaseOnly::from(BaseResponse::success("Logout success"))))
}

/// POST /auth.AuthService/GetProfile
pub async fn get_profile(
    scope: ExecutionScope,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let response = match sessions.get_profile(&scope).await? {
        Some(profile) => GetProfileResponse {
            base: BaseResponse::success("Get profile success"),
            profile: Some(profile),
        },
        None => GetProfileResponse {
            base: BaseResponse::not_found("User not found"),
            profile: None,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}
