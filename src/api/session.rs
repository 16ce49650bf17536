//! Identity endpoints: who is signed in, refresh, logout.

use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{AppState, Role, User};

/// Public user information in responses. The auth token is never echoed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub balance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            role: user.role,
            avatar: user.avatar.clone(),
            balance: user.balance,
            wallet_address: user.wallet_address.clone(),
        }
    }
}

/// Get the signed-in user.
///
/// GET /api/me
#[get("/api/me")]
pub async fn me(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = data.identity.current().ok_or_else(AppError::not_signed_in)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// Reconcile the signed-in user with the remote profile, then return it.
///
/// POST /api/me/refresh
///
/// A failed refresh still answers with the cached user.
#[post("/api/me/refresh")]
pub async fn refresh(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    if !data.identity.is_signed_in() {
        return Err(AppError::not_signed_in());
    }
    data.identity.refresh(data.api.as_ref()).await;

    let user = data.identity.current().ok_or_else(AppError::not_signed_in)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// Forget the signed-in user and token.
///
/// POST /api/logout
#[post("/api/logout")]
pub async fn logout(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    data.identity.logout()?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure session routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(me).service(refresh).service(logout);
}
