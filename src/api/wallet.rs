//! Wallet endpoints: sign in with the wallet, pay with it.

use actix_web::{post, web, HttpResponse};

use super::session::UserResponse;
use crate::error::AppResult;
use crate::models::AppState;
use crate::wallet::{self, PaymentRequest};

/// Sign in by signing a one-time message with the configured wallet.
///
/// POST /api/wallet/sign-in
#[post("/api/wallet/sign-in")]
pub async fn sign_in(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = wallet::sign_in(data.wallet.as_deref(), data.api.as_ref(), &data.identity).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// Send SOL and record the payment.
///
/// POST /api/payments
///
/// A transfer the wallet rejects still answers 200 with a `failed: ...` status.
#[post("/api/payments")]
pub async fn pay(
    data: web::Data<AppState>,
    body: web::Json<PaymentRequest>,
) -> AppResult<HttpResponse> {
    let record = wallet::send_payment(
        data.wallet.as_deref(),
        data.api.as_ref(),
        &data.identity,
        &body,
    )
    .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Configure wallet routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(sign_in).service(pay);
}
