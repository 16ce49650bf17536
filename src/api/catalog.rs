//! Read-only catalog and NFT endpoints, proxied to the remote API.

use actix_web::{get, web, HttpResponse};

use crate::error::{AppError, AppResult};
use crate::models::AppState;

/// Surface a remote 404 as our own 404; other failures pass through.
pub(crate) fn remote_not_found(error: AppError) -> AppError {
    match error {
        AppError::Remote { status: 404, message } => AppError::NotFound(message),
        other => other,
    }
}

/// GET /api/catalog/artists
#[get("/api/catalog/artists")]
pub async fn list_artists(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.api.list_artists().await?))
}

/// GET /api/catalog/artists/{id}
#[get("/api/catalog/artists/{id}")]
pub async fn get_artist(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let artist = data.api.get_artist(&path).await.map_err(remote_not_found)?;
    Ok(HttpResponse::Ok().json(artist))
}

/// GET /api/catalog/albums
#[get("/api/catalog/albums")]
pub async fn list_albums(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.api.list_albums().await?))
}

/// GET /api/catalog/albums/{id}
#[get("/api/catalog/albums/{id}")]
pub async fn get_album(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let album = data.api.get_album(&path).await.map_err(remote_not_found)?;
    Ok(HttpResponse::Ok().json(album))
}

/// GET /api/catalog/tracks
#[get("/api/catalog/tracks")]
pub async fn list_tracks(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.api.list_tracks().await?))
}

/// GET /api/catalog/tracks/{id}
#[get("/api/catalog/tracks/{id}")]
pub async fn get_track(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let track = data.api.get_track(&path).await.map_err(remote_not_found)?;
    Ok(HttpResponse::Ok().json(track))
}

/// NFT collections on offer.
///
/// GET /api/nft/collections
#[get("/api/nft/collections")]
pub async fn list_collections(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.api.list_collections().await?))
}

/// Configure catalog routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_artists)
        .service(get_artist)
        .service(list_albums)
        .service(get_album)
        .service(list_tracks)
        .service(get_track)
        .service(list_collections);
}
