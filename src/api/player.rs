//! Player control endpoints.
//!
//! Each action runs under the player lock and answers with the resulting
//! session snapshot.

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::catalog::remote_not_found;
use crate::error::{AppError, AppResult};
use crate::models::{AppState, Track};
use crate::player::{PlayerSession, PlayerStore};

/// Session snapshot as returned by every player endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(flatten)]
    pub session: PlayerSession,
    pub effectively_muted: bool,
}

impl From<&PlayerStore> for PlayerResponse {
    fn from(store: &PlayerStore) -> Self {
        let session = store.session().clone();
        Self {
            effectively_muted: session.effectively_muted(),
            session,
        }
    }
}

/// Request body for seeking.
#[derive(Debug, Deserialize, Validate)]
pub struct SeekRequest {
    /// Target position in seconds.
    #[validate(range(min = 0.0, message = "Time cannot be negative"))]
    pub time: f64,
}

/// Request body for setting the volume.
#[derive(Debug, Deserialize, Validate)]
pub struct VolumeRequest {
    #[validate(range(min = 0, max = 100, message = "Volume must be 0-100"))]
    pub volume: u16,
}

fn respond(data: &AppState, action: impl FnOnce(&mut PlayerStore)) -> HttpResponse {
    let mut player = data.player.lock();
    action(&mut player);
    HttpResponse::Ok().json(PlayerResponse::from(&*player))
}

/// Current session.
///
/// GET /api/player
#[get("/api/player")]
pub async fn get_player(data: web::Data<AppState>) -> HttpResponse {
    respond(&data, |_| {})
}

/// Play a track, or toggle it if it is already current.
///
/// POST /api/player/play
#[post("/api/player/play")]
pub async fn play(data: web::Data<AppState>, body: web::Json<Track>) -> AppResult<HttpResponse> {
    let track = body.into_inner();
    if track.id.trim().is_empty() {
        return Err(AppError::Validation("Track id cannot be empty".to_string()));
    }
    Ok(respond(&data, |player| player.play_or_toggle(&track)))
}

/// Look a track up in the catalog, then play or toggle it.
///
/// POST /api/player/play/{id}
#[post("/api/player/play/{id}")]
pub async fn play_by_id(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let track = data.api.get_track(&path).await.map_err(remote_not_found)?;
    Ok(respond(&data, |player| player.play_or_toggle(&track)))
}

/// POST /api/player/toggle
#[post("/api/player/toggle")]
pub async fn toggle(data: web::Data<AppState>) -> HttpResponse {
    respond(&data, PlayerStore::toggle_play)
}

/// POST /api/player/seek
#[post("/api/player/seek")]
pub async fn seek(
    data: web::Data<AppState>,
    body: web::Json<SeekRequest>,
) -> AppResult<HttpResponse> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(respond(&data, |player| player.set_current_time(body.time)))
}

/// POST /api/player/volume
#[post("/api/player/volume")]
pub async fn volume(
    data: web::Data<AppState>,
    body: web::Json<VolumeRequest>,
) -> AppResult<HttpResponse> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let volume = u8::try_from(body.volume)
        .map_err(|_| AppError::Validation("Volume must be 0-100".to_string()))?;
    Ok(respond(&data, |player| player.set_volume(volume)))
}

/// POST /api/player/mute
#[post("/api/player/mute")]
pub async fn mute(data: web::Data<AppState>) -> HttpResponse {
    respond(&data, PlayerStore::toggle_mute)
}

/// POST /api/player/repeat
#[post("/api/player/repeat")]
pub async fn repeat(data: web::Data<AppState>) -> HttpResponse {
    respond(&data, PlayerStore::toggle_repeat)
}

/// Configure player routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_player)
        .service(play)
        .service(play_by_id)
        .service(toggle)
        .service(seek)
        .service(volume)
        .service(mute)
        .service(repeat);
}
