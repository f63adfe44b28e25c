use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{PlayerId, PlayerListing, PlayerPage, Stats};

#[derive(Debug, Deserialize)]
pub struct ListPlayersParams {
    /// Include players that are not active
    pub inactive: Option<bool>,
}

pub async fn list_players(
    State(state): State<AppState>,
    Query(params): Query<ListPlayersParams>,
) -> Result<Json<Vec<PlayerListing>>, ApiError> {
    let players = state
        .stats
        .get_player_list(params.inactive.unwrap_or(false))
        .await?;
    Ok(Json(players))
}

/// Page by player id, alias or platform id.
pub async fn get_player_page(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<PlayerPage>, ApiError> {
    let page = state.stats.get_player_page(&handle).await?;
    Ok(Json(page))
}

pub async fn update_player_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Stats>, ApiError> {
    let stats = state.stats.update_player_stats(&PlayerId::from(id)).await?;
    Ok(Json(stats))
}

pub async fn invalidate_player_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.stats.invalidate_player_page(&PlayerId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
