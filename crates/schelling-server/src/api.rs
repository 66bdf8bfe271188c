//! API handlers for the server.

use crate::playback::Playback;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use parking_lot::Mutex;
use schelling_core::{
    AgentId, AgentType, CellPos, PlaybackConfig, SimulationConfig, SimulationStats,
};
use schelling_world::{Simulation, StepOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub simulation: Arc<Mutex<Simulation>>,
    pub playback: Arc<Playback>,
}

impl AppState {
    pub fn new(simulation: Simulation, playback: PlaybackConfig) -> Self {
        Self {
            simulation: Arc::new(Mutex::new(simulation)),
            playback: Arc::new(Playback::new(playback)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/state", get(get_state))
        .route("/api/stats", get(get_stats))
        .route("/api/config", get(get_config))
        .route("/api/step", post(step))
        .route("/api/agents/:id/move", post(move_agent))
        .route("/api/reset", post(reset))
        .route("/api/threshold", put(set_threshold))
        .route("/api/play", post(play))
        .route("/api/pause", post(pause))
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
pub struct AgentView {
    id: AgentId,
    kind: AgentType,
}

#[derive(Serialize)]
pub struct CellView {
    row: usize,
    col: usize,
    agent: Option<AgentView>,
    /// Drives the distress indicator; always true for empty cells
    satisfied: bool,
}

#[derive(Serialize)]
pub struct StateResponse {
    tick: u64,
    threshold: f64,
    playing: bool,
    rows: usize,
    cols: usize,
    cells: Vec<CellView>,
    stats: SimulationStats,
    happy_count: usize,
    happy_fraction: f64,
}

fn snapshot(state: &AppState) -> StateResponse {
    let simulation = state.simulation.lock();
    let grid = simulation.grid();
    let cells = grid
        .iter()
        .map(|(pos, agent)| CellView {
            row: pos.row,
            col: pos.col,
            agent: agent.map(|agent| AgentView {
                id: agent.id,
                kind: agent.kind,
            }),
            satisfied: simulation.is_satisfied(pos),
        })
        .collect();

    let stats = simulation.stats();
    StateResponse {
        tick: simulation.tick(),
        threshold: simulation.threshold(),
        playing: state.playback.is_playing(),
        rows: grid.rows(),
        cols: grid.cols(),
        cells,
        stats,
        happy_count: stats.happy_count(),
        happy_fraction: stats.happy_fraction(),
    }
}

/// Full board for rendering
pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(snapshot(&state))
}

pub async fn get_stats(State(state): State<AppState>) -> Json<SimulationStats> {
    Json(state.simulation.lock().stats())
}

/// Configuration the current board was built from
pub async fn get_config(State(state): State<AppState>) -> Json<SimulationConfig> {
    Json(state.simulation.lock().config().clone())
}

#[derive(Serialize)]
pub struct StepResponse {
    tick: u64,
    outcome: StepOutcome,
    stats: SimulationStats,
}

/// Advance one step regardless of play state
pub async fn step(State(state): State<AppState>) -> Result<Json<StepResponse>, ApiError> {
    let mut simulation = state.simulation.lock();
    let outcome = simulation.step()?;
    Ok(Json(StepResponse {
        tick: simulation.tick(),
        outcome,
        stats: simulation.stats(),
    }))
}

#[derive(Deserialize)]
pub struct MoveRequest {
    row: usize,
    col: usize,
}

#[derive(Serialize)]
pub struct MoveResponse {
    applied: bool,
    stats: SimulationStats,
}

/// Drag-and-drop style relocation. Rejections come back as `applied: false`.
pub async fn move_agent(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<MoveRequest>,
) -> Json<MoveResponse> {
    let mut simulation = state.simulation.lock();
    let applied = simulation.place_agent(AgentId(id), CellPos::new(req.row, req.col));
    Json(MoveResponse {
        applied,
        stats: simulation.stats(),
    })
}

/// Discard the board and populate a new one. Playback keeps its current state.
pub async fn reset(State(state): State<AppState>) -> Result<Json<StateResponse>, ApiError> {
    state.simulation.lock().reset()?;
    info!("Board reset via API");
    Ok(Json(snapshot(&state)))
}

#[derive(Deserialize)]
pub struct ThresholdRequest {
    threshold: f64,
}

#[derive(Serialize)]
pub struct ThresholdResponse {
    threshold: f64,
    stats: SimulationStats,
}

pub async fn set_threshold(
    State(state): State<AppState>,
    Json(req): Json<ThresholdRequest>,
) -> Result<Json<ThresholdResponse>, ApiError> {
    let mut simulation = state.simulation.lock();
    simulation.set_threshold(req.threshold)?;
    Ok(Json(ThresholdResponse {
        threshold: simulation.threshold(),
        stats: simulation.stats(),
    }))
}

#[derive(Serialize)]
pub struct PlaybackResponse {
    playing: bool,
}

pub async fn play(State(state): State<AppState>) -> Json<PlaybackResponse> {
    state.playback.play();
    Json(PlaybackResponse {
        playing: state.playback.is_playing(),
    })
}

pub async fn pause(State(state): State<AppState>) -> Json<PlaybackResponse> {
    state.playback.pause();
    Json(PlaybackResponse {
        playing: state.playback.is_playing(),
    })
}

// Error handling
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}

impl From<schelling_core::Error> for ApiError {
    fn from(err: schelling_core::Error) -> Self {
        match err {
            schelling_core::Error::InvalidConfiguration(msg) => ApiError::BadRequest(msg),
            other => {
                error!("Core error: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}
