mod config;
mod db;
mod game;
mod models;
mod routes;
mod utils;
mod websocket;

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use anyhow::Result;
use axum::{routing::get, Router};
use config::Config;
use dashmap::DashMap;
use db::{PgQuizStore, QuizStore};
use game::QuizGame;
use serde::Serialize;
use tokio::sync::mpsc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use websocket::messages::ServerMessage;

/// How often finished games are swept from memory
pub const GAME_CLEANUP_INTERVAL: Duration = Duration::from_secs(15);

/// A game that is being played, plus everyone watching it
pub struct LiveGame {
    /// Every client message is applied while holding this lock
    pub game: tokio::sync::Mutex<QuizGame>,
    /// Connected clients keyed by connection id
    pub viewers: DashMap<Uuid, mpsc::Sender<ServerMessage>>,
    finished_since: Mutex<Option<Instant>>,
    last_active: Mutex<Instant>,
}

impl LiveGame {
    pub fn new(game: QuizGame) -> Self {
        Self {
            game: tokio::sync::Mutex::new(game),
            viewers: DashMap::new(),
            finished_since: Mutex::new(None),
            last_active: Mutex::new(Instant::now()),
        }
    }

    /// Note that someone joined or played
    pub fn touch(&self) {
        *self
            .last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    pub fn last_active(&self) -> Instant {
        *self
            .last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether the sweep may drop this game at `now`
    fn is_expired(&self, now: Instant, finished_ttl: Duration, idle_ttl: Duration) -> bool {
        if let Some(since) = self.finished_since() {
            return now.duration_since(since) > finished_ttl;
        }
        self.viewers.is_empty() && now.duration_since(self.last_active()) > idle_ttl
    }

    /// Record that the game ended. Returns false if it already had.
    pub fn mark_finished(&self) -> bool {
        let mut finished_since = self
            .finished_since
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if finished_since.is_some() {
            return false;
        }
        *finished_since = Some(Instant::now());
        true
    }

    pub fn finished_since(&self) -> Option<Instant> {
        *self
            .finished_since
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Registry entry for a game id
#[derive(Clone)]
pub enum GameSlot {
    /// Setup and quiz pool are being fetched
    Starting,
    Ready(Arc<LiveGame>),
    /// The game could not start; posting start again retries
    Failed { reason: String, failed_at: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Starting,
    Ready,
    Failed,
    NotFound,
}

impl GameSlot {
    pub fn status(&self) -> SlotStatus {
        match self {
            GameSlot::Starting => SlotStatus::Starting,
            GameSlot::Ready(_) => SlotStatus::Ready,
            GameSlot::Failed { .. } => SlotStatus::Failed,
        }
    }

    pub fn failure_reason(&self) -> Option<String> {
        match self {
            GameSlot::Failed { reason, .. } => Some(reason.clone()),
            _ => None,
        }
    }
}

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn QuizStore>,
    /// Games keyed by game id
    pub games: DashMap<String, GameSlot>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn QuizStore>) -> Self {
        Self {
            config,
            store,
            games: DashMap::new(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiz_reveal_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting quiz reveal backend server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Connect to database
    let db = db::create_pool(config.database_url(), config.database.max_connections).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations completed");

    // Create application state
    let store: Arc<dyn QuizStore> = Arc::new(PgQuizStore::new(db));
    let state = Arc::new(AppState::new(config.clone(), store));

    // Spawn background task to drop finished games
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        game_cleanup_task(cleanup_state).await;
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // WebSocket endpoint
        .route("/ws/{game_id}", get(websocket::handle_websocket))
        // API routes
        .merge(routes::create_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket endpoint: ws://{}/ws/{{game_id}}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Background task that drops finished, failed and abandoned games
async fn game_cleanup_task(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(GAME_CLEANUP_INTERVAL);

    loop {
        interval.tick().await;
        remove_expired_games(&state, Instant::now());
    }
}

fn remove_expired_games(state: &AppState, now: Instant) -> usize {
    let finished_ttl = state.config.game.finished_game_ttl();
    let idle_ttl = state.config.game.idle_game_ttl();
    let is_expired = |slot: &GameSlot| match slot {
        GameSlot::Starting => false,
        GameSlot::Ready(live) => live.is_expired(now, finished_ttl, idle_ttl),
        GameSlot::Failed { failed_at, .. } => now.duration_since(*failed_at) > finished_ttl,
    };

    let candidates: Vec<String> = state
        .games
        .iter()
        .filter(|entry| is_expired(entry.value()))
        .map(|entry| entry.key().clone())
        .collect();

    let mut removed = 0;
    for game_id in &candidates {
        // A retry may have replaced the slot since the scan
        if state
            .games
            .remove_if(game_id, |_, slot| is_expired(slot))
            .is_some()
        {
            tracing::info!("Removed game {} (retention expired)", game_id);
            removed += 1;
        }
    }
    removed
}
