//! Local backend for the fruit wheel game.
//!
//! Two fronts are exposed: the game socket ([Api::router], any path is
//! accepted) and a static file server ([files::router]).

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State as AxumState},
    response::IntoResponse,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, Instrument};

mod config;
pub mod files;
mod session;

pub use config::{ConfigError, GameConfig};

pub struct Api {
    config: Arc<GameConfig>,
}

impl Api {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Game socket router. Must be served with connect info
    /// (`into_make_service_with_connect_info::<SocketAddr>`).
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(game_ws)
            .with_state(self.config.clone())
    }
}

async fn game_ws(
    AxumState(config): AxumState<Arc<GameConfig>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let span = tracing::info_span!("session", id = %uuid::Uuid::new_v4(), %peer);
        async move {
            info!("Game WebSocket connected");
            session::run(socket, &config).await;
        }
        .instrument(span)
    })
}
