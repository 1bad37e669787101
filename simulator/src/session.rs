//! One game per socket.
//!
//! The read side and the round timer share a single task: a `select!` loop
//! alternates between the next inbound frame and the engine's next deadline,
//! so the session state is only ever touched by one of them at a time.
//! Returning from the loop drops the pending timer, so nothing is sent once
//! the socket is gone.

use crate::GameConfig;
use axum::extract::ws::{Message, WebSocket};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use fruitwheel_execution::{router, RoundEngine, SessionState};
use fruitwheel_types::api::{DecodeError, Response};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info, warn};

type Sender = SplitSink<WebSocket, Message>;

/// Send one complete frame.
async fn send(sender: &mut Sender, response: &Response) -> Result<(), axum::Error> {
    let text = match response.to_json() {
        Ok(text) => text,
        Err(e) => {
            warn!(tag = response.tag(), error = %e, "Failed to encode response");
            return Ok(());
        }
    };
    sender.send(Message::Text(text)).await
}

pub(crate) async fn run(socket: WebSocket, config: &GameConfig) {
    let (mut sender, mut receiver) = socket.split();
    let mut rng = StdRng::from_entropy();
    let mut state = SessionState::new(&config.profile(), &mut rng);
    let mut engine = RoundEngine::new(config.timing, Instant::now());

    if let Err(e) = send(&mut sender, &router::game_info(&state)).await {
        warn!(error = %e, "Failed to send game info");
        return;
    }

    'session: loop {
        let deadline = tokio::time::Instant::from_std(engine.deadline());
        tokio::select! {
            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "Ignoring non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            warn!("Failed to send pong, client disconnected");
                            break;
                        }
                        continue;
                    }
                    Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) => {
                        info!("Client closed WebSocket connection");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    None => {
                        info!("WebSocket stream ended");
                        break;
                    }
                };

                let response = match router::route(&text, &mut state, &mut rng) {
                    Ok(response) => response,
                    Err(DecodeError::UnknownTag(tag)) => {
                        warn!(tag, "Ignoring unknown message type");
                        continue;
                    }
                    Err(e) => {
                        let preview: String = text.chars().take(100).collect();
                        warn!(error = %e, preview, "Ignoring malformed message");
                        continue;
                    }
                };
                if send(&mut sender, &response).await.is_err() {
                    warn!("Failed to send reply, client disconnected");
                    break;
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                for broadcast in engine.advance(&mut state, &mut rng, Instant::now()) {
                    if send(&mut sender, &broadcast).await.is_err() {
                        warn!("Failed to send broadcast, client disconnected");
                        break 'session;
                    }
                }
                debug!(phase = %state.phase(), countdown = state.countdown(), "Round step");
            }
        }
    }

    info!(
        coin = state.coin(),
        today_win = state.today_win(),
        "Session closed"
    );
    let _ = sender.close().await;
}
