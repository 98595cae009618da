//! HTTP pairing endpoint.
//!
//! `GET /game` answers with a session id as plain text, handed out by the
//! [`Lobby`]'s pairing provisioner: two requests in a row get the same id.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use boardlink_session::Provisioner;

use crate::lobby::Lobby;

/// Routes served next to the relay.
pub(crate) fn router(lobby: Arc<Lobby>) -> Router {
    Router::new().route("/game", get(pair)).with_state(lobby)
}

async fn pair(State(lobby): State<Arc<Lobby>>) -> Result<String, StatusCode> {
    match lobby.provision().await {
        Ok(id) => {
            tracing::debug!(session = %id, "pairing request answered");
            Ok(id)
        }
        Err(e) => {
            tracing::warn!(error = %e, "pairing request failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
