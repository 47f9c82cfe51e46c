use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use std::collections::HashMap;
use tokio::sync::broadcast::error::RecvError;
use tripmatch_core::events::Delivery;
use tripmatch_sdk::identity::{WS_USER_ID_PARAM, parse_user_id};
use tripmatch_sdk::objects::ws::{WsCloseCode, WsServerMessage};
use uuid::Uuid;

use crate::state::AppState;

/// `GET /ws?user_id={uuid}`: notification stream.
///
/// Upgrades the HTTP connection to a WebSocket, marks the user online and
/// pushes [`WsServerMessage`] JSON frames until either side closes. An
/// invalid `user_id` still gets upgraded so the client can read the close
/// code.
pub(super) async fn notifications_ws(
    state: State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let app_state = state.0.clone();
    let user_id = params
        .get(WS_USER_ID_PARAM)
        .and_then(|raw| parse_user_id(raw));
    ws.on_upgrade(move |socket| async move {
        match user_id {
            Some(user_id) => handle_notifications_ws(socket, app_state, user_id).await,
            None => reject_socket(socket).await,
        }
    })
}

async fn reject_socket(mut socket: WebSocket) {
    let reason = "missing or invalid user_id";
    let _ = send_json(
        &mut socket,
        &WsServerMessage::Error {
            code: WsCloseCode::INVALID_USER,
            reason: reason.into(),
        },
    )
    .await;
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: WsCloseCode::INVALID_USER,
            reason: reason.into(),
        })))
        .await;
}

/// Background task that drives a single WebSocket connection.
///
/// 1. Subscribes to deliveries, then registers the user as online so the
///    first frame is the online list including this user.
/// 2. Forwards notifications addressed to this user and every online-list
///    change.
/// 3. Unregisters the user when the client disconnects or the dispatcher
///    goes away.
async fn handle_notifications_ws(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let mut deliveries = state.online.subscribe();
    state.online.connect(user_id).await;

    let close_code = loop {
        tokio::select! {
            result = deliveries.recv() => {
                let msg = match result {
                    Ok(Delivery::Notify(n)) if n.user_id == user_id => {
                        WsServerMessage::Notification {
                            kind: n.kind,
                            payload: n.payload,
                        }
                    }
                    Ok(Delivery::Notify(_)) => continue,
                    Ok(Delivery::OnlineUsers(user_ids)) => {
                        WsServerMessage::OnlineUsers { user_ids }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(
                            %user_id,
                            skipped = n,
                            "WS: delivery receiver lagged, resending online users"
                        );
                        WsServerMessage::OnlineUsers {
                            user_ids: state.online.snapshot().await,
                        }
                    }
                    Err(RecvError::Closed) => break Some(WsCloseCode::NORMAL),
                };
                if send_json(&mut socket, &msg).await.is_err() {
                    break None;
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break None,
                    Some(Ok(_)) => {}
                }
            }
        }
    };

    state.online.disconnect(user_id).await;

    if let Some(code) = close_code {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code,
                reason: "server shutting down".into(),
            })))
            .await;
    }
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
