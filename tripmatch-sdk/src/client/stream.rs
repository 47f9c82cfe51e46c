//! WebSocket notification stream.

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::ClientError;
use crate::objects::ws::{WsCloseCode, WsServerMessage};

/// Receiving half of `GET /api/v1/ws`.
pub struct NotificationStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl NotificationStream {
    pub(crate) async fn connect(url: &str) -> Result<Self, ClientError> {
        let (socket, _) = connect_async(url).await?;
        Ok(Self { socket })
    }

    /// Wait for the next server message.
    ///
    /// Returns `Ok(None)` once the server closes the stream normally.
    /// Ping, pong and binary frames are skipped.
    pub async fn next_message(&mut self) -> Result<Option<WsServerMessage>, ClientError> {
        while let Some(frame) = self.socket.next().await {
            match frame? {
                Message::Text(text) => {
                    return serde_json::from_str(&text)
                        .map(Some)
                        .map_err(ClientError::Json);
                }
                Message::Close(Some(close)) => {
                    let code = u16::from(close.code);
                    if code == WsCloseCode::NORMAL {
                        return Ok(None);
                    }
                    return Err(ClientError::Closed {
                        code,
                        reason: close.reason.to_string(),
                    });
                }
                Message::Close(None) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Close the connection with a normal close code.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        Ok(())
    }
}
