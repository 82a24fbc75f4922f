use std::io;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::payload::{SessionEvent, UserMessage};
use crate::client::api::API_KEY_HEADER;
use crate::client::error::{ApolloError, Result};

pub const CLOSE_NORMAL: u16 = 1000;
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// How the session ended, from the close code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Normal,
    PolicyViolation,
    ServerError,
    Other(Option<u16>),
}

impl CloseOutcome {
    pub fn from_code(code: Option<u16>) -> Self {
        match code {
            Some(CLOSE_NORMAL) => CloseOutcome::Normal,
            Some(CLOSE_POLICY_VIOLATION) => CloseOutcome::PolicyViolation,
            Some(CLOSE_INTERNAL_ERROR) => CloseOutcome::ServerError,
            other => CloseOutcome::Other(other),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CloseOutcome::Normal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub events: Vec<SessionEvent>,
    pub streaming_text: String,
    pub close_code: Option<u16>,
    pub close_reason: Option<String>,
}

impl SessionSummary {
    pub fn message_count(&self) -> usize {
        self.events.len()
    }

    pub fn outcome(&self) -> CloseOutcome {
        CloseOutcome::from_code(self.close_code)
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct SessionSocket {
    ws: Socket,
}

impl SessionSocket {
    /// Open the external session socket, authenticating with `api_key`.
    pub async fn connect(url: &str, api_key: &str) -> Result<Self> {
        let mut request = url.into_client_request()?;
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| ApolloError::InvalidInput("API key is not a valid header value".to_string()))?;
        request.headers_mut().insert(API_KEY_HEADER, key);

        debug!(%url, "connecting session socket");
        let (ws, response) = connect_async(request).await?;
        info!(status = %response.status(), "session socket opened");

        Ok(Self { ws })
    }

    pub async fn send_user_message(&mut self, message: &UserMessage) -> Result<()> {
        let text = serde_json::to_string(message)?;
        self.ws.send(Message::text(text)).await?;
        Ok(())
    }

    /// Read frames until the socket closes, handing each classified event to
    /// `on_event`. A final message makes this side close the socket normally.
    pub async fn run<F>(mut self, mut on_event: F) -> Result<SessionSummary>
    where
        F: FnMut(usize, &SessionEvent),
    {
        let mut summary = SessionSummary {
            events: Vec::new(),
            streaming_text: String::new(),
            close_code: None,
            close_reason: None,
        };
        let mut closing = false;

        while let Some(frame) = self.ws.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                // The peer may drop the TCP stream right after acknowledging our close.
                Err(e) if closing => {
                    debug!(error = %e, "socket ended after close");
                    break;
                }
                // No close frame: leave close_code unset so the outcome reports it.
                Err(e) if is_dropped_connection(&e) => {
                    warn!(error = %e, "session socket dropped without a close frame");
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let event = match frame {
                Message::Text(text) => SessionEvent::from_text(text.as_str()),
                Message::Close(close) => {
                    if summary.close_code.is_none() {
                        summary.close_code = close.as_ref().map(|c| u16::from(c.code));
                        summary.close_reason = close
                            .as_ref()
                            .map(|c| c.reason.to_string())
                            .filter(|r| !r.is_empty());
                    }
                    debug!(code = ?summary.close_code, "close frame received");
                    continue;
                }
                Message::Binary(bytes) => {
                    warn!(len = bytes.len(), "ignoring binary frame");
                    continue;
                }
                _ => continue,
            };

            if let SessionEvent::Streaming(update) = &event {
                if let Some(chunk) = update.text_chunk() {
                    summary.streaming_text.push_str(chunk);
                }
            }
            let is_final = matches!(event, SessionEvent::Final(_));

            summary.events.push(event);
            if let Some(last) = summary.events.last() {
                on_event(summary.events.len(), last);
            }

            if is_final && !closing {
                closing = true;
                summary.close_code = Some(CLOSE_NORMAL);
                self.ws
                    .close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: "conversation complete".into(),
                    }))
                    .await?;
            }
        }

        Ok(summary)
    }
}

fn is_dropped_connection(err: &WsError) -> bool {
    match err {
        WsError::ConnectionClosed
        | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        WsError::Io(e) => matches!(
            e.kind(),
            io::ErrorKind::ConnectionReset | io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe
        ),
        _ => false,
    }
}
