//! Realtime stream client and its receive loop.

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use lungfish_types::RawEvent;

use crate::StreamError;

/// Default `Origin` header for the handshake.
pub const DEFAULT_ORIGIN: &str = "https://slack.com";

/// Opens realtime streams and pumps decoded payloads into a channel.
#[derive(Debug, Clone)]
pub struct RtmClient {
    buffer_size: usize,
    origin: String,
}

/// Why a receive loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The peer sent a close frame.
    Closed,
    /// The underlying stream ended without a close frame.
    Eof,
    /// Reading a frame failed.
    Transport,
    /// A frame did not hold a JSON payload.
    Decode,
    /// The receiving side of the channel was dropped.
    ConsumerGone,
}

impl RtmClient {
    /// Create a client whose channel holds `buffer_size` payloads (at least 1).
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }

    /// Override the `Origin` header sent on the handshake.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Connect to `endpoint` and spawn the receive loop.
    ///
    /// Fails if the handshake fails. Afterwards the only signal of
    /// termination is the receiver yielding `None`.
    pub async fn start(&self, endpoint: &str) -> Result<mpsc::Receiver<RawEvent>, StreamError> {
        let mut request = endpoint
            .into_client_request()
            .map_err(|source| StreamError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                source,
            })?;
        if let Ok(origin) = HeaderValue::from_str(&self.origin) {
            request.headers_mut().insert(ORIGIN, origin);
        } else {
            warn!(origin = self.origin, "Invalid origin header, connecting without it");
        }

        let (ws, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|source| StreamError::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;

        info!(endpoint, buffer_size = self.buffer_size, "Realtime stream connected");

        let (tx, rx) = mpsc::channel(self.buffer_size);
        let endpoint = endpoint.to_string();
        tokio::spawn(async move {
            receive_loop(ws, tx, &endpoint).await;
        });

        Ok(rx)
    }
}

/// Decode one payload per data frame and forward it to `events`.
///
/// Ends on the first transport error, decode error, close frame, or when
/// the consumer is gone. Dropping `events` on return closes the channel.
pub async fn receive_loop<S>(
    mut frames: S,
    events: mpsc::Sender<RawEvent>,
    endpoint: &str,
) -> StreamEnd
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut received: u64 = 0;

    let end = loop {
        let frame = match frames.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                warn!(endpoint, "Failed to receive on websocket: {e}");
                break StreamEnd::Transport;
            }
            None => break StreamEnd::Eof,
        };

        let decoded = match frame {
            Message::Text(text) => serde_json::from_str::<RawEvent>(text.as_str()),
            Message::Binary(bytes) => serde_json::from_slice::<RawEvent>(&bytes),
            Message::Close(frame) => {
                debug!(endpoint, ?frame, "Close frame received");
                break StreamEnd::Closed;
            }
            // Ping, pong and raw frames carry no payload.
            _ => continue,
        };

        let payload = match decoded {
            Ok(payload) => payload,
            Err(e) => {
                warn!(endpoint, "Failed to decode stream payload: {e}");
                break StreamEnd::Decode;
            }
        };

        received += 1;
        if events.send(payload).await.is_err() {
            break StreamEnd::ConsumerGone;
        }
    };

    warn!(endpoint, received, end = ?end, "Realtime stream receive loop stopped");
    end
}
