//! Realtime stream transport for lungfish.
//!
//! [`RtmClient`] performs the websocket handshake against the endpoint handed
//! back by `rtm.start`, then a background task decodes every data frame into
//! a [`lungfish_types::RawEvent`] and pushes it into a bounded channel. The
//! channel closes when the stream ends for any reason.

pub mod client;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;

use lungfish_bot::StreamTransport;
use lungfish_types::RawEvent;

pub use client::{DEFAULT_ORIGIN, RtmClient, StreamEnd, receive_loop};

/// Failures while opening a realtime stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid stream endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tungstenite::Error,
    },
}

#[async_trait::async_trait]
impl StreamTransport for RtmClient {
    async fn open_stream(&self, endpoint: &str) -> anyhow::Result<mpsc::Receiver<RawEvent>> {
        Ok(self.start(endpoint).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_stream_reports_connect_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}/websocket", listener.local_addr().unwrap());
        drop(listener);

        let transport: &dyn StreamTransport = &RtmClient::new(1);
        let err = transport.open_stream(&endpoint).await.unwrap_err();
        assert!(err.to_string().contains("failed to connect"));
        assert!(err.downcast_ref::<StreamError>().is_some());
    }
}
