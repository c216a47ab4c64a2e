//! Seams to the chat service: the Web API and the realtime stream.
//!
//! The engine only talks to these traits, so the REST and websocket crates
//! plug in from outside and tests can substitute in-memory fakes.

use tokio::sync::mpsc;

use lungfish_types::{BotIdentity, RawEvent, SlackUser};

/// What a successful session start hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStart {
    /// The bot's own identity.
    pub identity: BotIdentity,
    /// Endpoint of the realtime stream for this session.
    pub stream_endpoint: String,
}

/// Request/response calls against the chat service.
///
/// Implementations should turn a non-ok service answer into an `Err`.
#[async_trait::async_trait]
pub trait ChatApi: Send + Sync {
    /// Start a realtime session.
    async fn start_session(&self) -> anyhow::Result<SessionStart>;

    /// Post `text` to `channel` as the bot.
    async fn post_message(&self, channel: &str, text: &str) -> anyhow::Result<()>;

    /// Fetch a user's profile.
    async fn get_user_info(&self, user_id: &str) -> anyhow::Result<SlackUser>;
}

/// Opens the realtime stream.
///
/// The returned receiver yields decoded payloads until the transport fails
/// or closes, at which point the sender side is dropped. There is no
/// reconnect.
#[async_trait::async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open_stream(&self, endpoint: &str) -> anyhow::Result<mpsc::Receiver<RawEvent>>;
}
