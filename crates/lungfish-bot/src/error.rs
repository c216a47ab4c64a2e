use thiserror::Error;

/// Errors surfaced by the bot engine.
#[derive(Debug, Error)]
pub enum BotError {
    /// The session-start call failed or the service answered `ok: false`.
    #[error("session start failed: {0:#}")]
    SessionStart(#[source] anyhow::Error),

    /// The realtime stream could not be opened.
    #[error("stream connection failed: {0:#}")]
    StreamConnection(#[source] anyhow::Error),

    /// A payload's `type` is missing or not a recognised kind.
    #[error("unsupported event kind: {kind}")]
    UnsupportedEventKind { kind: String },

    /// Reactions can only be registered before `run()`.
    #[error("reaction registry is frozen once the connection has started")]
    RegistryFrozen,

    /// `run()` was called on a connection that already ran.
    #[error("connection already started; the stream is not restartable")]
    AlreadyStarted,
}

impl BotError {
    pub fn unsupported_kind(kind: impl std::fmt::Display) -> Self {
        Self::UnsupportedEventKind {
            kind: kind.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
