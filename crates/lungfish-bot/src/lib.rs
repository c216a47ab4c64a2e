//! lungfish-bot: connection lifecycle and event-dispatch engine.
//!
//! ```text
//! ChatApi::start_session()          → bot identity + stream endpoint
//!     ↓
//! StreamTransport::open_stream()    → mpsc::Receiver<RawEvent>
//!     ↓
//! normalize()                       → Event (mention flag, trigger)
//!     ↓
//! dispatch_event()                  → ReactionRegistry lookup → reaction(event).await
//! ```
//!
//! The session ends when the stream's sender side is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut conn = Connection::new(api, transport);
//! conn.register_channel("#general");
//!
//! let handle = conn.handle();
//! conn.register_reaction("ping", move |event| {
//!     let handle = handle.clone();
//!     async move { handle.post_message("pong").await }
//! })?;
//!
//! conn.run().await?;
//! ```

pub mod connection;
pub mod dispatch;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod service;
pub mod trigger;

pub use connection::{BotHandle, Connection};
pub use dispatch::{DispatchOutcome, DispatchStats, SkipReason};
pub use error::{BotError, Result};
pub use registry::{Reaction, ReactionRegistry, reaction};
pub use service::{ChatApi, SessionStart, StreamTransport};

pub use lungfish_types::{
    BotIdentity, Event, EventKind, RawEvent, SessionStatus, SlackUser, Trigger, UserProfile,
};
