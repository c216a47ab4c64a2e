//! Bot connection: session start, stream, and dispatch until closure.

use std::future::Future;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use anyhow::{Context, bail};
use tokio::sync::watch;
use tracing::{info, warn};

use lungfish_types::{BotIdentity, Event, SessionStatus, SlackUser};

use crate::dispatch::{DispatchStats, run_dispatch_loop};
use crate::error::{BotError, Result};
use crate::registry::{ReactionRegistry, reaction};
use crate::service::{ChatApi, StreamTransport};

/// State shared between a [`Connection`] and its [`BotHandle`]s.
struct Shared {
    api: Arc<dyn ChatApi>,
    identity: OnceLock<BotIdentity>,
    channel: RwLock<String>,
    status: watch::Sender<SessionStatus>,
}

impl Shared {
    fn set_status(&self, status: SessionStatus) {
        self.status.send_replace(status);
    }
}

/// One bot session against the chat service.
///
/// Register reactions and a channel, then call [`Connection::run`], which
/// blocks until the realtime stream closes.
pub struct Connection {
    shared: Arc<Shared>,
    transport: Arc<dyn StreamTransport>,
    reactions: ReactionRegistry,
}

impl Connection {
    pub fn new(api: Arc<dyn ChatApi>, transport: Arc<dyn StreamTransport>) -> Self {
        let (status, _) = watch::channel(SessionStatus::Unstarted);
        Self {
            shared: Arc::new(Shared {
                api,
                identity: OnceLock::new(),
                channel: RwLock::new(String::new()),
                status,
            }),
            transport,
            reactions: ReactionRegistry::new(),
        }
    }

    /// Set the channel replies are posted to.
    pub fn register_channel(&self, channel: impl Into<String>) {
        let mut current = self
            .shared
            .channel
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = channel.into();
    }

    /// Bind `callback` to a message keyword or presence value.
    ///
    /// Replaces an existing reaction for the same keyword. Fails with
    /// [`BotError::RegistryFrozen`] once `run()` has been called.
    pub fn register_reaction<F, Fut>(
        &mut self,
        keyword: impl Into<String>,
        callback: F,
    ) -> Result<()>
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.status() != SessionStatus::Unstarted {
            return Err(BotError::RegistryFrozen);
        }
        self.reactions.register(keyword, reaction(callback));
        Ok(())
    }

    /// The bot's own user id; empty until the session has started.
    pub fn own_user_id(&self) -> &str {
        self.shared
            .identity
            .get()
            .map(|identity| identity.id.as_str())
            .unwrap_or_default()
    }

    pub fn status(&self) -> SessionStatus {
        *self.shared.status.borrow()
    }

    /// A cloneable handle for use inside reactions.
    pub fn handle(&self) -> BotHandle {
        BotHandle {
            shared: self.shared.clone(),
        }
    }

    /// Start the session and dispatch events until the stream closes.
    ///
    /// Returns an error if the session cannot be started or the stream
    /// cannot be opened. Stream closure is a normal return.
    pub async fn run(&mut self) -> Result<()> {
        self.run_with_stats().await.map(|_| ())
    }

    /// Like [`Connection::run`], also returning the dispatch counters.
    pub async fn run_with_stats(&mut self) -> Result<DispatchStats> {
        if self.status() != SessionStatus::Unstarted {
            return Err(BotError::AlreadyStarted);
        }

        let session = match self.shared.api.start_session().await {
            Ok(session) => session,
            Err(e) => {
                self.shared.set_status(SessionStatus::Terminated);
                return Err(BotError::SessionStart(e));
            }
        };

        info!(
            bot_user_id = session.identity.id,
            bot_user_name = session.identity.name,
            "Session started"
        );

        let bot_user_id = session.identity.id.clone();
        if self.shared.identity.set(session.identity).is_err() {
            warn!("Bot identity was already set, keeping the first one");
        }

        let inbound = match self.transport.open_stream(&session.stream_endpoint).await {
            Ok(inbound) => inbound,
            Err(e) => {
                self.shared.set_status(SessionStatus::Terminated);
                return Err(BotError::StreamConnection(e));
            }
        };

        self.shared.set_status(SessionStatus::Streaming);
        let stats = run_dispatch_loop(&self.reactions, &bot_user_id, inbound).await;
        self.shared.set_status(SessionStatus::Terminated);

        info!(bot_user_id, "Session terminated");
        Ok(stats)
    }
}

/// Cloneable access to the chat service from inside reactions.
#[derive(Clone)]
pub struct BotHandle {
    shared: Arc<Shared>,
}

impl BotHandle {
    /// Post `text` to the registered channel.
    pub async fn post_message(&self, text: &str) -> anyhow::Result<()> {
        let channel = self.channel();
        if channel.is_empty() {
            bail!("no channel registered");
        }
        self.post_message_to(&channel, text).await
    }

    /// Post `text` to an explicit channel.
    pub async fn post_message_to(&self, channel: &str, text: &str) -> anyhow::Result<()> {
        self.shared
            .api
            .post_message(channel, text)
            .await
            .with_context(|| format!("failed to post message to {channel}"))
    }

    pub async fn get_user_info(&self, user_id: &str) -> anyhow::Result<SlackUser> {
        self.shared
            .api
            .get_user_info(user_id)
            .await
            .with_context(|| format!("failed to fetch user info for {user_id}"))
    }

    /// The registered channel; empty if none.
    pub fn channel(&self) -> String {
        self.shared
            .channel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The bot's own user id; empty until the session has started.
    pub fn own_user_id(&self) -> String {
        self.shared
            .identity
            .get()
            .map(|identity| identity.id.clone())
            .unwrap_or_default()
    }

    /// The bot's own user name; empty until the session has started.
    pub fn own_user_name(&self) -> String {
        self.shared
            .identity
            .get()
            .map(|identity| identity.name.clone())
            .unwrap_or_default()
    }

    pub fn status(&self) -> SessionStatus {
        *self.shared.status.borrow()
    }

    /// Watch status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status.subscribe()
    }
}
