use serde::{Deserialize, Serialize};

// ──────────────────── Stream Payloads ────────────────────

/// An untyped payload as decoded from one realtime stream frame.
///
/// Usually a JSON object with a `type` field; `null` is used as a sentinel
/// for "nothing to process".
pub type RawEvent = serde_json::Value;

/// Event kinds the normalizer recognises.
///
/// Only [`EventKind::Message`] and [`EventKind::PresenceChange`] are
/// dispatched to reactions; the rest normalize to inert events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Message,
    PresenceChange,
    Hello,
    UserTyping,
    ReconnectUrl,
    Pong,
}

impl EventKind {
    /// Look up a kind by its wire tag (the payload's `type` field).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "message" => Some(Self::Message),
            "presence_change" => Some(Self::PresenceChange),
            "hello" => Some(Self::Hello),
            "user_typing" => Some(Self::UserTyping),
            "reconnect_url" => Some(Self::ReconnectUrl),
            "pong" => Some(Self::Pong),
            _ => None,
        }
    }

    /// The wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::PresenceChange => "presence_change",
            Self::Hello => "hello",
            Self::UserTyping => "user_typing",
            Self::ReconnectUrl => "reconnect_url",
            Self::Pong => "pong",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────── Events ────────────────────

/// Command keyword and arguments extracted from a mention.
///
/// A `Trigger` always has a non-empty keyword; `args` may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trigger {
    keyword: String,
    args: Vec<String>,
}

impl Trigger {
    /// Build a trigger, or `None` if `keyword` is empty.
    pub fn new(keyword: impl Into<String>, args: Vec<String>) -> Option<Self> {
        let keyword = keyword.into();
        if keyword.is_empty() {
            return None;
        }
        Some(Self { keyword, args })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// A normalized inbound event, handed to exactly one dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Which kind of payload this event came from.
    pub kind: EventKind,
    /// Originating user id, empty if the payload carried none.
    pub user_id: String,
    /// Original message text, empty for non-message events.
    pub raw_text: String,
    /// Channel the payload originated from, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Presence value for `presence_change` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<String>,
    /// True iff the first token addresses the bot.
    pub is_mention: bool,
    /// Present only for mentions with at least a keyword after the mention.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
}

impl Event {
    /// An event of `kind` with every optional part empty.
    pub fn empty(kind: EventKind) -> Self {
        Self {
            kind,
            user_id: String::new(),
            raw_text: String::new(),
            channel: None,
            presence: None,
            is_mention: false,
            trigger: None,
        }
    }
}

// ──────────────────── Session Types ────────────────────

/// Identity the chat service assigned to the bot at session start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: String,
    pub name: String,
}

/// Lifecycle state of a bot connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// `run()` has not been called yet; reactions may still be registered.
    Unstarted,
    /// The stream is open and events are being dispatched.
    Streaming,
    /// The session ended, either at start or by stream closure.
    Terminated,
}

// ──────────────────── User Types ────────────────────

/// Profile block of a workspace user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image_24: String,
}

/// A workspace user as returned by `users.info` / `users.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub profile: UserProfile,
}

impl SlackUser {
    /// Real name if the profile has one, otherwise the handle.
    pub fn display_name(&self) -> &str {
        if self.profile.real_name.is_empty() {
            &self.name
        } else {
            &self.profile.real_name
        }
    }
}
