//! Reaction registry: keyword to callback.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use lungfish_types::Event;

/// Async reaction callback.
///
/// Receives the normalized event by value; an `Err` is logged by the
/// dispatch loop and does not stop it.
pub type Reaction = Arc<dyn Fn(Event) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Box an async closure into a [`Reaction`].
pub fn reaction<F, Fut>(f: F) -> Reaction
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)))
}

/// Keyword → reaction table.
///
/// Message trigger keywords and presence values share one namespace.
/// Lookups are exact and case-sensitive.
#[derive(Default)]
pub struct ReactionRegistry {
    reactions: HashMap<String, Reaction>,
}

impl ReactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reaction, replacing any previous one for `keyword`.
    pub fn register(&mut self, keyword: impl Into<String>, reaction: Reaction) {
        self.reactions.insert(keyword.into(), reaction);
    }

    pub fn lookup(&self, keyword: &str) -> Option<&Reaction> {
        self.reactions.get(keyword)
    }

    /// Remove the reaction for `keyword`, returning whether one existed.
    pub fn remove(&mut self, keyword: &str) -> bool {
        self.reactions.remove(keyword).is_some()
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// Registered keywords, sorted.
    pub fn keywords(&self) -> Vec<&str> {
        let mut keywords: Vec<&str> = self.reactions.keys().map(String::as_str).collect();
        keywords.sort_unstable();
        keywords
    }
}

impl std::fmt::Debug for ReactionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionRegistry")
            .field("keywords", &self.keywords())
            .finish()
    }
}
