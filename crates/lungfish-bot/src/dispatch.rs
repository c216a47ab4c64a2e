//! Dispatch loop: normalize inbound payloads and invoke matching reactions.
//!
//! Reactions run one at a time on the loop's task, in arrival order. The
//! loop does not read the next payload until the current reaction returns.
//! A reaction that errors or panics is logged and dispatch continues.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use lungfish_types::{Event, EventKind, RawEvent};

use crate::normalize::{is_sentinel, normalize};
use crate::registry::{Reaction, ReactionRegistry};

/// Why a payload did not reach a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `null` or `{}` payload.
    Sentinel,
    /// `type` missing or not recognised.
    UnsupportedKind,
    /// A message whose first token does not address the bot.
    NotAddressed,
    /// A mention without a keyword, or a presence change without a value.
    NoKeyword,
    /// No reaction registered for the keyword.
    Unregistered,
    /// A recognised kind that never dispatches (e.g. `hello`).
    Inert,
}

/// Result of one dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A reaction ran; `succeeded` is false if it errored or panicked.
    Invoked { succeeded: bool },
    Skipped(SkipReason),
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: u64,
    pub invoked: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl DispatchStats {
    fn record(&mut self, outcome: DispatchOutcome) {
        self.received += 1;
        match outcome {
            DispatchOutcome::Invoked { succeeded: true } => self.invoked += 1,
            DispatchOutcome::Invoked { succeeded: false } => {
                self.invoked += 1;
                self.failed += 1;
            }
            DispatchOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Consume `inbound` until the sender side closes.
///
/// Channel closure is the end of the session; the loop returns without
/// attempting further reads.
pub async fn run_dispatch_loop(
    registry: &ReactionRegistry,
    bot_user_id: &str,
    mut inbound: mpsc::Receiver<RawEvent>,
) -> DispatchStats {
    let mut stats = DispatchStats::default();

    info!(bot_user_id, reactions = registry.len(), "Dispatch loop started");

    while let Some(raw) = inbound.recv().await {
        let outcome = dispatch_raw(registry, bot_user_id, &raw).await;
        stats.record(outcome);
    }

    info!(
        received = stats.received,
        invoked = stats.invoked,
        failed = stats.failed,
        skipped = stats.skipped,
        "Inbound stream closed, dispatch loop stopped"
    );

    stats
}

/// Run one dispatch cycle for a raw payload.
pub async fn dispatch_raw(
    registry: &ReactionRegistry,
    bot_user_id: &str,
    raw: &RawEvent,
) -> DispatchOutcome {
    if is_sentinel(raw) {
        return DispatchOutcome::Skipped(SkipReason::Sentinel);
    }

    match normalize(raw, bot_user_id) {
        Ok(event) => dispatch_event(registry, event).await,
        Err(e) => {
            warn!("Skipping payload: {e}");
            DispatchOutcome::Skipped(SkipReason::UnsupportedKind)
        }
    }
}

/// Route a normalized event to its reaction, if any.
pub async fn dispatch_event(registry: &ReactionRegistry, event: Event) -> DispatchOutcome {
    let keyword = match event.kind {
        EventKind::Message => {
            if !event.is_mention {
                return DispatchOutcome::Skipped(SkipReason::NotAddressed);
            }
            match &event.trigger {
                Some(trigger) => trigger.keyword().to_string(),
                None => return DispatchOutcome::Skipped(SkipReason::NoKeyword),
            }
        }
        EventKind::PresenceChange => match &event.presence {
            Some(presence) => presence.clone(),
            None => return DispatchOutcome::Skipped(SkipReason::NoKeyword),
        },
        _ => return DispatchOutcome::Skipped(SkipReason::Inert),
    };

    let Some(reaction) = registry.lookup(&keyword) else {
        debug!(keyword, kind = %event.kind, "No reaction registered");
        return DispatchOutcome::Skipped(SkipReason::Unregistered);
    };

    debug!(keyword, kind = %event.kind, user_id = event.user_id, "Invoking reaction");
    let succeeded = invoke(reaction, &keyword, event).await;
    DispatchOutcome::Invoked { succeeded }
}

/// Await a reaction behind a panic boundary.
async fn invoke(reaction: &Reaction, keyword: &str, event: Event) -> bool {
    let call = async move { reaction(event).await };
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!(keyword, "Reaction failed: {e:#}");
            false
        }
        Err(panic) => {
            error!(keyword, "Reaction panicked: {}", panic_message(&*panic));
            false
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
