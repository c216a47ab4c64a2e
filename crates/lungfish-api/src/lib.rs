//! Web API collaborator for lungfish.
//!
//! Implements [`lungfish_bot::ChatApi`] over the chat service's form-encoded
//! Web API (`rtm.start`, `users.info`, `users.list`, `chat.postMessage`).

pub mod client;
pub mod types;

use anyhow::bail;

use lungfish_bot::{ChatApi, SessionStart};
use lungfish_types::SlackUser;

pub use client::{DEFAULT_BASE_URL, SlackApi};

#[async_trait::async_trait]
impl ChatApi for SlackApi {
    async fn start_session(&self) -> anyhow::Result<SessionStart> {
        let data = self.rtm_start().await?;
        if data.url.is_empty() {
            bail!("rtm.start returned no stream url");
        }
        Ok(SessionStart {
            identity: data.bot,
            stream_endpoint: data.url,
        })
    }

    async fn post_message(&self, channel: &str, text: &str) -> anyhow::Result<()> {
        SlackApi::post_message(self, channel, text).await
    }

    async fn get_user_info(&self, user_id: &str) -> anyhow::Result<SlackUser> {
        SlackApi::get_user_info(self, user_id).await
    }
}
