//! Web API HTTP client.
//!
//! Every method is a form-encoded POST to `{base_url}/api/{method}`.

use std::time::Duration;

use anyhow::{Context, bail};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use lungfish_types::SlackUser;

use crate::types::{Ack, ApiResponse, RtmStartData, UsersInfoData, UsersListData};

/// Default Web API host.
pub const DEFAULT_BASE_URL: &str = "https://slack.com";

const RTM_START: &str = "rtm.start";
const USERS_INFO: &str = "users.info";
const USERS_LIST: &str = "users.list";
const CHAT_POST_MESSAGE: &str = "chat.postMessage";

/// HTTP client for the chat service's Web API.
pub struct SlackApi {
    client: Client,
    base_url: String,
    token: String,
}

impl SlackApi {
    /// Create a client for `base_url` (e.g. [`DEFAULT_BASE_URL`]) using `token`.
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/api/{method}", self.base_url)
    }

    /// POST a form to `method` and decode the JSON envelope.
    async fn post_form<T: DeserializeOwned>(
        &self,
        method: &str,
        form: &[(&str, &str)],
    ) -> anyhow::Result<T> {
        debug!(method, "Web API request");

        let resp = self
            .client
            .post(self.method_url(method))
            .form(form)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?;

        let status = resp.status();
        if status != StatusCode::OK {
            bail!("{method} request returned status {status}");
        }

        let envelope: ApiResponse<T> = resp
            .json()
            .await
            .with_context(|| format!("{method} response parse failed"))?;
        envelope.into_result(method)
    }

    /// Start a realtime session.
    pub async fn rtm_start(&self) -> anyhow::Result<RtmStartData> {
        self.post_form(RTM_START, &[("token", self.token.as_str())]).await
    }

    /// Fetch one user's profile.
    pub async fn get_user_info(&self, user_id: &str) -> anyhow::Result<SlackUser> {
        let data: UsersInfoData = self
            .post_form(
                USERS_INFO,
                &[("token", self.token.as_str()), ("user", user_id), ("as_user", "true")],
            )
            .await?;
        data.user.context("users.info returned no user")
    }

    /// List the workspace's users.
    pub async fn list_users(&self) -> anyhow::Result<Vec<SlackUser>> {
        let data: UsersListData = self
            .post_form(USERS_LIST, &[("token", self.token.as_str()), ("as_user", "true")])
            .await?;
        Ok(data.members)
    }

    /// Post a message to `channel` as the bot.
    pub async fn post_message(&self, channel: &str, text: &str) -> anyhow::Result<()> {
        let _: Ack = self
            .post_form(
                CHAT_POST_MESSAGE,
                &[
                    ("token", self.token.as_str()),
                    ("channel", channel),
                    ("text", text),
                    ("as_user", "true"),
                ],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let api = SlackApi::new(DEFAULT_BASE_URL, "xoxb-1").unwrap();
        assert_eq!(api.method_url(RTM_START), "https://slack.com/api/rtm.start");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let api = SlackApi::new("http://127.0.0.1:8080/", "xoxb-1").unwrap();
        assert_eq!(
            api.method_url(USERS_INFO),
            "http://127.0.0.1:8080/api/users.info"
        );
    }
}
