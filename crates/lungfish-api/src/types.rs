//! Web API response envelopes (minimal subset).

use anyhow::bail;
use serde::Deserialize;

use lungfish_types::{BotIdentity, SlackUser};

/// Generic Web API response: `ok`, an optional `error`, and method fields
/// at the top level.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// The method payload, or an error carrying the service's error code.
    pub fn into_result(self, method: &str) -> anyhow::Result<T> {
        if !self.ok {
            bail!(
                "{method} failed: {}",
                self.error.unwrap_or_else(|| "unknown error".into())
            );
        }
        Ok(self.data)
    }
}

/// Payload of `rtm.start`.
#[derive(Debug, Default, Deserialize)]
pub struct RtmStartData {
    /// Realtime stream endpoint.
    #[serde(default)]
    pub url: String,
    #[serde(rename = "self", default)]
    pub bot: BotIdentity,
}

/// Payload of `users.info`.
#[derive(Debug, Default, Deserialize)]
pub struct UsersInfoData {
    #[serde(default)]
    pub user: Option<SlackUser>,
}

/// Payload of `users.list`.
#[derive(Debug, Default, Deserialize)]
pub struct UsersListData {
    #[serde(default)]
    pub members: Vec<SlackUser>,
}

/// Methods whose only interesting field is `ok`.
#[derive(Debug, Default, Deserialize)]
pub struct Ack {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtm_start_ok() {
        let json = r#"{
            "ok": true,
            "url": "wss://example.test/websocket/abc",
            "self": {"id": "UBOT", "name": "lungfish"}
        }"#;
        let resp: ApiResponse<RtmStartData> = serde_json::from_str(json).unwrap();
        let data = resp.into_result("rtm.start").unwrap();
        assert_eq!(data.url, "wss://example.test/websocket/abc");
        assert_eq!(data.bot.id, "UBOT");
        assert_eq!(data.bot.name, "lungfish");
    }

    #[test]
    fn test_error_response() {
        let json = r#"{"ok": false, "error": "invalid_auth"}"#;
        let resp: ApiResponse<RtmStartData> = serde_json::from_str(json).unwrap();
        assert!(!resp.ok);
        let err = resp.into_result("rtm.start").unwrap_err();
        assert_eq!(err.to_string(), "rtm.start failed: invalid_auth");
    }

    #[test]
    fn test_error_without_code() {
        let resp: ApiResponse<Ack> = serde_json::from_str(r#"{"ok": false}"#).unwrap();
        let err = resp.into_result("chat.postMessage").unwrap_err();
        assert!(err.to_string().contains("unknown error"));
    }

    #[test]
    fn test_users_info() {
        let json = r#"{
            "ok": true,
            "user": {
                "id": "U1",
                "name": "alice",
                "is_admin": true,
                "profile": {"real_name": "Alice Smith", "email": "alice@example.test"}
            }
        }"#;
        let resp: ApiResponse<UsersInfoData> = serde_json::from_str(json).unwrap();
        let user = resp.into_result("users.info").unwrap().user.unwrap();
        assert!(user.is_admin);
        assert_eq!(user.profile.email, "alice@example.test");
    }

    #[test]
    fn test_users_list_ignores_extra_fields() {
        let json = r#"{
            "ok": true,
            "members": [{"id": "U1", "name": "a"}, {"id": "U2", "name": "b"}],
            "response_metadata": {"next_cursor": ""}
        }"#;
        let resp: ApiResponse<UsersListData> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.into_result("users.list").unwrap().members.len(), 2);
    }
}
