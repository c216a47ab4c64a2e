use std::sync::Arc;

use tracing::info;

use lungfish_api::SlackApi;
use lungfish_bot::{BotHandle, Connection, Event, SlackUser};
use lungfish_config::BotConfig;
use lungfish_rtm::RtmClient;

/// Build a connection from `config`, wire up the demo reactions and run
/// until the stream closes.
pub async fn run_bot(config: BotConfig, channel: Option<String>) -> anyhow::Result<()> {
    let token = config.require_token()?;
    let api = Arc::new(SlackApi::new(&config.api_base_url, token)?);
    let transport = Arc::new(RtmClient::new(config.stream_buffer).with_origin(&config.origin));

    let mut conn = Connection::new(api, transport);
    let channel = channel.unwrap_or(config.channel);
    info!(channel, "Replies go to channel");
    conn.register_channel(channel);
    register_demo_reactions(&mut conn)?;

    let stats = conn.run_with_stats().await?;
    info!(
        received = stats.received,
        invoked = stats.invoked,
        failed = stats.failed,
        skipped = stats.skipped,
        "Stream closed"
    );
    Ok(())
}

/// Start a session only to print who the token belongs to.
pub async fn run_whoami(config: BotConfig) -> anyhow::Result<()> {
    let token = config.require_token()?;
    let api = SlackApi::new(&config.api_base_url, token)?;
    let data = api.rtm_start().await?;
    println!("id:     {}", data.bot.id);
    println!("name:   {}", data.bot.name);
    println!("stream: {}", data.url);
    Ok(())
}

pub fn register_demo_reactions(conn: &mut Connection) -> lungfish_bot::Result<()> {
    let handle = conn.handle();
    conn.register_reaction("hello", move |event| say_hello(handle.clone(), event))?;

    let handle = conn.handle();
    conn.register_reaction("ping", move |event| say_pong(handle.clone(), event))?;
    Ok(())
}

async fn say_hello(handle: BotHandle, event: Event) -> anyhow::Result<()> {
    let user = handle.get_user_info(&event.user_id).await?;
    handle.post_message(&greeting(&user)).await
}

async fn say_pong(handle: BotHandle, event: Event) -> anyhow::Result<()> {
    let args = event
        .trigger
        .as_ref()
        .map(|trigger| trigger.args())
        .unwrap_or_default();
    handle.post_message(&pong(args)).await
}

fn greeting(user: &SlackUser) -> String {
    format!("o hai <@{}> ({})", user.id, user.display_name())
}

fn pong(args: &[String]) -> String {
    if args.is_empty() {
        "pong".to_string()
    } else {
        format!("pong {}", args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::Context;
    use serde_json::json;
    use tokio::sync::mpsc;

    use lungfish_bot::{BotIdentity, ChatApi, RawEvent, SessionStart, StreamTransport, UserProfile};

    #[derive(Default)]
    struct RecordingApi {
        posts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl ChatApi for RecordingApi {
        async fn start_session(&self) -> anyhow::Result<SessionStart> {
            Ok(SessionStart {
                identity: BotIdentity {
                    id: "UBOT".into(),
                    name: "lungfish".into(),
                },
                stream_endpoint: "wss://stream.test".into(),
            })
        }

        async fn post_message(&self, channel: &str, text: &str) -> anyhow::Result<()> {
            self.posts
                .lock()
                .unwrap()
                .push((channel.to_string(), text.to_string()));
            Ok(())
        }

        async fn get_user_info(&self, user_id: &str) -> anyhow::Result<SlackUser> {
            Ok(SlackUser {
                id: user_id.to_string(),
                name: "alice".into(),
                profile: UserProfile {
                    real_name: "Alice Smith".into(),
                    ..Default::default()
                },
                ..Default::default()
            })
        }
    }

    struct ScriptedStream(Mutex<Option<mpsc::Receiver<RawEvent>>>);

    #[async_trait::async_trait]
    impl StreamTransport for ScriptedStream {
        async fn open_stream(&self, _endpoint: &str) -> anyhow::Result<mpsc::Receiver<RawEvent>> {
            self.0.lock().unwrap().take().context("already opened")
        }
    }

    #[test]
    fn test_greeting_uses_real_name() {
        let mut user = SlackUser {
            id: "U1".into(),
            name: "alice".into(),
            ..Default::default()
        };
        assert_eq!(greeting(&user), "o hai <@U1> (alice)");
        user.profile.real_name = "Alice Smith".into();
        assert_eq!(greeting(&user), "o hai <@U1> (Alice Smith)");
    }

    #[test]
    fn test_pong_echoes_args() {
        assert_eq!(pong(&[]), "pong");
        assert_eq!(pong(&["a".into(), "b".into()]), "pong a b");
    }

    #[tokio::test]
    async fn test_demo_reactions() {
        let (tx, rx) = mpsc::channel(4);
        for payload in [
            json!({"type": "message", "user": "U1", "text": "<@UBOT> hello"}),
            json!({"type": "message", "user": "U2", "text": "<@UBOT>: ping one two"}),
            json!({"type": "message", "user": "U3", "text": "hello without mention"}),
        ] {
            tx.send(payload).await.unwrap();
        }
        drop(tx);

        let api = Arc::new(RecordingApi::default());
        let transport = Arc::new(ScriptedStream(Mutex::new(Some(rx))));
        let mut conn = Connection::new(api.clone(), transport);
        conn.register_channel("#general");
        register_demo_reactions(&mut conn).unwrap();

        tokio::time::timeout(Duration::from_secs(2), conn.run())
            .await
            .expect("run should end when the stream closes")
            .unwrap();

        assert_eq!(
            *api.posts.lock().unwrap(),
            vec![
                ("#general".to_string(), "o hai <@U1> (Alice Smith)".to_string()),
                ("#general".to_string(), "pong one two".to_string()),
            ]
        );
    }
}
