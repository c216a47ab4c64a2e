//! Mention detection and command extraction from message text.

use lungfish_types::Trigger;

/// Split message text into a mention flag and an optional trigger.
///
/// The first whitespace token decides the mention; the second becomes the
/// keyword and the rest its arguments. The trigger is returned whenever two
/// or more tokens exist, independent of the mention flag.
pub fn parse_trigger(text: &str, bot_user_id: &str) -> (bool, Option<Trigger>) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return (false, None);
    };

    let is_mention = is_mention_token(first, bot_user_id);
    if tokens.len() < 2 {
        return (is_mention, None);
    }

    let args = tokens[2..].iter().map(|t| t.to_string()).collect();
    (is_mention, Trigger::new(tokens[1], args))
}

/// Whether `token` starts with the bot's mention form.
///
/// Accepts `<@ID>` and the labelled `<@ID|name>`, with anything after the
/// closing bracket (e.g. `<@ID>:`).
pub fn is_mention_token(token: &str, bot_user_id: &str) -> bool {
    if bot_user_id.is_empty() {
        return false;
    }
    let Some(rest) = token
        .strip_prefix("<@")
        .and_then(|r| r.strip_prefix(bot_user_id))
    else {
        return false;
    };

    if rest.starts_with('>') {
        return true;
    }
    // Labelled form: the label runs up to the closing bracket.
    rest.strip_prefix('|').is_some_and(|label| label.contains('>'))
}

/// The mention form that addresses a user, e.g. `<@U123>`.
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}
