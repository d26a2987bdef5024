// Discord-specific message handling - converts gateway events for the core
// and runs whatever actions it returns.

use crate::core::moderation::{ChatKind, IncomingMessage};
use crate::discord::moderation::SerenityTransport;
use crate::discord::Data;
use once_cell::sync::Lazy;
use poise::serenity_prelude as serenity;
use regex::Regex;

/// `<@id>` and the legacy nickname form `<@!id>`. Role mentions (`<@&id>`) don't match.
static USER_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@!?(\d+)>").expect("user mention pattern is valid"));

/// User ids mentioned in `content`, in the order they are written.
///
/// The gateway's `mentions` array is unordered and also carries the author of a
/// replied-to message, so command targets are read from the text itself.
fn mentions_in_text(content: &str) -> Vec<String> {
    USER_MENTION
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Strip a gateway message down to what the moderation core needs.
pub fn to_incoming(msg: &serenity::Message, bot_id: serenity::UserId) -> IncomingMessage {
    IncomingMessage {
        message_id: msg.id.to_string(),
        sender_id: msg.author.id.to_string(),
        chat_id: msg.channel_id.to_string(),
        chat_kind: if msg.guild_id.is_some() {
            ChatKind::Group
        } else {
            ChatKind::Direct
        },
        text: msg.content.clone(),
        from_self: msg.author.id == bot_id,
        mentioned_users: mentions_in_text(&msg.content),
    }
}

/// Police one message (or run it as an admin command) and apply the result.
pub async fn handle_message(ctx: &serenity::Context, data: &Data, msg: &serenity::Message) {
    let bot_id = ctx.cache.current_user().id;
    let incoming = to_incoming(msg, bot_id);

    let transport = SerenityTransport::new(ctx.http.clone());
    data.moderation.process(&incoming, &transport).await;
}

/// Runs on every (re)connect.
pub async fn handle_ready(ctx: &serenity::Context, data: &Data, ready: &serenity::Ready) {
    tracing::info!(
        user = %ready.user.name,
        guilds = ready.guilds.len(),
        admin_id = %data.moderation.admin_id(),
        "✅ Connection open, bot ready"
    );

    let transport = SerenityTransport::new(ctx.http.clone());
    data.moderation.announce_startup(&transport).await;
}
