// Discord implementation of the core `ChatTransport` port.
//
// Chat ids are channel snowflakes and user ids are user snowflakes, both as
// decimal strings. A "group" is any guild channel; removing a participant
// means kicking them from the channel's guild.

use crate::core::moderation::{ChatTransport, TransportError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use poise::serenity_prelude as serenity;
use regex::{Captures, Regex};
use std::sync::Arc;

/// `@<digits>` tokens that are not already inside a `<@...>` mention.
static MENTION_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^<\w])@(\d+)").expect("mention pattern is valid"));

pub struct SerenityTransport {
    http: Arc<serenity::Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

fn parse_id(raw: &str) -> Result<u64, TransportError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| TransportError::InvalidId(raw.to_string()))
}

fn request_error(e: serenity::Error) -> TransportError {
    TransportError::Request(e.to_string())
}

/// Turn the core's `@id` tags into Discord mentions, for listed users only.
pub fn render_mentions(text: &str, mentions: &[String]) -> String {
    MENTION_TAG
        .replace_all(text, |caps: &Captures<'_>| {
            let id = &caps[2];
            if mentions.iter().any(|m| m == id) {
                format!("{}<@{}>", &caps[1], id)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

#[async_trait]
impl ChatTransport for SerenityTransport {
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), TransportError> {
        let channel = serenity::ChannelId::new(parse_id(chat_id)?);
        let users: Vec<serenity::UserId> = mentions
            .iter()
            .filter_map(|m| parse_id(m).ok())
            .map(serenity::UserId::new)
            .collect();

        let builder = serenity::CreateMessage::new()
            .content(render_mentions(text, mentions))
            .allowed_mentions(serenity::CreateAllowedMentions::new().users(users));

        channel
            .send_message(&self.http, builder)
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn send_direct(&self, user_id: &str, text: &str) -> Result<(), TransportError> {
        let user = serenity::UserId::new(parse_id(user_id)?);
        user.direct_message(&self.http, serenity::CreateMessage::new().content(text))
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<(), TransportError> {
        let channel = serenity::ChannelId::new(parse_id(chat_id)?);
        let message = serenity::MessageId::new(parse_id(message_id)?);
        channel
            .delete_message(&self.http, message)
            .await
            .map_err(request_error)
    }

    async fn remove_participant(
        &self,
        chat_id: &str,
        user_id: &str,
    ) -> Result<(), TransportError> {
        let channel = serenity::ChannelId::new(parse_id(chat_id)?);
        let user = serenity::UserId::new(parse_id(user_id)?);

        let guild_id = match channel.to_channel(&self.http).await.map_err(request_error)? {
            serenity::Channel::Guild(guild_channel) => guild_channel.guild_id,
            _ => return Err(TransportError::NotAGroup(chat_id.to_string())),
        };

        guild_id
            .kick(&self.http, user)
            .await
            .map_err(request_error)
    }
}
