// Outbound side effects and the port they run through.
//
// The policy and command code only ever produce a list of `Action`s. The
// dispatcher below executes that list, in order, against whatever transport
// the bot is wired to.

use async_trait::async_trait;

/// One request to the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Post `text` in a chat. `mentions` lists the users tagged as `@handle` in the text.
    SendText {
        chat_id: String,
        text: String,
        mentions: Vec<String>,
    },
    /// Send a private message to a user.
    SendDirect { user_id: String, text: String },
    DeleteMessage { chat_id: String, message_id: String },
    RemoveParticipant { chat_id: String, user_id: String },
}

impl Action {
    pub fn text(chat_id: &str, text: impl Into<String>) -> Self {
        Action::SendText {
            chat_id: chat_id.to_string(),
            text: text.into(),
            mentions: Vec::new(),
        }
    }

    pub fn text_mentioning(chat_id: &str, text: impl Into<String>, user_id: &str) -> Self {
        Action::SendText {
            chat_id: chat_id.to_string(),
            text: text.into(),
            mentions: vec![user_id.to_string()],
        }
    }

    pub fn direct(user_id: &str, text: impl Into<String>) -> Self {
        Action::SendDirect {
            user_id: user_id.to_string(),
            text: text.into(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Action::SendText { .. } => "send_text",
            Action::SendDirect { .. } => "send_direct",
            Action::DeleteMessage { .. } => "delete_message",
            Action::RemoveParticipant { .. } => "remove_participant",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
    #[error("Chat {0} is not a group")]
    NotAGroup(String),
    #[error("Request failed: {0}")]
    Request(String),
}

/// The chat platform as seen by the moderation core.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), TransportError>;

    async fn send_direct(&self, user_id: &str, text: &str) -> Result<(), TransportError>;

    async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<(), TransportError>;

    async fn remove_participant(&self, chat_id: &str, user_id: &str)
        -> Result<(), TransportError>;
}

/// Run `actions` one after another. A failed action is logged and skipped;
/// it never stops the ones after it.
///
/// Returns how many actions failed.
pub async fn dispatch<T: ChatTransport + ?Sized>(transport: &T, actions: &[Action]) -> usize {
    let mut failures = 0;

    for action in actions {
        let result = match action {
            Action::SendText {
                chat_id,
                text,
                mentions,
            } => transport.send_text(chat_id, text, mentions).await,
            Action::SendDirect { user_id, text } => transport.send_direct(user_id, text).await,
            Action::DeleteMessage {
                chat_id,
                message_id,
            } => transport.delete_message(chat_id, message_id).await,
            Action::RemoveParticipant { chat_id, user_id } => {
                transport.remove_participant(chat_id, user_id).await
            }
        };

        if let Err(e) = result {
            failures += 1;
            tracing::warn!(action = action.label(), error = %e, "Transport action failed");
        }
    }

    failures
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Records every call. Calls whose label is in `fail_on` return an error.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub calls: Mutex<Vec<Action>>,
        pub fail_on: Vec<&'static str>,
    }

    impl RecordingTransport {
        pub fn failing(labels: &[&'static str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: labels.to_vec(),
            }
        }

        async fn record(&self, action: Action) -> Result<(), TransportError> {
            let failed = self.fail_on.contains(&action.label());
            self.calls.lock().await.push(action);
            if failed {
                Err(TransportError::Request("simulated failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send_text(
            &self,
            chat_id: &str,
            text: &str,
            mentions: &[String],
        ) -> Result<(), TransportError> {
            self.record(Action::SendText {
                chat_id: chat_id.to_string(),
                text: text.to_string(),
                mentions: mentions.to_vec(),
            })
            .await
        }

        async fn send_direct(&self, user_id: &str, text: &str) -> Result<(), TransportError> {
            self.record(Action::direct(user_id, text)).await
        }

        async fn delete_message(
            &self,
            chat_id: &str,
            message_id: &str,
        ) -> Result<(), TransportError> {
            self.record(Action::DeleteMessage {
                chat_id: chat_id.to_string(),
                message_id: message_id.to_string(),
            })
            .await
        }

        async fn remove_participant(
            &self,
            chat_id: &str,
            user_id: &str,
        ) -> Result<(), TransportError> {
            self.record(Action::RemoveParticipant {
                chat_id: chat_id.to_string(),
                user_id: user_id.to_string(),
            })
            .await
        }
    }
}
