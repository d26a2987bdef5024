// Moderation domain models - the persisted policy record and the inbound message shape.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts its own message type into `IncomingMessage`.

use super::warning_ledger::WarningLedger;
use serde::{Deserialize, Serialize};

/// Word seeded into a freshly created config.
pub const DEFAULT_FORBIDDEN_WORD: &str = "cp";
/// Violations allowed before a member is removed.
pub const DEFAULT_WARNING_LIMIT: u32 = 3;

/// The whole moderation policy. Persisted as one record on every change.
///
/// The serialized layout is `{ moderatedGroups, forbiddenWords, warningSystem: { limit, users } }`
/// so config files written by earlier deployments keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationConfig {
    /// Chats under active moderation, in the order they were added.
    #[serde(default)]
    pub moderated_groups: Vec<String>,
    /// Lower-cased terms matched as substrings.
    #[serde(default)]
    pub forbidden_words: Vec<String>,
    #[serde(default)]
    pub warning_system: WarningSystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningSystem {
    #[serde(default = "default_warning_limit")]
    pub limit: u32,
    #[serde(default)]
    pub users: WarningLedger,
}

fn default_warning_limit() -> u32 {
    DEFAULT_WARNING_LIMIT
}

impl Default for WarningSystem {
    fn default() -> Self {
        Self {
            limit: DEFAULT_WARNING_LIMIT,
            users: WarningLedger::default(),
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            moderated_groups: Vec::new(),
            forbidden_words: vec![DEFAULT_FORBIDDEN_WORD.to_string()],
            warning_system: WarningSystem::default(),
        }
    }
}

impl ModerationConfig {
    /// Repair a record that parsed but breaks an invariant (hand edits, older versions).
    pub fn normalized(mut self) -> Self {
        let mut groups: Vec<String> = Vec::with_capacity(self.moderated_groups.len());
        for group in self.moderated_groups {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        self.moderated_groups = groups;

        let mut words: Vec<String> = Vec::with_capacity(self.forbidden_words.len());
        for word in self.forbidden_words {
            let word = word.to_lowercase();
            if !word.is_empty() && !words.contains(&word) {
                words.push(word);
            }
        }
        self.forbidden_words = words;

        self.warning_system.limit = self.warning_system.limit.max(1);
        self
    }

    pub fn warning_limit(&self) -> u32 {
        self.warning_system.limit
    }

    /// Set the removal threshold. Returns `false` (and changes nothing) for 0.
    pub fn set_warning_limit(&mut self, limit: u32) -> bool {
        if limit == 0 {
            return false;
        }
        self.warning_system.limit = limit;
        true
    }

    pub fn warnings(&self) -> &WarningLedger {
        &self.warning_system.users
    }

    pub fn warnings_mut(&mut self) -> &mut WarningLedger {
        &mut self.warning_system.users
    }

    pub fn is_moderated(&self, chat_id: &str) -> bool {
        self.moderated_groups.iter().any(|g| g == chat_id)
    }

    /// Returns `true` if the group was newly added.
    pub fn add_group(&mut self, chat_id: &str) -> bool {
        if self.is_moderated(chat_id) {
            return false;
        }
        self.moderated_groups.push(chat_id.to_string());
        true
    }

    /// Returns `true` if the group was present.
    pub fn remove_group(&mut self, chat_id: &str) -> bool {
        match self.moderated_groups.iter().position(|g| g == chat_id) {
            Some(index) => {
                self.moderated_groups.remove(index);
                true
            }
            None => false,
        }
    }

    /// Lower-cases `word` before inserting. Returns `true` if it was newly added.
    pub fn add_word(&mut self, word: &str) -> bool {
        let word = word.to_lowercase();
        if word.is_empty() || self.forbidden_words.contains(&word) {
            return false;
        }
        self.forbidden_words.push(word);
        true
    }

    /// Returns `true` if the word was present.
    pub fn remove_word(&mut self, word: &str) -> bool {
        let word = word.to_lowercase();
        match self.forbidden_words.iter().position(|w| *w == word) {
            Some(index) => {
                self.forbidden_words.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Whether a chat supports membership removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Group,
    Direct,
}

/// One inbound message, already stripped of transport-specific types.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Transport reference used to delete the message
    pub message_id: String,
    pub sender_id: String,
    pub chat_id: String,
    pub chat_kind: ChatKind,
    pub text: String,
    /// Sent by the bot account itself
    pub from_self: bool,
    /// Users mentioned in the message, in the order they appear in the text
    pub mentioned_users: Vec<String>,
}

impl IncomingMessage {
    pub fn is_group(&self) -> bool {
        self.chat_kind == ChatKind::Group
    }
}

/// Render a user as an `@handle` token. The handle is the id up to the first `@`.
///
/// Transports that support structured mentions rewrite these tokens using the
/// `mentions` list carried alongside the text.
pub fn mention_tag(user_id: &str) -> String {
    let handle = user_id.split('@').next().unwrap_or(user_id);
    format!("@{handle}")
}
