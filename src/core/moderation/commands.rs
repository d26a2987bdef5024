// Admin text commands.
//
// Parsing and interpretation are pure: `interpret` edits the config in place
// and reports whether it changed, and the service persists before any reply
// goes out.

use super::actions::Action;
use super::moderation_models::{mention_tag, IncomingMessage, ModerationConfig};

pub const COMMAND_PREFIX: char = '!';

const NOT_A_GROUP: &str = "This command can only be used inside a group.";

/// A prefixed message split into its keyword and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Split `!name arg1 arg2` into parts. Returns `None` for text that is not a command.
pub fn parse(text: &str) -> Option<ParsedCommand> {
    let rest = text.strip_prefix(COMMAND_PREFIX)?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_string();
    Some(ParsedCommand {
        name,
        args: parts.map(str::to_string).collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Ping,
    Id,
    AddGroup,
    DelGroup,
    AddWord,
    DelWord,
    Config,
    Ban,
    Warn,
    ResetWarns,
    SetLimit,
    Warns,
}

impl AdminCommand {
    /// Keywords are case-sensitive.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let command = match keyword {
            "ping" => AdminCommand::Ping,
            "id" => AdminCommand::Id,
            "addgroup" => AdminCommand::AddGroup,
            "delgroup" => AdminCommand::DelGroup,
            "addword" => AdminCommand::AddWord,
            "delword" => AdminCommand::DelWord,
            "config" => AdminCommand::Config,
            "ban" => AdminCommand::Ban,
            "advertir" | "warn" => AdminCommand::Warn,
            "resetwarns" => AdminCommand::ResetWarns,
            "setlimit" => AdminCommand::SetLimit,
            "warns" => AdminCommand::Warns,
            _ => return None,
        };
        Some(command)
    }
}

/// What a command asks of the transport, and whether the config must be saved first.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub actions: Vec<Action>,
    pub config_changed: bool,
}

impl CommandOutcome {
    fn reply(chat_id: &str, text: impl Into<String>) -> Self {
        Self {
            actions: vec![Action::text(chat_id, text)],
            config_changed: false,
        }
    }

    fn changed(mut self) -> Self {
        self.config_changed = true;
        self
    }
}

/// Run one admin command against `config`. Unknown keywords produce an empty outcome.
pub fn interpret(
    parsed: &ParsedCommand,
    message: &IncomingMessage,
    config: &mut ModerationConfig,
) -> CommandOutcome {
    let Some(command) = AdminCommand::from_keyword(&parsed.name) else {
        return CommandOutcome::default();
    };

    let chat = message.chat_id.as_str();
    let target = message.mentioned_users.first().map(String::as_str);

    match command {
        AdminCommand::Ping => CommandOutcome::reply(chat, "pong"),

        AdminCommand::Id => CommandOutcome::reply(chat, format!("This chat's ID is: {chat}")),

        AdminCommand::AddGroup => {
            if !message.is_group() {
                return CommandOutcome::reply(chat, NOT_A_GROUP);
            }
            if config.add_group(chat) {
                CommandOutcome::reply(chat, "✅ This group was ADDED to the moderation list.")
                    .changed()
            } else {
                CommandOutcome::reply(chat, "This group is already on the moderation list.")
            }
        }

        AdminCommand::DelGroup => {
            if !message.is_group() {
                return CommandOutcome::reply(chat, NOT_A_GROUP);
            }
            if config.remove_group(chat) {
                CommandOutcome::reply(chat, "✅ This group was REMOVED from the moderation list.")
                    .changed()
            } else {
                CommandOutcome::reply(chat, "This group was not on the moderation list.")
            }
        }

        AdminCommand::AddWord => {
            let Some(word) = parsed.args.first().map(|w| w.to_lowercase()) else {
                return CommandOutcome::reply(chat, "Usage: !addword <word>");
            };
            if config.add_word(&word) {
                CommandOutcome::reply(chat, format!("✅ Word \"{word}\" added to the filter."))
                    .changed()
            } else {
                CommandOutcome::reply(chat, "That word is already in the filter.")
            }
        }

        AdminCommand::DelWord => {
            let Some(word) = parsed.args.first().map(|w| w.to_lowercase()) else {
                return CommandOutcome::reply(chat, "Usage: !delword <word>");
            };
            if config.remove_word(&word) {
                CommandOutcome::reply(chat, format!("✅ Word \"{word}\" removed from the filter."))
                    .changed()
            } else {
                CommandOutcome::reply(chat, "That word is not in the filter.")
            }
        }

        AdminCommand::Config => CommandOutcome::reply(chat, format_config(config)),

        AdminCommand::Ban => {
            if !message.is_group() {
                return CommandOutcome::reply(chat, NOT_A_GROUP);
            }
            let Some(user) = target else {
                return CommandOutcome::reply(
                    chat,
                    "You need to mention the user to ban. Ex: !ban @user",
                );
            };
            CommandOutcome {
                actions: vec![
                    Action::text_mentioning(
                        chat,
                        format!("Banning {} by order of the admin.", mention_tag(user)),
                        user,
                    ),
                    Action::RemoveParticipant {
                        chat_id: chat.to_string(),
                        user_id: user.to_string(),
                    },
                ],
                config_changed: false,
            }
        }

        AdminCommand::Warn => {
            if !message.is_group() {
                return CommandOutcome::reply(chat, NOT_A_GROUP);
            }
            // The first argument is the mention itself.
            let reason = parsed.args.iter().skip(1).cloned().collect::<Vec<_>>().join(" ");
            let Some(user) = target.filter(|_| !reason.is_empty()) else {
                return CommandOutcome::reply(
                    chat,
                    format!("Wrong format. Use: !{} @user <reason>", parsed.name),
                );
            };
            CommandOutcome {
                actions: vec![
                    Action::direct(user, formal_warning(&reason)),
                    Action::text_mentioning(
                        chat,
                        format!("✅ User {} was warned privately.", mention_tag(user)),
                        user,
                    ),
                ],
                config_changed: false,
            }
        }

        AdminCommand::ResetWarns => {
            let Some(user) = target else {
                return CommandOutcome::reply(
                    chat,
                    "You need to mention the user. Ex: !resetwarns @user",
                );
            };
            if config.warnings_mut().reset(user) {
                CommandOutcome {
                    actions: vec![Action::text_mentioning(
                        chat,
                        format!("✅ Warnings for {} have been reset.", mention_tag(user)),
                        user,
                    )],
                    config_changed: true,
                }
            } else {
                CommandOutcome {
                    actions: vec![Action::text_mentioning(
                        chat,
                        format!("User {} had no warnings.", mention_tag(user)),
                        user,
                    )],
                    config_changed: false,
                }
            }
        }

        AdminCommand::SetLimit => {
            let limit = parsed.args.first().and_then(|raw| raw.parse::<u32>().ok());
            match limit {
                Some(limit) if config.set_warning_limit(limit) => {
                    CommandOutcome::reply(chat, format!("✅ Warning limit set to {limit}."))
                        .changed()
                }
                _ => CommandOutcome::reply(chat, "Usage: !setlimit <number greater than 0>"),
            }
        }

        AdminCommand::Warns => {
            let Some(user) = target else {
                return CommandOutcome::reply(chat, "You need to mention the user. Ex: !warns @user");
            };
            CommandOutcome {
                actions: vec![Action::text_mentioning(
                    chat,
                    format!(
                        "{} has {}/{} warnings.",
                        mention_tag(user),
                        config.warnings().get(user),
                        config.warning_limit()
                    ),
                    user,
                )],
                config_changed: false,
            }
        }
    }
}

fn format_config(config: &ModerationConfig) -> String {
    let groups = if config.moderated_groups.is_empty() {
        "None".to_string()
    } else {
        config
            .moderated_groups
            .iter()
            .enumerate()
            .map(|(i, group)| format!("{}. {}", i + 1, group))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "🔧 *Current Settings*\n\n*Moderated Groups:*\n{}\n\n*Forbidden Words:* {}\n\n*Warning Limit:* {}",
        groups,
        config.forbidden_words.join(", "),
        config.warning_limit()
    )
}

fn formal_warning(reason: &str) -> String {
    format!(
        "⚠️ *WARNING* ⚠️\n\nYou have received an official warning from the administrator.\n\n\
         *Reason:* {reason}\n\nPlease reread the group rules to avoid further penalties."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_models::ChatKind;

    fn admin_message(chat_kind: ChatKind, text: &str, mentions: &[&str]) -> IncomingMessage {
        IncomingMessage {
            message_id: "m1".to_string(),
            sender_id: "admin".to_string(),
            chat_id: "group-1".to_string(),
            chat_kind,
            text: text.to_string(),
            from_self: false,
            mentioned_users: mentions.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn run(config: &mut ModerationConfig, text: &str, mentions: &[&str]) -> CommandOutcome {
        run_in(config, ChatKind::Group, text, mentions)
    }

    fn run_in(
        config: &mut ModerationConfig,
        chat_kind: ChatKind,
        text: &str,
        mentions: &[&str],
    ) -> CommandOutcome {
        let message = admin_message(chat_kind, text, mentions);
        let parsed = parse(text).expect("test text is a command");
        interpret(&parsed, &message, config)
    }

    fn reply_text(outcome: &CommandOutcome) -> &str {
        match outcome.actions.first() {
            Some(Action::SendText { text, .. }) => text.as_str(),
            other => panic!("expected a text reply, got {other:?}"),
        }
    }

    #[test]
    fn parse_splits_on_any_whitespace() {
        let parsed = parse("!advertir   @joe  spamming   links").unwrap();
        assert_eq!(parsed.name, "advertir");
        assert_eq!(parsed.args, vec!["@joe", "spamming", "links"]);
        assert_eq!(parse("! ping").unwrap().name, "ping");
    }

    #[test]
    fn parse_rejects_non_commands() {
        assert!(parse("ping").is_none());
        assert!(parse("!").is_none());
        assert!(parse("!   ").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn unknown_command_is_silent() {
        let mut config = ModerationConfig::default();
        let outcome = run(&mut config, "!dance now", &[]);
        assert_eq!(outcome, CommandOutcome::default());
        // Keywords are case-sensitive.
        assert!(run(&mut config, "!PING", &[]).actions.is_empty());
    }

    #[test]
    fn ping_and_id_reply() {
        let mut config = ModerationConfig::default();
        assert_eq!(reply_text(&run(&mut config, "!ping", &[])), "pong");
        assert!(reply_text(&run(&mut config, "!id", &[])).contains("group-1"));
    }

    #[test]
    fn addgroup_requires_group_chat() {
        let mut config = ModerationConfig::default();
        let outcome = run_in(&mut config, ChatKind::Direct, "!addgroup", &[]);
        assert_eq!(reply_text(&outcome), NOT_A_GROUP);
        assert!(!outcome.config_changed);
        assert!(config.moderated_groups.is_empty());
    }

    #[test]
    fn addgroup_then_delgroup() {
        let mut config = ModerationConfig::default();

        let outcome = run(&mut config, "!addgroup", &[]);
        assert!(outcome.config_changed);
        assert!(config.is_moderated("group-1"));

        let outcome = run(&mut config, "!addgroup", &[]);
        assert!(!outcome.config_changed);
        assert!(reply_text(&outcome).contains("already"));

        let outcome = run(&mut config, "!delgroup", &[]);
        assert!(outcome.config_changed);
        assert!(!config.is_moderated("group-1"));

        let outcome = run(&mut config, "!delgroup", &[]);
        assert!(!outcome.config_changed);
    }

    #[test]
    fn addword_twice_keeps_one_entry() {
        let mut config = ModerationConfig::default();
        assert!(run(&mut config, "!addword Scam", &[]).config_changed);
        let second = run(&mut config, "!addword scam", &[]);
        assert!(!second.config_changed);
        assert_eq!(reply_text(&second), "That word is already in the filter.");
        assert_eq!(config.forbidden_words.iter().filter(|w| *w == "scam").count(), 1);
    }

    #[test]
    fn word_commands_need_an_argument() {
        let mut config = ModerationConfig::default();
        assert_eq!(reply_text(&run(&mut config, "!addword", &[])), "Usage: !addword <word>");
        assert_eq!(reply_text(&run(&mut config, "!delword", &[])), "Usage: !delword <word>");
    }

    #[test]
    fn delword_removes_case_insensitively() {
        let mut config = ModerationConfig::default();
        let outcome = run(&mut config, "!delword CP", &[]);
        assert!(outcome.config_changed);
        assert!(config.forbidden_words.is_empty());
        assert!(!run(&mut config, "!delword cp", &[]).config_changed);
    }

    #[test]
    fn config_dump_lists_groups_and_words() {
        let mut config = ModerationConfig::default();
        config.add_group("g-a");
        config.add_group("g-b");
        config.add_word("scam");

        let outcome = run(&mut config, "!config", &[]);
        let text = reply_text(&outcome);
        assert!(text.contains("1. g-a\n2. g-b"));
        assert!(text.contains("cp, scam"));
        assert!(text.contains("*Warning Limit:* 3"));

        let mut empty = ModerationConfig::default();
        assert!(reply_text(&run(&mut empty, "!config", &[])).contains("None"));
    }

    #[test]
    fn ban_removes_first_mention() {
        let mut config = ModerationConfig::default();
        let outcome = run(&mut config, "!ban @a @b", &["a", "b"]);
        assert_eq!(outcome.actions.len(), 2);
        assert_eq!(
            outcome.actions[1],
            Action::RemoveParticipant {
                chat_id: "group-1".to_string(),
                user_id: "a".to_string(),
            }
        );
    }

    #[test]
    fn ban_errors() {
        let mut config = ModerationConfig::default();
        let outcome = run(&mut config, "!ban", &[]);
        assert_eq!(outcome.actions.len(), 1);
        assert!(reply_text(&outcome).contains("mention"));

        let outcome = run_in(&mut config, ChatKind::Direct, "!ban @a", &["a"]);
        assert_eq!(reply_text(&outcome), NOT_A_GROUP);
    }

    #[test]
    fn warn_sends_private_notice_with_reason() {
        let mut config = ModerationConfig::default();
        let outcome = run(&mut config, "!advertir @joe posting spam", &["joe"]);
        assert_eq!(outcome.actions.len(), 2);
        match &outcome.actions[0] {
            Action::SendDirect { user_id, text } => {
                assert_eq!(user_id, "joe");
                assert!(text.contains("*Reason:* posting spam"));
            }
            other => panic!("expected direct message, got {other:?}"),
        }
        assert!(matches!(
            &outcome.actions[1],
            Action::SendText { mentions, .. } if *mentions == vec!["joe".to_string()]
        ));

        // English alias
        assert_eq!(run(&mut config, "!warn @joe again", &["joe"]).actions.len(), 2);
    }

    #[test]
    fn warn_without_reason_is_a_usage_error() {
        let mut config = ModerationConfig::default();
        let outcome = run(&mut config, "!advertir @joe", &["joe"]);
        assert_eq!(outcome.actions.len(), 1);
        assert!(reply_text(&outcome).starts_with("Wrong format. Use: !advertir"));

        let outcome = run(&mut config, "!warn someone because", &[]);
        assert!(reply_text(&outcome).starts_with("Wrong format. Use: !warn"));
    }

    #[test]
    fn resetwarns_without_warnings_is_informational() {
        let mut config = ModerationConfig::default();
        let before = config.clone();
        let outcome = run(&mut config, "!resetwarns @nobody", &["nobody"]);
        assert!(!outcome.config_changed);
        assert_eq!(reply_text(&outcome), "User @nobody had no warnings.");
        assert_eq!(config, before);
    }

    #[test]
    fn resetwarns_clears_entry() {
        let mut config = ModerationConfig::default();
        config.warnings_mut().increment("joe");
        config.warnings_mut().increment("joe");

        let outcome = run(&mut config, "!resetwarns @joe", &["joe"]);
        assert!(outcome.config_changed);
        assert_eq!(config.warnings().get("joe"), 0);

        // Works outside groups too.
        let outcome = run_in(&mut config, ChatKind::Direct, "!resetwarns", &[]);
        assert!(reply_text(&outcome).contains("mention"));
    }

    #[test]
    fn setlimit_validates_input() {
        let mut config = ModerationConfig::default();
        for bad in ["!setlimit", "!setlimit 0", "!setlimit -1", "!setlimit five"] {
            let outcome = run(&mut config, bad, &[]);
            assert!(!outcome.config_changed, "{bad}");
            assert!(reply_text(&outcome).starts_with("Usage"));
        }
        assert_eq!(config.warning_limit(), 3);

        assert!(run(&mut config, "!setlimit 5", &[]).config_changed);
        assert_eq!(config.warning_limit(), 5);
    }

    #[test]
    fn warns_reports_count() {
        let mut config = ModerationConfig::default();
        config.warnings_mut().increment("joe");
        let outcome = run(&mut config, "!warns @joe", &["joe"]);
        assert_eq!(reply_text(&outcome), "@joe has 1/3 warnings.");
    }
}
