// Moderation service - owns the config and turns inbound messages into actions.
//
// This service handles:
// - Loading the config (falling back to defaults) at startup
// - Policing messages in moderated groups
// - Warning escalation (warn -> remove)
// - Admin text commands
//
// NO Discord dependencies here. `process` runs one message end to end against
// a `ChatTransport`: state changes are persisted before any action goes out, and
// no other message is handled until the last action has been awaited.

use super::actions::{dispatch, Action, ChatTransport};
use super::commands;
use super::config_store::ConfigStore;
use super::moderation_models::{mention_tag, IncomingMessage, ModerationConfig};
use super::policy::{self, TextMatch, Verdict, ViolationKind};
use tokio::sync::Mutex;

pub struct ModerationService<S: ConfigStore> {
    store: S,
    config: Mutex<ModerationConfig>,
    /// Held for the whole of one message, dispatch included. Gateway events
    /// arrive on separate tasks; this keeps their side effects from interleaving.
    handling: Mutex<()>,
    /// The one user allowed to run commands; also receives out-of-band alerts.
    admin_id: String,
}

impl<S: ConfigStore> ModerationService<S> {
    /// Read the stored config, or create and persist a default one.
    ///
    /// Never fails: a missing or unreadable record is the bootstrap path.
    pub async fn load(store: S, admin_id: impl Into<String>) -> Self {
        let (config, needs_write) = match store.read().await {
            Ok(Some(stored)) => {
                let normalized = stored.clone().normalized();
                let repaired = normalized != stored;
                if repaired {
                    tracing::warn!("Stored moderation config broke an invariant and was repaired");
                }
                (normalized, repaired)
            }
            Ok(None) => {
                tracing::info!("No moderation config found, creating a new one");
                (ModerationConfig::default(), true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read moderation config, using defaults");
                (ModerationConfig::default(), true)
            }
        };

        let service = Self {
            store,
            config: Mutex::new(config),
            handling: Mutex::new(()),
            admin_id: admin_id.into(),
        };

        if needs_write {
            let config = service.snapshot().await;
            service.persist(&config).await;
        }

        service
    }

    pub fn admin_id(&self) -> &str {
        &self.admin_id
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        user_id == self.admin_id
    }

    /// A copy of the current config.
    pub async fn snapshot(&self) -> ModerationConfig {
        self.config.lock().await.clone()
    }

    /// Handle one inbound message and run its actions through `transport`.
    ///
    /// Returns how many actions failed.
    pub async fn process<T: ChatTransport + ?Sized>(
        &self,
        message: &IncomingMessage,
        transport: &T,
    ) -> usize {
        let _turn = self.handling.lock().await;
        let actions = self.handle_message(message).await;
        if actions.is_empty() {
            return 0;
        }

        let failures = dispatch(transport, &actions).await;
        if failures > 0 {
            tracing::warn!(
                chat_id = %message.chat_id,
                failures,
                total = actions.len(),
                "Some moderation actions could not be completed"
            );
        }
        failures
    }

    /// Send the startup notices, in turn with message handling.
    pub async fn announce_startup<T: ChatTransport + ?Sized>(&self, transport: &T) -> usize {
        let _turn = self.handling.lock().await;
        let notices = self.startup_notices().await;
        dispatch(transport, &notices).await
    }

    /// Decide what to do with one inbound message.
    ///
    /// All config changes are written to the store before this returns, so the
    /// caller can dispatch the actions knowing state is already durable.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Vec<Action> {
        if message.from_self {
            return Vec::new();
        }

        let is_admin = self.is_admin(&message.sender_id);
        let mut config = self.config.lock().await;

        if let Verdict::Violation { kind, matched } = policy::evaluate(message, is_admin, &config) {
            let span = matched.as_ref().map(|m| (m.start, m.end));
            tracing::info!(
                chat_id = %message.chat_id,
                user_id = %message.sender_id,
                kind = %kind,
                span = ?span,
                "Message violates group policy"
            );
            return self.enforce(&mut config, message, kind, matched).await;
        }

        if !is_admin {
            return Vec::new();
        }

        let Some(parsed) = commands::parse(&message.text) else {
            return Vec::new();
        };

        let outcome = commands::interpret(&parsed, message, &mut config);
        if outcome.config_changed {
            tracing::info!(command = %parsed.name, chat_id = %message.chat_id, "Admin command changed config");
            self.persist(&config).await;
        }

        outcome.actions
    }

    /// Messages to send once the transport connection is up.
    pub async fn startup_notices(&self) -> Vec<Action> {
        let config = self.config.lock().await;
        if config.moderated_groups.is_empty() {
            vec![Action::direct(
                &self.admin_id,
                "⚠️ Attention, admin! No moderated groups are set. \
                 Go to a group and use the `!addgroup` command.",
            )]
        } else {
            Vec::new()
        }
    }

    /// Build the side effects of a violation, updating the ledger on the way.
    async fn enforce(
        &self,
        config: &mut ModerationConfig,
        message: &IncomingMessage,
        kind: ViolationKind,
        matched: Option<TextMatch>,
    ) -> Vec<Action> {
        let chat = message.chat_id.as_str();
        let user = message.sender_id.as_str();
        let tag = mention_tag(user);

        let mut actions = vec![Action::DeleteMessage {
            chat_id: chat.to_string(),
            message_id: message.message_id.clone(),
        }];

        let count = config.warnings_mut().increment(user);
        self.persist(config).await;

        let limit = config.warning_limit();
        actions.push(Action::text_mentioning(
            chat,
            format!(
                "{tag}, your message was removed because {}\n\n⚠️ *Warning {count}/{limit}* ⚠️",
                kind.explanation()
            ),
            user,
        ));

        if count >= limit {
            tracing::info!(chat_id = %chat, user_id = %user, count, "Warning limit reached, removing member");
            actions.push(Action::text_mentioning(
                chat,
                format!("🚫 {tag} reached the limit of {limit} warnings and was removed."),
                user,
            ));
            actions.push(Action::RemoveParticipant {
                chat_id: chat.to_string(),
                user_id: user.to_string(),
            });
            config.warnings_mut().reset(user);
            self.persist(config).await;
        }

        if kind == ViolationKind::ForeignGroupLink {
            let link = matched.map(|m| m.text).unwrap_or_default();
            actions.push(Action::direct(
                &self.admin_id,
                format!(
                    "🚨 Group link detected and removed in {chat}!\n\nSent by: {tag}\nLink: {link}"
                ),
            ));
        }

        actions
    }

    /// Write the whole config. Failures are logged; memory keeps the change and
    /// the next successful write catches the store up.
    async fn persist(&self, config: &ModerationConfig) {
        if let Err(e) = self.store.write(config).await {
            tracing::error!(error = %e, "Failed to save moderation config");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
