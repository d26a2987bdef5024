// Content policy - decides whether a message breaks the group rules.
//
// Everything here is pure: no storage, no transport. The service applies the
// verdict; the pattern helpers return the matched span so the admin alert can
// quote the offending link.

use super::moderation_models::{IncomingMessage, ModerationConfig};
use once_cell::sync::Lazy;
use regex::Regex;

/// Group-join links of the chat platforms we moderate.
static GROUP_INVITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)chat\.whatsapp\.com/[0-9a-z]{20,24}|(?:discord\.gg|discord(?:app)?\.com/invite)/[0-9a-z-]+",
    )
    .expect("group invite pattern is valid")
});

/// Anything shaped like `scheme://...`.
static ANY_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z][a-z0-9+.-]*://\S*").expect("url pattern is valid")
});

/// Why a message was rejected. Variants are listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    ForeignGroupLink,
    LinkNotAllowed,
    ForbiddenTerm,
}

impl ViolationKind {
    /// Sentence fragment used in the warning sent to the chat.
    pub fn explanation(&self) -> &'static str {
        match self {
            ViolationKind::ForeignGroupLink => "links to other groups are not allowed.",
            ViolationKind::LinkNotAllowed => "links are not allowed in this group.",
            ViolationKind::ForbiddenTerm => "it contains forbidden terms.",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::ForeignGroupLink => write!(f, "foreign group link"),
            ViolationKind::LinkNotAllowed => write!(f, "link not allowed"),
            ViolationKind::ForbiddenTerm => write!(f, "forbidden term"),
        }
    }
}

/// A span of the inspected text. Offsets are byte offsets into the text that was searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextMatch {
    fn from_regex(m: regex::Match<'_>) -> Self {
        Self {
            start: m.start(),
            end: m.end(),
            text: m.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Violation {
        kind: ViolationKind,
        matched: Option<TextMatch>,
    },
}

/// First group-invite link in `text`.
pub fn find_group_invite(text: &str) -> Option<TextMatch> {
    GROUP_INVITE.find(text).map(TextMatch::from_regex)
}

/// First `scheme://` URL in `text`.
pub fn find_url(text: &str) -> Option<TextMatch> {
    ANY_URL.find(text).map(TextMatch::from_regex)
}

/// First forbidden word (in list order) occurring anywhere in `text`, ignoring case.
///
/// This is a plain substring test: "cp" matches inside "scpx". Offsets refer to
/// the lower-cased text.
pub fn find_forbidden_word(text: &str, words: &[String]) -> Option<TextMatch> {
    let haystack = text.to_lowercase();
    words.iter().find_map(|word| {
        let needle = word.to_lowercase();
        if needle.is_empty() {
            return None;
        }
        haystack.find(&needle).map(|start| TextMatch {
            start,
            end: start + needle.len(),
            text: needle,
        })
    })
}

/// Classify a message. Admins and chats outside the moderated list are never policed.
pub fn evaluate(message: &IncomingMessage, is_admin: bool, config: &ModerationConfig) -> Verdict {
    if is_admin || !config.is_moderated(&message.chat_id) {
        return Verdict::Allowed;
    }

    // An invite link is also a URL, so it has to be checked first.
    if let Some(link) = find_group_invite(&message.text) {
        return Verdict::Violation {
            kind: ViolationKind::ForeignGroupLink,
            matched: Some(link),
        };
    }

    if let Some(url) = find_url(&message.text) {
        return Verdict::Violation {
            kind: ViolationKind::LinkNotAllowed,
            matched: Some(url),
        };
    }

    if let Some(word) = find_forbidden_word(&message.text, &config.forbidden_words) {
        return Verdict::Violation {
            kind: ViolationKind::ForbiddenTerm,
            matched: Some(word),
        };
    }

    Verdict::Allowed
}
