//! Best-effort classification of system (info) message text.
//!
//! The worker renders group changes as English sentences. Only a closed set
//! of phrasings is recognized; anything else is `Unclassified` and the
//! caller logs and drops it. Matching is case-insensitive and addresses are
//! returned lowercased.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
fn literal(pattern: &str) -> Regex {
    Regex::new(pattern).expect("literal pattern")
}

static MEMBER_BY: LazyLock<Regex> =
    LazyLock::new(|| literal(r"^member (.+) (removed|added) by (.+)"));
static YOU_MEMBER: LazyLock<Regex> = LazyLock::new(|| literal(r"^you (removed|added) member (.+)"));
static IMAGE: LazyLock<Regex> = LazyLock::new(|| literal(r"^group image (changed|deleted) by (.+)$"));
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| literal(r#"^group name changed from "(.+)" to ".+" by (.+)$"#));
static PARENTHESIZED_ADDR: LazyLock<Regex> = LazyLock::new(|| literal(r"^.*\((.+@.+)\)"));

/// Account itself, as actor or affected member.
pub const ME: &str = "me";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMessage {
    MemberListChanged {
        member: String,
        added: bool,
        actor: String,
    },
    GroupImageChanged {
        actor: String,
        deleted: bool,
    },
    GroupNameChanged {
        actor: String,
        old_name: String,
    },
    Unclassified,
}

/// Classify `text`; image changes are tried first, then name changes, then
/// membership changes.
pub fn classify(text: &str) -> SystemMessage {
    let text = text.trim().to_lowercase();
    parse_image_changed(&text)
        .or_else(|| parse_title_changed(&text))
        .or_else(|| parse_add_remove(&text))
        .unwrap_or(SystemMessage::Unclassified)
}

/// `Display Name (addr@host).` => `addr@host`; bare addresses lose trailing dots.
fn extract_addr(text: &str) -> String {
    let text = match PARENTHESIZED_ADDR.captures(text) {
        Some(caps) => caps.get(1).map_or(text, |m| m.as_str()),
        None => text,
    };
    text.trim_end_matches('.').trim().to_string()
}

fn parse_add_remove(text: &str) -> Option<SystemMessage> {
    if let Some(caps) = MEMBER_BY.captures(text) {
        return Some(SystemMessage::MemberListChanged {
            member: extract_addr(&caps[1]),
            added: &caps[2] == "added",
            actor: extract_addr(&caps[3]),
        });
    }

    if let Some(caps) = YOU_MEMBER.captures(text) {
        return Some(SystemMessage::MemberListChanged {
            member: extract_addr(&caps[2]),
            added: &caps[1] == "added",
            actor: ME.to_string(),
        });
    }

    if let Some(rest) = text.strip_prefix("group left by ") {
        let addr = extract_addr(rest);
        if !addr.is_empty() {
            return Some(SystemMessage::MemberListChanged {
                member: addr.clone(),
                added: false,
                actor: addr,
            });
        }
    }

    if text.starts_with("you left") {
        return Some(SystemMessage::MemberListChanged {
            member: ME.to_string(),
            added: false,
            actor: ME.to_string(),
        });
    }

    None
}

fn parse_image_changed(text: &str) -> Option<SystemMessage> {
    let caps = IMAGE.captures(text)?;
    Some(SystemMessage::GroupImageChanged {
        actor: extract_addr(&caps[2]),
        deleted: &caps[1] == "deleted",
    })
}

fn parse_title_changed(text: &str) -> Option<SystemMessage> {
    let caps = TITLE.captures(text)?;
    Some(SystemMessage::GroupNameChanged {
        actor: extract_addr(&caps[2]),
        old_name: caps[1].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(member: &str, added: bool, actor: &str) -> SystemMessage {
        SystemMessage::MemberListChanged {
            member: member.into(),
            added,
            actor: actor.into(),
        }
    }

    #[test]
    fn member_removed_by_other() {
        assert_eq!(
            classify("Member alice@x.org removed by bob@y.org"),
            member("alice@x.org", false, "bob@y.org")
        );
    }

    #[test]
    fn you_added_member() {
        assert_eq!(
            classify("You added member carol@z.org"),
            member("carol@z.org", true, "me")
        );
    }

    #[test]
    fn display_names_resolve_to_addresses() {
        assert_eq!(
            classify("Member With space (tmp1@x.org) removed by Another member (tmp2@x.org)."),
            member("tmp1@x.org", false, "tmp2@x.org")
        );
        assert_eq!(
            classify("Member Me (x@y) added by a@b."),
            member("x@y", true, "a@b")
        );
    }

    #[test]
    fn leaving_the_group() {
        assert_eq!(
            classify("Group left by some one (tmp1@x.org)."),
            member("tmp1@x.org", false, "tmp1@x.org")
        );
        assert_eq!(classify("You left the group."), member("me", false, "me"));
    }

    #[test]
    fn image_and_name_changes() {
        assert_eq!(
            classify("Group image deleted by bob@y.org."),
            SystemMessage::GroupImageChanged {
                actor: "bob@y.org".into(),
                deleted: true
            }
        );
        assert_eq!(
            classify("Group image changed by Bob (bob@y.org)."),
            SystemMessage::GroupImageChanged {
                actor: "bob@y.org".into(),
                deleted: false
            }
        );
        assert_eq!(
            classify(r#"Group name changed from "Old Team" to "New Team" by bob@y.org."#),
            SystemMessage::GroupNameChanged {
                actor: "bob@y.org".into(),
                old_name: "old team".into()
            }
        );
    }

    #[test]
    fn unknown_phrasing_is_unclassified() {
        assert_eq!(classify("Messages are end-to-end encrypted."), SystemMessage::Unclassified);
        assert_eq!(classify(""), SystemMessage::Unclassified);
    }
}
