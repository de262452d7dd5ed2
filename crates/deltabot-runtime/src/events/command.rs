//! Command token parsing for chat messages.
//!
//! `/set_name Alice` splits into the first word and the rest. The first word
//! may carry a `@<bot address>` mention, which is stripped; a mention of
//! anyone else means the message is not a command for this bot. The word is
//! then matched against the registered command names, longest
//! underscore-joined prefix first, moving trailing parts into the payload.

use std::collections::HashSet;

use deltabot_core::protocol::consts::COMMAND_WORD_SEPARATOR;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: String,
    pub payload: String,
}

/// Split off the first whitespace-delimited word.
pub fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (text, ""),
    }
}

/// Parse `text` as a command.
///
/// `bot_addr` is only consulted when the first word contains `@`. Returns
/// `None` when the mention is addressed to someone else. When no registered
/// command matches, the first word is the command verbatim.
pub fn parse_command(
    text: &str,
    bot_addr: Option<&str>,
    commands: &HashSet<String>,
) -> Option<ParsedCommand> {
    let (mut word, payload) = split_first_word(text);

    if word.contains('@') {
        let suffix = format!("@{}", bot_addr?);
        word = word.strip_suffix(suffix.as_str())?;
    }

    let mut parts: Vec<&str> = word.split(COMMAND_WORD_SEPARATOR).collect();
    let mut shifted = payload.to_string();
    while let Some(last) = parts.last().copied() {
        let candidate = parts.join(&COMMAND_WORD_SEPARATOR.to_string());
        if commands.contains(&candidate) {
            return Some(ParsedCommand {
                command: candidate,
                payload: shifted,
            });
        }
        parts.pop();
        shifted = format!("{last} {shifted}").trim_end().to_string();
    }

    Some(ParsedCommand {
        command: word.to_string(),
        payload: payload.to_string(),
    })
}
