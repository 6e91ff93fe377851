//! Conversation menu and index selection.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use chatlog_store::ConversationSummary;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("enter at least one index")]
    Empty,

    #[error("invalid index: {0:?}")]
    Invalid(String),
}

/// Table of conversations, 1-based.
pub fn render_menu(conversations: &[ConversationSummary]) -> String {
    let rule = "-".repeat(80);
    let mut out = format!("\nFound {} conversations:\n{rule}\n", conversations.len());
    out.push_str(&format!(
        "{:<5} {:<30} {:<20} {:<10}\n{rule}\n",
        "#", "Account", "Nickname", "Messages"
    ));
    for (i, c) in conversations.iter().enumerate() {
        let nickname = if c.nickname.is_empty() {
            "unknown"
        } else {
            c.nickname.as_str()
        };
        out.push_str(&format!(
            "{:<5} {:<30} {:<20} {:<10}\n",
            i + 1,
            c.account_id,
            nickname,
            c.message_count
        ));
    }
    out
}

/// Parse comma-separated 1-based indices into 0-based ones, dropping
/// repeats while keeping first-seen order.
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>, SelectionError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SelectionError::Empty);
    }

    let mut selected = Vec::new();
    for part in input.split(',').map(str::trim) {
        let index = part
            .parse::<usize>()
            .ok()
            .filter(|i| (1..=count).contains(i))
            .ok_or_else(|| SelectionError::Invalid(part.to_string()))?;
        if !selected.contains(&(index - 1)) {
            selected.push(index - 1);
        }
    }
    Ok(selected)
}

/// Print `prompt` and read one line from stdin.
pub fn prompt_line(prompt: &str) -> io::Result<String> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(account_id: &str, nickname: &str, message_count: u64) -> ConversationSummary {
        ConversationSummary {
            account_id: account_id.into(),
            nickname: nickname.into(),
            message_count,
        }
    }

    #[test]
    fn selection_dedupes_in_order() {
        assert_eq!(parse_selection("3, 1,3 ,2", 3), Ok(vec![2, 0, 1]));
    }

    #[test]
    fn selection_rejects_bad_input() {
        assert_eq!(parse_selection("  ", 3), Err(SelectionError::Empty));
        assert_eq!(
            parse_selection("1,4", 3),
            Err(SelectionError::Invalid("4".into()))
        );
        assert_eq!(
            parse_selection("0", 3),
            Err(SelectionError::Invalid("0".into()))
        );
        assert_eq!(
            parse_selection("1,,2", 3),
            Err(SelectionError::Invalid(String::new()))
        );
    }

    #[test]
    fn menu_shows_unknown_for_blank_nickname() {
        let menu = render_menu(&[summary("wxid_peer", "Peer", 12), summary("room@chatroom", "", 3)]);
        assert!(menu.contains("Found 2 conversations"));
        let lines: Vec<_> = menu.lines().filter(|l| l.starts_with(char::is_numeric)).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("wxid_peer") && lines[0].contains("Peer") && lines[0].contains("12"));
        assert!(lines[1].contains("unknown"));
    }
}
