//! Plain-text rendering of search results

use chrono::{DateTime, Local, Utc};
use mailsearch::{MessageSummary, SearchState};

/// Marker for the most relevant system label
pub fn label_marker(message: &MessageSummary) -> &'static str {
    if message.has_label("IMPORTANT") {
        "★"
    } else if message.has_label("INBOX") {
        "✉"
    } else if message.has_label("SENT") {
        "➤"
    } else {
        " "
    }
}

pub fn format_date(date: DateTime<Utc>, now: DateTime<Local>) -> String {
    let local = date.with_timezone(&Local);

    if local.date_naive() == now.date_naive() {
        local.format("%H:%M").to_string()
    } else if (now - local).num_days() < 7 {
        local.format("%a").to_string()
    } else {
        local.format("%b %d, %Y").to_string()
    }
}

/// One list row, numbered from 1
pub fn format_row(position: usize, message: &MessageSummary, now: DateTime<Local>) -> String {
    if !message.is_loaded {
        return format!("{:>3}.   Loading ...", position);
    }

    let sender = message.sender_name().unwrap_or_default();
    let mut row = format!(
        "{:>3}. {} {:<24} {}",
        position,
        label_marker(message),
        truncate(&sender, 24),
        message.snippet.as_deref().unwrap_or_default()
    );

    let attachments = message.attachment_count();
    if attachments > 0 {
        row.push_str(&format!("  [{} attached]", attachments));
    }
    if let Some(date) = message.received_date {
        row.push_str(&format!("  {}", format_date(date, now)));
    }
    row
}

/// Header line describing the current search
pub fn format_header(state: &SearchState) -> String {
    let query = if state.query.is_empty() {
        "all mail"
    } else {
        state.query.as_str()
    };
    format!("Results for {:?}: {}", query, state.results.len())
}

/// Multi-line detail view for one message
pub fn format_details(message: &MessageSummary) -> String {
    let mut out = format!("## {}\n", message.subject.as_deref().unwrap_or("(no subject)"));
    if let Some(from) = &message.from {
        out.push_str(&format!("From: {}\n", from));
    }
    if let Some(to) = &message.to {
        out.push_str(&format!("To:   {}\n", to));
    }
    if let Some(date) = message.received_date {
        out.push_str(&format!(
            "Date: {}\n",
            date.with_timezone(&Local).format("%b %d, %Y at %H:%M")
        ));
    }
    for attachment in message.attachments.iter().flatten() {
        out.push_str(&format!(
            "  - {} ({}, {} bytes)\n",
            attachment.filename, attachment.mime_type, attachment.size
        ));
    }
    if let Some(snippet) = &message.snippet {
        out.push_str(&format!("\n{}\n", snippet));
    }
    out.push_str(&message.web_url());
    out
}

/// Indexes that became hydrated between two states of the same search
pub fn newly_loaded(previous: &SearchState, current: &SearchState) -> Vec<usize> {
    if previous.generation != current.generation
        || previous.results.len() != current.results.len()
    {
        return Vec::new();
    }
    previous
        .results
        .iter()
        .zip(&current.results)
        .enumerate()
        .filter(|(_, (before, after))| !before.is_loaded && after.is_loaded)
        .map(|(index, _)| index)
        .collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mailsearch::MessageId;

    fn loaded(id: &str) -> MessageSummary {
        MessageSummary {
            is_loaded: true,
            from: Some("\"Ada Lovelace\" <ada@example.com>".into()),
            snippet: Some("Notes on the engine".into()),
            labels: Some(["INBOX".to_string()].into_iter().collect()),
            ..MessageSummary::placeholder(MessageId::new(id))
        }
    }

    #[test]
    fn test_placeholder_row() {
        let row = format_row(1, &MessageSummary::placeholder(MessageId::new("a")), Local::now());
        assert!(row.ends_with("Loading ..."));
    }

    #[test]
    fn test_loaded_row() {
        let row = format_row(2, &loaded("a"), Local::now());
        assert!(row.contains("Ada Lovelace"));
        assert!(row.contains("Notes on the engine"));
        assert!(row.contains('✉'));
        assert!(!row.contains("attached"));
    }

    #[test]
    fn test_important_wins_over_inbox() {
        let mut message = loaded("a");
        message.labels = Some(
            ["INBOX".to_string(), "IMPORTANT".to_string()]
                .into_iter()
                .collect(),
        );
        assert_eq!(label_marker(&message), "★");
    }

    #[test]
    fn test_format_date_older_than_a_week() {
        let now = Local::now();
        let date = Utc.with_ymd_and_hms(2020, 3, 1, 12, 0, 0).unwrap();
        assert!(format_date(date, now).contains("2020"));
    }

    #[test]
    fn test_newly_loaded() {
        let before = SearchState {
            generation: 3,
            results: vec![
                MessageSummary::placeholder(MessageId::new("a")),
                MessageSummary::placeholder(MessageId::new("b")),
            ],
            ..Default::default()
        };
        let mut after = before.clone();
        after.results[1] = loaded("b");
        assert_eq!(newly_loaded(&before, &after), vec![1]);

        after.generation = 4;
        assert!(newly_loaded(&before, &after).is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long sender name", 6), "a ver…");
    }
}
