//! Gmail API response normalization
//!
//! Converts full Gmail message responses into hydrated [`MessageSummary`]s.

use chrono::{DateTime, Utc};

use super::api::{GmailMessage, Header, MessagePart};
use crate::models::{Attachment, MessageId, MessageSummary};

/// Build a hydrated summary from a full message response
///
/// Missing headers, a missing payload or an unparseable `Date` leave the
/// corresponding fields empty; they never fail the conversion.
pub fn summarize_message(gmail_msg: GmailMessage) -> MessageSummary {
    let payload = gmail_msg.payload.unwrap_or_default();
    let headers = payload.headers.as_deref().unwrap_or_default();

    let mut attachments = Vec::new();
    if let Some(parts) = &payload.parts {
        collect_attachments(parts, &mut attachments);
    }

    MessageSummary {
        id: MessageId::new(gmail_msg.id),
        is_loaded: true,
        snippet: gmail_msg.snippet.map(|s| decode_html_entities(&s)),
        received_date: extract_header(headers, "Date").and_then(parse_date),
        subject: extract_header(headers, "Subject").map(str::to_string),
        from: extract_header(headers, "From").map(str::to_string),
        to: extract_header(headers, "To").map(str::to_string),
        labels: gmail_msg.label_ids.map(|ids| ids.into_iter().collect()),
        attachments: Some(attachments),
    }
}

/// First header whose name matches exactly
fn extract_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

/// Parse an RFC 2822 `Date` header
///
/// Gmail frequently appends a zone comment such as `(UTC)` or `(PST)`; it is
/// stripped before a second attempt.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    let without_comment = match value.rfind('(') {
        Some(idx) if value.ends_with(')') => value[..idx].trim_end(),
        _ => return None,
    };
    DateTime::parse_from_rfc2822(without_comment)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Depth-first walk collecting parts that carry a filename
fn collect_attachments(parts: &[MessagePart], out: &mut Vec<Attachment>) {
    for part in parts {
        if let Some(filename) = part.filename.as_deref()
            && !filename.is_empty()
        {
            out.push(Attachment {
                filename: filename.to_string(),
                mime_type: part
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                size: part.body.as_ref().and_then(|b| b.size).unwrap_or(0),
            });
        }

        if let Some(nested) = &part.parts {
            collect_attachments(nested, out);
        }
    }
}

/// Decode HTML entities in snippet text
fn decode_html_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message_json(headers: &str, parts: &str) -> GmailMessage {
        let json = format!(
            r#"{{
                "id": "m1",
                "threadId": "t1",
                "labelIds": ["INBOX", "IMPORTANT"],
                "snippet": "Fish &amp; chips &lt;3",
                "payload": {{ "mimeType": "multipart/mixed", "headers": {}, "parts": {} }}
            }}"#,
            headers, parts
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_full_message_summary() {
        let msg = message_json(
            r#"[
                {"name": "Subject", "value": "Lunch"},
                {"name": "From", "value": "Ada <ada@example.com>"},
                {"name": "To", "value": "bob@example.com"},
                {"name": "Date", "value": "Tue, 14 Nov 2023 09:30:00 +0100"}
            ]"#,
            "[]",
        );

        let summary = summarize_message(msg);
        assert!(summary.is_loaded);
        assert_eq!(summary.id.as_str(), "m1");
        assert_eq!(summary.subject.as_deref(), Some("Lunch"));
        assert_eq!(summary.from.as_deref(), Some("Ada <ada@example.com>"));
        assert_eq!(summary.to.as_deref(), Some("bob@example.com"));
        assert_eq!(summary.snippet.as_deref(), Some("Fish & chips <3"));
        assert_eq!(
            summary.received_date,
            Some(Utc.with_ymd_and_hms(2023, 11, 14, 8, 30, 0).unwrap())
        );
        assert!(summary.has_label("IMPORTANT"));
        assert_eq!(summary.attachments, Some(vec![]));
    }

    #[test]
    fn test_header_names_are_case_sensitive() {
        let msg = message_json(r#"[{"name": "subject", "value": "lower"}]"#, "[]");
        assert_eq!(summarize_message(msg).subject, None);
    }

    #[test]
    fn test_first_header_wins() {
        let msg = message_json(
            r#"[
                {"name": "Received", "value": "by mx"},
                {"name": "From", "value": "first@example.com"},
                {"name": "From", "value": "second@example.com"}
            ]"#,
            "[]",
        );
        assert_eq!(
            summarize_message(msg).from.as_deref(),
            Some("first@example.com")
        );
    }

    #[test]
    fn test_missing_date_does_not_fail() {
        let msg = message_json(r#"[{"name": "Subject", "value": "No date"}]"#, "[]");
        let summary = summarize_message(msg);
        assert!(summary.is_loaded);
        assert_eq!(summary.received_date, None);
        assert_eq!(summary.subject.as_deref(), Some("No date"));
    }

    #[test]
    fn test_unparseable_date_is_none() {
        let msg = message_json(r#"[{"name": "Date", "value": "last tuesday"}]"#, "[]");
        assert_eq!(summarize_message(msg).received_date, None);
    }

    #[test]
    fn test_date_with_zone_comment() {
        let parsed = parse_date("Mon, 6 Nov 2023 17:05:12 +0000 (UTC)").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 11, 6, 17, 5, 12).unwrap());
    }

    #[test]
    fn test_attachments_from_nested_parts() {
        let msg = message_json(
            "[]",
            r#"[
                {
                    "mimeType": "multipart/alternative",
                    "filename": "",
                    "body": {"size": 0},
                    "parts": [
                        {"mimeType": "text/plain", "filename": "", "body": {"size": 10}},
                        {"mimeType": "image/png", "filename": "inline.png", "body": {"attachmentId": "x", "size": 2048}}
                    ]
                },
                {"mimeType": "application/pdf", "filename": "report.pdf", "body": {"attachmentId": "y", "size": 51200}}
            ]"#,
        );

        let attachments = summarize_message(msg).attachments.unwrap();
        assert_eq!(
            attachments,
            vec![
                Attachment {
                    filename: "inline.png".into(),
                    mime_type: "image/png".into(),
                    size: 2048,
                },
                Attachment {
                    filename: "report.pdf".into(),
                    mime_type: "application/pdf".into(),
                    size: 51200,
                },
            ]
        );
    }

    #[test]
    fn test_message_without_payload() {
        let msg: GmailMessage = serde_json::from_str(r#"{"id": "bare"}"#).unwrap();
        let summary = summarize_message(msg);
        assert!(summary.is_loaded);
        assert_eq!(summary.subject, None);
        assert_eq!(summary.labels, None);
    }

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(
            decode_html_entities("&quot;a&quot; &amp;amp; &#39;b&#39;"),
            "\"a\" &amp; 'b'"
        );
    }
}
