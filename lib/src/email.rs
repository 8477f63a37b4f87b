//! Email records shared by the generation and dispatch services.
use serde::{Deserialize, Serialize};

use crate::storage::StagedBatch;
use crate::Error;

/// Subject used when the completion is not a structured email
pub const DEFAULT_SUBJECT: &str = "AI Generated Email";

/// A drafted email as returned to the client for editing
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneratedEmail {
    pub subject: String,
    pub body: String,
}

/// Everything needed to send one email. Owns the staged attachments, so a
/// request can only ever be dispatched once.
#[derive(Debug)]
pub struct DispatchRequest {
    /// Comma-separated recipient addresses
    pub recipients: String,
    pub subject: String,
    pub body: String,
    pub attachments: StagedBatch,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DispatchResult {
    pub message_id: String,
    pub attachments_count: usize,
}

/// Split a comma-separated recipient list into trimmed addresses.
///
/// Address syntax is not checked here; the transport rejects mailboxes it
/// cannot parse.
pub fn parse_recipients(recipients: &str) -> Result<Vec<String>, Error> {
    let list: Vec<String> = recipients
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect();

    if list.is_empty() {
        return Err(Error::Validation("At least one recipient is required".to_string()));
    }

    Ok(list)
}

/// Render a plain-text body for an HTML part.
///
/// Only newlines are converted; markup in `body` is passed through as-is.
pub fn render_html(body: &str) -> String {
    body.replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipients_are_trimmed() {
        let list = parse_recipients("a@x.com, b@y.com").unwrap();
        assert_eq!(list, vec!["a@x.com", "b@y.com"]);
    }

    #[test]
    fn empty_recipient_entries_are_dropped() {
        let list = parse_recipients(" a@x.com ,, ,b@y.com,").unwrap();
        assert_eq!(list, vec!["a@x.com", "b@y.com"]);
    }

    #[test]
    fn blank_recipients_rejected() {
        assert!(matches!(parse_recipients(" , ,"), Err(Error::Validation(_))));
        assert!(matches!(parse_recipients(""), Err(Error::Validation(_))));
    }

    #[test]
    fn recipient_syntax_not_checked() {
        let list = parse_recipients("not-an-address").unwrap();
        assert_eq!(list, vec!["not-an-address"]);
    }

    #[test]
    fn newlines_become_breaks() {
        assert_eq!(render_html("Hi,\n\nThanks\nBob"), "Hi,<br><br>Thanks<br>Bob");
    }

    // Known gap: the body is not HTML-escaped before sending.
    #[test]
    fn html_in_body_is_not_escaped() {
        let body = "<script>alert(1)</script>\n<b>bold</b>";
        assert_eq!(render_html(body), "<script>alert(1)</script><br><b>bold</b>");
    }
}
