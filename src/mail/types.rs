//! Inbound email representation and body helpers.

use chrono::{DateTime, Utc};
use mail_parser::Message;

/// One unread message pulled from the mailbox, consumed within a single
/// poll iteration.
#[derive(Debug, Clone)]
pub struct InboundEmail {
    /// Folder the message was found in.
    pub folder: String,
    /// IMAP UID within that folder.
    pub uid: u32,
    /// Message-ID header, or a generated stand-in.
    pub message_id: String,
    /// Display name of the sender, falling back to the address.
    pub sender_name: String,
    /// Sender address.
    pub sender_addr: String,
    pub subject: String,
    /// Plain-text body; HTML stripped as a fallback.
    pub body: String,
    /// Whether the message carries any attachment.
    pub has_attachment: bool,
    pub received_at: DateTime<Utc>,
}

impl InboundEmail {
    /// Build from a parsed message. Returns `None` when no sender
    /// address can be determined (there is nowhere to reply to).
    pub fn from_parsed(folder: &str, uid: u32, parsed: &Message<'_>) -> Option<Self> {
        let from = parsed.from().and_then(|a| a.first());
        let sender_addr = from.and_then(|a| a.address.as_ref())?.to_string();
        let sender_name = from
            .and_then(|a| a.name.as_ref())
            .map(|n| n.to_string())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| sender_addr.clone());

        let subject = parsed
            .subject()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Your message")
            .to_string();

        let message_id = parsed
            .message_id()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{folder}/{uid}"));

        let received_at = parsed
            .date()
            .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
            .unwrap_or_else(Utc::now);

        Some(Self {
            folder: folder.to_string(),
            uid,
            message_id,
            sender_name,
            sender_addr,
            subject,
            body: extract_text(parsed),
            has_attachment: parsed.attachment_count() > 0,
            received_at,
        })
    }
}

/// Extract readable text from a parsed email: text/plain preferred,
/// stripped HTML as fallback.
pub fn extract_text(parsed: &Message<'_>) -> String {
    if let Some(text) = parsed.body_text(0) {
        return text.to_string();
    }
    if let Some(html) = parsed.body_html(0) {
        return strip_html(html.as_ref());
    }
    String::new()
}

/// Strip HTML tags from content (basic).
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip quoted text from an email body.
///
/// Removes lines starting with `>`, and everything from an
/// "On ... wrote:" attribution or "Original Message" separator onward.
/// Used when buffering and prompting; the classifier sees the raw body
/// because it needs the markers.
pub fn strip_quoted_text(body: &str) -> String {
    let mut result = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('>') {
            continue;
        }
        if trimmed.starts_with("On ") && trimmed.ends_with("wrote:") {
            break;
        }
        if trimmed.starts_with("---") && trimmed.contains("Original Message") {
            break;
        }

        result.push(line);
    }

    while result.last().is_some_and(|l| l.trim().is_empty()) {
        result.pop();
    }

    result.join("\n")
}
