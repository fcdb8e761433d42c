//! Reply rendering — HTML template plus plain-text alternative.

/// Canned reply when the model call fails. Not retried.
pub const FALLBACK_REPLY: &str = "Apologies, I'm currently unable to respond properly.";

/// Canned reply for attachment-bearing messages, which never reach the
/// model call.
pub const ATTACHMENT_REPLY: &str = "Thank you for your email. I currently can't process \
attachments, so please resend any important content as plain text and I'll be happy to help.";

const SIGNATURE: &str = "Mailmind";

/// Plain-text rendering of a reply.
pub fn render_text(sender_name: &str, reply: &str) -> String {
    format!(
        "Dear {sender_name},\n\n{}\n\nBest regards,\n{SIGNATURE}\n",
        reply.trim()
    )
}

/// HTML rendering of the same reply: greeting, escaped paragraphs,
/// signature block.
pub fn render_html(sender_name: &str, reply: &str) -> String {
    let mut paragraphs = String::new();
    for block in reply.trim().split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        paragraphs.push_str("    <p>");
        paragraphs.push_str(&escape_html(block).replace('\n', "<br>"));
        paragraphs.push_str("</p>\n");
    }

    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html>\n",
            "<body style=\"font-family: sans-serif; color: #222;\">\n",
            "    <p>Dear {greeting},</p>\n",
            "{paragraphs}",
            "    <p>Best regards,<br><strong>{signature}</strong></p>\n",
            "</body>\n",
            "</html>\n",
        ),
        greeting = escape_html(sender_name),
        paragraphs = paragraphs,
        signature = SIGNATURE,
    )
}

/// Minimal HTML escaping for text interpolated into the template.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
