//! Prompt assembly for the model call.

use crate::conversation::{Role, Turn};

/// Stand-in body for empty or whitespace-only messages, so the model
/// call never goes out empty.
const EMPTY_BODY_PLACEHOLDER: &str = "(The sender's email had no text content.)";

/// Build the prompt for a fresh conversation.
pub fn fresh_prompt(body: &str) -> String {
    format!(
        "Write a professional and polite reply to this email:\n\n{}",
        body_or_placeholder(body)
    )
}

/// Build the prompt for a continuation, with prior turns rendered as a
/// transcript before the new message.
pub fn continuation_prompt(body: &str, history: &[Turn]) -> String {
    if history.is_empty() {
        return fresh_prompt(body);
    }

    let mut out = String::from(
        "You are replying to an ongoing email conversation. \
         Here is the exchange so far:\n\n",
    );
    for turn in history {
        let label = match turn.role {
            Role::User => "Sender",
            Role::Assistant => "Assistant",
        };
        out.push_str(label);
        out.push_str(": ");
        out.push_str(turn.text.trim());
        out.push_str("\n\n");
    }
    out.push_str("The sender's new message:\n\n");
    out.push_str(&body_or_placeholder(body));
    out.push_str(
        "\n\nWrite a professional and polite reply that answers the new \
         message in the context of the conversation.",
    );
    out
}

fn body_or_placeholder(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        EMPTY_BODY_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}
