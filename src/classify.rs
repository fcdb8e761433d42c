//! Reply-vs-new-conversation classifier.
//!
//! Best-effort heuristics over the subject line and plain-text body.
//! Any one signal present classifies the message as a continuation of an
//! existing exchange; there is no correctness guarantee.

use std::sync::OnceLock;

use regex::Regex;

use crate::conversation::ConversationStore;

/// Word budget under which a message counts as "short" for the
/// continuation-opener signal.
const SHORT_BODY_WORDS: usize = 12;

/// Openers that suggest the sender is answering a previous reply.
const CONTINUATION_OPENERS: &[&str] = &[
    "yes", "no", "ok", "okay", "thanks", "thank you", "sure", "also", "and", "but",
    "what about", "why", "how about",
];

/// Phrases that reference an earlier exchange.
const PRIOR_EXCHANGE_PHRASES: &[&str] = &[
    "you said",
    "you mentioned",
    "you told me",
    "your last email",
    "your previous email",
    "previously",
    "earlier you",
    "as you suggested",
];

/// The signature line the assistant puts on every outgoing reply. A
/// body line matching it means our own reply was quoted back.
const ASSISTANT_SIGNATURE: &str = "mailmind";

/// Classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Heuristically judged to be part of an existing thread.
    pub continuation: bool,
    /// Best-effort count of prior exchanges with this sender.
    pub exchanges: usize,
}

/// Classify an incoming message against the sender's buffered history.
pub fn classify(
    subject: &str,
    body: &str,
    sender: &str,
    store: &ConversationStore,
) -> Classification {
    let continuation = has_reply_subject(subject)
        || has_quote_markers(body)
        || quotes_assistant_reply(body)
        || is_short_continuation(body)
        || references_prior_exchange(body);

    Classification {
        continuation,
        exchanges: store.exchanges(sender),
    }
}

/// Subject starts with a reply marker. `Fwd:` is not a reply marker.
/// Boundary-safe against non-ASCII subjects.
pub fn has_reply_subject(subject: &str) -> bool {
    subject
        .trim()
        .get(..3)
        .is_some_and(|p| p.eq_ignore_ascii_case("re:"))
}

/// Body contains quoted-text markers: `>` lines, "On ... wrote:"
/// attributions, or an "Original Message" separator.
pub fn has_quote_markers(body: &str) -> bool {
    static ON_WROTE: OnceLock<Regex> = OnceLock::new();
    let on_wrote = ON_WROTE.get_or_init(|| Regex::new(r"(?m)^\s*On .+ wrote:\s*$").unwrap());

    body.lines().any(|line| line.trim_start().starts_with('>'))
        || on_wrote.is_match(body)
        || body.contains("Original Message")
}

/// Body quotes the assistant's own signature back. Only a line that is
/// the signature by itself counts (quote prefixes stripped); a passing
/// mention of the name in prose does not.
pub fn quotes_assistant_reply(body: &str) -> bool {
    body.lines().any(|line| {
        line.trim_start_matches(|c: char| c == '>' || c.is_whitespace())
            .trim_end()
            .eq_ignore_ascii_case(ASSISTANT_SIGNATURE)
    })
}

/// Body is short and opens with a continuation word.
pub fn is_short_continuation(body: &str) -> bool {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.split_whitespace().count() > SHORT_BODY_WORDS {
        return false;
    }
    let lower = trimmed.to_lowercase();
    CONTINUATION_OPENERS.iter().any(|opener| {
        lower.starts_with(opener)
            && lower[opener.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Body references something previously said.
pub fn references_prior_exchange(body: &str) -> bool {
    let lower = body.to_lowercase();
    PRIOR_EXCHANGE_PHRASES.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    fn empty_store() -> ConversationStore {
        ConversationStore::new(10)
    }

    // ── Subject marker ──────────────────────────────────────────────

    #[test]
    fn reply_subject_is_continuation() {
        let c = classify("Re: Project update", "Sounds good.", "a@example.com", &empty_store());
        assert!(c.continuation);
    }

    #[test]
    fn reply_subject_case_insensitive() {
        assert!(has_reply_subject("RE: hello"));
        assert!(has_reply_subject("re: hello"));
        assert!(has_reply_subject("  Re: hello"));
    }

    #[test]
    fn forward_marker_is_not_a_reply() {
        assert!(!has_reply_subject("Fwd: hello"));
        assert!(!has_reply_subject("Regarding the invoice"));
    }

    #[test]
    fn non_ascii_subject_does_not_panic() {
        // Multi-byte chars put no boundary at byte 3.
        assert!(!has_reply_subject("Привет"));
        assert!(!has_reply_subject("héllo"));
        assert!(!has_reply_subject("日本語の件名"));
        assert!(has_reply_subject("Re: Привет"));
    }

    // ── Quoted text ─────────────────────────────────────────────────

    #[test]
    fn quoted_lines_detected() {
        let body = "Got it.\n\n> earlier message\n> more of it";
        assert!(has_quote_markers(body));
    }

    #[test]
    fn on_wrote_attribution_detected() {
        let body = "Sure.\n\nOn Mon, Jan 5, 2026 at 9:00 AM Alice <a@ex.com> wrote:\nHi";
        assert!(has_quote_markers(body));
    }

    #[test]
    fn original_message_separator_detected() {
        assert!(has_quote_markers("Reply\n\n--- Original Message ---\nold"));
    }

    #[test]
    fn plain_body_has_no_quote_markers() {
        assert!(!has_quote_markers("Hello, I have a question about pricing."));
    }

    #[test]
    fn assistant_signature_detected() {
        assert!(quotes_assistant_reply("Thanks!\n\nBest regards,\nMailmind"));
        assert!(quotes_assistant_reply("Got it.\n\n> Best regards,\n> Mailmind"));
    }

    #[test]
    fn mere_mention_of_the_name_is_not_a_quoted_reply() {
        assert!(!quotes_assistant_reply(
            "A colleague recommended the Mailmind product to our team."
        ));
        assert!(!quotes_assistant_reply("Is mailmind support included?"));
    }

    // ── Short continuation openers ──────────────────────────────────

    #[test]
    fn short_yes_is_continuation() {
        assert!(is_short_continuation("Yes, please."));
        assert!(is_short_continuation("ok"));
        assert!(is_short_continuation("What about Tuesday?"));
    }

    #[test]
    fn long_body_is_not_short_continuation() {
        let body = "Yes I wanted to ask about the following twelve separate topics \
                    which I will now enumerate in considerable detail for you";
        assert!(!is_short_continuation(body));
    }

    #[test]
    fn opener_must_be_a_whole_word() {
        // "android" starts with "and" but is not the opener "and".
        assert!(!is_short_continuation("android question"));
    }

    #[test]
    fn unrelated_short_body_is_not_continuation() {
        assert!(!is_short_continuation("Invoice attached"));
    }

    // ── Prior-exchange phrases ──────────────────────────────────────

    #[test]
    fn prior_exchange_phrase_detected() {
        assert!(references_prior_exchange(
            "In your last email you mentioned a discount."
        ));
        assert!(references_prior_exchange("As you suggested, I tried again."));
    }

    // ── Whole-classifier behavior ───────────────────────────────────

    #[test]
    fn fresh_message_is_not_continuation() {
        let c = classify(
            "Pricing question",
            "Hello, how much does the premium plan cost?",
            "a@example.com",
            &empty_store(),
        );
        assert!(!c.continuation);
        assert_eq!(c.exchanges, 0);
    }

    #[test]
    fn history_alone_does_not_force_continuation() {
        // A known sender opening a new thread still gets a fresh
        // conversation; the buffer is reset by the caller.
        let mut store = ConversationStore::new(10);
        store.record("a@example.com", Role::User, "first question");
        store.record("a@example.com", Role::Assistant, "first answer");

        let c = classify(
            "Something new",
            "A completely different topic, written at length so the short-body \
             opener heuristic cannot fire on this sentence.",
            "a@example.com",
            &store,
        );
        assert!(!c.continuation);
        assert_eq!(c.exchanges, 1);
    }

    #[test]
    fn exchanges_reported_for_fresh_classification_too() {
        let mut store = ConversationStore::new(10);
        store.record("a@example.com", Role::User, "q1");
        store.record("a@example.com", Role::User, "q2");

        let c = classify("Re: hi", "ok", "a@example.com", &store);
        assert!(c.continuation);
        assert_eq!(c.exchanges, 2);
    }
}
