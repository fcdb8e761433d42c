//! Mailbox access: IMAP polling for inbound, SMTP via lettre for outbound.

pub mod inbox;
pub mod outbound;
pub mod types;

pub use inbox::Mailbox;
pub use outbound::{reply_subject, MailSender, ReplySender};
pub use types::InboundEmail;
