//! Mailmind — an email auto-reply assistant.
//!
//! Polls a mailbox for unread messages, forwards their plain text to a
//! generative model, and emails the reply back to the sender, keeping a
//! bounded per-sender conversation history.

pub mod assistant;
pub mod classify;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod mail;
pub mod prompt;
pub mod render;
