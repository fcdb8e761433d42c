//! The assistant loop: fetch → classify → build prompt → call model →
//! render → send → mark read → sleep.
//!
//! Strictly sequential. One IMAP session and one HTTP client are reused
//! for the life of the process; blocking mail calls run under
//! `spawn_blocking`, with the session moved in and out of the closure.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::classify::classify;
use crate::config::{is_sender_allowed, Config};
use crate::conversation::{ConversationStore, Role};
use crate::error::{MailError, Result};
use crate::llm::LlmProvider;
use crate::mail::types::strip_quoted_text;
use crate::mail::{reply_subject, InboundEmail, MailSender, Mailbox, ReplySender};
use crate::prompt::{continuation_prompt, fresh_prompt};
use crate::render::{render_html, render_text, ATTACHMENT_REPLY, FALLBACK_REPLY};

/// What to do with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Mark seen without replying.
    Skip(SkipReason),
    /// Reply with the canned attachment notice; no model call.
    CannedAttachment,
    /// Run the classifier and the model.
    GenerateReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SelfSent,
    Blocked,
}

/// Decide how to handle an inbound message. Attachment-bearing messages
/// never reach the model call.
pub fn plan_action(mail: &InboundEmail, own_address: &str, allowed: &[String]) -> Action {
    if mail.sender_addr.eq_ignore_ascii_case(own_address) {
        return Action::Skip(SkipReason::SelfSent);
    }
    if !is_sender_allowed(allowed, &mail.sender_addr) {
        return Action::Skip(SkipReason::Blocked);
    }
    if mail.has_attachment {
        return Action::CannedAttachment;
    }
    Action::GenerateReply
}

/// The polling assistant.
pub struct Assistant {
    config: Config,
    llm: Arc<dyn LlmProvider>,
    sender: Arc<dyn ReplySender>,
    store: ConversationStore,
    mailbox: Option<Mailbox>,
}

impl Assistant {
    pub fn new(config: Config, llm: Arc<dyn LlmProvider>) -> Result<Self> {
        let sender = Arc::new(MailSender::new(&config.mail)?);
        Ok(Self::with_sender(config, llm, sender))
    }

    /// Assemble with an explicit reply sender (tests swap in a mock).
    pub fn with_sender(
        config: Config,
        llm: Arc<dyn LlmProvider>,
        sender: Arc<dyn ReplySender>,
    ) -> Self {
        let store = ConversationStore::new(config.history_cap);
        Self {
            config,
            llm,
            sender,
            store,
            mailbox: None,
        }
    }

    /// Run until interrupted. The initial login failure is fatal and
    /// propagates; later connection trouble is logged and retried on the
    /// next tick.
    pub async fn run(&mut self) -> Result<()> {
        self.ensure_mailbox().await?;
        info!(
            host = %self.config.mail.imap_host,
            interval = self.config.poll_interval_secs,
            folders = ?self.config.folders,
            model = self.llm.model_name(),
            "Mailmind polling started"
        );

        let mut tick = tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received, logging out");
                    if let Some(mailbox) = self.mailbox.take() {
                        let _ = tokio::task::spawn_blocking(move || mailbox.logout()).await;
                    }
                    return Ok(());
                }
                _ = tick.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }

    /// One poll cycle: fetch unread mail and process each message in
    /// order.
    async fn poll_once(&mut self) {
        let folders = self.config.folders.clone();
        let messages = match self.with_mailbox(move |mb| mb.fetch_unseen(&folders)).await {
            Ok(messages) => messages,
            Err(e) => {
                error!(error = %e, "Poll failed; will reconnect on next cycle");
                return;
            }
        };

        if messages.is_empty() {
            debug!("No unread messages");
            return;
        }

        info!(count = messages.len(), "Detected unread message(s)");

        for mail in messages {
            self.process_one(mail).await;
        }
    }

    async fn process_one(&mut self, mail: InboundEmail) {
        let action = plan_action(
            &mail,
            &self.config.mail.address,
            &self.config.allowed_senders,
        );

        match action {
            Action::Skip(reason) => {
                debug!(sender = %mail.sender_addr, ?reason, "Skipping message");
                self.mark_seen_quiet(&mail).await;
            }
            Action::CannedAttachment => {
                info!(
                    sender = %mail.sender_addr,
                    subject = %mail.subject,
                    "Message carries an attachment; sending canned notice"
                );
                self.deliver(&mail, ATTACHMENT_REPLY, false).await;
            }
            Action::GenerateReply => {
                let reply = self.generate_reply(&mail).await;
                self.deliver(&mail, &reply, true).await;
            }
        }
    }

    /// Classify, update the buffer, build the prompt, and call the
    /// model. A model failure falls back to the canned apology.
    async fn generate_reply(&mut self, mail: &InboundEmail) -> String {
        let classification = classify(&mail.subject, &mail.body, &mail.sender_addr, &self.store);
        if !classification.continuation {
            self.store.reset(&mail.sender_addr);
        }

        let clean_body = strip_quoted_text(&mail.body);
        let prompt = if classification.continuation {
            continuation_prompt(&clean_body, self.store.history(&mail.sender_addr))
        } else {
            fresh_prompt(&clean_body)
        };

        info!(
            sender = %mail.sender_addr,
            subject = %mail.subject,
            continuation = classification.continuation,
            exchanges = classification.exchanges,
            "Generating reply"
        );

        match self.llm.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Model call failed; using canned apology");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Render and send the reply. Only a successful send marks the
    /// message seen and records the turns; a failed send leaves the
    /// message unread for the next poll.
    async fn deliver(&mut self, mail: &InboundEmail, reply: &str, record: bool) {
        let subject = reply_subject(&mail.subject);
        let text = render_text(&mail.sender_name, reply);
        let html = render_html(&mail.sender_name, reply);

        match self
            .sender
            .send_reply(&mail.sender_addr, &subject, &text, &html)
        {
            Ok(()) => {
                if record {
                    let user_text = strip_quoted_text(&mail.body);
                    self.store.record(&mail.sender_addr, Role::User, user_text);
                    self.store.record(&mail.sender_addr, Role::Assistant, reply);
                }
                self.mark_seen_quiet(mail).await;
            }
            Err(e) => {
                error!(
                    sender = %mail.sender_addr,
                    error = %e,
                    "Send failed; leaving message unread for next poll"
                );
            }
        }
    }

    async fn mark_seen_quiet(&mut self, mail: &InboundEmail) {
        let folder = mail.folder.clone();
        let uid = mail.uid;
        if let Err(e) = self.with_mailbox(move |mb| mb.mark_seen(&folder, uid)).await {
            warn!(
                folder = %mail.folder,
                uid = mail.uid,
                error = %e,
                "Failed to mark message seen"
            );
        }
    }

    async fn ensure_mailbox(&mut self) -> Result<()> {
        if self.mailbox.is_none() {
            let config = self.config.mail.clone();
            let mailbox = tokio::task::spawn_blocking(move || Mailbox::connect(&config))
                .await
                .map_err(|e| MailError::Task(e.to_string()))??;
            info!(host = mailbox.host(), "Connected to mailbox");
            self.mailbox = Some(mailbox);
        }
        Ok(())
    }

    /// Run a blocking mail operation, reconnecting first if the session
    /// is gone. On error the session is dropped so the next operation
    /// starts from a fresh connection.
    async fn with_mailbox<T, F>(&mut self, op: F) -> std::result::Result<T, MailError>
    where
        F: FnOnce(&mut Mailbox) -> std::result::Result<T, MailError> + Send + 'static,
        T: Send + 'static,
    {
        let mailbox = match self.mailbox.take() {
            Some(mailbox) => mailbox,
            None => {
                let config = self.config.mail.clone();
                tokio::task::spawn_blocking(move || Mailbox::connect(&config))
                    .await
                    .map_err(|e| MailError::Task(e.to_string()))??
            }
        };

        let (mailbox, result) = tokio::task::spawn_blocking(move || {
            let mut mailbox = mailbox;
            let result = op(&mut mailbox);
            (mailbox, result)
        })
        .await
        .map_err(|e| MailError::Task(e.to_string()))?;

        if result.is_ok() {
            self.mailbox = Some(mailbox);
        }
        result
    }
}
