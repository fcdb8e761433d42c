//! IMAP mailbox access — unread search, fetch, flag-as-seen.
//!
//! All calls are blocking; the assistant loop runs them under
//! `tokio::task::spawn_blocking`, moving the `Mailbox` in and out of the
//! closure so one session is reused across polls.

use mail_parser::MessageParser;
use tracing::{debug, warn};

use crate::config::MailConfig;
use crate::error::MailError;
use crate::mail::types::InboundEmail;

type ImapSession = imap::Session<native_tls::TlsStream<std::net::TcpStream>>;

/// One logged-in IMAP session.
pub struct Mailbox {
    session: ImapSession,
    config: MailConfig,
}

impl Mailbox {
    /// Connect over TLS and log in. A failed login is fatal to the
    /// process; the caller exits.
    pub fn connect(config: &MailConfig) -> Result<Self, MailError> {
        let tls = native_tls::TlsConnector::builder()
            .build()
            .map_err(|e| MailError::Tls(e.to_string()))?;

        let client = imap::connect(
            (config.imap_host.as_str(), config.imap_port),
            config.imap_host.as_str(),
            &tls,
        )
        .map_err(|e| MailError::Connect {
            host: config.imap_host.clone(),
            port: config.imap_port,
            reason: e.to_string(),
        })?;

        let session = client
            .login(&config.address, config.password())
            .map_err(|(e, _)| MailError::Auth {
                user: config.address.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            session,
            config: config.clone(),
        })
    }

    /// Fetch unread messages across the configured folders.
    ///
    /// Uses `BODY.PEEK[]` so fetching does not set `\Seen`; the flag is
    /// stored explicitly after a successful reply. A folder that fails
    /// to SELECT or SEARCH is logged and skipped.
    pub fn fetch_unseen(&mut self, folders: &[String]) -> Result<Vec<InboundEmail>, MailError> {
        let mut results = Vec::new();

        for folder in folders {
            if let Err(e) = self.session.select(folder) {
                warn!(folder = %folder, error = %e, "IMAP SELECT failed, skipping folder");
                continue;
            }

            let uids = match self.session.uid_search("UNSEEN") {
                Ok(uids) => uids,
                Err(e) => {
                    warn!(folder = %folder, error = %e, "IMAP SEARCH UNSEEN failed");
                    continue;
                }
            };

            if uids.is_empty() {
                debug!(folder = %folder, "No unread messages");
                continue;
            }

            let uid_set = uids
                .iter()
                .map(|u| u.to_string())
                .collect::<Vec<_>>()
                .join(",");

            let fetches = self
                .session
                .uid_fetch(&uid_set, "(UID BODY.PEEK[])")
                .map_err(|e| MailError::Imap {
                    command: "FETCH".into(),
                    folder: folder.clone(),
                    reason: e.to_string(),
                })?;

            for fetch in fetches.iter() {
                let Some(uid) = fetch.uid else { continue };
                let Some(raw) = fetch.body() else {
                    warn!(folder = %folder, uid, "FETCH returned no body, skipping");
                    continue;
                };

                let Some(parsed) = MessageParser::default().parse(raw) else {
                    warn!(folder = %folder, uid, "Unparseable message, skipping");
                    continue;
                };

                match InboundEmail::from_parsed(folder, uid, &parsed) {
                    Some(mail) => results.push(mail),
                    None => warn!(folder = %folder, uid, "Message without sender address, skipping"),
                }
            }
        }

        Ok(results)
    }

    /// Set `\Seen` on one message so it is not picked up again.
    pub fn mark_seen(&mut self, folder: &str, uid: u32) -> Result<(), MailError> {
        self.session
            .select(folder)
            .map_err(|e| MailError::Imap {
                command: "SELECT".into(),
                folder: folder.to_string(),
                reason: e.to_string(),
            })?;
        self.session
            .uid_store(uid.to_string(), "+FLAGS (\\Seen)")
            .map_err(|e| MailError::Imap {
                command: "STORE".into(),
                folder: folder.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Log out cleanly. Errors are ignored; the session is gone either way.
    pub fn logout(mut self) {
        let _ = self.session.logout();
    }

    pub fn host(&self) -> &str {
        &self.config.imap_host
    }
}
