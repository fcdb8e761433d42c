//! Configuration — environment variables with interactive prompts as
//! fallback for the three credentials (mailbox address, app password,
//! model API key).

use std::io::{BufRead, Write};

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

/// Assistant configuration, built from `MAILMIND_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub mail: MailConfig,
    pub model: ModelConfig,
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,
    /// Mail folders scanned for unread messages, in order.
    pub folders: Vec<String>,
    /// Maximum turns (user + assistant) retained per sender.
    pub history_cap: usize,
    /// Sender allowlist. Empty means allow all.
    pub allowed_senders: Vec<String>,
}

/// IMAP/SMTP settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub imap_host: String,
    pub imap_port: u16,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Mailbox address, also used as IMAP/SMTP username and From.
    pub address: String,
    /// App password for both IMAP and SMTP.
    pub password: SecretString,
}

/// Model endpoint settings.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// One or more API keys; rotated when a key is rejected or throttled.
    pub api_keys: Vec<SecretString>,
    pub model: String,
}

impl Config {
    /// Load configuration from the environment, prompting on stdin for
    /// any missing credential.
    pub fn load() -> Result<Self, ConfigError> {
        let stdin = std::io::stdin();
        let mut lines = stdin.lock();
        Self::load_from(|key: &str| std::env::var(key), &mut lines)
    }

    /// Load with injectable env lookup and prompt reader (for tests).
    pub fn load_from<E>(env: E, prompt_input: &mut dyn BufRead) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let address = match env("MAILMIND_ADDRESS") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => prompt(prompt_input, "Enter your mailbox address: ")?,
        };

        let password = match env("MAILMIND_APP_PASSWORD") {
            Ok(v) if !v.is_empty() => v,
            _ => prompt(prompt_input, "Enter your mailbox app password: ")?,
        };

        let api_keys_raw = match env("MAILMIND_API_KEYS") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => prompt(prompt_input, "Enter your Gemini API key: ")?,
        };
        let api_keys: Vec<SecretString> = api_keys_raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SecretString::from)
            .collect();
        if api_keys.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "MAILMIND_API_KEYS".into(),
                hint: "Provide at least one Gemini API key.".into(),
            });
        }

        let imap_host = env("MAILMIND_IMAP_HOST").unwrap_or_else(|_| "imap.gmail.com".into());
        let imap_port = parse_var(&env, "MAILMIND_IMAP_PORT", 993_u16)?;
        let smtp_host = env("MAILMIND_SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".into());
        let smtp_port = parse_var(&env, "MAILMIND_SMTP_PORT", 587_u16)?;

        let model =
            env("MAILMIND_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into());

        let poll_interval_secs = parse_var(&env, "MAILMIND_POLL_INTERVAL_SECS", 60_u64)?;
        let history_cap = parse_var(&env, "MAILMIND_HISTORY_CAP", 10_usize)?;

        let folders: Vec<String> = env("MAILMIND_FOLDERS")
            .unwrap_or_else(|_| "INBOX".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let folders = if folders.is_empty() {
            vec!["INBOX".to_string()]
        } else {
            folders
        };

        let allowed_senders: Vec<String> = env("MAILMIND_ALLOWED_SENDERS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            mail: MailConfig {
                imap_host,
                imap_port,
                smtp_host,
                smtp_port,
                address,
                password: SecretString::from(password),
            },
            model: ModelConfig { api_keys, model },
            poll_interval_secs,
            folders,
            history_cap,
            allowed_senders,
        })
    }
}

impl MailConfig {
    /// Expose the app password for the mail transports.
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Check if a sender address is in the allowlist.
///
/// - Empty list → allow all (the assistant replies to arbitrary senders)
/// - `*` in list → allow all
/// - `@domain.com` or `domain.com` → domain match
/// - `user@domain.com` → exact address match
pub fn is_sender_allowed(allowed: &[String], address: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }
    if allowed.iter().any(|a| a == "*") {
        return true;
    }
    let address_lower = address.to_lowercase();
    allowed.iter().any(|a| {
        if a.starts_with('@') {
            address_lower.ends_with(&a.to_lowercase())
        } else if a.contains('@') {
            a.eq_ignore_ascii_case(address)
        } else {
            address_lower.ends_with(&format!("@{}", a.to_lowercase()))
        }
    })
}

fn prompt(input: &mut dyn BufRead, label: &str) -> Result<String, ConfigError> {
    let mut out = std::io::stdout();
    out.write_all(label.as_bytes())?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::MissingRequired {
            key: label.trim_end_matches(": ").to_string(),
            hint: "A value is required.".into(),
        });
    }
    Ok(value)
}

fn parse_var<E, T>(env: &E, key: &str, default: T) -> Result<T, ConfigError>
where
    E: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, std::env::VarError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned().ok_or(std::env::VarError::NotPresent)
    }

    #[test]
    fn loads_defaults_with_credentials_in_env() {
        let env = env_of(&[
            ("MAILMIND_ADDRESS", "me@gmail.com"),
            ("MAILMIND_APP_PASSWORD", "hunter2"),
            ("MAILMIND_API_KEYS", "key-1"),
        ]);
        let mut input = Cursor::new(Vec::new());
        let config = Config::load_from(env, &mut input).unwrap();

        assert_eq!(config.mail.imap_host, "imap.gmail.com");
        assert_eq!(config.mail.imap_port, 993);
        assert_eq!(config.mail.smtp_host, "smtp.gmail.com");
        assert_eq!(config.mail.smtp_port, 587);
        assert_eq!(config.model.model, "gemini-1.5-flash");
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.folders, vec!["INBOX"]);
        assert_eq!(config.history_cap, 10);
        assert!(config.allowed_senders.is_empty());
    }

    #[test]
    fn prompts_for_missing_credentials() {
        let env = env_of(&[]);
        let mut input = Cursor::new(b"me@gmail.com\nhunter2\nkey-1\n".to_vec());
        let config = Config::load_from(env, &mut input).unwrap();

        assert_eq!(config.mail.address, "me@gmail.com");
        assert_eq!(config.model.api_keys.len(), 1);
    }

    #[test]
    fn splits_multiple_api_keys() {
        let env = env_of(&[
            ("MAILMIND_ADDRESS", "me@gmail.com"),
            ("MAILMIND_APP_PASSWORD", "hunter2"),
            ("MAILMIND_API_KEYS", "key-1, key-2,key-3"),
        ]);
        let mut input = Cursor::new(Vec::new());
        let config = Config::load_from(env, &mut input).unwrap();
        assert_eq!(config.model.api_keys.len(), 3);
    }

    #[test]
    fn splits_folders() {
        let env = env_of(&[
            ("MAILMIND_ADDRESS", "me@gmail.com"),
            ("MAILMIND_APP_PASSWORD", "hunter2"),
            ("MAILMIND_API_KEYS", "key-1"),
            ("MAILMIND_FOLDERS", "INBOX, Support , "),
        ]);
        let mut input = Cursor::new(Vec::new());
        let config = Config::load_from(env, &mut input).unwrap();
        assert_eq!(config.folders, vec!["INBOX", "Support"]);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let env = env_of(&[
            ("MAILMIND_ADDRESS", "me@gmail.com"),
            ("MAILMIND_APP_PASSWORD", "hunter2"),
            ("MAILMIND_API_KEYS", "key-1"),
            ("MAILMIND_IMAP_PORT", "not-a-port"),
        ]);
        let mut input = Cursor::new(Vec::new());
        assert!(Config::load_from(env, &mut input).is_err());
    }

    #[test]
    fn empty_prompt_response_is_an_error() {
        let env = env_of(&[]);
        let mut input = Cursor::new(b"\n".to_vec());
        assert!(Config::load_from(env, &mut input).is_err());
    }

    // ── Sender allowlist tests ──────────────────────────────────────

    #[test]
    fn allowlist_empty_allows_all() {
        assert!(is_sender_allowed(&[], "anyone@example.com"));
    }

    #[test]
    fn allowlist_wildcard_allows_all() {
        let allowed = vec!["*".to_string()];
        assert!(is_sender_allowed(&allowed, "anyone@example.com"));
    }

    #[test]
    fn allowlist_exact_address_match() {
        let allowed = vec!["alice@example.com".to_string()];
        assert!(is_sender_allowed(&allowed, "alice@example.com"));
        assert!(is_sender_allowed(&allowed, "Alice@Example.com"));
        assert!(!is_sender_allowed(&allowed, "bob@example.com"));
    }

    #[test]
    fn allowlist_domain_match() {
        let allowed = vec!["@example.com".to_string(), "partner.io".to_string()];
        assert!(is_sender_allowed(&allowed, "alice@example.com"));
        assert!(is_sender_allowed(&allowed, "ceo@partner.io"));
        assert!(!is_sender_allowed(&allowed, "alice@other.com"));
    }
}
