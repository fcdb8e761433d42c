//! Error types for Mailmind.

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// IMAP/SMTP-related errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("IMAP connection to {host}:{port} failed: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("IMAP login failed for {user}: {reason}")]
    Auth { user: String, reason: String },

    #[error("IMAP {command} failed in {folder}: {reason}")]
    Imap {
        command: String,
        folder: String,
        reason: String,
    },

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build outgoing message: {0}")]
    Build(String),

    #[error("SMTP send to {to} failed: {reason}")]
    Send { to: String, reason: String },

    #[error("Blocking mail task failed: {0}")]
    Task(String),
}

/// Model endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Request to {model} failed: {reason}")]
    RequestFailed { model: String, reason: String },

    #[error("Model {model} returned HTTP {status}: {body}")]
    Http {
        model: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {model}: {reason}")]
    InvalidResponse { model: String, reason: String },

    #[error("All API keys exhausted for {model}")]
    KeysExhausted { model: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the assistant.
pub type Result<T> = std::result::Result<T, Error>;
