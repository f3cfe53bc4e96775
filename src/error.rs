use thiserror::Error;

/// Fallback banner when a failed order carries no readable reason.
pub const ORDER_FAILED_FALLBACK: &str = "Failed to place order. Please try again.";

#[derive(Debug, Error)]
pub enum PosError {
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication required: {0}")]
    Auth(String),

    #[error("{0}")]
    ServerValidation(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Unknown(String),

    #[error("Not logged in. Run `chefchain login` first.")]
    NotLoggedIn,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PosError {
    /// Text for the dismissable banner shown to the operator.
    ///
    /// Server-provided messages are shown verbatim; transport failures get
    /// a short generic line.
    pub fn user_message(&self) -> String {
        match self {
            PosError::Validation(msg)
            | PosError::ServerValidation(msg)
            | PosError::Unknown(msg) => msg.clone(),
            PosError::Http { message, .. } if !message.is_empty() => message.clone(),
            PosError::Http { status, .. } => format!("HTTP error! status: {}", status),
            PosError::Auth(_) => "Authentication required".to_string(),
            PosError::Network(_) => "Network error. Please check your connection.".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error must force the session to log out.
    pub fn is_auth(&self) -> bool {
        matches!(self, PosError::Auth(_) | PosError::NotLoggedIn)
    }

    /// Turn a recoverable error into banner text, handing back the ones an
    /// interactive view cannot continue from: auth failures and a lost
    /// terminal.
    pub fn into_banner(self) -> Result<String> {
        if self.is_auth() || matches!(self, PosError::Prompt(_)) {
            return Err(self);
        }
        Ok(self.user_message())
    }
}

pub type Result<T> = std::result::Result<T, PosError>;
