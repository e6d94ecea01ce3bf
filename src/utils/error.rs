use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Title already exists: {title}")]
    AlreadyExists { title: String },

    #[error("Title not found: {title}")]
    NotFound { title: String },

    #[error("Score {score} is outside the range [0, 10]")]
    InvalidRange { score: f64 },

    #[error("Storage failure on {document}: {source}")]
    PersistenceFailure {
        document: String,
        #[source]
        source: PersistenceCause,
    },

    #[error("Command '{command}' requires administrator permission")]
    PermissionDenied { command: String },

    #[error("Invalid command invocation: {message}")]
    InvalidCommand { message: String },

    #[error("Not a platform user id: '{user_id}'")]
    InvalidUserId { user_id: String },

    #[error("User name resolution failed: {0}")]
    ResolveFailure(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

/// Underlying cause of a failed document write or read.
#[derive(Error, Debug)]
pub enum PersistenceCause {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller asked for something the ledger state does not allow.
    Domain,
    /// Malformed or unauthorized command.
    Request,
    Storage,
    Network,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LedgerError {
    pub fn persistence(document: impl Into<String>, source: impl Into<PersistenceCause>) -> Self {
        Self::PersistenceFailure {
            document: document.into(),
            source: source.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AlreadyExists { .. }
            | Self::NotFound { .. }
            | Self::InvalidRange { .. } => ErrorCategory::Domain,
            Self::PermissionDenied { .. }
            | Self::InvalidCommand { .. }
            | Self::InvalidUserId { .. } => ErrorCategory::Request,
            Self::PersistenceFailure { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::Storage
            }
            Self::ResolveFailure(_) => ErrorCategory::Network,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Domain | ErrorCategory::Request => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Short message suitable for showing to the user who issued the command.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::AlreadyExists { title } => format!("⚠️ Title **{}** already exists.", title),
            Self::NotFound { title } => format!("❌ Title **{}** not found.", title),
            Self::InvalidRange { .. } => "❌ Score must be between 0 and 10.".to_string(),
            Self::PermissionDenied { command } => match command.as_str() {
                "addtitle" => "❌ You must be an admin to add titles.".to_string(),
                "deletetitle" => "❌ You must be an admin to delete titles.".to_string(),
                _ => "❌ You must be an admin to use this command.".to_string(),
            },
            Self::InvalidCommand { message } => format!("❌ Invalid command: {}", message),
            Self::InvalidUserId { .. } => "❌ Unknown user.".to_string(),
            Self::PersistenceFailure { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                "❌ Could not save your change, please try again later.".to_string()
            }
            Self::ResolveFailure(_) => "❌ Could not reach the chat platform.".to_string(),
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => format!("Configuration problem: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Domain => "Check the title name with /listtitles and try again",
            ErrorCategory::Request => "Check the command arguments and your permissions",
            ErrorCategory::Storage => "Check that the data directory exists and is writable",
            ErrorCategory::Network => "Check the bot token and network connectivity",
            ErrorCategory::Configuration => "Fix the configuration file or environment variables",
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
