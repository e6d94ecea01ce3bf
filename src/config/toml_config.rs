use crate::core::ledger::LedgerFiles;
use crate::utils::error::{LedgerError, Result};
use crate::utils::validation::{
    validate_file_name, validate_non_empty_string, validate_path, validate_positive_number,
    validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const TOKEN_ENV_VAR: &str = "DISCORD_TOKEN";
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_titles_file")]
    pub titles_file: String,
    #[serde(default = "default_ratings_file")]
    pub ratings_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub token: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_data_dir() -> String {
    ".".to_string()
}

fn default_titles_file() -> String {
    LedgerFiles::default().titles
}

fn default_ratings_file() -> String {
    LedgerFiles::default().ratings
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            titles_file: default_titles_file(),
            ratings_file: default_ratings_file(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            request_timeout_seconds: default_timeout(),
        }
    }
}

impl StorageConfig {
    pub fn files(&self) -> LedgerFiles {
        LedgerFiles {
            titles: self.titles_file.clone(),
            ratings: self.ratings_file.clone(),
        }
    }
}

impl DiscordConfig {
    /// Configured token, falling back to `DISCORD_TOKEN`. Unsubstituted
    /// placeholders and blank values count as absent.
    pub fn token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty() && !t.starts_with("${"))
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl BotConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Reads `path` if it exists, otherwise starts from defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| LedgerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("storage.data_dir", &self.storage.data_dir)?;
        validate_file_name("storage.titles_file", &self.storage.titles_file)?;
        validate_file_name("storage.ratings_file", &self.storage.ratings_file)?;

        if self.storage.titles_file == self.storage.ratings_file {
            return Err(LedgerError::InvalidConfigValueError {
                field: "storage.ratings_file".to_string(),
                value: self.storage.ratings_file.clone(),
                reason: "Titles and ratings must be stored in different files".to_string(),
            });
        }

        validate_url("discord.api_base", &self.discord.api_base)?;
        validate_positive_number(
            "discord.request_timeout_seconds",
            self.discord.request_timeout_seconds,
            1,
        )?;

        Ok(())
    }

    /// The token is only needed to resolve user names.
    pub fn require_token(&self) -> Result<String> {
        let token = self.discord.token();
        let token = validate_required_field("discord.token", &token)?;
        validate_non_empty_string("discord.token", token)?;
        Ok(token.clone())
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
