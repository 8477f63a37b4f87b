use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::Error;

pub const DEFAULT_PATH: &str = "draftmail.toml";
const ENV_PREFIX: &str = "DRAFTMAIL";

/// Per-file upload limit: 10 MiB
pub const MAX_ATTACHMENT_SIZE: u64 = 10 * 1024 * 1024;
pub const MAX_ATTACHMENTS: usize = 5;

/// Environment variables understood for compatibility with older
/// deployments, mapped to their config keys. Lowest priority.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("GROQ_API_KEY", "completion.api_key"),
    ("EMAIL_USER", "smtp.username"),
    ("EMAIL_PASS", "smtp.password"),
    ("PORT", "port"),
];

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    /// Root directory for staged uploads, created on first use
    pub staging_dir: PathBuf,
    pub max_attachment_size: u64,
    pub max_attachments: usize,
    pub completion: CompletionConfig,
    pub smtp: SmtpConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API, without trailing slash
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender address; falls back to `username`
    pub from: Option<String>,
    pub starttls: bool,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            staging_dir: PathBuf::from("uploads"),
            max_attachment_size: MAX_ATTACHMENT_SIZE,
            max_attachments: MAX_ATTACHMENTS,
            completion: CompletionConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: None,
            starttls: true,
            timeout_secs: 30,
        }
    }
}

impl CompletionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SmtpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.username)
    }
}

impl Config {
    /// Loads config from an optional TOML file and merges it with any
    /// environment variables prefixed with DRAFTMAIL_ (nested keys use `__`,
    /// e.g. `DRAFTMAIL_SMTP__PASSWORD`).
    ///
    /// An explicitly given `path` must exist; the default one may be absent.
    pub fn load(path: Option<&str>) -> Result<Self, Error> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    /// Same as [`Config::load`], reading variables from `env` instead of the
    /// process environment.
    ///
    /// Priority, lowest first: legacy variables, the file, `DRAFTMAIL_*`.
    pub fn load_with_env(path: Option<&str>, env: config::Map<String, String>) -> Result<Self, Error> {
        let mut builder = config::Config::builder();

        for (var, key) in LEGACY_ENV {
            if let Some(value) = env.get(*var) {
                builder = builder.set_default(*key, value.as_str())?;
            }
        }

        let config: Config = builder
            .add_source(
                config::File::with_name(path.unwrap_or(DEFAULT_PATH)).required(path.is_some()),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(env)),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Checks the credentials without which no request can succeed.
    pub fn validate(&self) -> Result<(), Error> {
        if self.completion.api_key.trim().is_empty() {
            return Err(Error::Config("completion.api_key is not set".to_string()));
        }

        if self.smtp.sender().trim().is_empty() {
            return Err(Error::Config("smtp.username or smtp.from must be set".to_string()));
        }

        if self.max_attachments == 0 || self.max_attachment_size == 0 {
            return Err(Error::Config("attachment limits must be non-zero".to_string()));
        }

        Ok(())
    }
}
