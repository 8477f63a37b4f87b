use serde::{Deserialize, Serialize};

/// All possible draftmail library errors
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub enum Error {
    /// A required request field is missing or empty
    Validation(String),
    /// More file parts than a single request may carry
    TooManyAttachments(usize),
    /// A single upload exceeded the per-file limit, in bytes
    AttachmentTooLarge { name: String, limit: u64 },
    /// The upload itself could not be read (bad multipart, non-UTF-8 field)
    Upload(String),
    /// Completion API failed or timed out
    Generation(String),
    /// Mail transport failed or timed out
    Dispatch(String),
    Storage(String),
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Validation(ref msg) => write!(f, "{}", msg),
            Error::TooManyAttachments(limit) => {
                write!(f, "At most {} attachments are allowed per email", limit)
            }
            Error::AttachmentTooLarge { ref name, limit } => {
                write!(f, "Attachment {} exceeds the limit of {} bytes", name, limit)
            }
            Error::Upload(ref msg) => write!(f, "Upload: {}", msg),
            Error::Generation(ref msg) => write!(f, "Generation: {}", msg),
            Error::Dispatch(ref msg) => write!(f, "Dispatch: {}", msg),
            Error::Storage(ref msg) => write!(f, "Storage: {}", msg),
            Error::Config(ref msg) => write!(f, "Config: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Upstream message carried by this error, without the category prefix.
    pub fn details(&self) -> String {
        match *self {
            Error::Upload(ref msg)
            | Error::Generation(ref msg)
            | Error::Dispatch(ref msg)
            | Error::Storage(ref msg)
            | Error::Config(ref msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

// The only JSON the library decodes is completion API output
impl From<serde_json::error::Error> for Error {
    fn from(err: serde_json::error::Error) -> Self {
        Self::Generation(format!("invalid completion response: {}", err))
    }
}

impl From<lettre::error::Error> for Error {
    fn from(err: lettre::error::Error) -> Self {
        Self::Dispatch(err.to_string())
    }
}

impl From<lettre::address::AddressError> for Error {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::Dispatch(format!("invalid address: {}", err))
    }
}

impl From<lettre::transport::smtp::Error> for Error {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Dispatch(err.to_string())
    }
}
