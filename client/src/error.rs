use draftmail::api::ServerResult;

#[derive(Debug)]
pub enum Error {
    /// Server answered with an error, or could not be reached
    Server(ServerResult),
    /// Another generate/send request is still in flight
    Busy,
    /// A required field is missing on the client side
    Invalid(String),
    Unexpected(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Server(ref result) => match (&result.error, &result.details) {
                (Some(error), Some(details)) => write!(f, "{} ({})", error, details),
                (Some(error), None) => write!(f, "{}", error),
                _ => write!(f, "Unexpected server error"),
            },
            Error::Busy => write!(f, "Another request is already in progress"),
            Error::Invalid(ref msg) => write!(f, "{}", msg),
            Error::Unexpected(ref msg) => write!(f, "{}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Unexpected(err.to_string())
    }
}
