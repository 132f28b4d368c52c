use std::io;
use thiserror::Error;

/// Errors raised by the data sources and the configuration layer.
///
/// Orphaned topology entries and counter regressions are deliberately absent:
/// they are absorbed where they occur and never reach the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        Error::SourceUnavailable(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedPayload(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::SourceUnavailable(_))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::SourceUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedPayload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_unavailable() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "ioreg").into();
        assert!(err.is_unavailable());
        assert_eq!(err.to_string(), "source unavailable: ioreg");
    }

    #[test]
    fn json_errors_map_to_malformed() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }
}
