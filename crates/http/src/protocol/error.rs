use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: RequestError,
    },

    #[error("stream error: {source}")]
    StreamError {
        #[from]
        source: StreamError,
    },
}

/// Failures reported by [`Stream`](crate::stream::Stream) operations.
///
/// Capability queries never produce these, only data transfer and positioning do.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("stream is not readable")]
    NotReadable,

    #[error("stream is not writable")]
    NotWritable,

    #[error("stream is not seekable")]
    NotSeekable,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl StreamError {
    pub fn invalid_argument<S: ToString>(str: S) -> Self {
        Self::InvalidArgument { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The error returned when an operation needs the handle but it was detached or closed.
    pub fn detached() -> Self {
        Self::Io { source: io::Error::new(io::ErrorKind::NotConnected, "stream is detached") }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Io { source } if source.kind() == io::ErrorKind::NotConnected)
    }
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("request has no body")]
    MissingBody,

    #[error("body stream error: {source}")]
    Stream {
        #[from]
        source: StreamError,
    },
}

impl RequestError {
    pub fn invalid_argument<S: ToString>(str: S) -> Self {
        Self::InvalidArgument { reason: str.to_string() }
    }

    pub fn invalid_method<S: AsRef<str>>(method: S) -> Self {
        Self::InvalidArgument { reason: format!("unsupported http method: {}", method.as_ref()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_is_io_kind() {
        let error = StreamError::detached();
        assert!(error.is_detached());
        assert!(matches!(error, StreamError::Io { .. }));
        assert!(!StreamError::io(io::Error::other("disk")).is_detached());
    }

    #[test]
    fn wraps_into_message_error() {
        let error: MessageError = RequestError::invalid_method("PATCH").into();
        assert_eq!(error.to_string(), "request error: invalid argument: unsupported http method: PATCH");

        let error: MessageError = StreamError::NotSeekable.into();
        assert_eq!(error.to_string(), "stream error: stream is not seekable");
    }

    #[test]
    fn stream_error_converts_into_request_error() {
        let error: RequestError = StreamError::NotReadable.into();
        assert!(matches!(error, RequestError::Stream { source: StreamError::NotReadable }));
    }
}
