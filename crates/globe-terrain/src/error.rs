//! Error types for the globe-terrain crate.

use std::fmt;

use globe_terrain_decode::{DecodeError, TessellationError};

/// Result type for globe-terrain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in globe-terrain operations.
#[derive(Debug)]
pub enum Error {
    /// Provider options are missing or malformed.
    Configuration {
        /// Description of the problem.
        detail: String,
    },
    /// HTTP request failed.
    Http {
        /// The URL that failed.
        url: String,
        /// The error message.
        message: String,
    },
    /// HTTP response had a non-success status code.
    HttpStatus {
        /// The URL that returned the error.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// The response body was not a readable image.
    Image {
        /// The URL the image came from.
        url: String,
        /// The underlying decode failure.
        source: DecodeError,
    },
    /// Invalid data in a service response.
    InvalidData {
        /// Context for where the error occurred.
        context: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
    /// Raster pixels could not be unpacked into heights.
    Decode(DecodeError),
    /// Heights could not be tessellated.
    Tessellation(TessellationError),
    /// The operation is not supported by this provider.
    UnsupportedOperation {
        /// The operation that was attempted.
        operation: &'static str,
    },
}

/// Coarse classification of an [`Error`], for callers that only need to
/// know which phase failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad construction input.
    Configuration,
    /// Network, status, or response-body failure.
    Fetch,
    /// Malformed or undersized raster.
    Decode,
    /// Degenerate sample grid.
    Tessellation,
    /// Operation not supported.
    UnsupportedOperation,
}

impl Error {
    /// Which phase of work this error came from.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Http { .. }
            | Error::HttpStatus { .. }
            | Error::Image { .. }
            | Error::InvalidData { .. } => ErrorKind::Fetch,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Tessellation(_) => ErrorKind::Tessellation,
            Error::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { detail } => write!(f, "invalid configuration: {detail}"),
            Error::Http { url, message } => {
                write!(f, "http request to {url} failed: {message}")
            }
            Error::HttpStatus { url, status } => {
                write!(f, "http request to {url} returned status {status}")
            }
            Error::Image { url, source } => {
                write!(f, "response from {url} is not a valid image: {source}")
            }
            Error::InvalidData { context, detail } => {
                write!(f, "invalid {context}: {detail}")
            }
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::Tessellation(e) => write!(f, "tessellation error: {e}"),
            Error::UnsupportedOperation { operation } => {
                write!(f, "{operation} is not supported")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Image { source, .. } | Error::Decode(source) => Some(source),
            Error::Tessellation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<TessellationError> for Error {
    fn from(e: TessellationError) -> Self {
        Error::Tessellation(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidData {
            context: "service metadata",
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let fetch = Error::HttpStatus {
            url: "https://example".to_string(),
            status: 500,
        };
        assert_eq!(fetch.kind(), ErrorKind::Fetch);

        let decode = Error::from(DecodeError::BufferSizeMismatch {
            expected: 4,
            actual: 3,
        });
        assert_eq!(decode.kind(), ErrorKind::Decode);

        let tessellation = Error::from(TessellationError::DegenerateGrid {
            width: 1,
            height: 1,
        });
        assert_eq!(tessellation.kind(), ErrorKind::Tessellation);
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::HttpStatus {
            url: "https://example/exportImage".to_string(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "http request to https://example/exportImage returned status 404"
        );
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;

        let err = Error::Image {
            url: "u".to_string(),
            source: DecodeError::InvalidFormat {
                context: "raster",
                detail: "bad".to_string(),
            },
        };
        assert!(err.source().is_some());
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }
}
