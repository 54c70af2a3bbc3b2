// ABOUTME: Runtime connection error types with SNAFU pattern.
// ABOUTME: Raised before any deploy step runs, when the client cannot be built or reached.

use snafu::Snafu;

/// Failure to establish the container runtime client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RuntimeError {
    #[snafu(display("unsupported runtime endpoint {endpoint:?} (expected unix://, tcp:// or http://)"))]
    UnsupportedEndpoint { endpoint: String },

    #[snafu(display("failed to connect to runtime at {endpoint}: {source}"))]
    Connect {
        endpoint: String,
        source: ::bollard::errors::Error,
    },

    #[snafu(display("runtime at {endpoint} is not responding: {source}"))]
    Ping {
        endpoint: String,
        source: ::bollard::errors::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Endpoint string could not be interpreted.
    BadEndpoint,
    /// Client could not be constructed or the daemon did not answer.
    ConnectionFailed,
}

impl RuntimeError {
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::UnsupportedEndpoint { .. } => RuntimeErrorKind::BadEndpoint,
            RuntimeError::Connect { .. } | RuntimeError::Ping { .. } => {
                RuntimeErrorKind::ConnectionFailed
            }
        }
    }
}
