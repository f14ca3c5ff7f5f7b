//! Error types: infrastructure failures and request-scoped faults.

use std::fmt;

// ── Error ─────────────────────────────────────────────────────────────────────

/// The error type returned by palisade's fallible infrastructure operations.
///
/// Application-level outcomes (403, 404, 500) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type covers
/// binding a port, accepting a connection, and the one case where a request
/// cannot be answered at all: aborting a connection whose response already
/// started streaming.
#[derive(Debug)]
pub enum Error {
    /// Socket-level failure (bind, accept).
    Io(std::io::Error),
    /// The pipeline decided to tear the connection down instead of writing
    /// a (second) response. Surfaced through hyper's service error channel.
    Aborted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Aborted => f.write_str("connection aborted by pipeline"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Aborted => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ── Fault ─────────────────────────────────────────────────────────────────────

/// A captured request-scoped failure: what went wrong, in one line.
///
/// Handlers return `Result<_, Fault>`; any stage may re-raise one. Exactly
/// one consumer exists — the error boundary at the head of the pipeline,
/// which logs the fault once and converts it into a sanitized 500 response.
/// A `Fault` is never persisted and never crosses requests.
#[derive(Debug)]
pub struct Fault {
    kind: &'static str,
    message: String,
}

impl Fault {
    /// A fault raised deliberately by a handler or stage.
    pub fn new(message: impl Into<String>) -> Self {
        Self { kind: "error", message: message.into() }
    }

    /// A fault recovered from a panic in downstream code.
    pub(crate) fn panic(message: String) -> Self {
        Self { kind: "panic", message }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Fault {}

impl From<std::io::Error> for Fault {
    fn from(e: std::io::Error) -> Self {
        Self { kind: "io", message: e.to_string() }
    }
}

impl From<serde_json::Error> for Fault {
    fn from(e: serde_json::Error) -> Self {
        Self { kind: "json", message: e.to_string() }
    }
}
