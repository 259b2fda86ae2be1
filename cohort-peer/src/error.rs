//! Peer and tool-dispatch errors.

use std::fmt;
use thiserror::Error;

/// Errors from non-tool peer operations (resources, prompts, tool listing).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PeerError {
    /// Connecting to the peer or completing its handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The peer answered with a protocol-level error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The requested resource or prompt does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The peer answered, but not in a shape the core can use.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Coarse category of a tool-dispatch failure.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// No tool with that name.
    NotFound,
    /// The tool rejected its arguments.
    InvalidArgs,
    /// The call never completed (connection dropped, timeout).
    Transport,
    /// The tool ran and reported failure.
    Other,
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToolErrorKind::NotFound => "not found",
            ToolErrorKind::InvalidArgs => "invalid arguments",
            ToolErrorKind::Transport => "transport",
            ToolErrorKind::Other => "tool error",
        })
    }
}

/// A failed tool dispatch.
///
/// Returned from [`ProtocolPeer::call_tool`](crate::ProtocolPeer::call_tool).
/// The agent loop turns every `ToolError` into an inline transcript
/// message; it never aborts the turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ToolError {
    /// Failure category.
    pub kind: ToolErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl ToolError {
    /// Create an error of the given kind.
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// No tool with this name.
    pub fn not_found(name: &str) -> Self {
        Self::new(ToolErrorKind::NotFound, format!("no tool named {name}"))
    }

    /// Arguments rejected.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArgs, message)
    }

    /// The call did not complete.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Transport, message)
    }

    /// The tool reported failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Other, message)
    }
}
