//! Error types for the TAP parser

use thiserror::Error;

/// Result type alias using the parser error
pub type Result<T> = std::result::Result<T, TapError>;

/// Usage errors raised by the parser.
///
/// Malformed input text never produces one of these: unrecognized lines are
/// dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TapError {
    #[error("Unknown granularity '{0}' (expected module, test or assertion)")]
    UnknownGranularity(String),

    #[error("Node {0} does not exist in this tree")]
    UnknownNode(usize),

    #[error("Node {id} is a {kind} and cannot hold children")]
    NotAGroup { id: usize, kind: String },
}
