use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::Side;

/// Write operation against the secondary endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOp {
    Delete,
    Add,
}

impl fmt::Display for ApplyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyOp::Delete => write!(f, "delete"),
            ApplyOp::Add => write!(f, "add"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Request to {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Malformed JSON from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("Reservation record is missing required field '{field}': {record}")]
    MissingField { field: &'static str, record: String },

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("IP address {ip} appears more than once in the {side} reservation list")]
    DuplicateReservation { ip: String, side: Side },

    #[error("Failed to {op} reservation for {ip} on secondary: {reason}")]
    Apply {
        op: ApplyOp,
        ip: String,
        reason: String,
    },

    #[error("Failed to load TLS {what} from {}: {reason}", path.display())]
    TlsMaterial {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },
}
