//! # Export Errors
//!
//! Domain error taxonomy for the export orchestrator. Every failure of an
//! export run is expressed as one of these variants and ends the run in the
//! `Failed` state.

use thiserror::Error;

/// Failure kinds of an export request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// The resource identity could not be derived
    #[error("Invalid resource key: {reason}")]
    InvalidKey { reason: String },

    /// Network or backend failure during a create or status call
    #[error("Transport error during {operation}: {message}")]
    TransportError { operation: String, message: String },

    /// The backend accepted the export but returned no job identifier
    #[error("Missing export id in creation response")]
    MissingJobId,

    /// The attempt budget ran out before the artifact was ready
    #[error("Content not loaded in time after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// The orchestrator was torn down before the run reached a terminal state
    #[error("Export abandoned before completion")]
    Abandoned,
}

impl ExportError {
    /// Create an invalid key error
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Create a transport error for the named backend operation
    pub fn transport(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::TransportError {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Short machine-readable kind, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidKey { .. } => "invalid_key",
            Self::TransportError { .. } => "transport_error",
            Self::MissingJobId => "missing_job_id",
            Self::Timeout { .. } => "timeout",
            Self::Abandoned => "abandoned",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
