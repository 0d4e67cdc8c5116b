//! Export Job Types
//!
//! Value types describing a backend export job: its identifier, the format
//! requested, the readiness signal returned by status checks, and the
//! artifact delivered when the job succeeds.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::resource_key::ResourceKey;
use crate::error::{ExportError, Result};

/// Opaque, non-empty identifier of a backend export job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap a backend identifier, rejecting empty values
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ExportError::MissingJobId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Artifact formats the backend can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    #[serde(rename = "image/png", alias = "png")]
    Png,
    #[serde(rename = "application/pdf", alias = "pdf")]
    Pdf,
    #[serde(rename = "text/csv", alias = "csv")]
    Csv,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
            Self::Csv => "text/csv",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image/png" | "png" => Ok(Self::Png),
            "application/pdf" | "pdf" => Ok(Self::Pdf),
            "text/csv" | "csv" => Ok(Self::Csv),
            _ => Err(format!("Invalid export format: {s}")),
        }
    }
}

/// What the orchestrator asks the backend to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub key: ResourceKey,
    pub format: ExportFormat,
}

impl ExportRequest {
    pub fn new(key: ResourceKey, format: ExportFormat) -> Self {
        Self { key, format }
    }
}

/// Result of a single status check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    pub ready: bool,
}

impl PollResult {
    pub fn ready() -> Self {
        Self { ready: true }
    }

    pub fn not_ready() -> Self {
        Self { ready: false }
    }
}

/// A finished export, ready for retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub job_id: JobId,
    pub url: String,
    pub format: ExportFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_rejects_empty() {
        assert_eq!(JobId::new(""), Err(ExportError::MissingJobId));
        assert_eq!(JobId::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_export_format_serde() {
        let json = serde_json::to_string(&ExportFormat::Pdf).unwrap();
        assert_eq!(json, "\"application/pdf\"");

        let parsed: ExportFormat = serde_json::from_str("\"image/png\"").unwrap();
        assert_eq!(parsed, ExportFormat::Png);
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("IMAGE/PNG".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert!("gif".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Pdf.file_extension(), "pdf");
    }
}
