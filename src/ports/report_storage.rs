//! Report Storage Port - Durable storage for finished screening reports.
//!
//! Reports are written once per call, verbatim, and never modified.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::Timestamp;
use crate::domain::screening::{Report, ReportHeadline};

const FILE_PREFIX: &str = "medical_report_";
const FILE_SUFFIX: &str = ".txt";
const STAMP_LEN: usize = 15;

/// Port for report persistence.
///
/// # Contract
///
/// Implementations must:
/// - Name files `medical_report_{phone}_{YYYYmmdd_HHMMSS}.txt`
/// - Write atomically (no partial report on failure)
/// - Compute a SHA-256 checksum of what was written
/// - List newest first
/// - Refuse to read anything that is not a report file name
#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// Stores a finished report.
    async fn save(&self, report: &Report) -> Result<StoredReport, StorageError>;

    /// Lists stored reports, newest first.
    async fn list(&self) -> Result<Vec<ReportSummary>, StorageError>;

    /// Reads a stored report by file name.
    async fn read(&self, file_name: &str) -> Result<String, StorageError>;
}

/// A validated report file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportFileName {
    name: String,
    phone_number: String,
    created_at: Timestamp,
}

impl ReportFileName {
    /// Builds the file name for a report from its phone number and end time.
    pub fn for_report(report: &Report) -> Self {
        let phone: String = report
            .phone_number()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        let phone = if phone.is_empty() {
            "unknown".to_string()
        } else {
            phone
        };
        let created_at = report.generated_at();
        Self {
            name: format!(
                "{}{}_{}{}",
                FILE_PREFIX,
                phone,
                created_at.to_compact_string(),
                FILE_SUFFIX
            ),
            phone_number: phone,
            created_at,
        }
    }

    /// Parses and validates a file name supplied from outside.
    pub fn parse(name: &str) -> Result<Self, StorageError> {
        let invalid = || StorageError::invalid_file_name(name);

        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(invalid());
        }
        let stem = name
            .strip_prefix(FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
            .ok_or_else(invalid)?;
        if stem.len() < STAMP_LEN + 2 || !stem.is_char_boundary(stem.len() - STAMP_LEN - 1) {
            return Err(invalid());
        }

        let (phone, stamp) = stem.split_at(stem.len() - STAMP_LEN - 1);
        let stamp = stamp.strip_prefix('_').ok_or_else(invalid)?;
        if !phone.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
            return Err(invalid());
        }
        let created_at = Timestamp::parse_compact(stamp).ok_or_else(invalid)?;

        Ok(Self {
            name: name.to_string(),
            phone_number: phone.to_string(),
            created_at,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// Timestamp embedded in the name.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl fmt::Display for ReportFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Where a saved report ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredReport {
    pub file_name: String,
    /// Adapter-specific location (a path for the filesystem adapter).
    pub location: String,
    /// Hex-encoded SHA-256 of the stored bytes.
    pub checksum: String,
    pub size_bytes: u64,
}

/// One entry in a report listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub file_name: String,
    pub phone_number: String,
    pub created_at: Timestamp,
    pub size_bytes: u64,
    pub headline: ReportHeadline,
}

/// Errors from report storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// No report with that name.
    #[error("Report not found: {name}")]
    NotFound { name: String },

    /// The name is not a report file name (or tries to leave the directory).
    #[error("Invalid report file name: {name}")]
    InvalidFileName { name: String },

    /// Permission denied accessing the file.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    /// Report is larger than the adapter accepts.
    #[error("Report too large: {size_bytes} bytes (max: {max_bytes})")]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    /// IO error during file operation.
    #[error("IO error: {message}")]
    Io { message: String },
}

impl StorageError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn invalid_file_name(name: impl Into<String>) -> Self {
        Self::InvalidFileName { name: name.into() }
    }

    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    pub fn too_large(size_bytes: u64, max_bytes: u64) -> Self {
        Self::TooLarge {
            size_bytes,
            max_bytes,
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}
