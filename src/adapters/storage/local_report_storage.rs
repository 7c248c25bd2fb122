//! Local Filesystem Report Storage - Implementation of ReportStorage.
//!
//! Stores each finished report as a plain-text file in one flat directory
//! (`call_notes/` by default). Uses atomic writes and SHA-256 checksums.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::screening::{Report, ReportHeadline};
use crate::ports::{ReportFileName, ReportStorage, ReportSummary, StorageError, StoredReport};

/// Maximum report size accepted (1 MB).
const MAX_REPORT_SIZE_BYTES: u64 = 1024 * 1024;

/// Local filesystem storage for screening reports.
///
/// # Atomic Writes
///
/// 1. Write the report to `{name}.tmp`
/// 2. Sync to disk
/// 3. Rename to `{name}`
///
/// A crash mid-write leaves at most a `.tmp` file, which listing ignores.
#[derive(Debug, Clone)]
pub struct LocalReportStorage {
    base_path: PathBuf,
}

impl LocalReportStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn report_path(&self, name: &ReportFileName) -> PathBuf {
        self.base_path.join(name.as_str())
    }

    fn temp_path(&self, name: &ReportFileName) -> PathBuf {
        self.base_path.join(format!("{}.tmp", name.as_str()))
    }

    async fn ensure_base_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::io(format!(
                "Failed to create report directory {}: {}",
                self.base_path.display(),
                e
            ))
        })
    }

    fn compute_checksum(content: &str) -> String {
        format!("{:x}", Sha256::digest(content.as_bytes()))
    }

    fn map_read_error(path: &Path, e: std::io::Error, name: &str) -> StorageError {
        match e.kind() {
            ErrorKind::NotFound => StorageError::not_found(name),
            ErrorKind::PermissionDenied => StorageError::permission_denied(path.display().to_string()),
            _ => StorageError::io(format!("Failed to read {}: {}", path.display(), e)),
        }
    }

    async fn write_atomically(&self, name: &ReportFileName, content: &str) -> Result<PathBuf, StorageError> {
        let temp_path = self.temp_path(name);
        let final_path = self.report_path(name);

        let mut file = fs::File::create(&temp_path).await.map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => StorageError::permission_denied(temp_path.display().to_string()),
            _ => StorageError::io(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            )),
        })?;

        file.write_all(content.as_bytes()).await.map_err(|e| {
            StorageError::io(format!("Failed to write {}: {}", temp_path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::io(format!("Failed to sync {}: {}", temp_path.display(), e))
        })?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::io(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                final_path.display(),
                e
            )));
        }

        Ok(final_path)
    }
}

#[async_trait]
impl ReportStorage for LocalReportStorage {
    async fn save(&self, report: &Report) -> Result<StoredReport, StorageError> {
        let content = report.text();
        let size = content.len() as u64;
        if size > MAX_REPORT_SIZE_BYTES {
            return Err(StorageError::too_large(size, MAX_REPORT_SIZE_BYTES));
        }

        self.ensure_base_dir().await?;

        let name = ReportFileName::for_report(report);
        let path = self.write_atomically(&name, content).await?;

        let stored = StoredReport {
            file_name: name.as_str().to_string(),
            location: path.display().to_string(),
            checksum: Self::compute_checksum(content),
            size_bytes: size,
        };

        tracing::info!(
            session_id = %report.session_id(),
            file = %stored.file_name,
            checksum = %stored.checksum,
            status = %report.status(),
            "Report saved"
        );
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<ReportSummary>, StorageError> {
        if !fs::try_exists(&self.base_path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.base_path).await.map_err(|e| {
            StorageError::io(format!(
                "Failed to read report directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut reports = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(format!("Failed to read directory entry: {}", e)))?
        {
            let file_name = entry.file_name();
            let Ok(name) = ReportFileName::parse(&file_name.to_string_lossy()) else {
                continue;
            };

            let path = entry.path();
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "Skipping unreadable report");
                    continue;
                }
            };

            reports.push(ReportSummary {
                file_name: name.as_str().to_string(),
                phone_number: name.phone_number().to_string(),
                created_at: name.created_at(),
                size_bytes: content.len() as u64,
                headline: ReportHeadline::parse(&content),
            });
        }

        // Newest first
        reports.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });

        Ok(reports)
    }

    async fn read(&self, file_name: &str) -> Result<String, StorageError> {
        let name = ReportFileName::parse(file_name)?;
        let path = self.report_path(&name);

        fs::read_to_string(&path)
            .await
            .map_err(|e| Self::map_read_error(&path, e, file_name))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════════
