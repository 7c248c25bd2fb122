//! In-Memory Report Storage Adapter
//!
//! Keeps reports in memory under the same file names the filesystem
//! adapter would use. Useful for tests and dry runs.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::screening::{Report, ReportHeadline};
use crate::ports::{ReportFileName, ReportStorage, ReportSummary, StorageError, StoredReport};

/// In-memory storage for reports
#[derive(Debug, Clone, Default)]
pub struct InMemoryReportStorage {
    reports: Arc<RwLock<HashMap<ReportFileName, String>>>,
}

impl InMemoryReportStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reports
    pub async fn report_count(&self) -> usize {
        self.reports.read().await.len()
    }
}

#[async_trait]
impl ReportStorage for InMemoryReportStorage {
    async fn save(&self, report: &Report) -> Result<StoredReport, StorageError> {
        let name = ReportFileName::for_report(report);
        let content = report.text().to_string();
        let stored = StoredReport {
            file_name: name.as_str().to_string(),
            location: format!("memory://{}", name),
            checksum: format!("{:x}", Sha256::digest(content.as_bytes())),
            size_bytes: content.len() as u64,
        };
        self.reports.write().await.insert(name, content);
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<ReportSummary>, StorageError> {
        let reports = self.reports.read().await;
        let mut summaries: Vec<ReportSummary> = reports
            .iter()
            .map(|(name, content)| ReportSummary {
                file_name: name.as_str().to_string(),
                phone_number: name.phone_number().to_string(),
                created_at: name.created_at(),
                size_bytes: content.len() as u64,
                headline: ReportHeadline::parse(content),
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(summaries)
    }

    async fn read(&self, file_name: &str) -> Result<String, StorageError> {
        let name = ReportFileName::parse(file_name)?;
        self.reports
            .read()
            .await
            .get(&name)
            .cloned()
            .ok_or_else(|| StorageError::not_found(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::domain::screening::{CallEndReason, CallMetadata, InterviewPolicy, TurnCoordinator};

    fn report() -> Report {
        let mut coordinator = TurnCoordinator::new(
            SessionId::new(),
            CallMetadata::new("+15550100").unwrap(),
            Arc::new(InterviewPolicy::default()),
        );
        coordinator.start();
        coordinator
            .cancel(CallEndReason::Voicemail)
            .as_end()
            .unwrap()
            .report
            .clone()
    }

    #[tokio::test]
    async fn save_then_read_round_trips_text() {
        let storage = InMemoryReportStorage::new();
        let report = report();

        let stored = storage.save(&report).await.unwrap();

        assert_eq!(storage.read(&stored.file_name).await.unwrap(), report.text());
        assert_eq!(storage.report_count().await, 1);
        assert!(stored.location.starts_with("memory://medical_report_"));
    }

    #[tokio::test]
    async fn read_validates_names() {
        let storage = InMemoryReportStorage::new();
        assert!(matches!(
            storage.read("../etc/passwd").await,
            Err(StorageError::InvalidFileName { .. })
        ));
        assert!(matches!(
            storage.read("medical_report_1_20250303_141500.txt").await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_includes_headline() {
        let storage = InMemoryReportStorage::new();
        storage.save(&report()).await.unwrap();

        let listed = storage.list().await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].phone_number, "+15550100");
        assert_eq!(listed[0].headline.patient_name.as_deref(), Some("Not provided"));
    }
}
