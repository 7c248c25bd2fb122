//! ListReportsHandler - Query handler for stored screening reports.

use std::sync::Arc;

use crate::ports::{ReportStorage, ReportSummary, StorageError};

/// Query for stored reports.
#[derive(Debug, Clone, Default)]
pub struct ListReportsQuery {
    /// Only reports for this phone number (digits and `+` compared).
    pub phone_number: Option<String>,
    /// Maximum number of entries, newest first.
    pub limit: Option<usize>,
}

/// Handler for listing reports.
pub struct ListReportsHandler {
    storage: Arc<dyn ReportStorage>,
}

impl ListReportsHandler {
    pub fn new(storage: Arc<dyn ReportStorage>) -> Self {
        Self { storage }
    }

    pub async fn handle(&self, query: ListReportsQuery) -> Result<Vec<ReportSummary>, StorageError> {
        let phone_filter = query.phone_number.as_deref().map(normalize_phone);

        let reports = self
            .storage
            .list()
            .await?
            .into_iter()
            .filter(|r| match &phone_filter {
                Some(phone) => &r.phone_number == phone,
                None => true,
            })
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(reports)
    }
}

fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}
