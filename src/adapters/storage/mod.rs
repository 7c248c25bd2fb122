//! Report Storage Adapters
//!
//! - **LocalReportStorage** - Plain-text files in a report directory
//! - **InMemoryReportStorage** - Reports in memory (testing/dry runs)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemoryReportStorage, LocalReportStorage};
//!
//! // Production: one file per call
//! let storage = LocalReportStorage::new("call_notes");
//!
//! // Testing
//! let storage = InMemoryReportStorage::new();
//! ```

mod in_memory_report_storage;
mod local_report_storage;

pub use in_memory_report_storage::InMemoryReportStorage;
pub use local_report_storage::LocalReportStorage;
