//! Report storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where finished reports are written
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl ReportsConfig {
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.directory.trim().is_empty() {
            return Err(ValidationError::EmptyReportDirectory);
        }
        Ok(())
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

fn default_directory() -> String {
    "call_notes".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_call_notes() {
        let config = ReportsConfig::default();
        assert_eq!(config.path(), PathBuf::from("call_notes"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_directory_is_rejected() {
        let config = ReportsConfig {
            directory: "  ".to_string(),
        };
        assert!(matches!(config.validate(), Err(ValidationError::EmptyReportDirectory)));
    }
}
