//! Report configuration.
//!
//! Configuration is an explicit structure handed to the service constructor,
//! never ambient process-wide state. It can be built directly or loaded from
//! a TOML file:
//!
//! ```toml
//! workbook-path = "/srv/reports/linux-java-inventory.xlsx"
//! date-format = "dd/mm/yyyy"
//! ```

use crate::error::FleetSheetError;
use crate::error::ResultMessage;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Settings of the inventory report service.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    /// Path of the spreadsheet acting as the data store
    pub workbook_path: PathBuf,

    /// Display format applied to the proposed-date cell on updates
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    "dd/mm/yyyy".to_owned()
}

impl ReportConfig {
    /// Creates a configuration with the default date format.
    pub fn new<P: Into<PathBuf>>(workbook_path: P) -> ReportConfig {
        ReportConfig {
            workbook_path: workbook_path.into(),
            date_format: default_date_format(),
        }
    }

    /// Loads a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ReportConfig, FleetSheetError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(FleetSheetError::IoError)
            .with_prefix("Read config file")?;
        Ok(toml::from_str(&content)?)
    }
}
