//! # Fleet Sheet
//!
//! A spreadsheet-backed inventory of Linux/Java servers. One XLSX document is
//! the sole data store; this crate reads it into typed records and performs a
//! single targeted update (comment + proposed remediation date) keyed by
//! server name.
//!
//! ## Features
//!
//! - **Typed cell model**: cells are a tagged variant (text, number, boolean,
//!   date/time, blank) with lenient pattern-matching coercion
//! - **Self-contained XLSX storage**: reader and writer over `zip` and
//!   `quick-xml`, including shared strings, number-format-driven date
//!   detection, and both the 1900 and 1904 date systems
//! - **Row mapping that never fails**: mismatched or missing cells map to
//!   field defaults, never to errors
//! - **Broad-scan locator**: the update key is matched against every text
//!   cell of the sheet in row-major order, first match wins
//! - **Full-document rewrite**: updates mutate two cells in memory and
//!   persist the whole document back in one truncating write
//! - **Explicit configuration**: file path and date format travel in a
//!   [`ReportConfig`] passed to the service, never in global state
//!
//! ## Example
//!
//! ```no_run
//! use fleet_sheet::{ReportConfig, ReportService};
//!
//! # fn main() -> Result<(), fleet_sheet::FleetSheetError> {
//! let service = ReportService::new(ReportConfig::new("inventory.xlsx"));
//! for record in service.list_all_records()? {
//!     println!("{} ({})", record.server_name, record.env);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod helpers;
pub mod report;
pub mod workbook;

pub use config::ReportConfig;
pub use error::FleetSheetError;
pub use report::{ReportError, ReportService, ServerRecord, COLUMN_COMMENT, COLUMN_PROPOSED_DATE};
pub use workbook::{Cell, CellValue, Row, Sheet, Workbook, WorkbookError};
