//! # Inventory Report Module
//!
//! The service layer over the workbook storage: maps sheet rows to server
//! records and performs the comment / proposed-date update keyed by server
//! name.

pub(crate) mod record;
pub(crate) mod service;

pub use record::{ServerRecord, COLUMN_COMMENT, COLUMN_PROPOSED_DATE};
pub use service::{ReportError, ReportService};
