//! # Workbook Storage Module
//!
//! In-memory model of the tabular document backing the inventory, together
//! with the XLSX reader and writer. A document is opened fresh, fully
//! materialized into a [`Workbook`], optionally mutated, and written back to
//! storage as a complete package.

pub(crate) mod cell;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod writer;
pub(crate) mod xlsx;

pub use cell::{Cell, CellValue};
pub use sheet::{Row, Sheet};

use crate::error::FleetSheetError;
use std::path::Path;
use thiserror::Error;

/// Errors raised by the workbook storage layer.
#[derive(Error, Debug)]
pub enum WorkbookError {
    /// A required part of the XLSX package is absent
    #[error("Missing '{0}' part in workbook package")]
    MissingPart(String),

    /// The requested sheet does not exist
    #[error("Sheet not found at index {0}")]
    SheetNotFound(usize),
}

/// A fully materialized tabular document: an ordered list of sheets.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Creates an empty workbook.
    pub fn new() -> Workbook {
        Workbook::default()
    }

    /// Reads a workbook from an XLSX file.
    ///
    /// # Arguments
    /// * `path` - Path to the XLSX file
    ///
    /// # Returns
    /// Result containing the materialized workbook or an error
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Workbook, FleetSheetError> {
        xlsx::read(path.as_ref())
    }

    /// Writes the workbook to an XLSX file, overwriting it in full.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FleetSheetError> {
        writer::write(self, path.as_ref())
    }

    /// Appends an empty sheet with the given name and returns it for population.
    pub fn add_sheet(&mut self, name: &str) -> &mut Sheet {
        self.sheets.push(Sheet::new(name));
        self.sheets.last_mut().expect("Just pushed")
    }

    /// Returns all sheets in document order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Gets the sheet at the given index, if present.
    pub fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Gets the sheet at the given index for mutation, if present.
    pub fn sheet_at_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }
}
