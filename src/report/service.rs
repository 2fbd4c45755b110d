use crate::config::ReportConfig;
use crate::error::FleetSheetError;
use crate::report::record::ServerRecord;
use crate::report::record::COLUMN_COMMENT;
use crate::report::record::COLUMN_PROPOSED_DATE;
use crate::workbook::cell::CellValue;
use crate::workbook::sheet::Sheet;
use crate::workbook::Workbook;
use crate::workbook::WorkbookError;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Errors raised by the report service.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Update requested for a server name no cell matches
    #[error("Server not found with name: {0}")]
    ServerNotFound(String),
}

/// Service over the inventory spreadsheet.
///
/// Every operation opens the document fresh, materializes it in memory, and
/// (on the update path only) rewrites it in full. The document is the sole
/// persisted state; records are re-derived from it on every read. Concurrent
/// updates are not coordinated here - callers needing serialization must
/// impose it at their own boundary.
pub struct ReportService {
    config: ReportConfig,
}

impl ReportService {
    /// Creates a service over the configured document.
    pub fn new(config: ReportConfig) -> ReportService {
        ReportService { config }
    }

    /// Lists every server record of the inventory, in row order.
    ///
    /// The first row of the first sheet is the header and is skipped; every
    /// remaining row maps to exactly one record.
    ///
    /// # Errors
    /// Fails when the document cannot be opened or holds no sheet.
    pub fn list_all_records(&self) -> Result<Vec<ServerRecord>, FleetSheetError> {
        let workbook = Workbook::open(&self.config.workbook_path)?;
        let sheet = workbook.sheet_at(0).ok_or(WorkbookError::SheetNotFound(0))?;
        let records: Vec<ServerRecord> = sheet
            .rows()
            .skip(1) // Header row
            .map(|(_, row)| ServerRecord::from_row(row))
            .collect();
        debug!(records = records.len(), "listed inventory records");
        Ok(records)
    }

    /// Updates the comment and proposed remediation date of the row matching
    /// `server_name`, rewrites the whole document, and returns the freshly
    /// mapped record.
    ///
    /// The located row gets its comment cell set to `comment` and its
    /// proposed-date cell set to `proposed_date`, styled with the configured
    /// date format; both cells are created when absent. The rewrite is a
    /// truncating full-document write.
    ///
    /// # Errors
    /// Fails with [`ReportError::ServerNotFound`] when no cell matches the
    /// name - the document is left untouched - and propagates storage I/O
    /// failures unmodified.
    pub fn update_record(
        &self,
        server_name: &str,
        comment: &str,
        proposed_date: NaiveDate,
    ) -> Result<ServerRecord, FleetSheetError> {
        let mut workbook = Workbook::open(&self.config.workbook_path)?;
        let sheet = workbook.sheet_at_mut(0).ok_or(WorkbookError::SheetNotFound(0))?;
        let row_index = find_row(sheet, server_name)
            .ok_or_else(|| ReportError::ServerNotFound(server_name.to_owned()))?;

        let comment_cell = sheet.cell_mut(row_index, COLUMN_COMMENT);
        comment_cell.value = CellValue::Text(comment.to_owned());

        let date_cell = sheet.cell_mut(row_index, COLUMN_PROPOSED_DATE);
        date_cell.value = CellValue::DateTime(
            proposed_date.and_hms_opt(0, 0, 0).expect("Append 00:00:00"),
        );
        // Fresh date style scoped to this single cell
        date_cell.number_format = Some(self.config.date_format.clone());

        workbook.save(&self.config.workbook_path)?;
        info!(server_name, row = row_index, "updated inventory record");

        let row = workbook
            .sheet_at(0)
            .and_then(|sheet| sheet.row(row_index))
            .expect("Updated row exists");
        Ok(ServerRecord::from_row(row))
    }
}

/// Finds the first row holding a text cell equal to the target after
/// trimming both sides.
///
/// Every cell of every row is examined in row-major then column-major order,
/// not just the server-name column; a matching text value in any column
/// satisfies the search. First match wins.
fn find_row(sheet: &Sheet, target: &str) -> Option<usize> {
    let target = target.trim();
    for (index, row) in sheet.rows() {
        for (_, cell) in row.cells() {
            if let CellValue::Text(value) = &cell.value {
                if value.trim() == target {
                    return Some(index);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::cell::Cell;
    use std::fs;
    use std::path::Path;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn text(value: &str) -> Cell {
        Cell::new(CellValue::Text(value.to_owned()))
    }

    fn proposed(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Header row plus three servers; srv-2 carries an existing comment,
    /// srv-3 has no comment or proposed-date cells at all.
    fn write_fixture(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_sheet("inventory");
        for (column, title) in ["Platform", "Server Name", "Env"].iter().enumerate() {
            sheet.insert(0, column, text(title));
        }
        sheet.insert(1, 0, text("Linux"));
        sheet.insert(1, 1, text("srv-1"));
        sheet.insert(1, 2, text("prod"));
        sheet.insert(1, 8, Cell::new(CellValue::Boolean(true)));
        sheet.insert(1, 12, Cell::new(CellValue::Number(17f64)));
        sheet.insert(2, 0, text("Linux"));
        sheet.insert(2, 1, text("srv-2"));
        sheet.insert(2, 22, text("odd-vendor"));
        sheet.insert(2, 26, text("legacy comment"));
        sheet.insert(3, 0, text("Linux"));
        sheet.insert(3, 1, text("srv-3"));
        workbook.save(path).unwrap();
    }

    fn service_over(path: &Path) -> ReportService {
        ReportService::new(ReportConfig::new(PathBuf::from(path)))
    }

    #[test]
    fn list_skips_header_and_keeps_row_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.xlsx");
        write_fixture(&path);

        let records = service_over(&path).list_all_records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].server_name, "srv-1");
        assert_eq!(records[0].platform, "Linux");
        assert!(records[0].is_primary);
        assert_eq!(records[0].java_version, Some(17));
        assert_eq!(records[1].server_name, "srv-2");
        assert_eq!(records[1].comments, "legacy comment");
        assert_eq!(records[2].server_name, "srv-3");
    }

    #[test]
    fn list_fails_on_missing_file() {
        let dir = tempdir().unwrap();
        let result = service_over(&dir.path().join("absent.xlsx")).list_all_records();
        assert!(matches!(result, Err(FleetSheetError::IoError(_))));
    }

    #[test]
    fn update_sets_comment_and_proposed_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.xlsx");
        write_fixture(&path);
        let service = service_over(&path);

        let record = service
            .update_record("srv-3", "retire after Q3", proposed(2026, 10, 1))
            .unwrap();
        assert_eq!(record.server_name, "srv-3");
        assert_eq!(record.comments, "retire after Q3");
        assert_eq!(record.proposed_date, Some(proposed(2026, 10, 1)));

        // Read back through a fresh open: the rewrite persisted both cells
        let records = service.list_all_records().unwrap();
        let updated = records.iter().find(|r| r.server_name == "srv-3").unwrap();
        assert_eq!(updated.comments, "retire after Q3");
        assert_eq!(updated.proposed_date, Some(proposed(2026, 10, 1)));
    }

    #[test]
    fn update_overwrites_existing_comment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.xlsx");
        write_fixture(&path);
        let service = service_over(&path);

        service.update_record("srv-2", "hello", proposed(2026, 1, 15)).unwrap();
        let records = service.list_all_records().unwrap();
        let updated = records.iter().find(|r| r.server_name == "srv-2").unwrap();
        assert_eq!(updated.comments, "hello");
    }

    #[test]
    fn proposed_date_cell_gets_configured_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.xlsx");
        write_fixture(&path);

        let mut config = ReportConfig::new(path.clone());
        config.date_format = "yyyy-mm-dd".to_owned();
        ReportService::new(config)
            .update_record("srv-1", "x", proposed(2026, 3, 1))
            .unwrap();

        let workbook = Workbook::open(&path).unwrap();
        let cell = workbook.sheet_at(0).and_then(|sheet| sheet.cell(1, COLUMN_PROPOSED_DATE)).unwrap();
        assert_eq!(cell.number_format.as_deref(), Some("yyyy-mm-dd"));
        // Only the proposed-date cell is styled
        let comment = workbook.sheet_at(0).and_then(|sheet| sheet.cell(1, COLUMN_COMMENT)).unwrap();
        assert_eq!(comment.number_format, None);
    }

    #[test]
    fn not_found_names_key_and_leaves_bytes_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.xlsx");
        write_fixture(&path);
        let before = fs::read(&path).unwrap();

        let result = service_over(&path).update_record("no-such-server", "x", proposed(2026, 1, 1));
        match result {
            Err(FleetSheetError::ReportError(ReportError::ServerNotFound(name))) => {
                assert_eq!(name, "no-such-server");
            }
            other => panic!("expected ServerNotFound, got {:?}", other.map(|_| ())),
        }
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn duplicate_key_updates_first_row_in_row_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_sheet("inventory");
        sheet.insert(0, 1, text("Server Name"));
        sheet.insert(1, 1, text("dup"));
        sheet.insert(2, 1, text("dup"));
        workbook.save(&path).unwrap();

        service_over(&path).update_record("dup", "first wins", proposed(2026, 1, 1)).unwrap();

        let records = service_over(&path).list_all_records().unwrap();
        assert_eq!(records[0].comments, "first wins");
        assert_eq!(records[1].comments, "");
    }

    #[test]
    fn match_trims_both_sides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_sheet("inventory");
        sheet.insert(0, 1, text("Server Name"));
        sheet.insert(1, 1, text("  srv-9  "));
        workbook.save(&path).unwrap();
        let service = service_over(&path);

        // Stored value padded, target clean
        service.update_record("srv-9", "trimmed", proposed(2026, 1, 1)).unwrap();
        // Target padded, matching the now-clean read-back
        let record = service.update_record("  srv-9  ", "padded target", proposed(2026, 1, 2)).unwrap();
        assert_eq!(record.comments, "padded target");
    }

    #[test]
    fn locator_scans_every_cell_not_just_the_name_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.xlsx");
        write_fixture(&path);

        // "odd-vendor" only appears in the vendor column of the srv-2 row;
        // the broad scan still locates and mutates that row.
        let record = service_over(&path)
            .update_record("odd-vendor", "matched off-column", proposed(2026, 2, 1))
            .unwrap();
        assert_eq!(record.server_name, "srv-2");
        assert_eq!(record.comments, "matched off-column");
    }

    #[test]
    fn update_fails_on_missing_file() {
        let dir = tempdir().unwrap();
        let result = service_over(&dir.path().join("absent.xlsx"))
            .update_record("srv-1", "x", proposed(2026, 1, 1));
        assert!(matches!(result, Err(FleetSheetError::IoError(_))));
    }
}
