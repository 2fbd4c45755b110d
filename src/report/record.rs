use crate::workbook::sheet::Row;
use chrono::NaiveDate;
use serde::Serialize;

/// Column index of the comment field.
pub const COLUMN_COMMENT: usize = 26;
/// Column index of the proposed remediation date field.
pub const COLUMN_PROPOSED_DATE: usize = 27;

/// One server of the Linux/Java inventory: the structured view of a single
/// sheet row. Fields map 1:1 to the fixed column layout (0-27); every field
/// is independently defaultable, so mapping a row can never fail.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub platform: String,
    pub server_name: String,
    pub env: String,
    pub tc: String,
    pub service: String,
    pub itsi: String,
    pub rtb_manager: String,
    pub rtb_lead: String,
    pub is_primary: bool,
    pub java_location: String,
    pub java_class: String,
    pub file_version: String,
    pub java_version: Option<i64>,
    pub java_type: String,
    pub pbt_ci_name: String,
    pub command_last_executed: Option<NaiveDate>,
    pub dormancy: String,
    pub low_crit_count: Option<i64>,
    pub med_crit_count: Option<i64>,
    pub high_crit_count: Option<i64>,
    pub utility_server: String,
    pub utility_name: String,
    pub vendor: String,
    pub embedded_type: String,
    pub java_class2: String,
    pub suspected_latest_java_version: String,
    pub comments: String,
    pub proposed_date: Option<NaiveDate>,
}

impl ServerRecord {
    /// Maps one sheet row to a record, applying the per-column coercion
    /// rules: a missing cell or a type mismatch yields the field default
    /// (empty string, false, or None) rather than an error.
    pub fn from_row(row: &Row) -> ServerRecord {
        ServerRecord {
            platform: text_value(row, 0),
            server_name: text_value(row, 1),
            env: text_value(row, 2),
            tc: text_value(row, 3),
            service: text_value(row, 4),
            itsi: text_value(row, 5),
            rtb_manager: text_value(row, 6),
            rtb_lead: text_value(row, 7),
            is_primary: boolean_value(row, 8),
            java_location: text_value(row, 9),
            java_class: text_value(row, 10),
            file_version: text_value(row, 11),
            java_version: integer_value(row, 12),
            java_type: text_value(row, 13),
            pbt_ci_name: text_value(row, 14),
            command_last_executed: date_value(row, 15),
            dormancy: text_value(row, 16),
            low_crit_count: integer_value(row, 17),
            med_crit_count: integer_value(row, 18),
            high_crit_count: integer_value(row, 19),
            utility_server: text_value(row, 20),
            utility_name: text_value(row, 21),
            vendor: text_value(row, 22),
            embedded_type: text_value(row, 23),
            java_class2: text_value(row, 24),
            suspected_latest_java_version: text_value(row, 25),
            comments: text_value(row, COLUMN_COMMENT),
            proposed_date: date_value(row, COLUMN_PROPOSED_DATE),
        }
    }
}

fn text_value(row: &Row, column: usize) -> String {
    row.cell(column)
        .and_then(|cell| cell.value.as_text())
        .unwrap_or("")
        .to_owned()
}

fn boolean_value(row: &Row, column: usize) -> bool {
    row.cell(column)
        .and_then(|cell| cell.value.as_boolean())
        .unwrap_or(false)
}

fn integer_value(row: &Row, column: usize) -> Option<i64> {
    row.cell(column).and_then(|cell| cell.value.as_integer())
}

fn date_value(row: &Row, column: usize) -> Option<NaiveDate> {
    row.cell(column).and_then(|cell| cell.value.as_date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::cell::{Cell, CellValue};
    use crate::workbook::sheet::Sheet;
    use chrono::NaiveDate;

    fn datetime_cell(year: i32, month: u32, day: u32) -> Cell {
        let datetime = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap();
        Cell::new(CellValue::DateTime(datetime))
    }

    #[test]
    fn maps_matching_types_exactly() {
        let mut sheet = Sheet::new("inventory");
        sheet.insert(0, 0, Cell::new(CellValue::Text("Linux".to_owned())));
        sheet.insert(0, 1, Cell::new(CellValue::Text("srv-42".to_owned())));
        sheet.insert(0, 2, Cell::new(CellValue::Text("prod".to_owned())));
        sheet.insert(0, 8, Cell::new(CellValue::Boolean(true)));
        sheet.insert(0, 12, Cell::new(CellValue::Number(17f64)));
        sheet.insert(0, 15, datetime_cell(2025, 5, 20));
        sheet.insert(0, 17, Cell::new(CellValue::Number(3.7)));
        sheet.insert(0, 26, Cell::new(CellValue::Text("patched".to_owned())));
        sheet.insert(0, 27, datetime_cell(2025, 9, 1));

        let record = ServerRecord::from_row(sheet.row(0).unwrap());
        assert_eq!(record.platform, "Linux");
        assert_eq!(record.server_name, "srv-42");
        assert_eq!(record.env, "prod");
        assert!(record.is_primary);
        assert_eq!(record.java_version, Some(17));
        assert_eq!(record.command_last_executed, NaiveDate::from_ymd_opt(2025, 5, 20));
        // Fractional counts truncate
        assert_eq!(record.low_crit_count, Some(3));
        assert_eq!(record.comments, "patched");
        assert_eq!(record.proposed_date, NaiveDate::from_ymd_opt(2025, 9, 1));
    }

    #[test]
    fn mismatched_types_map_to_defaults() {
        let mut sheet = Sheet::new("inventory");
        // Number where text is expected
        sheet.insert(0, 0, Cell::new(CellValue::Number(8f64)));
        // Text where boolean is expected
        sheet.insert(0, 8, Cell::new(CellValue::Text("yes".to_owned())));
        // Text where integer is expected
        sheet.insert(0, 12, Cell::new(CellValue::Text("17".to_owned())));
        // Plain number where a date is expected
        sheet.insert(0, 27, Cell::new(CellValue::Number(45_658f64)));

        let record = ServerRecord::from_row(sheet.row(0).unwrap());
        assert_eq!(record.platform, "");
        assert!(!record.is_primary);
        assert_eq!(record.java_version, None);
        assert_eq!(record.proposed_date, None);
    }

    #[test]
    fn empty_row_maps_to_all_defaults() {
        let mut sheet = Sheet::new("inventory");
        let _ = sheet.cell_mut(0, 5);

        let record = ServerRecord::from_row(sheet.row(0).unwrap());
        assert_eq!(record, ServerRecord::default());
    }

    #[test]
    fn serializes_with_original_field_names() {
        let record = ServerRecord {
            server_name: "srv-1".to_owned(),
            is_primary: true,
            proposed_date: NaiveDate::from_ymd_opt(2025, 9, 1),
            ..ServerRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"serverName\":\"srv-1\""));
        assert!(json.contains("\"isPrimary\":true"));
        assert!(json.contains("\"proposedDate\":\"2025-09-01\""));
        assert!(json.contains("\"suspectedLatestJavaVersion\""));
    }
}
