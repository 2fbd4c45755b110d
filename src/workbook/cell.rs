use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Timelike;

/// Tagged value carried by one spreadsheet cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Blank,
    /// Text values (inline or shared strings)
    Text(String),
    /// Numeric values
    Number(f64),
    /// Boolean values (true/false)
    Boolean(bool),
    /// Date/time values resolved from serial numbers or ISO strings
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Returns the text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the numeric content, if this is a numeric cell.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the numeric content truncated to an integer, if this is a numeric cell.
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number().map(|value| value.trunc() as i64)
    }

    /// Returns the boolean content, if this is a boolean cell.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the date/time content, if this is a date cell.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the calendar-date content, if this is a date cell.
    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_datetime().map(|datetime| datetime.date())
    }
}

/// A single cell: a tagged value plus an optional number format code.
/// The format code is what the writer uses to style the cell; only date
/// formats are carried through a rewrite.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub number_format: Option<String>,
}

impl Cell {
    /// Creates an unstyled cell holding the given value.
    pub fn new(value: CellValue) -> Cell {
        Cell {
            value,
            number_format: None,
        }
    }
}

/// Base date of the Excel 1900 serial number system.
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal")
}

/// Converts an Excel serial number to a date/time.
/// Returns None when the serial falls outside the representable range.
pub(crate) fn datetime_from_serial(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    let days = serial.trunc() as i64;
    let days = if is_1904 {
        days + 1_462 // Convert from the 1904 epoch
    } else if days < 60 {
        days + 1 // Handle Lotus 1-2-3 leap year bug
    } else {
        days
    };
    let date = excel_epoch().checked_add_signed(Duration::days(days))?;
    let microseconds = (serial.fract() * 86_400_000_000f64).round() as i64;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::microseconds(microseconds))
}

/// Converts a date/time to an Excel serial number in the 1900 date system.
pub(crate) fn serial_from_datetime(datetime: &NaiveDateTime) -> f64 {
    let days = (datetime.date() - excel_epoch()).num_days();
    let days = if days < 61 { days - 1 } else { days }; // Inverse of the leap year shift
    let seconds = datetime.num_seconds_from_midnight() as f64;
    days as f64 + seconds / 86_400f64
}

/// Returns the format code of a built-in date or time number format ID.
pub(crate) fn builtin_date_format_code(id: &str) -> Option<&'static str> {
    match id {
        "14" => Some("mm-dd-yy"),
        "15" => Some("d-mmm-yy"),
        "16" => Some("d-mmm"),
        "17" => Some("mmm-yy"),
        "18" => Some("h:mm AM/PM"),
        "19" => Some("h:mm:ss AM/PM"),
        "20" => Some("h:mm"),
        "21" => Some("h:mm:ss"),
        "22" => Some("m/d/yy h:mm"),
        "45" => Some("mm:ss"),
        "46" => Some("[h]:mm:ss"),
        "47" => Some("mmss.0"),
        _ => None,
    }
}

/// Scans a custom number format code for date or time pattern characters,
/// skipping escape sequences, quoted literals, and bracketed sections.
pub(crate) fn format_code_is_date(format: &str) -> bool {
    let mut is_escaped = false;
    let mut is_literal = false;
    let mut is_color = false;
    let mut is_date = false;
    let mut is_time = false;
    for character in format.chars() {
        match character {
            _ if is_escaped => is_escaped = false,
            '_' | '\\' if !is_escaped => is_escaped = true,

            '"' if is_literal => is_literal = false,
            '"' if !is_literal && !is_color => is_literal = true,

            ']' if is_color => is_color = false,
            '[' if !is_color && !is_literal => is_color = true,
            _ if is_literal || is_color => (),

            'Y' | 'y' | 'D' | 'd' => is_date = true,
            'H' | 'h' | 'S' | 's' => is_time = true,
            _ => (),
        }
    }
    is_date || is_time
}
