//! XLSX package reader.
//!
//! Parses the workbook part, worksheet relationships, shared strings, and
//! number formats, then materializes every worksheet into the in-memory
//! [`Workbook`] model. Numeric cells whose style resolves to a date format
//! are decoded into date/time values at parse time.

use crate::error::FleetSheetError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::workbook::cell::builtin_date_format_code;
use crate::workbook::cell::datetime_from_serial;
use crate::workbook::cell::format_code_is_date;
use crate::workbook::cell::Cell;
use crate::workbook::cell::CellValue;
use crate::workbook::reference::reference_to_index;
use crate::workbook::sheet::Sheet;
use crate::workbook::Workbook;
use crate::workbook::WorkbookError;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names of the XLSX parts this reader visits
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content
const TAG_RELATIONSHIP: &[u8] = b"Relationship";      // Package relationship

/// Buffered local file source for the package archive
type PackageReader = BufReader<File>;

/// Cell type tag taken from the `t` attribute of a cell element
#[derive(Copy, Clone, Default, PartialEq)]
enum RawType {
    #[default]
    Number,
    InlineString,
    SharedString,
    Boolean,
    IsoDate,
}

/// Reads a complete workbook from an XLSX file.
///
/// # Arguments
/// * `path` - Path to the XLSX file
///
/// # Returns
/// Result containing the materialized workbook or an error
pub(crate) fn read(path: &Path) -> Result<Workbook, FleetSheetError> {
    let file = BufReader::new(File::open(path)?);
    let mut zip = ZipArchive::new(file)?;

    let relationships = load_relationships(&mut zip, "xl/_rels/workbook.xml.rels")?;
    let (sheet_parts, is_1904) = load_workbook(&mut zip, &relationships)?;
    let date_formats = load_date_formats(&mut zip)?;
    let shared_strings = load_shared_strings(&mut zip)?;

    let mut workbook = Workbook::new();
    for (name, part) in sheet_parts {
        let sheet = workbook.add_sheet(&name);
        read_sheet(&mut zip, &part, sheet, &shared_strings, &date_formats, is_1904)?;
    }
    Ok(workbook)
}

/// Loads worksheet relationships from the package
///
/// # Arguments
/// * `zip` - ZIP archive containing the package
/// * `path` - Path to the relationships XML part
///
/// # Returns
/// Mapping of relationship IDs to worksheet part paths
fn load_relationships(
    zip: &mut ZipArchive<PackageReader>,
    path: &str,
) -> Result<HashMap<String, String>, FleetSheetError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| WorkbookError::MissingPart(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only worksheet relationships name sheet parts
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_part_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Loads the workbook part: sheet names with their part paths, and the date system.
///
/// # Arguments
/// * `zip` - ZIP archive containing the package
/// * `relationships` - Worksheet relationships mapped by ID
///
/// # Returns
/// Tuple of (worksheets, is_1904_date_system) where worksheets are (name, part path) pairs
fn load_workbook(
    zip: &mut ZipArchive<PackageReader>,
    relationships: &HashMap<String, String>,
) -> Result<(Vec<(String, String)>, bool), FleetSheetError> {
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| WorkbookError::MissingPart("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(part) = relationships.get(&id.to_string()) {
                    sheets.push((name.to_string(), part.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads cell formats from the styles part.
///
/// Resolves each cell format index to its number format and keeps the format
/// code for the ones that render as dates or times; every other format maps
/// to None.
fn load_date_formats(
    zip: &mut ZipArchive<PackageReader>,
) -> Result<Vec<Option<String>>, FleetSheetError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats = HashMap::<String, String>::new();
    let mut format_ids = Vec::<String>::new();
    let mut custom_formats_context = false;
    let mut format_indexes_context = false;

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), format.to_string());
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            if let Some(id) = event.get_attribute_value("numFmtId")? {
                format_ids.push(id.to_string());
            }
        }
    });

    Ok(format_ids
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .filter(|code| format_code_is_date(code))
                .cloned()
                .or_else(|| builtin_date_format_code(id).map(str::to_owned))
        })
        .collect())
}

/// Loads the shared string table, if the package has one.
fn load_shared_strings(
    zip: &mut ZipArchive<PackageReader>,
) -> Result<Vec<String>, FleetSheetError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Reads one worksheet part into a sheet.
///
/// Walks the cell elements in document order, tracking positional row and
/// column counters for cells without an explicit reference, and decodes each
/// valued cell into the tagged model.
fn read_sheet(
    zip: &mut ZipArchive<PackageReader>,
    part: &str,
    sheet: &mut Sheet,
    shared_strings: &[String],
    date_formats: &[Option<String>],
    is_1904: bool,
) -> Result<(), FleetSheetError> {
    let mut reader = zip.xml_reader(part)?
        .ok_or_else(|| WorkbookError::MissingPart(part.to_string()))?;

    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = RawType::default();
    let mut format = None::<String>;
    let mut value = String::new();
    let mut has_value = false;
    match_xml_events!(reader => {
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
            col_count = 0;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count += 1;
            kind = event.get_attribute_value("t")?.map(|t| {
                match t.as_ref() {
                    "inlineStr" | "str" => RawType::InlineString,
                    "s" => RawType::SharedString,
                    "b" => RawType::Boolean,
                    "d" => RawType::IsoDate,
                    _ => RawType::Number,
                }
            }).unwrap_or(RawType::Number);
            format = match event.get_attribute_value("s")? {
                Some(index) if !index.is_empty() => {
                    let index = index.parse::<usize>()?;
                    date_formats.get(index).cloned().flatten()
                }
                _ => None,
            };
            value.clear();
            has_value = false;
        }
        Event::Start(event) if event.name() == TAG_INLINE_STRING => {
            value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            has_value = true;
        }
        Event::Start(event) if event.name() == TAG_VALUE => {
            value = read_string_value(&mut reader, TAG_VALUE, true)?;
            has_value = true;
        }
        Event::End(event) if has_value && !value.is_empty() && event.name() == TAG_CELL => {
            sheet.insert(row, col, decode_cell(kind, &value, format.take(), shared_strings, is_1904));
            has_value = false;
        }
    });
    Ok(())
}

/// Decodes one raw cell into the tagged model.
///
/// Decoding is lenient: an unresolvable shared string maps to a blank cell,
/// and an unparseable value falls back to its text form.
fn decode_cell(
    kind: RawType,
    value: &str,
    format: Option<String>,
    shared_strings: &[String],
    is_1904: bool,
) -> Cell {
    let resolved = match kind {
        RawType::InlineString => CellValue::Text(value.to_owned()),
        RawType::SharedString => value.parse::<usize>().ok()
            .and_then(|index| shared_strings.get(index))
            .map(|string| CellValue::Text(string.to_owned()))
            .unwrap_or(CellValue::Blank),
        RawType::Boolean => CellValue::Boolean(value == "1" || value == "true"),
        RawType::IsoDate => parse_iso_datetime(value)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(value.to_owned())),
        RawType::Number => match value.parse::<f64>() {
            Ok(number) if format.is_some() => datetime_from_serial(number, is_1904)
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Number(number)),
            Ok(number) => CellValue::Number(number),
            Err(_) => CellValue::Text(value.to_owned()),
        },
    };
    Cell {
        value: resolved,
        number_format: format,
    }
}

/// Parses an ISO 8601 date or date/time cell value.
fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    if value.contains('T') {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}

/// Reads string content from XML elements, skipping phonetic text annotations
/// and handling text nodes, CDATA sections, and entity references.
///
/// # Arguments
/// * `reader` - XML reader positioned at the start of the string content
/// * `end_tag` - XML tag that marks the end of the string content
/// * `is_text_content` - Whether to treat the content as text by default
///
/// # Returns
/// Extracted string value
fn read_string_value(
    reader: &mut XmlReader<BufReader<ZipFile<'_, PackageReader>>>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, FleetSheetError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

/// Normalizes a relationship target to a package part path.
fn to_part_path(path: Cow<'_, str>) -> String {
    if path.starts_with("/xl/") {
        path[1..].to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_path_normalization() {
        assert_eq!(to_part_path(Cow::from("worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_part_path(Cow::from("xl/worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_part_path(Cow::from("/xl/worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
    }

    #[test]
    fn iso_datetime_parsing() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15)
            .and_then(|date| date.and_hms_opt(0, 0, 0));
        assert_eq!(parse_iso_datetime("2025-06-15"), date);

        let datetime = NaiveDate::from_ymd_opt(2025, 6, 15)
            .and_then(|date| date.and_hms_opt(10, 30, 5));
        assert_eq!(parse_iso_datetime("2025-06-15T10:30:05"), datetime);

        assert_eq!(parse_iso_datetime("not a date"), None);
    }

    #[test]
    fn lenient_cell_decoding() {
        let shared = vec!["srv-1".to_owned()];
        let cell = decode_cell(RawType::SharedString, "0", None, &shared, false);
        assert_eq!(cell.value, CellValue::Text("srv-1".to_owned()));

        // Out-of-range shared string index maps to a blank cell
        let cell = decode_cell(RawType::SharedString, "7", None, &shared, false);
        assert_eq!(cell.value, CellValue::Blank);

        // Unparseable numeric content falls back to text
        let cell = decode_cell(RawType::Number, "n/a", None, &shared, false);
        assert_eq!(cell.value, CellValue::Text("n/a".to_owned()));

        let cell = decode_cell(RawType::Boolean, "1", None, &shared, false);
        assert_eq!(cell.value, CellValue::Boolean(true));
    }

    #[test]
    fn date_cell_decoding() {
        let cell = decode_cell(RawType::Number, "45658", Some("dd/mm/yyyy".to_owned()), &[], false);
        let expected = NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(CellValue::DateTime);
        assert_eq!(Some(cell.value), expected);
        assert_eq!(cell.number_format.as_deref(), Some("dd/mm/yyyy"));

        // Without a date format the same serial stays numeric
        let cell = decode_cell(RawType::Number, "45658", None, &[], false);
        assert_eq!(cell.value, CellValue::Number(45_658f64));
    }
}
