//! XLSX package writer.
//!
//! Serializes a [`Workbook`] into a complete package and overwrites the
//! target file in full. This is the single persistence primitive of the
//! storage layer: there is no incremental patching, the document is always
//! rewritten from the in-memory model.
//!
//! Text cells are written as inline strings, booleans and numbers as plain
//! values, and date cells as serial numbers styled with their format code.
//! The style sheet is regenerated from the date formats actually in use.

use crate::error::FleetSheetError;
use crate::workbook::cell::serial_from_datetime;
use crate::workbook::cell::CellValue;
use crate::workbook::reference::index_to_reference;
use crate::workbook::sheet::Sheet;
use crate::workbook::Workbook;
use quick_xml::escape::escape;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>";
const MAIN_NAMESPACE: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Format applied to date cells that carry no explicit format code.
/// Keeps a date cell recognizable as a date across a rewrite.
const FALLBACK_DATE_FORMAT: &str = "yyyy-mm-dd";

/// Custom number formats start above the built-in format ID range.
const CUSTOM_FORMAT_BASE_ID: usize = 164;

/// Writes the workbook to an XLSX file, truncating any previous content.
///
/// # Arguments
/// * `workbook` - The workbook to serialize
/// * `path` - Target file path
pub(crate) fn write(workbook: &Workbook, path: &Path) -> Result<(), FleetSheetError> {
    let date_formats = collect_date_formats(workbook);

    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);

    zip.start_file("[Content_Types].xml", part_options())?;
    zip.write_all(content_types_part(workbook).as_bytes())?;
    zip.start_file("_rels/.rels", part_options())?;
    zip.write_all(package_relationships_part().as_bytes())?;
    zip.start_file("xl/workbook.xml", part_options())?;
    zip.write_all(workbook_part(workbook).as_bytes())?;
    zip.start_file("xl/_rels/workbook.xml.rels", part_options())?;
    zip.write_all(workbook_relationships_part(workbook).as_bytes())?;
    zip.start_file("xl/styles.xml", part_options())?;
    zip.write_all(styles_part(&date_formats).as_bytes())?;
    for (index, sheet) in workbook.sheets().iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), part_options())?;
        zip.write_all(sheet_part(sheet, &date_formats).as_bytes())?;
    }
    zip.finish()?;
    Ok(())
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
}

/// Collects the distinct date format codes used by the workbook, in first-seen order.
fn collect_date_formats(workbook: &Workbook) -> Vec<String> {
    let mut formats = Vec::<String>::new();
    for sheet in workbook.sheets() {
        for (_, row) in sheet.rows() {
            for (_, cell) in row.cells() {
                if let Some(format) = cell_date_format(&cell.value, &cell.number_format) {
                    if !formats.iter().any(|known| known == format) {
                        formats.push(format.to_owned());
                    }
                }
            }
        }
    }
    formats
}

/// Resolves the format code a cell is styled with, if any.
fn cell_date_format<'a>(value: &CellValue, number_format: &'a Option<String>) -> Option<&'a str> {
    match value {
        CellValue::DateTime(_) => Some(number_format.as_deref().unwrap_or(FALLBACK_DATE_FORMAT)),
        _ => number_format.as_deref(),
    }
}

fn content_types_part(workbook: &Workbook) -> String {
    let mut part = String::new();
    part.push_str(XML_DECLARATION);
    part.push_str("<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">");
    part.push_str("<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>");
    part.push_str("<Default Extension=\"xml\" ContentType=\"application/xml\"/>");
    part.push_str("<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>");
    part.push_str("<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>");
    for index in 0..workbook.sheets().len() {
        part.push_str(&format!(
            "<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
            index + 1
        ));
    }
    part.push_str("</Types>");
    part
}

fn package_relationships_part() -> String {
    format!(
        "{XML_DECLARATION}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
         </Relationships>"
    )
}

fn workbook_part(workbook: &Workbook) -> String {
    let mut part = String::new();
    part.push_str(XML_DECLARATION);
    part.push_str(&format!(
        "<workbook xmlns=\"{MAIN_NAMESPACE}\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">"
    ));
    part.push_str("<sheets>");
    for (index, sheet) in workbook.sheets().iter().enumerate() {
        part.push_str(&format!(
            "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
            escape(sheet.name()),
            index + 1,
            index + 1
        ));
    }
    part.push_str("</sheets></workbook>");
    part
}

fn workbook_relationships_part(workbook: &Workbook) -> String {
    let mut part = String::new();
    part.push_str(XML_DECLARATION);
    part.push_str("<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">");
    for index in 0..workbook.sheets().len() {
        part.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{}.xml\"/>",
            index + 1,
            index + 1
        ));
    }
    part.push_str("</Relationships>");
    part
}

/// Emits a minimal style sheet: one custom number format per date format in
/// use, and one cell format referencing each of them.
fn styles_part(date_formats: &[String]) -> String {
    let mut part = String::new();
    part.push_str(XML_DECLARATION);
    part.push_str(&format!("<styleSheet xmlns=\"{MAIN_NAMESPACE}\">"));
    if !date_formats.is_empty() {
        part.push_str(&format!("<numFmts count=\"{}\">", date_formats.len()));
        for (index, format) in date_formats.iter().enumerate() {
            part.push_str(&format!(
                "<numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                CUSTOM_FORMAT_BASE_ID + index,
                escape(format.as_str())
            ));
        }
        part.push_str("</numFmts>");
    }
    part.push_str("<fonts count=\"1\"><font><sz val=\"11\"/><name val=\"Calibri\"/></font></fonts>");
    part.push_str("<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill><fill><patternFill patternType=\"gray125\"/></fill></fills>");
    part.push_str("<borders count=\"1\"><border/></borders>");
    part.push_str("<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>");
    part.push_str(&format!("<cellXfs count=\"{}\">", date_formats.len() + 1));
    part.push_str("<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>");
    for index in 0..date_formats.len() {
        part.push_str(&format!(
            "<xf numFmtId=\"{}\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyNumberFormat=\"1\"/>",
            CUSTOM_FORMAT_BASE_ID + index
        ));
    }
    part.push_str("</cellXfs></styleSheet>");
    part
}

fn sheet_part(sheet: &Sheet, date_formats: &[String]) -> String {
    let mut part = String::new();
    part.push_str(XML_DECLARATION);
    part.push_str(&format!("<worksheet xmlns=\"{MAIN_NAMESPACE}\"><sheetData>"));
    for (row_index, row) in sheet.rows() {
        part.push_str(&format!("<row r=\"{}\">", row_index + 1));
        for (col_index, cell) in row.cells() {
            let reference = index_to_reference(row_index, col_index);
            let style = cell_date_format(&cell.value, &cell.number_format)
                .and_then(|format| date_formats.iter().position(|known| known == format))
                .map(|position| format!(" s=\"{}\"", position + 1))
                .unwrap_or_default();
            match &cell.value {
                CellValue::Blank => (),
                CellValue::Text(text) => part.push_str(&format!(
                    "<c r=\"{reference}\"{style} t=\"inlineStr\"><is><t>{}</t></is></c>",
                    escape(text.as_str())
                )),
                CellValue::Number(number) => part.push_str(&format!(
                    "<c r=\"{reference}\"{style}><v>{number}</v></c>"
                )),
                CellValue::Boolean(boolean) => part.push_str(&format!(
                    "<c r=\"{reference}\"{style} t=\"b\"><v>{}</v></c>",
                    if *boolean { "1" } else { "0" }
                )),
                CellValue::DateTime(datetime) => part.push_str(&format!(
                    "<c r=\"{reference}\"{style}><v>{}</v></c>",
                    serial_from_datetime(datetime)
                )),
            }
        }
        part.push_str("</row>");
    }
    part.push_str("</sheetData></worksheet>");
    part
}
