use super::utils::*;
use std::collections::HashSet;
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use bytes::Bytes;
use calamine::{open_workbook_auto, open_workbook_from_rs, Data, Ods, Reader, Xls, Xlsb, Xlsx};
use tracing::{error, info, warn};
use crate::error::SheetError;
use crate::models::{CellValue, Column, SheetData};

/// Anything that can turn a document on disk into typed sheets.
pub trait TableSource {
    fn load(&self, path: &Path) -> Result<Vec<SheetData>, SheetError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkbookFormat {
    Xlsx,
    Xls,
    Xlsb,
    Ods,
}

impl WorkbookFormat {
    /// Resolves a MIME type, a file name or a bare extension.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_lowercase();
        let format = match hint.as_str() {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel.sheet.macroenabled.12" => WorkbookFormat::Xlsx,
            "application/vnd.ms-excel.sheet.binary.macroenabled.12" => WorkbookFormat::Xlsb,
            "application/vnd.ms-excel" => WorkbookFormat::Xls,
            "application/vnd.oasis.opendocument.spreadsheet" => WorkbookFormat::Ods,
            _ => {
                let extension = hint.rsplit_once('.').map_or(hint.as_str(), |(_, ext)| ext);
                match extension {
                    "xlsx" | "xlsm" => WorkbookFormat::Xlsx,
                    "xlsb" => WorkbookFormat::Xlsb,
                    "xls" => WorkbookFormat::Xls,
                    "ods" => WorkbookFormat::Ods,
                    _ => return None,
                }
            }
        };
        Some(format)
    }
}

/// Reads workbooks with calamine. The first row of each sheet is the header.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineSource;

impl TableSource for CalamineSource {
    fn load(&self, path: &Path) -> Result<Vec<SheetData>, SheetError> {
        info!("Opening workbook {}", path.display());
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            error!("Failed to open workbook {}: {}", path.display(), e);
            SheetError::SourceUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;
        read_workbook(&mut workbook)
    }
}

impl CalamineSource {
    pub fn load_bytes(&self, data: Bytes, format: WorkbookFormat) -> Result<Vec<SheetData>, SheetError> {
        info!("Opening {:?} workbook from {} bytes", format, data.len());
        let cursor = Cursor::new(data);
        match format {
            WorkbookFormat::Xlsx => read_workbook(&mut open::<Xlsx<_>, _>(cursor)?),
            WorkbookFormat::Xls => read_workbook(&mut open::<Xls<_>, _>(cursor)?),
            WorkbookFormat::Xlsb => read_workbook(&mut open::<Xlsb<_>, _>(cursor)?),
            WorkbookFormat::Ods => read_workbook(&mut open::<Ods<_>, _>(cursor)?),
        }
    }
}

fn open<R, RS>(reader: RS) -> Result<R, SheetError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    open_workbook_from_rs(reader).map_err(|e| {
        error!("Failed to open workbook: {}", e);
        SheetError::SourceUnavailable(format!("Failed to open workbook: {}", e))
    })
}

fn read_workbook<RS, R>(workbook: &mut R) -> Result<Vec<SheetData>, SheetError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook.worksheet_range(sheet_name).map_err(|e| {
            error!("Failed to read worksheet {}: {}", sheet_name, e);
            SheetError::SourceUnavailable(format!("Failed to read worksheet {}: {}", sheet_name, e))
        })?;
        let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
        if rows.is_empty() {
            warn!("Sheet {} is empty", sheet_name);
        }
        sheets.push(sheet_from_rows(sheet_name, &rows));
    }

    Ok(sheets)
}

/// Splits raw rows into header and records and builds one column per header cell.
pub fn sheet_from_rows(name: &str, rows: &[Vec<Data>]) -> SheetData {
    let Some((header, records)) = rows.split_first() else {
        return SheetData {
            name: name.to_string(),
            columns: Vec::new(),
        };
    };

    let mut existing_names = HashSet::new();
    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let header_text = match cell {
                Data::Empty => String::new(),
                _ => cell.to_string(),
            };
            let values = records
                .iter()
                .map(|row| row.get(idx).map_or(CellValue::Empty, cell_value))
                .collect();
            Column::new(unique_column_name(&header_text, idx, &mut existing_names), values)
        })
        .collect();

    SheetData {
        name: name.to_string(),
        columns,
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if is_na_token(s) => CellValue::Empty,
        Data::String(s) if is_date_string(s) => CellValue::Temporal(s.clone()),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(d) => {
            let serial = d.as_f64();
            CellValue::Temporal(
                excel_serial_to_datetime(serial).map_or_else(|| serial.to_string(), |dt| dt.to_string()),
            )
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Temporal(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn first_row_is_header() {
        let rows = vec![
            vec![text("id"), text("amount"), Data::Empty],
            vec![text("C001"), Data::Float(12.5), Data::Int(1)],
            vec![text("C002"), Data::Empty, Data::Int(2)],
        ];
        let sheet = sheet_from_rows("Customers", &rows);
        assert_eq!(sheet.name, "Customers");
        assert_eq!(sheet.columns.len(), 3);
        assert_eq!(sheet.columns[0].name, "id");
        assert_eq!(sheet.columns[2].name, "Unnamed: 2");
        assert_eq!(
            sheet.columns[1].values,
            vec![CellValue::Number(12.5), CellValue::Empty]
        );
    }

    #[test]
    fn na_tokens_and_error_cells_are_missing() {
        let rows = vec![
            vec![text("v")],
            vec![text("N/A")],
            vec![Data::Error(CellErrorType::NA)],
            vec![text("ok")],
        ];
        let sheet = sheet_from_rows("s", &rows);
        assert_eq!(
            sheet.columns[0].values,
            vec![CellValue::Empty, CellValue::Empty, CellValue::Text("ok".to_string())]
        );
    }

    #[test]
    fn dates_become_temporal() {
        let rows = vec![vec![text("day")], vec![text("2024-03-01")], vec![Data::Bool(true)]];
        let sheet = sheet_from_rows("s", &rows);
        assert_eq!(sheet.columns[0].values[0], CellValue::Temporal("2024-03-01".to_string()));
        assert_eq!(sheet.columns[0].values[1], CellValue::Bool(true));
    }

    #[test]
    fn out_of_range_date_serial_keeps_raw_value() {
        let huge = Data::DateTime(ExcelDateTime::new(-1e300, ExcelDateTimeType::DateTime, false));
        let sheet = sheet_from_rows("s", &[vec![text("when")], vec![huge]]);
        assert!(matches!(sheet.columns[0].values[0], CellValue::Temporal(_)));
    }

    #[test]
    fn header_only_sheet_has_zero_records() {
        let sheet = sheet_from_rows("s", &[vec![text("a"), text("a")]]);
        assert_eq!(sheet.columns.len(), 2);
        assert_eq!(sheet.columns[1].name, "a.1");
        assert!(sheet.columns.iter().all(|c| c.values.is_empty()));
    }

    #[test]
    fn empty_sheet_has_no_columns() {
        assert!(sheet_from_rows("s", &[]).columns.is_empty());
    }

    #[test]
    fn format_hints() {
        assert_eq!(WorkbookFormat::from_hint("xlsx"), Some(WorkbookFormat::Xlsx));
        assert_eq!(
            WorkbookFormat::from_hint("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            Some(WorkbookFormat::Xlsx)
        );
        assert_eq!(WorkbookFormat::from_hint("report.XLS"), Some(WorkbookFormat::Xls));
        assert_eq!(WorkbookFormat::from_hint("data.xlsb"), Some(WorkbookFormat::Xlsb));
        assert_eq!(WorkbookFormat::from_hint("ods"), Some(WorkbookFormat::Ods));
        assert_eq!(WorkbookFormat::from_hint("text/csv"), None);
    }

    #[test]
    fn format_hints_match_whole_extensions_and_mime_types() {
        assert_eq!(
            WorkbookFormat::from_hint("application/vnd.ms-excel.sheet.macroEnabled.12"),
            Some(WorkbookFormat::Xlsx)
        );
        assert_eq!(
            WorkbookFormat::from_hint("application/vnd.ms-excel.sheet.binary.macroEnabled.12"),
            Some(WorkbookFormat::Xlsb)
        );
        assert_eq!(WorkbookFormat::from_hint("application/vnd.ms-excel"), Some(WorkbookFormat::Xls));
        assert_eq!(WorkbookFormat::from_hint("budget.xlsm"), Some(WorkbookFormat::Xlsx));
        assert_eq!(WorkbookFormat::from_hint("goods.csv"), None);
        assert_eq!(WorkbookFormat::from_hint("methods.txt"), None);
        assert_eq!(WorkbookFormat::from_hint("xlsx.backup"), None);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = CalamineSource
            .load(Path::new("/nonexistent/workbook.xlsx"))
            .unwrap_err();
        assert!(matches!(err, SheetError::SourceUnavailable(_)));
    }

    #[test]
    fn corrupt_bytes_are_source_unavailable() {
        let err = CalamineSource
            .load_bytes(Bytes::from_static(b"not a workbook"), WorkbookFormat::Xlsx)
            .unwrap_err();
        assert!(matches!(err, SheetError::SourceUnavailable(_)));
    }
}
