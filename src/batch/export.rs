//! Results download as CSV or a workbook, columns chosen by model type.

use crate::error::Result;
use crate::features::ModelType;
use crate::predict::PredictionResult;
use std::io::Write;

const CONVERSIONS_COLUMNS: [&str; 4] = [
    "actual_conversions",
    "conversions",
    "conversions_status",
    "conversions_suggestions",
];
const ROI_COLUMNS: [&str; 4] = ["actual_roi", "roi", "roi_status", "roi_suggestions"];

pub fn export_columns(model_type: ModelType) -> Vec<&'static str> {
    let mut cols = Vec::new();
    if model_type.includes_conversions() {
        cols.extend(CONVERSIONS_COLUMNS);
    }
    if model_type.includes_roi() {
        cols.extend(ROI_COLUMNS);
    }
    cols
}

enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    fn into_text(self) -> String {
        match self {
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s,
            Cell::Empty => String::new(),
        }
    }
}

fn cell(result: &PredictionResult, column: &str) -> Cell {
    let num = |v: Option<f64>| v.map_or(Cell::Empty, Cell::Number);
    let text = |v: Option<String>| v.map_or(Cell::Empty, Cell::Text);
    match column {
        "actual_conversions" => num(result.actual_conversions),
        "conversions" => num(result.conversions),
        "conversions_status" => text(result.conversions_status.map(|s| s.to_string())),
        "conversions_suggestions" => text(result.conversions_suggestions.clone()),
        "actual_roi" => num(result.actual_roi),
        "roi" => num(result.roi),
        "roi_status" => text(result.roi_status.map(|s| s.to_string())),
        "roi_suggestions" => text(result.roi_suggestions.clone()),
        _ => Cell::Empty,
    }
}

/// Write `results` as CSV with a header row; absent values become empty cells.
pub fn write_results_csv<W: Write>(
    writer: W,
    results: &[PredictionResult],
    model_type: ModelType,
) -> Result<()> {
    let columns = export_columns(model_type);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&columns)?;
    for result in results {
        wtr.write_record(columns.iter().map(|c| cell(result, c).into_text()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `results` to a single-sheet workbook. Figures are stored as numbers;
/// absent values leave the cell blank.
#[cfg(feature = "xlsx")]
pub fn write_results_xlsx(
    path: &std::path::Path,
    results: &[PredictionResult],
    model_type: ModelType,
) -> Result<()> {
    use crate::error::PredictError;
    use rust_xlsxwriter::{Format, Workbook, XlsxError};

    let spreadsheet = |e: XlsxError| PredictError::Spreadsheet(e.to_string());
    let columns = export_columns(model_type);
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Results").map_err(spreadsheet)?;
    for (col, name) in (0u16..).zip(&columns) {
        worksheet
            .write_string_with_format(0, col, *name, &header_format)
            .map_err(spreadsheet)?;
    }
    for (row, result) in (1u32..).zip(results) {
        for (col, name) in (0u16..).zip(&columns) {
            match cell(result, name) {
                Cell::Number(v) => {
                    worksheet.write_number(row, col, v).map_err(spreadsheet)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s).map_err(spreadsheet)?;
                }
                Cell::Empty => {}
            }
        }
    }

    workbook.save(path).map_err(spreadsheet)?;
    Ok(())
}
