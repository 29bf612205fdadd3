//! Batch processing of uploaded campaign tables.
//!
//! The whole table passes the schema gate first; after that every row runs
//! the single-record model chain independently and results keep input order.

mod export;

pub use export::{export_columns, write_results_csv};
#[cfg(feature = "xlsx")]
pub use export::write_results_xlsx;

use crate::config::BatchConfig;
use crate::error::{PredictError, Result};
use crate::features::{FeatureRecord, ModelType};
use crate::predict::{PredictionResult, Predictor};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[cfg(feature = "xlsx")]
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Uploaded table as read from CSV or a workbook: header plus raw cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns = rdr.headers()?.iter().map(str::to_string).collect();
        let rows = rdr
            .records()
            .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;
        Ok(Self { columns, rows })
    }

    /// Read an upload, choosing the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            #[cfg(feature = "xlsx")]
            Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
                Self::from_xlsx_path(path)
            }
            _ => {
                let file = std::fs::File::open(path)?;
                Self::from_reader(file)
            }
        }
    }

    /// First sheet of a workbook: header row, then every non-blank row with
    /// cells rendered as text.
    #[cfg(feature = "xlsx")]
    pub fn from_xlsx_path(path: &Path) -> Result<Self> {
        use calamine::{open_workbook_auto, Data, Reader};

        let spreadsheet = |e: calamine::Error| PredictError::Spreadsheet(e.to_string());
        let mut workbook = open_workbook_auto(path).map_err(spreadsheet)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| PredictError::Spreadsheet("workbook has no sheets".to_string()))?
            .map_err(spreadsheet)?;

        let mut rows = range
            .rows()
            .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
            .map(|cells| cells.iter().map(|c| c.to_string()).collect::<Vec<String>>());
        let columns = rows.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = rows.collect();
        tracing::debug!(path = %path.display(), rows = rows.len(), "workbook read");
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome for one input row; `row` is the 0-based input position.
#[derive(Debug)]
pub struct BatchRow {
    pub row: usize,
    pub result: std::result::Result<PredictionResult, PredictError>,
}

impl Serialize for BatchRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Line<'a> {
            row: usize,
            #[serde(flatten)]
            result: Option<&'a PredictionResult>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<String>,
        }
        Line {
            row: self.row,
            result: self.result.as_ref().ok(),
            error: self.result.as_ref().err().map(ToString::to_string),
        }
        .serialize(serializer)
    }
}

pub struct BatchProcessor {
    predictor: Arc<Predictor>,
    config: BatchConfig,
    request_interval: Duration,
}

impl BatchProcessor {
    pub fn new(predictor: Arc<Predictor>, config: BatchConfig) -> Self {
        Self {
            predictor,
            config,
            request_interval: Duration::ZERO,
        }
    }

    /// Pause between consecutive suggestion requests.
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// Validate the table, then predict every row.
    pub fn process_batch(&self, table: &RawTable, model_type: ModelType) -> Result<Vec<BatchRow>> {
        if table.is_empty() {
            return Err(PredictError::EmptyBatch);
        }
        if table.len() > self.config.max_rows {
            return Err(PredictError::BatchTooLarge {
                rows: table.len(),
                limit: self.config.max_rows,
            });
        }
        let records = self
            .predictor
            .engine()
            .schema()
            .validate_table(&table.columns, &table.rows)?;
        Ok(self.process_records(&records, model_type))
    }

    /// Predict already validated records. A failing row does not affect the others.
    pub fn process_records(
        &self,
        records: &[FeatureRecord],
        model_type: ModelType,
    ) -> Vec<BatchRow> {
        let predictor = &self.predictor;
        let evaluate = |(row, record): (usize, &FeatureRecord)| BatchRow {
            row,
            result: predictor.evaluate(record, model_type),
        };
        let mut rows: Vec<BatchRow> = if self.config.parallel {
            records.par_iter().enumerate().map(evaluate).collect()
        } else {
            records.iter().enumerate().map(evaluate).collect()
        };

        if predictor.has_suggestions() {
            let interval = self.request_interval;
            let mut sent = false;
            let mut pace = || {
                if sent && !interval.is_zero() {
                    std::thread::sleep(interval);
                }
                sent = true;
            };
            for out in rows.iter_mut() {
                let Ok(result) = out.result.as_mut() else {
                    continue;
                };
                predictor.attach_suggestions_paced(
                    result,
                    &records[out.row],
                    model_type,
                    &mut pace,
                );
            }
        }

        let mut failed = 0;
        for r in &rows {
            if let Err(e) = &r.result {
                failed += 1;
                warn!(row = r.row, error = %e, "row prediction failed");
            }
        }
        info!(rows = rows.len(), failed, model_type = %model_type, "batch processed");
        rows
    }
}

/// Successful results, in input order.
pub fn successful(rows: &[BatchRow]) -> Vec<PredictionResult> {
    rows.iter()
        .filter_map(|r| r.result.as_ref().ok().cloned())
        .collect()
}
