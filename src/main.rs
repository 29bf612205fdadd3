//! finvix-predict entrypoint: single predictions, CSV batch runs and report summaries.
//! Models are loaded once from the configured directory; a missing model only
//! disables the predictions that need it.

use clap::{Parser, Subcommand};
use finvix_predict::{
    batch::{self, BatchProcessor, RawTable},
    cache::LastInputCache,
    config::ServiceConfig,
    features::{FeatureSchema, ModelType},
    insight::GeminiClient,
    logging::StructuredLogger,
    model::ArtifactBundle,
    predict::{PredictionEngine, PredictionResult, Predictor},
    report::ReportSummary,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "finvix-predict", version, about = "Campaign conversions and ROI predictions")]
struct Cli {
    /// Config file; defaults to $FINVIX_CONFIG_PATH, then config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict one campaign from a JSON array of the 13 feature values
    Predict {
        #[arg(long)]
        input: String,
        #[arg(long, default_value = "both")]
        model_type: ModelType,
    },
    /// Predict every row of a CSV or workbook upload
    Batch {
        file: PathBuf,
        #[arg(long, default_value = "both")]
        model_type: ModelType,
        /// Also write the results (`.xlsx` for a workbook, otherwise CSV)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Summarize saved results (a JSON object or an array of objects)
    Report {
        file: PathBuf,
        #[arg(long, default_value = "both")]
        model_type: ModelType,
    },
}

fn build_predictor(config: &ServiceConfig) -> Predictor {
    let schema = Arc::new(FeatureSchema::marketing());
    let bundle = ArtifactBundle::load(&config.models, &schema);
    info!(available = ?bundle.models.available(), "artifacts loaded");
    let engine = Arc::new(PredictionEngine::from_bundle(schema, bundle));
    let predictor = Predictor::new(engine, Arc::new(LastInputCache::new()));
    match GeminiClient::from_config(&config.suggestions) {
        Some(client) => predictor.with_suggestions(Arc::new(client)),
        None => predictor,
    }
}

/// `.xlsx` outputs get a workbook, anything else CSV.
fn write_results(
    path: &Path,
    results: &[PredictionResult],
    model_type: ModelType,
) -> finvix_predict::Result<()> {
    #[cfg(feature = "xlsx")]
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("xlsx")) {
        return batch::write_results_xlsx(path, results, model_type);
    }
    let file = std::fs::File::create(path)?;
    batch::write_results_csv(file, results, model_type)
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("FINVIX_CONFIG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let config = ServiceConfig::load(&config_path).with_env_overrides();

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(config = %config_path.display(), "finvix-predict starting");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Predict { input, model_type } => {
            let values: Vec<Value> = serde_json::from_str(&input)?;
            let predictor = build_predictor(&config);
            let result = predictor.predict_values(&values, model_type)?;
            StructuredLogger::emit_json(&result, &mut out)?;
        }
        Command::Batch {
            file,
            model_type,
            output,
        } => {
            let table = RawTable::from_path(&file)?;
            let predictor = Arc::new(build_predictor(&config));
            let processor = BatchProcessor::new(predictor, config.batch.clone())
                .with_request_interval(Duration::from_millis(
                    config.suggestions.request_interval_ms,
                ));
            let rows = processor.process_batch(&table, model_type)?;
            for row in &rows {
                StructuredLogger::emit_json(row, &mut out)?;
            }
            if let Some(path) = output {
                write_results(&path, &batch::successful(&rows), model_type)?;
                info!(path = %path.display(), "results written");
            }
        }
        Command::Report { file, model_type } => {
            let data = std::fs::read_to_string(&file)?;
            let summary = match serde_json::from_str::<Value>(&data)? {
                Value::Array(items) => {
                    let results = items
                        .into_iter()
                        .map(serde_json::from_value)
                        .collect::<Result<Vec<PredictionResult>, _>>()?;
                    ReportSummary::batch(&results, model_type)?
                }
                other => {
                    let result: PredictionResult = serde_json::from_value(other)?;
                    ReportSummary::single(&result, model_type)?
                }
            };
            StructuredLogger::emit_json(&summary, &mut out)?;
        }
    }

    Ok(())
}
