//! Integration tests: config, schema validation, encoding, engine, statuses, pipeline, cache.

mod common;

use common::*;
use finvix_predict::{
    config::ServiceConfig,
    features::{FeatureKind, FeatureRecord, FeatureSchema, SchemaError, CONVERSIONS_FIELD},
    insight::SuggestionError,
    model::{ModelError, ModelKind, ModelSet, Regressor},
    LastInputCache, ModelType, PredictError, Status,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[test]
fn config_load_default() {
    let c = ServiceConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.models.dir, Path::new("models"));
    assert_eq!(c.models.file_name(ModelKind::ActualRoi), "actual_roi_model.onnx");
    assert_eq!(c.batch.max_rows, 10_000);
    assert!(!c.batch.parallel);
    assert!(!c.suggestions.enabled);
    assert_eq!(c.suggestions.request_interval_ms, 1000);
}

#[test]
fn config_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"batch": {"parallel": true}, "log": {"level": "debug"}}"#).unwrap();
    let c = ServiceConfig::load(&path);
    assert!(c.batch.parallel);
    assert_eq!(c.batch.max_rows, 10_000);
    assert_eq!(c.log.level, "debug");
    assert!(c.log.json);
}

#[test]
fn schema_layout() {
    let schema = FeatureSchema::marketing();
    assert_eq!(schema.len(), 13);
    assert_eq!(schema.names().next(), Some("Ad Spend"));
    assert_eq!(schema.names().last(), Some("Seasonality Factor"));
    assert_eq!(schema.categorical().count(), 4);
    assert_eq!(schema.numeric().count(), 9);
    assert_eq!(schema.kind("Region"), Some(FeatureKind::Categorical));
    assert_eq!(schema.kind("Clicks"), Some(FeatureKind::Numeric));
    assert_eq!(schema.vocabulary("Company Size").unwrap(), ["Small".to_string()]);
}

#[test]
fn validate_accepts_scenario_and_normalizes_numbers() {
    let schema = FeatureSchema::marketing();
    let mut values = scenario_values();
    values[1] = json!(" 1000 ");
    let record = schema.record_from_values(&values).unwrap();
    assert_eq!(record.number("Clicks"), Some(1000.0));
    assert!(record.get("Clicks").unwrap().is_number());
    assert_eq!(record.text("Industry"), Some("Retail"));
    let names: Vec<&str> = record.names().collect();
    assert_eq!(names, schema.names().collect::<Vec<_>>());
}

#[test]
fn validate_rejects_wrong_count() {
    let schema = FeatureSchema::marketing();
    let mut values = scenario_values();
    values.pop();
    assert_eq!(
        schema.record_from_values(&values).unwrap_err(),
        SchemaError::FeatureCount {
            expected: 13,
            got: 12
        }
    );
}

#[test]
fn validate_rejects_unseen_category() {
    let schema = FeatureSchema::marketing();
    let mut values = scenario_values();
    values[8] = json!("TV Ads");
    assert_eq!(
        schema.record_from_values(&values).unwrap_err(),
        SchemaError::InvalidCategory {
            feature: "Campaign Type".into(),
            value: "TV Ads".into()
        }
    );
}

#[test]
fn validate_rejects_non_numeric() {
    let schema = FeatureSchema::marketing();
    let mut values = scenario_values();
    values[5] = json!("cheap");
    assert_eq!(
        schema.record_from_values(&values).unwrap_err(),
        SchemaError::InvalidNumeric {
            feature: "Cost Per Click (CPC)".into()
        }
    );
}

#[test]
fn validate_checks_categories_before_numbers() {
    let schema = FeatureSchema::marketing();
    let mut values = scenario_values();
    values[0] = json!("lots");
    values[9] = json!("Antarctica");
    assert!(matches!(
        schema.record_from_values(&values),
        Err(SchemaError::InvalidCategory { feature, .. }) if feature == "Region"
    ));
}

#[test]
fn validate_named_record_reports_missing_and_unknown() {
    let schema = FeatureSchema::marketing();
    let mut record = scenario_record();
    record.insert("Budget Owner", "ops");
    assert_eq!(
        schema.validate(&record).unwrap_err(),
        SchemaError::UnknownFeature("Budget Owner".into())
    );

    let full = scenario_record();
    let partial = FeatureRecord::from_pairs(
        full.iter()
            .filter(|(name, _)| *name != "Region" && *name != "Industry")
            .map(|(name, value)| (name, value.clone())),
    );
    assert_eq!(
        schema.validate(&partial).unwrap_err(),
        SchemaError::MissingFeature("Region".into())
    );
}

#[test]
fn encoder_uses_trained_order() {
    let engine = engine_with(ModelSet::new());
    let encoded = engine.encoder().encode(&scenario_record());
    // label-encoder order is sorted, not the validation order
    assert_eq!(encoded.get("Campaign Type"), Some(2.0));
    assert_eq!(encoded.get("Region"), Some(2.0));
    assert_eq!(encoded.get("Industry"), Some(3.0));
    assert_eq!(encoded.get("Company Size"), Some(0.0));
    assert_eq!(encoded.get("Ad Spend"), Some(5000.0));
}

#[test]
fn encoder_falls_back_without_failing() {
    let engine = engine_with(ModelSet::new());
    let mut record = scenario_record();
    record.insert("Campaign Type", "TV Ads");
    record.insert("Clicks", "n/a");
    record.insert("Impressions", Value::Null);
    record.insert("Notes", true);
    let encoded = engine.encoder().encode(&record);
    assert_eq!(encoded.get("Campaign Type"), Some(0.0));
    assert_eq!(encoded.get("Clicks"), Some(0.0));
    assert_eq!(encoded.get("Impressions"), Some(0.0));
    assert_eq!(encoded.get("Notes"), Some(0.0));
    assert_eq!(engine.encoder().code("Region", "Europe"), Some(1));
    assert_eq!(engine.encoder().code("Region", "Mars"), Some(0));
    assert_eq!(engine.encoder().code("Clicks", "1"), None);
}

#[test]
fn status_thresholds() {
    assert_eq!(Status::classify(106.0, 100.0), Status::Positive);
    assert_eq!(Status::classify(94.0, 100.0), Status::Negative);
    assert_eq!(Status::classify(100.0, 100.0), Status::Moderate);
    assert_eq!(Status::classify(105.0, 100.0), Status::Moderate);
    assert_eq!(Status::classify(95.0, 100.0), Status::Moderate);
    assert_eq!(Status::classify(-1e9, 0.0), Status::Moderate);
    assert_eq!(Status::classify(1e9, 0.0), Status::Moderate);
    // negative baselines use |actual|
    assert_eq!(Status::classify(-90.0, -100.0), Status::Positive);
    assert_eq!(Status::classify(-110.0, -100.0), Status::Negative);
}

#[test]
fn engine_feeds_columns_in_training_order() {
    let seen: Arc<Mutex<Vec<Vec<f64>>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let capture = move |row: &[f64]| {
        sink.lock().unwrap().push(row.to_vec());
        1.0
    };
    let engine = engine_with(
        ModelSet::new()
            .with(ModelKind::ActualConversions, Arc::new(capture.clone()))
            .with(ModelKind::Roi, Arc::new(capture)),
    );

    let mut record = scenario_record();
    engine.predict_actual_conversions(&record).unwrap();
    record.insert(CONVERSIONS_FIELD, 42.0);
    engine.predict_roi(&record).unwrap();

    let rows = seen.lock().unwrap();
    let expected = vec![
        5000.0, 1000.0, 50000.0, 0.05, 0.02, 5.0, 100.0, 200.0, 2.0, 2.0, 3.0, 0.0, 1.0,
    ];
    assert_eq!(rows[0], expected);
    assert_eq!(rows[1].len(), 14);
    assert_eq!(rows[1][..13], expected[..]);
    assert_eq!(rows[1][13], 42.0);
}

#[test]
fn engine_roi_requires_conversions() {
    let engine = engine_with(stub_models());
    assert!(matches!(
        engine.predict_roi(&scenario_record()),
        Err(PredictError::MissingConversions)
    ));
}

#[test]
fn engine_reports_unavailable_model_only_for_that_kind() {
    let engine = engine_with(
        ModelSet::new().with(ModelKind::Conversions, Arc::new(|row: &[f64]| row[0] / 50.0)),
    );
    let record = scenario_record();
    assert_eq!(engine.predict_conversions(&record).unwrap(), 100.0);
    assert!(matches!(
        engine.predict_actual_roi(&record),
        Err(PredictError::ModelUnavailable {
            model: ModelKind::ActualRoi
        })
    ));
}

struct Broken;

impl Regressor for Broken {
    fn predict(&self, _row: &[f64]) -> Result<f64, ModelError> {
        Err(ModelError::Backend("session closed".into()))
    }
}

#[test]
fn engine_attaches_model_to_inference_errors() {
    let engine = engine_with(ModelSet::new().with(ModelKind::ActualConversions, Arc::new(Broken)));
    let err = engine.predict_actual_conversions(&scenario_record()).unwrap_err();
    assert!(matches!(
        err,
        PredictError::Inference {
            model: ModelKind::ActualConversions,
            ..
        }
    ));
    let message = err.to_string();
    assert!(message.contains("actual_conversions"));
    assert!(message.contains("Campaign Type=Search Ads, Region=North America"));
    assert!(message.contains("session closed"));
}

#[test]
fn scenario_both_has_every_key() {
    let predictor = predictor_with(stub_models());
    let result = predictor
        .predict_values(&scenario_values(), ModelType::Both)
        .unwrap();
    assert_eq!(result.conversions, Some(100.0));
    assert_eq!(result.actual_conversions, Some(90.0));
    assert_eq!(result.conversions_status, Some(Status::Positive));
    assert_eq!(result.roi, Some(10.0));
    assert_eq!(result.actual_roi, Some(12.0));
    assert_eq!(result.roi_status, Some(Status::Negative));

    let json = serde_json::to_value(&result).unwrap();
    for key in [
        "conversions",
        "roi",
        "actual_conversions",
        "actual_roi",
        "conversions_status",
        "roi_status",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["conversions_status"], "positive");
    assert_eq!(json["roi_status"], "negative");
    assert!(json.get("conversions_suggestions").is_none());
}

#[test]
fn roi_only_omits_conversion_fields() {
    let predictor = predictor_with(stub_models());
    let result = predictor
        .predict_values(&scenario_values(), ModelType::Roi)
        .unwrap();
    assert_eq!(result.roi, Some(10.0));
    assert_eq!(result.conversions, None);
    assert_eq!(result.actual_conversions, None);
    assert_eq!(result.conversions_status, None);
}

#[test]
fn conversions_only_does_not_need_roi_models() {
    let models = ModelSet::new()
        .with(ModelKind::Conversions, Arc::new(|_: &[f64]| 50.0))
        .with(ModelKind::ActualConversions, Arc::new(|_: &[f64]| 50.0));
    let predictor = predictor_with(models);
    let result = predictor
        .predict_values(&scenario_values(), ModelType::Conversions)
        .unwrap();
    assert_eq!(result.conversions_status, Some(Status::Moderate));
    assert_eq!(result.roi, None);

    let err = predictor
        .predict_values(&scenario_values(), ModelType::Both)
        .unwrap_err();
    assert!(matches!(
        err,
        PredictError::ModelUnavailable {
            model: ModelKind::Roi
        }
    ));
}

#[test]
fn api_path_rejects_unknown_category_before_models_run() {
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    let models = ModelSet::new().with(
        ModelKind::Conversions,
        Arc::new(move |_: &[f64]| {
            *counter.lock().unwrap() += 1;
            1.0
        }),
    );
    let predictor = predictor_with(models);
    let mut values = scenario_values();
    values[8] = json!("TV Ads");
    let err = predictor
        .predict_values(&values, ModelType::Conversions)
        .unwrap_err();
    assert!(matches!(err, PredictError::Schema(SchemaError::InvalidCategory { .. })));
    assert_eq!(*calls.lock().unwrap(), 0);
    assert!(predictor.cache().latest().is_none());
}

#[test]
fn model_type_parsing() {
    assert_eq!("conversions".parse::<ModelType>().unwrap(), ModelType::Conversions);
    assert_eq!("roi".parse::<ModelType>().unwrap(), ModelType::Roi);
    assert_eq!("both".parse::<ModelType>().unwrap(), ModelType::Both);
    assert!(matches!(
        "ROI".parse::<ModelType>(),
        Err(PredictError::InvalidModelType(s)) if s == "ROI"
    ));
    assert_eq!(ModelType::default(), ModelType::Both);
}

#[test]
fn cache_tracks_last_input() {
    let schema = FeatureSchema::marketing();
    let cache = LastInputCache::new();
    assert_eq!(*cache.seed(&schema), schema.default_record());

    let predictor = predictor_with(stub_models());
    let mut values = scenario_values();
    values[0] = json!(7500);
    predictor.predict_values(&values, ModelType::Both).unwrap();
    let latest = predictor.cache().latest().unwrap();
    assert_eq!(latest.number("Ad Spend"), Some(7500.0));

    let previous = cache.store(scenario_record());
    assert!(previous.is_none());
    let previous = cache.store(FeatureRecord::new());
    assert_eq!(previous.unwrap().len(), 13);
    cache.clear();
    assert!(cache.latest().is_none());
}

#[test]
fn concurrent_predictions_share_engine() {
    let predictor = Arc::new(predictor_with(stub_models()));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let p = Arc::clone(&predictor);
            std::thread::spawn(move || {
                let mut values = scenario_values();
                values[0] = json!(1000 * (i + 1));
                p.predict_values(&values, ModelType::Both).unwrap()
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let result = h.join().unwrap();
        assert_eq!(result.conversions, Some(20.0 * (i + 1) as f64));
    }
}

#[test]
fn suggestions_follow_status() {
    let prompts: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&prompts);
    let source = move |prompt: &str| -> Result<String, SuggestionError> {
        sink.lock().unwrap().push(prompt.to_string());
        Ok("Raise bids on top keywords.\nTest new creatives.".to_string())
    };
    let predictor = predictor_with(stub_models()).with_suggestions(Arc::new(source));
    let result = predictor
        .predict_values(&scenario_values(), ModelType::Both)
        .unwrap();
    assert!(result.conversions_suggestions.is_some());
    assert!(result.roi_suggestions.is_some());

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Predicted conversions of 100.00 exceeds actual conversions of 90.00"));
    assert!(prompts[0].contains("Search Ads campaign in North America targeting the Retail industry"));
    assert!(prompts[0].contains("Ad Spend=5000.00"));
    assert!(prompts[1].contains("Predicted ROI of 10.00 is below actual ROI of 12.00"));
    assert!(prompts[1].contains("strategies to improve ROI"));
}

#[test]
fn suggestion_failure_keeps_prediction() {
    let source = |_: &str| -> Result<String, SuggestionError> { Err(SuggestionError::Status(503)) };
    let predictor = predictor_with(stub_models()).with_suggestions(Arc::new(source));
    let result = predictor
        .predict_values(&scenario_values(), ModelType::Conversions)
        .unwrap();
    assert_eq!(result.conversions, Some(100.0));
    let text = result.conversions_suggestions.unwrap();
    assert!(text.starts_with("Unable to fetch suggestions"));
    assert!(text.contains("503"));
    assert!(result.roi_suggestions.is_none());
}
