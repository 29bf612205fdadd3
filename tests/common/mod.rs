//! Shared fixtures: the reference campaign and stub regressors.

#![allow(dead_code)]

use finvix_predict::{
    features::{CategoricalEncoder, FeatureRecord, FeatureSchema},
    model::{ModelKind, ModelSet},
    LastInputCache, PredictionEngine, Predictor,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub const HEADER: &str = "Ad Spend,Clicks,Impressions,Conversion Rate,Click-Through Rate (CTR),Cost Per Click (CPC),Cost Per Conversion,Customer Acquisition Cost (CAC),Campaign Type,Region,Industry,Company Size,Seasonality Factor";

pub fn scenario_values() -> Vec<Value> {
    vec![
        json!(5000),
        json!(1000),
        json!(50000),
        json!(0.05),
        json!(0.02),
        json!(5),
        json!(100),
        json!(200),
        json!("Search Ads"),
        json!("North America"),
        json!("Retail"),
        json!("Small"),
        json!(1.0),
    ]
}

pub fn scenario_record() -> FeatureRecord {
    let schema = FeatureSchema::marketing();
    FeatureRecord::from_pairs(schema.names().map(str::to_string).zip(scenario_values()))
}

pub fn csv_row(ad_spend: &str, campaign: &str) -> String {
    format!("{ad_spend},1000,50000,0.05,0.02,5,100,200,{campaign},North America,Retail,Small,1.0")
}

/// conversions = Ad Spend / 50, actual conversions = 90,
/// roi = Conversions * 0.1 (14th column), actual roi = 12.
pub fn stub_models() -> ModelSet {
    ModelSet::new()
        .with(ModelKind::Conversions, Arc::new(|row: &[f64]| row[0] / 50.0))
        .with(ModelKind::ActualConversions, Arc::new(|_: &[f64]| 90.0))
        .with(ModelKind::Roi, Arc::new(|row: &[f64]| row[13] * 0.1))
        .with(ModelKind::ActualRoi, Arc::new(|_: &[f64]| 12.0))
}

pub fn engine_with(models: ModelSet) -> Arc<PredictionEngine> {
    let schema = Arc::new(FeatureSchema::marketing());
    let encoder = CategoricalEncoder::new(schema.sorted_vocabularies());
    Arc::new(PredictionEngine::new(schema, encoder, models))
}

pub fn predictor_with(models: ModelSet) -> Predictor {
    Predictor::new(engine_with(models), Arc::new(LastInputCache::new()))
}
