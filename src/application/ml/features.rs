//! Feature matrix construction shared by training and inference.

use super::encoder::{CategoryEncoder, UNSEEN_CATEGORY};
use super::scaler::StandardScaler;
use crate::domain::ml::feature_registry::{
    FeatureKind, FeatureSchema, FeatureSource, FeatureValue, SchemaDescriptor,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One column of a fitted pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

/// Schema, category tables and scaler for one task.
///
/// Fitted once on the training split and persisted with the model, so inference
/// replays the exact same encoding and standardization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    schema: SchemaDescriptor,
    columns: Vec<FeatureColumn>,
    encoders: BTreeMap<String, CategoryEncoder>,
    scaler: StandardScaler,
}

/// Reads a feature, falling back to the column default when absent.
fn raw_value<S: FeatureSource + ?Sized>(source: &S, column: &FeatureColumn) -> FeatureValue {
    source
        .feature(&column.name)
        .unwrap_or_else(|| column.kind.default_value())
}

impl FeaturePipeline {
    pub fn fit<S: FeatureSource>(schema: &FeatureSchema, sources: &[&S]) -> Self {
        let columns: Vec<FeatureColumn> = schema
            .features
            .iter()
            .map(|spec| FeatureColumn {
                name: spec.name.to_string(),
                kind: spec.kind,
            })
            .collect();

        let mut encoders = BTreeMap::new();
        for column in columns
            .iter()
            .filter(|c| c.kind == FeatureKind::Categorical)
        {
            let labels: Vec<String> = sources
                .iter()
                .map(|source| match raw_value(*source, column) {
                    FeatureValue::Category(label) => label,
                    FeatureValue::Number(n) => n.to_string(),
                })
                .collect();
            encoders.insert(
                column.name.clone(),
                CategoryEncoder::fit(labels.iter().map(String::as_str)),
            );
        }

        let mut pipeline = Self {
            schema: schema.descriptor(),
            columns,
            encoders,
            scaler: StandardScaler::default(),
        };
        let encoded: Vec<Vec<f64>> = sources
            .iter()
            .map(|source| pipeline.encode(*source))
            .collect();
        pipeline.scaler = StandardScaler::fit(&encoded);
        pipeline
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn encoder(&self, column: &str) -> Option<&CategoryEncoder> {
        self.encoders.get(column)
    }

    /// Ordered, encoded but unscaled values. Never fails: missing features take
    /// their column default and unseen categories encode to -1.
    pub fn encode<S: FeatureSource + ?Sized>(&self, source: &S) -> Vec<f64> {
        self.columns
            .iter()
            .map(|column| {
                let value = raw_value(source, column);
                match (column.kind, value) {
                    (FeatureKind::Categorical, FeatureValue::Category(label)) => self
                        .encoders
                        .get(&column.name)
                        .map(|encoder| encoder.encode(&label))
                        .unwrap_or(UNSEEN_CATEGORY),
                    (_, FeatureValue::Number(n)) => n,
                    (kind, FeatureValue::Category(text)) => text
                        .parse::<f64>()
                        .ok()
                        .or_else(|| match kind.default_value() {
                            FeatureValue::Number(n) => Some(n),
                            FeatureValue::Category(_) => None,
                        })
                        .unwrap_or(0.0),
                }
            })
            .collect()
    }

    /// Encoded and standardized feature vector.
    pub fn transform<S: FeatureSource + ?Sized>(&self, source: &S) -> Vec<f64> {
        self.scaler.transform_row(&self.encode(source))
    }
}
