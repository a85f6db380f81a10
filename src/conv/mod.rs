//! Normalization of query results into flat observations.
//!
//! Whatever shape a query returns (instant vector, range matrix or scalar) is turned into a
//! list of [`Observation`]s, one per series, so that alert templates and API handlers can
//! consume results without caring which query produced them. NaN samples are dropped.
mod query_result;

pub use query_result::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::common::decimal::{format_decimal, trim_trailing_zeros};
use crate::common::types::Sample;
use crate::common::{Labels, EMPTY_LABELS_KEY};
use crate::config::{EmptySeriesPolicy, Settings};
use crate::error::ConvError;

const READABLE_VALUE_DIGITS: usize = 5;

/// A single normalized sample of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    key: String,
    labels: Labels,
    timestamp: i64,
    value: f64,
}

impl Observation {
    fn new(labels: Labels, sample: Sample) -> Self {
        Observation {
            key: labels.to_string(),
            labels,
            timestamp: sample.unix_seconds(),
            value: sample.value,
        }
    }

    fn scalar(sample: Sample) -> Self {
        Observation {
            key: EMPTY_LABELS_KEY.to_string(),
            labels: Labels::empty(),
            timestamp: sample.unix_seconds(),
            value: sample.value,
        }
    }

    /// Canonical string form of the label set.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Seconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn readable_value(&self) -> String {
        readable_value(self.value)
    }
}

/// Formats `v` with 5 decimals and strips trailing zeros and a dangling decimal point,
/// e.g. `3.0` renders as `3` and `3.14` as `3.14`.
pub fn readable_value(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf".to_string() } else { "-Inf".to_string() };
    }
    let formatted = format_decimal(v, READABLE_VALUE_DIGITS);
    trim_trailing_zeros(&formatted).to_string()
}

#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    settings: Settings,
}

impl Normalizer {
    pub fn new(settings: Settings) -> Self {
        Normalizer { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Converts a query result into observations, in input order. Never fails: results
    /// without series yield an empty list.
    pub fn convert(&self, result: QueryResult) -> Vec<Observation> {
        match result {
            QueryResult::Empty => vec![],
            QueryResult::Vector(items) => convert_vector(items),
            QueryResult::Matrix(series) => self.convert_matrix(series),
            QueryResult::Scalar(sample) => convert_scalar(sample),
            QueryResult::Unsupported(result_type) => {
                debug!("ignoring query result of unsupported type \"{result_type}\"");
                vec![]
            }
        }
    }

    /// Decodes a Prometheus API `data` object and converts it. Payloads that cannot be
    /// decoded are treated as "no data".
    pub fn convert_json(&self, data: &serde_json::Value) -> Vec<Observation> {
        match QueryResult::from_json(data) {
            Ok(result) => self.convert(result),
            Err(err) => {
                self.report_malformed(&err);
                vec![]
            }
        }
    }

    pub fn convert_json_str(&self, data: &str) -> Vec<Observation> {
        match QueryResult::from_json_str(data) {
            Ok(result) => self.convert(result),
            Err(err) => {
                self.report_malformed(&err);
                vec![]
            }
        }
    }

    // Only the last sample of each series is used. With EmptySeriesPolicy::Abort a series
    // without samples ends the conversion and the observations collected so far are returned.
    fn convert_matrix(&self, series: Vec<RangeSeries>) -> Vec<Observation> {
        let total = series.len();
        let mut result = Vec::with_capacity(total);
        for (i, item) in series.into_iter().enumerate() {
            let Some(last) = item.last().copied() else {
                match self.settings.empty_series_policy {
                    EmptySeriesPolicy::Abort => {
                        warn!(
                            "range series {} has no samples, dropping it and the {} series after it",
                            item.labels,
                            total - i - 1
                        );
                        return result;
                    }
                    EmptySeriesPolicy::Skip => {
                        debug!("skipping range series {} without samples", item.labels);
                        continue;
                    }
                }
            };
            if last.is_nan() {
                continue;
            }
            result.push(Observation::new(item.labels, last));
        }
        result
    }

    fn report_malformed(&self, err: &ConvError) {
        if self.settings.warn_on_malformed {
            warn!("discarding query result: {err}");
        } else {
            debug!("discarding query result: {err}");
        }
    }
}

fn convert_vector(items: Vec<InstantSample>) -> Vec<Observation> {
    items
        .into_iter()
        .filter(|item| !item.sample.is_nan())
        .map(|item| Observation::new(item.labels, item.sample))
        .collect()
}

fn convert_scalar(sample: Sample) -> Vec<Observation> {
    if sample.is_nan() {
        return vec![];
    }
    vec![Observation::scalar(sample)]
}

/// Converts a query result with the default settings.
pub fn convert(result: QueryResult) -> Vec<Observation> {
    Normalizer::default().convert(result)
}

/// Decodes and converts a Prometheus API `data` object with the default settings.
pub fn convert_json(data: &serde_json::Value) -> Vec<Observation> {
    Normalizer::default().convert_json(data)
}
