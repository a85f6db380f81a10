//! Turns the result of a Prometheus-like query into a flat list of observations, and renders
//! alert templates against them.
//!
//! ```
//! use metrics_conv::common::Labels;
//! use metrics_conv::conv::{convert, InstantSample, QueryResult};
//!
//! let result = QueryResult::Vector(vec![
//!     InstantSample::new(Labels::from_pairs(&[("__name__", "up"), ("job", "node")]), 50_000, 1.0),
//!     InstantSample::new(Labels::from_pairs(&[("__name__", "up"), ("job", "api")]), 50_000, f64::NAN),
//! ]);
//! let observations = convert(result);
//! assert_eq!(observations.len(), 1);
//! assert_eq!(observations[0].key(), r#"up{job="node"}"#);
//! assert_eq!(observations[0].timestamp(), 50);
//! ```
pub mod common;
pub mod config;
pub mod conv;
pub mod error;
pub mod template;

#[cfg(test)]
mod tests;

pub use config::{EmptySeriesPolicy, Settings};
pub use conv::{convert, convert_json, readable_value, Normalizer, Observation, QueryResult};
pub use error::{ConvError, ConvResult};
