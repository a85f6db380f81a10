use std::fmt::Display;
use std::str::FromStr;
use ahash::AHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::common::time::seconds_to_timestamp;
use crate::common::types::{Sample, Timestamp};
use crate::common::Labels;
use crate::error::{ConvError, ConvResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Matrix,
    Vector,
    Scalar,
    String,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Matrix => "matrix",
            ResultType::Vector => "vector",
            ResultType::Scalar => "scalar",
            ResultType::String => "string",
        }
    }
}

impl Display for ResultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResultType {
    type Err = ConvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matrix" => Ok(ResultType::Matrix),
            "vector" => Ok(ResultType::Vector),
            "scalar" => Ok(ResultType::Scalar),
            "string" => Ok(ResultType::String),
            _ => Err(ConvError::UnsupportedResultType(s.to_string())),
        }
    }
}

/// A series of an instant vector: one sample at the evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantSample {
    pub labels: Labels,
    pub sample: Sample,
}

impl InstantSample {
    pub fn new(labels: Labels, timestamp: Timestamp, value: f64) -> Self {
        InstantSample {
            labels,
            sample: Sample::new(timestamp, value),
        }
    }
}

/// A series of a range matrix. Samples are ordered by time.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSeries {
    pub labels: Labels,
    pub samples: Vec<Sample>,
}

impl RangeSeries {
    pub fn new(labels: Labels, samples: Vec<Sample>) -> Self {
        RangeSeries { labels, samples }
    }

    /// The most recent sample, if any.
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// The output of a query engine evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QueryResult {
    /// No data, e.g. a null result.
    #[default]
    Empty,
    Vector(Vec<InstantSample>),
    Matrix(Vec<RangeSeries>),
    Scalar(Sample),
    /// A result of a type that carries no series, e.g. `string`.
    Unsupported(ResultType),
}

impl QueryResult {
    pub fn result_type(&self) -> Option<ResultType> {
        match self {
            QueryResult::Empty => None,
            QueryResult::Vector(_) => Some(ResultType::Vector),
            QueryResult::Matrix(_) => Some(ResultType::Matrix),
            QueryResult::Scalar(_) => Some(ResultType::Scalar),
            QueryResult::Unsupported(result_type) => Some(*result_type),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            QueryResult::Empty | QueryResult::Unsupported(_) => true,
            QueryResult::Vector(items) => items.is_empty(),
            QueryResult::Matrix(series) => series.is_empty(),
            QueryResult::Scalar(_) => false,
        }
    }

    /// Decodes the `data` object of a Prometheus HTTP API query response
    /// https://prometheus.io/docs/prometheus/latest/querying/api/#expression-query-result-formats
    /// ``` json
    /// {
    ///     "resultType" : "vector",
    ///     "result" : [
    ///         {
    ///             "metric" : { "__name__" : "up", "job" : "prometheus" },
    ///             "value" : [ 1435781451.781, "1" ]
    ///         }
    ///     ]
    /// }
    /// ```
    /// A `result` that does not have the shape its `resultType` declares is rejected with
    /// `ConvError::MalformedPayload`.
    pub fn from_json(data: &serde_json::Value) -> ConvResult<QueryResult> {
        let data = QueryData::deserialize(data)
            .map_err(|e| ConvError::MalformedPayload("query result".to_string(), e.to_string()))?;
        let result_type: ResultType = data.result_type.parse()?;
        if data.result.is_null() {
            return Ok(QueryResult::Empty);
        }

        match result_type {
            ResultType::Vector => {
                let items: Vec<VectorItem> = decode_payload(result_type, data.result)?;
                let samples = items
                    .into_iter()
                    .map(|item| {
                        Ok(InstantSample {
                            labels: Labels::from(item.metric),
                            sample: parse_sample_pair(&item.value)?,
                        })
                    })
                    .collect::<ConvResult<Vec<_>>>()?;
                Ok(QueryResult::Vector(samples))
            }
            ResultType::Matrix => {
                let items: Vec<MatrixItem> = decode_payload(result_type, data.result)?;
                let series = items
                    .into_iter()
                    .map(|item| {
                        let samples = item
                            .values
                            .iter()
                            .map(parse_sample_pair)
                            .collect::<ConvResult<Vec<_>>>()?;
                        Ok(RangeSeries::new(Labels::from(item.metric), samples))
                    })
                    .collect::<ConvResult<Vec<_>>>()?;
                Ok(QueryResult::Matrix(series))
            }
            ResultType::Scalar => {
                let pair: SamplePair = decode_payload(result_type, data.result)?;
                Ok(QueryResult::Scalar(parse_sample_pair(&pair)?))
            }
            ResultType::String => {
                // validated for shape only, string results carry no series
                let _: SamplePair = decode_payload(result_type, data.result)?;
                Ok(QueryResult::Unsupported(ResultType::String))
            }
        }
    }

    pub fn from_json_str(s: &str) -> ConvResult<QueryResult> {
        let data: serde_json::Value = serde_json::from_str(s)?;
        QueryResult::from_json(&data)
    }
}

/// `[ <unix_time>, "<sample_value>" ]`
type SamplePair = (f64, String);

#[derive(Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Deserialize)]
struct VectorItem {
    #[serde(default)]
    metric: AHashMap<String, String>,
    value: SamplePair,
}

#[derive(Deserialize)]
struct MatrixItem {
    #[serde(default)]
    metric: AHashMap<String, String>,
    #[serde(default)]
    values: Vec<SamplePair>,
}

fn decode_payload<T: DeserializeOwned>(result_type: ResultType, result: serde_json::Value) -> ConvResult<T> {
    serde_json::from_value(result)
        .map_err(|e| ConvError::MalformedPayload(result_type.to_string(), e.to_string()))
}

fn parse_sample_pair(pair: &SamplePair) -> ConvResult<Sample> {
    let (secs, value) = pair;
    let timestamp = seconds_to_timestamp(*secs)?;
    let value = parse_sample_value(value)?;
    Ok(Sample::new(timestamp, value))
}

/// Parses a sample value as rendered by Prometheus, including `NaN` and the signed infinities.
pub fn parse_sample_value(s: &str) -> ConvResult<f64> {
    match s {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        _ => s
            .parse::<f64>()
            .map_err(|_| ConvError::InvalidNumber(s.to_string())),
    }
}
