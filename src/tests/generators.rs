use rand::prelude::*;
use crate::common::types::{Sample, Timestamp};
use crate::common::Labels;
use crate::conv::{InstantSample, QueryResult, RangeSeries};

/// GeneratorOptions contains the parameters for generating random query results.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Timestamp of the first sample.
    pub start: Timestamp,
    /// Milliseconds between samples of a series.
    pub interval: i64,
    /// Number of series per result.
    pub series: usize,
    /// Maximum number of samples per range series.
    pub max_samples: usize,
    /// Probability that a sample value is NaN.
    pub nan_ratio: f64,
    /// Seed for random number generator.
    pub seed: u64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            start: 1_679_055_557_000,
            interval: 15_000,
            series: 8,
            max_samples: 6,
            nan_ratio: 0.3,
            seed: 42,
        }
    }
}

pub struct QueryResultGenerator {
    rng: StdRng,
    options: GeneratorOptions,
}

impl QueryResultGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            rng: StdRng::seed_from_u64(options.seed),
            options,
        }
    }

    fn value(&mut self) -> f64 {
        if self.rng.gen_bool(self.options.nan_ratio) {
            f64::NAN
        } else {
            self.rng.gen_range(-1000.0..1000.0)
        }
    }

    fn labels(i: usize) -> Labels {
        let instance = format!("host-{i}:9100");
        Labels::from_pairs(&[("__name__", "node_load1"), ("instance", instance.as_str())])
    }

    pub fn vector(&mut self) -> QueryResult {
        let items = (0..self.options.series)
            .map(|i| {
                let value = self.value();
                InstantSample::new(Self::labels(i), self.options.start, value)
            })
            .collect();
        QueryResult::Vector(items)
    }

    /// Range series always carry at least one sample.
    pub fn matrix(&mut self) -> QueryResult {
        let series = (0..self.options.series)
            .map(|i| {
                let count = self.rng.gen_range(1..=self.options.max_samples.max(1));
                let samples = (0..count)
                    .map(|j| {
                        let ts = self.options.start + j as i64 * self.options.interval;
                        Sample::new(ts, self.value())
                    })
                    .collect();
                RangeSeries::new(Self::labels(i), samples)
            })
            .collect();
        QueryResult::Matrix(series)
    }

    pub fn scalar(&mut self) -> QueryResult {
        let value = self.value();
        QueryResult::Scalar(Sample::new(self.options.start, value))
    }
}
