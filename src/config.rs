use std::fmt::Display;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{ConvError, ConvResult};

pub const EMPTY_SERIES_POLICY_ENV: &str = "METRICS_CONV_EMPTY_SERIES_POLICY";
pub const WARN_ON_MALFORMED_ENV: &str = "METRICS_CONV_WARN_ON_MALFORMED";

/// What to do when a range series arrives without any samples.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySeriesPolicy {
    /// Stop the conversion and return what was collected so far.
    #[default]
    Abort,
    /// Drop the series and carry on with the next one.
    Skip,
}

impl EmptySeriesPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmptySeriesPolicy::Abort => "abort",
            EmptySeriesPolicy::Skip => "skip",
        }
    }
}

impl Display for EmptySeriesPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmptySeriesPolicy {
    type Err = ConvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(EmptySeriesPolicy::Abort),
            "skip" => Ok(EmptySeriesPolicy::Skip),
            _ => Err(ConvError::InvalidConfiguration(format!(
                "unknown empty series policy \"{s}\", expected \"abort\" or \"skip\""
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Handling of range series without samples. `Abort` truncates the whole conversion at
    /// the first empty series, which is what existing alert templates were written against.
    pub empty_series_policy: EmptySeriesPolicy,

    /// Log a warning when a query result is discarded because its payload does not match
    /// the declared result type. When false the event is logged at debug level.
    pub warn_on_malformed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            empty_series_policy: EmptySeriesPolicy::Abort,
            warn_on_malformed: true,
        }
    }
}

impl Settings {
    /// Default settings overridden by any of the `METRICS_CONV_*` environment variables.
    pub fn from_env() -> ConvResult<Self> {
        let mut settings = Settings::default();
        if let Some(policy) = get_setting_from_env::<EmptySeriesPolicy>(EMPTY_SERIES_POLICY_ENV)? {
            settings.empty_series_policy = policy;
        }
        if let Some(warn) = get_setting_from_env::<bool>(WARN_ON_MALFORMED_ENV)? {
            settings.warn_on_malformed = warn;
        }
        Ok(settings)
    }
}

fn get_setting_from_env<T: FromStr>(name: &str) -> ConvResult<Option<T>>
where
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConvError::InvalidConfiguration(format!("{name}={v}: {e}"))),
        Err(_) => Ok(None),
    }
}
