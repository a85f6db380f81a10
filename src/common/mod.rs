pub mod types;
pub mod labels;
pub(crate) mod decimal;
pub(crate) mod humanize;
pub(crate) mod time;

pub use humanize::*;
pub use labels::*;
pub use types::*;

pub static METRIC_NAME_LABEL: &str = "__name__";
