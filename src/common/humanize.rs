// Copyright 2013 The Prometheus Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Number formatting used by alert templates.
// See https://github.com/prometheus/prometheus/blob/main/template/template.go
use crate::common::decimal::format_significant;
use crate::common::time::format_unix_seconds;

const SIGNIFICANT_DIGITS: usize = 4;

const LARGE_PREFIXES: [&str; 8] = ["k", "M", "G", "T", "P", "E", "Z", "Y"];
const BINARY_PREFIXES: [&str; 8] = ["ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi", "Yi"];
const SMALL_PREFIXES: [&str; 8] = ["m", "u", "n", "p", "f", "a", "z", "y"];

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f +0000 UTC";

#[inline]
fn format4(v: f64) -> String {
    format_significant(v, SIGNIFICANT_DIGITS)
}

fn scale_down(v: f64, base: f64, prefixes: &[&'static str]) -> (f64, &'static str) {
    let mut v = v;
    let mut prefix = "";
    for p in prefixes {
        if v.abs() < base {
            break;
        }
        prefix = *p;
        v /= base;
    }
    (v, prefix)
}

fn scale_up(v: f64) -> (f64, &'static str) {
    let mut v = v;
    let mut prefix = "";
    for p in SMALL_PREFIXES {
        if v.abs() >= 1.0 {
            break;
        }
        prefix = p;
        v *= 1000.0;
    }
    (v, prefix)
}

/// Converts the given number to a human-readable format by adding metric prefixes
/// https://en.wikipedia.org/wiki/Metric_prefix
pub fn humanize(v: f64) -> String {
    if v == 0.0 || v.is_nan() || v.is_infinite() {
        return format4(v);
    }
    let (v, prefix) = if v.abs() >= 1.0 {
        scale_down(v, 1000.0, &LARGE_PREFIXES)
    } else {
        scale_up(v)
    };
    format!("{}{prefix}", format4(v))
}

/// Converts the given number to a human-readable format with 1024 as base.
pub fn humanize1024(v: f64) -> String {
    if v.abs() <= 1.0 || v.is_nan() || v.is_infinite() {
        return format4(v);
    }
    let (v, prefix) = scale_down(v, 1024.0, &BINARY_PREFIXES);
    format!("{}{prefix}", format4(v))
}

/// Converts the given number of seconds to a human-readable duration, e.g. `11h 40m 0s`.
pub fn humanize_duration(v: f64) -> String {
    if v.is_nan() || v.is_infinite() {
        return format4(v);
    }
    if v == 0.0 {
        return format!("{}s", format4(v));
    }
    if v.abs() >= 1.0 {
        let sign = if v < 0.0 { "-" } else { "" };
        let v = v.abs();
        let duration = v as i64;
        let seconds = duration % 60;
        let minutes = (duration / 60) % 60;
        let hours = (duration / 60 / 60) % 24;
        let days = duration / 60 / 60 / 24;
        // For days to minutes, we display seconds as an integer.
        if days != 0 {
            return format!("{sign}{days}d {hours}h {minutes}m {seconds}s");
        }
        if hours != 0 {
            return format!("{sign}{hours}h {minutes}m {seconds}s");
        }
        if minutes != 0 {
            return format!("{sign}{minutes}m {seconds}s");
        }
        // For seconds, we display 4 significant digits.
        return format!("{sign}{}s", format4(v));
    }
    let (v, prefix) = scale_up(v);
    format!("{}{prefix}s", format4(v))
}

/// Converts the given ratio to a percentage, e.g. `0.8` to `80%`.
pub fn humanize_percentage(v: f64) -> String {
    format!("{}%", format4(v * 100.0))
}

/// Formats a value that is already expressed in percent with two decimals.
pub fn humanize_percentage_h(v: f64) -> String {
    format!("{:.2}%", v)
}

/// Converts the given number of seconds since the epoch to a UTC time string.
pub fn humanize_timestamp(v: f64) -> String {
    if v.is_nan() || v.is_infinite() {
        return format4(v);
    }
    format_unix_seconds(v, DEFAULT_TIMESTAMP_FORMAT).unwrap_or_else(|_| format4(v))
}
