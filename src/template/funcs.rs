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

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};
use gtmpl::{Func, FuncError, Template, Value};
use gtmpl_value::Number;
use htmlescape::encode_minimal;
use regex::Regex;
use crate::common::time::{current_time_seconds, format_now, format_unix_seconds, DEFAULT_TIME_FORMAT};
use crate::common::{decimal, humanize as hz};

/// An immutable table of template helper functions, keyed by the name templates call them by.
/// Build it once and share it by reference with every render.
#[derive(Clone)]
pub struct FuncRegistry {
    funcs: BTreeMap<String, Func>,
}

impl Debug for FuncRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

impl Default for FuncRegistry {
    fn default() -> Self {
        FuncRegistry::new()
    }
}

impl FuncRegistry {
    /// Registry holding the default helper set.
    // See https://prometheus.io/docs/prometheus/latest/configuration/template_reference/
    pub fn new() -> Self {
        let defaults: [(&str, Func); 27] = [
            /* Strings */
            ("toUpper", to_upper),
            ("toLower", to_lower),
            ("contains", contains),
            ("match", regex_match),
            ("reReplaceAll", re_replace_all),
            ("toString", to_string),
            /* URLs */
            ("escape", path_escape),
            ("unescaped", unescaped),
            ("urlconvert", urlconvert),
            /* Numbers */
            ("humanize", humanize),
            ("humanize1024", humanize1024),
            ("humanizeDuration", humanize_duration),
            ("humanizeDurationInterface", humanize_duration),
            ("humanizePercentage", humanize_percentage),
            ("humanizePercentageH", humanize_percentage_h),
            ("formatDecimal", format_decimal),
            ("add", add),
            ("sub", sub),
            ("mul", mul),
            ("div", div),
            /* Time */
            ("humanizeTimestamp", humanize_timestamp),
            ("timeformat", time_format),
            ("timestamp", timestamp),
            ("now", now),
            /* Helpers */
            ("args", args),
            ("first", first),
            ("default", default_value),
        ];
        let funcs = defaults
            .into_iter()
            .map(|(name, f)| (name.to_string(), f))
            .collect();
        FuncRegistry { funcs }
    }

    pub fn empty() -> Self {
        FuncRegistry {
            funcs: BTreeMap::new(),
        }
    }

    /// Returns a registry with `func` registered under `name`, replacing any previous entry.
    pub fn with_func<S: Into<String>>(mut self, name: S, func: Func) -> Self {
        self.funcs.insert(name.into(), func);
        self
    }

    pub fn get(&self, name: &str) -> Option<Func> {
        self.funcs.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Makes every registered function callable from `tmpl`.
    pub fn install(&self, tmpl: &mut Template) {
        for (name, func) in self.funcs.iter() {
            tmpl.add_func(name, *func);
        }
    }
}

pub(crate) fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn number_to_string(n: &Number) -> String {
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    n.as_f64().map(|f| f.to_string()).unwrap_or_default()
}

/// Name of the function appended to every printing action so its output is HTML-escaped.
pub(crate) const HTML_ESCAPER: &str = "_html_template_escaper";

const SAFE_CONTENT_KEY: &str = "_html_template_safe";

// Content returned by unescaped/urlconvert travels as a single-entry object so the escaper
// can tell it apart from plain strings.
fn safe_content(s: String) -> Value {
    let mut map = HashMap::with_capacity(1);
    map.insert(SAFE_CONTENT_KEY.to_string(), Value::String(s));
    Value::Object(map)
}

fn as_safe_content(v: &Value) -> Option<&str> {
    match v {
        Value::Object(map) if map.len() == 1 => match map.get(SAFE_CONTENT_KEY) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// Escapes the output of an action the way an HTML template would. Numbers and booleans
/// print as is, content marked safe is written unescaped.
pub(crate) fn html_escaper(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args(HTML_ESCAPER, args, 1)?;
    let v = &args[0];
    if let Some(s) = as_safe_content(v) {
        return Ok(Value::from(s));
    }
    match v {
        Value::String(s) => Ok(Value::from(encode_minimal(s))),
        Value::Array(_) | Value::Map(_) | Value::Object(_) => Ok(Value::from(encode_minimal(&v.to_string()))),
        _ => Ok(v.clone()),
    }
}

pub(crate) fn value_to_string(v: &Value) -> String {
    if let Some(s) = as_safe_content(v) {
        return s.to_string();
    }
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(n),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn exact_args<'a>(name: &str, args: &'a [Value], count: usize) -> Result<&'a [Value], FuncError> {
    if args.len() != count {
        return Err(FuncError::ExactlyXArgs(name.to_string(), count));
    }
    Ok(args)
}

fn f64_arg(name: &str, v: &Value) -> Result<f64, FuncError> {
    value_to_f64(v).ok_or_else(|| {
        FuncError::Generic(format!("{name}: cannot convert \"{}\" to a number", value_to_string(v)))
    })
}

fn str_arg(name: &str, v: &Value) -> Result<String, FuncError> {
    if let Some(s) = as_safe_content(v) {
        return Ok(s.to_string());
    }
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => Ok(value_to_string(v)),
        _ => Err(FuncError::Generic(format!("{name}: expected a string argument"))),
    }
}

fn compile_regex(name: &str, pattern: &str) -> Result<Regex, FuncError> {
    Regex::new(pattern).map_err(|e| FuncError::Generic(format!("{name}: invalid regex {pattern}: {e}")))
}

fn float_fn(name: &str, args: &[Value], f: fn(f64) -> String) -> Result<Value, FuncError> {
    let args = exact_args(name, args, 1)?;
    let v = f64_arg(name, &args[0])?;
    Ok(Value::from(f(v)))
}

fn binary_op(name: &str, args: &[Value], op: fn(f64, f64) -> f64) -> Result<Value, FuncError> {
    let args = exact_args(name, args, 2)?;
    let a = f64_arg(name, &args[0])?;
    let b = f64_arg(name, &args[1])?;
    Ok(Value::from(op(a, b)))
}

// to_upper returns s with all Unicode letters mapped to their upper case.
fn to_upper(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("toUpper", args, 1)?;
    Ok(Value::from(str_arg("toUpper", &args[0])?.to_uppercase()))
}

// to_lower returns s with all Unicode letters mapped to their lower case.
fn to_lower(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("toLower", args, 1)?;
    Ok(Value::from(str_arg("toLower", &args[0])?.to_lowercase()))
}

// contains reports whether substr is within s.
fn contains(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("contains", args, 2)?;
    let s = str_arg("contains", &args[0])?;
    let substr = str_arg("contains", &args[1])?;
    Ok(Value::from(s.contains(substr.as_str())))
}

// match reports whether the string s contains any match of the regular expression pattern.
fn regex_match(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("match", args, 2)?;
    let pattern = str_arg("match", &args[0])?;
    let text = str_arg("match", &args[1])?;
    let re = compile_regex("match", &pattern)?;
    Ok(Value::from(re.is_match(&text)))
}

// re_replace_all returns a copy of text, replacing matches of the pattern with repl.
// Inside repl, $ signs are interpreted as capture group references, so $1 is the first submatch.
fn re_replace_all(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("reReplaceAll", args, 3)?;
    let pattern = str_arg("reReplaceAll", &args[0])?;
    let repl = str_arg("reReplaceAll", &args[1])?;
    let text = str_arg("reReplaceAll", &args[2])?;
    let re = compile_regex("reReplaceAll", &pattern)?;
    Ok(Value::from(re.replace_all(&text, repl.as_str()).into_owned()))
}

fn to_string(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("toString", args, 1)?;
    Ok(Value::from(value_to_string(&args[0])))
}

// escape escapes the string so it can be safely placed inside a URL path segment.
fn path_escape(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("escape", args, 1)?;
    let s = str_arg("escape", &args[0])?;
    Ok(Value::from(urlencoding::encode(&s).into_owned()))
}

// unescaped marks its argument as trusted, so it is printed without HTML escaping.
fn unescaped(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("unescaped", args, 1)?;
    Ok(safe_content(value_to_string(&args[0])))
}

// urlconvert marks a URL as trusted, so query strings keep their `&` separators.
fn urlconvert(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("urlconvert", args, 1)?;
    Ok(safe_content(value_to_string(&args[0])))
}

fn humanize(args: &[Value]) -> Result<Value, FuncError> {
    float_fn("humanize", args, hz::humanize)
}

fn humanize1024(args: &[Value]) -> Result<Value, FuncError> {
    float_fn("humanize1024", args, hz::humanize1024)
}

fn humanize_duration(args: &[Value]) -> Result<Value, FuncError> {
    float_fn("humanizeDuration", args, hz::humanize_duration)
}

fn humanize_percentage(args: &[Value]) -> Result<Value, FuncError> {
    float_fn("humanizePercentage", args, hz::humanize_percentage)
}

fn humanize_percentage_h(args: &[Value]) -> Result<Value, FuncError> {
    float_fn("humanizePercentageH", args, hz::humanize_percentage_h)
}

fn humanize_timestamp(args: &[Value]) -> Result<Value, FuncError> {
    float_fn("humanizeTimestamp", args, hz::humanize_timestamp)
}

// formatDecimal v n renders v with n digits after the decimal point.
fn format_decimal(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("formatDecimal", args, 2)?;
    let v = f64_arg("formatDecimal", &args[0])?;
    let digits = f64_arg("formatDecimal", &args[1])?;
    if digits < 0.0 {
        return Err(FuncError::Generic(format!("formatDecimal: invalid number of digits {digits}")));
    }
    Ok(Value::from(decimal::format_decimal(v, digits as usize)))
}

fn add(args: &[Value]) -> Result<Value, FuncError> {
    binary_op("add", args, |a, b| a + b)
}

fn sub(args: &[Value]) -> Result<Value, FuncError> {
    binary_op("sub", args, |a, b| a - b)
}

fn mul(args: &[Value]) -> Result<Value, FuncError> {
    binary_op("mul", args, |a, b| a * b)
}

fn div(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("div", args, 2)?;
    let a = f64_arg("div", &args[0])?;
    let b = f64_arg("div", &args[1])?;
    if b == 0.0 {
        return Err(FuncError::Generic("div: division by zero".to_string()));
    }
    Ok(Value::from(a / b))
}

fn optional_pattern(name: &str, args: &[Value]) -> Result<String, FuncError> {
    match args.first() {
        Some(v) => str_arg(name, v),
        None => Ok(DEFAULT_TIME_FORMAT.to_string()),
    }
}

// timeformat ts [pattern] formats seconds since the epoch as UTC.
fn time_format(args: &[Value]) -> Result<Value, FuncError> {
    if args.is_empty() || args.len() > 2 {
        return Err(FuncError::Generic("timeformat: expected a timestamp and an optional pattern".to_string()));
    }
    let secs = f64_arg("timeformat", &args[0])?;
    let pattern = optional_pattern("timeformat", &args[1..])?;
    format_unix_seconds(secs, &pattern)
        .map(Value::from)
        .map_err(|e| FuncError::Generic(format!("timeformat: {e}")))
}

// timestamp [pattern] formats the current time as UTC.
fn timestamp(args: &[Value]) -> Result<Value, FuncError> {
    if args.len() > 1 {
        return Err(FuncError::Generic("timestamp: expected at most one pattern".to_string()));
    }
    let pattern = optional_pattern("timestamp", args)?;
    format_now(&pattern)
        .map(Value::from)
        .map_err(|e| FuncError::Generic(format!("timestamp: {e}")))
}

fn now(args: &[Value]) -> Result<Value, FuncError> {
    exact_args("now", args, 0)?;
    Ok(Value::from(current_time_seconds()))
}

// Converts a list of objects to a map with keys arg0, arg1 etc.
// This is intended to allow multiple arguments to be passed to templates.
fn args(args: &[Value]) -> Result<Value, FuncError> {
    let mut result = HashMap::with_capacity(args.len());
    for (i, a) in args.iter().enumerate() {
        result.insert(format!("arg{i}"), a.clone());
    }
    Ok(Value::Map(result))
}

// first returns the first element of a list, usually a list of observations.
fn first(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("first", args, 1)?;
    match &args[0] {
        Value::Array(items) => items
            .first()
            .cloned()
            .ok_or_else(|| FuncError::Generic("first() called on vector with no elements".to_string())),
        _ => Err(FuncError::Generic("first: expected a list argument".to_string())),
    }
}

// default fallback value returns value unless it is empty, in which case fallback is returned.
fn default_value(args: &[Value]) -> Result<Value, FuncError> {
    let args = exact_args("default", args, 2)?;
    let is_empty = match &args[1] {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Map(m) | Value::Object(m) => m.is_empty(),
        Value::Number(_) | Value::Bool(_) => false,
        _ => true,
    };
    if is_empty {
        Ok(args[0].clone())
    } else {
        Ok(args[1].clone())
    }
}
