use std::collections::HashMap;
use gtmpl::Value;
use crate::common::types::Sample;
use crate::common::Labels;
use crate::conv::{convert, InstantSample, QueryResult};
use crate::error::ConvError;
use crate::template::funcs::test_helpers::{expect_bool, expect_f64, expect_string};
use crate::template::{observations_to_value, render, replace_macro_variables, FuncRegistry};

// see also https://github.com/prometheus/prometheus/blob/main/template/template_test.go
#[test]
fn test_template_funcs() {
    fn f(func_name: &str, s: &str, result_expected: &str) {
        let funcs = FuncRegistry::new();
        let flocal = funcs.get(func_name).unwrap();
        let result = expect_string((flocal)(&[Value::String(s.to_string())]).unwrap());
        assert_eq!(result, result_expected,
                   "unexpected result for {func_name}({s}); got\n{result}\nwant\n{result_expected}");
    }

    f("toUpper", "foo", "FOO");
    f("toLower", "FOO", "foo");
    f("escape", "foo/bar baz", "foo%2Fbar%20baz");
    f("toString", "abc", "abc");
    f("humanize", "127087", "127.1k");
    f("humanize1024", "127087", "124.1ki");
    f("humanizeDuration", "42000", "11h 40m 0s");
    f("humanizeDurationInterface", "90", "1m 30s");
    f("humanizePercentage", "0.015", "1.5%");
    f("humanizePercentageH", "12.3456", "12.35%");
    f("humanizeTimestamp", "1679055557", "2023-03-17 12:19:17 +0000 UTC");
    f("timeformat", "1679055557", "2023-03-17 12:19:17");
}

#[test]
fn test_match_func() {
    let funcs = FuncRegistry::new();
    let match_func = funcs.get("match").unwrap();
    let call = |pattern: &str, text: &str| {
        match_func(&[Value::String(pattern.to_string()), Value::String(text.to_string())])
    };
    assert!(call("invalid[regexp", "abc").is_err(), "expecting error on invalid regexp");
    assert!(!expect_bool(call("abc", "def").unwrap()), "unexpected match");
    assert!(expect_bool(call("a.+b", "acsdb").unwrap()), "unexpected mismatch");
}

#[test]
fn test_re_replace_all() {
    let funcs = FuncRegistry::new();
    let func = funcs.get("reReplaceAll").unwrap();
    let args = [
        Value::String("(.*):.*".to_string()),
        Value::String("$1".to_string()),
        Value::String("localhost:9090".to_string()),
    ];
    assert_eq!(expect_string(func(&args).unwrap()), "localhost");
}

#[test]
fn test_contains_and_arithmetic() {
    let funcs = FuncRegistry::new();
    let s = |v: &str| Value::String(v.to_string());

    let contains = funcs.get("contains").unwrap();
    assert!(expect_bool(contains(&[s("disk full"), s("full")]).unwrap()));

    let add = funcs.get("add").unwrap();
    assert_eq!(expect_f64(add(&[s("1.5"), s("2")]).unwrap()), 3.5);
    let sub = funcs.get("sub").unwrap();
    assert_eq!(expect_f64(sub(&[s("5"), s("2")]).unwrap()), 3.0);
    let mul = funcs.get("mul").unwrap();
    assert_eq!(expect_f64(mul(&[s("4"), Value::Bool(true)]).unwrap()), 4.0);
    let div = funcs.get("div").unwrap();
    assert_eq!(expect_f64(div(&[s("9"), s("3")]).unwrap()), 3.0);
    assert!(div(&[s("1"), s("0")]).is_err(), "expecting error on division by zero");
    assert!(add(&[s("1")]).is_err(), "expecting error on wrong arity");
    assert!(add(&[s("one"), s("2")]).is_err(), "expecting error on non-numeric argument");
}

#[test]
fn test_format_decimal_func() {
    let funcs = FuncRegistry::new();
    let func = funcs.get("formatDecimal").unwrap();
    let result = func(&[Value::String("3.14159".to_string()), Value::String("2".to_string())]).unwrap();
    assert_eq!(expect_string(result), "3.14");
}

#[test]
fn test_args_func() {
    let funcs = FuncRegistry::new();
    let func = funcs.get("args").unwrap();
    let result = func(&[Value::String("a".to_string()), Value::Bool(false)]).unwrap();
    let Value::Map(map) = result else {
        panic!("expected a map");
    };
    assert_eq!(map.len(), 2);
    assert_eq!(expect_string(map["arg0"].clone()), "a");
    assert!(!expect_bool(map["arg1"].clone()));
}

#[test]
fn test_registry_defaults_and_overrides() {
    fn shout(_args: &[Value]) -> Result<Value, gtmpl::FuncError> {
        Ok(Value::String("!".to_string()))
    }

    let defaults = FuncRegistry::new();
    for name in [
        "escape", "unescaped", "urlconvert", "timeformat", "timestamp", "args", "reReplaceAll",
        "match", "toUpper", "toLower", "contains", "humanize", "humanize1024", "humanizeDuration",
        "humanizeDurationInterface", "humanizePercentage", "humanizePercentageH", "add", "sub",
        "mul", "div", "now", "toString", "formatDecimal",
    ] {
        assert!(defaults.contains(name), "missing template function {name}");
    }

    let custom = defaults.clone().with_func("toUpper", shout);
    assert_eq!(custom.len(), defaults.len());
    let result = custom.get("toUpper").unwrap()(&[Value::String("x".to_string())]).unwrap();
    assert_eq!(expect_string(result), "!");
    // the original registry is untouched
    let result = defaults.get("toUpper").unwrap()(&[Value::String("x".to_string())]).unwrap();
    assert_eq!(expect_string(result), "X");

    assert!(FuncRegistry::empty().is_empty());
}

fn name_data(name: &str) -> Value {
    let mut data = HashMap::new();
    data.insert("name".to_string(), Value::String(name.to_string()));
    Value::Object(data)
}

#[test]
fn test_replace_macro_variables() {
    let registry = FuncRegistry::new();
    let output = replace_macro_variables(&registry, "mytpl", "Hello {{.name}}!", name_data("John"));
    assert_eq!(output, "Hello John!");

    let output = replace_macro_variables(&registry, "mytpl", "Hello {{ .name | toUpper }}!", name_data("John"));
    assert_eq!(output, "Hello JOHN!");
}

#[test]
fn test_replace_macro_variables_falls_back_on_parse_error() {
    let registry = FuncRegistry::new();
    let text = "Hello {{ .name ";
    assert_eq!(replace_macro_variables(&registry, "broken", text, name_data("John")), text);

    let err = render(&registry, "broken", text, name_data("John")).unwrap_err();
    assert!(matches!(err, ConvError::TemplateParse(ref name, _) if name == "broken"), "{err}");
}

#[test_case::test_case("{{ .name  " ; "open action with trailing spaces")]
#[test_case::test_case("{{ .name" ; "open action")]
#[test_case::test_case("Hello {{ .name }" ; "single closing brace")]
#[test_case::test_case("{{ .name }} and {{ toUpper .name " ; "second action open")]
#[test_case::test_case("{{ .name | default \"x }}" ; "open string")]
fn test_unclosed_actions_fall_back(text: &str) {
    let registry = FuncRegistry::new();
    assert_eq!(replace_macro_variables(&registry, "broken", text, name_data("John")), text);
    let err = render(&registry, "broken", text, name_data("John")).unwrap_err();
    assert!(matches!(err, ConvError::TemplateParse(..)), "{err}");
}

fn html_data(value: &str) -> Value {
    let mut data = HashMap::new();
    data.insert("a".to_string(), Value::String(value.to_string()));
    Value::Object(data)
}

#[test]
fn test_output_is_html_escaped() {
    let registry = FuncRegistry::new();
    let render_a = |text: &str| render(&registry, "html", text, html_data("<b>")).unwrap();

    assert_eq!(render_a("{{.a}}"), "&lt;b&gt;");
    assert_eq!(render_a("{{ .a | toUpper }}"), "&lt;B&gt;");
    assert_eq!(render_a("<i>{{- .a -}}</i>"), "<i>&lt;b&gt;</i>");
    assert_eq!(render_a("{{.a | unescaped}}"), "<b>");
    assert_eq!(render_a("{{ unescaped .a | toUpper }}"), "&lt;B&gt;");
    assert_eq!(render_a("{{ if .a }}{{ unescaped .a }}{{ end }}"), "<b>");
    assert_eq!(render_a("{{ $v := .a }}{{ $v }}"), "&lt;b&gt;");
    assert_eq!(render_a("{{/* comment */}}{{ add 1 2 }}"), "3");

    let url = render(&registry, "url", "{{ .a }} {{ urlconvert .a }}", html_data("/graph?g0=up&g1=down")).unwrap();
    assert_eq!(url, "/graph?g0=up&amp;g1=down /graph?g0=up&g1=down");
}

#[test]
fn test_replace_macro_variables_falls_back_on_exec_error() {
    let registry = FuncRegistry::new();
    let text = r#"{{ div .name "0" }}"#;
    assert_eq!(replace_macro_variables(&registry, "div", text, name_data("10")), text);

    let err = render(&registry, "div", text, name_data("10")).unwrap_err();
    assert!(matches!(err, ConvError::TemplateExecution(ref name, _) if name == "div"), "{err}");
}

#[test]
fn test_render_observation() {
    let observations = convert(QueryResult::Vector(vec![InstantSample {
        labels: Labels::from_pairs(&[("__name__", "node_memory_free"), ("instance", "host-1")]),
        sample: Sample::new(1_679_055_557_000, 127087.0),
    }]));
    assert_eq!(observations.len(), 1);

    let registry = FuncRegistry::new();
    let text = "{{ .labels.instance }} has {{ .value | humanize1024 }}B free ({{ .readable_value }})";
    let output = render(&registry, "annotation", text, &observations[0]).unwrap();
    assert_eq!(output, "host-1 has 124.1kiB free (127087)");

    let output = render(&registry, "key", "{{ .key }}", &observations[0]).unwrap();
    assert_eq!(output, "node_memory_free{instance=&quot;host-1&quot;}");

    let output = render(&registry, "key", "{{ .key | unescaped }}", &observations[0]).unwrap();
    assert_eq!(output, r#"node_memory_free{instance="host-1"}"#);
}

#[test]
fn test_render_observation_list() {
    let observations = convert(QueryResult::Scalar(Sample::new(100_000, 2.5)));
    let mut data = HashMap::new();
    data.insert("results".to_string(), observations_to_value(&observations));

    let registry = FuncRegistry::new();
    let output = render(&registry, "first", "{{ with first .results }}{{ .key }}{{ end }}", Value::Object(data)).unwrap();
    assert_eq!(output, "{}");
}
