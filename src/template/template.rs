use std::collections::HashMap;
use gtmpl::{Context, Template, Value};
use tracing::warn;
use crate::common::Labels;
use crate::conv::Observation;
use crate::error::{ConvError, ConvResult};
use crate::template::actions::escape_actions;
use crate::template::funcs::{html_escaper, HTML_ESCAPER};
use crate::template::FuncRegistry;

/// Parses `text` as a template named `name`, with the functions from `registry` available,
/// and executes it against `data`.
///
/// Like an HTML template, the output of every action is HTML-escaped unless it went through
/// `unescaped` or `urlconvert`.
pub fn render<T: Into<Value>>(registry: &FuncRegistry, name: &str, text: &str, data: T) -> ConvResult<String> {
    // unclosed actions are rejected here, the template lexer does not always terminate on them
    let text = escape_actions(text, HTML_ESCAPER)
        .map_err(|e| ConvError::TemplateParse(name.to_string(), e))?;
    let mut tmpl = Template::default();
    registry.install(&mut tmpl);
    tmpl.add_func(HTML_ESCAPER, html_escaper);
    tmpl.parse(text)
        .map_err(|e| ConvError::TemplateParse(name.to_string(), e.to_string()))?;
    let context = Context::from(data);
    tmpl.render(&context)
        .map_err(|e| ConvError::TemplateExecution(name.to_string(), e.to_string()))
}

/// Replaces the `{{ .field }}` macros of `text` with values from `data`.
///
/// Rendering never fails: if the template cannot be parsed or executed the problem is logged
/// and `text` is returned unchanged.
///
/// ```
/// use std::collections::HashMap;
/// use gtmpl::Value;
/// use metrics_conv::template::{replace_macro_variables, FuncRegistry};
///
/// let registry = FuncRegistry::new();
/// let mut data = HashMap::new();
/// data.insert("name".to_string(), Value::String("John".to_string()));
/// let output = replace_macro_variables(&registry, "greeting", "Hello {{.name}}!", Value::Object(data));
/// assert_eq!(output, "Hello John!");
/// ```
pub fn replace_macro_variables<T: Into<Value>>(registry: &FuncRegistry, name: &str, text: &str, data: T) -> String {
    match render(registry, name, text, data) {
        Ok(body) => body,
        Err(err) => {
            warn!("{err}");
            text.to_string()
        }
    }
}

pub(crate) fn labels_to_value(labels: &Labels) -> Value {
    let map: HashMap<String, Value> = labels
        .iter()
        .map(|l| (l.name.clone(), Value::from(l.value.clone())))
        .collect();
    Value::Map(map)
}

impl From<&Observation> for Value {
    fn from(obs: &Observation) -> Self {
        let mut fields = HashMap::with_capacity(5);
        fields.insert("key".to_string(), Value::from(obs.key().to_string()));
        fields.insert("labels".to_string(), labels_to_value(obs.labels()));
        fields.insert("timestamp".to_string(), Value::from(obs.timestamp()));
        fields.insert("value".to_string(), Value::from(obs.value()));
        fields.insert("readable_value".to_string(), Value::from(obs.readable_value()));
        Value::Object(fields)
    }
}

impl From<Observation> for Value {
    fn from(obs: Observation) -> Self {
        Value::from(&obs)
    }
}

/// Template value for a list of observations, e.g. to expose all results of a rule query.
pub fn observations_to_value(observations: &[Observation]) -> Value {
    Value::Array(observations.iter().map(Value::from).collect())
}
