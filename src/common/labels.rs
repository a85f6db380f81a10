use std::fmt::{Display, Formatter};
use ahash::AHashMap;
use enquote::enquote;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use crate::common::types::Label;
use crate::common::METRIC_NAME_LABEL;

/// Canonical form of an empty label set, also used as the key of scalar results.
pub const EMPTY_LABELS_KEY: &str = "{}";

/// An immutable label set. Labels are kept sorted by name and names are unique, so two
/// sets holding the same pairs compare equal and render the same canonical string
/// regardless of the order they were built from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Labels {
    labels: Vec<Label>,
}

impl Labels {
    /// Builds a label set from the given labels. If a name occurs more than once the last
    /// occurrence wins.
    pub fn new(labels: Vec<Label>) -> Self {
        let mut labels = labels;
        // stable sort keeps input order among equal names, so the last one survives below
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        let mut deduped: Vec<Label> = Vec::with_capacity(labels.len());
        for label in labels {
            match deduped.last_mut() {
                Some(last) if last.name == label.name => *last = label,
                _ => deduped.push(label),
            }
        }
        Labels { labels: deduped }
    }

    pub fn empty() -> Self {
        Labels::default()
    }

    /// FromMap returns new sorted Labels from the given map.
    pub fn from_map<I, K, V>(map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let labels = map
            .into_iter()
            .map(|(k, v)| Label::new(k, v))
            .collect();
        Labels::new(labels)
    }

    /// Creates new labels from pairs of strings.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Labels::from_map(pairs.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the value for the label with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .ok()
            .map(|i| self.labels[i].value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn metric_name(&self) -> Option<&str> {
        self.get(METRIC_NAME_LABEL)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn to_map(&self) -> AHashMap<String, String> {
        self.labels
            .iter()
            .map(|l| (l.name.clone(), l.value.clone()))
            .collect()
    }
}

/// Renders the set the way Prometheus prints a metric: the metric name, then the remaining
/// labels as `name="value"` pairs sorted and wrapped in braces.
/// E.g. `up{instance="localhost:9090", job="prometheus"}`.
impl Display for Labels {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let metric_name = self.metric_name();
        let mut pairs: Vec<String> = self
            .labels
            .iter()
            .filter(|l| l.name != METRIC_NAME_LABEL)
            .map(|l| format!("{}={}", l.name, enquote('"', &l.value)))
            .collect();

        if pairs.is_empty() {
            return match metric_name {
                Some(name) => write!(f, "{name}"),
                None => write!(f, "{EMPTY_LABELS_KEY}"),
            };
        }
        pairs.sort();
        write!(f, "{}{{{}}}", metric_name.unwrap_or(""), pairs.join(", "))
    }
}

impl FromIterator<Label> for Labels {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        Labels::new(iter.into_iter().collect())
    }
}

impl From<AHashMap<String, String>> for Labels {
    fn from(map: AHashMap<String, String>) -> Self {
        Labels::from_map(map)
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}

impl Serialize for Labels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.labels.len()))?;
        for label in self.labels.iter() {
            map.serialize_entry(&label.name, &label.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Labels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = AHashMap::<String, String>::deserialize(deserializer)?;
        Ok(Labels::from(map))
    }
}
