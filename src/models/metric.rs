// Emitted metric events

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a sink should interpret a metric's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Rate/delta values derived from cumulative counters.
    Counter,
    /// Plain field values, no rate semantics.
    Fields,
}

/// A single numeric field value. Counting fields carry integer deltas,
/// throughput fields carry fractional per-second rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

/// One emitted metric sample: a named field mapping plus tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub kind: MetricKind,
    pub fields: BTreeMap<String, MetricValue>,
    pub tags: BTreeMap<String, String>,
}
