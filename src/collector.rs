// One collection cycle: visibility policy, snapshot fills, metric emission.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::config::CollectorConfig;
use crate::error::GatherError;
use crate::filter::InterfaceFilter;
use crate::models::{InterfaceInfo, Metric, MetricKind, MetricValue};
use crate::source::NetIoSource;
use crate::status::StatusRegistry;

/// Sink for emitted metric samples. Counter-style emission tells the sink the
/// fields are rates/deltas; plain fields carry no such semantics.
pub trait Accumulator {
    fn add_counter(
        &mut self,
        name: &str,
        fields: BTreeMap<String, MetricValue>,
        tags: BTreeMap<String, String>,
    );

    fn add_fields(
        &mut self,
        name: &str,
        fields: BTreeMap<String, MetricValue>,
        tags: BTreeMap<String, String>,
    );
}

/// Buffering accumulator; the worker drains it after each cycle. Also the
/// natural sink for tests.
#[derive(Debug, Default)]
pub struct MetricBuffer {
    pub metrics: Vec<Metric>,
}

impl MetricBuffer {
    fn push(
        &mut self,
        kind: MetricKind,
        name: &str,
        fields: BTreeMap<String, MetricValue>,
        tags: BTreeMap<String, String>,
    ) {
        self.metrics.push(Metric {
            name: name.to_string(),
            kind,
            fields,
            tags,
        });
    }
}

impl Accumulator for MetricBuffer {
    fn add_counter(
        &mut self,
        name: &str,
        fields: BTreeMap<String, MetricValue>,
        tags: BTreeMap<String, String>,
    ) {
        self.push(MetricKind::Counter, name, fields, tags);
    }

    fn add_fields(
        &mut self,
        name: &str,
        fields: BTreeMap<String, MetricValue>,
        tags: BTreeMap<String, String>,
    ) {
        self.push(MetricKind::Fields, name, fields, tags);
    }
}

/// Per-interface network I/O collector.
///
/// Holds the snapshot registry for the lifetime of the process; `gather` runs
/// one collection cycle against a source and emits into an accumulator.
/// `gather` takes `&self`, so a shared collector can back overlapping cycles;
/// same-interface updates serialize on that record's lock.
pub struct NetIoCollector {
    registry: StatusRegistry,
    filter: Option<InterfaceFilter>,
    skip_interface_checks: bool,
    ignore_protocol_stats: bool,
}

impl NetIoCollector {
    /// Builds a collector, compiling the configured allow-list up front so a
    /// bad pattern fails at startup rather than on the first cycle.
    pub fn new(config: &CollectorConfig) -> Result<Self, GatherError> {
        let filter = if config.interfaces.is_empty() {
            None
        } else {
            Some(InterfaceFilter::compile(&config.interfaces)?)
        };
        Ok(Self {
            registry: StatusRegistry::new(),
            filter,
            skip_interface_checks: config.skip_interface_checks,
            ignore_protocol_stats: config.ignore_protocol_stats,
        })
    }

    /// Runs one collection cycle.
    ///
    /// Source failures for counters or interface metadata abort the cycle;
    /// nothing is emitted in that case. Protocol-stat failure is best-effort:
    /// logged and skipped while per-interface metrics still go out.
    pub fn gather(
        &self,
        source: &dyn NetIoSource,
        acc: &mut dyn Accumulator,
    ) -> Result<(), GatherError> {
        let io_counters = source.io_counters().map_err(GatherError::IoCounters)?;
        let interfaces = source.interfaces().map_err(GatherError::Interfaces)?;
        let interfaces_by_name: HashMap<&str, &InterfaceInfo> = interfaces
            .iter()
            .map(|iface| (iface.name.as_str(), iface))
            .collect();

        for counters in &io_counters {
            if let Some(filter) = &self.filter {
                // Explicit allow-list wins; up/loopback status is irrelevant.
                if !filter.matches(&counters.name) {
                    continue;
                }
            } else if !self.skip_interface_checks {
                let Some(iface) = interfaces_by_name.get(counters.name.as_str()) else {
                    continue;
                };
                if iface.is_loopback || !iface.is_up {
                    continue;
                }
            }

            let status = self.registry.get_or_create(&counters.name);
            status.fill(counters.io);
            let Some(fields) = status.rate_fields() else {
                debug!(interface = %counters.name, "first observation, no deltas yet");
                continue;
            };

            let tags = BTreeMap::from([("interface".to_string(), counters.name.clone())]);
            acc.add_counter("net", fields, tags);
        }

        if !self.ignore_protocol_stats {
            match source.protocol_stats() {
                Ok(protocols) => {
                    let mut fields = BTreeMap::new();
                    for proto in &protocols {
                        for (stat, value) in &proto.stats {
                            let field = format!(
                                "{}_{}",
                                proto.protocol.to_lowercase(),
                                stat.to_lowercase()
                            );
                            fields.insert(field, MetricValue::Int(*value));
                        }
                    }
                    if !fields.is_empty() {
                        let tags =
                            BTreeMap::from([("interface".to_string(), "all".to_string())]);
                        acc.add_fields("net", fields, tags);
                    }
                }
                Err(e) => {
                    debug!(
                        error = %e,
                        operation = "protocol_stats",
                        "protocol stats unavailable, skipping"
                    );
                }
            }
        }

        Ok(())
    }

    /// Number of interfaces the registry currently tracks.
    pub fn tracked_interfaces(&self) -> usize {
        self.registry.len()
    }
}
