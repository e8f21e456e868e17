// Domain models: raw counters in, labeled metric events out

mod metric;
mod net;

pub use metric::{Metric, MetricKind, MetricValue};
pub use net::{InterfaceInfo, IoSnapshot, NetIoCounters, ProtocolStats};
