// Raw per-interface counters and interface metadata as reported by the OS

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The eight cumulative counters sampled for one interface at one point in
/// time. All values are monotonically non-decreasing from the OS's point of
/// view, except across an interface restart (counter reset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoSnapshot {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub err_in: u64,
    pub err_out: u64,
    pub drop_in: u64,
    pub drop_out: u64,
}

/// One interface's counters as fetched from the source in a single cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetIoCounters {
    pub name: String,
    pub io: IoSnapshot,
}

/// Administrative metadata for one system interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub is_up: bool,
    pub is_loopback: bool,
}

/// System-wide stats for one network protocol (e.g. Tcp, Udp), as name→value
/// pairs straight from the OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolStats {
    pub protocol: String,
    pub stats: BTreeMap<String, i64>,
}
