// Raw OS counters via sysinfo, plus Linux /sys and /proc helpers

mod linux;

use std::sync::Mutex;

use sysinfo::Networks;

use crate::models::{InterfaceInfo, IoSnapshot, NetIoCounters, ProtocolStats};

/// The external collaborators the collector depends on: per-interface
/// counters, interface metadata, and system-wide protocol stats.
///
/// `Send + Sync` so one source can back overlapping collection cycles.
pub trait NetIoSource: Send + Sync {
    /// Current cumulative counters for every interface the OS reports.
    fn io_counters(&self) -> anyhow::Result<Vec<NetIoCounters>>;

    /// System interface metadata with up/loopback flags.
    fn interfaces(&self) -> anyhow::Result<Vec<InterfaceInfo>>;

    /// System-wide per-protocol stats. Callers treat failure as best-effort.
    fn protocol_stats(&self) -> anyhow::Result<Vec<ProtocolStats>>;
}

/// Production source backed by [`sysinfo::Networks`]. Drop counters and
/// interface flags come from `/sys/class/net` and protocol stats from
/// `/proc/net/snmp`; on non-Linux targets those degrade to zeros/empty.
pub struct SysinfoSource {
    networks: Mutex<Networks>,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }
}

impl NetIoSource for SysinfoSource {
    fn io_counters(&self) -> anyhow::Result<Vec<NetIoCounters>> {
        let mut networks = self
            .networks
            .lock()
            .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
        networks.refresh(true);
        Ok(networks
            .list()
            .iter()
            .map(|(name, data)| NetIoCounters {
                name: name.clone(),
                io: IoSnapshot {
                    bytes_sent: data.total_transmitted(),
                    bytes_recv: data.total_received(),
                    packets_sent: data.total_packets_transmitted(),
                    packets_recv: data.total_packets_received(),
                    err_in: data.total_errors_on_received(),
                    err_out: data.total_errors_on_transmitted(),
                    drop_in: linux::read_interface_stat(name, "rx_dropped"),
                    drop_out: linux::read_interface_stat(name, "tx_dropped"),
                },
            })
            .collect())
    }

    fn interfaces(&self) -> anyhow::Result<Vec<InterfaceInfo>> {
        let networks = self
            .networks
            .lock()
            .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
        Ok(networks
            .list()
            .keys()
            .map(|name| match linux::read_interface_flags(name) {
                Some(flags) => InterfaceInfo {
                    name: name.clone(),
                    is_up: flags.up,
                    is_loopback: flags.loopback,
                },
                // No flags to go by (non-Linux or sysfs gap): assume up and
                // fall back to the conventional loopback name.
                None => InterfaceInfo {
                    name: name.clone(),
                    is_up: true,
                    is_loopback: name == "lo" || name == "lo0",
                },
            })
            .collect())
    }

    fn protocol_stats(&self) -> anyhow::Result<Vec<ProtocolStats>> {
        linux::read_proc_net_snmp()
    }
}
