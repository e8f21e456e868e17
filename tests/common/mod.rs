// Shared test double: a scriptable NetIoSource
#![allow(dead_code)] // not every test binary uses every helper

use std::sync::Mutex;
use std::sync::PoisonError;

use netgather::models::{InterfaceInfo, IoSnapshot, NetIoCounters, ProtocolStats};
use netgather::source::NetIoSource;

/// In-memory source whose responses can be rewritten between cycles.
/// Setting a response to `None` makes the corresponding call fail.
#[derive(Default)]
pub struct MockSource {
    io: Mutex<Option<Vec<NetIoCounters>>>,
    interfaces: Mutex<Option<Vec<InterfaceInfo>>>,
    protocols: Mutex<Option<Vec<ProtocolStats>>>,
}

impl MockSource {
    pub fn new() -> Self {
        let source = Self::default();
        source.set_io(vec![]);
        source.set_interfaces(vec![]);
        source.set_protocols(vec![]);
        source
    }

    pub fn set_io(&self, counters: Vec<NetIoCounters>) {
        *self.io.lock().unwrap_or_else(PoisonError::into_inner) = Some(counters);
    }

    pub fn fail_io(&self) {
        *self.io.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn set_interfaces(&self, interfaces: Vec<InterfaceInfo>) {
        *self.interfaces.lock().unwrap_or_else(PoisonError::into_inner) = Some(interfaces);
    }

    pub fn fail_interfaces(&self) {
        *self.interfaces.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn set_protocols(&self, protocols: Vec<ProtocolStats>) {
        *self.protocols.lock().unwrap_or_else(PoisonError::into_inner) = Some(protocols);
    }

    pub fn fail_protocols(&self) {
        *self.protocols.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl NetIoSource for MockSource {
    fn io_counters(&self) -> anyhow::Result<Vec<NetIoCounters>> {
        self.io
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| anyhow::anyhow!("io counters unavailable"))
    }

    fn interfaces(&self) -> anyhow::Result<Vec<InterfaceInfo>> {
        self.interfaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| anyhow::anyhow!("interface list unavailable"))
    }

    fn protocol_stats(&self) -> anyhow::Result<Vec<ProtocolStats>> {
        self.protocols
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| anyhow::anyhow!("protocol stats unavailable"))
    }
}

pub fn counters(name: &str, io: IoSnapshot) -> NetIoCounters {
    NetIoCounters {
        name: name.to_string(),
        io,
    }
}

pub fn up(name: &str) -> InterfaceInfo {
    InterfaceInfo {
        name: name.to_string(),
        is_up: true,
        is_loopback: false,
    }
}

pub fn down(name: &str) -> InterfaceInfo {
    InterfaceInfo {
        name: name.to_string(),
        is_up: false,
        is_loopback: false,
    }
}

pub fn loopback(name: &str) -> InterfaceInfo {
    InterfaceInfo {
        name: name.to_string(),
        is_up: true,
        is_loopback: true,
    }
}
