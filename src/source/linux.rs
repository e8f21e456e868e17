// Linux-specific helpers: /sys/class/net flags and statistics, /proc/net/snmp.

use crate::models::ProtocolStats;

pub(super) struct InterfaceFlags {
    pub up: bool,
    pub loopback: bool,
}

/// Read interface flags from /sys/class/net/<interface>/flags (Linux).
/// Returns None when the file is missing or unparsable.
pub(super) fn read_interface_flags(interface_name: &str) -> Option<InterfaceFlags> {
    #[cfg(target_os = "linux")]
    {
        // Bits from if.h
        const IFF_UP: u64 = 0x1;
        const IFF_LOOPBACK: u64 = 0x8;

        let path = format!("/sys/class/net/{}/flags", interface_name);
        let content = std::fs::read_to_string(&path).ok()?;
        let bits = content
            .trim()
            .strip_prefix("0x")
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())?;
        return Some(InterfaceFlags {
            up: bits & IFF_UP != 0,
            loopback: bits & IFF_LOOPBACK != 0,
        });
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = interface_name;
        None
    }
}

/// Read one counter from /sys/class/net/<interface>/statistics/<stat>
/// (Linux), or 0 if unavailable.
pub(super) fn read_interface_stat(interface_name: &str, stat: &str) -> u64 {
    #[cfg(target_os = "linux")]
    {
        let path = format!("/sys/class/net/{}/statistics/{}", interface_name, stat);
        if let Ok(content) = std::fs::read_to_string(&path)
            && let Ok(value) = content.trim().parse::<u64>()
        {
            return value;
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = (interface_name, stat);
    }
    0
}

/// Read system-wide protocol stats from /proc/net/snmp (Linux). Empty on
/// other targets.
pub(super) fn read_proc_net_snmp() -> anyhow::Result<Vec<ProtocolStats>> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/net/snmp")?;
        return Ok(parse_snmp(&content));
    }
    #[cfg(not(target_os = "linux"))]
    Ok(Vec::new())
}

/// Parse /proc/net/snmp content: protocols come as a header/value line pair
/// sharing a "Proto:" prefix, stat names in the header, values below.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_snmp(content: &str) -> Vec<ProtocolStats> {
    let mut protocols = Vec::new();
    let mut lines = content.lines();
    while let (Some(header), Some(values)) = (lines.next(), lines.next()) {
        let Some((proto, names)) = header.split_once(':') else {
            continue;
        };
        let Some((proto_check, nums)) = values.split_once(':') else {
            continue;
        };
        if proto != proto_check {
            continue;
        }
        let stats = names
            .split_whitespace()
            .zip(nums.split_whitespace())
            .filter_map(|(name, value)| {
                value.parse::<i64>().ok().map(|v| (name.to_string(), v))
            })
            .collect();
        protocols.push(ProtocolStats {
            protocol: proto.to_string(),
            stats,
        });
    }
    protocols
}
