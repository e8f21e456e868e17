use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub collector: CollectorConfig,
    pub monitoring: MonitoringConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectorConfig {
    /// Explicit interface allow-list (glob patterns, e.g. "eth*"). When set,
    /// listed interfaces are gathered regardless of up/loopback status; when
    /// empty, any up non-loopback interface is gathered.
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Gather from every interface the OS reports, skipping the up/loopback
    /// checks. Only meaningful when no allow-list is set.
    #[serde(default)]
    pub skip_interface_checks: bool,
    /// Skip the system-wide protocol stats (interface="all") emission.
    #[serde(default)]
    pub ignore_protocol_stats: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub sample_interval_ms: u64,
    /// How often to log app stats (metrics written, failed cycles) at INFO level.
    pub stats_log_interval_secs: u64,
    /// Max number of metric batches kept in the broadcast channel for live
    /// subscribers (slow consumers may lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_broadcast_capacity() -> usize {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Where JSON-line metrics go: "-" for stdout, otherwise a file path
    /// (appended to).
    pub path: String,
    /// Flush to the output once this many metrics are buffered.
    pub flush_rate: u64,
    pub flush_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.collector.interfaces.iter().all(|p| !p.is_empty()),
            "collector.interfaces must not contain empty patterns"
        );
        anyhow::ensure!(
            self.monitoring.sample_interval_ms > 0,
            "monitoring.sample_interval_ms must be > 0, got {}",
            self.monitoring.sample_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.broadcast_capacity > 0,
            "monitoring.broadcast_capacity must be > 0, got {}",
            self.monitoring.broadcast_capacity
        );
        anyhow::ensure!(!self.output.path.is_empty(), "output.path must be non-empty");
        anyhow::ensure!(
            self.output.flush_rate > 0,
            "output.flush_rate must be > 0, got {}",
            self.output.flush_rate
        );
        anyhow::ensure!(
            self.output.flush_interval_secs > 0,
            "output.flush_interval_secs must be > 0, got {}",
            self.output.flush_interval_secs
        );
        Ok(())
    }
}
