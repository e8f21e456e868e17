// Fatal-to-cycle errors. Protocol-stat failures are best-effort and never
// surface here; "no delta yet" is not an error at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatherError {
    #[error("reading network io counters: {0}")]
    IoCounters(anyhow::Error),

    #[error("listing network interfaces: {0}")]
    Interfaces(anyhow::Error),

    #[error("compiling interface filter {pattern:?}: {source}")]
    Filter {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
