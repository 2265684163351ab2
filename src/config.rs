use std::net::SocketAddr;

use tracing::trace;

/// Hub configuration, read once at process start.
///
/// There is no runtime reconfiguration; in particular the sweep interval is
/// fixed for the life of the process.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Sweep cadence in seconds; bounds the worst-case escalation latency
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Address the HTTP transport binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// How long a watch request is held open before answering with a
    /// keepalive on the transport side
    #[serde(default = "default_long_poll_timeout")]
    pub long_poll_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            bind_addr: default_bind_addr(),
            long_poll_timeout_secs: default_long_poll_timeout(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    2
}

fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().expect("static default address")
}

fn default_long_poll_timeout() -> u64 {
    30
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
