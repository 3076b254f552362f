use crate::interface::InterfaceTable;
use crate::route::RoutingTable;
use crate::ConfigError;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Timing of address resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArpConfig {
    /// How long a resolved address stays usable.
    pub cache_ttl: Duration,
    /// Minimum gap between two requests for the same address.
    pub retry_interval: Duration,
    /// Requests sent before the address is declared unreachable.
    pub max_attempts: u32,
    /// Period of the background sweep.
    pub sweep_interval: Duration,
}

impl Default for ArpConfig {
    fn default() -> Self {
        ArpConfig {
            cache_ttl: Duration::from_secs(15),
            retry_interval: Duration::from_secs(1),
            max_attempts: 5,
            sweep_interval: Duration::from_secs(1),
        }
    }
}

pub fn load_routing_table(path: impl AsRef<Path>) -> Result<RoutingTable, ConfigError> {
    fs::read_to_string(path)?.parse()
}

pub fn load_interfaces(path: impl AsRef<Path>) -> Result<InterfaceTable, ConfigError> {
    fs::read_to_string(path)?.parse()
}
