use crate::ConfigError;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A static route: datagrams whose destination falls in `destination/mask` leave through
/// `interface` towards `gateway`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingEntry {
    pub destination: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub interface: String,
}

impl RoutingEntry {
    pub fn new(destination: Ipv4Addr, mask: Ipv4Addr, gateway: Ipv4Addr, interface: &str) -> Self {
        RoutingEntry {
            destination,
            mask,
            gateway,
            interface: String::from(interface),
        }
    }

    /// Number of leading one bits in the mask.
    pub fn prefix_len(&self) -> u32 {
        u32::from(self.mask).leading_ones()
    }

    pub fn matches(&self, addr: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(addr) & mask == u32::from(self.destination) & mask
    }

    /// The address whose hardware address the datagram must be sent to. Routes without a
    /// gateway (0.0.0.0) are directly connected, so the destination itself is the next hop.
    pub fn next_hop(&self, destination: Ipv4Addr) -> Ipv4Addr {
        if self.gateway.is_unspecified() {
            destination
        } else {
            self.gateway
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RoutingTable {
    entries: Vec<RoutingEntry>,
}

impl RoutingTable {
    pub fn new(entries: Vec<RoutingEntry>) -> Self {
        RoutingTable { entries }
    }

    pub fn push(&mut self, entry: RoutingEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RoutingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the most specific route covering `destination`: among all matching entries,
    /// the one with the longest mask. On equal prefix lengths the earlier entry wins.
    pub fn longest_prefix_match(&self, destination: Ipv4Addr) -> Option<&RoutingEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.matches(destination))
            .fold(None, |best: Option<&RoutingEntry>, entry| match best {
                Some(best) if best.prefix_len() >= entry.prefix_len() => Some(best),
                _ => Some(entry),
            })
    }
}

/// Parses the classic `rtable` format, one route per line:
/// `destination gateway mask interface`, e.g. `10.0.1.0 0.0.0.0 255.255.255.0 eth1`.
/// Blank lines and `#` comments are skipped.
impl FromStr for RoutingTable {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut table = RoutingTable::default();
        for (index, line) in s.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let parse_error = |reason: String| ConfigError::Parse {
                line: index + 1,
                reason,
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 4 {
                return Err(parse_error(format!(
                    "expected `destination gateway mask interface`, found {} fields",
                    fields.len()
                )));
            }
            let mut addrs = [Ipv4Addr::UNSPECIFIED; 3];
            for (addr, field) in addrs.iter_mut().zip(&fields[..3]) {
                *addr = field
                    .parse()
                    .map_err(|e| parse_error(format!("bad address {:?}: {}", field, e)))?;
            }
            let [destination, gateway, mask] = addrs;
            table.push(RoutingEntry::new(destination, mask, gateway, fields[3]));
        }
        Ok(table)
    }
}
