use crate::ConfigError;
use sroute_packets::MacAddr;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// One of the router's ports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

impl Interface {
    pub fn new(name: &str, mac: MacAddr, ip: Ipv4Addr) -> Self {
        Interface {
            name: String::from(name),
            mac,
            ip,
        }
    }
}

/// The set of interfaces the router owns. Read only once the router is running.
#[derive(Clone, Debug, Default)]
pub struct InterfaceTable {
    interfaces: Vec<Interface>,
}

impl InterfaceTable {
    pub fn new(interfaces: Vec<Interface>) -> Self {
        InterfaceTable { interfaces }
    }

    pub fn by_name(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.name == name)
    }

    pub fn by_ip(&self, ip: Ipv4Addr) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.ip == ip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

/// Parses one interface per line as `name ip mac`, e.g. `eth0 10.0.1.1 02:00:00:00:01:01`.
/// Blank lines and `#` comments are skipped.
impl FromStr for InterfaceTable {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut interfaces = vec![];
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
            if fields.len() != 3 {
                return Err(parse_error(format!(
                    "expected `name ip mac`, found {} fields",
                    fields.len()
                )));
            }
            let ip = fields[1]
                .parse::<Ipv4Addr>()
                .map_err(|e| parse_error(format!("bad address {:?}: {}", fields[1], e)))?;
            let mac = fields[2]
                .parse::<MacAddr>()
                .map_err(|e| parse_error(e.to_string()))?;
            interfaces.push(Interface::new(fields[0], mac, ip));
        }
        Ok(InterfaceTable::new(interfaces))
    }
}
