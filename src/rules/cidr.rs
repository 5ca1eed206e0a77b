//! IPv4 network ranges in CIDR notation.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 network such as `10.0.0.0/8`.
///
/// Host bits of the parsed address are cleared, so `10.1.2.3/8` and
/// `10.0.0.0/8` describe the same network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Network {
    addr: Ipv4Addr,
    prefix_len: u8,
}

/// Reason a CIDR string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrParseError(String);

impl fmt::Display for CidrParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CidrParseError {}

impl Ipv4Network {
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Option<Self> {
        if prefix_len > 32 {
            return None;
        }
        let masked = u32::from(addr) & Self::mask(prefix_len);
        Some(Self {
            addr: Ipv4Addr::from(masked),
            prefix_len,
        })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Whether `ip` lies inside this network.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & Self::mask(self.prefix_len) == u32::from(self.addr)
    }

    fn mask(prefix_len: u8) -> u32 {
        match prefix_len {
            0 => 0,
            n => u32::MAX << (32 - u32::from(n)),
        }
    }
}

impl FromStr for Ipv4Network {
    type Err = CidrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| CidrParseError(format!("missing prefix length in {s:?}")))?;

        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| CidrParseError(format!("invalid IPv4 address {addr:?}")))?;
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| CidrParseError(format!("invalid prefix length {prefix:?}")))?;

        Self::new(addr, prefix_len)
            .ok_or_else(|| CidrParseError(format!("prefix length {prefix_len} exceeds 32")))
    }
}

impl fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}
