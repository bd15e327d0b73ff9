//! Address parsing helpers shared by schema checks and config validation.
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

/// An aligned IPv4 network block (`10.0.2.0/24`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: u32,
    prefix: u8,
}

impl Ipv4Cidr {
    /// Number of leading network bits.
    #[must_use]
    pub const fn prefix(self) -> u8 {
        self.prefix
    }

    /// First address of the block.
    #[must_use]
    pub const fn network(self) -> Ipv4Addr {
        Ipv4Addr::from_bits(self.network)
    }

    const fn mask(self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - self.prefix)
        }
    }

    /// `true` if every address of `other` lies inside `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        other.prefix >= self.prefix && (other.network & self.mask()) == self.network
    }

    /// `true` if the two blocks share at least one address.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| format!("'{s}' has no prefix length"))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| format!("'{addr}' is not an IPv4 address"))?;
        let prefix: u8 = prefix
            .parse()
            .ok()
            .filter(|p| *p <= 32)
            .ok_or_else(|| format!("'{prefix}' is not a prefix length between 0 and 32"))?;
        let cidr = Self {
            network: addr.to_bits(),
            prefix,
        };
        if cidr.network & !cidr.mask() != 0 {
            return Err(format!("'{s}' has host bits set"));
        }
        Ok(cidr)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix)
    }
}

/// `true` for an aligned IPv4 block or any syntactically valid IPv6 block.
#[must_use]
pub fn is_cidr(s: &str) -> bool {
    if s.parse::<Ipv4Cidr>().is_ok() {
        return true;
    }
    s.split_once('/').is_some_and(|(addr, prefix)| {
        matches!(addr.parse::<IpAddr>(), Ok(IpAddr::V6(_)))
            && prefix.parse::<u8>().is_ok_and(|p| p <= 128)
    })
}

/// `true` for `*`, a CIDR block, a bare address, or a service tag such as
/// `VirtualNetwork` or `Storage.WestUS2`.
#[must_use]
pub fn is_address_prefix(s: &str) -> bool {
    if s == "*" || is_cidr(s) || s.parse::<IpAddr>().is_ok() {
        return true;
    }
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '.')
}

/// `true` for `*`, a single port, or an inclusive `low-high` range.
#[must_use]
pub fn is_port_range(s: &str) -> bool {
    if s == "*" {
        return true;
    }
    match s.split_once('-') {
        Some((low, high)) => match (low.parse::<u16>(), high.parse::<u16>()) {
            (Ok(low), Ok(high)) => low <= high,
            _ => false,
        },
        None => s.parse::<u16>().is_ok(),
    }
}
