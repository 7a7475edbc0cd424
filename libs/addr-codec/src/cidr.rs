use crate::addr::{parse_addr, Addr};
use crate::error::Error;

/// An inclusive `[start, end]` interval over one address family's integer space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<T> {
    pub start: T,
    pub end: T,
}

/// The interval covered by one CIDR block, tagged with its address family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidrRange {
    V4(Interval<u32>),
    V6(Interval<u128>),
}

/// Converts a CIDR block in `address/prefix` notation to the inclusive
/// interval of addresses it covers
///
/// A `/32` (IPv4) or `/128` (IPv6) block covers a single address, so
/// `start == end`.
pub fn cidr_to_range(cidr: &str) -> Result<CidrRange, Error> {
    let (addr_part, prefix_part) = cidr
        .split_once('/')
        .ok_or_else(|| Error::InvalidCidr(cidr.to_string()))?;
    if prefix_part.is_empty() || !prefix_part.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(Error::InvalidCidr(cidr.to_string()));
    }
    let prefix: u32 = prefix_part
        .parse()
        .map_err(|_| Error::InvalidCidr(cidr.to_string()))?;

    // A malformed address inside a CIDR block is a malformed block
    let addr = parse_addr(addr_part).map_err(|_| Error::InvalidCidr(cidr.to_string()))?;

    match addr {
        Addr::V4(addr) => {
            if prefix > 32 {
                return Err(Error::InvalidCidr(cidr.to_string()));
            }
            // Host mask: (32 - prefix) low-order one-bits
            let mask = match prefix {
                32 => 0,
                prefix => u32::MAX >> prefix,
            };
            Ok(CidrRange::V4(Interval {
                start: addr & !mask,
                end: addr | mask,
            }))
        }
        Addr::V6(addr) => {
            if prefix > 128 {
                return Err(Error::InvalidCidr(cidr.to_string()));
            }
            let mask = match prefix {
                128 => 0,
                prefix => u128::MAX >> prefix,
            };
            Ok(CidrRange::V6(Interval {
                start: addr & !mask,
                end: addr | mask,
            }))
        }
    }
}
