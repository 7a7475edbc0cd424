#![doc = include_str!("../README.md")]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod addr;
mod cidr;
mod error;

pub use addr::{parse_addr, parse_ipv4, parse_ipv6, Addr};
pub use cidr::{cidr_to_range, CidrRange, Interval};
pub use error::Error;
