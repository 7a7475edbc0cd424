#![doc = include_str!("../README.md")]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod error;
mod matcher;
mod set;
mod snapshot;
mod source;

pub use error::Error;
pub use matcher::{LoadReport, Matcher, State};
pub use set::RangeSet;
pub use snapshot::{RangeLists, Snapshot};
pub use source::RangeSource;
