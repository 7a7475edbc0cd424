//! Common code used by the cloudmask binary

pub mod cache;
pub mod logging;
pub mod source;
