use crate::snapshot::RangeLists;

/// An external supplier of the upstream CIDR lists
///
/// The matcher never performs I/O itself; the host hands it a source (an HTTP
/// client, a file reader, a test stub) and the matcher only cares whether the
/// fetch produced a document or not.
pub trait RangeSource {
    /// A short identifier for log messages and error reports
    fn id(&self) -> &str;

    /// Fetch the current CIDR lists from the upstream source
    fn fetch(&self) -> Result<RangeLists, Box<dyn std::error::Error + Send + Sync>>;
}
