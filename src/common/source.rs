//! Range sources the binary can pull the upstream CIDR document from

use std::path::PathBuf;

use range_match::{RangeLists, RangeSource};
use serde::Deserialize;

/// Errors produced while fetching or decoding the upstream document
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Malformed source document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The enveloped document shape published by operator API endpoints such as
/// Cloudflare's `/client/v4/ips`: the CIDR lists live under a `result` field
#[derive(Debug, Deserialize)]
struct Envelope {
    result: RangeLists,
}

/// A source document with or without the API envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Enveloped(Envelope),
    Bare(RangeLists),
}

impl From<Document> for RangeLists {
    fn from(document: Document) -> Self {
        match document {
            Document::Enveloped(envelope) => envelope.result,
            Document::Bare(lists) => lists,
        }
    }
}

/// Fetches the CIDR document from an HTTP endpoint
///
/// The blocking client is built per fetch, on whatever worker thread the
/// caller runs the fetch from; it must not be driven from an async context.
pub struct HttpSource {
    url: String,
}

impl HttpSource {
    pub fn new(url: String) -> Self {
        Self { url }
    }

    fn fetch_document(&self) -> Result<RangeLists, FetchError> {
        log::debug!("Fetching CIDR lists from {}", self.url);
        let document: Document = reqwest::blocking::get(&self.url)?
            .error_for_status()?
            .json()?;
        Ok(document.into())
    }
}

impl RangeSource for HttpSource {
    fn id(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> Result<RangeLists, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.fetch_document()?)
    }
}

/// Reads the CIDR document from a local JSON file
pub struct FileSource {
    path: PathBuf,
    id: String,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        let id = path.display().to_string();
        Self { path, id }
    }

    fn read_document(&self) -> Result<RangeLists, FetchError> {
        log::debug!("Reading CIDR lists from {}", self.id);
        let json = std::fs::read_to_string(&self.path)?;
        let document: Document = serde_json::from_str(&json)?;
        Ok(document.into())
    }
}

impl RangeSource for FileSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&self) -> Result<RangeLists, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_document()?)
    }
}
