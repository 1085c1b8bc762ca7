//! Filtered content record and publish accounting.

use serde::{Deserialize, Serialize};

/// One filtered content item, ready for publication.
///
/// Fields the content API left out stay `None` and are omitted from the
/// serialized payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// ISO-8601 publication timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_publication_date: Option<String>,

    /// Article headline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_title: Option<String>,

    /// Canonical article URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

impl Record {
    /// Names of the fields kept from a raw content item.
    pub const FIELDS: [&'static str; 3] = ["webPublicationDate", "webTitle", "webUrl"];

    pub fn new(
        web_publication_date: impl Into<String>,
        web_title: impl Into<String>,
        web_url: impl Into<String>,
    ) -> Self {
        Self {
            web_publication_date: Some(web_publication_date.into()),
            web_title: Some(web_title.into()),
            web_url: Some(web_url.into()),
        }
    }
}

/// Wire payload appended to the stream: the record plus the search term.
#[derive(Debug, Serialize)]
pub struct PublishPayload<'a> {
    #[serde(flatten)]
    pub record: &'a Record,

    /// Search term the record was found with
    pub keyword: &'a str,
}

impl<'a> PublishPayload<'a> {
    pub fn new(record: &'a Record, keyword: &'a str) -> Self {
        Self { record, keyword }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Result of a publish sequence.
///
/// `shard_id` is the shard reported for the last record only; it says
/// nothing about where earlier records landed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub records_added: usize,
    pub shard_id: Option<String>,
}

impl PublishOutcome {
    /// Shard id for log output, `"none"` when nothing was published.
    pub fn shard_label(&self) -> &str {
        self.shard_id.as_deref().unwrap_or("none")
    }
}

/// What `ensure_stream` found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamStatus {
    Created,
    AlreadyExists,
}
