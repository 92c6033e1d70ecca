//! Segment catalog: wire types, the search source trait and its HTTP backend.

pub mod http;
pub mod source;

pub use http::Catalog;
pub use source::SegmentSource;

use serde::{Deserialize, Serialize};

/// A business-activity category as served by the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub id: String,
    #[serde(rename = "descricao")]
    pub description: String,
}

impl Segment {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// Body of the search endpoint. Only the first page is ever requested.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentPage {
    #[serde(default)]
    pub list: Vec<Segment>,
}

/// The query is interpolated as given; reserved characters are the caller's concern.
pub fn search_endpoint(query: &str) -> String {
    format!("/Segmento?Descricao={}&Page=1", query)
}
