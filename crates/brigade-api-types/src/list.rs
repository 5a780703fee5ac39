//! List response shapes returned by the collection endpoints.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Paginated `{ data, hasNextPage }` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_next_page: Option<bool>,
}

/// Every shape a list endpoint may answer with.
///
/// Endpoints answer with either a bare array or a paginated envelope; anything
/// else lands in `Unrecognized` and normalizes to an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Bare(Vec<T>),
    Envelope(ListEnvelope<T>),
    Unrecognized(Value),
}

impl<T: DeserializeOwned> ListPayload<T> {
    /// Decode a response body. Bodies that are not valid JSON are treated as
    /// an unrecognized shape rather than an error.
    pub fn decode(body: &[u8]) -> Self {
        serde_json::from_slice(body)
            .unwrap_or_else(|_| Self::Unrecognized(Value::Null))
    }
}

/// A list element that did not decode as the expected record type.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub position: usize,
    pub id: Option<String>,
    pub reason: String,
}

/// Records of one list response, decoded element by element.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedList<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

impl ListPayload<Value> {
    /// Decode each element of a recognized shape on its own. A malformed
    /// record is reported in `skipped` and never hides its siblings.
    pub fn decode_records<T: DeserializeOwned>(self) -> DecodedList<T> {
        let mut decoded = DecodedList {
            items: Vec::new(),
            skipped: Vec::new(),
        };
        for (position, raw) in self.into_items().into_iter().enumerate() {
            let id = raw.get("id").and_then(Value::as_str).map(str::to_string);
            match serde_json::from_value(raw) {
                Ok(item) => decoded.items.push(item),
                Err(err) => decoded.skipped.push(SkippedRecord {
                    position,
                    id,
                    reason: err.to_string(),
                }),
            }
        }
        decoded
    }
}

impl<T> ListPayload<T> {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Envelope(envelope) => envelope.data,
            Self::Unrecognized(_) => Vec::new(),
        }
    }
}
