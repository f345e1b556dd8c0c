use serde::{Deserialize, Serialize};

/// One stored item as observed through listing or bulk retrieval.
///
/// `size` is only filled in where a backend can report it cheaply and `data`
/// only by [`Storage::get_multiple`](crate::Storage::get_multiple).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub key: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

impl Object {
    /// An entry carrying only its key, as produced by directory listings.
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_size(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            data: None,
        }
    }

    pub fn with_data(key: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            size: data.len() as u64,
            data: Some(data),
        }
    }
}
