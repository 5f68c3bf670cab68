//! The read-side contract every entity kind exposes to the list core.

use std::{borrow::Cow, fmt};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Opaque identifier assigned by the remote service once a record is persisted.
///
/// Services in the wild hand out both numeric and textual ids, so both shapes
/// are accepted and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(id) => Self::Number(id),
            Err(_) => Self::Text(value.to_string()),
        }
    }
}

pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    fn id(&self) -> Option<&RecordId>;

    /// Text rendition of a field, addressed by its wire name.
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}
