//! Document shapes exchanged with the document store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::SignupRecord;

/// A sign-up document as returned by the store after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSignup {
    pub id: String,
    #[serde(flatten)]
    pub record: SignupRecord,
    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "_ts", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl StoredSignup {
    pub fn from_document(document: Value) -> serde_json::Result<Self> {
        serde_json::from_value(document)
    }
}
