use serde::{Deserialize, Serialize};

/// A named dataset exposed by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: String,
    pub title: String,
    #[serde(rename = "uri", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub readable: bool,
    pub writable: bool,
}

/// Prefix to namespace IRI mapping. The default namespace has an empty prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceBinding {
    pub prefix: String,
    pub namespace: String,
}

impl NamespaceBinding {
    pub fn new(prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: namespace.into(),
        }
    }
}

/// Store counts computed on demand. Never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub total_statements: u64,
    pub total_classes: u64,
    pub total_properties: u64,
    pub total_subjects: u64,
    pub total_objects: u64,
}
