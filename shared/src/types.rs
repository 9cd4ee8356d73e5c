use serde::{Serialize, Deserialize};

/// Identity of a discovered service.
/// This is the canonical data model used by the collector, the exporters,
/// and the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service name, unique within a namespace
    #[serde(rename = "Name")]
    pub name: String,

    /// Namespace grouping/owning the service
    #[serde(rename = "Namespace")]
    pub namespace: String,

    /// Base URL override; empty means the default cluster address
    #[serde(rename = "BaseURL")]
    pub base_url: String,
}

/// A discovery result for one service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct About {
    /// The service the documentation belongs to
    #[serde(rename = "Service")]
    pub service: Service,

    /// Documentation payload; None means not yet fetched or the fetch failed
    #[serde(rename = "Doc", default)]
    pub doc: Option<serde_json::Value>,
}
