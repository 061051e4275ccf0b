use serde::Deserialize;

pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Settings shared by a scope and every scope nested in it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlConfig {
    /// Content type set on every response sent through a scope.
    pub content_type: String,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
        }
    }
}

impl HtmlConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
