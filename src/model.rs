//! Rule configuration and request types
//!
//! Rule types are decoded from JSON with camelCase keys, the same shape the
//! rule store persists them in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Request extra holding the ids of the cookies a request was sent with
pub const COOKIE_IDS_EXTRA: &str = "cookieIds";

/// Page-level rules bound to a URL pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Regular expression matched against the whole page URL
    pub url_pattern: String,
    /// Expression that must produce content for the page to be accepted
    #[serde(default, alias = "pageValidationRule")]
    pub validation_rule: Option<String>,
}

/// A named extraction unit within a page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParseRegion {
    /// Key of the region in the output document
    pub name: String,
    /// Tag copied into every output record
    #[serde(default)]
    pub data_type: String,
    /// Locates the region's context. Blank or `page` selects the whole page.
    #[serde(default)]
    pub select_expression: String,
    #[serde(default)]
    pub field_parse_rules: Vec<FieldParseRule>,
    #[serde(default)]
    pub url_parse_rules: Vec<UrlParseRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldParseRule {
    pub field_name: String,
    pub rule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlParseRule {
    /// Expression producing one URL or a list of URLs
    pub rule: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub url_rule_params: Vec<UrlRuleParam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRuleParam {
    pub param_name: String,
    pub expression: String,
}

fn default_method() -> String {
    "GET".to_string()
}

/// The request a page was fetched with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub extras: Map<String, Value>,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            extras: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    /// Cookie ids carried in the `cookieIds` extra, empty when absent
    pub fn cookie_ids(&self) -> BTreeSet<String> {
        match self.extras.get(COOKIE_IDS_EXTRA) {
            Some(Value::Array(ids)) => ids
                .iter()
                .filter_map(|id| match id {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(Value::String(id)) if !id.is_empty() => BTreeSet::from([id.clone()]),
            _ => BTreeSet::new(),
        }
    }
}

/// Follow-up work item produced by URL rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlerRequest {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl CrawlerRequest {
    pub fn new(url: impl Into<String>, method: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            params,
        }
    }
}
