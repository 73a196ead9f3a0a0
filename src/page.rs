//! Fetched page and extraction result

use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::Context;
use crate::model::{CrawlerRequest, Request};

/// A fetched document handed to the processor
#[derive(Debug, Clone)]
pub struct Page {
    pub request: Request,
    pub raw_text: String,
}

impl Page {
    pub fn new(request: Request, raw_text: impl Into<String>) -> Self {
        Self {
            request,
            raw_text: raw_text.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.request.url
    }

    /// Markup root of the page
    pub fn html(&self) -> Context {
        Context::document(&self.raw_text)
    }

    /// Structured root of the page, `None` when the body is not JSON.
    ///
    /// JSONP bodies (`callback({...});`) are unwrapped.
    pub fn json(&self) -> Option<Context> {
        parse_json_body(&self.raw_text).map(Context::Structured)
    }
}

fn parse_json_body(body: &str) -> Option<Value> {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    // JSONP: strip `name(` ... `)` and an optional trailing semicolon
    let open = trimmed.find('(')?;
    let prefix = &trimmed[..open];
    if prefix.is_empty()
        || !prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
    {
        return None;
    }
    let inner = trimmed[open + 1..].trim_end().trim_end_matches(';').trim_end();
    let inner = inner.strip_suffix(')')?;
    serde_json::from_str(inner).ok()
}

/// Output of a successfully processed page
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Region name to record (one node) or index-keyed records (several nodes)
    pub fields: Map<String, Value>,
    pub child_requests: Vec<CrawlerRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_body() {
        let page = Page::new(Request::new("https://api.example.com"), r#" {"items": [1, 2]} "#);
        assert_eq!(page.json(), Some(Context::Structured(json!({"items": [1, 2]}))));
    }

    #[test]
    fn test_jsonp_body() {
        let page = Page::new(
            Request::new("https://api.example.com"),
            r#"jQuery123_456({"total": 3});"#,
        );
        assert_eq!(page.json(), Some(Context::Structured(json!({"total": 3}))));
    }

    #[test]
    fn test_html_body_is_not_json() {
        let page = Page::new(Request::new("https://example.com"), "<html><body>(x)</body></html>");
        assert_eq!(page.json(), None);
    }
}
