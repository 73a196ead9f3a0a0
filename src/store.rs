//! Rule store
//!
//! Rules are looked up per page URL. [`InMemoryRuleStore`] serves a
//! [`RuleSet`] decoded from JSON.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{PageInfo, PageParseRegion};

/// Read-only source of extraction rules
pub trait RuleStore: Send + Sync {
    /// The page rules bound to `url`, `None` when no pattern matches
    fn find_page_info(&self, url: &str) -> Result<Option<PageInfo>, StoreError>;

    /// Regions of the page bound to `url`, in declaration order
    fn page_regions(&self, url: &str) -> Result<Vec<PageParseRegion>, StoreError>;
}

/// Serialized rule configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub pages: Vec<PageRules>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRules {
    #[serde(flatten)]
    pub page: PageInfo,
    #[serde(default)]
    pub regions: Vec<PageParseRegion>,
}

#[derive(Debug)]
struct CompiledPage {
    pattern: Regex,
    rules: PageRules,
}

/// Rule store over an in-memory [`RuleSet`].
///
/// When several patterns match a URL the longest pattern wins; equal
/// lengths go to the page registered first.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    pages: Vec<CompiledPage>,
}

impl InMemoryRuleStore {
    pub fn new(rule_set: RuleSet) -> Result<Self, StoreError> {
        let mut store = Self::default();
        for rules in rule_set.pages {
            store.insert(rules)?;
        }
        Ok(store)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let rule_set: RuleSet = serde_json::from_str(json)?;
        Self::new(rule_set)
    }

    /// Register one page. The pattern must match the whole URL.
    pub fn insert(&mut self, rules: PageRules) -> Result<(), StoreError> {
        let source = &rules.page.url_pattern;
        let pattern = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
            StoreError::InvalidPattern {
                pattern: source.clone(),
                source: e,
            }
        })?;
        self.pages.push(CompiledPage { pattern, rules });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn lookup(&self, url: &str) -> Option<&PageRules> {
        let mut best: Option<&CompiledPage> = None;
        for page in self.pages.iter().filter(|p| p.pattern.is_match(url)) {
            let longer = best.map_or(true, |b| {
                page.rules.page.url_pattern.len() > b.rules.page.url_pattern.len()
            });
            if longer {
                best = Some(page);
            }
        }
        best.map(|page| &page.rules)
    }
}

impl RuleStore for InMemoryRuleStore {
    fn find_page_info(&self, url: &str) -> Result<Option<PageInfo>, StoreError> {
        Ok(self.lookup(url).map(|rules| rules.page.clone()))
    }

    fn page_regions(&self, url: &str) -> Result<Vec<PageParseRegion>, StoreError> {
        Ok(self
            .lookup(url)
            .map(|rules| rules.regions.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
    {
        "pages": [
            {
                "urlPattern": "https://shop\\.example\\.com/.*",
                "regions": [{"name": "generic", "selectExpression": "page"}]
            },
            {
                "urlPattern": "https://shop\\.example\\.com/list/.*",
                "validationRule": "css('ul.list')",
                "regions": [
                    {"name": "list", "dataType": "items", "selectExpression": "css('ul.list li')"},
                    {"name": "pager", "dataType": "pager", "selectExpression": "css('#pager')"}
                ]
            }
        ]
    }
    "#;

    #[test]
    fn test_longest_pattern_wins() {
        let store = InMemoryRuleStore::from_json(RULES).unwrap();
        assert_eq!(store.len(), 2);

        let info = store
            .find_page_info("https://shop.example.com/list/books")
            .unwrap()
            .unwrap();
        assert_eq!(info.validation_rule.as_deref(), Some("css('ul.list')"));

        let info = store
            .find_page_info("https://shop.example.com/about")
            .unwrap()
            .unwrap();
        assert!(info.validation_rule.is_none());
    }

    #[test]
    fn test_regions_in_declaration_order() {
        let store = InMemoryRuleStore::from_json(RULES).unwrap();
        let regions = store
            .page_regions("https://shop.example.com/list/books")
            .unwrap();
        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["list", "pager"]);
    }

    #[test]
    fn test_pattern_must_match_whole_url() {
        let store = InMemoryRuleStore::from_json(RULES).unwrap();
        assert!(store
            .find_page_info("http://mirror/?u=https://shop.example.com/x")
            .unwrap()
            .is_none());
        assert!(store.page_regions("https://elsewhere.com/").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = InMemoryRuleStore::from_json(r#"{"pages": [{"urlPattern": "("}]}"#).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPattern { .. }));
    }
}
