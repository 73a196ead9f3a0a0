//! Rule-driven page extraction for the crawler
//!
//! Interprets externally configured rules against fetched pages:
//! - Page validation (detects CAPTCHA walls and stale sessions)
//! - Region extraction into flat or index-keyed records
//! - Follow-up request generation from URL rules
//! - CAPTCHA refresh and stale-cookie removal on failed validation
//!
//! Rules are expressed in a chained selector language over HTML (CSS
//! selectors via scraper) and JSON (JSON paths).

pub mod collaborators;
pub mod context;
pub mod error;
pub mod ffi;
pub mod model;
pub mod page;
pub mod processor;
pub mod resolver;
pub mod site;
pub mod store;

pub use collaborators::*;
pub use context::{Context, Markup};
pub use error::*;
pub use ffi::*;
pub use model::*;
pub use page::{Page, PageResult};
pub use processor::{PageProcessor, EXTRACTION_FAILED_MESSAGE, VALIDATION_FAILED_MESSAGE};
pub use resolver::{ExpressionEvaluator, Resolved, SelectorEvaluator};
pub use site::SiteConfig;
pub use store::{InMemoryRuleStore, PageRules, RuleSet, RuleStore};
