//! Page extraction
//!
//! [`PageProcessor::process`] is invoked once per fetched page. It validates
//! the page against its page rules, then either extracts every region and
//! reports the follow-up requests, or reports the failure and runs recovery.
//!
//! No state survives a call, so one processor can serve many worker
//! threads at once.

mod fields;
mod recovery;
mod region;
mod urls;
mod validator;

pub use fields::{evaluate_fields, FieldOutput, DATA_TYPE_KEY};
pub use recovery::{recover, RecoveryReport};
pub use region::{evaluate_on_page, resolve_context, JSON_MARKER, PAGE_SELECTOR};
pub use urls::evaluate_urls;
pub use validator::validate;

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::collaborators::{CaptchaSolver, CookieStore, PageParseListener};
use crate::error::{ExtractionError, ProcessError, StoreError};
use crate::model::PageParseRegion;
use crate::page::{Page, PageResult};
use crate::resolver::ExpressionEvaluator;
use crate::site::SiteConfig;
use crate::store::RuleStore;

/// Listener message for pages that failed validation
pub const VALIDATION_FAILED_MESSAGE: &str = "downloaded page is not the expected page";

/// Listener message for pages whose extraction faulted
pub const EXTRACTION_FAILED_MESSAGE: &str = "page parsing failed";

pub struct PageProcessor {
    rules: Arc<dyn RuleStore>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    captcha: Arc<dyn CaptchaSolver>,
    cookies: Arc<dyn CookieStore>,
    listener: Option<Arc<dyn PageParseListener>>,
    site: SiteConfig,
}

impl PageProcessor {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        captcha: Arc<dyn CaptchaSolver>,
        cookies: Arc<dyn CookieStore>,
    ) -> Self {
        Self {
            rules,
            evaluator,
            captcha,
            cookies,
            listener: None,
            site: SiteConfig::default(),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn PageParseListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_site(mut self, site: SiteConfig) -> Self {
        self.site = site;
        self
    }

    /// Crawl policy for the host engine
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Regions configured for `url`
    pub fn page_regions(&self, url: &str) -> Result<Vec<PageParseRegion>, StoreError> {
        self.rules.page_regions(url)
    }

    /// Process one fetched page.
    ///
    /// The listener, when present, hears about every outcome. Only pages
    /// that fail validation trigger CAPTCHA refresh and cookie removal.
    pub fn process(&self, page: &Page) -> Result<PageResult, ProcessError> {
        let url = page.url();

        let page_info = match self.rules.find_page_info(url) {
            Ok(Some(info)) => info,
            Ok(None) => {
                let e = ExtractionError::NoPageInfo(url.to_string());
                return Err(self.extraction_failed(page, e));
            }
            Err(e) => return Err(self.extraction_failed(page, e.into())),
        };

        match validator::validate(
            self.evaluator.as_ref(),
            page,
            page_info.validation_rule.as_deref(),
        ) {
            Ok(true) => {}
            Ok(false) => {
                warn!(url = %url, "page failed validation");
                if let Some(listener) = &self.listener {
                    listener.on_error(&page.request, VALIDATION_FAILED_MESSAGE);
                }
                recover(
                    self.captcha.as_ref(),
                    self.cookies.as_ref(),
                    &page.request,
                    &page.raw_text,
                );
                return Err(ProcessError::ValidationFailed {
                    url: url.to_string(),
                });
            }
            Err(e) => return Err(self.extraction_failed(page, e.into())),
        }

        match self.extract(page) {
            Ok(result) => {
                debug!(
                    url = %url,
                    regions = result.fields.len(),
                    child_requests = result.child_requests.len(),
                    "page extracted"
                );
                if let Some(listener) = &self.listener {
                    listener.on_success(&page.request, &result.child_requests);
                }
                Ok(result)
            }
            Err(e) => Err(self.extraction_failed(page, e)),
        }
    }

    fn extract(&self, page: &Page) -> Result<PageResult, ExtractionError> {
        let evaluator = self.evaluator.as_ref();
        let mut result = PageResult::default();

        for region in self.rules.page_regions(page.url())? {
            let Some(context) = resolve_context(evaluator, page, &region.select_expression)? else {
                debug!(url = %page.url(), region = %region.name, "region selected nothing");
                continue;
            };

            if !region.url_parse_rules.is_empty() {
                result.child_requests.extend(evaluate_urls(
                    evaluator,
                    &context,
                    &page.request,
                    &region.url_parse_rules,
                )?);
            }

            if region.field_parse_rules.is_empty() {
                continue;
            }
            if let Some(mut output) =
                evaluate_fields(evaluator, &context, &page.request, &region.field_parse_rules)?
            {
                output.tag(&region.data_type);
                result.fields.insert(region.name.clone(), output.into_value());
            }
        }

        Ok(result)
    }

    fn extraction_failed(&self, page: &Page, e: ExtractionError) -> ProcessError {
        error!(url = %page.url(), error = %e, "page extraction failed");
        if let Some(listener) = &self.listener {
            listener.on_error(&page.request, EXTRACTION_FAILED_MESSAGE);
        }
        ProcessError::Extraction(e)
    }
}
