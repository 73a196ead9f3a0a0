//! Services the processor calls out to

use std::collections::BTreeSet;

use crate::error::CollaboratorError;
use crate::model::{CrawlerRequest, Request};

/// Refreshes the CAPTCHA a site put in front of a page
pub trait CaptchaSolver: Send + Sync {
    /// `Ok(true)` when the CAPTCHA was recognised and submitted
    fn recognize(&self, url: &str, raw_body: &str) -> Result<bool, CollaboratorError>;
}

/// Site cookie storage
pub trait CookieStore: Send + Sync {
    fn delete_cookies(&self, ids: &BTreeSet<String>) -> Result<(), CollaboratorError>;
}

/// Receives the outcome of every processed page
pub trait PageParseListener: Send + Sync {
    fn on_success(&self, request: &Request, child_requests: &[CrawlerRequest]);

    fn on_error(&self, request: &Request, message: &str);
}

/// Solver for hosts without CAPTCHA support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCaptcha;

impl CaptchaSolver for NoCaptcha {
    fn recognize(&self, _url: &str, _raw_body: &str) -> Result<bool, CollaboratorError> {
        Ok(false)
    }
}

/// Cookie store for hosts that do not persist cookies
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCookies;

impl CookieStore for NoCookies {
    fn delete_cookies(&self, _ids: &BTreeSet<String>) -> Result<(), CollaboratorError> {
        Ok(())
    }
}
