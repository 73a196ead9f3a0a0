//! Recovery after a page failed validation
//!
//! Both steps are best effort: failures are logged and never returned.

use tracing::{info, warn};

use crate::collaborators::{CaptchaSolver, CookieStore};
use crate::model::Request;

/// What recovery managed to do for one page
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecoveryReport {
    pub captcha_refreshed: bool,
    pub cookies_deleted: usize,
}

/// Refresh the site's CAPTCHA, then drop the cookies the request was sent with
pub fn recover(
    captcha: &dyn CaptchaSolver,
    cookies: &dyn CookieStore,
    request: &Request,
    raw_body: &str,
) -> RecoveryReport {
    let mut report = RecoveryReport::default();

    match captcha.recognize(&request.url, raw_body) {
        Ok(true) => {
            info!(url = %request.url, "refreshed captcha");
            report.captcha_refreshed = true;
        }
        Ok(false) => {}
        Err(e) => warn!(url = %request.url, error = %e, "captcha refresh failed"),
    }

    let cookie_ids = request.cookie_ids();
    if !cookie_ids.is_empty() {
        match cookies.delete_cookies(&cookie_ids) {
            Ok(()) => {
                info!(url = %request.url, count = cookie_ids.len(), "removed stale cookies");
                report.cookies_deleted = cookie_ids.len();
            }
            Err(e) => warn!(url = %request.url, error = %e, "failed to remove stale cookies"),
        }
    }

    report
}
