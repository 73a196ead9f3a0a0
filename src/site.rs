//! Crawl policy handed to the host engine
//!
//! The processor only carries this; fetching and scheduling honour it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    pub domain: Option<String>,
    pub user_agent: Option<String>,
    pub charset: Option<String>,
    /// Delay between requests, in milliseconds
    pub sleep_time: u64,
    pub retry_times: u32,
    pub cycle_retry_times: u32,
    /// Request timeout, in milliseconds
    pub timeout: u64,
    pub accept_stat_codes: BTreeSet<u16>,
    pub use_gzip: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: None,
            user_agent: None,
            charset: None,
            sleep_time: 5000,
            retry_times: 0,
            cycle_retry_times: 0,
            timeout: 5000,
            accept_stat_codes: BTreeSet::from([200]),
            use_gzip: true,
        }
    }
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.accept_stat_codes.contains(&status)
    }
}
