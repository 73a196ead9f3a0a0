//! Error types
//!
//! Nothing raised here escapes a single `process` call: the processor turns
//! every error into a listener notification plus a `ProcessError` value.

use thiserror::Error;

/// Failure while evaluating a rule expression
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("malformed expression `{expression}`: {reason}")]
    Syntax { expression: String, reason: String },

    #[error("unknown selector function `{0}`")]
    UnknownFunction(String),

    #[error("`{function}` expects {expected}")]
    BadArguments {
        function: String,
        expected: &'static str,
    },

    #[error("invalid CSS selector `{0}`")]
    InvalidSelector(String),

    #[error("invalid regex `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("content is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),
}

/// Failure inside the rule store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid url pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to decode rule set: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("rule lookup failed: {0}")]
    Lookup(String),
}

/// Failure reported by a recovery collaborator (CAPTCHA proxy, cookie store)
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

/// Fault while extracting regions from an accepted page
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no page rules registered for {0}")]
    NoPageInfo(String),

    #[error("url rule `{0}` did not yield text")]
    UrlNotText(String),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome error of one `PageProcessor::process` call
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("page {url} failed validation")]
    ValidationFailed { url: String },

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}
