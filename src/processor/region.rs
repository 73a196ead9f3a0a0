//! Region context resolution
//!
//! Expressions run against the page's markup root unless they mention the
//! JSON accessor, in which case they run against the structured root.

use tracing::debug;

use crate::context::Context;
use crate::error::EvalError;
use crate::page::Page;
use crate::resolver::{ExpressionEvaluator, Resolved};

/// Select expression addressing the whole page
pub const PAGE_SELECTOR: &str = "page";

/// Marker (matched case-insensitively) routing an expression to the JSON root
pub const JSON_MARKER: &str = "getjson()";

/// Evaluate `expression` against the root the expression addresses.
///
/// Blank expressions and the `page` sentinel yield the markup root itself.
pub fn evaluate_on_page(
    evaluator: &dyn ExpressionEvaluator,
    page: &Page,
    expression: &str,
) -> Result<Option<Resolved>, EvalError> {
    let expression = expression.trim();
    if expression.is_empty() || expression == PAGE_SELECTOR {
        return Ok(Some(Resolved::Context(page.html())));
    }

    if expression.to_lowercase().contains(JSON_MARKER) {
        match page.json() {
            Some(root) => evaluator.resolve(&page.request, &root, expression),
            None => {
                debug!(url = %page.url(), expression, "page body is not JSON");
                Ok(None)
            }
        }
    } else {
        evaluator.resolve(&page.request, &page.html(), expression)
    }
}

/// Context of a region, `None` when the expression selects nothing usable
pub fn resolve_context(
    evaluator: &dyn ExpressionEvaluator,
    page: &Page,
    select_expression: &str,
) -> Result<Option<Context>, EvalError> {
    match evaluate_on_page(evaluator, page, select_expression)? {
        Some(Resolved::Context(context)) => Ok(Some(context)),
        Some(other) => {
            debug!(url = %page.url(), select_expression, resolved = ?other, "region did not select a context");
            Ok(None)
        }
        None => Ok(None),
    }
}
