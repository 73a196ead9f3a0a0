//! URL rule evaluation

use serde_json::{Map, Value};
use tracing::debug;

use crate::context::Context;
use crate::error::ExtractionError;
use crate::model::{CrawlerRequest, Request, UrlParseRule};
use crate::resolver::{value_text, ExpressionEvaluator, Resolved};

/// Follow-up requests produced by applying `rules` to every node of
/// `context`, ordered by node then by rule.
///
/// Parameters are evaluated once per node and rule; every request spawned
/// by that step receives its own copy of them.
pub fn evaluate_urls(
    evaluator: &dyn ExpressionEvaluator,
    context: &Context,
    request: &Request,
    rules: &[UrlParseRule],
) -> Result<Vec<CrawlerRequest>, ExtractionError> {
    let mut child_requests = Vec::new();

    for node in context.nodes() {
        for rule in rules {
            let resolved = evaluator.resolve(request, &node, &rule.rule)?;

            let mut params = Map::new();
            for param in &rule.url_rule_params {
                let value = evaluator
                    .resolve(request, &node, &param.expression)?
                    .map(|resolved| resolved.to_value())
                    .unwrap_or(Value::Null);
                params.insert(param.param_name.clone(), value);
            }

            let urls = match resolved {
                Some(Resolved::Scalar(value)) => vec![value_text(&value)],
                Some(Resolved::Collection(values)) => values.iter().map(value_text).collect(),
                Some(Resolved::Context(_)) => {
                    return Err(ExtractionError::UrlNotText(rule.rule.clone()))
                }
                None => Vec::new(),
            };

            let (urls, blank): (Vec<String>, Vec<String>) =
                urls.into_iter().partition(|url| !url.is_empty());
            if !blank.is_empty() {
                debug!(url = %request.url, rule = %rule.rule, skipped = blank.len(), "url rule yielded empty urls");
            }
            if urls.is_empty() {
                debug!(url = %request.url, rule = %rule.rule, "url rule matched nothing");
            }
            child_requests.extend(
                urls.into_iter()
                    .map(|url| CrawlerRequest::new(url, rule.method.clone(), params.clone())),
            );
        }
    }

    Ok(child_requests)
}
