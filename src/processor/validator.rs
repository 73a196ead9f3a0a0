//! Page validation
//!
//! A page is accepted when its validation expression produces content.
//! Pages without a validation expression are always accepted.

use crate::error::EvalError;
use crate::page::Page;
use crate::processor::region::evaluate_on_page;
use crate::resolver::{value_text, ExpressionEvaluator, Resolved};

pub fn validate(
    evaluator: &dyn ExpressionEvaluator,
    page: &Page,
    validation_expression: Option<&str>,
) -> Result<bool, EvalError> {
    let expression = match validation_expression.map(str::trim) {
        Some(expr) if !expr.is_empty() => expr,
        _ => return Ok(true),
    };

    let valid = match evaluate_on_page(evaluator, page, expression)? {
        None => false,
        Some(Resolved::Context(context)) => context.matches(),
        Some(Resolved::Scalar(value)) => !value_text(&value).is_empty(),
        Some(Resolved::Collection(values)) => !values.is_empty(),
    };
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Request;
    use crate::resolver::SelectorEvaluator;

    fn page(body: &str) -> Page {
        Page::new(Request::new("https://example.com/item/1"), body)
    }

    #[test]
    fn test_no_rule_accepts_anything() {
        for body in ["", "<html></html>", "not even markup", "{\"json\": true}"] {
            assert!(validate(&SelectorEvaluator, &page(body), None).unwrap());
            assert!(validate(&SelectorEvaluator, &page(body), Some("  ")).unwrap());
        }
    }

    #[test]
    fn test_context_must_match() {
        let good = page(r#"<html><body><div id="content">hi</div></body></html>"#);
        let captcha = page(r#"<html><body><form id="captcha"></form></body></html>"#);
        assert!(validate(&SelectorEvaluator, &good, Some("css('#content')")).unwrap());
        assert!(!validate(&SelectorEvaluator, &captcha, Some("css('#content')")).unwrap());
    }

    #[test]
    fn test_scalar_must_be_non_empty() {
        let good = page(r#"<html><head><title>Item</title></head></html>"#);
        let blank = page(r#"<html><head><title> </title></head></html>"#);
        assert!(validate(&SelectorEvaluator, &good, Some("css('title').text()")).unwrap());
        assert!(!validate(&SelectorEvaluator, &blank, Some("css('title').text()")).unwrap());
    }

    #[test]
    fn test_json_page() {
        let api = page(r#"{"code": 0, "data": {"items": []}}"#);
        assert!(validate(&SelectorEvaluator, &api, Some("getJSON().jsonPath($.data)")).unwrap());
        assert!(!validate(&SelectorEvaluator, &api, Some("getJSON().jsonPath($.error)")).unwrap());
    }

    #[test]
    fn test_document_prologue_is_ignored() {
        for body in [
            "<!-- generated -->\n<!DOCTYPE html><html><body class=\"ok\"><p>hi</p></body></html>",
            "\u{feff}<!DOCTYPE html><html><body class=\"ok\"><p>hi</p></body></html>",
            "<?xml version=\"1.0\"?><html><body class=\"ok\"></body></html>",
        ] {
            assert!(validate(&SelectorEvaluator, &page(body), Some("css('body.ok')")).unwrap());
        }
    }

    #[test]
    fn test_malformed_rule_is_an_error() {
        assert!(validate(&SelectorEvaluator, &page("<html></html>"), Some("css(")).is_err());
    }
}
