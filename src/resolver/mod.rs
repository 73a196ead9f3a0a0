//! Expression evaluation
//!
//! The processor consumes rule expressions through [`ExpressionEvaluator`].
//! [`SelectorEvaluator`] is the built-in chained selector language.

mod css_selector;
mod expression;
mod json_path;

pub use css_selector::*;
pub use expression::{parse_expression, Arg, Call};

use regex::Regex;
use serde_json::Value;

use crate::context::{Context, Markup};
use crate::error::EvalError;
use crate::model::Request;

/// Result of evaluating one expression
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Scalar(Value),
    Collection(Vec<Value>),
    Context(Context),
}

impl Resolved {
    /// Value stored in an output record or parameter map
    pub fn to_value(&self) -> Value {
        match self {
            Resolved::Scalar(value) => value.clone(),
            Resolved::Collection(values) => Value::Array(values.clone()),
            Resolved::Context(context) => context.to_value(),
        }
    }
}

/// Evaluates rule expressions against a context
pub trait ExpressionEvaluator: Send + Sync {
    /// `Ok(None)` means the expression matched nothing
    fn resolve(
        &self,
        request: &Request,
        context: &Context,
        expression: &str,
    ) -> Result<Option<Resolved>, EvalError>;
}

/// Built-in evaluator for chained selector expressions such as
/// `css('ul.list li').attr(href)` or `getJSON().jsonPath($.items[*].url)`
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorEvaluator;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Auto,
    One,
    Many,
}

#[derive(Debug, Clone)]
enum Stage {
    Markup(Markup),
    Json(Value),
    Values(Vec<Value>, Shape),
}

impl ExpressionEvaluator for SelectorEvaluator {
    fn resolve(
        &self,
        request: &Request,
        context: &Context,
        expression: &str,
    ) -> Result<Option<Resolved>, EvalError> {
        let calls = parse_expression(expression)?;

        let mut stage = match context {
            Context::Markup(markup) => Stage::Markup(markup.clone()),
            Context::Structured(value) => Stage::Json(value.clone()),
        };
        for call in &calls {
            stage = apply(request, stage, call)?;
        }

        Ok(finish(stage))
    }
}

fn apply(request: &Request, stage: Stage, call: &Call) -> Result<Stage, EvalError> {
    let name = call.name.as_str();
    let next = match name {
        "css" | "$" => {
            let selector = arg(call, 0, "a CSS selector")?;
            Stage::Markup(select_css(&markup_of(stage), selector)?)
        }
        "text" => Stage::Values(text_values(&stage), Shape::Auto),
        "html" => strings(inner_html(&markup_of(stage))),
        "outerHtml" => strings(markup_of(stage).outer_html()),
        "attr" => {
            let attr_name = arg(call, 0, "an attribute name")?;
            strings(attrs(&markup_of(stage), attr_name))
        }
        "links" => Stage::Values(
            links(&markup_of(stage), &request.url)
                .into_iter()
                .map(Value::String)
                .collect(),
            Shape::Many,
        ),
        n if n.eq_ignore_ascii_case("getjson") || n == "json" => Stage::Json(json_of(stage)?),
        "jsonPath" => {
            let path = arg(call, 0, "a JSON path")?;
            let root = json_of(stage)?;
            let (matches, wildcard) = json_path::select(&root, path)?;
            if wildcard {
                if matches.iter().any(|v| v.is_object() || v.is_array()) {
                    Stage::Json(Value::Array(matches))
                } else {
                    Stage::Values(matches, Shape::Many)
                }
            } else {
                match matches.into_iter().next() {
                    Some(v @ (Value::Object(_) | Value::Array(_))) => Stage::Json(v),
                    Some(v) => Stage::Values(vec![v], Shape::Auto),
                    None => Stage::Values(Vec::new(), Shape::Auto),
                }
            }
        }
        "regex" => {
            let pattern = arg(call, 0, "a pattern and optional group")?;
            let re = compile(pattern)?;
            let group = match call.args.get(1) {
                Some(g) => g.as_str().parse::<usize>().map_err(|_| bad(name, "a numeric group"))?,
                None if re.captures_len() > 1 => 1,
                None => 0,
            };
            let (values, shape) = string_values(stage);
            let captured = values
                .iter()
                .filter_map(|text| {
                    re.captures(text)
                        .and_then(|c| c.get(group))
                        .map(|m| m.as_str().to_string())
                })
                .collect();
            with_shape(captured, shape)
        }
        "replace" => {
            let re = compile(arg(call, 0, "a pattern and a replacement")?)?;
            let replacement = arg(call, 1, "a pattern and a replacement")?;
            let (values, shape) = string_values(stage);
            let replaced = values
                .iter()
                .map(|text| re.replace_all(text, replacement).into_owned())
                .collect();
            with_shape(replaced, shape)
        }
        "prefix" | "suffix" => {
            let affix = arg(call, 0, "a string")?;
            let (values, shape) = string_values(stage);
            let joined = values
                .into_iter()
                .map(|text| {
                    if name == "prefix" {
                        format!("{affix}{text}")
                    } else {
                        format!("{text}{affix}")
                    }
                })
                .collect();
            with_shape(joined, shape)
        }
        "trim" => {
            let (values, shape) = string_values(stage);
            with_shape(values.iter().map(|t| t.trim().to_string()).collect(), shape)
        }
        "url" => Stage::Values(vec![Value::String(request.url.clone())], Shape::Auto),
        "extra" => {
            let key = arg(call, 0, "an extra name")?;
            match request.extra(key) {
                Some(Value::Array(items)) => Stage::Values(items.clone(), Shape::Many),
                Some(Value::Null) | None => Stage::Values(Vec::new(), Shape::Auto),
                Some(value) => Stage::Values(vec![value.clone()], Shape::Auto),
            }
        }
        "constant" => {
            let value = match call.args.first() {
                Some(Arg::Quoted(s)) => Value::String(s.clone()),
                // Bare literals keep their JSON type: constant(1) is a number
                Some(Arg::Bare(s)) => {
                    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone()))
                }
                None => return Err(bad(name, "a value")),
            };
            Stage::Values(vec![value], Shape::One)
        }
        "get" => match stage {
            Stage::Markup(markup) => Stage::Values(
                markup.outer_html().into_iter().take(1).map(Value::String).collect(),
                Shape::One,
            ),
            Stage::Values(values, _) => Stage::Values(values.into_iter().take(1).collect(), Shape::One),
            json @ Stage::Json(_) => json,
        },
        "all" => match stage {
            Stage::Markup(markup) => {
                Stage::Values(markup.outer_html().into_iter().map(Value::String).collect(), Shape::Many)
            }
            Stage::Values(values, _) => Stage::Values(values, Shape::Many),
            Stage::Json(Value::Array(items)) => Stage::Values(items, Shape::Many),
            Stage::Json(value) => Stage::Values(vec![value], Shape::Many),
        },
        "nth" => {
            let index = arg(call, 0, "an index")?
                .parse::<usize>()
                .map_err(|_| bad(name, "an index"))?;
            match stage {
                Stage::Markup(markup) => Stage::Markup(markup.nth(index)),
                Stage::Values(values, _) => {
                    Stage::Values(values.into_iter().skip(index).take(1).collect(), Shape::One)
                }
                Stage::Json(Value::Array(items)) => match items.into_iter().nth(index) {
                    Some(v @ (Value::Object(_) | Value::Array(_))) => Stage::Json(v),
                    Some(v) => Stage::Values(vec![v], Shape::One),
                    None => Stage::Values(Vec::new(), Shape::One),
                },
                Stage::Json(_) => Stage::Values(Vec::new(), Shape::One),
            }
        }
        other => return Err(EvalError::UnknownFunction(other.to_string())),
    };
    Ok(next)
}

fn finish(stage: Stage) -> Option<Resolved> {
    match stage {
        Stage::Markup(markup) if markup.is_empty() => None,
        Stage::Markup(markup) => Some(Resolved::Context(Context::Markup(markup))),
        Stage::Json(Value::Null) => None,
        Stage::Json(value) => Some(Resolved::Context(Context::Structured(value))),
        Stage::Values(values, Shape::Many) => Some(Resolved::Collection(values)),
        Stage::Values(values, shape) => {
            let mut values: Vec<Value> = values.into_iter().filter(|v| !v.is_null()).collect();
            match (values.len(), shape) {
                (0, _) => None,
                (1, _) | (_, Shape::One) => Some(Resolved::Scalar(values.swap_remove(0))),
                _ => Some(Resolved::Collection(values)),
            }
        }
    }
}

fn arg<'c>(call: &'c Call, index: usize, expected: &'static str) -> Result<&'c str, EvalError> {
    call.args
        .get(index)
        .map(Arg::as_str)
        .ok_or_else(|| bad(&call.name, expected))
}

fn bad(function: &str, expected: &'static str) -> EvalError {
    EvalError::BadArguments {
        function: function.to_string(),
        expected,
    }
}

fn compile(pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern).map_err(|source| EvalError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn strings(values: Vec<String>) -> Stage {
    with_shape(values, Shape::Auto)
}

fn with_shape(values: Vec<String>, shape: Shape) -> Stage {
    Stage::Values(values.into_iter().map(Value::String).collect(), shape)
}

/// Text form of a JSON scalar; strings lose their quotes
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Elements a markup function works on. Strings are parsed as HTML snippets.
fn markup_of(stage: Stage) -> Markup {
    match stage {
        Stage::Markup(markup) => markup,
        Stage::Values(values, _) => Markup::fragment(&values.iter().map(value_text).collect::<String>()),
        Stage::Json(Value::String(s)) => Markup::fragment(&s),
        Stage::Json(_) => Markup::fragment(""),
    }
}

fn text_values(stage: &Stage) -> Vec<Value> {
    match stage {
        Stage::Markup(markup) => texts(markup).into_iter().map(Value::String).collect(),
        Stage::Values(values, _) => values
            .iter()
            .map(|v| Value::String(value_text(v)))
            .collect(),
        Stage::Json(Value::Array(items)) => items
            .iter()
            .map(|v| Value::String(value_text(v)))
            .collect(),
        Stage::Json(value) => vec![Value::String(value_text(value))],
    }
}

/// Text inputs of a string function. Markup is matched on its raw HTML.
fn string_values(stage: Stage) -> (Vec<String>, Shape) {
    match stage {
        Stage::Values(values, shape) => (values.iter().map(value_text).collect(), shape),
        Stage::Markup(markup) => (markup.outer_html(), Shape::Auto),
        Stage::Json(Value::String(s)) => (vec![s], Shape::Auto),
        Stage::Json(_) => (Vec::new(), Shape::Auto),
    }
}

fn json_of(stage: Stage) -> Result<Value, EvalError> {
    match stage {
        Stage::Json(value) => Ok(value),
        Stage::Markup(markup) => {
            // JSON embedded in markup, e.g. a <script> body
            let text = texts(&markup).into_iter().next().unwrap_or_default();
            Ok(serde_json::from_str(&text)?)
        }
        Stage::Values(values, _) => {
            let text = values.first().map(value_text).unwrap_or_default();
            Ok(serde_json::from_str(&text)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LIST: &str = r#"
        <html>
        <head><title>Catalog</title></head>
        <body>
            <ul class="list">
                <li><span class="title">A</span><a href="/p/1">more</a></li>
                <li><span class="title">B</span><a href="/p/2">more</a></li>
            </ul>
            <div id="pager" data-next="/page/2">Page 1 of 20</div>
            <script id="state" type="application/json">{"total": 42, "tags": ["x", "y"]}</script>
        </body>
        </html>
    "#;

    fn eval(context: &Context, expression: &str) -> Option<Resolved> {
        let request = Request::new("https://shop.example.com/list")
            .with_extra("category", json!("books"));
        SelectorEvaluator.resolve(&request, context, expression).unwrap()
    }

    #[test]
    fn test_css_yields_context() {
        let page = Context::document(LIST);
        match eval(&page, "css('ul.list li')") {
            Some(Resolved::Context(ctx)) => assert_eq!(ctx.nodes().len(), 2),
            other => panic!("expected context, got {other:?}"),
        }
        assert_eq!(eval(&page, "css('.missing')"), None);
    }

    #[test]
    fn test_text_shapes() {
        let page = Context::document(LIST);
        assert_eq!(
            eval(&page, "css('title').text()"),
            Some(Resolved::Scalar(json!("Catalog")))
        );
        assert_eq!(
            eval(&page, "$('span.title').text()"),
            Some(Resolved::Collection(vec![json!("A"), json!("B")]))
        );
        assert_eq!(
            eval(&page, "$('span.title').text().get()"),
            Some(Resolved::Scalar(json!("A")))
        );
        assert_eq!(
            eval(&page, "css('title').text().all()"),
            Some(Resolved::Collection(vec![json!("Catalog")]))
        );
    }

    #[test]
    fn test_attr_regex_and_affixes() {
        let page = Context::document(LIST);
        assert_eq!(
            eval(&page, "css('#pager').attr(data-next).prefix('https://shop.example.com')"),
            Some(Resolved::Scalar(json!("https://shop.example.com/page/2")))
        );
        assert_eq!(
            eval(&page, r"css('#pager').text().regex('of (\d+)')"),
            Some(Resolved::Scalar(json!("20")))
        );
        assert_eq!(
            eval(&page, r"css('#pager').text().replace('\d+', 'N')"),
            Some(Resolved::Scalar(json!("Page N of N")))
        );
    }

    #[test]
    fn test_links_always_collection() {
        let page = Context::document(LIST);
        assert_eq!(
            eval(&page, "css('ul.list').links()"),
            Some(Resolved::Collection(vec![
                json!("https://shop.example.com/p/1"),
                json!("https://shop.example.com/p/2"),
            ]))
        );
    }

    #[test]
    fn test_json_paths() {
        let api = Context::Structured(json!({
            "data": {"items": [{"url": "http://x/1"}, {"url": "http://x/2"}], "page": 1}
        }));
        assert_eq!(
            eval(&api, "getJSON().jsonPath($.data.items[*].url)"),
            Some(Resolved::Collection(vec![json!("http://x/1"), json!("http://x/2")]))
        );
        assert_eq!(
            eval(&api, "jsonPath('$.data.page')"),
            Some(Resolved::Scalar(json!(1)))
        );
        assert_eq!(
            eval(&api, "jsonPath($.data.items)"),
            Some(Resolved::Context(Context::Structured(json!([
                {"url": "http://x/1"},
                {"url": "http://x/2"}
            ]))))
        );
        assert_eq!(eval(&api, "jsonPath($.data.missing)"), None);
    }

    #[test]
    fn test_json_embedded_in_markup() {
        let page = Context::document(LIST);
        assert_eq!(
            eval(&page, "css('#state').getJSON().jsonPath($.total)"),
            Some(Resolved::Scalar(json!(42)))
        );
    }

    #[test]
    fn test_request_functions() {
        let page = Context::document(LIST);
        assert_eq!(eval(&page, "constant(1)"), Some(Resolved::Scalar(json!(1))));
        assert_eq!(eval(&page, "constant('1')"), Some(Resolved::Scalar(json!("1"))));
        assert_eq!(
            eval(&page, "url()"),
            Some(Resolved::Scalar(json!("https://shop.example.com/list")))
        );
        assert_eq!(eval(&page, "extra(category)"), Some(Resolved::Scalar(json!("books"))));
        assert_eq!(eval(&page, "extra(missing)"), None);
    }

    #[test]
    fn test_nth() {
        let page = Context::document(LIST);
        assert_eq!(
            eval(&page, "css('span.title').nth(1).text()"),
            Some(Resolved::Scalar(json!("B")))
        );
    }

    #[test]
    fn test_errors() {
        let request = Request::new("https://shop.example.com");
        let page = Context::document(LIST);
        assert!(matches!(
            SelectorEvaluator.resolve(&request, &page, "xpath('//li')"),
            Err(EvalError::UnknownFunction(_))
        ));
        assert!(matches!(
            SelectorEvaluator.resolve(&request, &page, "css()"),
            Err(EvalError::BadArguments { .. })
        ));
        assert!(matches!(
            SelectorEvaluator.resolve(&request, &page, "css('p').regex('(')"),
            Err(EvalError::InvalidRegex { .. })
        ));
    }
}
