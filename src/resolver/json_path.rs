//! JSON path navigation
//!
//! Supports the subset rule authors use: `$`, `.key`, `['key']`, `[0]`,
//! `[*]` and `.*`. A path without wildcards yields at most one value.

use serde_json::Value;

use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
    Wildcard,
}

/// Values matched by `path`, plus whether the path contained a wildcard
pub fn select(value: &Value, path: &str) -> Result<(Vec<Value>, bool), EvalError> {
    let segments = parse_path(path)?;
    let wildcard = segments.contains(&Segment::Wildcard);

    let mut current = vec![value];
    for segment in &segments {
        let mut next = Vec::new();
        for item in current {
            match segment {
                Segment::Key(key) => next.extend(item.get(key.as_str())),
                Segment::Index(idx) => next.extend(item.get(*idx)),
                Segment::Wildcard => match item {
                    Value::Array(arr) => next.extend(arr.iter()),
                    Value::Object(obj) => next.extend(obj.values()),
                    _ => {}
                },
            }
        }
        current = next;
    }

    Ok((current.into_iter().cloned().collect(), wildcard))
}

fn parse_path(path: &str) -> Result<Vec<Segment>, EvalError> {
    let invalid = |reason: &str| EvalError::Syntax {
        expression: path.to_string(),
        reason: reason.to_string(),
    };

    let mut remaining = path.trim();
    remaining = remaining.strip_prefix('$').unwrap_or(remaining);

    let mut segments = Vec::new();
    while !remaining.is_empty() {
        if let Some(rest) = remaining.strip_prefix('[') {
            let end = rest.find(']').ok_or_else(|| invalid("unclosed `[`"))?;
            let inner = rest[..end].trim();
            remaining = &rest[end + 1..];

            let segment = if inner == "*" {
                Segment::Wildcard
            } else if let Some(key) = strip_quotes(inner) {
                Segment::Key(key.to_string())
            } else if let Ok(idx) = inner.parse::<usize>() {
                Segment::Index(idx)
            } else {
                return Err(invalid("bracket must hold an index, `*` or a quoted key"));
            };
            segments.push(segment);
        } else if let Some(rest) = remaining.strip_prefix('.') {
            let end = rest.find(|c| c == '.' || c == '[').unwrap_or(rest.len());
            let key = rest[..end].trim();
            remaining = &rest[end..];

            match key {
                "" => return Err(invalid("empty key")),
                "*" => segments.push(Segment::Wildcard),
                key => segments.push(Segment::Key(key.to_string())),
            }
        } else {
            // Paths may omit the leading `$.`
            let end = remaining.find(|c| c == '.' || c == '[').unwrap_or(remaining.len());
            segments.push(Segment::Key(remaining[..end].trim().to_string()));
            remaining = &remaining[end..];
        }
    }

    Ok(segments)
}

fn strip_quotes(s: &str) -> Option<&str> {
    s.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| s.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Value {
        json!({
            "data": {
                "items": [
                    {"id": 1, "url": "http://x/1", "meta": {"page-no": 3}},
                    {"id": 2, "url": "http://x/2"}
                ]
            }
        })
    }

    #[test]
    fn test_definite_path() {
        let (values, wildcard) = select(&data(), "$.data.items[1].url").unwrap();
        assert_eq!(values, vec![json!("http://x/2")]);
        assert!(!wildcard);

        let (values, _) = select(&data(), "$.data.items[0].meta['page-no']").unwrap();
        assert_eq!(values, vec![json!(3)]);

        let (values, _) = select(&data(), "data.items[0].id").unwrap();
        assert_eq!(values, vec![json!(1)]);
    }

    #[test]
    fn test_wildcard_path() {
        let (values, wildcard) = select(&data(), "$.data.items[*].url").unwrap();
        assert_eq!(values, vec![json!("http://x/1"), json!("http://x/2")]);
        assert!(wildcard);
    }

    #[test]
    fn test_missing_path() {
        let (values, _) = select(&data(), "$.data.missing").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_root_path() {
        let (values, _) = select(&data(), "$").unwrap();
        assert_eq!(values, vec![data()]);
    }

    #[test]
    fn test_invalid_path() {
        assert!(select(&data(), "$.data[abc]").is_err());
        assert!(select(&data(), "$.data[0").is_err());
    }
}
