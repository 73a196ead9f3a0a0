//! Selector expression parsing
//!
//! An expression is a chain of calls: `css('ul.list li').attr(href).get()`.
//! Arguments are quoted strings (single or double quotes, backslash escapes)
//! or bare tokens running up to the next top-level `,` or `)`.

use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Quoted(String),
    Bare(String),
}

impl Arg {
    pub fn as_str(&self) -> &str {
        match self {
            Arg::Quoted(s) | Arg::Bare(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Arg>,
}

/// Parse an expression into its chain of calls
pub fn parse_expression(expression: &str) -> Result<Vec<Call>, EvalError> {
    let mut parser = Parser {
        expression,
        chars: expression.char_indices().peekable(),
    };
    parser.chain()
}

struct Parser<'a> {
    expression: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn chain(&mut self) -> Result<Vec<Call>, EvalError> {
        let mut calls = Vec::new();
        loop {
            self.skip_whitespace();
            calls.push(self.call()?);
            self.skip_whitespace();
            match self.chars.next() {
                None => return Ok(calls),
                Some((_, '.')) => continue,
                Some((pos, c)) => return Err(self.error(format!("unexpected `{c}` at {pos}"))),
            }
        }
    }

    fn call(&mut self) -> Result<Call, EvalError> {
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("expected a function name".into()));
        }

        self.skip_whitespace();
        match self.chars.next() {
            Some((_, '(')) => {}
            _ => return Err(self.error(format!("expected `(` after `{name}`"))),
        }

        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some(&(_, ')')) => {
                    self.chars.next();
                    break;
                }
                Some(&(_, '\'')) | Some(&(_, '"')) => args.push(Arg::Quoted(self.quoted()?)),
                Some(_) => args.push(Arg::Bare(self.bare()?)),
                None => return Err(self.error(format!("unclosed call to `{name}`"))),
            }

            self.skip_whitespace();
            match self.chars.next() {
                Some((_, ',')) => continue,
                Some((_, ')')) => break,
                _ => return Err(self.error(format!("expected `,` or `)` in `{name}`"))),
            }
        }

        Ok(Call { name, args })
    }

    fn quoted(&mut self) -> Result<String, EvalError> {
        let quote = match self.chars.next() {
            Some((_, q)) => q,
            None => return Err(self.error("expected a quote".into())),
        };
        let mut value = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some((_, escaped)) if escaped == quote || escaped == '\\' => value.push(escaped),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                c if c == quote => return Ok(value),
                c => value.push(c),
            }
        }
        Err(self.error("unterminated string".into()))
    }

    fn bare(&mut self) -> Result<String, EvalError> {
        let mut value = String::new();
        let mut depth = 0usize;
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                '(' | '[' => depth += 1,
                ')' | ']' if depth > 0 => depth -= 1,
                ',' | ')' if depth == 0 => break,
                _ => {}
            }
            value.push(c);
            self.chars.next();
        }
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(self.error("empty argument".into()));
        }
        Ok(value)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn error(&self, reason: String) -> EvalError {
        EvalError::Syntax {
            expression: self.expression.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain() {
        let calls = parse_expression(r#"css("ul.list > li").attr(href).get()"#).unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].name, "css");
        assert_eq!(calls[0].args, vec![Arg::Quoted("ul.list > li".into())]);
        assert_eq!(calls[1].args, vec![Arg::Bare("href".into())]);
        assert!(calls[2].args.is_empty());
    }

    #[test]
    fn test_bare_selector_with_parens() {
        let calls = parse_expression("$(li:nth-child(2) a).text()").unwrap();
        assert_eq!(calls[0].name, "$");
        assert_eq!(calls[0].args, vec![Arg::Bare("li:nth-child(2) a".into())]);
    }

    #[test]
    fn test_multiple_args_and_escapes() {
        let calls = parse_expression(r#"regex('page=(\d+)', 1)"#).unwrap();
        assert_eq!(
            calls[0].args,
            vec![Arg::Quoted(r"page=(\d+)".into()), Arg::Bare("1".into())]
        );

        let calls = parse_expression(r#"constant('it\'s')"#).unwrap();
        assert_eq!(calls[0].args, vec![Arg::Quoted("it's".into())]);
    }

    #[test]
    fn test_malformed() {
        assert!(parse_expression("").is_err());
        assert!(parse_expression("css('a'").is_err());
        assert!(parse_expression("css('a') text()").is_err());
        assert!(parse_expression("text").is_err());
    }
}
