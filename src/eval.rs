//! The closed expression language allowed inside directives.
//!
//! Only three shapes exist: `ctx[key]` lookups (symbol, quoted string, or
//! integer keys), an optional single trailing `.size` / `.length`, and the
//! literals `true` / `false`. Nothing here ever executes caller code;
//! anything outside that grammar is an [`EvalError`].

use crate::error::{EvalError, EvalErrorKind};
use crate::interface::{ParamKey, Params};
use crate::value::Value;

fn error(expression: &str, kind: EvalErrorKind) -> EvalError {
    EvalError {
        expression: expression.to_string(),
        kind,
    }
}

pub(crate) fn evaluate(expression: &str, params: &Params) -> Result<Value, EvalError> {
    let trimmed = expression.trim();
    if trimmed == "true" {
        return Ok(Value::Bool(true));
    }
    if trimmed == "false" {
        return Ok(Value::Bool(false));
    }

    let Some(rest) = trimmed.strip_prefix("ctx") else {
        return Err(error(expression, EvalErrorKind::UnknownIdentifier));
    };
    let Some(rest) = rest.trim_start().strip_prefix('[') else {
        return Err(error(expression, EvalErrorKind::UnknownIdentifier));
    };
    let (key, rest) = parse_key(rest).map_err(|kind| error(expression, kind))?;
    let Some(rest) = rest.trim_start().strip_prefix(']') else {
        return Err(error(expression, EvalErrorKind::Malformed));
    };

    // absent keys read as null, not as an error
    let value = params.lookup(&key);

    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(value);
    }
    let Some(method) = rest.strip_prefix('.') else {
        return Err(error(expression, EvalErrorKind::Malformed));
    };
    match method.trim() {
        "size" | "length" => match value {
            Value::Seq(items) => Ok(Value::Int(
                i64::try_from(items.len()).unwrap_or(i64::MAX),
            )),
            Value::Text(text) => Ok(Value::Int(
                i64::try_from(text.chars().count()).unwrap_or(i64::MAX),
            )),
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => {
                Err(error(expression, EvalErrorKind::InvalidSizeReceiver))
            }
        },
        other => Err(error(
            expression,
            EvalErrorKind::UnknownMethod {
                method: other.to_string(),
            },
        )),
    }
}

/// The key between the brackets: `:symbol`, `'string'` / `"string"`, or an
/// integer. Returns the key and the input remaining after it.
fn parse_key(input: &str) -> Result<(ParamKey, &str), EvalErrorKind> {
    let input = input.trim_start();
    if let Some(rest) = input.strip_prefix(':') {
        let len: usize = rest
            .chars()
            .take_while(|&c| c.is_ascii_alphanumeric() || c == '_')
            .map(char::len_utf8)
            .sum();
        if len == 0 {
            return Err(EvalErrorKind::InvalidKey);
        }
        return Ok((ParamKey::Name(rest[..len].to_string()), &rest[len..]));
    }
    if let Some(quote) = input.chars().next().filter(|c| matches!(c, '\'' | '"')) {
        let rest = &input[1..];
        let Some(end) = rest.find(quote) else {
            return Err(EvalErrorKind::Malformed);
        };
        return Ok((ParamKey::Name(rest[..end].to_string()), &rest[end + 1..]));
    }
    let len = input
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && c == '-'))
        .count();
    if len == 0 {
        return Err(EvalErrorKind::InvalidKey);
    }
    let index: i64 = input[..len]
        .parse()
        .map_err(|_| EvalErrorKind::InvalidKey)?;
    Ok((ParamKey::Index(index), &input[len..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Params {
        let mut params = Params::new();
        params
            .set("job", "CLERK")
            .set("list", vec![3, 4, 9])
            .set("empty", Vec::<i64>::new())
            .set_index(1, 100);
        params
    }

    #[test]
    #[ntest::timeout(100)]
    fn symbol_string_and_double_quoted_keys_are_the_same() {
        let params = params();
        for expr in ["ctx[:job]", "ctx['job']", "ctx[\"job\"]"] {
            assert_eq!(
                evaluate(expr, &params).expect("eval failed"),
                Value::from("CLERK"),
                "for {}",
                expr
            );
        }
    }

    #[test]
    #[ntest::timeout(100)]
    fn integer_keys_address_the_index_space() {
        let params = params();
        assert_eq!(evaluate("ctx[1]", &params), Ok(Value::Int(100)));
        assert_eq!(evaluate("ctx[2]", &params), Ok(Value::Null));
    }

    #[test]
    #[ntest::timeout(100)]
    fn missing_keys_are_null_not_errors() {
        assert_eq!(evaluate("ctx[:absent]", &params()), Ok(Value::Null));
    }

    #[test]
    #[ntest::timeout(100)]
    fn boolean_literals() {
        let params = Params::new();
        assert_eq!(evaluate("true", &params), Ok(Value::Bool(true)));
        assert_eq!(evaluate(" false ", &params), Ok(Value::Bool(false)));
    }

    #[test]
    #[ntest::timeout(100)]
    fn size_and_length_count_elements_and_chars() {
        let params = params();
        assert_eq!(evaluate("ctx[:list].size", &params), Ok(Value::Int(3)));
        assert_eq!(evaluate("ctx[:list].length", &params), Ok(Value::Int(3)));
        assert_eq!(evaluate("ctx[:empty].size", &params), Ok(Value::Int(0)));
        assert_eq!(evaluate("ctx[:job].size", &params), Ok(Value::Int(5)));
    }

    #[test]
    #[ntest::timeout(100)]
    fn size_of_a_scalar_is_an_error() {
        let err = evaluate("ctx[:missing].size", &params()).expect_err("should fail");
        assert_eq!(err.kind, EvalErrorKind::InvalidSizeReceiver);
    }

    #[test]
    #[ntest::timeout(100)]
    fn unknown_identifiers_are_rejected() {
        for expr in ["system('ls')", "data[:job]", "job"] {
            let err = evaluate(expr, &params()).expect_err("should fail");
            assert_eq!(err.kind, EvalErrorKind::UnknownIdentifier, "for {}", expr);
            assert_eq!(err.expression, expr);
        }
    }

    #[test]
    #[ntest::timeout(100)]
    fn unknown_methods_are_rejected() {
        let err = evaluate("ctx[:job].upcase", &params()).expect_err("should fail");
        assert_eq!(
            err.kind,
            EvalErrorKind::UnknownMethod {
                method: "upcase".to_string()
            }
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn malformed_expressions_are_rejected() {
        let params = params();
        assert!(evaluate("ctx[:job", &params).is_err());
        assert!(evaluate("ctx[]", &params).is_err());
        assert!(evaluate("ctx[:job] extra", &params).is_err());
        assert!(evaluate("ctx['job]", &params).is_err());
    }

    #[test]
    #[ntest::timeout(100)]
    fn negative_integer_keys_parse() {
        assert_eq!(evaluate("ctx[-1]", &params()), Ok(Value::Null));
    }
}
