use formulon_lang::{EvaluationContext, ExpressionError, FunctionHandle, Result};
use regex::Regex;

pub fn load(ctx: &mut EvaluationContext) -> Result<()> {
    ctx.add_function("regex", FunctionHandle::try_from_fn(is_match));
    ctx.add_function("regex_match", FunctionHandle::try_from_fn(first_match));
    ctx.add_function("regex_replace", FunctionHandle::try_from_fn(replace_all));
    Ok(())
}

fn build_regex(function: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        ExpressionError::function(function, format!("Invalid regex pattern: {}", e))
    })
}

fn is_match(input: String, pattern: String) -> Result<bool> {
    Ok(build_regex("regex", &pattern)?.is_match(&input))
}

/// The first match, or `null` when the pattern does not match.
fn first_match(input: String, pattern: String) -> Result<Option<String>> {
    let regex = build_regex("regex_match", &pattern)?;
    Ok(regex.find(&input).map(|m| m.as_str().to_string()))
}

/// Replaces every match; `$1` and `${name}` refer to capture groups.
fn replace_all(input: String, pattern: String, replacement: String) -> Result<String> {
    let regex = build_regex("regex_replace", &pattern)?;
    Ok(regex.replace_all(&input, replacement.as_str()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulon_lang::Value;

    fn patterns() -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        load(&mut ctx).unwrap();
        ctx
    }

    fn eval(ctx: &EvaluationContext, text: &str) -> Result<Value> {
        ctx.interpret(text, &[])
    }

    #[test]
    fn test_regex_is_match() {
        let ctx = patterns();
        assert_eq!(eval(&ctx, r#"regex("abc123", "[0-9]+")"#), Ok(Value::Bool(true)));
        assert_eq!(eval(&ctx, r#"regex("abc", "^[0-9]+$")"#), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_regex_match_returns_null_without_match() {
        let ctx = patterns();
        assert_eq!(
            eval(&ctx, r#"regex_match("abc123def", "[0-9]+")"#),
            Ok(Value::String("123".into()))
        );
        assert_eq!(eval(&ctx, r#"regex_match("abc", "[0-9]+")"#), Ok(Value::Null));
        assert_eq!(
            eval(&ctx, r#"isnull(regex_match("abc", "x"))"#),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_regex_replace_with_groups() {
        let ctx = patterns();
        assert_eq!(
            eval(&ctx, r#"regex_replace("2024-05-17", "([0-9]+)-([0-9]+)-([0-9]+)", "$3.$2.$1")"#),
            Ok(Value::String("17.05.2024".into()))
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let ctx = patterns();
        let err = eval(&ctx, r#"regex("abc", "(")"#).unwrap_err();
        assert!(matches!(err, ExpressionError::FunctionError { ref function, .. } if function == "regex"));
    }
}
