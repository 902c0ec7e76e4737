//! String functions.
//!
//! Positions and lengths count characters, not bytes. Searches return `-1`
//! when nothing is found; positions outside the string are errors.

use formulon_lang::{EvaluationContext, ExpressionError, FunctionHandle, Result};

pub fn load(ctx: &mut EvaluationContext) -> Result<()> {
    ctx.add_function("len", FunctionHandle::try_from_fn(|s: String| char_count("len", &s)));
    ctx.add_function("to_lower", FunctionHandle::from_fn(|s: String| s.to_lowercase()));
    ctx.add_function("to_upper", FunctionHandle::from_fn(|s: String| s.to_uppercase()));
    ctx.add_function("trim", FunctionHandle::from_fn(|s: String| s.trim().to_string()));
    ctx.add_function(
        "trim_start",
        FunctionHandle::from_fn(|s: String| s.trim_start().to_string()),
    );
    ctx.add_function("trim_end", FunctionHandle::from_fn(|s: String| s.trim_end().to_string()));

    ctx.add_function("substr", FunctionHandle::try_from_fn(|s: String, start: i32| substr(&s, start, None)));
    ctx.add_function(
        "substr",
        FunctionHandle::try_from_fn(|s: String, start: i32, count: i32| substr(&s, start, Some(count))),
    );
    ctx.add_function("remove", FunctionHandle::try_from_fn(|s: String, start: i32| remove(&s, start, None)));
    ctx.add_function(
        "remove",
        FunctionHandle::try_from_fn(|s: String, start: i32, count: i32| remove(&s, start, Some(count))),
    );
    ctx.add_function("replace", FunctionHandle::try_from_fn(replace));

    for search in [
        Search::new("find", false, false),
        Search::new("find_i", false, true),
        Search::new("find_last", true, false),
        Search::new("find_last_i", true, true),
    ] {
        search.register(ctx);
    }

    ctx.add_function("contains", FunctionHandle::from_fn(|s: String, t: String| s.contains(&t)));
    ctx.add_function(
        "starts_with",
        FunctionHandle::from_fn(|s: String, t: String| s.starts_with(&t)),
    );
    ctx.add_function("ends_with", FunctionHandle::from_fn(|s: String, t: String| s.ends_with(&t)));

    ctx.add_function("min", FunctionHandle::from_fn(|a: String, b: String| if a <= b { a } else { b }));
    ctx.add_function("max", FunctionHandle::from_fn(|a: String, b: String| if a >= b { a } else { b }));
    ctx.add_function(
        "min_i",
        FunctionHandle::from_fn(|a: String, b: String| {
            if a.to_lowercase() <= b.to_lowercase() { a } else { b }
        }),
    );
    ctx.add_function(
        "max_i",
        FunctionHandle::from_fn(|a: String, b: String| {
            if a.to_lowercase() >= b.to_lowercase() { a } else { b }
        }),
    );
    Ok(())
}

fn char_count(function: &str, s: &str) -> Result<i32> {
    i32::try_from(s.chars().count()).map_err(|_| ExpressionError::overflow(function))
}

fn out_of_range(function: &str, what: &str, value: i32, len: usize) -> ExpressionError {
    ExpressionError::function(
        function,
        format!("The {} {} is out of range for a string of length {}.", what, value, len),
    )
}

/// Validates `start` and `count` against `len` and returns the character range.
fn char_range(function: &str, len: usize, start: i32, count: Option<i32>) -> Result<(usize, usize)> {
    let begin = usize::try_from(start)
        .ok()
        .filter(|&b| b <= len)
        .ok_or_else(|| out_of_range(function, "start index", start, len))?;
    let end = match count {
        None => len,
        Some(count) => usize::try_from(count)
            .ok()
            .map(|c| begin + c)
            .filter(|&e| e <= len)
            .ok_or_else(|| out_of_range(function, "length", count, len))?,
    };
    Ok((begin, end))
}

fn substr(s: &str, start: i32, count: Option<i32>) -> Result<String> {
    let (begin, end) = char_range("substr", s.chars().count(), start, count)?;
    Ok(s.chars().skip(begin).take(end - begin).collect())
}

fn remove(s: &str, start: i32, count: Option<i32>) -> Result<String> {
    let (begin, end) = char_range("remove", s.chars().count(), start, count)?;
    Ok(s.chars()
        .enumerate()
        .filter(|(i, _)| *i < begin || *i >= end)
        .map(|(_, c)| c)
        .collect())
}

fn replace(s: String, from: String, to: String) -> Result<String> {
    if from.is_empty() {
        return Err(ExpressionError::function("replace", "The string to replace must not be empty."));
    }
    Ok(s.replace(&from, &to))
}

// --- Search ---

fn chars_equal(a: char, b: char, ignore_case: bool) -> bool {
    a == b || (ignore_case && a.to_lowercase().eq(b.to_lowercase()))
}

/// One of the `find` functions.
///
/// A forward search scans `count` characters starting at `start`. A backward
/// search starts at `start` and scans `count` characters towards the
/// beginning, so the window is `start - count + 1 ..= start`.
#[derive(Debug, Clone, Copy)]
struct Search {
    name: &'static str,
    backward: bool,
    ignore_case: bool,
}

impl Search {
    fn new(name: &'static str, backward: bool, ignore_case: bool) -> Self {
        Self {
            name,
            backward,
            ignore_case,
        }
    }

    fn register(self, ctx: &mut EvaluationContext) {
        ctx.add_function(
            self.name,
            FunctionHandle::try_from_fn(move |s: String, t: String| self.run(&s, &t, None, None)),
        );
        ctx.add_function(
            self.name,
            FunctionHandle::try_from_fn(move |s: String, t: String, start: i32| {
                self.run(&s, &t, Some(start), None)
            }),
        );
        ctx.add_function(
            self.name,
            FunctionHandle::try_from_fn(move |s: String, t: String, start: i32, count: i32| {
                self.run(&s, &t, Some(start), Some(count))
            }),
        );
    }

    fn window(self, len: usize, start: Option<i32>, count: Option<i32>) -> Result<(usize, usize)> {
        if !self.backward {
            return char_range(self.name, len, start.unwrap_or(0), count);
        }
        let last = match start {
            None => len - 1,
            Some(start) => usize::try_from(start)
                .ok()
                .filter(|&s| s < len)
                .ok_or_else(|| out_of_range(self.name, "start index", start, len))?,
        };
        let begin = match count {
            None => 0,
            Some(count) => usize::try_from(count)
                .ok()
                .filter(|&c| c <= last + 1)
                .map(|c| last + 1 - c)
                .ok_or_else(|| out_of_range(self.name, "length", count, len))?,
        };
        Ok((begin, last + 1))
    }

    fn run(self, haystack: &str, needle: &str, start: Option<i32>, count: Option<i32>) -> Result<i32> {
        let hay: Vec<char> = haystack.chars().collect();
        let pattern: Vec<char> = needle.chars().collect();
        if self.backward && hay.is_empty() {
            return Ok(if pattern.is_empty() { 0 } else { -1 });
        }
        let (begin, end) = self.window(hay.len(), start, count)?;
        if pattern.is_empty() {
            let position = if self.backward { end } else { begin };
            return Ok(position as i32);
        }
        if end - begin < pattern.len() {
            return Ok(-1);
        }
        let matches_at = |p: &usize| {
            hay[*p..*p + pattern.len()]
                .iter()
                .zip(&pattern)
                .all(|(a, b)| chars_equal(*a, *b, self.ignore_case))
        };
        let mut positions = begin..=end - pattern.len();
        let found = if self.backward {
            positions.rfind(matches_at)
        } else {
            positions.find(matches_at)
        };
        log::trace!("{}('{}', '{}') found {:?}", self.name, haystack, needle, found);
        Ok(found.map_or(-1, |p| p as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulon_lang::Value;

    fn strings() -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        load(&mut ctx).unwrap();
        ctx
    }

    fn eval(ctx: &EvaluationContext, text: &str) -> Result<Value> {
        ctx.interpret(text, &[])
    }

    fn string(s: &str) -> Result<Value> {
        Ok(Value::String(s.to_string()))
    }

    #[test]
    fn test_case_and_trim() {
        let ctx = strings();
        assert_eq!(eval(&ctx, "len(\"héllo\")"), Ok(Value::I32(5)));
        assert_eq!(eval(&ctx, "to_upper(\"abc\")"), string("ABC"));
        assert_eq!(eval(&ctx, "to_lower(\"ÄB\")"), string("äb"));
        assert_eq!(eval(&ctx, "trim(\"  a b  \")"), string("a b"));
        assert_eq!(eval(&ctx, "trim_start(\"  a \")"), string("a "));
        assert_eq!(eval(&ctx, "trim_end(\"  a \")"), string("  a"));
    }

    #[test]
    fn test_substr_and_remove_count_characters() {
        let ctx = strings();
        assert_eq!(eval(&ctx, "substr(\"héllo\", 1)"), string("éllo"));
        assert_eq!(eval(&ctx, "substr(\"héllo\", 1, 3)"), string("éll"));
        assert_eq!(eval(&ctx, "substr(\"abc\", 3)"), string(""));
        assert_eq!(eval(&ctx, "remove(\"héllo\", 1, 2)"), string("hlo"));
        assert_eq!(eval(&ctx, "remove(\"abc\", 1)"), string("a"));
        assert!(matches!(
            eval(&ctx, "substr(\"abc\", 4)"),
            Err(ExpressionError::FunctionError { .. })
        ));
        assert!(eval(&ctx, "substr(\"abc\", 1, 3)").is_err());
        assert!(eval(&ctx, "remove(\"abc\", -1)").is_err());
    }

    #[test]
    fn test_replace() {
        let ctx = strings();
        assert_eq!(eval(&ctx, "replace(\"a-b-c\", \"-\", \"+\")"), string("a+b+c"));
        assert!(eval(&ctx, "replace(\"abc\", \"\", \"x\")").is_err());
    }

    #[test]
    fn test_find_forward() {
        let ctx = strings();
        assert_eq!(eval(&ctx, "find(\"abcabc\", \"bc\")"), Ok(Value::I32(1)));
        assert_eq!(eval(&ctx, "find(\"abcabc\", \"bc\", 2)"), Ok(Value::I32(4)));
        assert_eq!(eval(&ctx, "find(\"abcabc\", \"bc\", 2, 3)"), Ok(Value::I32(-1)));
        assert_eq!(eval(&ctx, "find(\"abcabc\", \"BC\")"), Ok(Value::I32(-1)));
        assert_eq!(eval(&ctx, "find_i(\"abcabc\", \"BC\")"), Ok(Value::I32(1)));
        assert_eq!(eval(&ctx, "find(\"abc\", \"\", 2)"), Ok(Value::I32(2)));
        assert!(eval(&ctx, "find(\"abc\", \"a\", 4)").is_err());
    }

    #[test]
    fn test_find_backward() {
        let ctx = strings();
        assert_eq!(eval(&ctx, "find_last(\"abcabc\", \"bc\")"), Ok(Value::I32(4)));
        assert_eq!(eval(&ctx, "find_last(\"abcabc\", \"bc\", 3)"), Ok(Value::I32(1)));
        // the window 3..=5 cannot hold the earlier match
        assert_eq!(eval(&ctx, "find_last(\"abcabc\", \"bc\", 5, 3)"), Ok(Value::I32(4)));
        assert_eq!(eval(&ctx, "find_last(\"abcabc\", \"ab\", 5, 2)"), Ok(Value::I32(-1)));
        assert_eq!(eval(&ctx, "find_last_i(\"aBcAbC\", \"bc\")"), Ok(Value::I32(4)));
        assert_eq!(eval(&ctx, "find_last(\"\", \"a\")"), Ok(Value::I32(-1)));
        assert!(eval(&ctx, "find_last(\"abc\", \"a\", 3)").is_err());
        assert!(eval(&ctx, "find_last(\"abc\", \"a\", 1, 3)").is_err());
    }

    #[test]
    fn test_predicates() {
        let ctx = strings();
        assert_eq!(eval(&ctx, "contains(\"haystack\", \"st\")"), Ok(Value::Bool(true)));
        assert_eq!(eval(&ctx, "starts_with(\"haystack\", \"hay\")"), Ok(Value::Bool(true)));
        assert_eq!(eval(&ctx, "ends_with(\"haystack\", \"hay\")"), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_min_max() {
        let ctx = strings();
        assert_eq!(eval(&ctx, "min(\"b\", \"a\")"), string("a"));
        assert_eq!(eval(&ctx, "max(\"B\", \"a\")"), string("a"));
        assert_eq!(eval(&ctx, "max_i(\"B\", \"a\")"), string("B"));
        assert_eq!(eval(&ctx, "min_i(\"B\", \"a\")"), string("a"));
    }

    #[test]
    fn test_null_variable_has_no_string_overload() {
        let ctx = strings();
        ctx.set_variable("s", Option::<String>::None).unwrap();
        assert!(eval(&ctx, "len(s)").unwrap_err().is_semantic_error());
    }
}
