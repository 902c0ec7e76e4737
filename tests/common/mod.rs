#![allow(dead_code)]

use formulon::{EvaluationContext, ExpressionError, Value};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A child of the shared built-in context.
pub fn context() -> EvaluationContext {
    init_logging();
    formulon::stdlib::new_context()
}

/// Evaluates `text` by interpretation and by compilation, checks that both
/// agree and returns the result.
pub fn eval_both(ctx: &EvaluationContext, text: &str) -> Result<Value, ExpressionError> {
    let interpreted = ctx.interpret(text, &[]);
    let compiled = ctx.compile_dynamic(text).and_then(|c| c.call(&[]));
    assert_eq!(
        interpreted, compiled,
        "interpreted and compiled results differ for '{}'",
        text
    );
    interpreted
}

pub fn string(s: &str) -> Value {
    Value::String(s.to_string())
}
