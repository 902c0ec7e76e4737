mod common;

use common::{TestResult, context, eval_both, string};
use formulon::{Decimal, Value};

#[test]
fn test_interpreted_and_compiled_agree_on_builtins() {
    let ctx = context();
    let cases = [
        ("round(pi * 100) / 100", Value::F64(3.14)),
        ("mod(17, 5) * sign(-3l)", Value::I32(-2)),
        ("max(c_int64(\"40\"), 2)", Value::I64(40)),
        ("c_decimal(\"0.1\") + 0.2m", Value::Decimal(Decimal::new(3, 1))),
        ("c_byte(255.4d)", Value::U8(255)),
        ("len(to_upper(trim(\"  ab  \")))", Value::I32(2)),
        ("substr(\"formulon\", find(\"formulon\", \"mu\"), 2)", string("mu")),
        ("regex_replace(\"a1b22\", \"[0-9]+\", \"#\")", string("a#b#")),
        ("if(contains(\"abc\", \"b\"), min(\"x\", \"y\"), \"z\")", string("x")),
        ("not(starts_with(\"abc\", \"b\")) and ends_with(\"abc\", \"c\")", Value::Bool(true)),
    ];
    for (text, expected) in cases {
        assert_eq!(eval_both(&ctx, text), Ok(expected), "{}", text);
    }
}

#[test]
fn test_function_errors_surface_at_runtime() {
    let ctx = context();
    for text in [
        "c_int32(\"seven\")",
        "substr(\"abc\", 5)",
        "regex(\"abc\", \"[\")",
        "round(1.5d, 20)",
    ] {
        let err = ctx.interpret(text, &[]).unwrap_err();
        assert!(
            matches!(err, formulon::ExpressionError::FunctionError { .. }),
            "{} gave {:?}",
            text,
            err
        );
    }
}

#[test]
fn test_overflowing_casts() {
    let ctx = context();
    assert!(ctx.interpret("c_sbyte(128)", &[]).is_err());
    assert!(ctx.interpret("c_uint64(-0.6d)", &[]).is_err());
    assert_eq!(eval_both(&ctx, "c_uint64(-0.4d)"), Ok(Value::U64(0)));
}

#[test]
fn test_variables_feed_builtins() -> TestResult {
    let ctx = context();
    ctx.set_variable("name", "Ada Lovelace")?;
    ctx.set_variable("born", 1815)?;
    assert_eq!(
        eval_both(&ctx, "substr(name, 0, find(name, \" \")) & \" (\" & c_str(born) & \")\""),
        Ok(string("Ada (1815)"))
    );
    assert_eq!(eval_both(&ctx, "find_last_i(name, \"A\")"), Ok(Value::I32(9)));
    Ok(())
}
