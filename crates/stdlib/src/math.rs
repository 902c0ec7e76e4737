//! Numeric functions and the constants `pi` and `e`.
//!
//! Overloads exist per numeric kind, so `abs(-2l)` stays an `int64` and
//! `min(1, 2)` stays an `int32`. Rounding is half-to-even throughout.

use formulon_lang::{Decimal, EvaluationContext, ExpressionError, FunctionHandle, Result};
use rand::Rng;
use std::f64::consts::{E, PI};

pub fn load(ctx: &mut EvaluationContext) -> Result<()> {
    ctx.set_constant("pi", PI)?;
    ctx.set_constant("e", E)?;
    load_modulo(ctx);
    load_sign(ctx);
    load_rounding(ctx);
    load_transcendental(ctx);
    load_min_max(ctx);
    ctx.add_function("rand", FunctionHandle::from_fn(|| rand::rng().random::<f64>()));
    Ok(())
}

// --- Modulo ---

macro_rules! integer_mod {
    ($ctx:expr, $($t:ty),*) => {
        $(
            $ctx.add_function(
                "mod",
                FunctionHandle::try_from_fn(|a: $t, b: $t| {
                    if b == 0 {
                        return Err(ExpressionError::DivisionByZero);
                    }
                    a.checked_rem(b).ok_or_else(|| ExpressionError::overflow("mod"))
                }),
            );
        )*
    };
}

fn load_modulo(ctx: &mut EvaluationContext) {
    integer_mod!(ctx, i32, u32, i64, u64);
    ctx.add_function("mod", FunctionHandle::from_fn(|a: f32, b: f32| a % b));
    ctx.add_function("mod", FunctionHandle::from_fn(|a: f64, b: f64| a % b));
    ctx.add_function(
        "mod",
        FunctionHandle::try_from_fn(|a: Decimal, b: Decimal| {
            if b.is_zero() {
                return Err(ExpressionError::DivisionByZero);
            }
            a.checked_rem(b).ok_or_else(|| ExpressionError::overflow("mod"))
        }),
    );
}

// --- Sign ---

macro_rules! integer_sign {
    ($ctx:expr, $($t:ty),*) => {
        $(
            $ctx.add_function(
                "abs",
                FunctionHandle::try_from_fn(|x: $t| {
                    x.checked_abs().ok_or_else(|| ExpressionError::overflow("abs"))
                }),
            );
            $ctx.add_function("sign", FunctionHandle::from_fn(|x: $t| x.signum() as i32));
        )*
    };
}

macro_rules! float_sign {
    ($ctx:expr, $($t:ty),*) => {
        $(
            $ctx.add_function("abs", FunctionHandle::from_fn(|x: $t| x.abs()));
            $ctx.add_function(
                "sign",
                FunctionHandle::try_from_fn(|x: $t| -> Result<i32> {
                    if x.is_nan() {
                        Err(ExpressionError::function("sign", "The argument is not a number."))
                    } else if x > 0.0 {
                        Ok(1)
                    } else if x < 0.0 {
                        Ok(-1)
                    } else {
                        Ok(0)
                    }
                }),
            );
        )*
    };
}

fn decimal_sign(x: Decimal) -> i32 {
    if x.is_zero() {
        0
    } else if x.is_sign_negative() {
        -1
    } else {
        1
    }
}

fn load_sign(ctx: &mut EvaluationContext) {
    integer_sign!(ctx, i8, i16, i32, i64);
    float_sign!(ctx, f32, f64);
    ctx.add_function("abs", FunctionHandle::from_fn(|x: Decimal| x.abs()));
    ctx.add_function("sign", FunctionHandle::from_fn(decimal_sign));
}

// --- Rounding ---

const MAX_DOUBLE_DIGITS: i32 = 15;
const MAX_DECIMAL_DIGITS: i32 = 28;

fn check_digits(digits: i32, max: i32) -> Result<i32> {
    if (0..=max).contains(&digits) {
        Ok(digits)
    } else {
        Err(ExpressionError::function(
            "round",
            format!("The number of digits must be between 0 and {}, got {}.", max, digits),
        ))
    }
}

fn round_double(x: f64, digits: i32) -> Result<f64> {
    let scale = 10_f64.powi(check_digits(digits, MAX_DOUBLE_DIGITS)?);
    Ok((x * scale).round_ties_even() / scale)
}

fn round_decimal(x: Decimal, digits: i32) -> Result<Decimal> {
    Ok(x.round_dp(check_digits(digits, MAX_DECIMAL_DIGITS)? as u32))
}

fn load_rounding(ctx: &mut EvaluationContext) {
    ctx.add_function("floor", FunctionHandle::from_fn(f64::floor));
    ctx.add_function("ceil", FunctionHandle::from_fn(f64::ceil));
    ctx.add_function("trunc", FunctionHandle::from_fn(f64::trunc));
    ctx.add_function("round", FunctionHandle::from_fn(f64::round_ties_even));
    ctx.add_function("round", FunctionHandle::try_from_fn(round_double));

    ctx.add_function("floor", FunctionHandle::from_fn(|x: Decimal| x.floor()));
    ctx.add_function("ceil", FunctionHandle::from_fn(|x: Decimal| x.ceil()));
    ctx.add_function("trunc", FunctionHandle::from_fn(|x: Decimal| x.trunc()));
    // rust_decimal rounds half to even
    ctx.add_function("round", FunctionHandle::from_fn(|x: Decimal| x.round()));
    ctx.add_function("round", FunctionHandle::try_from_fn(round_decimal));
}

// --- Transcendental ---

fn load_transcendental(ctx: &mut EvaluationContext) {
    ctx.add_function("sin", FunctionHandle::from_fn(f64::sin));
    ctx.add_function("cos", FunctionHandle::from_fn(f64::cos));
    ctx.add_function("tan", FunctionHandle::from_fn(f64::tan));
    ctx.add_function("asin", FunctionHandle::from_fn(f64::asin));
    ctx.add_function("acos", FunctionHandle::from_fn(f64::acos));
    ctx.add_function("atan", FunctionHandle::from_fn(f64::atan));
    ctx.add_function("atan2", FunctionHandle::from_fn(|y: f64, x: f64| y.atan2(x)));
    ctx.add_function("sinh", FunctionHandle::from_fn(f64::sinh));
    ctx.add_function("cosh", FunctionHandle::from_fn(f64::cosh));
    ctx.add_function("tanh", FunctionHandle::from_fn(f64::tanh));
    ctx.add_function("exp", FunctionHandle::from_fn(f64::exp));
    ctx.add_function("log", FunctionHandle::from_fn(f64::ln));
    ctx.add_function("log", FunctionHandle::from_fn(|x: f64, base: f64| x.log(base)));
    ctx.add_function("log10", FunctionHandle::from_fn(f64::log10));
    ctx.add_function("sqrt", FunctionHandle::from_fn(f64::sqrt));
}

// --- Min / Max ---

macro_rules! min_max {
    ($ctx:expr, $($t:ty),*) => {
        $(
            $ctx.add_function("min", FunctionHandle::from_fn(|a: $t, b: $t| a.min(b)));
            $ctx.add_function("max", FunctionHandle::from_fn(|a: $t, b: $t| a.max(b)));
        )*
    };
}

fn load_min_max(ctx: &mut EvaluationContext) {
    min_max!(ctx, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64, Decimal);
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulon_lang::Value;

    fn math() -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        load(&mut ctx).unwrap();
        ctx
    }

    fn eval(ctx: &EvaluationContext, text: &str) -> Result<Value> {
        ctx.interpret(text, &[])
    }

    fn eval_f64(ctx: &EvaluationContext, text: &str) -> f64 {
        match eval(ctx, text) {
            Ok(Value::F64(x)) => x,
            other => panic!("{} evaluated to {:?}", text, other),
        }
    }

    #[test]
    fn test_constants_are_frozen() {
        let ctx = math();
        assert_eq!(ctx.is_variable_constant("pi"), Some(true));
        assert_eq!(eval(&ctx, "pi"), Ok(Value::F64(PI)));
        assert!((eval_f64(&ctx, "log(e)") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_modulo_keeps_kind() {
        let ctx = math();
        assert_eq!(eval(&ctx, "mod(7, 3)"), Ok(Value::I32(1)));
        assert_eq!(eval(&ctx, "mod(-7l, 3l)"), Ok(Value::I64(-1)));
        assert_eq!(eval(&ctx, "mod(7.5d, 2)"), Ok(Value::F64(1.5)));
        assert_eq!(eval(&ctx, "mod(7.5m, 2m)"), Ok(Value::Decimal(Decimal::new(15, 1))));
        assert_eq!(eval(&ctx, "mod(1, 0)"), Err(ExpressionError::DivisionByZero));
        assert_eq!(eval(&ctx, "mod(1m, 0m)"), Err(ExpressionError::DivisionByZero));
    }

    #[test]
    fn test_abs_and_sign() {
        let ctx = math();
        assert_eq!(eval(&ctx, "abs(-5)"), Ok(Value::I32(5)));
        assert_eq!(eval(&ctx, "abs(-2.25d)"), Ok(Value::F64(2.25)));
        assert_eq!(eval(&ctx, "sign(-2.5)"), Ok(Value::I32(-1)));
        assert_eq!(eval(&ctx, "sign(0m)"), Ok(Value::I32(0)));
        assert_eq!(eval(&ctx, "sign(12l)"), Ok(Value::I32(1)));

        ctx.set_variable("m", i32::MIN).unwrap();
        assert_eq!(eval(&ctx, "abs(m)"), Err(ExpressionError::overflow("abs")));
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        let ctx = math();
        assert_eq!(eval(&ctx, "round(2.5d)"), Ok(Value::F64(2.0)));
        assert_eq!(eval(&ctx, "round(3.5d)"), Ok(Value::F64(4.0)));
        assert_eq!(eval(&ctx, "round(2.5m)"), Ok(Value::Decimal(Decimal::from(2))));
        assert_eq!(eval(&ctx, "round(1.2345d, 2)"), Ok(Value::F64(1.23)));
        assert_eq!(eval(&ctx, "round(1.125m, 2)"), Ok(Value::Decimal(Decimal::new(112, 2))));
        assert!(eval(&ctx, "round(1.5d, 16)").is_err());
        assert_eq!(eval(&ctx, "floor(-2.7d)"), Ok(Value::F64(-3.0)));
        assert_eq!(eval(&ctx, "ceil(2.1m)"), Ok(Value::Decimal(Decimal::from(3))));
        assert_eq!(eval(&ctx, "trunc(-2.7d)"), Ok(Value::F64(-2.0)));
    }

    #[test]
    fn test_integer_rounding_is_ambiguous() {
        let ctx = math();
        // int32 widens to both double and decimal
        assert!(eval(&ctx, "floor(1)").unwrap_err().is_semantic_error());
    }

    #[test]
    fn test_transcendental() {
        let ctx = math();
        assert_eq!(eval(&ctx, "sqrt(16)"), Ok(Value::F64(4.0)));
        assert_eq!(eval(&ctx, "sin(0)"), Ok(Value::F64(0.0)));
        assert!((eval_f64(&ctx, "log(8, 2)") - 3.0).abs() < 1e-12);
        assert!((eval_f64(&ctx, "log10(1000)") - 3.0).abs() < 1e-12);
        assert_eq!(eval(&ctx, "atan2(0, 1)"), Ok(Value::F64(0.0)));
        assert!(eval(&ctx, "sin(true)").unwrap_err().is_semantic_error());
    }

    #[test]
    fn test_min_max_pick_narrowest_overload() {
        let ctx = math();
        assert_eq!(eval(&ctx, "min(3, 7)"), Ok(Value::I32(3)));
        assert_eq!(eval(&ctx, "max(3, 7l)"), Ok(Value::I64(7)));
        assert_eq!(eval(&ctx, "max(2.5, 1)"), Ok(Value::F32(2.5)));
        assert_eq!(eval(&ctx, "min(2m, 1)"), Ok(Value::Decimal(Decimal::from(1))));
        assert!(eval(&ctx, "min(2.5, 1m)").unwrap_err().is_semantic_error());
    }

    #[test]
    fn test_rand_is_in_unit_interval() {
        let ctx = math();
        for _ in 0..100 {
            let x = eval_f64(&ctx, "rand()");
            assert!((0.0..1.0).contains(&x));
        }
    }
}
