//! Explicit casts between the numeric kinds, from strings, and to strings.
//!
//! Integer targets round fractional sources half to even and fail with an
//! overflow when the rounded value is out of range. Strings are trimmed and
//! parsed with invariant formatting.

use formulon_lang::{
    Decimal, EvaluationContext, ExpressionError, FunctionHandle, NumericKind, Result, Type, Value,
};
use formulon_value::numeric;

/// The function name of the cast to `kind`, e.g. `c_int32`.
pub fn cast_name(kind: NumericKind) -> String {
    format!("c_{}", kind.type_name())
}

pub fn load(ctx: &mut EvaluationContext) -> Result<()> {
    for target in NumericKind::ALL {
        let name = cast_name(target);
        for source in NumericKind::ALL {
            ctx.add_function(
                &name,
                FunctionHandle::new(
                    vec![Type::Numeric(source)],
                    Type::Numeric(target),
                    move |args| convert_rounded(single(args)?, target),
                ),
            );
        }
        let function = name.clone();
        ctx.add_function(
            &name,
            FunctionHandle::new(vec![Type::String], Type::Numeric(target), move |args| {
                parse_number(&function, single(args)?, target)
            }),
        );
    }
    load_to_string(ctx);
    Ok(())
}

fn single(args: &[Value]) -> Result<&Value> {
    args.first()
        .ok_or_else(|| ExpressionError::evaluation("Missing function argument."))
}

fn convert_rounded(value: &Value, target: NumericKind) -> Result<Value> {
    let rounded = match value {
        Value::F32(f) if target.is_integer() => Value::F32(f.round_ties_even()),
        Value::F64(f) if target.is_integer() => Value::F64(f.round_ties_even()),
        Value::Decimal(d) if target.is_integer() => Value::Decimal(d.round()),
        other => other.clone(),
    };
    Ok(numeric::convert(&rounded, target)?)
}

fn parse_number(function: &str, value: &Value, target: NumericKind) -> Result<Value> {
    let Value::String(text) = value else {
        return Err(ExpressionError::function(
            function,
            format!("Cannot convert {} to {}.", value.type_name(), target),
        ));
    };
    let trimmed = text.trim();
    let parsed = match target {
        NumericKind::I8 => trimmed.parse().ok().map(Value::I8),
        NumericKind::U8 => trimmed.parse().ok().map(Value::U8),
        NumericKind::I16 => trimmed.parse().ok().map(Value::I16),
        NumericKind::U16 => trimmed.parse().ok().map(Value::U16),
        NumericKind::I32 => trimmed.parse().ok().map(Value::I32),
        NumericKind::U32 => trimmed.parse().ok().map(Value::U32),
        NumericKind::I64 => trimmed.parse().ok().map(Value::I64),
        NumericKind::U64 => trimmed.parse().ok().map(Value::U64),
        NumericKind::F32 => trimmed.parse().ok().map(Value::F32),
        NumericKind::F64 => trimmed.parse().ok().map(Value::F64),
        NumericKind::Decimal => trimmed.parse::<Decimal>().ok().map(Value::Decimal),
    };
    parsed.ok_or_else(|| {
        ExpressionError::function(function, format!("'{}' is not a valid {}.", text, target))
    })
}

// --- c_str ---

fn load_to_string(ctx: &mut EvaluationContext) {
    let sources = NumericKind::ALL
        .into_iter()
        .map(Type::Numeric)
        .chain([Type::Bool, Type::String, Type::Object]);
    for source in sources {
        ctx.add_function(
            "c_str",
            FunctionHandle::new(vec![source], Type::String, |args| {
                Ok(Value::String(single(args)?.to_string()))
            }),
        );
    }
}
