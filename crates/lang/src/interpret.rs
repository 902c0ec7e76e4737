//! Tree-walking evaluation.

use crate::ast::ExpressionElement;
use crate::context::EvaluationContext;
use crate::error::{ExpressionError, Result};
use crate::member::null_or_mismatch;
use crate::semantic::{Binding, branch_type, resolve_function, resolve_member, resolve_name};
use formulon_value::{Type, Value, numeric};

/// Converts a numeric value to the numeric kind of `target`. Other values pass
/// through unchanged.
pub(crate) fn coerce(value: Value, target: &Type) -> Result<Value> {
    match (value.numeric_kind(), target.numeric_kind()) {
        (Some(from), Some(to)) if from != to => Ok(numeric::convert(&value, to)?),
        _ => Ok(value),
    }
}

pub(crate) fn check_variable_type(name: &str, value: Value, expected: &Type) -> Result<Value> {
    if value.is_instance_of(expected) {
        Ok(value)
    } else {
        Err(ExpressionError::evaluation(format!(
            "The variable '{}' holds a {} but was checked as {}.",
            name,
            value.type_name(),
            expected
        )))
    }
}

pub(crate) fn condition_value(value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        ExpressionError::evaluation(format!(
            "The condition evaluated to {} instead of a boolean value.",
            value.type_name()
        ))
    })
}

fn unparsed(source: &str, kind: &str) -> ExpressionError {
    ExpressionError::evaluation(format!("Error parsing '{}' as {} literal.", source, kind))
}

impl ExpressionElement {
    /// Evaluates the tree directly. `params` are the values of the parameters
    /// declared on `ctx`, in declaration order.
    pub fn interpreted_value(&self, ctx: &EvaluationContext, params: &[Value]) -> Result<Value> {
        match self {
            ExpressionElement::NullLiteral { .. } => Ok(Value::Null),
            ExpressionElement::BooleanLiteral { value, .. } => Ok(Value::Bool(*value)),
            ExpressionElement::IntegerLiteral { value, source } => {
                value.clone().ok_or_else(|| unparsed(source, "integer"))
            }
            ExpressionElement::FloatingPointLiteral { value, source } => {
                value.clone().ok_or_else(|| unparsed(source, "real number"))
            }
            ExpressionElement::DecimalLiteral { value, source } => value
                .map(Value::Decimal)
                .ok_or_else(|| unparsed(source, "decimal number")),
            ExpressionElement::StringLiteral { value, .. } => Ok(Value::String(value.clone())),
            ExpressionElement::Variable { name } => match resolve_name(ctx, name) {
                Some(Binding::Parameter { position, .. }) => {
                    params.get(position).cloned().ok_or_else(|| {
                        ExpressionError::evaluation(format!("Missing value for parameter '{}'.", name))
                    })
                }
                Some(Binding::Variable { value_type }) => {
                    let value = ctx.read_variable(name).ok_or_else(|| {
                        ExpressionError::UnknownVariable { name: name.clone() }
                    })?;
                    log::trace!("Read variable '{}' = {:?}", name, value);
                    check_variable_type(name, value, &value_type)
                }
                None => Err(ExpressionError::UnknownVariable { name: name.clone() }),
            },
            ExpressionElement::FunctionCall { name, arguments } => {
                let handle = resolve_function(ctx, name, arguments).map_err(ExpressionError::semantic)?;
                let args = arguments
                    .iter()
                    .zip(handle.parameter_types())
                    .map(|(argument, param)| coerce(argument.interpreted_value(ctx, params)?, param))
                    .collect::<Result<Vec<_>>>()?;
                handle.call(&args)
            }
            ExpressionElement::Conditional { arguments, .. } => {
                let [condition, then_branch, else_branch] = arguments.as_slice() else {
                    return Err(ExpressionError::semantic(
                        "The conditional must have three arguments.",
                    ));
                };
                let branch = if condition_value(&condition.interpreted_value(ctx, params)?)? {
                    then_branch
                } else {
                    else_branch
                };
                let result_type = branch_type(&then_branch.value_type(ctx), &else_branch.value_type(ctx))
                    .unwrap_or(Type::Object);
                let value = branch.interpreted_value(ctx, params)?;
                if branch.value_type(ctx) == result_type {
                    Ok(value)
                } else {
                    coerce(value, &result_type)
                }
            }
            ExpressionElement::NullTest { arguments, .. } => match arguments.as_slice() {
                [argument] => Ok(Value::Bool(argument.interpreted_value(ctx, params)?.is_null())),
                _ => Err(ExpressionError::semantic("The null test must have one argument.")),
            },
            ExpressionElement::MemberRead { target, member } => {
                let resolved = resolve_member(ctx, target, member).map_err(ExpressionError::semantic)?;
                let value = target.interpreted_value(ctx, params)?;
                if value.is_null() {
                    return Err(null_or_mismatch(&value, member));
                }
                resolved.read(&value)
            }
            ExpressionElement::Group(inner) => inner.interpreted_value(ctx, params),
            ExpressionElement::Operation {
                left,
                operator,
                right,
            } => {
                let l = left.interpreted_value(ctx, params)?;
                let r = right.interpreted_value(ctx, params)?;
                operator.evaluate(l, r)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionHandle;
    use crate::options::LanguageOptions;

    fn interpret(ctx: &EvaluationContext, text: &str) -> Result<Value> {
        ctx.interpret(text, &[])
    }

    #[test]
    fn test_arithmetic() {
        let ctx = EvaluationContext::new();
        assert_eq!(interpret(&ctx, "1 + 2"), Ok(Value::I32(3)));
        assert_eq!(interpret(&ctx, "1 & 2 + 3"), Ok(Value::String("15".into())));
        assert_eq!(interpret(&ctx, "2 ^ 10"), Ok(Value::F64(1024.0)));
        assert_eq!(interpret(&ctx, "7 / 2"), Ok(Value::I32(3)));
        assert_eq!(interpret(&ctx, "1 / 0"), Err(ExpressionError::DivisionByZero));
    }

    #[test]
    fn test_boolean_priorities() {
        let ctx = EvaluationContext::new();
        assert_eq!(interpret(&ctx, "false xor true and true"), Ok(Value::Bool(true)));
        assert_eq!(interpret(&ctx, "1 < 2 and 3 >= 3"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_variables_and_parameters() {
        let mut ctx = EvaluationContext::new();
        ctx.set_variable("x", 2).unwrap();
        ctx.set_parameters([("x", Type::F64)]).unwrap();
        // parameters shadow variables
        assert_eq!(ctx.interpret("x + 1", &[Value::F64(0.5)]), Ok(Value::F64(1.5)));
        ctx.clear_parameters();
        assert_eq!(ctx.interpret("x + 1", &[]), Ok(Value::I32(3)));
        assert!(ctx.interpret("x + 1", &[Value::I32(1)]).is_err());
    }

    #[test]
    fn test_function_arguments_are_converted() {
        let mut ctx = EvaluationContext::new();
        ctx.add_function("half", FunctionHandle::from_fn(|x: f64| x / 2.0));
        assert_eq!(interpret(&ctx, "half(3)"), Ok(Value::F64(1.5)));
    }

    #[test]
    fn test_conditional_evaluates_one_branch() {
        let ctx = EvaluationContext::new();
        assert_eq!(interpret(&ctx, "if(true, 1, 1 / 0)"), Ok(Value::I32(1)));
        assert_eq!(interpret(&ctx, "if(false, 1, 2l)"), Ok(Value::I64(2)));
        assert_eq!(interpret(&ctx, "if(true, 1, 2l)"), Ok(Value::I64(1)));
    }

    #[test]
    fn test_null_handling() {
        let ctx = EvaluationContext::new();
        ctx.set_variable("x", Value::Null).unwrap();
        assert_eq!(interpret(&ctx, "if(x = null, \"0\", \"1\")"), Ok(Value::String("0".into())));
        assert_eq!(interpret(&ctx, "isnull(x)"), Ok(Value::Bool(true)));
        assert_eq!(interpret(&ctx, "isnull(1)"), Ok(Value::Bool(false)));
        assert_eq!(interpret(&ctx, "\"a\" & null"), Ok(Value::String("a".into())));
    }

    #[test]
    fn test_member_read() {
        let options = LanguageOptions::builder().with_member_read().build();
        let ctx = EvaluationContext::with_options(options);
        assert_eq!(interpret(&ctx, "\"héllo\".Length"), Ok(Value::I32(5)));
        assert_eq!(interpret(&ctx, "(\"a\" & \"bc\").Length * 2"), Ok(Value::I32(6)));
        ctx.set_variable("s", Value::Null).unwrap();
        assert!(interpret(&ctx, "s.Length").unwrap_err().is_semantic_error());
    }

    #[test]
    fn test_stale_tree_sees_new_variable_value() {
        let ctx = EvaluationContext::new();
        ctx.set_variable("x", 1).unwrap();
        let expression = ctx.parse_and_check("x + 1").unwrap();
        ctx.set_variable("x", "text").unwrap();
        assert!(expression.interpreted_value(&ctx, &[]).is_err());
    }
}
