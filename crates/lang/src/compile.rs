//! Compilation of checked trees into closure trees.
//!
//! Every node becomes a [`CompiledExpr`]: its static type and a thunk over the
//! parameter values. Constants are captured by value; dynamic variables keep a
//! handle on the store that owns them and are read on every call.

use crate::ast::ExpressionElement;
use crate::context::{EvaluationContext, Parameter, check_arguments, read_store};
use crate::error::{ExpressionError, Result};
use crate::interpret::{check_variable_type, coerce, condition_value};
use crate::member::null_or_mismatch;
use crate::semantic::{Binding, branch_type, resolve_function, resolve_member, resolve_name};
use formulon_value::{Type, Value, ValueError, ValueType, numeric};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub type Thunk = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

#[derive(Clone)]
pub struct CompiledExpr {
    value_type: Type,
    thunk: Arc<Thunk>,
}

impl fmt::Debug for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledExpr({})", self.value_type)
    }
}

impl CompiledExpr {
    pub fn new<F>(value_type: Type, thunk: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            value_type,
            thunk: Arc::new(thunk),
        }
    }

    pub fn constant(value: Value, value_type: Type) -> Self {
        Self::new(value_type, move |_| Ok(value.clone()))
    }

    pub fn value_type(&self) -> &Type {
        &self.value_type
    }

    pub fn eval(&self, args: &[Value]) -> Result<Value> {
        (self.thunk)(args)
    }

    /// Wraps the fragment so that it yields values of `target`.
    ///
    /// Numerics convert with overflow checks, anything becomes an object, and
    /// objects are checked at run time. Every other pair is an error.
    pub fn convert_to(self, target: &Type) -> Result<CompiledExpr> {
        if self.value_type == *target {
            return Ok(self);
        }
        if *target == Type::Object {
            return Ok(CompiledExpr {
                value_type: Type::Object,
                thunk: self.thunk,
            });
        }
        let inner = self.thunk;
        if let (Some(_), Some(kind)) = (self.value_type.numeric_kind(), target.numeric_kind()) {
            return Ok(CompiledExpr::new(target.clone(), move |args| {
                Ok(numeric::convert(&inner(args)?, kind)?)
            }));
        }
        if self.value_type == Type::Object {
            let expected = target.clone();
            return Ok(CompiledExpr::new(target.clone(), move |args| {
                let value = inner(args)?;
                if value.is_instance_of(&expected) {
                    Ok(value)
                } else {
                    Err(ValueError::invalid_cast(value.type_name(), expected.name()).into())
                }
            }));
        }
        log::debug!("Cannot convert {} to {}", self.value_type, target);
        Err(ExpressionError::semantic("Error compiling the expression."))
    }
}

impl ExpressionElement {
    /// Builds the closure tree for a checked node.
    pub fn compiled_form(&self, ctx: &EvaluationContext) -> Result<CompiledExpr> {
        let value_type = self.value_type(ctx);
        match self {
            ExpressionElement::NullLiteral { .. }
            | ExpressionElement::BooleanLiteral { .. }
            | ExpressionElement::IntegerLiteral { .. }
            | ExpressionElement::FloatingPointLiteral { .. }
            | ExpressionElement::DecimalLiteral { .. }
            | ExpressionElement::StringLiteral { .. } => {
                let value = self.interpreted_value(ctx, &[])?;
                Ok(CompiledExpr::constant(value, value_type))
            }
            ExpressionElement::Variable { name } => compile_variable(ctx, name, value_type),
            ExpressionElement::FunctionCall { name, arguments } => {
                let handle = resolve_function(ctx, name, arguments).map_err(ExpressionError::semantic)?;
                let arguments = arguments
                    .iter()
                    .map(|a| a.compiled_form(ctx))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledExpr::new(value_type, move |args| {
                    let values = arguments
                        .iter()
                        .zip(handle.parameter_types())
                        .map(|(argument, param)| coerce(argument.eval(args)?, param))
                        .collect::<Result<Vec<_>>>()?;
                    handle.call(&values)
                }))
            }
            ExpressionElement::Conditional { arguments, .. } => {
                let [condition, then_branch, else_branch] = arguments.as_slice() else {
                    return Err(ExpressionError::semantic(
                        "The conditional must have three arguments.",
                    ));
                };
                let result_type = branch_type(&then_branch.value_type(ctx), &else_branch.value_type(ctx))
                    .ok_or_else(|| ExpressionError::semantic("Error compiling the expression."))?;
                let condition = condition.compiled_form(ctx)?;
                let then_branch = then_branch.compiled_form(ctx)?.convert_to(&result_type)?;
                let else_branch = else_branch.compiled_form(ctx)?.convert_to(&result_type)?;
                Ok(CompiledExpr::new(result_type, move |args| {
                    if condition_value(&condition.eval(args)?)? {
                        then_branch.eval(args)
                    } else {
                        else_branch.eval(args)
                    }
                }))
            }
            ExpressionElement::NullTest { arguments, .. } => {
                let [argument] = arguments.as_slice() else {
                    return Err(ExpressionError::semantic("The null test must have one argument."));
                };
                if argument.value_type(ctx).is_value_type() {
                    return Ok(CompiledExpr::constant(Value::Bool(false), Type::Bool));
                }
                let argument = argument.compiled_form(ctx)?;
                Ok(CompiledExpr::new(Type::Bool, move |args| {
                    Ok(Value::Bool(argument.eval(args)?.is_null()))
                }))
            }
            ExpressionElement::MemberRead { target, member } => {
                let resolved = resolve_member(ctx, target, member).map_err(ExpressionError::semantic)?;
                let target = target.compiled_form(ctx)?;
                let member = member.clone();
                Ok(CompiledExpr::new(value_type, move |args| {
                    let value = target.eval(args)?;
                    if value.is_null() {
                        return Err(null_or_mismatch(&value, &member));
                    }
                    resolved.read(&value)
                }))
            }
            ExpressionElement::Group(inner) => inner.compiled_form(ctx),
            ExpressionElement::Operation {
                left,
                operator,
                right,
            } => {
                let operator = *operator;
                let left = left.compiled_form(ctx)?;
                let right = right.compiled_form(ctx)?;
                Ok(CompiledExpr::new(value_type, move |args| {
                    operator.evaluate(left.eval(args)?, right.eval(args)?)
                }))
            }
        }
    }
}

fn compile_variable(ctx: &EvaluationContext, name: &str, value_type: Type) -> Result<CompiledExpr> {
    match resolve_name(ctx, name) {
        Some(Binding::Parameter { position, .. }) => {
            let name = name.to_string();
            Ok(CompiledExpr::new(value_type, move |args| {
                args.get(position).cloned().ok_or_else(|| {
                    ExpressionError::evaluation(format!("Missing value for parameter '{}'.", name))
                })
            }))
        }
        Some(Binding::Variable { .. }) => {
            let slot = ctx
                .lookup_variable(name)
                .ok_or_else(|| ExpressionError::UnknownVariable { name: name.to_string() })?;
            if slot.variable.is_constant() {
                return Ok(CompiledExpr::constant(slot.variable.value().clone(), value_type));
            }
            let (store, key) = (slot.store, slot.key);
            Ok(CompiledExpr::new(value_type.clone(), move |_| {
                let variable = read_store(&store, &key)
                    .ok_or_else(|| ExpressionError::UnknownVariable { name: key.clone() })?;
                check_variable_type(&key, variable.value().clone(), &value_type)
            }))
        }
        None => Err(ExpressionError::UnknownVariable { name: name.to_string() }),
    }
}

/// Parameter tuples a typed compiled function can be called with.
pub trait ParameterList: Send + 'static {
    fn types() -> Vec<Type>;
    fn into_values(self) -> Vec<Value>;
}

macro_rules! impl_parameter_list {
    ($($name:ident),*) => {
        impl<$($name: ValueType,)*> ParameterList for ($($name,)*) {
            fn types() -> Vec<Type> {
                vec![$($name::value_type()),*]
            }

            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($name,)*) = self;
                vec![$($name.into_value()),*]
            }
        }
    };
}

impl_parameter_list!();
impl_parameter_list!(T1);
impl_parameter_list!(T1, T2);
impl_parameter_list!(T1, T2, T3);
impl_parameter_list!(T1, T2, T3, T4);
impl_parameter_list!(T1, T2, T3, T4, T5);
impl_parameter_list!(T1, T2, T3, T4, T5, T6);
impl_parameter_list!(T1, T2, T3, T4, T5, T6, T7);
impl_parameter_list!(T1, T2, T3, T4, T5, T6, T7, T8);

/// A compiled expression with a typed signature, created by
/// [`EvaluationContext::compile`].
pub struct CompiledFunction<Args, R> {
    expr: CompiledExpr,
    _signature: PhantomData<fn(Args) -> R>,
}

impl<Args, R> Clone for CompiledFunction<Args, R> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            _signature: PhantomData,
        }
    }
}

impl<Args, R> fmt::Debug for CompiledFunction<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFunction").field("expr", &self.expr).finish()
    }
}

impl<Args: ParameterList, R: ValueType> CompiledFunction<Args, R> {
    pub(crate) fn new(expr: CompiledExpr) -> Self {
        Self {
            expr,
            _signature: PhantomData,
        }
    }

    pub fn call(&self, args: Args) -> Result<R> {
        let value = self.expr.eval(&args.into_values())?;
        Ok(R::from_value(value)?)
    }
}

/// A compiled expression called with a slice of values.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    expr: CompiledExpr,
    parameters: Vec<Parameter>,
}

impl CompiledExpression {
    pub(crate) fn new(expr: CompiledExpr, parameters: Vec<Parameter>) -> Self {
        Self { expr, parameters }
    }

    pub fn value_type(&self) -> &Type {
        self.expr.value_type()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        check_arguments(&self.parameters, args)?;
        self.expr.eval(args)
    }
}
