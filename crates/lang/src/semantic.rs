//! Semantic check and static typing of expression trees.

use crate::ast::ExpressionElement;
use crate::context::EvaluationContext;
use crate::functions::{FunctionHandle, MatchError};
use crate::member::{Member, MemberLookup};
use formulon_value::{Type, try_harmonize};

/// How a variable name resolved: a declared parameter or a context variable.
pub(crate) enum Binding {
    Parameter { position: usize, value_type: Type },
    Variable { value_type: Type },
}

pub(crate) fn resolve_name(ctx: &EvaluationContext, name: &str) -> Option<Binding> {
    if let Some(position) = ctx.parameter_position(name) {
        return Some(Binding::Parameter {
            position,
            value_type: ctx.parameters()[position].value_type().clone(),
        });
    }
    ctx.variable(name).map(|v| Binding::Variable {
        value_type: v.value_type().clone(),
    })
}

/// The overload a call resolves to.
pub(crate) fn resolve_function(
    ctx: &EvaluationContext,
    name: &str,
    arguments: &[ExpressionElement],
) -> Result<FunctionHandle, String> {
    let group = ctx
        .function_group(name)
        .ok_or_else(|| format!("Function '{}' not found.", name))?;
    let argument_types: Vec<Type> = arguments.iter().map(|a| a.value_type(ctx)).collect();
    log::trace!("Resolving '{}' for {:?}", name, argument_types);
    match group.find_match(&argument_types) {
        Ok(handle) => Ok(handle.clone()),
        Err(MatchError::NoMatch) => Err(format!(
            "The function '{}' does not match the given parameters.",
            name
        )),
        Err(MatchError::Ambiguous) => {
            log::warn!("Ambiguous call of '{}' for {:?}", name, argument_types);
            Err(format!(
                "The function '{}' is ambiguous for the given parameters.",
                name
            ))
        }
    }
}

/// The common type of the two conditional branches.
pub(crate) fn branch_type(then_type: &Type, else_type: &Type) -> Option<Type> {
    if then_type == else_type {
        return Some(then_type.clone());
    }
    try_harmonize(then_type.numeric_kind()?, else_type.numeric_kind()?).map(Type::Numeric)
}

pub(crate) fn resolve_member(
    ctx: &EvaluationContext,
    target: &ExpressionElement,
    member: &str,
) -> Result<Member, String> {
    let target_type = target.value_type(ctx);
    match ctx.member_resolver().resolve(&target_type, member) {
        MemberLookup::Found(found) => Ok(found),
        MemberLookup::NotFound => Err(format!(
            "Could not find member '{}' in target type '{}'.",
            member, target_type
        )),
        MemberLookup::Ambiguous => Err(format!(
            "Member identifier '{}' is ambiguous for target type '{}'.",
            member, target_type
        )),
    }
}

impl ExpressionElement {
    /// Checks the tree against `ctx`, appending a message per problem.
    ///
    /// Children are checked first and all of them are visited even when one
    /// fails.
    pub fn check_semantic(&self, ctx: &EvaluationContext, errors: &mut Vec<String>) -> bool {
        let children_ok = self
            .children()
            .into_iter()
            .fold(true, |ok, child| child.check_semantic(ctx, errors) && ok);
        if !children_ok {
            return false;
        }

        let mut fail = |message: String| {
            errors.push(message);
            false
        };
        match self {
            ExpressionElement::IntegerLiteral { value: None, source } => {
                fail(format!("Error parsing '{}' as integer literal.", source))
            }
            ExpressionElement::FloatingPointLiteral { value: None, source } => {
                fail(format!("Error parsing '{}' as real number literal.", source))
            }
            ExpressionElement::DecimalLiteral { value: None, source } => {
                fail(format!("Error parsing '{}' as decimal number literal.", source))
            }
            ExpressionElement::Variable { name } => match resolve_name(ctx, name) {
                Some(_) => true,
                None => fail(format!(
                    "No parameter or variable with name '{}' found.",
                    name
                )),
            },
            ExpressionElement::FunctionCall { name, arguments } => {
                match resolve_function(ctx, name, arguments) {
                    Ok(_) => true,
                    Err(message) => fail(message),
                }
            }
            ExpressionElement::Conditional { arguments, .. } => {
                let [condition, then_branch, else_branch] = arguments.as_slice() else {
                    return fail("The conditional must have three arguments.".to_string());
                };
                let mut ok = true;
                if condition.value_type(ctx) != Type::Bool {
                    ok = fail(
                        "The first parameter of the conditional must be a boolean value (true or false)."
                            .to_string(),
                    );
                }
                if branch_type(&then_branch.value_type(ctx), &else_branch.value_type(ctx)).is_none() {
                    ok = fail(
                        "The second and third parameter of the conditional must have the same type or must be numeric and harmonizable."
                            .to_string(),
                    );
                }
                ok
            }
            ExpressionElement::NullTest { arguments, .. } => {
                if arguments.len() == 1 {
                    true
                } else {
                    fail("The null test must have one argument.".to_string())
                }
            }
            ExpressionElement::MemberRead { target, member } => {
                match resolve_member(ctx, target, member) {
                    Ok(_) => true,
                    Err(message) => fail(message),
                }
            }
            ExpressionElement::Operation {
                left,
                operator,
                right,
            } => operator.check_operands(&left.value_type(ctx), &right.value_type(ctx), errors),
            _ => true,
        }
    }

    /// The static type of the node. Only meaningful after a successful
    /// [`check_semantic`](Self::check_semantic).
    pub fn value_type(&self, ctx: &EvaluationContext) -> Type {
        match self {
            ExpressionElement::NullLiteral { .. } => Type::Object,
            ExpressionElement::BooleanLiteral { .. } => Type::Bool,
            ExpressionElement::IntegerLiteral { value, .. } => {
                value.as_ref().map_or(Type::I32, |v| v.value_type())
            }
            ExpressionElement::FloatingPointLiteral { value, .. } => {
                value.as_ref().map_or(Type::F64, |v| v.value_type())
            }
            ExpressionElement::DecimalLiteral { .. } => Type::DECIMAL,
            ExpressionElement::StringLiteral { .. } => Type::String,
            ExpressionElement::Variable { name } => match resolve_name(ctx, name) {
                Some(Binding::Parameter { value_type, .. } | Binding::Variable { value_type }) => {
                    value_type
                }
                None => Type::Object,
            },
            ExpressionElement::FunctionCall { name, arguments } => {
                resolve_function(ctx, name, arguments)
                    .map_or(Type::Object, |h| h.return_type().clone())
            }
            ExpressionElement::Conditional { arguments, .. } => match arguments.as_slice() {
                [_, then_branch, else_branch] => {
                    branch_type(&then_branch.value_type(ctx), &else_branch.value_type(ctx))
                        .unwrap_or(Type::Object)
                }
                _ => Type::Object,
            },
            ExpressionElement::NullTest { .. } => Type::Bool,
            ExpressionElement::MemberRead { target, member } => {
                resolve_member(ctx, target, member)
                    .map_or(Type::Object, |m| m.value_type().clone())
            }
            ExpressionElement::Group(inner) => inner.value_type(ctx),
            ExpressionElement::Operation {
                left,
                operator,
                right,
            } => operator.result_type(&left.value_type(ctx), &right.value_type(ctx)),
        }
    }
}
