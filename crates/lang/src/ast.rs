//! The abstract syntax tree of the expression language.
//!
//! The four operations every node supports live in their own modules:
//! [`semantic`](crate::semantic) (checking and static typing),
//! [`interpret`](crate::interpret) and [`compile`](crate::compile).

use crate::operators::Operator;
use formulon_value::{Decimal, Value};
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionElement {
    NullLiteral {
        source: String,
    },
    BooleanLiteral {
        value: bool,
        source: String,
    },
    /// `value` is `None` when the literal does not fit into a 64-bit integer.
    IntegerLiteral {
        value: Option<Value>,
        source: String,
    },
    FloatingPointLiteral {
        value: Option<Value>,
        source: String,
    },
    DecimalLiteral {
        value: Option<Decimal>,
        source: String,
    },
    StringLiteral {
        value: String,
        source: String,
    },
    Variable {
        name: String,
    },
    FunctionCall {
        name: String,
        arguments: Vec<ExpressionElement>,
    },
    Conditional {
        name: String,
        arguments: Vec<ExpressionElement>,
    },
    NullTest {
        name: String,
        arguments: Vec<ExpressionElement>,
    },
    MemberRead {
        target: Box<ExpressionElement>,
        member: String,
    },
    Group(Box<ExpressionElement>),
    Operation {
        left: Box<ExpressionElement>,
        operator: Operator,
        right: Box<ExpressionElement>,
    },
}

impl ExpressionElement {
    pub fn operation(left: ExpressionElement, operator: Operator, right: ExpressionElement) -> Self {
        ExpressionElement::Operation {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    /// Appends `operator term` to a chain that was parsed left to right.
    ///
    /// When `operator` binds tighter than the operator at the root of `self`, the
    /// new operand is attached to the right-hand side instead, recursively, so
    /// that the final tree respects operator priorities while equal priorities
    /// stay left-associative. Groups are not operations and are never descended
    /// into.
    pub fn append_operand(self, operator: Operator, term: ExpressionElement) -> Self {
        match self {
            ExpressionElement::Operation {
                left,
                operator: root,
                right,
            } if operator.priority() < root.priority() => ExpressionElement::Operation {
                left,
                operator: root,
                right: Box::new(right.append_operand(operator, term)),
            },
            other => ExpressionElement::operation(other, operator, term),
        }
    }

    /// The textual rendering of the node.
    ///
    /// Operations are rendered in parentheses, so re-parsing the source yields a
    /// tree with the same semantics.
    pub fn source(&self) -> String {
        match self {
            ExpressionElement::NullLiteral { source }
            | ExpressionElement::BooleanLiteral { source, .. }
            | ExpressionElement::IntegerLiteral { source, .. }
            | ExpressionElement::FloatingPointLiteral { source, .. }
            | ExpressionElement::DecimalLiteral { source, .. }
            | ExpressionElement::StringLiteral { source, .. } => source.clone(),
            ExpressionElement::Variable { name } => name.clone(),
            ExpressionElement::FunctionCall { name, arguments }
            | ExpressionElement::Conditional { name, arguments }
            | ExpressionElement::NullTest { name, arguments } => {
                format!("{}({})", name, arguments.iter().map(|a| a.source()).join(", "))
            }
            ExpressionElement::MemberRead { target, member } => {
                format!("{}.{}", target.source(), member)
            }
            ExpressionElement::Group(inner) => format!("({})", inner.source()),
            ExpressionElement::Operation {
                left,
                operator,
                right,
            } => format!("({} {} {})", left.source(), operator.source(), right.source()),
        }
    }

    /// Direct child nodes, left to right.
    pub fn children(&self) -> Vec<&ExpressionElement> {
        match self {
            ExpressionElement::FunctionCall { arguments, .. }
            | ExpressionElement::Conditional { arguments, .. }
            | ExpressionElement::NullTest { arguments, .. } => arguments.iter().collect(),
            ExpressionElement::MemberRead { target, .. } => vec![target.as_ref()],
            ExpressionElement::Group(inner) => vec![inner.as_ref()],
            ExpressionElement::Operation { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            _ => Vec::new(),
        }
    }
}
