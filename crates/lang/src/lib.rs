//! The formulon expression language: grammar, semantic check, interpreter and
//! closure-tree compiler.
//!
//! Text is parsed by the [`Grammar`] into an [`ExpressionElement`] tree, checked
//! against an [`EvaluationContext`] and then either interpreted or compiled into
//! a callable that can be shared between threads.
//!
//! # Key Types
//!
//! - [`EvaluationContext`]: Variables, functions, parameters and the pipeline
//! - [`LanguageOptions`]: Keyword spellings, case handling and quote style
//! - [`FunctionHandle`]: A host function with a typed signature
//! - [`CompiledFunction`]: A typed compiled expression

pub mod ast;
pub mod compile;
pub mod context;
pub mod error;
pub mod functions;
pub mod grammar;
pub mod interpret;
pub mod member;
pub mod operators;
pub mod options;
pub mod semantic;

pub use ast::ExpressionElement;
pub use compile::{CompiledExpr, CompiledExpression, CompiledFunction, ParameterList};
pub use context::{EvaluationContext, MAX_PARAMETERS, Parameter, Variable};
pub use error::{ExpressionError, Result};
pub use functions::{FunctionGroup, FunctionHandle, MatchError, NativeFn, TryNativeFn};
pub use grammar::Grammar;
pub use member::{Member, MemberLookup, MemberRegistry, MemberResolver};
pub use operators::{Operator, OperatorCategory};
pub use options::{LanguageOptions, LanguageOptionsBuilder, QuoteStyle};

pub use formulon_value::{Decimal, HostObject, NumericKind, Type, Value, ValueError, ValueType};
