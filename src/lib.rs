//! formulon: an embeddable expression language.
//!
//! Expressions are parsed, statically checked against an
//! [`EvaluationContext`] and then interpreted or compiled into thread-safe
//! callables. The built-in packages live in [`stdlib`].
//!
//! ```ignore
//! let ctx = formulon::stdlib::new_context();
//! ctx.set_variable("r", 2.0)?;
//! let area = ctx.interpret("pi * r ^ 2", &[])?;
//! ```

pub mod bindings;
pub mod error;
pub mod plot;

pub use error::{FormulonError, Result};

pub use formulon_lang::{
    CompiledExpression, CompiledFunction, EvaluationContext, ExpressionElement, ExpressionError,
    FunctionGroup, FunctionHandle, Grammar, LanguageOptions, LanguageOptionsBuilder, Member,
    MemberLookup, MemberRegistry, MemberResolver, Parameter, ParameterList, QuoteStyle, Variable,
};
pub use formulon_value::{Decimal, HostObject, NumericKind, Type, Value, ValueError, ValueType};

pub use formulon_stdlib as stdlib;
