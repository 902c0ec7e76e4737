//! Function handles, overload groups and overload resolution.
//!
//! A [`FunctionHandle`] is a host callable with a fixed parameter type list and
//! return type. Handles registered under the same name form a
//! [`FunctionGroup`]; a call is resolved against the group by the static types
//! of its arguments.

use crate::error::{ExpressionError, Result};
use formulon_value::{Type, Value, ValueType};
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

/// The type-erased signature every handle is stored as.
pub type NativeFunction = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

#[derive(Clone)]
pub struct FunctionHandle {
    parameter_types: Vec<Type>,
    return_type: Type,
    function: Arc<NativeFunction>,
}

impl FunctionHandle {
    /// Creates a handle from an untyped implementation.
    ///
    /// The implementation receives arguments already converted to
    /// `parameter_types` and must return a value of `return_type`.
    pub fn new<F>(parameter_types: Vec<Type>, return_type: Type, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            parameter_types,
            return_type,
            function: Arc::new(function),
        }
    }

    /// Creates a handle from a typed closure, e.g. `|x: f64| x.sin()`.
    pub fn from_fn<Args, F: NativeFn<Args>>(function: F) -> Self {
        Self::new(F::parameter_types(), F::return_type(), move |args| {
            function.invoke(args)
        })
    }

    /// Creates a handle from a typed closure that can fail.
    pub fn try_from_fn<Args, F: TryNativeFn<Args>>(function: F) -> Self {
        Self::new(F::parameter_types(), F::return_type(), move |args| {
            function.invoke(args)
        })
    }

    pub fn parameter_types(&self) -> &[Type] {
        &self.parameter_types
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.function)(args)
    }

    /// `None` if the handle cannot take the arguments, otherwise whether every
    /// argument matches its parameter exactly.
    fn accepts(&self, argument_types: &[Type]) -> Option<bool> {
        if self.parameter_types.len() != argument_types.len() {
            return None;
        }
        let mut exact = true;
        for (param, arg) in self.parameter_types.iter().zip(argument_types) {
            if param == arg {
                continue;
            }
            if !is_assignable(arg, param) {
                return None;
            }
            exact = false;
        }
        Some(exact)
    }

    /// Whether every parameter of `self` can be passed to the matching parameter
    /// of `other`.
    fn at_least_as_specific_as(&self, other: &FunctionHandle) -> bool {
        self.parameter_types
            .iter()
            .zip(&other.parameter_types)
            .all(|(mine, theirs)| mine == theirs || is_assignable(mine, theirs))
    }
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FunctionHandle({}) -> {}",
            self.parameter_types.iter().map(Type::name).join(", "),
            self.return_type
        )
    }
}

/// Implicit argument conversion: numeric widening, or anything into `object`.
pub fn is_assignable(from: &Type, to: &Type) -> bool {
    if from == to || *to == Type::Object {
        return true;
    }
    match (from.numeric_kind(), to.numeric_kind()) {
        (Some(f), Some(t)) => f.is_upgradable_to(t),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    NoMatch,
    Ambiguous,
}

#[derive(Debug, Clone, Default)]
pub struct FunctionGroup {
    handles: Vec<FunctionHandle>,
}

impl FunctionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, handle: FunctionHandle) {
        self.handles.push(handle);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Adds the handles of `fallback` whose parameter lists are not already
    /// present in this group.
    pub(crate) fn merge_shadowed(&mut self, fallback: &FunctionGroup) {
        for handle in &fallback.handles {
            let shadowed = self
                .handles
                .iter()
                .any(|h| h.parameter_types == handle.parameter_types);
            if !shadowed {
                self.handles.push(handle.clone());
            }
        }
    }

    /// Selects the single handle that fits `argument_types`.
    ///
    /// An exact match wins. Otherwise the one candidate that is at least as
    /// specific as every other candidate is chosen. More than one exact match,
    /// or no most specific candidate, is ambiguous.
    pub fn find_match(&self, argument_types: &[Type]) -> std::result::Result<&FunctionHandle, MatchError> {
        let candidates: Vec<(&FunctionHandle, bool)> = self
            .handles
            .iter()
            .filter_map(|h| h.accepts(argument_types).map(|exact| (h, exact)))
            .collect();

        let exact: Vec<&FunctionHandle> = candidates
            .iter()
            .filter(|(_, exact)| *exact)
            .map(|(h, _)| *h)
            .collect();
        match exact.as_slice() {
            [single] => return Ok(*single),
            [] => {}
            _ => return Err(MatchError::Ambiguous),
        }

        let most_specific: Vec<&FunctionHandle> = candidates
            .iter()
            .map(|(h, _)| *h)
            .filter(|h| candidates.iter().all(|(other, _)| h.at_least_as_specific_as(other)))
            .collect();
        match most_specific.as_slice() {
            [single] => Ok(*single),
            [] if candidates.is_empty() => Err(MatchError::NoMatch),
            _ => Err(MatchError::Ambiguous),
        }
    }
}

impl FromIterator<FunctionHandle> for FunctionGroup {
    fn from_iter<I: IntoIterator<Item = FunctionHandle>>(iter: I) -> Self {
        Self {
            handles: iter.into_iter().collect(),
        }
    }
}

/// A typed closure usable as an infallible function.
pub trait NativeFn<Args>: Send + Sync + 'static {
    fn parameter_types() -> Vec<Type>;
    fn return_type() -> Type;
    fn invoke(&self, args: &[Value]) -> Result<Value>;
}

/// A typed closure returning `Result`.
pub trait TryNativeFn<Args>: Send + Sync + 'static {
    fn parameter_types() -> Vec<Type>;
    fn return_type() -> Type;
    fn invoke(&self, args: &[Value]) -> Result<Value>;
}

fn missing_argument() -> ExpressionError {
    ExpressionError::evaluation("Missing function argument.")
}

macro_rules! impl_native_fn {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> NativeFn<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: ValueType,
            $($arg: ValueType,)*
        {
            fn parameter_types() -> Vec<Type> {
                vec![$($arg::value_type()),*]
            }

            fn return_type() -> Type {
                R::value_type()
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, args: &[Value]) -> Result<Value> {
                let mut args = args.iter().cloned();
                $(let $arg = $arg::from_value(args.next().ok_or_else(missing_argument)?)?;)*
                Ok((self)($($arg),*).into_value())
            }
        }

        impl<F, R, $($arg,)*> TryNativeFn<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> Result<R> + Send + Sync + 'static,
            R: ValueType,
            $($arg: ValueType,)*
        {
            fn parameter_types() -> Vec<Type> {
                vec![$($arg::value_type()),*]
            }

            fn return_type() -> Type {
                R::value_type()
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, args: &[Value]) -> Result<Value> {
                let mut args = args.iter().cloned();
                $(let $arg = $arg::from_value(args.next().ok_or_else(missing_argument)?)?;)*
                Ok((self)($($arg),*)?.into_value())
            }
        }
    };
}

impl_native_fn!();
impl_native_fn!(A1);
impl_native_fn!(A1, A2);
impl_native_fn!(A1, A2, A3);
impl_native_fn!(A1, A2, A3, A4);

#[cfg(test)]
mod tests {
    use super::*;

    fn group(handles: Vec<FunctionHandle>) -> FunctionGroup {
        handles.into_iter().collect()
    }

    #[test]
    fn test_typed_closure_signature() {
        let handle = FunctionHandle::from_fn(|a: f64, b: f64| a.max(b));
        assert_eq!(handle.parameter_types(), &[Type::F64, Type::F64]);
        assert_eq!(handle.return_type(), &Type::F64);
        let result = handle.call(&[Value::F64(1.0), Value::F64(2.0)]).unwrap();
        assert_eq!(result, Value::F64(2.0));
    }

    #[test]
    fn test_fallible_closure() {
        let handle = FunctionHandle::try_from_fn(|s: String| {
            s.parse::<i32>()
                .map_err(|e| ExpressionError::function("parse", e.to_string()))
        });
        assert_eq!(handle.call(&[Value::from("12")]).unwrap(), Value::I32(12));
        assert!(handle.call(&[Value::from("x")]).is_err());
    }

    #[test]
    fn test_exact_match_wins() {
        let g = group(vec![
            FunctionHandle::from_fn(|x: f64| x),
            FunctionHandle::from_fn(|x: i32| x),
        ]);
        let found = g.find_match(&[Type::I32]).unwrap();
        assert_eq!(found.return_type(), &Type::I32);
    }

    #[test]
    fn test_widening_match() {
        let g = group(vec![FunctionHandle::from_fn(|x: f64| x.sin())]);
        assert!(g.find_match(&[Type::I32]).is_ok());
        assert_eq!(g.find_match(&[Type::Bool]).unwrap_err(), MatchError::NoMatch);
        assert_eq!(g.find_match(&[]).unwrap_err(), MatchError::NoMatch);
    }

    #[test]
    fn test_most_specific_widening() {
        let g = group(vec![
            FunctionHandle::from_fn(|x: f64| x),
            FunctionHandle::from_fn(|x: i64| x),
        ]);
        let found = g.find_match(&[Type::I32]).unwrap();
        assert_eq!(found.return_type(), &Type::I64);
    }

    #[test]
    fn test_identical_signatures_are_ambiguous() {
        let g = group(vec![
            FunctionHandle::from_fn(|| "One".to_string()),
            FunctionHandle::from_fn(|| "Two".to_string()),
        ]);
        assert_eq!(g.find_match(&[]).unwrap_err(), MatchError::Ambiguous);
    }

    #[test]
    fn test_incomparable_candidates_are_ambiguous() {
        let g = group(vec![
            FunctionHandle::from_fn(|a: i64, _b: f64| a),
            FunctionHandle::from_fn(|_a: f64, b: i64| b),
        ]);
        assert_eq!(
            g.find_match(&[Type::I32, Type::I32]).unwrap_err(),
            MatchError::Ambiguous
        );
    }

    #[test]
    fn test_object_parameter_accepts_anything() {
        let g = group(vec![FunctionHandle::from_fn(|v: Value| v.to_string())]);
        assert!(g.find_match(&[Type::Bool]).is_ok());
        assert!(g.find_match(&[Type::String]).is_ok());
    }

    #[test]
    fn test_merge_keeps_local_overloads() {
        let mut local = group(vec![FunctionHandle::from_fn(|x: i32| x + 1)]);
        let parent = group(vec![
            FunctionHandle::from_fn(|x: i32| x),
            FunctionHandle::from_fn(|x: f64| x),
        ]);
        local.merge_shadowed(&parent);
        assert_eq!(local.len(), 2);
        let found = local.find_match(&[Type::I32]).unwrap();
        assert_eq!(found.call(&[Value::I32(1)]).unwrap(), Value::I32(2));
    }
}
