//! Reading members off values (`"abc".Length`).
//!
//! Member access is resolved statically: a [`MemberResolver`] maps the static
//! type of the target and the member identifier to the member's type and a
//! getter.

use crate::error::{ExpressionError, Result};
use formulon_value::{Type, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type MemberGetter = dyn Fn(&Value) -> Result<Value> + Send + Sync;

#[derive(Clone)]
pub struct Member {
    value_type: Type,
    getter: Arc<MemberGetter>,
}

impl Member {
    pub fn new<F>(value_type: Type, getter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            value_type,
            getter: Arc::new(getter),
        }
    }

    pub fn value_type(&self) -> &Type {
        &self.value_type
    }

    pub fn read(&self, target: &Value) -> Result<Value> {
        (self.getter)(target)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Member({})", self.value_type)
    }
}

#[derive(Debug, Clone)]
pub enum MemberLookup {
    NotFound,
    Found(Member),
    Ambiguous,
}

pub trait MemberResolver: Send + Sync {
    fn resolve(&self, target: &Type, member: &str) -> MemberLookup;
}

/// A table of members keyed by target type and identifier.
///
/// The default registry knows the `Length` of strings.
#[derive(Debug, Clone)]
pub struct MemberRegistry {
    members: HashMap<(Type, String), Vec<Member>>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
        }
    }

    pub fn register(&mut self, target: Type, name: impl Into<String>, member: Member) {
        self.members
            .entry((target, name.into()))
            .or_default()
            .push(member);
    }
}

impl Default for MemberRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(
            Type::String,
            "Length",
            Member::new(Type::I32, |target| match target {
                Value::String(s) => i32::try_from(s.chars().count())
                    .map(Value::I32)
                    .map_err(|_| ExpressionError::overflow("Length")),
                other => Err(null_or_mismatch(other, "Length")),
            }),
        );
        registry
    }
}

impl MemberResolver for MemberRegistry {
    fn resolve(&self, target: &Type, member: &str) -> MemberLookup {
        match self
            .members
            .get(&(target.clone(), member.to_string()))
            .map(Vec::as_slice)
        {
            Some([single]) => MemberLookup::Found(single.clone()),
            Some([_, _, ..]) => MemberLookup::Ambiguous,
            _ => MemberLookup::NotFound,
        }
    }
}

/// The error for a getter that received a value it cannot read.
pub fn null_or_mismatch(target: &Value, member: &str) -> ExpressionError {
    if target.is_null() {
        ExpressionError::evaluation(format!("Null reference while reading member '{}'.", member))
    } else {
        ExpressionError::evaluation(format!(
            "Member '{}' cannot be read from a value of type {}.",
            member,
            target.type_name()
        ))
    }
}
