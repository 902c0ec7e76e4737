//! The evaluation context: variables, functions and parameters an expression
//! is checked and executed against, plus the parse/check/compile pipeline.

use crate::ast::ExpressionElement;
use crate::compile::{CompiledExpression, CompiledFunction, ParameterList};
use crate::error::{ExpressionError, Result};
use crate::functions::{FunctionGroup, FunctionHandle};
use crate::grammar::Grammar;
use crate::member::{MemberRegistry, MemberResolver};
use crate::options::{LanguageOptions, names_equal};
use formulon_value::{Type, Value, ValueType};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// The most parameters a context can declare.
pub const MAX_PARAMETERS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    value: Value,
    value_type: Type,
    constant: bool,
}

impl Variable {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_type(&self) -> &Type {
        &self.value_type
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }
}

pub(crate) type VariableStore = Arc<RwLock<HashMap<String, Variable>>>;

/// Where a variable lives: the store that owns it and the key it is filed under.
pub(crate) struct VariableSlot {
    pub store: VariableStore,
    pub key: String,
    pub variable: Variable,
}

pub(crate) fn read_store(store: &VariableStore, key: &str) -> Option<Variable> {
    store
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value_type: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value_type: Type) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &Type {
        &self.value_type
    }
}

pub struct EvaluationContext {
    parent: Option<Arc<EvaluationContext>>,
    options: LanguageOptions,
    grammar: OnceLock<Grammar>,
    variables: VariableStore,
    functions: IndexMap<String, FunctionGroup>,
    parameters: Vec<Parameter>,
    members: Arc<dyn MemberResolver>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::with_options(LanguageOptions::default())
    }

    pub fn with_options(options: LanguageOptions) -> Self {
        Self {
            parent: None,
            options,
            grammar: OnceLock::new(),
            variables: VariableStore::default(),
            functions: IndexMap::new(),
            parameters: Vec::new(),
            members: Arc::new(MemberRegistry::default()),
        }
    }

    /// A child context. Variables and functions not found locally are looked
    /// up in `parent`; options and the member resolver are inherited.
    pub fn with_parent(parent: Arc<EvaluationContext>) -> Self {
        Self {
            options: parent.options.clone(),
            members: Arc::clone(&parent.members),
            parent: Some(parent),
            grammar: OnceLock::new(),
            variables: VariableStore::default(),
            functions: IndexMap::new(),
            parameters: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<&Arc<EvaluationContext>> {
        self.parent.as_ref()
    }

    pub fn options(&self) -> &LanguageOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: LanguageOptions) {
        if options != self.options {
            self.options = options;
            self.grammar = OnceLock::new();
        }
    }

    pub fn grammar(&self) -> &Grammar {
        self.grammar.get_or_init(|| {
            log::debug!("Building grammar for {:?}", self.options);
            Grammar::new(self.options.clone())
        })
    }

    pub fn member_resolver(&self) -> &dyn MemberResolver {
        self.members.as_ref()
    }

    pub fn set_member_resolver(&mut self, resolver: Arc<dyn MemberResolver>) {
        self.members = resolver;
    }

    // --- Variables ---

    fn validate_name(&self, name: &str, kind: &str) -> Result<()> {
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(ExpressionError::semantic(format!(
                "'{}' is not a valid {} name.",
                name, kind
            )));
        }
        if self.options.is_keyword(name) {
            log::warn!("Rejected keyword '{}' as {} name", name, kind);
            return Err(ExpressionError::KeywordName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn store_variable(&self, name: &str, value: Value, constant: bool) -> Result<()> {
        self.validate_name(name, "variable")?;
        let variable = Variable {
            value_type: value.value_type(),
            value,
            constant,
        };
        log::trace!("Setting variable '{}' to {:?}", name, variable);
        self.variables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), variable);
        Ok(())
    }

    /// Sets a variable that compiled expressions read at call time.
    pub fn set_variable(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.store_variable(name, value.into(), false)
    }

    /// Sets a variable whose value is frozen into compiled expressions.
    pub fn set_constant(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.store_variable(name, value.into(), true)
    }

    /// Removes a local variable. Variables of the parent are not touched.
    pub fn remove_variable(&self, name: &str) -> bool {
        self.variables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    pub(crate) fn lookup_variable(&self, name: &str) -> Option<VariableSlot> {
        let local = {
            let variables = self.variables.read().unwrap_or_else(PoisonError::into_inner);
            match variables.get_key_value(name) {
                Some((key, variable)) => Some((key.clone(), variable.clone())),
                None if self.options.ignore_variable_name_case() => variables
                    .iter()
                    .find(|(key, _)| names_equal(key, name, true))
                    .map(|(key, variable)| (key.clone(), variable.clone())),
                None => None,
            }
        };
        match local {
            Some((key, variable)) => Some(VariableSlot {
                store: Arc::clone(&self.variables),
                key,
                variable,
            }),
            None => self.parent.as_ref()?.lookup_variable(name),
        }
    }

    pub fn variable_exists(&self, name: &str) -> bool {
        self.lookup_variable(name).is_some()
    }

    pub fn variable(&self, name: &str) -> Option<Variable> {
        self.lookup_variable(name).map(|slot| slot.variable)
    }

    pub fn read_variable(&self, name: &str) -> Option<Value> {
        self.variable(name).map(|v| v.value)
    }

    pub fn is_variable_constant(&self, name: &str) -> Option<bool> {
        self.variable(name).map(|v| v.constant)
    }

    // --- Functions ---

    /// Adds an overload to the group `name`, creating the group if needed.
    pub fn add_function(&mut self, name: &str, handle: FunctionHandle) {
        log::trace!("Adding function '{}' {:?}", name, handle);
        self.functions
            .entry(name.to_string())
            .or_default()
            .add(handle);
    }

    /// Adds every overload of `group` to the group `name`.
    pub fn add_function_group(&mut self, name: &str, group: FunctionGroup) {
        let entry = self.functions.entry(name.to_string()).or_default();
        for handle in group.iter() {
            entry.add(handle.clone());
        }
    }

    pub fn remove_function_group(&mut self, name: &str) -> bool {
        self.functions.shift_remove(name).is_some()
    }

    pub fn function_group_exists(&self, name: &str) -> bool {
        self.function_group(name).is_some()
    }

    /// The overloads visible under `name`: the local ones first, followed by
    /// those of the parent chain whose parameter lists are not shadowed.
    pub fn function_group(&self, name: &str) -> Option<FunctionGroup> {
        let ignore_case = self.options.ignore_function_name_case();
        let mut local: Option<FunctionGroup> = None;
        for (key, group) in &self.functions {
            if names_equal(key, name, ignore_case) {
                match local.as_mut() {
                    Some(found) => found.merge_shadowed(group),
                    None => local = Some(group.clone()),
                }
            }
        }
        let inherited = self.parent.as_ref().and_then(|p| p.function_group(name));
        match (local, inherited) {
            (Some(mut local), Some(inherited)) => {
                local.merge_shadowed(&inherited);
                Some(local)
            }
            (local, inherited) => local.or(inherited),
        }
    }

    /// Names of the local function groups, in registration order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    // --- Parameters ---

    /// Declares the parameters compiled expressions take, replacing any previous
    /// declaration.
    pub fn set_parameters<I, S>(&mut self, parameters: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        let parameters: Vec<Parameter> = parameters
            .into_iter()
            .map(|(name, value_type)| Parameter::new(name, value_type))
            .collect();
        if parameters.len() > MAX_PARAMETERS {
            return Err(ExpressionError::semantic(format!(
                "At most {} parameters are supported.",
                MAX_PARAMETERS
            )));
        }
        for (i, parameter) in parameters.iter().enumerate() {
            self.validate_name(parameter.name(), "parameter")?;
            if parameters[..i].iter().any(|p| p.name == parameter.name) {
                return Err(ExpressionError::semantic(format!(
                    "The parameter '{}' is declared twice.",
                    parameter.name
                )));
            }
        }
        self.parameters = parameters;
        Ok(())
    }

    pub fn clear_parameters(&mut self) {
        self.parameters.clear();
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter_position(&self, name: &str) -> Option<usize> {
        let ignore_case = self.options.ignore_parameter_name_case();
        self.parameters
            .iter()
            .position(|p| p.name == name)
            .or_else(|| {
                self.parameters
                    .iter()
                    .position(|p| names_equal(&p.name, name, ignore_case))
            })
    }

    pub fn parameter_exists(&self, name: &str) -> bool {
        self.parameter_position(name).is_some()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameter_position(name).map(|i| &self.parameters[i])
    }

    // --- Pipeline ---

    pub fn parse(&self, text: &str) -> Result<ExpressionElement> {
        log::debug!("Parsing '{}'", text);
        self.grammar().parse(text)
    }

    /// Parses `text` and runs the semantic check, collecting every message.
    pub fn parse_and_check(&self, text: &str) -> Result<ExpressionElement> {
        let expression = self.parse(text)?;
        let mut messages = Vec::new();
        if !expression.check_semantic(self, &mut messages) {
            log::debug!("Semantic check of '{}' failed: {:?}", text, messages);
            return Err(ExpressionError::SemanticError { messages });
        }
        Ok(expression)
    }

    /// Compiles `text` into an untyped callable taking the declared parameters.
    pub fn compile_dynamic(&self, text: &str) -> Result<CompiledExpression> {
        let expression = self.parse_and_check(text)?;
        log::debug!("Compiling '{}'", text);
        let compiled = expression.compiled_form(self)?;
        Ok(CompiledExpression::new(compiled, self.parameters.clone()))
    }

    /// Compiles `text` into a typed callable.
    ///
    /// `Args` must match the declared parameters exactly. When the static type
    /// of the expression differs from `R` a checked conversion is inserted.
    pub fn compile<Args: ParameterList, R: ValueType>(
        &self,
        text: &str,
    ) -> Result<CompiledFunction<Args, R>> {
        let types = Args::types();
        if types.len() != self.parameters.len() {
            return Err(ExpressionError::semantic(
                "The number of parameters does not match the evaluation context.",
            ));
        }
        if let Some(p) = self
            .parameters
            .iter()
            .zip(&types)
            .find_map(|(p, t)| (p.value_type != *t).then_some(p))
        {
            return Err(ExpressionError::semantic(format!(
                "The type of parameter '{}' does not match.",
                p.name
            )));
        }
        let expression = self.parse_and_check(text)?;
        log::debug!("Compiling '{}' to {}", text, R::value_type());
        let compiled = expression
            .compiled_form(self)?
            .convert_to(&R::value_type())?;
        Ok(CompiledFunction::new(compiled))
    }

    /// Compiles `text` and calls it once with `args`.
    pub fn evaluate<Args: ParameterList>(&self, text: &str, args: Args) -> Result<Value> {
        self.compile::<Args, Value>(text)?.call(args)
    }

    /// Checks `text` and evaluates it by walking the tree.
    pub fn interpret(&self, text: &str, args: &[Value]) -> Result<Value> {
        let expression = self.parse_and_check(text)?;
        check_arguments(&self.parameters, args)?;
        expression.interpreted_value(self, args)
    }
}

/// Validates runtime arguments against declared parameters.
pub(crate) fn check_arguments(parameters: &[Parameter], args: &[Value]) -> Result<()> {
    if parameters.len() != args.len() {
        return Err(ExpressionError::evaluation(
            "The number of parameters does not match the evaluation context.",
        ));
    }
    for (parameter, arg) in parameters.iter().zip(args) {
        if !arg.is_instance_of(&parameter.value_type) {
            return Err(ExpressionError::evaluation(format!(
                "The type of parameter '{}' does not match.",
                parameter.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_and_constants() {
        let ctx = EvaluationContext::new();
        ctx.set_variable("x", 2).unwrap();
        ctx.set_constant("c", "abc").unwrap();
        assert!(ctx.variable_exists("x"));
        assert_eq!(ctx.read_variable("x"), Some(Value::I32(2)));
        assert_eq!(ctx.is_variable_constant("x"), Some(false));
        assert_eq!(ctx.is_variable_constant("c"), Some(true));
        assert_eq!(ctx.variable("c").unwrap().value_type(), &Type::String);
        assert!(ctx.remove_variable("x"));
        assert!(!ctx.variable_exists("x"));
        assert_eq!(ctx.is_variable_constant("x"), None);
    }

    #[test]
    fn test_null_variable_is_object() {
        let ctx = EvaluationContext::new();
        ctx.set_variable("n", Value::Null).unwrap();
        assert_eq!(ctx.variable("n").unwrap().value_type(), &Type::Object);
    }

    #[test]
    fn test_keywords_are_rejected() {
        let ctx = EvaluationContext::new();
        for name in ["and", "null", "true", "if"] {
            let err = ctx.set_variable(name, 1).unwrap_err();
            assert_eq!(err, ExpressionError::KeywordName { name: name.to_string() });
        }
        assert!(ctx.set_variable("1x", 1).is_err());
        assert!(ctx.set_variable("isnull", 1).is_ok());
    }

    #[test]
    fn test_parent_delegation() {
        let parent = EvaluationContext::new();
        parent.set_variable("x", 1).unwrap();
        let parent = Arc::new(parent);
        let child = EvaluationContext::with_parent(Arc::clone(&parent));
        child.set_variable("y", 2).unwrap();
        assert_eq!(child.read_variable("x"), Some(Value::I32(1)));
        assert!(!parent.variable_exists("y"));
        child.set_variable("x", 5).unwrap();
        assert_eq!(child.read_variable("x"), Some(Value::I32(5)));
        assert_eq!(parent.read_variable("x"), Some(Value::I32(1)));
        assert!(!child.remove_variable("z"));
    }

    #[test]
    fn test_function_groups_chain() {
        let mut parent = EvaluationContext::new();
        parent.add_function("f", FunctionHandle::from_fn(|x: f64| x));
        parent.add_function("f", FunctionHandle::from_fn(|x: i32| x));
        let mut child = EvaluationContext::with_parent(Arc::new(parent));
        child.add_function("f", FunctionHandle::from_fn(|x: i32| x * 2));
        let group = child.function_group("f").unwrap();
        assert_eq!(group.len(), 2);
        let handle = group.find_match(&[Type::I32]).unwrap();
        assert_eq!(handle.call(&[Value::I32(2)]).unwrap(), Value::I32(4));
        assert!(child.function_group_exists("f"));
        assert!(!child.remove_function_group("g"));
        assert!(child.remove_function_group("f"));
        assert_eq!(child.function_group("f").unwrap().len(), 2);
    }

    #[test]
    fn test_function_name_case() {
        let options = LanguageOptions::builder().ignore_function_name_case().build();
        let mut ctx = EvaluationContext::with_options(options);
        ctx.add_function("Twice", FunctionHandle::from_fn(|x: i32| x * 2));
        assert!(ctx.function_group_exists("twice"));
        assert!(!EvaluationContext::new().function_group_exists("twice"));
    }

    #[test]
    fn test_parameters() {
        let mut ctx = EvaluationContext::new();
        ctx.set_parameters([("x", Type::F64), ("y", Type::I32)]).unwrap();
        assert_eq!(ctx.parameter_position("y"), Some(1));
        assert_eq!(ctx.parameter("x").unwrap().value_type(), &Type::F64);
        assert!(!ctx.parameter_exists("X"));
        assert!(ctx.set_parameters([("a", Type::F64), ("a", Type::F64)]).is_err());
        assert!(ctx.set_parameters([("or", Type::F64)]).is_err());
        let too_many: Vec<(String, Type)> =
            (0..9).map(|i| (format!("p{}", i), Type::I32)).collect();
        assert!(ctx.set_parameters(too_many).is_err());
    }

    #[test]
    fn test_set_options_rebuilds_grammar() {
        let mut ctx = EvaluationContext::new();
        assert!(ctx.parse("x.Length").is_err());
        ctx.set_options(ctx.options().derive().with_member_read().build());
        assert!(ctx.parse("x.Length").is_ok());
    }
}
