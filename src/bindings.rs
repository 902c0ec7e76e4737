//! `name=value` bindings given on the command line.
//!
//! The value side is itself an expression, evaluated in the context the
//! binding is applied to, so `--var r=2.5` binds a number and
//! `--var s="text"` a string. Later bindings may refer to earlier ones.

use crate::error::{FormulonError, Result};
use formulon_lang::EvaluationContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub expression: String,
    pub constant: bool,
}

impl Binding {
    /// Splits `text` at the first `=`.
    pub fn parse(text: &str, constant: bool) -> Result<Self> {
        let (name, expression) = text
            .split_once('=')
            .ok_or_else(|| FormulonError::Binding(text.to_string()))?;
        let name = name.trim();
        if name.is_empty() || expression.trim().is_empty() {
            return Err(FormulonError::Binding(text.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            expression: expression.to_string(),
            constant,
        })
    }

    pub fn apply(&self, ctx: &EvaluationContext) -> Result<()> {
        let value = ctx.interpret(&self.expression, &[])?;
        log::debug!(
            "Binding {} '{}' = {:?}",
            if self.constant { "constant" } else { "variable" },
            self.name,
            value
        );
        if self.constant {
            ctx.set_constant(&self.name, value)?;
        } else {
            ctx.set_variable(&self.name, value)?;
        }
        Ok(())
    }
}

/// Parses and applies the variable bindings, then the constant bindings.
pub fn apply_all(ctx: &EvaluationContext, variables: &[String], constants: &[String]) -> Result<()> {
    let variables = variables.iter().map(|text| Binding::parse(text, false));
    let constants = constants.iter().map(|text| Binding::parse(text, true));
    for binding in variables.chain(constants) {
        binding?.apply(ctx)?;
    }
    Ok(())
}
