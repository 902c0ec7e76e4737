//! Built-in function packages for the formulon expression language.
//!
//! Each package registers its functions and constants on an
//! [`EvaluationContext`]. [`default_context`] returns a shared context with every
//! package loaded, meant to be used as the parent of application contexts.
//!
//! # Packages
//!
//! - [`logic`]: `not`
//! - [`math`]: Constants, rounding, trigonometry, `min`/`max`, `rand`
//! - [`conversion`]: `c_int32`, `c_double`, `c_str` and the other numeric casts
//! - [`strings`]: Searching, slicing and case folding of strings
//! - [`regex`]: Pattern tests, matches and replacement

pub mod conversion;
pub mod logic;
pub mod math;
pub mod regex;
pub mod strings;

use formulon_lang::{EvaluationContext, LanguageOptions, Result};
use std::sync::{Arc, LazyLock};

/// Loads every package into `ctx`.
pub fn load_all(ctx: &mut EvaluationContext) -> Result<()> {
    logic::load(ctx)?;
    math::load(ctx)?;
    conversion::load(ctx)?;
    strings::load(ctx)?;
    regex::load(ctx)?;
    log::debug!("Loaded all packages, {} function names", ctx.function_names().count());
    Ok(())
}

static DEFAULT_CONTEXT: LazyLock<Arc<EvaluationContext>> = LazyLock::new(|| {
    let mut ctx = EvaluationContext::new();
    if let Err(e) = load_all(&mut ctx) {
        log::error!("Failed to load the built-in packages: {}", e);
    }
    Arc::new(ctx)
});

/// The process-wide context holding all built-in packages.
pub fn default_context() -> Arc<EvaluationContext> {
    Arc::clone(&DEFAULT_CONTEXT)
}

/// A fresh context whose parent is [`default_context`].
///
/// Variables and functions added to it stay local and shadow the built-ins.
pub fn new_context() -> EvaluationContext {
    EvaluationContext::with_parent(default_context())
}

/// A standalone context with `options` and every package loaded.
///
/// Unlike [`new_context`], the built-ins are resolved with `options` too, so
/// case-insensitive function names also apply to them.
pub fn context_with_options(options: LanguageOptions) -> Result<EvaluationContext> {
    let mut ctx = EvaluationContext::with_options(options);
    load_all(&mut ctx)?;
    Ok(ctx)
}
