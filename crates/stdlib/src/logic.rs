use formulon_lang::{EvaluationContext, FunctionHandle, Result};

pub fn load(ctx: &mut EvaluationContext) -> Result<()> {
    ctx.add_function("not", FunctionHandle::from_fn(|b: bool| !b));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulon_lang::Value;

    #[test]
    fn test_not() {
        let mut ctx = EvaluationContext::new();
        load(&mut ctx).unwrap();
        assert_eq!(ctx.interpret("not(true)", &[]), Ok(Value::Bool(false)));
        assert_eq!(ctx.interpret("not(1 > 2) and true", &[]), Ok(Value::Bool(true)));
        assert!(ctx.interpret("not(1)", &[]).unwrap_err().is_semantic_error());
    }
}
