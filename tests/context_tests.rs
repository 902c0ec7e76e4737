mod common;

use common::{TestResult, context, init_logging, string};
use formulon::{
    EvaluationContext, ExpressionError, FunctionHandle, HostObject, LanguageOptions, Member,
    MemberRegistry, Type, Value,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::thread;

#[derive(Debug)]
struct Point {
    x: f64,
    y: f64,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl HostObject for Point {
    fn type_name(&self) -> &str {
        "Point"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn point_member(read: fn(&Point) -> f64) -> Member {
    Member::new(Type::F64, move |target| {
        let point = match target {
            Value::Object(o) => o.as_any().downcast_ref::<Point>(),
            _ => None,
        };
        point
            .map(|p| Value::F64(read(p)))
            .ok_or_else(|| ExpressionError::evaluation("not a point"))
    })
}

#[test]
fn test_child_context_shadows_parent() -> TestResult {
    init_logging();
    let mut parent = EvaluationContext::new();
    parent.set_variable("a", 1)?;
    parent.add_function("f", FunctionHandle::from_fn(|x: i32| x + 1));
    let parent = Arc::new(parent);

    let mut child = EvaluationContext::with_parent(Arc::clone(&parent));
    child.set_variable("b", 10)?;
    assert_eq!(child.interpret("a + b + f(0)", &[])?, Value::I32(12));

    child.set_variable("a", 100)?;
    child.add_function("f", FunctionHandle::from_fn(|x: i32| x * 2));
    assert_eq!(child.interpret("a + f(5)", &[])?, Value::I32(110));
    assert_eq!(parent.interpret("a + f(5)", &[])?, Value::I32(7));

    assert!(child.remove_variable("a"));
    assert_eq!(child.read_variable("a"), Some(Value::I32(1)));
    assert!(!child.remove_variable("a"));
    Ok(())
}

#[test]
fn test_child_adds_overloads_to_parent_group() -> TestResult {
    let mut ctx = context();
    ctx.add_function("len", FunctionHandle::from_fn(|b: bool| if b { 1_i32 } else { 0 }));
    assert_eq!(ctx.interpret("len(true) + len(\"abc\")", &[])?, Value::I32(4));
    assert!(ctx.remove_function_group("len"));
    assert!(ctx.function_group_exists("len"));
    assert!(ctx.interpret("len(true)", &[]).unwrap_err().is_semantic_error());
    Ok(())
}

#[test]
fn test_constants_are_frozen_into_compiled_code() -> TestResult {
    let ctx = context();
    ctx.set_constant("k", 2)?;
    ctx.set_variable("v", 2)?;
    let compiled = ctx.compile_dynamic("k * 10 + v")?;
    ctx.set_constant("k", 3)?;
    ctx.set_variable("v", 5)?;
    assert_eq!(compiled.call(&[])?, Value::I32(25));
    assert_eq!(ctx.interpret("k * 10 + v", &[])?, Value::I32(35));
    Ok(())
}

#[test]
fn test_dynamic_variable_type_change_is_detected() -> TestResult {
    let ctx = context();
    ctx.set_variable("v", 1)?;
    let compiled = ctx.compile_dynamic("v + 1")?;
    ctx.set_variable("v", "text")?;
    assert!(compiled.call(&[]).is_err());
    Ok(())
}

#[test]
fn test_keywords_are_not_variable_names() {
    let ctx = context();
    for name in ["and", "true", "null", "if"] {
        assert_eq!(
            ctx.set_variable(name, 1),
            Err(ExpressionError::KeywordName {
                name: name.to_string()
            })
        );
    }
    assert!(ctx.set_variable("1abc", 1).is_err());
    assert!(ctx.set_variable("android", 1).is_ok());
}

#[test]
fn test_typed_compilation_with_parameters() -> TestResult {
    let mut ctx = context();
    ctx.set_parameters([("a", Type::F64), ("b", Type::I32)])?;
    assert!(ctx.parameter_exists("b"));
    assert_eq!(ctx.parameter_position("b"), Some(1));

    let hypot = ctx.compile::<(f64, i32), f64>("sqrt(a ^ 2 + b ^ 2)")?;
    assert_eq!(hypot.call((3.0, 4))?, 5.0);

    let as_long = ctx.compile::<(f64, i32), i64>("b * 2")?;
    assert_eq!(as_long.call((0.0, 21))?, 42);

    assert!(ctx.compile::<(f64,), f64>("a").is_err());
    assert!(ctx.compile::<(f64, i32), String>("a + b").is_err());
    Ok(())
}

#[test]
fn test_parameters_are_limited() {
    let mut ctx = EvaluationContext::new();
    let names = ["a", "b", "c", "d", "e", "f", "g", "h", "i"];
    assert!(ctx.set_parameters(names.iter().map(|n| (*n, Type::I32))).is_err());
    assert!(ctx.set_parameters([("a", Type::I32), ("a", Type::F64)]).is_err());
    assert!(ctx.set_parameters(names[..8].iter().map(|n| (*n, Type::I32))).is_ok());
}

#[test]
fn test_compiled_function_runs_on_many_threads() -> TestResult {
    let mut ctx = context();
    ctx.set_parameters([("n", Type::I32)])?;
    let square = ctx.compile::<(i32,), i64>("n * n * 1l")?;
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let square = square.clone();
            thread::spawn(move || square.call((i,)))
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.join().map_err(|_| "thread panicked")??;
        assert_eq!(result, (i * i) as i64);
    }
    Ok(())
}

#[test]
fn test_host_object_members() -> TestResult {
    let mut registry = MemberRegistry::default();
    registry.register(Type::host("Point"), "X", point_member(|p| p.x));
    registry.register(Type::host("Point"), "Y", point_member(|p| p.y));

    let options = LanguageOptions::builder().with_member_read().build();
    let mut ctx = formulon::stdlib::context_with_options(options)?;
    ctx.set_member_resolver(Arc::new(registry));
    ctx.set_variable("p", Value::object(Point { x: 3.0, y: 4.0 }))?;

    assert_eq!(ctx.interpret("sqrt(p.X ^ 2 + p.Y ^ 2)", &[])?, Value::F64(5.0));
    assert_eq!(ctx.interpret("c_str(p)", &[])?, string("(3, 4)"));
    assert_eq!(ctx.interpret("\"abc\".Length", &[])?, Value::I32(3));
    assert!(ctx.interpret("p.Z", &[]).unwrap_err().is_semantic_error());
    Ok(())
}

#[test]
fn test_options_change_resets_grammar() -> TestResult {
    let mut ctx = EvaluationContext::new();
    assert!(ctx.parse("'a'").is_err());
    ctx.set_options(
        LanguageOptions::builder()
            .with_quote_style(formulon::QuoteStyle::Single)
            .build(),
    );
    assert_eq!(ctx.interpret("'a' & 'b'", &[])?, string("ab"));
    Ok(())
}

#[test]
fn test_options_load_from_json() -> TestResult {
    let options: LanguageOptions =
        serde_json::from_str(r#"{ "member_read": true, "quote_style": "single" }"#)?;
    assert!(options.member_read());
    let ctx = EvaluationContext::with_options(options);
    assert_eq!(ctx.interpret("'abc'.Length", &[])?, Value::I32(3));
    Ok(())
}
