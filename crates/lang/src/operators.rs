use crate::error::{ExpressionError, Result};
use formulon_value::numeric::{self, NumericKind};
use formulon_value::{Type, Value, ValueError, auto_upgrade, harmonize_values, try_harmonize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCategory {
    Numeric,
    String,
    Relation,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Power,
    Multiplication,
    Division,
    Addition,
    Subtraction,
    Concatenation,
    Less,
    LessOrEqual,
    Equal,
    Unequal,
    GreaterOrEqual,
    Greater,
    And,
    Or,
    Xor,
}

impl Operator {
    pub const ALL: [Operator; 15] = [
        Operator::Power,
        Operator::Multiplication,
        Operator::Division,
        Operator::Addition,
        Operator::Subtraction,
        Operator::Concatenation,
        Operator::Less,
        Operator::LessOrEqual,
        Operator::Equal,
        Operator::Unequal,
        Operator::GreaterOrEqual,
        Operator::Greater,
        Operator::And,
        Operator::Or,
        Operator::Xor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operator::Power => "power",
            Operator::Multiplication => "multiplication",
            Operator::Division => "division",
            Operator::Addition => "addition",
            Operator::Subtraction => "subtraction",
            Operator::Concatenation => "concatenation",
            Operator::Less => "less",
            Operator::LessOrEqual => "less or equal",
            Operator::Equal => "equal",
            Operator::Unequal => "unequal",
            Operator::GreaterOrEqual => "greater or equal",
            Operator::Greater => "greater",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Xor => "xor",
        }
    }

    /// The default spelling. Boolean operator words can be renamed through the
    /// language options.
    pub fn source(self) -> &'static str {
        match self {
            Operator::Power => "^",
            Operator::Multiplication => "*",
            Operator::Division => "/",
            Operator::Addition => "+",
            Operator::Subtraction => "-",
            Operator::Concatenation => "&",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Equal => "=",
            Operator::Unequal => "<>",
            Operator::GreaterOrEqual => ">=",
            Operator::Greater => ">",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Xor => "xor",
        }
    }

    pub fn category(self) -> OperatorCategory {
        match self {
            Operator::Power
            | Operator::Multiplication
            | Operator::Division
            | Operator::Addition
            | Operator::Subtraction => OperatorCategory::Numeric,
            Operator::Concatenation => OperatorCategory::String,
            Operator::Less
            | Operator::LessOrEqual
            | Operator::Equal
            | Operator::Unequal
            | Operator::GreaterOrEqual
            | Operator::Greater => OperatorCategory::Relation,
            Operator::And | Operator::Or | Operator::Xor => OperatorCategory::Boolean,
        }
    }

    /// 0 binds tightest, 6 loosest.
    pub fn priority(self) -> u8 {
        match self {
            Operator::Power => 0,
            Operator::Multiplication | Operator::Division => 1,
            Operator::Addition | Operator::Subtraction => 2,
            Operator::Concatenation => 3,
            Operator::Less
            | Operator::LessOrEqual
            | Operator::Equal
            | Operator::Unequal
            | Operator::GreaterOrEqual
            | Operator::Greater => 4,
            Operator::And => 5,
            Operator::Or | Operator::Xor => 6,
        }
    }

    fn is_equality(self) -> bool {
        matches!(self, Operator::Equal | Operator::Unequal)
    }

    /// Validates the static operand types, appending a message per problem.
    pub fn check_operands(self, left: &Type, right: &Type, errors: &mut Vec<String>) -> bool {
        match self.category() {
            OperatorCategory::Numeric => self.check_numeric(left, right, errors),
            OperatorCategory::String => true,
            OperatorCategory::Relation => self.check_relation(left, right, errors),
            OperatorCategory::Boolean => {
                let mut ok = true;
                if *left != Type::Bool {
                    errors.push(format!(
                        "The left operand of the boolean operation '{}' is not a boolean value.",
                        self.name()
                    ));
                    ok = false;
                }
                if *right != Type::Bool {
                    errors.push(format!(
                        "The right operand of the boolean operation '{}' is not a boolean value.",
                        self.name()
                    ));
                    ok = false;
                }
                ok
            }
        }
    }

    fn check_numeric(self, left: &Type, right: &Type, errors: &mut Vec<String>) -> bool {
        let mut ok = true;
        if !left.is_numeric() {
            errors.push(format!(
                "The left operand of the numeric operation '{}' is not a numeric value.",
                self.name()
            ));
            ok = false;
        }
        if !right.is_numeric() {
            errors.push(format!(
                "The right operand of the numeric operation '{}' is not a numeric value.",
                self.name()
            ));
            ok = false;
        }
        if ok && self != Operator::Power && harmonized_kind(left, right).is_none() {
            errors.push(format!(
                "The operands of the numeric operation '{}' are not compatible.",
                self.name()
            ));
            ok = false;
        }
        ok
    }

    fn check_relation(self, left: &Type, right: &Type, errors: &mut Vec<String>) -> bool {
        let name = self.name();
        if *left == Type::String && *right == Type::String {
            return true;
        }
        if left.is_numeric() && right.is_numeric() {
            if harmonized_kind(left, right).is_some() {
                return true;
            }
            errors.push(format!(
                "The numeric operands of the comparison '{}' are not compatible.",
                name
            ));
            return false;
        }
        if !self.is_equality() {
            errors.push(if *left == Type::String {
                format!(
                    "The left operand of the comparison '{}' is a string but the right operand is not.",
                    name
                )
            } else if left.is_numeric() {
                format!(
                    "The left operand of the comparison '{}' is a numeric value but the right operand is not.",
                    name
                )
            } else {
                format!(
                    "The operands are not supported by the comparison operator '{}'.",
                    name
                )
            });
            return false;
        }

        if *left == Type::Bool && *right == Type::Bool {
            return true;
        }
        if left.is_reference() && right.is_reference() {
            if left == right || *left == Type::Object || *right == Type::Object {
                return true;
            }
            errors.push(format!(
                "The operands of the comparison '{}' are references of different types.",
                name
            ));
            return false;
        }
        errors.push(if *left == Type::Bool {
            format!(
                "The left operand of the comparison '{}' is a boolean value but the right operand is not.",
                name
            )
        } else if left.is_numeric() {
            format!(
                "The left operand of the comparison '{}' is a numeric value but the right operand is not.",
                name
            )
        } else {
            format!(
                "The left operand of the comparison '{}' is a reference but the right operand is a value.",
                name
            )
        });
        false
    }

    /// The static result type for operands that passed [`Operator::check_operands`].
    pub fn result_type(self, left: &Type, right: &Type) -> Type {
        match self.category() {
            OperatorCategory::Numeric if self == Operator::Power => Type::F64,
            OperatorCategory::Numeric => {
                Type::Numeric(harmonized_kind(left, right).unwrap_or(NumericKind::F64))
            }
            OperatorCategory::String => Type::String,
            OperatorCategory::Relation | OperatorCategory::Boolean => Type::Bool,
        }
    }

    /// Applies the operator to two runtime values.
    pub fn evaluate(self, left: Value, right: Value) -> Result<Value> {
        match self.category() {
            OperatorCategory::Numeric => self.evaluate_numeric(left, right),
            OperatorCategory::String => Ok(Value::String(format!("{}{}", left, right))),
            OperatorCategory::Relation => self.evaluate_relation(left, right),
            OperatorCategory::Boolean => {
                let (a, b) = (expect_bool(&left)?, expect_bool(&right)?);
                Ok(Value::Bool(match self {
                    Operator::And => a && b,
                    Operator::Or => a || b,
                    _ => a ^ b,
                }))
            }
        }
    }

    fn evaluate_numeric(self, left: Value, right: Value) -> Result<Value> {
        if self == Operator::Power {
            let base = numeric::convert(&left, NumericKind::F64)?;
            let exponent = numeric::convert(&right, NumericKind::F64)?;
            return match (base, exponent) {
                (Value::F64(b), Value::F64(e)) => Ok(Value::F64(b.powf(e))),
                (b, _) => Err(ValueError::invalid_cast(b.type_name(), "double").into()),
            };
        }
        let (a, b, _) = harmonize_values(&auto_upgrade(left), &auto_upgrade(right))?;
        self.arithmetic(a, b)
    }

    fn arithmetic(self, a: Value, b: Value) -> Result<Value> {
        macro_rules! checked {
            ($op:expr, $a:expr, $b:expr, $variant:ident, $zero:expr) => {{
                let (op, a, b) = ($op, $a, $b);
                let result = match op {
                    Operator::Addition => a.checked_add(b),
                    Operator::Subtraction => a.checked_sub(b),
                    Operator::Multiplication => a.checked_mul(b),
                    _ => {
                        if b == $zero {
                            return Err(ExpressionError::DivisionByZero);
                        }
                        a.checked_div(b)
                    }
                };
                result
                    .map(Value::$variant)
                    .ok_or_else(|| ExpressionError::overflow(op.name()))
            }};
        }
        macro_rules! float {
            ($op:expr, $a:expr, $b:expr, $variant:ident) => {{
                let (op, a, b) = ($op, $a, $b);
                Ok(Value::$variant(match op {
                    Operator::Addition => a + b,
                    Operator::Subtraction => a - b,
                    Operator::Multiplication => a * b,
                    _ => a / b,
                }))
            }};
        }

        match (a, b) {
            (Value::I32(a), Value::I32(b)) => checked!(self, a, b, I32, 0),
            (Value::U32(a), Value::U32(b)) => checked!(self, a, b, U32, 0),
            (Value::I64(a), Value::I64(b)) => checked!(self, a, b, I64, 0),
            (Value::U64(a), Value::U64(b)) => checked!(self, a, b, U64, 0),
            (Value::I16(a), Value::I16(b)) => checked!(self, a, b, I16, 0),
            (Value::U16(a), Value::U16(b)) => checked!(self, a, b, U16, 0),
            (Value::I8(a), Value::I8(b)) => checked!(self, a, b, I8, 0),
            (Value::U8(a), Value::U8(b)) => checked!(self, a, b, U8, 0),
            (Value::Decimal(a), Value::Decimal(b)) => {
                checked!(self, a, b, Decimal, formulon_value::Decimal::ZERO)
            }
            (Value::F32(a), Value::F32(b)) => float!(self, a, b, F32),
            (Value::F64(a), Value::F64(b)) => float!(self, a, b, F64),
            (a, b) => Err(ValueError::invalid_cast(b.type_name(), a.type_name()).into()),
        }
    }

    fn evaluate_relation(self, left: Value, right: Value) -> Result<Value> {
        let ordering = match (&left, &right) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) if self.is_equality() => Some(a.cmp(b)),
            (Value::Null, Value::Null) if self.is_equality() => Some(Ordering::Equal),
            (a, b) if a.numeric_kind().is_some() && b.numeric_kind().is_some() => {
                let (a, b, _) = harmonize_values(&auto_upgrade(left.clone()), &auto_upgrade(right.clone()))?;
                compare_numeric(&a, &b)
            }
            // null sorts before every string
            (Value::Null, Value::String(_)) if !self.is_equality() => Some(Ordering::Less),
            (Value::String(_), Value::Null) if !self.is_equality() => Some(Ordering::Greater),
            _ if self.is_equality() => {
                let equal = left == right;
                return Ok(Value::Bool(equal == (self == Operator::Equal)));
            }
            _ => {
                return Err(ExpressionError::evaluation(format!(
                    "The operands {} and {} are not supported by the comparison operator '{}'.",
                    left.type_name(),
                    right.type_name(),
                    self.name()
                )));
            }
        };
        Ok(Value::Bool(self.accepts(ordering)))
    }

    fn accepts(self, ordering: Option<Ordering>) -> bool {
        match self {
            Operator::Less => ordering == Some(Ordering::Less),
            Operator::LessOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Operator::Equal => ordering == Some(Ordering::Equal),
            Operator::Unequal => ordering != Some(Ordering::Equal),
            Operator::GreaterOrEqual => {
                matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
            }
            Operator::Greater => ordering == Some(Ordering::Greater),
            _ => false,
        }
    }
}

/// The kind both operand types harmonize to after auto-upgrading small integers.
fn harmonized_kind(left: &Type, right: &Type) -> Option<NumericKind> {
    let l = left.numeric_kind()?.auto_upgraded();
    let r = right.numeric_kind()?.auto_upgraded();
    try_harmonize(l, r)
}

fn compare_numeric(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::I32(a), Value::I32(b)) => a.partial_cmp(b),
        (Value::U32(a), Value::U32(b)) => a.partial_cmp(b),
        (Value::I64(a), Value::I64(b)) => a.partial_cmp(b),
        (Value::U64(a), Value::U64(b)) => a.partial_cmp(b),
        (Value::F32(a), Value::F32(b)) => a.partial_cmp(b),
        (Value::F64(a), Value::F64(b)) => a.partial_cmp(b),
        (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
        (Value::I16(a), Value::I16(b)) => a.partial_cmp(b),
        (Value::U16(a), Value::U16(b)) => a.partial_cmp(b),
        (Value::I8(a), Value::I8(b)) => a.partial_cmp(b),
        (Value::U8(a), Value::U8(b)) => a.partial_cmp(b),
        _ => None,
    }
}

fn expect_bool(value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| ValueError::invalid_cast(value.type_name(), "boolean").into())
}
