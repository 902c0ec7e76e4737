//! Mapping between Rust types and language types.

use crate::error::ValueError;
use crate::numeric::NumericKind;
use crate::value::{Type, Value};
use rust_decimal::Decimal;

/// A Rust type with a fixed language type.
///
/// Used at the host boundary: typed function registration, typed compilation and
/// typed variable access. `from_value` performs no numeric conversion; the value
/// must already be of the exact kind.
pub trait ValueType: Sized + Send + 'static {
    fn value_type() -> Type;
    fn from_value(value: Value) -> Result<Self, ValueError>;
    fn into_value(self) -> Value;
}

macro_rules! impl_value_type {
    ($($t:ty => $variant:ident, $ty:expr);* $(;)?) => {
        $(
            impl ValueType for $t {
                fn value_type() -> Type {
                    $ty
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        Value::Null => Err(ValueError::null_value(Self::value_type().name())),
                        other => Err(ValueError::invalid_cast(
                            other.type_name(),
                            Self::value_type().name(),
                        )),
                    }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

impl_value_type! {
    bool => Bool, Type::Bool;
    i8 => I8, Type::Numeric(NumericKind::I8);
    u8 => U8, Type::Numeric(NumericKind::U8);
    i16 => I16, Type::Numeric(NumericKind::I16);
    u16 => U16, Type::Numeric(NumericKind::U16);
    i32 => I32, Type::Numeric(NumericKind::I32);
    u32 => U32, Type::Numeric(NumericKind::U32);
    i64 => I64, Type::Numeric(NumericKind::I64);
    u64 => U64, Type::Numeric(NumericKind::U64);
    f32 => F32, Type::Numeric(NumericKind::F32);
    f64 => F64, Type::Numeric(NumericKind::F64);
    Decimal => Decimal, Type::Numeric(NumericKind::Decimal);
    String => String, Type::String;
}

/// A nullable string.
impl ValueType for Option<String> {
    fn value_type() -> Type {
        Type::String
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => String::from_value(other).map(Some),
        }
    }

    fn into_value(self) -> Value {
        self.map(Value::String).unwrap_or(Value::Null)
    }
}

/// Any value, typed as [`Type::Object`].
impl ValueType for Value {
    fn value_type() -> Type {
        Type::Object
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }

    fn into_value(self) -> Value {
        self
    }
}
