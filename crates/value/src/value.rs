use crate::numeric::NumericKind;
use rust_decimal::Decimal;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The static type of an expression or value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Numeric(NumericKind),
    String,
    /// The untyped reference type. `null` literals have this type and every
    /// value can be passed where it is expected.
    Object,
    /// A host object type, identified by the name its [`HostObject`]s report.
    Host(Arc<str>),
}

impl Type {
    pub const I8: Type = Type::Numeric(NumericKind::I8);
    pub const U8: Type = Type::Numeric(NumericKind::U8);
    pub const I16: Type = Type::Numeric(NumericKind::I16);
    pub const U16: Type = Type::Numeric(NumericKind::U16);
    pub const I32: Type = Type::Numeric(NumericKind::I32);
    pub const U32: Type = Type::Numeric(NumericKind::U32);
    pub const I64: Type = Type::Numeric(NumericKind::I64);
    pub const U64: Type = Type::Numeric(NumericKind::U64);
    pub const F32: Type = Type::Numeric(NumericKind::F32);
    pub const F64: Type = Type::Numeric(NumericKind::F64);
    pub const DECIMAL: Type = Type::Numeric(NumericKind::Decimal);

    pub fn host(name: impl Into<Arc<str>>) -> Self {
        Type::Host(name.into())
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Type::Numeric(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Numeric(_))
    }

    /// Value types can never hold `null`.
    pub fn is_value_type(&self) -> bool {
        matches!(self, Type::Bool | Type::Numeric(_))
    }

    pub fn is_reference(&self) -> bool {
        !self.is_value_type()
    }

    pub fn name(&self) -> &str {
        match self {
            Type::Bool => "boolean",
            Type::Numeric(kind) => kind.type_name(),
            Type::String => "string",
            Type::Object => "object",
            Type::Host(name) => name,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value owned by the embedding application.
///
/// Host objects are opaque to the language; their members are reached through a
/// member resolver registered with the evaluation context.
pub trait HostObject: fmt::Debug + fmt::Display + Send + Sync {
    fn type_name(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

/// A dynamically typed runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    String(String),
    Object(Arc<dyn HostObject>),
}

impl Value {
    pub fn object(object: impl HostObject + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    /// The runtime type of the value; `null` reports [`Type::Object`].
    pub fn value_type(&self) -> Type {
        match self {
            Value::Null => Type::Object,
            Value::Bool(_) => Type::Bool,
            Value::String(_) => Type::String,
            Value::Object(o) => Type::host(o.type_name()),
            numeric => match numeric.numeric_kind() {
                Some(kind) => Type::Numeric(kind),
                None => Type::Object,
            },
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            other => other.value_type().name().to_string(),
        }
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        Some(match self {
            Value::I8(_) => NumericKind::I8,
            Value::U8(_) => NumericKind::U8,
            Value::I16(_) => NumericKind::I16,
            Value::U16(_) => NumericKind::U16,
            Value::I32(_) => NumericKind::I32,
            Value::U32(_) => NumericKind::U32,
            Value::I64(_) => NumericKind::I64,
            Value::U64(_) => NumericKind::U64,
            Value::F32(_) => NumericKind::F32,
            Value::F64(_) => NumericKind::F64,
            Value::Decimal(_) => NumericKind::Decimal,
            _ => return None,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value may be stored where `ty` is the static type.
    ///
    /// `null` fits every reference type and every value fits [`Type::Object`].
    pub fn is_instance_of(&self, ty: &Type) -> bool {
        match (self, ty) {
            (_, Type::Object) => true,
            (Value::Null, ty) => ty.is_reference(),
            (value, ty) => value.value_type() == *ty,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Renders the value the way string concatenation sees it; `null` is empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Object(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => String,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
