//! The numeric type lattice.
//!
//! Eleven numeric kinds are related by a partial "upgrade" order: a kind can be
//! upgraded to another if every value of the source kind is representable by the
//! target kind in the sense of an implicit widening conversion. Two kinds are
//! *harmonizable* if one of them upgrades to the other.
//!
//! The four narrowest integer kinds are always promoted to `I32` before an operator
//! is applied to them.

use crate::error::ValueError;
use crate::value::Value;
use rust_decimal::Decimal as Dec;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Decimal,
}

use NumericKind::*;

impl NumericKind {
    pub const ALL: [NumericKind; 11] = [I8, U8, I16, U16, I32, U32, I64, U64, F32, F64, Decimal];

    pub fn type_name(self) -> &'static str {
        match self {
            I8 => "sbyte",
            U8 => "byte",
            I16 => "int16",
            U16 => "uint16",
            I32 => "int32",
            U32 => "uint32",
            I64 => "int64",
            U64 => "uint64",
            F32 => "single",
            F64 => "double",
            Decimal => "decimal",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, F32 | F64 | Decimal)
    }

    pub fn is_float(self) -> bool {
        matches!(self, F32 | F64)
    }

    /// Small integer kinds are promoted to `I32` before any operator applies.
    pub fn needs_auto_upgrade(self) -> bool {
        matches!(self, I8 | U8 | I16 | U16)
    }

    pub fn auto_upgraded(self) -> NumericKind {
        if self.needs_auto_upgrade() { I32 } else { self }
    }

    /// Whether a value of this kind can be implicitly widened to `target`.
    ///
    /// The relation is strict: a kind is not considered upgradable to itself.
    pub fn is_upgradable_to(self, target: NumericKind) -> bool {
        match target {
            I16 => matches!(self, I8 | U8),
            U16 => matches!(self, U8),
            I32 => matches!(self, I8 | U8 | I16 | U16),
            U32 => matches!(self, U8 | U16),
            I64 => matches!(self, I8 | U8 | I16 | U16 | I32 | U32),
            U64 => matches!(self, U8 | U16 | U32),
            F32 => self.is_integer(),
            F64 => self.is_integer() || self == F32,
            Decimal => self.is_integer(),
            I8 | U8 => false,
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Finds the common kind two numeric kinds can both be upgraded to.
///
/// Returns `None` when neither kind upgrades to the other, e.g. for `F32` and
/// `Decimal`.
pub fn try_harmonize(a: NumericKind, b: NumericKind) -> Option<NumericKind> {
    if a == b {
        Some(a)
    } else if a.is_upgradable_to(b) {
        Some(b)
    } else if b.is_upgradable_to(a) {
        Some(a)
    } else {
        None
    }
}

/// Promotes a small integer value to `I32`; other values are returned unchanged.
pub fn auto_upgrade(value: Value) -> Value {
    match value {
        Value::I8(v) => Value::I32(v.into()),
        Value::U8(v) => Value::I32(v.into()),
        Value::I16(v) => Value::I32(v.into()),
        Value::U16(v) => Value::I32(v.into()),
        other => other,
    }
}

/// Converts both values to their harmonized kind.
pub fn harmonize_values(a: &Value, b: &Value) -> Result<(Value, Value, NumericKind), ValueError> {
    let ka = expect_numeric(a)?;
    let kb = expect_numeric(b)?;
    let kind = try_harmonize(ka, kb)
        .ok_or_else(|| ValueError::invalid_cast(ka.type_name(), kb.type_name()))?;
    Ok((convert(a, kind)?, convert(b, kind)?, kind))
}

fn expect_numeric(value: &Value) -> Result<NumericKind, ValueError> {
    value
        .numeric_kind()
        .ok_or_else(|| ValueError::invalid_cast(value.type_name(), "numeric"))
}

enum Repr {
    Int(i128),
    Float(f64),
    Dec(Dec),
}

fn repr(value: &Value) -> Option<Repr> {
    Some(match value {
        Value::I8(v) => Repr::Int((*v).into()),
        Value::U8(v) => Repr::Int((*v).into()),
        Value::I16(v) => Repr::Int((*v).into()),
        Value::U16(v) => Repr::Int((*v).into()),
        Value::I32(v) => Repr::Int((*v).into()),
        Value::U32(v) => Repr::Int((*v).into()),
        Value::I64(v) => Repr::Int((*v).into()),
        Value::U64(v) => Repr::Int((*v).into()),
        Value::F32(v) => Repr::Float((*v).into()),
        Value::F64(v) => Repr::Float(*v),
        Value::Decimal(v) => Repr::Dec(*v),
        _ => return None,
    })
}

/// Checked conversion of a numeric value to any numeric kind.
///
/// Integer targets truncate fractional sources toward zero and fail with
/// [`ValueError::Overflow`] when the result is out of range.
pub fn convert(value: &Value, target: NumericKind) -> Result<Value, ValueError> {
    let source = expect_numeric(value)?;
    if source == target {
        return Ok(value.clone());
    }
    let overflow = || ValueError::overflow(target.type_name());
    let Some(repr) = repr(value) else {
        return Err(ValueError::invalid_cast(value.type_name(), target.type_name()));
    };

    match target {
        F32 => Ok(Value::F32(match repr {
            Repr::Int(i) => i as f32,
            Repr::Float(f) => f as f32,
            Repr::Dec(d) => d.to_f32().ok_or_else(overflow)?,
        })),
        F64 => Ok(Value::F64(match repr {
            Repr::Int(i) => i as f64,
            Repr::Float(f) => f,
            Repr::Dec(d) => d.to_f64().ok_or_else(overflow)?,
        })),
        Decimal => Ok(Value::Decimal(match repr {
            Repr::Int(i) => Dec::from_i128(i).ok_or_else(overflow)?,
            Repr::Float(f) if source == F32 => Dec::from_f32(f as f32).ok_or_else(overflow)?,
            Repr::Float(f) => Dec::from_f64(f).ok_or_else(overflow)?,
            Repr::Dec(d) => d,
        })),
        _ => {
            let n = match repr {
                Repr::Int(i) => i,
                Repr::Float(f) => {
                    let t = f.trunc();
                    if !t.is_finite() || t < i64::MIN as f64 || t > u64::MAX as f64 {
                        return Err(overflow());
                    }
                    t as i128
                }
                Repr::Dec(d) => {
                    let t = d.trunc();
                    let n = if t.is_sign_negative() {
                        t.to_i64().map(i128::from)
                    } else {
                        t.to_u64().map(i128::from)
                    };
                    n.ok_or_else(overflow)?
                }
            };
            narrow(n, target)
        }
    }
}

fn narrow(n: i128, target: NumericKind) -> Result<Value, ValueError> {
    let overflow = |_| ValueError::overflow(target.type_name());
    Ok(match target {
        I8 => Value::I8(i8::try_from(n).map_err(overflow)?),
        U8 => Value::U8(u8::try_from(n).map_err(overflow)?),
        I16 => Value::I16(i16::try_from(n).map_err(overflow)?),
        U16 => Value::U16(u16::try_from(n).map_err(overflow)?),
        I32 => Value::I32(i32::try_from(n).map_err(overflow)?),
        U32 => Value::U32(u32::try_from(n).map_err(overflow)?),
        I64 => Value::I64(i64::try_from(n).map_err(overflow)?),
        U64 => Value::U64(u64::try_from(n).map_err(overflow)?),
        F32 | F64 | Decimal => {
            return Err(ValueError::invalid_cast("integer", target.type_name()));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harmonize_is_reflexive() {
        for kind in NumericKind::ALL {
            assert_eq!(try_harmonize(kind, kind), Some(kind));
        }
    }

    #[test]
    fn test_harmonize_is_commutative() {
        for a in NumericKind::ALL {
            for b in NumericKind::ALL {
                assert_eq!(try_harmonize(a, b), try_harmonize(b, a), "{a} / {b}");
            }
        }
    }

    #[test]
    fn test_harmonize_widens() {
        assert_eq!(try_harmonize(I32, I64), Some(I64));
        assert_eq!(try_harmonize(U8, I16), Some(I16));
        assert_eq!(try_harmonize(U32, I64), Some(I64));
        assert_eq!(try_harmonize(I32, F32), Some(F32));
        assert_eq!(try_harmonize(F32, F64), Some(F64));
        assert_eq!(try_harmonize(U64, Decimal), Some(Decimal));
    }

    #[test]
    fn test_harmonize_rejects_incompatible_kinds() {
        assert_eq!(try_harmonize(F32, Decimal), None);
        assert_eq!(try_harmonize(F64, Decimal), None);
        assert_eq!(try_harmonize(I8, U8), None);
        assert_eq!(try_harmonize(I32, U32), None);
        assert_eq!(try_harmonize(I64, U64), None);
    }

    #[test]
    fn test_upgrade_table() {
        assert!(U8.is_upgradable_to(U16));
        assert!(!I8.is_upgradable_to(U16));
        assert!(U16.is_upgradable_to(U32));
        assert!(!I16.is_upgradable_to(U32));
        assert!(U32.is_upgradable_to(U64));
        assert!(!I32.is_upgradable_to(U64));
        assert!(I64.is_upgradable_to(F32));
        assert!(!F64.is_upgradable_to(F32));
        assert!(!F32.is_upgradable_to(Decimal));
        assert!(!I32.is_upgradable_to(I32));
    }

    #[test]
    fn test_auto_upgrade() {
        assert!(I8.needs_auto_upgrade());
        assert!(U16.needs_auto_upgrade());
        assert!(!I32.needs_auto_upgrade());
        assert_eq!(auto_upgrade(Value::U8(200)), Value::I32(200));
        assert_eq!(auto_upgrade(Value::I16(-3)), Value::I32(-3));
        assert_eq!(auto_upgrade(Value::U32(7)), Value::U32(7));
    }

    #[test]
    fn test_harmonize_values() {
        let (a, b, kind) = harmonize_values(&Value::I32(100), &Value::F32(100.0)).unwrap();
        assert_eq!(kind, F32);
        assert_eq!(a, Value::F32(100.0));
        assert_eq!(b, Value::F32(100.0));

        assert!(harmonize_values(&Value::F32(1.0), &Value::Decimal(Dec::ONE)).is_err());
    }

    #[test]
    fn test_checked_conversion() {
        assert_eq!(convert(&Value::F64(2.9), I32).unwrap(), Value::I32(2));
        assert_eq!(convert(&Value::F64(-2.9), I32).unwrap(), Value::I32(-2));
        assert_eq!(convert(&Value::I32(255), U8).unwrap(), Value::U8(255));
        assert!(matches!(
            convert(&Value::I32(256), U8),
            Err(ValueError::Overflow { .. })
        ));
        assert!(convert(&Value::I32(-1), U32).is_err());
        assert!(convert(&Value::F64(f64::NAN), I64).is_err());
        assert_eq!(
            convert(&Value::I64(42), Decimal).unwrap(),
            Value::Decimal(Dec::from(42))
        );
        assert_eq!(
            convert(&Value::Decimal(Dec::new(-125, 1)), I16).unwrap(),
            Value::I16(-12)
        );
        assert!(convert(&Value::String("1".into()), I32).is_err());
    }
}
