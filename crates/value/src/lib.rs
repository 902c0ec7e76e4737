//! Runtime values, static types and the numeric lattice of the formulon
//! expression language.
//!
//! # Key Types
//!
//! - [`Value`]: A dynamically typed runtime value
//! - [`Type`]: The static type of an expression
//! - [`NumericKind`]: One of the eleven numeric kinds
//! - [`ValueType`]: Binds a Rust type to a language type

pub mod convert;
pub mod error;
pub mod numeric;
pub mod value;

pub use convert::ValueType;
pub use error::ValueError;
pub use numeric::{NumericKind, auto_upgrade, harmonize_values, try_harmonize};
pub use value::{HostObject, Type, Value};

pub use rust_decimal::Decimal;
