use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Cannot cast {from_type} to {to_type}")]
    InvalidCast { from_type: String, to_type: String },

    #[error("Arithmetic overflow: value does not fit into {target}")]
    Overflow { target: String },

    #[error("Null value where {expected} was required")]
    NullValue { expected: String },
}

impl ValueError {
    pub fn invalid_cast(from_type: impl Into<String>, to_type: impl Into<String>) -> Self {
        Self::InvalidCast {
            from_type: from_type.into(),
            to_type: to_type.into(),
        }
    }

    pub fn overflow(target: impl Into<String>) -> Self {
        Self::Overflow {
            target: target.into(),
        }
    }

    pub fn null_value(expected: impl Into<String>) -> Self {
        Self::NullValue {
            expected: expected.into(),
        }
    }
}
