use formulon_lang::ExpressionError;
use thiserror::Error;

/// Errors of the command line front end.
#[derive(Error, Debug)]
pub enum FormulonError {
    #[error("{0}")]
    Expression(#[from] ExpressionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid binding '{0}', expected name=value")]
    Binding(String),

    #[error("Invalid plot settings: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, FormulonError>;
