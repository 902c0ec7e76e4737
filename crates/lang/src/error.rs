use formulon_value::ValueError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Syntax error in '{expression}': {message}")]
    SyntaxError { expression: String, message: String },

    #[error("Semantic error: {}", messages.join("\n"))]
    SemanticError { messages: Vec<String> },

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Function '{function}' error: {message}")]
    FunctionError { function: String, message: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow in operation '{operation}'")]
    Overflow { operation: String },

    #[error("Variable '{name}' not found")]
    UnknownVariable { name: String },

    #[error("The name '{name}' is a language keyword")]
    KeywordName { name: String },

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl ExpressionError {
    pub fn syntax(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SyntaxError {
            expression: expression.into(),
            message: message.into(),
        }
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        Self::SemanticError {
            messages: vec![message.into()],
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation(message.into())
    }

    pub fn function(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FunctionError {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Self::SyntaxError { .. })
    }

    pub fn is_semantic_error(&self) -> bool {
        matches!(self, Self::SemanticError { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExpressionError>;
