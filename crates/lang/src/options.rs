//! Lexical and semantic variability of the language.
//!
//! [`LanguageOptions`] is an immutable value. To change a setting, derive a
//! [`LanguageOptionsBuilder`] from an existing value and build a new one.
//!
//! ```ignore
//! let options = LanguageOptions::default()
//!     .derive()
//!     .with_member_read()
//!     .with_quote_style(QuoteStyle::Single)
//!     .ignore_case()
//!     .build();
//! ```

use serde::{Deserialize, Serialize};

/// The character that delimits string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStyle {
    #[default]
    Double,
    Single,
    Backtick,
}

impl QuoteStyle {
    pub fn quote_char(self) -> char {
        match self {
            QuoteStyle::Double => '"',
            QuoteStyle::Single => '\'',
            QuoteStyle::Backtick => '`',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageOptions {
    member_read: bool,
    ignore_operator_case: bool,
    ignore_boolean_literal_case: bool,
    ignore_null_literal_case: bool,
    ignore_null_test_case: bool,
    ignore_conditional_case: bool,
    ignore_variable_name_case: bool,
    ignore_parameter_name_case: bool,
    ignore_function_name_case: bool,
    quote_style: QuoteStyle,
    operator_and_name: String,
    operator_or_name: String,
    operator_xor_name: String,
    literal_true_name: String,
    literal_false_name: String,
    literal_null_name: String,
    conditional_name: String,
    null_test_name: String,
}

impl Default for LanguageOptions {
    fn default() -> Self {
        Self {
            member_read: false,
            ignore_operator_case: false,
            ignore_boolean_literal_case: false,
            ignore_null_literal_case: false,
            ignore_null_test_case: false,
            ignore_conditional_case: false,
            ignore_variable_name_case: false,
            ignore_parameter_name_case: false,
            ignore_function_name_case: false,
            quote_style: QuoteStyle::Double,
            operator_and_name: "and".to_string(),
            operator_or_name: "or".to_string(),
            operator_xor_name: "xor".to_string(),
            literal_true_name: "true".to_string(),
            literal_false_name: "false".to_string(),
            literal_null_name: "null".to_string(),
            conditional_name: "if".to_string(),
            null_test_name: "isnull".to_string(),
        }
    }
}

impl LanguageOptions {
    pub fn builder() -> LanguageOptionsBuilder {
        LanguageOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Starts a builder initialised with these options.
    pub fn derive(&self) -> LanguageOptionsBuilder {
        LanguageOptionsBuilder {
            options: self.clone(),
        }
    }

    pub fn member_read(&self) -> bool {
        self.member_read
    }

    pub fn ignore_operator_case(&self) -> bool {
        self.ignore_operator_case
    }

    pub fn ignore_boolean_literal_case(&self) -> bool {
        self.ignore_boolean_literal_case
    }

    pub fn ignore_null_literal_case(&self) -> bool {
        self.ignore_null_literal_case
    }

    pub fn ignore_null_test_case(&self) -> bool {
        self.ignore_null_test_case
    }

    pub fn ignore_conditional_case(&self) -> bool {
        self.ignore_conditional_case
    }

    pub fn ignore_variable_name_case(&self) -> bool {
        self.ignore_variable_name_case
    }

    pub fn ignore_parameter_name_case(&self) -> bool {
        self.ignore_parameter_name_case
    }

    pub fn ignore_function_name_case(&self) -> bool {
        self.ignore_function_name_case
    }

    pub fn quote_style(&self) -> QuoteStyle {
        self.quote_style
    }

    pub fn quote_char(&self) -> char {
        self.quote_style.quote_char()
    }

    pub fn operator_and_name(&self) -> &str {
        &self.operator_and_name
    }

    pub fn operator_or_name(&self) -> &str {
        &self.operator_or_name
    }

    pub fn operator_xor_name(&self) -> &str {
        &self.operator_xor_name
    }

    pub fn literal_true_name(&self) -> &str {
        &self.literal_true_name
    }

    pub fn literal_false_name(&self) -> &str {
        &self.literal_false_name
    }

    pub fn literal_null_name(&self) -> &str {
        &self.literal_null_name
    }

    pub fn conditional_name(&self) -> &str {
        &self.conditional_name
    }

    pub fn null_test_name(&self) -> &str {
        &self.null_test_name
    }

    /// All reserved words: the boolean operators, the literals and the
    /// conditional name.
    pub fn keywords(&self) -> [&str; 7] {
        [
            self.operator_and_name.as_str(),
            self.operator_or_name.as_str(),
            self.operator_xor_name.as_str(),
            self.literal_null_name.as_str(),
            self.literal_true_name.as_str(),
            self.literal_false_name.as_str(),
            self.conditional_name.as_str(),
        ]
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        let op = self.ignore_operator_case;
        let boolean = self.ignore_boolean_literal_case;
        names_equal(word, &self.operator_and_name, op)
            || names_equal(word, &self.operator_or_name, op)
            || names_equal(word, &self.operator_xor_name, op)
            || names_equal(word, &self.literal_null_name, self.ignore_null_literal_case)
            || names_equal(word, &self.literal_true_name, boolean)
            || names_equal(word, &self.literal_false_name, boolean)
            || names_equal(word, &self.conditional_name, self.ignore_conditional_case)
    }
}

/// Compares two names, optionally ignoring case.
pub fn names_equal(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a == b || a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

#[derive(Debug, Clone)]
pub struct LanguageOptionsBuilder {
    options: LanguageOptions,
}

impl LanguageOptionsBuilder {
    pub fn build(self) -> LanguageOptions {
        self.options
    }

    pub fn with_member_read(mut self) -> Self {
        self.options.member_read = true;
        self
    }

    pub fn ignore_operator_case(mut self) -> Self {
        self.options.ignore_operator_case = true;
        self
    }

    pub fn ignore_boolean_literal_case(mut self) -> Self {
        self.options.ignore_boolean_literal_case = true;
        self
    }

    pub fn ignore_null_literal_case(mut self) -> Self {
        self.options.ignore_null_literal_case = true;
        self
    }

    pub fn ignore_null_test_case(mut self) -> Self {
        self.options.ignore_null_test_case = true;
        self
    }

    pub fn ignore_conditional_case(mut self) -> Self {
        self.options.ignore_conditional_case = true;
        self
    }

    pub fn ignore_variable_name_case(mut self) -> Self {
        self.options.ignore_variable_name_case = true;
        self
    }

    pub fn ignore_parameter_name_case(mut self) -> Self {
        self.options.ignore_parameter_name_case = true;
        self
    }

    pub fn ignore_function_name_case(mut self) -> Self {
        self.options.ignore_function_name_case = true;
        self
    }

    /// Turns on every case toggle.
    pub fn ignore_case(self) -> Self {
        self.ignore_operator_case()
            .ignore_boolean_literal_case()
            .ignore_null_literal_case()
            .ignore_null_test_case()
            .ignore_conditional_case()
            .ignore_variable_name_case()
            .ignore_parameter_name_case()
            .ignore_function_name_case()
    }

    pub fn with_quote_style(mut self, style: QuoteStyle) -> Self {
        self.options.quote_style = style;
        self
    }

    pub fn with_null_literal_name(mut self, name: impl Into<String>) -> Self {
        self.options.literal_null_name = name.into();
        self
    }

    pub fn with_boolean_literal_names(
        mut self,
        true_name: impl Into<String>,
        false_name: impl Into<String>,
    ) -> Self {
        self.options.literal_true_name = true_name.into();
        self.options.literal_false_name = false_name.into();
        self
    }

    pub fn with_boolean_operator_names(
        mut self,
        and_name: impl Into<String>,
        or_name: impl Into<String>,
        xor_name: impl Into<String>,
    ) -> Self {
        self.options.operator_and_name = and_name.into();
        self.options.operator_or_name = or_name.into();
        self.options.operator_xor_name = xor_name.into();
        self
    }

    pub fn with_conditional_name(mut self, name: impl Into<String>) -> Self {
        self.options.conditional_name = name.into();
        self
    }

    pub fn with_null_test_name(mut self, name: impl Into<String>) -> Self {
        self.options.null_test_name = name.into();
        self
    }
}
