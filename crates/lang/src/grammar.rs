//! A `nom`-based parser for the expression language.
//!
//! The grammar is configured by [`LanguageOptions`]: keyword spellings, their
//! case sensitivity, the string quote and whether member reads are allowed are
//! all read at parse time.

use crate::ast::ExpressionElement;
use crate::error::{ExpressionError, Result};
use crate::operators::Operator;
use crate::options::{LanguageOptions, names_equal};
use formulon_value::{Decimal, Value};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{not, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn consumed<'a>(input: &'a str, rest: &'a str) -> &'a str {
    &input[..input.len() - rest.len()]
}

/// Matches `word` when it is not the prefix of a longer identifier.
fn keyword<'a>(input: &'a str, word: &str, ignore_case: bool) -> IResult<&'a str, &'a str> {
    let matched: IResult<&'a str, &'a str> = if ignore_case {
        tag_no_case(word).parse(input)
    } else {
        tag(word).parse(input)
    };
    let (rest, word) = matched?;
    let (rest, _) = not(satisfy(is_identifier_char)).parse(rest)?;
    Ok((rest, word))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(is_identifier_start), take_while(is_identifier_char))).parse(input)
}

/// An optional leading sign of a numeric literal. Whitespace may follow it.
fn sign(input: &str) -> IResult<&str, Option<char>> {
    opt(terminated(one_of("+-"), multispace0)).parse(input)
}

fn signed_text(sign: Option<char>, number: &str) -> String {
    match sign {
        Some('-') => format!("-{}", number),
        _ => number.to_string(),
    }
}

// --- Literals ---

fn integer_literal(input: &str) -> IResult<&str, ExpressionElement> {
    let (rest, (sign, digits, suffix)) = (sign, digit1, opt(one_of("iIlL"))).parse(input)?;
    let text = signed_text(sign, digits);
    let value = match suffix {
        Some('i' | 'I') => text.parse::<i32>().ok().map(Value::I32),
        Some(_) => text.parse::<i64>().ok().map(Value::I64),
        None => text
            .parse::<i32>()
            .map(Value::I32)
            .or_else(|_| text.parse::<i64>().map(Value::I64))
            .ok(),
    };
    Ok((
        rest,
        ExpressionElement::IntegerLiteral {
            value,
            source: consumed(input, rest).to_string(),
        },
    ))
}

fn float_literal(input: &str) -> IResult<&str, ExpressionElement> {
    let (rest, (sign, number, suffix)) = (
        sign,
        alt((recognize((digit1, char('.'), digit1)), digit1)),
        opt(one_of("fFdD")),
    )
        .parse(input)?;
    // a plain integer is only a float with a suffix
    if suffix.is_none() && !number.contains('.') {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Float)));
    }
    let text = signed_text(sign, number);
    let value = match suffix {
        Some('f' | 'F') => text.parse::<f32>().ok().map(Value::F32),
        Some(_) => text.parse::<f64>().ok().map(Value::F64),
        None => text.parse::<f64>().ok().map(|d| {
            let single = d as f32;
            if single as f64 == d {
                Value::F32(single)
            } else {
                Value::F64(d)
            }
        }),
    };
    Ok((
        rest,
        ExpressionElement::FloatingPointLiteral {
            value,
            source: consumed(input, rest).to_string(),
        },
    ))
}

fn decimal_literal(input: &str) -> IResult<&str, ExpressionElement> {
    let (rest, (sign, number, _)) = (
        sign,
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        one_of("mM"),
    )
        .parse(input)?;
    let value = signed_text(sign, number).parse::<Decimal>().ok();
    Ok((
        rest,
        ExpressionElement::DecimalLiteral {
            value,
            source: consumed(input, rest).to_string(),
        },
    ))
}

/// The parser for one [`LanguageOptions`] value.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    options: LanguageOptions,
}

impl Grammar {
    pub fn new(options: LanguageOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LanguageOptions {
        &self.options
    }

    /// Parses a complete expression. Trailing input is an error.
    pub fn parse(&self, input: &str) -> Result<ExpressionElement> {
        match self.expression(input) {
            Ok(("", expr)) => Ok(expr),
            Ok((rem, _)) => Err(ExpressionError::syntax(
                input,
                format!("Parser did not consume all input. Remainder: '{}'", rem),
            )),
            Err(e) => Err(ExpressionError::syntax(input, e.to_string())),
        }
    }

    /// Terms chained by operators, re-balanced by operator priority.
    pub fn expression<'a>(&self, input: &'a str) -> IResult<&'a str, ExpressionElement> {
        let (input, first) = self.term(input)?;
        let (input, rest) = many0(pair(
            ws(|i: &'a str| self.operator(i)),
            |i: &'a str| self.term(i),
        ))
        .parse(input)?;
        let expr = rest
            .into_iter()
            .fold(first, |chain, (op, term)| chain.append_operand(op, term));
        Ok((input, expr))
    }

    pub fn term<'a>(&self, input: &'a str) -> IResult<&'a str, ExpressionElement> {
        let (input, primary) = ws(alt((
            |i: &'a str| self.null_literal(i),
            decimal_literal,
            float_literal,
            integer_literal,
            |i: &'a str| self.boolean_literal(i),
            |i: &'a str| self.string_literal(i),
            |i: &'a str| self.function_call(i),
            |i: &'a str| self.variable(i),
            |i: &'a str| self.group(i),
        )))
        .parse(input)?;
        if !self.options.member_read() {
            return Ok((input, primary));
        }
        let (input, members) = many0(terminated(
            preceded(ws(char('.')), identifier),
            multispace0,
        ))
        .parse(input)?;
        let expr = members
            .into_iter()
            .fold(primary, |target, member| ExpressionElement::MemberRead {
                target: Box::new(target),
                member: member.to_string(),
            });
        Ok((input, expr))
    }

    pub fn operator<'a>(&self, input: &'a str) -> IResult<&'a str, Operator> {
        let options = &self.options;
        let words = options.ignore_operator_case();
        alt((
            value(Operator::LessOrEqual, tag("<=")),
            value(Operator::Unequal, tag("<>")),
            value(Operator::Less, char('<')),
            value(Operator::GreaterOrEqual, tag(">=")),
            value(Operator::Greater, char('>')),
            value(Operator::Equal, char('=')),
            value(Operator::Power, char('^')),
            value(Operator::Multiplication, char('*')),
            value(Operator::Division, char('/')),
            value(Operator::Addition, char('+')),
            value(Operator::Subtraction, char('-')),
            value(Operator::Concatenation, char('&')),
            value(Operator::And, |i: &'a str| {
                keyword(i, options.operator_and_name(), words)
            }),
            value(Operator::Or, |i: &'a str| {
                keyword(i, options.operator_or_name(), words)
            }),
            value(Operator::Xor, |i: &'a str| {
                keyword(i, options.operator_xor_name(), words)
            }),
        ))
        .parse(input)
    }

    fn null_literal<'a>(&self, input: &'a str) -> IResult<&'a str, ExpressionElement> {
        let (rest, word) = keyword(
            input,
            self.options.literal_null_name(),
            self.options.ignore_null_literal_case(),
        )?;
        Ok((
            rest,
            ExpressionElement::NullLiteral {
                source: word.to_string(),
            },
        ))
    }

    fn boolean_literal<'a>(&self, input: &'a str) -> IResult<&'a str, ExpressionElement> {
        let options = &self.options;
        let ignore_case = options.ignore_boolean_literal_case();
        let (rest, value) = alt((
            value(true, |i: &'a str| {
                keyword(i, options.literal_true_name(), ignore_case)
            }),
            value(false, |i: &'a str| {
                keyword(i, options.literal_false_name(), ignore_case)
            }),
        ))
        .parse(input)?;
        Ok((
            rest,
            ExpressionElement::BooleanLiteral {
                value,
                source: consumed(input, rest).to_string(),
            },
        ))
    }

    /// A quoted string. Unknown escapes and a missing closing quote are hard
    /// failures so no other alternative is tried.
    fn string_literal<'a>(&self, input: &'a str) -> IResult<&'a str, ExpressionElement> {
        let quote = self.options.quote_char();
        let (mut rest, _) = char(quote).parse(input)?;
        let mut value = String::new();
        loop {
            let mut chars = rest.chars();
            match chars.next() {
                None => return Err(nom::Err::Failure(Error::new(rest, ErrorKind::Char))),
                Some(c) if c == quote => {
                    rest = chars.as_str();
                    break;
                }
                Some('\\') => {
                    let escaped = match chars.next() {
                        Some(c) if c == quote => c,
                        Some('\\') => '\\',
                        Some('a') => '\u{7}',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('v') => '\u{b}',
                        _ => return Err(nom::Err::Failure(Error::new(rest, ErrorKind::Escaped))),
                    };
                    value.push(escaped);
                    rest = chars.as_str();
                }
                Some(c) => {
                    value.push(c);
                    rest = chars.as_str();
                }
            }
        }
        Ok((
            rest,
            ExpressionElement::StringLiteral {
                value,
                source: consumed(input, rest).to_string(),
            },
        ))
    }

    fn function_call<'a>(&self, input: &'a str) -> IResult<&'a str, ExpressionElement> {
        let (rest, name) = identifier(input)?;
        let (rest, arguments) = delimited(
            ws(char('(')),
            separated_list0(ws(char(',')), |i: &'a str| self.expression(i)),
            ws(char(')')),
        )
        .parse(rest)?;

        let options = &self.options;
        let call = if names_equal(name, options.conditional_name(), options.ignore_conditional_case()) {
            ExpressionElement::Conditional {
                name: name.to_string(),
                arguments,
            }
        } else if names_equal(name, options.null_test_name(), options.ignore_null_test_case()) {
            ExpressionElement::NullTest {
                name: name.to_string(),
                arguments,
            }
        } else if options.is_keyword(name) {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
        } else if options.ignore_function_name_case() {
            ExpressionElement::FunctionCall {
                name: name.to_lowercase(),
                arguments,
            }
        } else {
            ExpressionElement::FunctionCall {
                name: name.to_string(),
                arguments,
            }
        };
        Ok((rest, call))
    }

    fn variable<'a>(&self, input: &'a str) -> IResult<&'a str, ExpressionElement> {
        let (rest, name) = identifier(input)?;
        if self.options.is_keyword(name) {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
        }
        Ok((
            rest,
            ExpressionElement::Variable {
                name: name.to_string(),
            },
        ))
    }

    fn group<'a>(&self, input: &'a str) -> IResult<&'a str, ExpressionElement> {
        let (rest, inner) = delimited(
            ws(char('(')),
            |i: &'a str| self.expression(i),
            ws(char(')')),
        )
        .parse(input)?;
        Ok((rest, ExpressionElement::Group(Box::new(inner))))
    }
}
