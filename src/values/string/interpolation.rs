// Copyright 2019 The Skylark in Rust Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Implementation of the `%` string interpolation operator.

use crate::errors::ErrorKind;
use crate::syntax::errors::SyntaxError;
use crate::values::error::ValueError;
use crate::values::num::{self, Num};
use crate::values::tuple::Tuple;
use crate::values::Value;
use codemap::Span;
use codemap_diagnostic::{Diagnostic, Level, SpanLabel, SpanStyle};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use std::fmt::Write as _;

// Error codes -- CI = Critical Interpolation
pub const UNEXPECTED_EOF_CLOSING_PAREN_ERROR_CODE: &str = "CI00";
pub const UNEXPECTED_EOF_PERCENT_ERROR_CODE: &str = "CI01";
pub const UNKNOWN_SPECIFIER_ERROR_CODE: &str = "CI02";
pub const OUT_OF_CODEPOINT_RANGE_ERROR_CODE: &str = "CI03";
pub const TOO_MANY_PARAMETERS_ERROR_CODE: &str = "CI04";
pub const NOT_ENOUGH_PARAMETERS_ERROR_CODE: &str = "CI05";
pub const VALUE_IS_NOT_CHAR_ERROR_CODE: &str = "CI06";
pub const NUMBER_REQUIRED_ERROR_CODE: &str = "CI07";
pub const MAPPING_REQUIRED_ERROR_CODE: &str = "CI08";

/// Operator `%` format or evaluation errors.
#[derive(Clone, Debug)]
pub enum StringInterpolationError {
    /// `)` is not found when parsing a `%(name)` expression.
    UnexpectedEOFClosingParen,
    /// `%` must be followed by a specifier.
    UnexpectedEOFPercent,
    /// `%z` where `z` is an unknown specifier.
    UnknownSpecifier(char),
    /// `%c` with an integer that is not a valid code point.
    ValueNotInCodePointRange(u32),
    /// More operands than conversions in the format string.
    TooManyParameters,
    /// Fewer operands than conversions in the format string.
    NotEnoughParameters,
    /// `%c` with a string that is not a single code point.
    ValueNotChar,
    /// A numeric conversion applied to a non-number (booleans included).
    NumberRequired(char, String),
    /// `%(name)` used with a non-mapping operand.
    MappingRequired,
}

impl StringInterpolationError {
    pub(crate) fn kind(&self) -> ErrorKind {
        match self {
            StringInterpolationError::NumberRequired(..)
            | StringInterpolationError::MappingRequired => ErrorKind::Type,
            _ => ErrorKind::Value,
        }
    }
}

impl SyntaxError for StringInterpolationError {
    fn to_diagnostic(self, file_span: Span) -> Diagnostic {
        let (label, message, code) = match self {
            StringInterpolationError::UnexpectedEOFClosingParen => (
                "Unexpected end of format string".to_owned(),
                "Could not find ')' when parsing a '%(name)' expression".to_owned(),
                UNEXPECTED_EOF_CLOSING_PAREN_ERROR_CODE,
            ),
            StringInterpolationError::UnexpectedEOFPercent => (
                "End of string while expecting a format specifier".to_owned(),
                "'%' must be followed by an optional name and a specifier".to_owned(),
                UNEXPECTED_EOF_PERCENT_ERROR_CODE,
            ),
            StringInterpolationError::UnknownSpecifier(c) => (
                format!("Unknown format specifier '{}'", c.escape_default()),
                "'%' must be followed by a specifier in 'srdioxXeEfFgGc' or '%'".to_owned(),
                UNKNOWN_SPECIFIER_ERROR_CODE,
            ),
            StringInterpolationError::ValueNotInCodePointRange(c) => (
                format!("Invalid codepoint 0x{:x}", c),
                format!("Value 0x{:x} for the %c specifier is not a valid code point", c),
                OUT_OF_CODEPOINT_RANGE_ERROR_CODE,
            ),
            StringInterpolationError::TooManyParameters => (
                "Too many arguments for format string".to_owned(),
                "Too many arguments for format string".to_owned(),
                TOO_MANY_PARAMETERS_ERROR_CODE,
            ),
            StringInterpolationError::NotEnoughParameters => (
                "Not enough arguments for format string".to_owned(),
                "Not enough arguments for format string".to_owned(),
                NOT_ENOUGH_PARAMETERS_ERROR_CODE,
            ),
            StringInterpolationError::ValueNotChar => (
                "'%c' requires a single-character string".to_owned(),
                "'%c' requires a single-character string".to_owned(),
                VALUE_IS_NOT_CHAR_ERROR_CODE,
            ),
            StringInterpolationError::NumberRequired(verb, t) => (
                format!("'%{}' requires a number", verb),
                format!("'%{}' requires a number, got a value of type {}", verb, t),
                NUMBER_REQUIRED_ERROR_CODE,
            ),
            StringInterpolationError::MappingRequired => (
                "'%(name)' requires a mapping operand".to_owned(),
                "A format string with '%(name)' conversions requires a dict operand".to_owned(),
                MAPPING_REQUIRED_ERROR_CODE,
            ),
        };
        Diagnostic {
            level: Level::Error,
            message,
            code: Some(code.to_owned()),
            spans: vec![SpanLabel {
                span: file_span,
                style: SpanStyle::Primary,
                label: Some(label),
            }],
        }
    }
}

fn as_number(verb: char, v: &Value) -> Result<Num, StringInterpolationError> {
    // Booleans are not accepted where a number is required.
    num::get_num(v).ok_or_else(|| {
        StringInterpolationError::NumberRequired(verb, v.get_type().to_owned())
    })
}

fn as_int(verb: char, v: &Value) -> Result<BigInt, StringInterpolationError> {
    match as_number(verb, v)? {
        Num::Int(i) => Ok(i),
        Num::Float(f) => BigInt::from_f64(f.trunc())
            .ok_or_else(|| StringInterpolationError::NumberRequired(verb, "float".to_owned())),
    }
}

fn write_scientific(buf: &mut String, f: f64, upper: bool) {
    if !f.is_finite() {
        write_special(buf, f);
        return;
    }
    let s = format!("{:.6e}", f);
    let cut = s.find('e').unwrap();
    let exp: i32 = s[cut + 1..].parse().unwrap();
    let _ = write!(
        buf,
        "{}{}{}{:02}",
        &s[..cut],
        if upper { 'E' } else { 'e' },
        if exp < 0 { '-' } else { '+' },
        exp.abs()
    );
}

fn write_special(buf: &mut String, f: f64) {
    if f.is_nan() {
        buf.push_str("nan");
    } else if f > 0.0 {
        buf.push_str("inf");
    } else {
        buf.push_str("-inf");
    }
}

fn write_float_verb(buf: &mut String, verb: char, f: f64) {
    match verb {
        'f' | 'F' => {
            if f.is_finite() {
                let _ = write!(buf, "{:.6}", f);
            } else {
                write_special(buf, f);
            }
        }
        'e' => write_scientific(buf, f, false),
        'E' => write_scientific(buf, f, true),
        // Shortest representation within round-trippable bounds.
        _ => {
            if f.is_finite() {
                let _ = write!(buf, "{}", f);
            } else {
                write_special(buf, f);
            }
        }
    }
}

fn format_one(buf: &mut String, verb: char, v: &Value) -> Result<(), ValueError> {
    match verb {
        's' => {
            v.to_str_impl(buf).unwrap();
        }
        'r' => {
            v.to_repr_impl(buf).unwrap();
        }
        'd' | 'i' => {
            let i = as_int(verb, v)?;
            let _ = write!(buf, "{}", i);
        }
        'o' => {
            let i = as_int(verb, v)?;
            let _ = write!(buf, "{:o}", i);
        }
        'x' => {
            let i = as_int(verb, v)?;
            let _ = write!(buf, "{:x}", i);
        }
        'X' => {
            let i = as_int(verb, v)?;
            let _ = write!(buf, "{:X}", i);
        }
        'e' | 'E' | 'f' | 'F' | 'g' | 'G' => {
            let f = num::to_f64(&as_number(verb, v)?);
            write_float_verb(buf, verb, f);
        }
        'c' => {
            if let Some(s) = v.downcast_ref::<String>() {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => buf.push(c),
                    _ => return Err(StringInterpolationError::ValueNotChar.into()),
                }
            } else {
                let i = as_int(verb, v)?;
                let cp = i.to_u32().ok_or_else(|| {
                    ValueError::from(StringInterpolationError::ValueNotInCodePointRange(
                        u32::max_value(),
                    ))
                })?;
                match std::char::from_u32(cp) {
                    Some(c) => buf.push(c),
                    None => {
                        return Err(StringInterpolationError::ValueNotInCodePointRange(cp).into())
                    }
                }
            }
        }
        c => return Err(StringInterpolationError::UnknownSpecifier(c).into()),
    }
    Ok(())
}

/// Evaluate `format % arg`.
pub(crate) fn percent(format: &str, arg: Value) -> Result<String, ValueError> {
    // The operand list: a tuple supplies one operand per conversion, any
    // other value is a single operand.
    let operands: Vec<Value> = match arg.downcast_ref::<Tuple>() {
        Some(t) => t.values().to_vec(),
        None => vec![arg.clone()],
    };
    let mut operands = operands.into_iter();
    let mut mapping_used = false;

    let mut buf = String::new();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            buf.push(c);
            continue;
        }
        let mut verb = chars
            .next()
            .ok_or(StringInterpolationError::UnexpectedEOFPercent)?;
        if verb == '%' {
            buf.push('%');
            continue;
        }
        let value = if verb == '(' {
            // Mapping form: %(name)verb.
            let mut key = String::new();
            loop {
                match chars.next() {
                    None => {
                        return Err(StringInterpolationError::UnexpectedEOFClosingParen.into())
                    }
                    Some(')') => break,
                    Some(c) => key.push(c),
                }
            }
            verb = chars
                .next()
                .ok_or(StringInterpolationError::UnexpectedEOFPercent)?;
            mapping_used = true;
            if arg.get_type() != "dict" {
                return Err(StringInterpolationError::MappingRequired.into());
            }
            arg.at(Value::from(key))?
        } else {
            operands
                .next()
                .ok_or(StringInterpolationError::NotEnoughParameters)?
        };
        format_one(&mut buf, verb, &value)?;
    }
    if !mapping_used && operands.next().is_some() {
        return Err(StringInterpolationError::TooManyParameters.into());
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;

    fn fmt(format: &str, arg: Value) -> String {
        percent(format, arg).unwrap()
    }

    #[test]
    fn basic_verbs() {
        assert_eq!("a 3 c", fmt("a %s c", Value::from(3)));
        assert_eq!("a \"b\" c", fmt("a %r c", Value::from("b")));
        let quad = crate::values::tuple::Tuple::new(vec![
            Value::from(65),
            Value::from(65),
            Value::from(65),
            Value::from(65),
        ]);
        assert_eq!("65 101 41 A", fmt("%d %o %x %c", Value::new(quad)));
        assert_eq!(
            "100%",
            fmt("100%%", Value::new(crate::values::tuple::Tuple::new(vec![])))
        );
    }

    #[test]
    fn float_verbs() {
        assert_eq!("1.500000", fmt("%f", Value::from(1.5)));
        assert_eq!("1.500000e+00", fmt("%e", Value::from(1.5)));
        assert_eq!("1.500000E+00", fmt("%E", Value::from(1.5)));
        assert_eq!("1.5", fmt("%g", Value::from(1.5)));
        assert_eq!("3", fmt("%g", Value::from(3.0)));
        assert_eq!("2.000000", fmt("%f", Value::from(2)));
    }

    #[test]
    fn char_verb() {
        assert_eq!("*", fmt("%c", Value::from(42)));
        assert_eq!("x", fmt("%c", Value::from("x")));
        assert!(percent("%c", Value::from("xy")).is_err());
        assert!(percent("%c", Value::from(0x110000)).is_err());
    }

    #[test]
    fn mapping_form() {
        let d = crate::values::dict::Dictionary::new();
        d.set_at(Value::from("a"), Value::from(1)).unwrap();
        assert_eq!("a=1", fmt("a=%(a)d", d));
    }

    #[test]
    fn arity_mismatches() {
        assert!(matches!(
            percent("%d %d", Value::from(1)),
            Err(ValueError::StringInterpolation(
                StringInterpolationError::NotEnoughParameters
            ))
        ));
        assert!(matches!(
            percent("%d", Value::from((1, 2))),
            Err(ValueError::StringInterpolation(
                StringInterpolationError::TooManyParameters
            ))
        ));
    }

    #[test]
    fn booleans_are_not_numbers() {
        assert!(percent("%d", Value::from(true)).is_err());
        assert_eq!("True", fmt("%s", Value::from(true)));
    }
}
