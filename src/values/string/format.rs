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

//! The `str.format` replacement-field mini-language.

use crate::values::error::{RuntimeError, ValueError};
use crate::values::Value;
use linked_hash_map::LinkedHashMap;

// Error codes -- CT = Critical formaT
const BAD_FIELD_ERROR_CODE: &str = "CT00";
const MIXED_NUMBERING_ERROR_CODE: &str = "CT01";
const MISSING_ARGUMENT_ERROR_CODE: &str = "CT02";
const CONVERSION_ERROR_CODE: &str = "CT03";
const SPEC_NOT_SUPPORTED_ERROR_CODE: &str = "CT04";

fn format_error(code: &'static str, message: String) -> ValueError {
    ValueError::Runtime(RuntimeError {
        code,
        label: message.clone(),
        message,
    })
}

enum FieldIndex {
    Auto,
    Position(usize),
    Keyword(String),
}

fn parse_field(field: &str) -> Result<FieldIndex, ValueError> {
    if field.is_empty() {
        return Ok(FieldIndex::Auto);
    }
    if field.chars().all(|c| c.is_ascii_digit()) {
        return Ok(FieldIndex::Position(field.parse().map_err(|_| {
            format_error(
                BAD_FIELD_ERROR_CODE,
                format!("Replacement field index '{}' is too large", field),
            )
        })?));
    }
    if field
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Ok(FieldIndex::Keyword(field.to_owned()));
    }
    Err(format_error(
        BAD_FIELD_ERROR_CODE,
        format!("Invalid replacement field '{}'", field),
    ))
}

/// Evaluate `this.format(*args, **kwargs)`.
///
/// Replacement fields are `{[field][!conv][:spec]}` where field is an index
/// or a keyword, `conv` is `s` or `r`, and `spec` must currently be empty.
/// Indices are either all implicit or all explicit.
pub(crate) fn format(
    this: &str,
    args: Vec<Value>,
    kwargs: LinkedHashMap<String, Value>,
) -> Result<String, ValueError> {
    let mut result = String::new();
    let mut chars = this.chars().peekable();
    let mut next_auto = 0usize;
    // false = implicit numbering seen, true = explicit seen.
    let mut explicit: Option<bool> = None;
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    result.push('{');
                    continue;
                }
                let mut field = String::new();
                loop {
                    match chars.next() {
                        None => {
                            return Err(format_error(
                                BAD_FIELD_ERROR_CODE,
                                "Unmatched '{' in format string".to_owned(),
                            ))
                        }
                        Some('}') => break,
                        Some(c) => field.push(c),
                    }
                }
                let (field, spec) = match field.find(':') {
                    Some(i) => (field[..i].to_owned(), Some(field[i + 1..].to_owned())),
                    None => (field, None),
                };
                if let Some(spec) = spec {
                    if !spec.is_empty() {
                        return Err(format_error(
                            SPEC_NOT_SUPPORTED_ERROR_CODE,
                            format!("Format spec '{}' is not supported", spec),
                        ));
                    }
                }
                let (field, conv) = match field.find('!') {
                    Some(i) => (field[..i].to_owned(), field[i + 1..].to_owned()),
                    None => (field, "s".to_owned()),
                };
                let value = match parse_field(&field)? {
                    FieldIndex::Auto => {
                        if explicit == Some(true) {
                            return Err(format_error(
                                MIXED_NUMBERING_ERROR_CODE,
                                "Cannot mix implicit and explicit field numbering".to_owned(),
                            ));
                        }
                        explicit = Some(false);
                        let v = args.get(next_auto).cloned().ok_or_else(|| {
                            format_error(
                                MISSING_ARGUMENT_ERROR_CODE,
                                format!("Not enough arguments for field {}", next_auto),
                            )
                        })?;
                        next_auto += 1;
                        v
                    }
                    FieldIndex::Position(i) => {
                        if explicit == Some(false) {
                            return Err(format_error(
                                MIXED_NUMBERING_ERROR_CODE,
                                "Cannot mix implicit and explicit field numbering".to_owned(),
                            ));
                        }
                        explicit = Some(true);
                        args.get(i).cloned().ok_or_else(|| {
                            format_error(
                                MISSING_ARGUMENT_ERROR_CODE,
                                format!("Argument {} was not provided", i),
                            )
                        })?
                    }
                    FieldIndex::Keyword(name) => kwargs.get(&name).cloned().ok_or_else(|| {
                        format_error(
                            MISSING_ARGUMENT_ERROR_CODE,
                            format!("Keyword argument '{}' was not provided", name),
                        )
                    })?,
                };
                match conv.as_str() {
                    "s" => value.to_str_impl(&mut result).unwrap(),
                    "r" => value.to_repr_impl(&mut result).unwrap(),
                    c => {
                        return Err(format_error(
                            CONVERSION_ERROR_CODE,
                            format!("Unknown conversion '!{}'", c),
                        ))
                    }
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    result.push('}');
                    continue;
                }
                return Err(format_error(
                    BAD_FIELD_ERROR_CODE,
                    "Unmatched '}' in format string".to_owned(),
                ));
            }
            c => result.push(c),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: Vec<Value>) -> Vec<Value> {
        v
    }

    #[test]
    fn implicit_and_explicit() {
        assert_eq!(
            "a 1 b 2",
            format(
                "a {} b {}",
                args(vec![Value::from(1), Value::from(2)]),
                LinkedHashMap::new()
            )
            .unwrap()
        );
        assert_eq!(
            "2 1",
            format(
                "{1} {0}",
                args(vec![Value::from(1), Value::from(2)]),
                LinkedHashMap::new()
            )
            .unwrap()
        );
        assert!(format(
            "{} {1}",
            args(vec![Value::from(1), Value::from(2)]),
            LinkedHashMap::new()
        )
        .is_err());
    }

    #[test]
    fn keywords_and_conversions() {
        let mut kwargs = LinkedHashMap::new();
        kwargs.insert("name".to_owned(), Value::from("x"));
        assert_eq!(
            "x \"x\"",
            format("{name} {name!r}", Vec::new(), kwargs).unwrap()
        );
    }

    #[test]
    fn braces_escape() {
        assert_eq!(
            "{1}",
            format("{{{}}}", args(vec![Value::from(1)]), LinkedHashMap::new()).unwrap()
        );
    }

    #[test]
    fn spec_is_rejected() {
        assert!(format(
            "{:>5}",
            args(vec![Value::from(1)]),
            LinkedHashMap::new()
        )
        .is_err());
    }
}
