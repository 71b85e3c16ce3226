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

//! The string type: immutable text, indexed by code point.

pub mod format;
pub mod interpolation;

use crate::syntax::fmt::fmt_string_literal;
use crate::values::error::ValueError;
use crate::values::{convert_slice_indices, slice_elements, TypedValue, Value, ValueResult};
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::fmt;

/// The string hash: 31-polynomial accumulator over the UTF-16 transcoding
/// of the text. Stable across runs and platforms.
pub(crate) fn hash_string(s: &str) -> u64 {
    s.encode_utf16()
        .fold(0u64, |h, unit| h.wrapping_mul(31).wrapping_add(u64::from(unit)))
}

impl TypedValue for String {
    any!();

    fn get_type(&self) -> &'static str {
        "string"
    }

    fn to_str_impl(&self, buf: &mut String) -> fmt::Result {
        buf.push_str(self);
        Ok(())
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        fmt_string_literal(buf, self)
    }

    fn to_bool(&self) -> bool {
        !self.is_empty()
    }

    fn get_hash(&self) -> Result<u64, ValueError> {
        Ok(hash_string(self))
    }

    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        match other.downcast_ref::<String>() {
            Some(s) => Ok(*self == *s),
            None => Ok(false),
        }
    }

    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match other.downcast_ref::<String>() {
            Some(s) => Ok(self.as_str().cmp(s.as_str())),
            None => Err(ValueError::OperationNotSupported {
                op: "compare".to_owned(),
                left: "string".to_owned(),
                right: Some(other.get_type().to_owned()),
            }),
        }
    }

    fn length(&self) -> Result<i64, ValueError> {
        Ok(self.chars().count() as i64)
    }

    fn at(&self, index: Value) -> ValueResult {
        let i = index.convert_index(self.length()?)?;
        Ok(Value::from(
            self.chars().nth(i as usize).unwrap().to_string(),
        ))
    }

    fn slice(
        &self,
        start: Option<Value>,
        stop: Option<Value>,
        stride: Option<Value>,
    ) -> ValueResult {
        let chars: Vec<char> = self.chars().collect();
        let (start, stop, stride) = convert_slice_indices(chars.len() as i64, start, stop, stride)?;
        let out: String = slice_elements(&chars, start, stop, stride).into_iter().collect();
        Ok(Value::from(out))
    }

    fn is_in(&self, other: &Value) -> Result<bool, ValueError> {
        match other.downcast_ref::<String>() {
            Some(needle) => Ok(self.contains(needle.as_str())),
            None => Err(ValueError::OperationNotSupported {
                op: "in".to_owned(),
                left: other.get_type().to_owned(),
                right: Some("string".to_owned()),
            }),
        }
    }

    fn add(&self, other: Value) -> ValueResult {
        match other.downcast_ref::<String>() {
            Some(s) => {
                let mut result = String::with_capacity(self.len() + s.len());
                result.push_str(self);
                result.push_str(&s);
                Ok(Value::from(result))
            }
            None => Err(self.unsupported_with("+", &other)),
        }
    }

    /// String repetition; a negative count yields the empty string.
    fn mul(&self, other: Value) -> ValueResult {
        match other.downcast_ref::<BigInt>() {
            Some(n) => {
                let n = crate::values::num::repetition_count(&*n)?;
                Ok(Value::from(self.repeat(n)))
            }
            None => Err(self.unsupported_with("*", &other)),
        }
    }

    /// String interpolation, e.g. `"%d-%s" % (1, "a")`.
    fn percent(&self, other: Value) -> ValueResult {
        Ok(Value::from(interpolation::percent(self, other)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_hash_is_stable() {
        // The 31-polynomial over UTF-16 units, like a Java String.hashCode
        // widened to 64 bits.
        assert_eq!(0, hash_string(""));
        assert_eq!(97, hash_string("a"));
        assert_eq!(96354, hash_string("abc"));
        assert_eq!(hash_string("abc"), hash_string("abc"));
    }

    #[test]
    fn indexing_and_slicing() {
        let s = Value::from("banana");
        assert_eq!("\"b\"", s.at(Value::from(0)).unwrap().to_repr());
        assert_eq!("\"a\"", s.at(Value::from(-1)).unwrap().to_repr());
        assert_eq!(
            "\"aaa\"",
            s.slice(Some(Value::from(1)), None, Some(Value::from(2)))
                .unwrap()
                .to_repr()
        );
        assert_eq!(
            "\"nnb\"",
            s.slice(Some(Value::from(4)), None, Some(Value::from(-2)))
                .unwrap()
                .to_repr()
        );
    }

    #[test]
    fn concat_and_repeat() {
        assert_eq!(
            "\"abcd\"",
            Value::from("ab").add(Value::from("cd")).unwrap().to_repr()
        );
        assert_eq!(
            "\"ababab\"",
            Value::from("ab").mul(Value::from(3)).unwrap().to_repr()
        );
        assert_eq!(
            "\"\"",
            Value::from("ab").mul(Value::from(-2)).unwrap().to_repr()
        );
    }

    #[test]
    fn substring_test() {
        assert_eq!(Ok(true), Value::from("abc").is_in(&Value::from("b")));
        assert_eq!(Ok(false), Value::from("abc").is_in(&Value::from("z")));
        assert!(Value::from("abc").is_in(&Value::from(1)).is_err());
    }
}
