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

//! The bool type. Booleans are not numbers: they take part in no
//! arithmetic, and compare only with other booleans.

use crate::values::error::ValueError;
use crate::values::{TypedValue, Value};
use std::cmp::Ordering;
use std::fmt;

impl TypedValue for bool {
    any!();

    fn get_type(&self) -> &'static str {
        "bool"
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        buf.push_str(if *self { "True" } else { "False" });
        Ok(())
    }

    fn to_bool(&self) -> bool {
        *self
    }

    fn get_hash(&self) -> Result<u64, ValueError> {
        Ok(u64::from(*self))
    }

    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        match other.downcast_ref::<bool>() {
            Some(b) => Ok(*self == *b),
            None => Ok(false),
        }
    }

    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match other.downcast_ref::<bool>() {
            Some(b) => Ok((*self).cmp(&*b)),
            None => Err(ValueError::OperationNotSupported {
                op: "compare".to_owned(),
                left: "bool".to_owned(),
                right: Some(other.get_type().to_owned()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr() {
        assert_eq!("True", Value::from(true).to_repr());
        assert_eq!("False", Value::from(false).to_repr());
    }

    #[test]
    fn bools_are_not_ints() {
        assert_eq!(Ok(false), Value::from(true).equals(&Value::from(1)));
        assert!(Value::from(true).add(Value::from(1)).is_err());
    }

    #[test]
    fn ordering() {
        assert_eq!(
            Ok(Ordering::Less),
            Value::from(false).compare(&Value::from(true))
        );
    }
}
