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

//! The None singleton.

use crate::values::error::ValueError;
use crate::values::{TypedValue, Value};
use std::cmp::Ordering;
use std::fmt;

/// The type of the `None` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoneType {
    None,
}

impl TypedValue for NoneType {
    any!();

    fn get_type(&self) -> &'static str {
        "NoneType"
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        buf.push_str("None");
        Ok(())
    }

    fn to_bool(&self) -> bool {
        false
    }

    // A fixed arbitrary constant, mirroring hash(None) of a CPython 2
    // interpreter.
    fn get_hash(&self) -> Result<u64, ValueError> {
        Ok(9_223_380_832_852_120_682)
    }

    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        Ok(other.downcast_ref::<NoneType>().is_some())
    }

    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match other.downcast_ref::<NoneType>() {
            Some(..) => Ok(Ordering::Equal),
            None => Err(ValueError::OperationNotSupported {
                op: "compare".to_owned(),
                left: "NoneType".to_owned(),
                right: Some(other.get_type().to_owned()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_falsy_and_single() {
        let none = Value::new(NoneType::None);
        assert!(!none.to_bool());
        assert_eq!("None", none.to_repr());
        assert_eq!(Ok(true), none.equals(&Value::new(NoneType::None)));
        assert_eq!(Ok(false), none.equals(&Value::from(0)));
    }
}
