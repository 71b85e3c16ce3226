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

//! The float type: IEEE-754 doubles.

use crate::values::error::ValueError;
use crate::values::num::{self, Num};
use crate::values::{TypedValue, Value, ValueResult};
use std::cmp::Ordering;
use std::fmt;

impl TypedValue for f64 {
    any!();

    fn get_type(&self) -> &'static str {
        "float"
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        num::write_float(buf, *self)
    }

    fn to_bool(&self) -> bool {
        *self != 0.0
    }

    fn get_hash(&self) -> Result<u64, ValueError> {
        Ok(num::hash_float(*self))
    }

    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        match num::get_num(other) {
            // IEEE equality: NaN != NaN, -0.0 == 0.0.
            Some(Num::Float(f)) => Ok(*self == f),
            Some(Num::Int(i)) => Ok(num::int_equals_float(&i, *self)),
            None => Ok(false),
        }
    }

    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match num::get_num(other) {
            Some(n) => num::compare(&Num::Float(*self), &n),
            None => Err(ValueError::OperationNotSupported {
                op: "compare".to_owned(),
                left: "float".to_owned(),
                right: Some(other.get_type().to_owned()),
            }),
        }
    }

    fn plus(&self) -> ValueResult {
        Ok(Value::new(*self))
    }

    fn minus(&self) -> ValueResult {
        Ok(Value::new(-*self))
    }

    fn add(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(n) => Ok(Value::new(*self + num::to_f64(&n))),
            None => Err(self.unsupported_with("+", &other)),
        }
    }

    fn sub(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(n) => Ok(Value::new(*self - num::to_f64(&n))),
            None => Err(self.unsupported_with("-", &other)),
        }
    }

    fn mul(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(n) => Ok(Value::new(*self * num::to_f64(&n))),
            None => Err(self.unsupported_with("*", &other)),
        }
    }

    fn div(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(n) => Ok(Value::new(num::div_float(*self, num::to_f64(&n))?)),
            None => Err(self.unsupported_with("/", &other)),
        }
    }

    fn floor_div(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(n) => Ok(Value::new(num::floor_div_float(*self, num::to_f64(&n))?)),
            None => Err(self.unsupported_with("//", &other)),
        }
    }

    fn percent(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(n) => Ok(Value::new(num::mod_float(*self, num::to_f64(&n))?)),
            None => Err(self.unsupported_with("%", &other)),
        }
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_keeps_floats_visible() {
        assert_eq!("3.0", Value::from(3.0).to_repr());
        assert_eq!("1.5", Value::from(1.5).to_repr());
        assert_eq!("nan", Value::from(f64::NAN).to_repr());
        assert_eq!("+inf", Value::from(f64::INFINITY).to_repr());
    }

    #[test]
    fn mixed_arithmetic_promotes() {
        assert_eq!("2.5", Value::from(0.5).add(Value::from(2)).unwrap().to_repr());
        assert_eq!("float", Value::from(1.0).mul(Value::from(2)).unwrap().get_type());
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        let nan = Value::from(f64::NAN);
        assert_eq!(Ok(false), nan.equals(&nan));
        assert!(nan.compare(&Value::from(1.0)).is_err());
    }

    #[test]
    fn cross_type_equality() {
        assert_eq!(Ok(true), Value::from(1.0).equals(&Value::from(1)));
        assert_eq!(Ok(true), Value::from(1).equals(&Value::from(1.0)));
        assert_eq!(Ok(false), Value::from(1.5).equals(&Value::from(1)));
        assert_eq!(
            Value::from(1).get_hash().unwrap(),
            Value::from(1.0).get_hash().unwrap()
        );
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            Err(ValueError::DivisionByZero),
            Value::from(1.0).div(Value::from(0.0)).map(|_| ())
        );
        assert_eq!(
            Err(ValueError::DivisionByZero),
            Value::from(1.0).percent(Value::from(0)).map(|_| ())
        );
    }

    #[test]
    fn float_modulo_takes_divisor_sign() {
        assert_eq!("2.5", Value::from(-0.5).percent(Value::from(3)).unwrap().to_repr());
        assert_eq!("-0.5", Value::from(2.5).percent(Value::from(-3)).unwrap().to_repr());
    }
}
