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

//! The int type: arbitrary-precision signed integers.

use crate::values::error::ValueError;
use crate::values::num::{self, Num};
use crate::values::{TypedValue, Value, ValueResult};
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write as _;

/// Shifting further than this is considered a programming error rather than
/// a request for a very large number.
const MAX_SHIFT_AMOUNT: i64 = 512;

fn shift_amount(other: &Value) -> Result<usize, ValueError> {
    let n = match other.downcast_ref::<BigInt>() {
        Some(i) => i.to_i64().ok_or(ValueError::IntegerOverflow)?,
        None => return Err(ValueError::IncorrectParameterType),
    };
    if n < 0 {
        return Err(ValueError::NegativeShiftCount);
    }
    if n > MAX_SHIFT_AMOUNT {
        return Err(ValueError::IntegerOverflow);
    }
    Ok(n as usize)
}

impl TypedValue for BigInt {
    any!();

    fn get_type(&self) -> &'static str {
        "int"
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        write!(buf, "{}", self)
    }

    fn to_bool(&self) -> bool {
        !self.is_zero()
    }

    fn to_int(&self) -> Result<i64, ValueError> {
        self.to_i64().ok_or(ValueError::IntegerOverflow)
    }

    fn get_hash(&self) -> Result<u64, ValueError> {
        Ok(num::hash_int(self))
    }

    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        match num::get_num(other) {
            Some(Num::Int(i)) => Ok(*self == i),
            Some(Num::Float(f)) => Ok(num::int_equals_float(self, f)),
            None => Ok(false),
        }
    }

    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match num::get_num(other) {
            Some(n) => num::compare(&Num::Int(self.clone()), &n),
            None => Err(ValueError::OperationNotSupported {
                op: "compare".to_owned(),
                left: "int".to_owned(),
                right: Some(other.get_type().to_owned()),
            }),
        }
    }

    fn plus(&self) -> ValueResult {
        Ok(Value::new(self.clone()))
    }

    fn minus(&self) -> ValueResult {
        Ok(Value::new(-self))
    }

    fn add(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(Num::Int(i)) => Ok(Value::new(self + i)),
            Some(Num::Float(f)) => Ok(Value::new(num::to_f64(&Num::Int(self.clone())) + f)),
            None => Err(self.unsupported_with("+", &other)),
        }
    }

    fn sub(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(Num::Int(i)) => Ok(Value::new(self - i)),
            Some(Num::Float(f)) => Ok(Value::new(num::to_f64(&Num::Int(self.clone())) - f)),
            None => Err(self.unsupported_with("-", &other)),
        }
    }

    fn mul(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(Num::Int(i)) => Ok(Value::new(self * i)),
            Some(Num::Float(f)) => Ok(Value::new(num::to_f64(&Num::Int(self.clone())) * f)),
            None => {
                // Sequence repetition is owned by the sequence types.
                other.mul(Value::new(self.clone()))
            }
        }
    }

    /// Real division always produces a float: `3 / 2 == 1.5`.
    fn div(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(n) => {
                if let Num::Int(i) = &n {
                    if i.is_zero() {
                        return Err(ValueError::DivisionByZero);
                    }
                }
                Ok(Value::new(num::div_float(
                    num::to_f64(&Num::Int(self.clone())),
                    num::to_f64(&n),
                )?))
            }
            None => Err(self.unsupported_with("/", &other)),
        }
    }

    fn floor_div(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(Num::Int(i)) => Ok(Value::new(num::floor_div_int(self, &i)?)),
            Some(Num::Float(f)) => Ok(Value::new(num::floor_div_float(
                num::to_f64(&Num::Int(self.clone())),
                f,
            )?)),
            None => Err(self.unsupported_with("//", &other)),
        }
    }

    fn percent(&self, other: Value) -> ValueResult {
        match num::get_num(&other) {
            Some(Num::Int(i)) => Ok(Value::new(num::mod_int(self, &i)?)),
            Some(Num::Float(f)) => Ok(Value::new(num::mod_float(
                num::to_f64(&Num::Int(self.clone())),
                f,
            )?)),
            None => Err(self.unsupported_with("%", &other)),
        }
    }

    fn pipe(&self, other: Value) -> ValueResult {
        match other.downcast_ref::<BigInt>() {
            Some(i) => Ok(Value::new(self | &*i)),
            None => Err(self.unsupported_with("|", &other)),
        }
    }

    fn bit_and(&self, other: Value) -> ValueResult {
        match other.downcast_ref::<BigInt>() {
            Some(i) => Ok(Value::new(self & &*i)),
            None => Err(self.unsupported_with("&", &other)),
        }
    }

    fn bit_xor(&self, other: Value) -> ValueResult {
        match other.downcast_ref::<BigInt>() {
            Some(i) => Ok(Value::new(self ^ &*i)),
            None => Err(self.unsupported_with("^", &other)),
        }
    }

    fn left_shift(&self, other: Value) -> ValueResult {
        let n = shift_amount(&other)?;
        Ok(Value::new(self << n))
    }

    /// Arithmetic shift: rounds toward negative infinity, like `//`.
    fn right_shift(&self, other: Value) -> ValueResult {
        let n = shift_amount(&other)?;
        Ok(Value::new(self >> n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: i64) -> Value {
        Value::from(x)
    }

    #[test]
    fn arithmetic() {
        assert_eq!("3", v(1).add(v(2)).unwrap().to_repr());
        assert_eq!("-1", v(1).sub(v(2)).unwrap().to_repr());
        assert_eq!("6", v(2).mul(v(3)).unwrap().to_repr());
        assert_eq!("1", v(3).floor_div(v(2)).unwrap().to_repr());
        assert_eq!("1.5", v(3).div(v(2)).unwrap().to_repr());
        assert_eq!("2", v(-7).percent(v(3)).unwrap().to_repr());
        assert_eq!("-3", v(-7).floor_div(v(3)).unwrap().to_repr());
    }

    #[test]
    fn no_magnitude_limit() {
        let big = Value::new(BigInt::parse_bytes(b"99999999999999999999", 10).unwrap());
        assert_eq!(
            "9999999999999999999800000000000000000001",
            big.mul(big.clone()).unwrap().to_repr()
        );
    }

    #[test]
    fn promotion_to_float() {
        assert_eq!("3.5", v(3).add(Value::from(0.5)).unwrap().to_repr());
        assert_eq!("float", v(3).add(Value::from(0.5)).unwrap().get_type());
    }

    #[test]
    fn shifts() {
        assert_eq!("8", v(1).left_shift(v(3)).unwrap().to_repr());
        assert_eq!("-2", v(-7).right_shift(v(2)).unwrap().to_repr());
        assert_eq!(
            Err(ValueError::NegativeShiftCount),
            v(1).left_shift(v(-1)).map(|_| ())
        );
    }

    #[test]
    fn bitwise() {
        assert_eq!("6", v(4).pipe(v(2)).unwrap().to_repr());
        assert_eq!("4", v(6).bit_and(v(12)).unwrap().to_repr());
        assert_eq!("10", v(6).bit_xor(v(12)).unwrap().to_repr());
    }

    #[test]
    fn bool_is_not_a_number() {
        assert!(v(1).add(Value::from(true)).is_err());
    }
}
