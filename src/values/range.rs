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

//! The range type: a lazy view over a segment of the integers.

use crate::values::error::ValueError;
use crate::values::{convert_slice_indices, TypedValue, Value, ValueResult};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write as _;
use std::num::NonZeroI64;

/// The value produced by `range()`: `(start, stop, step)` without the
/// elements being materialized.
#[derive(Clone, Debug)]
pub struct Range {
    start: i64,
    stop: i64,
    step: NonZeroI64,
}

impl Range {
    pub fn new(start: i64, stop: i64, step: NonZeroI64) -> Range {
        Range { start, stop, step }
    }

    fn is_empty(&self) -> bool {
        if self.step.get() > 0 {
            self.start >= self.stop
        } else {
            self.start <= self.stop
        }
    }

    fn len(&self) -> Result<i64, ValueError> {
        if self.is_empty() {
            return Ok(0);
        }
        let (dist, step) = if self.step.get() > 0 {
            (
                self.stop.wrapping_sub(self.start) as u64,
                self.step.get() as u64,
            )
        } else {
            (
                self.start.wrapping_sub(self.stop) as u64,
                self.step.get().wrapping_neg() as u64,
            )
        };
        let n = (dist - 1) / step + 1;
        n.to_i64().ok_or(ValueError::IntegerOverflow)
    }
}

impl TypedValue for Range {
    any!();

    fn get_type(&self) -> &'static str {
        "range"
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        if self.step.get() != 1 {
            write!(buf, "range({}, {}, {})", self.start, self.stop, self.step)
        } else if self.start != 0 {
            write!(buf, "range({}, {})", self.start, self.stop)
        } else {
            write!(buf, "range({})", self.stop)
        }
    }

    fn to_bool(&self) -> bool {
        !self.is_empty()
    }

    /// Two ranges are equal when they denote the same sequence, regardless
    /// of how they were spelled.
    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        let other = match other.downcast_ref::<Range>() {
            Some(r) => r,
            None => return Ok(false),
        };
        let n1 = self.len()?;
        let n2 = other.len()?;
        if n1 != n2 {
            return Ok(false);
        }
        if n1 == 0 {
            return Ok(true);
        }
        if self.start != other.start {
            return Ok(false);
        }
        Ok(n1 == 1 || self.step == other.step)
    }

    fn length(&self) -> Result<i64, ValueError> {
        self.len()
    }

    fn at(&self, index: Value) -> ValueResult {
        let i = index.convert_index(self.len()?)?;
        let v = self
            .start
            .checked_add(
                self.step
                    .get()
                    .checked_mul(i)
                    .ok_or(ValueError::IntegerOverflow)?,
            )
            .ok_or(ValueError::IntegerOverflow)?;
        Ok(Value::from(v))
    }

    fn slice(
        &self,
        start: Option<Value>,
        stop: Option<Value>,
        stride: Option<Value>,
    ) -> ValueResult {
        let (start, stop, stride) = convert_slice_indices(self.len()?, start, stop, stride)?;
        let mul = |a: i64, b: i64| a.checked_mul(b).ok_or(ValueError::IntegerOverflow);
        let add = |a: i64, b: i64| a.checked_add(b).ok_or(ValueError::IntegerOverflow);
        let new_start = add(self.start, mul(start, self.step.get())?)?;
        let new_stop = add(self.start, mul(stop, self.step.get())?)?;
        let new_step = mul(stride, self.step.get())?;
        Ok(Value::new(Range::new(
            new_start,
            new_stop,
            NonZeroI64::new(new_step).unwrap(),
        )))
    }

    fn iter_items(&self) -> Result<Vec<Value>, ValueError> {
        let n = self.len()?;
        let mut result = Vec::with_capacity(n as usize);
        let mut x = self.start;
        for _ in 0..n {
            result.push(Value::from(x));
            x = x.wrapping_add(self.step.get());
        }
        Ok(result)
    }

    fn is_in(&self, other: &Value) -> Result<bool, ValueError> {
        let other = match other.downcast_ref::<BigInt>() {
            Some(i) => match i.to_i64() {
                Some(x) => x,
                None => return Ok(false),
            },
            None => return Ok(false),
        };
        if self.is_empty() {
            return Ok(false);
        }
        if self.step.get() > 0 {
            if other < self.start || other >= self.stop {
                return Ok(false);
            }
            Ok((other.wrapping_sub(self.start) as u64) % (self.step.get() as u64) == 0)
        } else {
            if other > self.start || other <= self.stop {
                return Ok(false);
            }
            Ok((self.start.wrapping_sub(other) as u64)
                % (self.step.get().wrapping_neg() as u64)
                == 0)
        }
    }

    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        Err(ValueError::OperationNotSupported {
            op: "compare".to_owned(),
            left: "range".to_owned(),
            right: Some(other.get_type().to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: i64, stop: i64, step: i64) -> Value {
        Value::new(Range::new(start, stop, NonZeroI64::new(step).unwrap()))
    }

    #[test]
    fn lengths() {
        assert_eq!(Ok(0), range(0, 0, 1).length());
        assert_eq!(Ok(17), range(0, 17, 1).length());
        assert_eq!(Ok(5), range(0, 10, 2).length());
        assert_eq!(Ok(5), range(0, 9, 2).length());
        assert_eq!(Ok(0), range(0, 10, -2).length());
        assert_eq!(Ok(5), range(10, 0, -2).length());
        assert_eq!(Ok(1), range(4, 14, 10).length());
    }

    #[test]
    fn equality_is_by_denoted_sequence() {
        assert_eq!(Ok(true), range(0, 0, 1).equals(&range(2, 1, 3)));
        assert_eq!(Ok(true), range(0, 5, 10).equals(&range(0, 3, 7)));
        assert_eq!(Ok(false), range(0, 5, 1).equals(&range(0, 6, 1)));
    }

    #[test]
    fn membership() {
        assert_eq!(Ok(true), range(0, 10, 2).is_in(&Value::from(4)));
        assert_eq!(Ok(false), range(0, 10, 2).is_in(&Value::from(5)));
        assert_eq!(Ok(true), range(10, 0, -2).is_in(&Value::from(10)));
        assert_eq!(Ok(false), range(0, 10, 2).is_in(&Value::from("a")));
    }

    #[test]
    fn lazy_indexing() {
        assert_eq!("6", range(0, 10, 2).at(Value::from(3)).unwrap().to_repr());
        assert_eq!("8", range(0, 10, 2).at(Value::from(-1)).unwrap().to_repr());
    }

    #[test]
    fn repr_shapes() {
        assert_eq!("range(4)", range(0, 4, 1).to_repr());
        assert_eq!("range(1, 4)", range(1, 4, 1).to_repr());
        assert_eq!("range(1, 4, 2)", range(1, 4, 2).to_repr());
    }

    #[test]
    fn iteration() {
        let items: Vec<String> = range(0, 5, 1)
            .iter()
            .unwrap()
            .map(|v| v.to_repr())
            .collect();
        assert_eq!(vec!["0", "1", "2", "3", "4"], items);
    }
}
