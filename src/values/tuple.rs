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

//! The tuple type: an ordered immutable sequence.

use crate::values::error::ValueError;
use crate::values::num::repetition_count;
use crate::values::{
    convert_slice_indices, slice_elements, ReprGuard, TypedValue, Value, ValueResult,
};
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Default)]
pub struct Tuple {
    content: Vec<Value>,
}

impl Tuple {
    pub fn new(content: Vec<Value>) -> Tuple {
        Tuple { content }
    }

    pub fn values(&self) -> &[Value] {
        &self.content
    }
}

/// Lexicographic three-way comparison of two element sequences.
pub(crate) fn compare_elements(a: &[Value], b: &[Value]) -> Result<Ordering, ValueError> {
    let mut it1 = a.iter();
    let mut it2 = b.iter();
    loop {
        match (it1.next(), it2.next()) {
            (None, None) => return Ok(Ordering::Equal),
            (None, Some(..)) => return Ok(Ordering::Less),
            (Some(..), None) => return Ok(Ordering::Greater),
            (Some(v1), Some(v2)) => {
                let r = v1.compare(v2)?;
                if r != Ordering::Equal {
                    return Ok(r);
                }
            }
        }
    }
}

/// Elementwise equality of two element sequences.
pub(crate) fn equal_elements(a: &[Value], b: &[Value]) -> Result<bool, ValueError> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (v1, v2) in a.iter().zip(b.iter()) {
        if !v1.equals(v2)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Linear membership test.
pub(crate) fn contains_element(content: &[Value], other: &Value) -> Result<bool, ValueError> {
    for x in content {
        if x.equals(other)? {
            return Ok(true);
        }
    }
    Ok(false)
}

impl TypedValue for Tuple {
    any!();

    fn get_type(&self) -> &'static str {
        "tuple"
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        let guard = match ReprGuard::enter(self) {
            Some(g) => g,
            None => {
                buf.push_str("(...)");
                return Ok(());
            }
        };
        buf.push('(');
        for (i, v) in self.content.iter().enumerate() {
            if i != 0 {
                buf.push_str(", ");
            }
            v.to_repr_impl(buf)?;
        }
        if self.content.len() == 1 {
            buf.push(',');
        }
        buf.push(')');
        drop(guard);
        Ok(())
    }

    fn to_bool(&self) -> bool {
        !self.content.is_empty()
    }

    /// A tuple is hashable iff all its elements are.
    fn get_hash(&self) -> Result<u64, ValueError> {
        let mut h = 7u64;
        for v in &self.content {
            h = h.wrapping_mul(31).wrapping_add(v.get_hash()?);
        }
        Ok(h)
    }

    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        match other.downcast_ref::<Tuple>() {
            Some(t) => equal_elements(&self.content, &t.content),
            None => Ok(false),
        }
    }

    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match other.downcast_ref::<Tuple>() {
            Some(t) => compare_elements(&self.content, &t.content),
            None => Err(ValueError::OperationNotSupported {
                op: "compare".to_owned(),
                left: "tuple".to_owned(),
                right: Some(other.get_type().to_owned()),
            }),
        }
    }

    fn length(&self) -> Result<i64, ValueError> {
        Ok(self.content.len() as i64)
    }

    fn at(&self, index: Value) -> ValueResult {
        let i = index.convert_index(self.content.len() as i64)?;
        Ok(self.content[i as usize].clone())
    }

    fn slice(
        &self,
        start: Option<Value>,
        stop: Option<Value>,
        stride: Option<Value>,
    ) -> ValueResult {
        let (start, stop, stride) =
            convert_slice_indices(self.content.len() as i64, start, stop, stride)?;
        Ok(Value::new(Tuple::new(slice_elements(
            &self.content,
            start,
            stop,
            stride,
        ))))
    }

    fn iter_items(&self) -> Result<Vec<Value>, ValueError> {
        Ok(self.content.clone())
    }

    fn is_in(&self, other: &Value) -> Result<bool, ValueError> {
        contains_element(&self.content, other)
    }

    fn add(&self, other: Value) -> ValueResult {
        match other.downcast_ref::<Tuple>() {
            Some(t) => {
                let mut result = Vec::with_capacity(self.content.len() + t.content.len());
                result.extend(self.content.iter().cloned());
                result.extend(t.content.iter().cloned());
                Ok(Value::new(Tuple::new(result)))
            }
            None => Err(self.unsupported_with("+", &other)),
        }
    }

    fn mul(&self, other: Value) -> ValueResult {
        match other.downcast_ref::<BigInt>() {
            Some(n) => {
                let n = repetition_count(&*n)?;
                let mut result = Vec::with_capacity(self.content.len() * n);
                for _ in 0..n {
                    result.extend(self.content.iter().cloned());
                }
                Ok(Value::new(Tuple::new(result)))
            }
            None => Err(self.unsupported_with("*", &other)),
        }
    }

    fn has_value_links(&self) -> bool {
        true
    }

    fn visit_links(&self, visitor: &mut dyn FnMut(&Value)) {
        for v in &self.content {
            visitor(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(v: Vec<Value>) -> Value {
        Value::new(Tuple::new(v))
    }

    #[test]
    fn repr_forms() {
        assert_eq!("()", t(vec![]).to_repr());
        assert_eq!("(1,)", t(vec![Value::from(1)]).to_repr());
        assert_eq!(
            "(1, \"a\")",
            t(vec![Value::from(1), Value::from("a")]).to_repr()
        );
    }

    #[test]
    fn hash_requires_hashable_elements() {
        assert!(t(vec![Value::from(1)]).get_hash().is_ok());
        assert!(t(vec![Value::from(vec![1])]).get_hash().is_err());
    }

    #[test]
    fn lexicographic_comparison() {
        assert_eq!(
            Ok(Ordering::Less),
            t(vec![Value::from(1), Value::from(2)])
                .compare(&t(vec![Value::from(1), Value::from(3)]))
        );
        assert_eq!(
            Ok(Ordering::Less),
            t(vec![Value::from(1)]).compare(&t(vec![Value::from(1), Value::from(0)]))
        );
    }

    #[test]
    fn concat_and_repeat() {
        let a = t(vec![Value::from(1)]);
        let b = t(vec![Value::from(2)]);
        assert_eq!("(1, 2)", a.add(b).unwrap().to_repr());
        assert_eq!("(1, 1, 1)", a.mul(Value::from(3)).unwrap().to_repr());
        assert_eq!("()", a.mul(Value::from(-1)).unwrap().to_repr());
    }
}
