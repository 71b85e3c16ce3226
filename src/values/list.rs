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

//! The list type: an ordered mutable sequence.

use crate::values::error::ValueError;
use crate::values::mutability::Mutability;
use crate::values::num::repetition_count;
use crate::values::tuple::{compare_elements, contains_element, equal_elements};
use crate::values::{
    convert_slice_indices, slice_elements, ReprGuard, TypedValue, Value, ValueResult,
};
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::fmt;

#[derive(Default)]
pub struct List {
    mutability: Mutability,
    content: Vec<Value>,
}

impl List {
    /// A fresh empty list value.
    pub fn new() -> Value {
        Value::new(List::default())
    }

    pub fn from_values(content: Vec<Value>) -> List {
        List {
            mutability: Mutability::new(),
            content,
        }
    }

    pub fn content(&self) -> &[Value] {
        &self.content
    }

    /// Mutable access for the mutating methods; performs the frozen and
    /// iteration checks.
    pub fn content_mut(&mut self) -> Result<&mut Vec<Value>, ValueError> {
        self.mutability.test()?;
        Ok(&mut self.content)
    }
}

impl TypedValue for List {
    any!();

    fn get_type(&self) -> &'static str {
        "list"
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        let guard = match ReprGuard::enter(self) {
            Some(g) => g,
            None => {
                buf.push_str("[...]");
                return Ok(());
            }
        };
        buf.push('[');
        for (i, v) in self.content.iter().enumerate() {
            if i != 0 {
                buf.push_str(", ");
            }
            v.to_repr_impl(buf)?;
        }
        buf.push(']');
        drop(guard);
        Ok(())
    }

    fn to_bool(&self) -> bool {
        !self.content.is_empty()
    }

    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        match other.downcast_ref::<List>() {
            Some(l) => equal_elements(&self.content, &l.content),
            None => Ok(false),
        }
    }

    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match other.downcast_ref::<List>() {
            Some(l) => compare_elements(&self.content, &l.content),
            None => Err(ValueError::OperationNotSupported {
                op: "compare".to_owned(),
                left: "list".to_owned(),
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

    fn set_at(&mut self, index: Value, new_value: Value) -> Result<(), ValueError> {
        self.mutability.test()?;
        let i = index.convert_index(self.content.len() as i64)?;
        self.content[i as usize] = new_value;
        Ok(())
    }

    fn slice(
        &self,
        start: Option<Value>,
        stop: Option<Value>,
        stride: Option<Value>,
    ) -> ValueResult {
        let (start, stop, stride) =
            convert_slice_indices(self.content.len() as i64, start, stop, stride)?;
        Ok(Value::new(List::from_values(slice_elements(
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
        match other.downcast_ref::<List>() {
            Some(l) => {
                let mut result = Vec::with_capacity(self.content.len() + l.content.len());
                result.extend(self.content.iter().cloned());
                result.extend(l.content.iter().cloned());
                Ok(Value::new(List::from_values(result)))
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
                Ok(Value::new(List::from_values(result)))
            }
            None => Err(self.unsupported_with("*", &other)),
        }
    }

    fn mutability(&self) -> Option<&Mutability> {
        Some(&self.mutability)
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

    #[test]
    fn repr() {
        assert_eq!("[1, 2, 3]", Value::from(vec![1, 2, 3]).to_repr());
        assert_eq!(
            "[1, [2, 3]]",
            Value::from(vec![Value::from(1), Value::from(vec![2, 3])]).to_repr()
        );
        assert_eq!("[]", Value::from(Vec::<i64>::new()).to_repr());
    }

    #[test]
    fn mutate() {
        let v = Value::from(vec![1, 2, 3]);
        v.set_at(Value::from(1), Value::from(5)).unwrap();
        assert_eq!("[1, 5, 3]", v.to_repr());
        assert!(v.set_at(Value::from(5), Value::from(0)).is_err());
    }

    #[test]
    fn arithmetic() {
        assert_eq!(
            "[1, 2, 3, 4]",
            Value::from(vec![1, 2])
                .add(Value::from(vec![3, 4]))
                .unwrap()
                .to_repr()
        );
        assert_eq!(
            "[1, 2, 1, 2]",
            Value::from(vec![1, 2]).mul(Value::from(2)).unwrap().to_repr()
        );
        assert_eq!(
            "[]",
            Value::from(vec![1, 2]).mul(Value::from(-3)).unwrap().to_repr()
        );
    }

    #[test]
    fn lists_are_unhashable() {
        assert!(Value::from(vec![1]).get_hash().is_err());
    }

    #[test]
    fn mutation_fails_during_iteration() {
        let v = Value::from(vec![1, 2, 3]);
        let it = v.iter().unwrap();
        assert_eq!(
            Err(ValueError::MutationDuringIteration),
            v.set_at(Value::from(0), Value::from(9))
        );
        drop(it);
        assert_eq!(Ok(()), v.set_at(Value::from(0), Value::from(9)));
    }

    #[test]
    fn comparison() {
        assert_eq!(
            Ok(Ordering::Less),
            Value::from(vec![1, 2]).compare(&Value::from(vec![1, 3]))
        );
        assert_eq!(Ok(true), Value::from(vec![1, 2]).equals(&Value::from(vec![1, 2])));
        assert!(Value::from(vec![1]).compare(&Value::from(1)).is_err());
    }
}
