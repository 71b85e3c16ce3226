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

//! The set type: an insertion-ordered set of hashable values.

use crate::values::error::ValueError;
use crate::values::hashed_value::HashedValue;
use crate::values::mutability::Mutability;
use crate::values::{ReprGuard, TypedValue, Value, ValueResult};
use linked_hash_map::LinkedHashMap;
use std::cmp::Ordering;
use std::fmt;

#[derive(Default)]
pub struct Set {
    mutability: Mutability,
    content: LinkedHashMap<HashedValue, ()>,
}

impl Set {
    /// A fresh empty set value.
    pub fn new() -> Value {
        Value::new(Set::default())
    }

    pub fn new_typed() -> Set {
        Set::default()
    }

    pub fn content(&self) -> &LinkedHashMap<HashedValue, ()> {
        &self.content
    }

    /// Mutable access for the mutating methods; performs the frozen and
    /// iteration checks.
    pub fn content_mut(&mut self) -> Result<&mut LinkedHashMap<HashedValue, ()>, ValueError> {
        self.mutability.test()?;
        Ok(&mut self.content)
    }

    /// Insert an element; inserting an element already present keeps its
    /// position.
    pub fn insert(&mut self, value: Value) -> Result<(), ValueError> {
        let key = HashedValue::new(value)?;
        self.mutability.test()?;
        self.content.insert(key, ());
        Ok(())
    }

    fn is_subset_of(&self, other: &Set) -> bool {
        self.content.keys().all(|k| other.content.contains_key(k))
    }
}

impl TypedValue for Set {
    any!();

    fn get_type(&self) -> &'static str {
        "set"
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        let guard = match ReprGuard::enter(self) {
            Some(g) => g,
            None => {
                buf.push_str("set(...)");
                return Ok(());
            }
        };
        buf.push_str("set([");
        for (i, k) in self.content.keys().enumerate() {
            if i != 0 {
                buf.push_str(", ");
            }
            k.get_value().to_repr_impl(buf)?;
        }
        buf.push_str("])");
        drop(guard);
        Ok(())
    }

    fn to_bool(&self) -> bool {
        !self.content.is_empty()
    }

    /// Sets are equal when they hold the same elements, in any order.
    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        match other.downcast_ref::<Set>() {
            Some(s) => Ok(self.content.len() == s.content.len() && self.is_subset_of(&*s)),
            None => Ok(false),
        }
    }

    /// The subset lattice: `<` is proper subset. Incomparable sets are an
    /// unsupported comparison.
    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        let other = match other.downcast_ref::<Set>() {
            Some(s) => s,
            None => {
                return Err(ValueError::OperationNotSupported {
                    op: "compare".to_owned(),
                    left: "set".to_owned(),
                    right: Some(other.get_type().to_owned()),
                })
            }
        };
        let sub = self.is_subset_of(&*other);
        let sup = other.is_subset_of(self);
        match (sub, sup) {
            (true, true) => Ok(Ordering::Equal),
            (true, false) => Ok(Ordering::Less),
            (false, true) => Ok(Ordering::Greater),
            (false, false) => Err(ValueError::OperationNotSupported {
                op: "compare".to_owned(),
                left: "set".to_owned(),
                right: Some("set".to_owned()),
            }),
        }
    }

    fn length(&self) -> Result<i64, ValueError> {
        Ok(self.content.len() as i64)
    }

    fn iter_items(&self) -> Result<Vec<Value>, ValueError> {
        Ok(self.content.keys().map(|k| k.get_value().clone()).collect())
    }

    fn is_in(&self, other: &Value) -> Result<bool, ValueError> {
        let key = HashedValue::new(other.clone())?;
        Ok(self.content.contains_key(&key))
    }

    /// `s | s2`: union, left elements first, right-only elements following
    /// in their original order.
    fn pipe(&self, other: Value) -> ValueResult {
        let other = self.expect_set("|", other)?;
        let mut result = Set::new_typed();
        for k in self.content.keys() {
            result.content.insert(k.clone(), ());
        }
        for k in other.content().keys() {
            result.content.insert(k.clone(), ());
        }
        Ok(Value::new(result))
    }

    /// `s & s2`: intersection, in the left operand's order.
    fn bit_and(&self, other: Value) -> ValueResult {
        let other = self.expect_set("&", other)?;
        let mut result = Set::new_typed();
        for k in self.content.keys() {
            if other.content().contains_key(k) {
                result.content.insert(k.clone(), ());
            }
        }
        Ok(Value::new(result))
    }

    /// `s ^ s2`: symmetric difference.
    fn bit_xor(&self, other: Value) -> ValueResult {
        let other = self.expect_set("^", other)?;
        let mut result = Set::new_typed();
        for k in self.content.keys() {
            if !other.content().contains_key(k) {
                result.content.insert(k.clone(), ());
            }
        }
        for k in other.content().keys() {
            if !self.content.contains_key(k) {
                result.content.insert(k.clone(), ());
            }
        }
        Ok(Value::new(result))
    }

    /// `s - s2`: difference.
    fn sub(&self, other: Value) -> ValueResult {
        let other = self.expect_set("-", other)?;
        let mut result = Set::new_typed();
        for k in self.content.keys() {
            if !other.content().contains_key(k) {
                result.content.insert(k.clone(), ());
            }
        }
        Ok(Value::new(result))
    }

    fn mutability(&self) -> Option<&Mutability> {
        Some(&self.mutability)
    }

    fn visit_links(&self, visitor: &mut dyn FnMut(&Value)) {
        for k in self.content.keys() {
            visitor(k.get_value());
        }
    }
}

impl Set {
    fn expect_set(&self, op: &str, other: Value) -> Result<OwnedSet, ValueError> {
        match other.downcast_ref::<Set>() {
            Some(s) => Ok(OwnedSet {
                content: s.content.clone(),
            }),
            None => Err(ValueError::OperationNotSupported {
                op: op.to_owned(),
                left: "set".to_owned(),
                right: Some(other.get_type().to_owned()),
            }),
        }
    }
}

/// A snapshot of another set's elements, detached from its `RefCell`.
struct OwnedSet {
    content: LinkedHashMap<HashedValue, ()>,
}

impl OwnedSet {
    fn content(&self) -> &LinkedHashMap<HashedValue, ()> {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: Vec<i64>) -> Value {
        let s = Set::new();
        for v in values {
            s.downcast_mut::<Set>()
                .unwrap()
                .insert(Value::from(v))
                .unwrap();
        }
        s
    }

    #[test]
    fn insertion_order() {
        assert_eq!("set([3, 1, 2])", set(vec![3, 1, 2, 3]).to_repr());
    }

    #[test]
    fn equality_ignores_order() {
        assert_eq!(Ok(true), set(vec![1, 2]).equals(&set(vec![2, 1])));
        assert_eq!(Ok(false), set(vec![1, 2]).equals(&set(vec![1])));
    }

    #[test]
    fn subset_lattice() {
        assert_eq!(Ok(Ordering::Less), set(vec![1]).compare(&set(vec![1, 2])));
        assert_eq!(Ok(Ordering::Greater), set(vec![1, 2]).compare(&set(vec![1])));
        assert_eq!(Ok(Ordering::Equal), set(vec![1, 2]).compare(&set(vec![2, 1])));
        assert!(set(vec![1]).compare(&set(vec![2])).is_err());
    }

    #[test]
    fn union_keeps_order() {
        let u = set(vec![1, 2]).pipe(set(vec![3, 1])).unwrap();
        assert_eq!("set([1, 2, 3])", u.to_repr());
    }

    #[test]
    fn set_operations() {
        assert_eq!(
            "set([2])",
            set(vec![1, 2]).bit_and(set(vec![2, 3])).unwrap().to_repr()
        );
        assert_eq!(
            "set([1, 3])",
            set(vec![1, 2]).bit_xor(set(vec![2, 3])).unwrap().to_repr()
        );
        assert_eq!(
            "set([1])",
            set(vec![1, 2]).sub(set(vec![2])).unwrap().to_repr()
        );
    }
}
