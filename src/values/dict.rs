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

//! The dict type: an insertion-ordered mapping of hashable keys to values.

use crate::values::error::ValueError;
use crate::values::hashed_value::HashedValue;
use crate::values::mutability::Mutability;
use crate::values::{ReprGuard, TypedValue, Value, ValueResult};
use linked_hash_map::LinkedHashMap;
use std::cmp::Ordering;
use std::fmt;

#[derive(Default)]
pub struct Dictionary {
    mutability: Mutability,
    content: LinkedHashMap<HashedValue, Value>,
}

impl Dictionary {
    /// A fresh empty dict value.
    pub fn new() -> Value {
        Value::new(Dictionary::default())
    }

    pub fn new_typed() -> Dictionary {
        Dictionary::default()
    }

    pub fn content(&self) -> &LinkedHashMap<HashedValue, Value> {
        &self.content
    }

    /// Mutable access for the mutating methods; performs the frozen and
    /// iteration checks.
    pub fn content_mut(
        &mut self,
    ) -> Result<&mut LinkedHashMap<HashedValue, Value>, ValueError> {
        self.mutability.test()?;
        Ok(&mut self.content)
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>, ValueError> {
        let key = HashedValue::new(key.clone())?;
        Ok(self.content.get(&key).cloned())
    }

    /// Insert or update. Updating an existing key preserves its position in
    /// the iteration order.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), ValueError> {
        let key = HashedValue::new(key)?;
        self.mutability.test()?;
        self.content.insert(key, value);
        Ok(())
    }
}

impl TypedValue for Dictionary {
    any!();

    fn get_type(&self) -> &'static str {
        "dict"
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        let guard = match ReprGuard::enter(self) {
            Some(g) => g,
            None => {
                buf.push_str("{...}");
                return Ok(());
            }
        };
        buf.push('{');
        for (i, (k, v)) in self.content.iter().enumerate() {
            if i != 0 {
                buf.push_str(", ");
            }
            k.get_value().to_repr_impl(buf)?;
            buf.push_str(": ");
            v.to_repr_impl(buf)?;
        }
        buf.push('}');
        drop(guard);
        Ok(())
    }

    fn to_bool(&self) -> bool {
        !self.content.is_empty()
    }

    fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        let other = match other.downcast_ref::<Dictionary>() {
            Some(d) => d,
            None => return Ok(false),
        };
        if self.content.len() != other.content.len() {
            return Ok(false);
        }
        for (k, v) in &self.content {
            match other.content.get(k) {
                Some(w) => {
                    if !v.equals(w)? {
                        return Ok(false);
                    }
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        Err(ValueError::OperationNotSupported {
            op: "compare".to_owned(),
            left: "dict".to_owned(),
            right: Some(other.get_type().to_owned()),
        })
    }

    fn length(&self) -> Result<i64, ValueError> {
        Ok(self.content.len() as i64)
    }

    fn at(&self, index: Value) -> ValueResult {
        match self.get(&index)? {
            Some(v) => Ok(v),
            None => Err(ValueError::KeyNotFound(index)),
        }
    }

    fn set_at(&mut self, index: Value, new_value: Value) -> Result<(), ValueError> {
        self.insert(index, new_value)
    }

    /// Iterating a dict yields its keys, in insertion order.
    fn iter_items(&self) -> Result<Vec<Value>, ValueError> {
        Ok(self.content.keys().map(|k| k.get_value().clone()).collect())
    }

    fn is_in(&self, other: &Value) -> Result<bool, ValueError> {
        let key = HashedValue::new(other.clone())?;
        Ok(self.content.contains_key(&key))
    }

    /// `d | d2`: a fresh dict; left keys keep their order, right-only keys
    /// follow in their order, right values win on collision.
    fn pipe(&self, other: Value) -> ValueResult {
        let other = match other.downcast_ref::<Dictionary>() {
            Some(d) => d,
            None => {
                return Err(ValueError::OperationNotSupported {
                    op: "|".to_owned(),
                    left: "dict".to_owned(),
                    right: Some(other.get_type().to_owned()),
                })
            }
        };
        let mut result = Dictionary::new_typed();
        for (k, v) in &self.content {
            result.content.insert(k.clone(), v.clone());
        }
        for (k, v) in &other.content {
            result.content.insert(k.clone(), v.clone());
        }
        Ok(Value::new(result))
    }

    fn mutability(&self) -> Option<&Mutability> {
        Some(&self.mutability)
    }

    fn visit_links(&self, visitor: &mut dyn FnMut(&Value)) {
        for (k, v) in &self.content {
            visitor(k.get_value());
            visitor(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_preserved() {
        let d = Dictionary::new();
        d.set_at(Value::from("a"), Value::from(1)).unwrap();
        d.set_at(Value::from("b"), Value::from(2)).unwrap();
        d.set_at(Value::from("a"), Value::from(3)).unwrap();
        assert_eq!("{\"a\": 3, \"b\": 2}", d.to_repr());
    }

    #[test]
    fn removal_then_reinsertion_moves_to_the_back() {
        let d = Dictionary::new();
        d.set_at(Value::from("a"), Value::from(1)).unwrap();
        d.set_at(Value::from("b"), Value::from(2)).unwrap();
        {
            let mut borrowed = d.downcast_mut::<Dictionary>().unwrap();
            let key = HashedValue::new(Value::from("a")).unwrap();
            borrowed.content_mut().unwrap().remove(&key);
        }
        d.set_at(Value::from("a"), Value::from(3)).unwrap();
        assert_eq!("{\"b\": 2, \"a\": 3}", d.to_repr());
    }

    #[test]
    fn union_order_and_collisions() {
        let d1 = Dictionary::new();
        d1.set_at(Value::from("a"), Value::from(1)).unwrap();
        d1.set_at(Value::from("b"), Value::from(2)).unwrap();
        let d2 = Dictionary::new();
        d2.set_at(Value::from("c"), Value::from(3)).unwrap();
        d2.set_at(Value::from("a"), Value::from(9)).unwrap();
        let u = d1.pipe(d2).unwrap();
        assert_eq!("{\"a\": 9, \"b\": 2, \"c\": 3}", u.to_repr());
    }

    #[test]
    fn unhashable_keys_are_rejected() {
        let d = Dictionary::new();
        assert_eq!(
            Err(ValueError::NotHashableValue),
            d.set_at(Value::from(vec![1]), Value::from(1))
        );
    }

    #[test]
    fn int_and_float_keys_collide() {
        let d = Dictionary::new();
        d.set_at(Value::from(1), Value::from("int")).unwrap();
        d.set_at(Value::from(1.0), Value::from("float")).unwrap();
        assert_eq!(1, d.length().unwrap());
        assert_eq!("\"float\"", d.at(Value::from(1)).unwrap().to_repr());
    }

    #[test]
    fn keys_are_looked_up_by_equality() {
        let d = Dictionary::new();
        let k = Value::new(crate::values::tuple::Tuple::new(vec![
            Value::from(1),
            Value::from(2),
        ]));
        d.set_at(k, Value::from("x")).unwrap();
        let k2 = Value::new(crate::values::tuple::Tuple::new(vec![
            Value::from(1),
            Value::from(2),
        ]));
        assert_eq!("\"x\"", d.at(k2).unwrap().to_repr());
    }
}
