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

//! A value with its hash, the key type of dict and set backing stores.

use crate::values::error::ValueError;
use crate::values::Value;
use std::hash::{Hash, Hasher};

/// A value together with the hash computed at construction time.
///
/// Constructing one fails for unhashable values, which is exactly the check
/// the language requires when a value is used as a dict key or set element.
#[derive(Clone, Debug)]
pub struct HashedValue {
    hash: u64,
    value: Value,
}

impl HashedValue {
    pub fn new(value: Value) -> Result<HashedValue, ValueError> {
        let hash = value.get_hash()?;
        Ok(HashedValue { hash, value })
    }

    pub fn get_hash(&self) -> u64 {
        self.hash
    }

    pub fn get_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Hash for HashedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for HashedValue {
    fn eq(&self, other: &HashedValue) -> bool {
        self.hash == other.hash && self.value.equals(&other.value) == Ok(true)
    }
}

impl Eq for HashedValue {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_are_equal_keys() {
        let k1 = HashedValue::new(Value::from("ab")).unwrap();
        let k2 = HashedValue::new(Value::from("ab")).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(k1.get_hash(), k2.get_hash());
    }

    #[test]
    fn unhashable_values_are_rejected() {
        let l = Value::from(vec![Value::from(1)]);
        assert!(HashedValue::new(l).is_err());
    }
}
