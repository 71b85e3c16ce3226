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

//! The runtime realization of variables captured by nested functions.

use crate::values::error::ValueError;
use crate::values::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// A single-slot mutable holder, shared between the frame that owns the
/// variable and every closure that captures it.
#[derive(Clone, Debug, Default)]
pub struct ValueCell {
    inner: Rc<RefCell<CellContent>>,
}

#[derive(Debug, Default)]
struct CellContent {
    value: Option<Value>,
    frozen: bool,
}

impl ValueCell {
    pub fn new() -> ValueCell {
        Default::default()
    }

    /// The current value, or `None` when the variable has not been assigned
    /// yet on this activation.
    pub fn get(&self) -> Option<Value> {
        self.inner.borrow().value.clone()
    }

    pub fn set(&self, value: Value) -> Result<(), ValueError> {
        let mut inner = self.inner.borrow_mut();
        if inner.frozen {
            return Err(ValueError::CannotMutateFrozenValue);
        }
        inner.value = Some(value);
        Ok(())
    }

    /// Freeze the cell itself and, transitively, the value it holds.
    /// Idempotent; the frozen flag breaks reference cycles through
    /// self-capturing closures.
    pub fn freeze(&self) {
        let value = {
            let mut inner = self.inner.borrow_mut();
            if inner.frozen {
                return;
            }
            inner.frozen = true;
            inner.value.clone()
        };
        if let Some(v) = value {
            v.freeze();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_is_shared() {
        let c1 = ValueCell::new();
        let c2 = c1.clone();
        assert!(c1.get().is_none());
        c1.set(Value::from(3)).unwrap();
        assert_eq!("3", c2.get().unwrap().to_repr());
    }

    #[test]
    fn frozen_cell_rejects_writes() {
        let c = ValueCell::new();
        c.set(Value::from(1)).unwrap();
        c.freeze();
        assert_eq!(
            Err(ValueError::CannotMutateFrozenValue),
            c.set(Value::from(2))
        );
    }
}
