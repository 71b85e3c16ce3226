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

//! A module: the ordered globals produced by executing a source file, plus
//! the file block holding `load`ed symbols.

use crate::environment::EnvironmentError;
use crate::resolve::Program;
use crate::values::Value;
use std::cell::{Cell, RefCell};

/// Module globals are slot-backed: the resolver assigns each global name an
/// index, and the embedder can still look values up by name. After
/// successful initialization the whole module is frozen and can be shared.
#[derive(Debug)]
pub struct Module {
    name: String,
    names: Vec<String>,
    slots: RefCell<Vec<Option<Value>>>,
    file_names: Vec<String>,
    file_slots: RefCell<Vec<Option<Value>>>,
    frozen: Cell<bool>,
}

impl Module {
    pub fn new(name: &str, program: &Program) -> Module {
        let names: Vec<String> = program.global_names().to_vec();
        let file_names: Vec<String> = program.file_names().to_vec();
        Module {
            name: name.to_owned(),
            slots: RefCell::new(vec![None; names.len()]),
            file_slots: RefCell::new(vec![None; file_names.len()]),
            names,
            file_names,
            frozen: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered names of the globals.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Look a global up by name; `None` for unknown or never-assigned
    /// names.
    pub fn get(&self, name: &str) -> Option<Value> {
        let i = self.names.iter().position(|n| n == name)?;
        self.slots.borrow()[i].clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }

    pub(crate) fn get_slot(&self, index: u32, name: &str) -> Result<Value, EnvironmentError> {
        self.slots.borrow()[index as usize].clone().ok_or_else(|| {
            EnvironmentError::VariableReferencedBeforeAssignment(name.to_owned())
        })
    }

    pub(crate) fn set_slot(&self, index: u32, value: Value) -> Result<(), EnvironmentError> {
        if self.frozen.get() {
            return Err(EnvironmentError::TryingToMutateFrozenEnvironment);
        }
        self.slots.borrow_mut()[index as usize] = Some(value);
        Ok(())
    }

    pub(crate) fn get_file_slot(&self, index: u32, name: &str) -> Result<Value, EnvironmentError> {
        self.file_slots.borrow()[index as usize]
            .clone()
            .ok_or_else(|| EnvironmentError::VariableReferencedBeforeAssignment(name.to_owned()))
    }

    pub(crate) fn set_file_slot(&self, index: u32, value: Value) -> Result<(), EnvironmentError> {
        if self.frozen.get() {
            return Err(EnvironmentError::TryingToMutateFrozenEnvironment);
        }
        self.file_slots.borrow_mut()[index as usize] = Some(value);
        Ok(())
    }

    /// Freeze the module: transitively freeze every value reachable from
    /// its globals and file block, and refuse further binding.
    pub fn freeze(&self) {
        if self.frozen.replace(true) {
            return;
        }
        let values: Vec<Value> = self
            .slots
            .borrow()
            .iter()
            .chain(self.file_slots.borrow().iter())
            .flatten()
            .cloned()
            .collect();
        for v in values {
            v.freeze();
        }
    }
}
