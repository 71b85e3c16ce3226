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

//! The frozen name environments below a module: the Universal layer baked
//! into the interpreter and the Predeclared layer each host adds, plus the
//! per-type method registry (`"abc".startswith`, `[].append`, ...).

use crate::values::error::{RuntimeError, ValueError};
use crate::values::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// Error codes -- CM = Critical environMent
const FROZEN_ENV_ERROR_CODE: &str = "CM00";
const NOT_FOUND_ERROR_CODE: &str = "CM01";
const UNASSIGNED_VARIABLE_ERROR_CODE: &str = "CM02";
const CANNOT_IMPORT_ERROR_CODE: &str = "CM03";

#[derive(Debug, Clone)]
pub enum EnvironmentError {
    /// Raised when trying to bind a name in a frozen environment.
    TryingToMutateFrozenEnvironment,
    /// The name is bound nowhere in scope.
    VariableNotFound(String),
    /// A local or global variable read before anything was assigned to it.
    VariableReferencedBeforeAssignment(String),
    /// Cannot import an underscore-prefixed symbol from a loaded module.
    CannotImportPrivateSymbol(String),
}

impl From<EnvironmentError> for RuntimeError {
    fn from(e: EnvironmentError) -> RuntimeError {
        RuntimeError {
            code: match e {
                EnvironmentError::TryingToMutateFrozenEnvironment => FROZEN_ENV_ERROR_CODE,
                EnvironmentError::VariableNotFound(..) => NOT_FOUND_ERROR_CODE,
                EnvironmentError::VariableReferencedBeforeAssignment(..) => {
                    UNASSIGNED_VARIABLE_ERROR_CODE
                }
                EnvironmentError::CannotImportPrivateSymbol(..) => CANNOT_IMPORT_ERROR_CODE,
            },
            label: match &e {
                EnvironmentError::TryingToMutateFrozenEnvironment => {
                    "This environment is frozen".to_owned()
                }
                EnvironmentError::VariableNotFound(..) => "Variable was not found".to_owned(),
                EnvironmentError::VariableReferencedBeforeAssignment(..) => {
                    "Variable was referenced before assignment".to_owned()
                }
                EnvironmentError::CannotImportPrivateSymbol(s) => {
                    format!("Symbol '{}' is private", s)
                }
            },
            message: match &e {
                EnvironmentError::TryingToMutateFrozenEnvironment => {
                    "Cannot mutate a frozen environment".to_owned()
                }
                EnvironmentError::VariableNotFound(s) => format!("Variable '{}' not found", s),
                EnvironmentError::VariableReferencedBeforeAssignment(s) => {
                    format!("Variable '{}' was referenced before assignment", s)
                }
                EnvironmentError::CannotImportPrivateSymbol(s) => {
                    format!("Cannot import private symbol '{}'", s)
                }
            },
        }
    }
}

impl From<EnvironmentError> for ValueError {
    fn from(e: EnvironmentError) -> ValueError {
        ValueError::Runtime(e.into())
    }
}

/// A layer of predeclared names. Layers chain: the host's predeclared
/// environment is a child of the universal one; creating a child freezes
/// the parent.
#[derive(Clone, Debug)]
pub struct Environment {
    env: Rc<RefCell<EnvironmentContent>>,
}

struct EnvironmentContent {
    /// A name for this environment, used mainly for debugging.
    name: String,
    frozen: bool,
    parent: Option<Environment>,
    variables: HashMap<String, Value>,
    /// Methods per type name, e.g. `type_objs["string"]["startswith"]`.
    type_objs: HashMap<String, HashMap<String, Value>>,
}

impl std::fmt::Debug for EnvironmentContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<environment {}>", self.name)
    }
}

impl Environment {
    pub fn new(name: &str) -> Environment {
        Environment {
            env: Rc::new(RefCell::new(EnvironmentContent {
                name: name.to_owned(),
                frozen: false,
                parent: None,
                variables: HashMap::new(),
                type_objs: HashMap::new(),
            })),
        }
    }

    /// Create a child environment; the parent becomes frozen.
    pub fn child(&self, name: &str) -> Environment {
        self.freeze();
        Environment {
            env: Rc::new(RefCell::new(EnvironmentContent {
                name: name.to_owned(),
                frozen: false,
                parent: Some(self.clone()),
                variables: HashMap::new(),
                type_objs: HashMap::new(),
            })),
        }
    }

    /// Freeze the environment and every value bound in it.
    pub fn freeze(&self) -> &Self {
        let values: Vec<Value> = {
            let mut env = self.env.borrow_mut();
            if env.frozen {
                Vec::new()
            } else {
                env.frozen = true;
                env.variables.values().cloned().collect()
            }
        };
        for v in values {
            v.freeze();
        }
        self
    }

    pub fn name(&self) -> String {
        self.env.borrow().name.clone()
    }

    /// Bind `name` in this environment.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EnvironmentError> {
        let mut env = self.env.borrow_mut();
        if env.frozen {
            return Err(EnvironmentError::TryingToMutateFrozenEnvironment);
        }
        env.variables.insert(name.to_owned(), value);
        Ok(())
    }

    /// Look `name` up in this environment and its parents.
    pub fn get(&self, name: &str) -> Result<Value, EnvironmentError> {
        let env = self.env.borrow();
        match env.variables.get(name) {
            Some(v) => Ok(v.clone()),
            None => match &env.parent {
                Some(p) => p.get(name),
                None => Err(EnvironmentError::VariableNotFound(name.to_owned())),
            },
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Register a method for values of type `obj`.
    pub fn add_type_value(&self, obj: &str, attr: &str, value: Value) {
        let mut env = self.env.borrow_mut();
        env.type_objs
            .entry(obj.to_owned())
            .or_insert_with(HashMap::new)
            .insert(attr.to_owned(), value);
    }

    /// Look up a method for a value, e.g. `list.append`.
    pub fn get_type_value(&self, obj: &Value, id: &str) -> Option<Value> {
        let env = self.env.borrow();
        match env.type_objs.get(obj.get_type()).and_then(|d| d.get(id)) {
            Some(v) => Some(v.clone()),
            None => match &env.parent {
                Some(p) => p.get_type_value(obj, id),
                None => None,
            },
        }
    }

    /// All method names for a value's type, for `dir()`.
    pub fn list_type_value(&self, obj: &Value) -> Vec<String> {
        let mut result = Vec::new();
        let mut cur = Some(self.clone());
        while let Some(env) = cur {
            let borrowed = env.env.borrow();
            if let Some(d) = borrowed.type_objs.get(obj.get_type()) {
                for k in d.keys() {
                    if !result.contains(k) {
                        result.push(k.clone());
                    }
                }
            }
            cur = borrowed.parent.clone();
        }
        result.sort();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_lookup() {
        let parent = Environment::new("parent");
        parent.set("a", Value::from(1)).unwrap();
        let child = parent.child("child");
        child.set("b", Value::from(2)).unwrap();
        assert_eq!("1", child.get("a").unwrap().to_repr());
        assert_eq!("2", child.get("b").unwrap().to_repr());
        assert!(child.get("c").is_err());
    }

    #[test]
    fn child_freezes_parent() {
        let parent = Environment::new("parent");
        let _child = parent.child("child");
        assert!(matches!(
            parent.set("a", Value::from(1)),
            Err(EnvironmentError::TryingToMutateFrozenEnvironment)
        ));
    }

    #[test]
    fn freezing_freezes_values() {
        let env = Environment::new("env");
        let l = Value::from(vec![1, 2]);
        env.set("l", l.clone()).unwrap();
        env.freeze();
        assert!(l.set_at(Value::from(0), Value::from(0)).is_err());
    }

    #[test]
    fn type_values() {
        let env = Environment::new("env");
        env.add_type_value("string", "magic", Value::from(1));
        let child = env.child("child");
        assert!(child.get_type_value(&Value::from("x"), "magic").is_some());
        assert!(child.get_type_value(&Value::from(1), "magic").is_none());
        assert_eq!(
            vec!["magic".to_owned()],
            child.list_type_value(&Value::from("x"))
        );
    }
}
