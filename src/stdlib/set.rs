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

//! Methods of the set type.

use crate::environment::Environment;
use crate::stdlib::{add_method, none};
use crate::values::error::{RuntimeError, ValueError};
use crate::values::function::FunctionSignature;
use crate::values::hashed_value::HashedValue;
use crate::values::set::Set;
use crate::values::{Value, ValueResult};

const EMPTY_SET_POP_ERROR_CODE: &str = "CR40";

fn with_set<F>(v: &Value, f: F) -> ValueResult
where
    F: FnOnce(&mut Set) -> ValueResult,
{
    match v.downcast_mut::<Set>() {
        Some(mut s) => f(&mut s),
        None => Err(ValueError::IncorrectParameterType),
    }
}

pub(crate) fn register(env: &Environment) {
    add_method(
        env,
        "set",
        "add",
        FunctionSignature::new().required("this").required("el"),
        |_, args| {
            with_set(&args[0], |s| {
                s.insert(args[1].clone())?;
                Ok(none())
            })
        },
    );

    add_method(
        env,
        "set",
        "clear",
        FunctionSignature::new().required("this"),
        |_, args| {
            with_set(&args[0], |s| {
                s.content_mut()?.clear();
                Ok(none())
            })
        },
    );

    add_method(
        env,
        "set",
        "discard",
        FunctionSignature::new().required("this").required("el"),
        |_, args| {
            let key = HashedValue::new(args[1].clone())?;
            with_set(&args[0], |s| {
                s.content_mut()?.remove(&key);
                Ok(none())
            })
        },
    );

    add_method(
        env,
        "set",
        "remove",
        FunctionSignature::new().required("this").required("el"),
        |_, args| {
            let key = HashedValue::new(args[1].clone())?;
            with_set(&args[0], |s| {
                match s.content_mut()?.remove(&key) {
                    Some(..) => Ok(none()),
                    None => Err(ValueError::KeyNotFound(args[1].clone())),
                }
            })
        },
    );

    add_method(
        env,
        "set",
        "pop",
        FunctionSignature::new().required("this"),
        |_, args| {
            with_set(&args[0], |s| {
                match s.content_mut()?.pop_front() {
                    Some((k, ())) => Ok(k.into_value()),
                    None => Err(ValueError::Runtime(RuntimeError {
                        code: EMPTY_SET_POP_ERROR_CODE,
                        message: "pop(): the set is empty".to_owned(),
                        label: "empty set".to_owned(),
                    })),
                }
            })
        },
    );

    add_method(
        env,
        "set",
        "union",
        FunctionSignature::new().required("this").with_args("others"),
        |_, args| {
            let mut result = Set::new_typed();
            for v in args[0].to_vec()? {
                result.insert(v)?;
            }
            for other in args[1].to_vec()? {
                for v in other.to_vec()? {
                    result.insert(v)?;
                }
            }
            Ok(Value::new(result))
        },
    );
}

#[cfg(test)]
mod tests {
    use crate::stdlib::global_environment;
    use crate::values::set::Set;

    #[test]
    fn set_methods_exist() {
        let env = global_environment();
        let s = Set::new();
        for m in &["add", "clear", "discard", "remove", "pop", "union"] {
            assert!(env.get_type_value(&s, m).is_some(), "missing method {}", m);
        }
    }
}
