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

//! Methods of the list type.

use crate::environment::Environment;
use crate::stdlib::{add_method, get_i64, is_none, none};
use crate::values::error::{RuntimeError, ValueError};
use crate::values::function::FunctionSignature;
use crate::values::list::List;
use crate::values::{Value, ValueResult};

const EMPTY_LIST_POP_ERROR_CODE: &str = "CR20";
const VALUE_NOT_IN_LIST_ERROR_CODE: &str = "CR21";

fn with_list<F>(v: &Value, f: F) -> ValueResult
where
    F: FnOnce(&mut List) -> ValueResult,
{
    match v.downcast_mut::<List>() {
        Some(mut l) => f(&mut l),
        None => Err(ValueError::IncorrectParameterType),
    }
}

/// Position of the first element equal to `needle`, if any.
fn position(content: &[Value], needle: &Value) -> Result<Option<usize>, ValueError> {
    for (i, v) in content.iter().enumerate() {
        if v.equals(needle)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

pub(crate) fn register(env: &Environment) {
    add_method(
        env,
        "list",
        "append",
        FunctionSignature::new().required("this").required("el"),
        |_, args| {
            with_list(&args[0], |l| {
                l.content_mut()?.push(args[1].clone());
                Ok(none())
            })
        },
    );

    add_method(
        env,
        "list",
        "clear",
        FunctionSignature::new().required("this"),
        |_, args| {
            with_list(&args[0], |l| {
                l.content_mut()?.clear();
                Ok(none())
            })
        },
    );

    add_method(
        env,
        "list",
        "extend",
        FunctionSignature::new().required("this").required("els"),
        |_, args| {
            // Snapshot first: `l.extend(l)` must see the original elements.
            let items = args[1].to_vec()?;
            with_list(&args[0], |l| {
                l.content_mut()?.extend(items);
                Ok(none())
            })
        },
    );

    add_method(
        env,
        "list",
        "index",
        FunctionSignature::new().required("this").required("el"),
        |_, args| {
            if args[0].get_type() != "list" {
                return Err(ValueError::IncorrectParameterType);
            }
            let items = args[0].to_vec()?;
            match position(&items, &args[1])? {
                Some(i) => Ok(Value::from(i as i64)),
                None => Err(ValueError::Runtime(RuntimeError {
                    code: VALUE_NOT_IN_LIST_ERROR_CODE,
                    message: format!("index(): {} is not in the list", args[1].to_repr()),
                    label: "value not found".to_owned(),
                })),
            }
        },
    );

    add_method(
        env,
        "list",
        "insert",
        FunctionSignature::new()
            .required("this")
            .required("index")
            .required("el"),
        |_, args| {
            let index = get_i64(&args[1])?;
            with_list(&args[0], |l| {
                let content = l.content_mut()?;
                // Out-of-range insertion indices clamp, as in Python.
                let len = content.len() as i64;
                let i = if index < 0 {
                    (len + index).max(0)
                } else {
                    index.min(len)
                };
                content.insert(i as usize, args[2].clone());
                Ok(none())
            })
        },
    );

    add_method(
        env,
        "list",
        "pop",
        FunctionSignature::new()
            .required("this")
            .optional("index", none()),
        |_, args| {
            with_list(&args[0], |l| {
                let len = l.content().len() as i64;
                if len == 0 {
                    return Err(ValueError::Runtime(RuntimeError {
                        code: EMPTY_LIST_POP_ERROR_CODE,
                        message: "pop(): cannot pop from an empty list".to_owned(),
                        label: "empty list".to_owned(),
                    }));
                }
                let i = if is_none(&args[1]) {
                    len - 1
                } else {
                    args[1].convert_index(len)?
                };
                Ok(l.content_mut()?.remove(i as usize))
            })
        },
    );

    add_method(
        env,
        "list",
        "remove",
        FunctionSignature::new().required("this").required("el"),
        |_, args| {
            if args[0].get_type() != "list" {
                return Err(ValueError::IncorrectParameterType);
            }
            // Find the element before borrowing the list for mutation, so
            // that the equality tests run unborrowed.
            let items = args[0].to_vec()?;
            match position(&items, &args[1])? {
                Some(i) => with_list(&args[0], |l| {
                    l.content_mut()?.remove(i);
                    Ok(none())
                }),
                None => Err(ValueError::Runtime(RuntimeError {
                    code: VALUE_NOT_IN_LIST_ERROR_CODE,
                    message: format!("remove(): {} is not in the list", args[1].to_repr()),
                    label: "value not found".to_owned(),
                })),
            }
        },
    );
}

#[cfg(test)]
mod tests {
    use crate::stdlib::global_environment;
    use crate::values::Value;

    #[test]
    fn list_methods_exist() {
        let env = global_environment();
        let l = Value::from(vec![1, 2, 3]);
        for m in &["append", "clear", "extend", "index", "insert", "pop", "remove"] {
            assert!(env.get_type_value(&l, m).is_some(), "missing method {}", m);
        }
    }
}
