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

//! Methods of the dict type.

use crate::environment::Environment;
use crate::stdlib::{add_method, is_absent, absent, none};
use crate::values::dict::Dictionary;
use crate::values::error::{RuntimeError, ValueError};
use crate::values::function::FunctionSignature;
use crate::values::hashed_value::HashedValue;
use crate::values::list::List;
use crate::values::tuple::Tuple;
use crate::values::{Value, ValueResult};

const EMPTY_DICT_POP_ERROR_CODE: &str = "CR30";

fn with_dict<F>(v: &Value, f: F) -> ValueResult
where
    F: FnOnce(&mut Dictionary) -> ValueResult,
{
    match v.downcast_mut::<Dictionary>() {
        Some(mut d) => f(&mut d),
        None => Err(ValueError::IncorrectParameterType),
    }
}

pub(crate) fn register(env: &Environment) {
    add_method(
        env,
        "dict",
        "clear",
        FunctionSignature::new().required("this"),
        |_, args| {
            with_dict(&args[0], |d| {
                d.content_mut()?.clear();
                Ok(none())
            })
        },
    );

    add_method(
        env,
        "dict",
        "get",
        FunctionSignature::new()
            .required("this")
            .required("key")
            .optional("default", none()),
        |_, args| {
            if args[0].get_type() != "dict" {
                return Err(ValueError::IncorrectParameterType);
            }
            match args[0].at(args[1].clone()) {
                Ok(v) => Ok(v),
                Err(ValueError::KeyNotFound(..)) => Ok(args[2].clone()),
                Err(e) => Err(e),
            }
        },
    );

    add_method(
        env,
        "dict",
        "items",
        FunctionSignature::new().required("this"),
        |_, args| {
            let keys = args[0].to_vec()?;
            let mut result = Vec::with_capacity(keys.len());
            for k in keys {
                let v = args[0].at(k.clone())?;
                result.push(Value::new(Tuple::new(vec![k, v])));
            }
            Ok(Value::new(List::from_values(result)))
        },
    );

    add_method(
        env,
        "dict",
        "keys",
        FunctionSignature::new().required("this"),
        |_, args| {
            if args[0].get_type() != "dict" {
                return Err(ValueError::IncorrectParameterType);
            }
            Ok(Value::new(List::from_values(args[0].to_vec()?)))
        },
    );

    add_method(
        env,
        "dict",
        "values",
        FunctionSignature::new().required("this"),
        |_, args| {
            let keys = args[0].to_vec()?;
            let mut result = Vec::with_capacity(keys.len());
            for k in keys {
                result.push(args[0].at(k)?);
            }
            Ok(Value::new(List::from_values(result)))
        },
    );

    add_method(
        env,
        "dict",
        "pop",
        FunctionSignature::new()
            .required("this")
            .required("key")
            .optional("default", absent()),
        |_, args| {
            let key = HashedValue::new(args[1].clone())?;
            with_dict(&args[0], |d| {
                match d.content_mut()?.remove(&key) {
                    Some(v) => Ok(v),
                    None => {
                        if is_absent(&args[2]) {
                            Err(ValueError::KeyNotFound(args[1].clone()))
                        } else {
                            Ok(args[2].clone())
                        }
                    }
                }
            })
        },
    );

    add_method(
        env,
        "dict",
        "popitem",
        FunctionSignature::new().required("this"),
        |_, args| {
            with_dict(&args[0], |d| {
                match d.content_mut()?.pop_front() {
                    Some((k, v)) => Ok(Value::new(Tuple::new(vec![k.into_value(), v]))),
                    None => Err(ValueError::Runtime(RuntimeError {
                        code: EMPTY_DICT_POP_ERROR_CODE,
                        message: "popitem(): the dictionary is empty".to_owned(),
                        label: "empty dict".to_owned(),
                    })),
                }
            })
        },
    );

    add_method(
        env,
        "dict",
        "setdefault",
        FunctionSignature::new()
            .required("this")
            .required("key")
            .optional("default", none()),
        |_, args| {
            let key = HashedValue::new(args[1].clone())?;
            with_dict(&args[0], |d| {
                if let Some(v) = d.content().get(&key) {
                    return Ok(v.clone());
                }
                d.content_mut()?.insert(key, args[2].clone());
                Ok(args[2].clone())
            })
        },
    );

    add_method(
        env,
        "dict",
        "update",
        FunctionSignature::new()
            .required("this")
            .optional("pairs", none())
            .with_kwargs("kwargs"),
        |_, args| {
            // Collect the new entries before mutating, evaluating left to
            // right: the positional argument first, then keywords.
            let mut entries: Vec<(Value, Value)> = Vec::new();
            if args[1].get_type() != "NoneType" {
                if args[1].get_type() == "dict" {
                    for k in args[1].to_vec()? {
                        let v = args[1].at(k.clone())?;
                        entries.push((k, v));
                    }
                } else {
                    for pair in args[1].to_vec()? {
                        let kv = pair.to_vec()?;
                        if kv.len() != 2 {
                            return Err(ValueError::IncorrectParameterType);
                        }
                        entries.push((kv[0].clone(), kv[1].clone()));
                    }
                }
            }
            for k in args[2].to_vec()? {
                let v = args[2].at(k.clone())?;
                entries.push((k, v));
            }
            with_dict(&args[0], |d| {
                for (k, v) in entries {
                    d.insert(k, v)?;
                }
                Ok(none())
            })
        },
    );
}

#[cfg(test)]
mod tests {
    use crate::stdlib::global_environment;
    use crate::values::dict::Dictionary;

    #[test]
    fn dict_methods_exist() {
        let env = global_environment();
        let d = Dictionary::new();
        for m in &[
            "clear",
            "get",
            "items",
            "keys",
            "values",
            "pop",
            "popitem",
            "setdefault",
            "update",
        ] {
            assert!(env.get_type_value(&d, m).is_some(), "missing method {}", m);
        }
    }
}
