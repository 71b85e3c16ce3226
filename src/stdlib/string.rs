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

//! Methods of the string type.

use crate::environment::Environment;
use crate::stdlib::{add_method, get_string, is_none, none};
use crate::values::error::{RuntimeError, ValueError};
use crate::values::function::FunctionSignature;
use crate::values::list::List;
use crate::values::string::format::format;
use crate::values::{Value, ValueResult};
use linked_hash_map::LinkedHashMap;

const SUBSTRING_NOT_FOUND_ERROR_CODE: &str = "CR10";
const JOIN_EXPECTS_STRINGS_ERROR_CODE: &str = "CR11";

fn strings_to_list<I: IntoIterator<Item = String>>(items: I) -> ValueResult {
    Ok(Value::new(List::from_values(
        items.into_iter().map(Value::from).collect(),
    )))
}

/// Index of `needle` in `haystack`, counted in code points; -1 when absent.
fn find_index(haystack: &str, needle: &str) -> i64 {
    match haystack.find(needle) {
        None => -1,
        Some(byte_index) => haystack[..byte_index].chars().count() as i64,
    }
}

pub(crate) fn register(env: &Environment) {
    add_method(
        env,
        "string",
        "elems",
        FunctionSignature::new().required("this"),
        |_, args| {
            let s = get_string(&args[0])?;
            strings_to_list(s.chars().map(|c| c.to_string()))
        },
    );

    add_method(
        env,
        "string",
        "codepoints",
        FunctionSignature::new().required("this"),
        |_, args| {
            let s = get_string(&args[0])?;
            Ok(Value::new(List::from_values(
                s.chars().map(|c| Value::from(c as u32 as i64)).collect(),
            )))
        },
    );

    add_method(
        env,
        "string",
        "count",
        FunctionSignature::new().required("this").required("sub"),
        |_, args| {
            let s = get_string(&args[0])?;
            let sub = get_string(&args[1])?;
            if sub.is_empty() {
                return Ok(Value::from(s.chars().count() as i64 + 1));
            }
            Ok(Value::from(s.matches(sub.as_str()).count() as i64))
        },
    );

    add_method(
        env,
        "string",
        "endswith",
        FunctionSignature::new().required("this").required("suffix"),
        |_, args| {
            let s = get_string(&args[0])?;
            let suffix = get_string(&args[1])?;
            Ok(Value::from(s.ends_with(suffix.as_str())))
        },
    );

    add_method(
        env,
        "string",
        "startswith",
        FunctionSignature::new().required("this").required("prefix"),
        |_, args| {
            let s = get_string(&args[0])?;
            let prefix = get_string(&args[1])?;
            Ok(Value::from(s.starts_with(prefix.as_str())))
        },
    );

    add_method(
        env,
        "string",
        "find",
        FunctionSignature::new().required("this").required("sub"),
        |_, args| {
            let s = get_string(&args[0])?;
            let sub = get_string(&args[1])?;
            Ok(Value::from(find_index(&s, &sub)))
        },
    );

    add_method(
        env,
        "string",
        "index",
        FunctionSignature::new().required("this").required("sub"),
        |_, args| {
            let s = get_string(&args[0])?;
            let sub = get_string(&args[1])?;
            match find_index(&s, &sub) {
                -1 => Err(ValueError::Runtime(RuntimeError {
                    code: SUBSTRING_NOT_FOUND_ERROR_CODE,
                    message: format!("index(): substring {:?} not found in {:?}", sub, s),
                    label: "substring not found".to_owned(),
                })),
                i => Ok(Value::from(i)),
            }
        },
    );

    add_method(
        env,
        "string",
        "format",
        FunctionSignature::new()
            .required("this")
            .with_args("args")
            .with_kwargs("kwargs"),
        |_, args| {
            let this = get_string(&args[0])?;
            let positional = args[1].to_vec()?;
            let mut kwargs = LinkedHashMap::new();
            for k in args[2].to_vec()? {
                let name = get_string(&k)?;
                kwargs.insert(name, args[2].at(k)?);
            }
            Ok(Value::from(format(&this, positional, kwargs)?))
        },
    );

    add_method(
        env,
        "string",
        "join",
        FunctionSignature::new().required("this").required("iterable"),
        |_, args| {
            let sep = get_string(&args[0])?;
            let mut parts = Vec::new();
            for v in args[1].to_vec()? {
                match v.downcast_ref::<String>() {
                    Some(s) => parts.push(s.clone()),
                    None => {
                        return Err(ValueError::Runtime(RuntimeError {
                            code: JOIN_EXPECTS_STRINGS_ERROR_CODE,
                            message: format!(
                                "join(): expected a string element, got {}",
                                v.get_type()
                            ),
                            label: "expected a string".to_owned(),
                        }))
                    }
                }
            }
            Ok(Value::from(parts.join(&sep)))
        },
    );

    add_method(
        env,
        "string",
        "lower",
        FunctionSignature::new().required("this"),
        |_, args| Ok(Value::from(get_string(&args[0])?.to_lowercase())),
    );

    add_method(
        env,
        "string",
        "upper",
        FunctionSignature::new().required("this"),
        |_, args| Ok(Value::from(get_string(&args[0])?.to_uppercase())),
    );

    add_method(
        env,
        "string",
        "title",
        FunctionSignature::new().required("this"),
        |_, args| {
            let s = get_string(&args[0])?;
            let mut result = String::with_capacity(s.len());
            let mut at_word_start = true;
            for c in s.chars() {
                if c.is_alphabetic() {
                    if at_word_start {
                        result.extend(c.to_uppercase());
                    } else {
                        result.extend(c.to_lowercase());
                    }
                    at_word_start = false;
                } else {
                    result.push(c);
                    at_word_start = true;
                }
            }
            Ok(Value::from(result))
        },
    );

    add_method(
        env,
        "string",
        "strip",
        FunctionSignature::new().required("this"),
        |_, args| Ok(Value::from(get_string(&args[0])?.trim().to_owned())),
    );

    add_method(
        env,
        "string",
        "lstrip",
        FunctionSignature::new().required("this"),
        |_, args| Ok(Value::from(get_string(&args[0])?.trim_start().to_owned())),
    );

    add_method(
        env,
        "string",
        "rstrip",
        FunctionSignature::new().required("this"),
        |_, args| Ok(Value::from(get_string(&args[0])?.trim_end().to_owned())),
    );

    add_method(
        env,
        "string",
        "replace",
        FunctionSignature::new()
            .required("this")
            .required("old")
            .required("new"),
        |_, args| {
            let s = get_string(&args[0])?;
            let old = get_string(&args[1])?;
            let new = get_string(&args[2])?;
            Ok(Value::from(s.replace(old.as_str(), new.as_str())))
        },
    );

    add_method(
        env,
        "string",
        "split",
        FunctionSignature::new()
            .required("this")
            .optional("sep", none()),
        |_, args| split_impl(&args[0], &args[1]),
    );

    add_method(
        env,
        "string",
        "rsplit",
        FunctionSignature::new()
            .required("this")
            .optional("sep", none()),
        |_, args| split_impl(&args[0], &args[1]),
    );

    add_method(
        env,
        "string",
        "splitlines",
        FunctionSignature::new().required("this"),
        |_, args| {
            let s = get_string(&args[0])?;
            strings_to_list(s.lines().map(str::to_owned))
        },
    );
}

/// Without a separator, split on runs of whitespace and drop empties; with
/// one, split on each occurrence and keep empties.
fn split_impl(this: &Value, sep: &Value) -> ValueResult {
    let s = get_string(this)?;
    if is_none(sep) {
        return strings_to_list(s.split_whitespace().map(str::to_owned));
    }
    let sep = get_string(sep)?;
    if sep.is_empty() {
        return Err(ValueError::IncorrectParameterType);
    }
    strings_to_list(s.split(sep.as_str()).map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use crate::stdlib::global_environment;
    use crate::values::Value;

    #[test]
    fn methods_are_registered_for_strings_only() {
        let env = global_environment();
        assert!(env
            .get_type_value(&Value::from("x"), "startswith")
            .is_some());
        assert!(env.get_type_value(&Value::from(1), "startswith").is_none());
    }
}
