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

//! The universal block: constants and functions available to every module,
//! plus the per-type methods registered on the environment.

pub mod dict;
pub mod list;
pub mod set;
pub mod string;

use crate::environment::Environment;
use crate::eval::CallContext;
use crate::values::dict::Dictionary;
use crate::values::error::{RuntimeError, ValueError};
use crate::values::function::{FunctionSignature, NativeFunction, WrappedMethod};
use crate::values::list::List;
use crate::values::none::NoneType;
use crate::values::range::Range;
use crate::values::set::Set;
use crate::values::string::hash_string;
use crate::values::tuple::Tuple;
use crate::values::{Value, ValueResult};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, ToPrimitive};
use std::cmp::Ordering;
use std::num::NonZeroI64;

// Error codes -- CR = Critical Runtime
const CHR_NOT_CODEPOINT_ERROR_CODE: &str = "CR00";
const DICT_ITERABLE_NOT_PAIRS_ERROR_CODE: &str = "CR01";
const HASH_NOT_STRING_ERROR_CODE: &str = "CR02";
const INT_CONVERSION_FAILED_ERROR_CODE: &str = "CR03";
const ORD_EXPECT_ONE_CHAR_ERROR_CODE: &str = "CR04";
const EMPTY_ITERABLE_ERROR_CODE: &str = "CR05";
const NUL_RANGE_STEP_ERROR_CODE: &str = "CR06";
const FLOAT_CONVERSION_FAILED_ERROR_CODE: &str = "CR07";
const USER_FAILURE_ERROR_CODE: &str = "CR99";

/// Return early with a runtime error.
macro_rules! starlark_err {
    ($code:expr, $message:expr, $label:expr) => {
        return Err(ValueError::Runtime(RuntimeError {
            code: $code,
            message: $message,
            label: $label,
        }))
    };
}

pub(crate) fn add_function<F>(
    env: &Environment,
    name: &str,
    signature: FunctionSignature,
    function: F,
) where
    F: Fn(&mut CallContext<'_>, Vec<Value>) -> ValueResult + 'static,
{
    // The environment is freshly created and not frozen yet.
    env.set(name, NativeFunction::new(name, signature, function))
        .unwrap();
}

pub(crate) fn add_method<F>(
    env: &Environment,
    type_name: &str,
    name: &str,
    signature: FunctionSignature,
    function: F,
) where
    F: Fn(&mut CallContext<'_>, Vec<Value>) -> ValueResult + 'static,
{
    env.add_type_value(type_name, name, NativeFunction::new(name, signature, function));
}

pub(crate) fn is_none(v: &Value) -> bool {
    v.get_type() == "NoneType"
}

pub(crate) fn none() -> Value {
    Value::new(NoneType::None)
}

pub(crate) fn get_string(v: &Value) -> Result<String, ValueError> {
    match v.downcast_ref::<String>() {
        Some(s) => Ok(s.clone()),
        None => Err(ValueError::IncorrectParameterType),
    }
}

pub(crate) fn get_int(v: &Value) -> Result<BigInt, ValueError> {
    match v.downcast_ref::<BigInt>() {
        Some(i) => Ok(i.clone()),
        None => Err(ValueError::IncorrectParameterType),
    }
}

pub(crate) fn get_i64(v: &Value) -> Result<i64, ValueError> {
    get_int(v)?.to_i64().ok_or(ValueError::IntegerOverflow)
}

/// The sentinel native functions use to detect an omitted argument where
/// `None` is itself meaningful.
struct AbsentMarker;

impl crate::values::TypedValue for AbsentMarker {
    any!();

    fn get_type(&self) -> &'static str {
        "absent"
    }

    fn to_repr_impl(&self, buf: &mut String) -> std::fmt::Result {
        buf.push_str("<absent>");
        Ok(())
    }
}

pub(crate) fn absent() -> Value {
    Value::new(AbsentMarker)
}

pub(crate) fn is_absent(v: &Value) -> bool {
    v.get_type() == "absent"
}

fn int_from_str(s: &str, base: u32) -> Result<BigInt, ValueError> {
    let trimmed = s.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = match base {
        16 => rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")).unwrap_or(rest),
        8 => rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")).unwrap_or(rest),
        2 => rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")).unwrap_or(rest),
        _ => rest,
    };
    if digits.is_empty() {
        starlark_err!(
            INT_CONVERSION_FAILED_ERROR_CODE,
            format!("Cannot parse '{}' as an integer in base {}", s, base),
            "not a valid integer".to_owned()
        );
    }
    match BigInt::parse_bytes(digits.as_bytes(), base) {
        Some(i) => Ok(if negative { -i } else { i }),
        None => {
            starlark_err!(
                INT_CONVERSION_FAILED_ERROR_CODE,
                format!("Cannot parse '{}' as an integer in base {}", s, base),
                "not a valid integer".to_owned()
            );
        }
    }
}

fn empty_iterable_error(what: &str) -> ValueError {
    ValueError::Runtime(RuntimeError {
        code: EMPTY_ITERABLE_ERROR_CODE,
        message: format!("{}: the iterable is empty", what),
        label: "empty iterable".to_owned(),
    })
}

/// Select the extreme of an iterable (or of direct arguments) under an
/// optional key function.
fn extremum(
    ctx: &mut CallContext<'_>,
    args: Value,
    key: Value,
    want: Ordering,
    what: &str,
) -> ValueResult {
    let direct = args.to_vec()?;
    let candidates = if direct.len() == 1 {
        direct[0].to_vec()?
    } else {
        direct
    };
    let mut best: Option<(Value, Value)> = None;
    for c in candidates {
        let k = if is_none(&key) {
            c.clone()
        } else {
            key.call(ctx, vec![c.clone()], Default::default(), None, None)?
        };
        best = match best {
            None => Some((k, c)),
            Some((bk, bv)) => {
                if k.compare(&bk)? == want {
                    Some((k, c))
                } else {
                    Some((bk, bv))
                }
            }
        };
    }
    match best {
        Some((_, v)) => Ok(v),
        None => Err(empty_iterable_error(what)),
    }
}

/// Build the universal environment: the constants, functions and methods
/// every dialect starts from. The host may bind further predeclared names
/// before freezing it.
pub fn global_environment() -> Environment {
    let env = Environment::new("global");
    env.set("None", none()).unwrap();
    env.set("True", Value::from(true)).unwrap();
    env.set("False", Value::from(false)).unwrap();

    add_function(
        &env,
        "any",
        FunctionSignature::new().required("x"),
        |_, args| {
            for v in args[0].iter()? {
                if v.to_bool() {
                    return Ok(Value::from(true));
                }
            }
            Ok(Value::from(false))
        },
    );

    add_function(
        &env,
        "all",
        FunctionSignature::new().required("x"),
        |_, args| {
            for v in args[0].iter()? {
                if !v.to_bool() {
                    return Ok(Value::from(false));
                }
            }
            Ok(Value::from(true))
        },
    );

    add_function(
        &env,
        "bool",
        FunctionSignature::new().optional("x", Value::from(false)),
        |_, args| Ok(Value::from(args[0].to_bool())),
    );

    add_function(
        &env,
        "chr",
        FunctionSignature::new().required("i"),
        |_, args| {
            let cp = get_int(&args[0])?;
            match cp.to_u32().and_then(std::char::from_u32) {
                Some(c) => Ok(Value::from(c.to_string())),
                None => starlark_err!(
                    CHR_NOT_CODEPOINT_ERROR_CODE,
                    format!("chr(): {} is not a valid code point", cp),
                    "not a valid code point".to_owned()
                ),
            }
        },
    );

    add_function(
        &env,
        "ord",
        FunctionSignature::new().required("c"),
        |_, args| {
            let s = get_string(&args[0])?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::from(c as u32 as i64)),
                _ => starlark_err!(
                    ORD_EXPECT_ONE_CHAR_ERROR_CODE,
                    format!("ord(): expected a single-character string, got {:?}", s),
                    "expected a single character".to_owned()
                ),
            }
        },
    );

    add_function(
        &env,
        "dict",
        FunctionSignature::new()
            .optional("a", none())
            .with_kwargs("kwargs"),
        |_, args| {
            let mut result = Dictionary::new_typed();
            if !is_none(&args[0]) {
                if args[0].get_type() == "dict" {
                    for k in args[0].to_vec()? {
                        let v = args[0].at(k.clone())?;
                        result.insert(k, v)?;
                    }
                } else {
                    for pair in args[0].to_vec()? {
                        let kv = pair.to_vec().map_err(|_| {
                            ValueError::Runtime(RuntimeError {
                                code: DICT_ITERABLE_NOT_PAIRS_ERROR_CODE,
                                message: format!(
                                    "dict(): found a non-pair element {}",
                                    pair.to_repr()
                                ),
                                label: "not a pair".to_owned(),
                            })
                        })?;
                        if kv.len() != 2 {
                            starlark_err!(
                                DICT_ITERABLE_NOT_PAIRS_ERROR_CODE,
                                format!("dict(): found a non-pair element {}", pair.to_repr()),
                                "not a pair".to_owned()
                            );
                        }
                        result.insert(kv[0].clone(), kv[1].clone())?;
                    }
                }
            }
            for (k, v) in args[1].to_vec()?.into_iter().map(|k| {
                let v = args[1].at(k.clone());
                (k, v)
            }) {
                result.insert(k, v?)?;
            }
            Ok(Value::new(result))
        },
    );

    add_function(
        &env,
        "dir",
        FunctionSignature::new().required("x"),
        |ctx, args| {
            let mut names = ctx.env.list_type_value(&args[0]);
            for n in args[0].dir_attr()? {
                if !names.contains(&n) {
                    names.push(n);
                }
            }
            names.sort();
            Ok(Value::new(List::from_values(
                names.into_iter().map(Value::from).collect(),
            )))
        },
    );

    add_function(
        &env,
        "enumerate",
        FunctionSignature::new()
            .required("x")
            .optional("start", Value::from(0)),
        |_, args| {
            let start = get_i64(&args[1])?;
            let mut result = Vec::new();
            for (i, v) in args[0].to_vec()?.into_iter().enumerate() {
                result.push(Value::new(Tuple::new(vec![
                    Value::from(start + i as i64),
                    v,
                ])));
            }
            Ok(Value::new(List::from_values(result)))
        },
    );

    add_function(
        &env,
        "fail",
        FunctionSignature::new().optional("msg", none()),
        |ctx, args| {
            starlark_err!(
                USER_FAILURE_ERROR_CODE,
                format!(
                    "fail(): {}{}",
                    args[0].to_str(),
                    ctx.thread.call_stack.print_with_newline_before()
                ),
                args[0].to_str()
            )
        },
    );

    add_function(
        &env,
        "float",
        FunctionSignature::new().optional("x", none()),
        |_, args| {
            let x = &args[0];
            if is_none(x) {
                return Ok(Value::from(0.0));
            }
            if let Some(f) = x.downcast_ref::<f64>() {
                return Ok(Value::from(*f));
            }
            if let Some(i) = x.downcast_ref::<BigInt>() {
                return Ok(Value::from(i.to_f64().unwrap_or_else(|| {
                    if i.is_negative() {
                        f64::NEG_INFINITY
                    } else {
                        f64::INFINITY
                    }
                })));
            }
            if let Some(b) = x.downcast_ref::<bool>() {
                return Ok(Value::from(if *b { 1.0 } else { 0.0 }));
            }
            if let Some(s) = x.downcast_ref::<String>() {
                return match s.trim().parse::<f64>() {
                    Ok(f) => Ok(Value::from(f)),
                    Err(..) => starlark_err!(
                        FLOAT_CONVERSION_FAILED_ERROR_CODE,
                        format!("float(): cannot parse {:?} as a float", &*s),
                        "not a valid float".to_owned()
                    ),
                };
            }
            Err(ValueError::IncorrectParameterType)
        },
    );

    add_function(
        &env,
        "getattr",
        FunctionSignature::new()
            .required("x")
            .required("name")
            .optional("default", absent()),
        |ctx, args| {
            let name = get_string(&args[1])?;
            if let Some(v) = ctx.env.get_type_value(&args[0], &name) {
                if v.get_type() == "function" {
                    return Ok(WrappedMethod::new(args[0].clone(), v));
                }
                return Ok(v);
            }
            match args[0].get_attr(&name) {
                Ok(v) => Ok(v),
                Err(e) => {
                    if is_absent(&args[2]) {
                        Err(e)
                    } else {
                        Ok(args[2].clone())
                    }
                }
            }
        },
    );

    add_function(
        &env,
        "hasattr",
        FunctionSignature::new().required("x").required("name"),
        |ctx, args| {
            let name = get_string(&args[1])?;
            if ctx.env.get_type_value(&args[0], &name).is_some() {
                return Ok(Value::from(true));
            }
            Ok(Value::from(args[0].has_attr(&name)?))
        },
    );

    add_function(
        &env,
        "hash",
        FunctionSignature::new().required("x"),
        |_, args| match args[0].downcast_ref::<String>() {
            Some(s) => Ok(Value::from(hash_string(&s) as i64)),
            None => starlark_err!(
                HASH_NOT_STRING_ERROR_CODE,
                format!("hash(): expected a string, got {}", args[0].get_type()),
                "expected a string".to_owned()
            ),
        },
    );

    add_function(
        &env,
        "int",
        FunctionSignature::new()
            .optional("x", none())
            .optional("base", none()),
        |_, args| {
            let x = &args[0];
            if is_none(x) {
                return Ok(Value::from(0));
            }
            if let Some(s) = x.downcast_ref::<String>() {
                let base = if is_none(&args[1]) {
                    10
                } else {
                    let b = get_i64(&args[1])?;
                    if b < 2 || b > 36 {
                        return Err(ValueError::IncorrectParameterType);
                    }
                    b as u32
                };
                return Ok(Value::new(int_from_str(&s, base)?));
            }
            if !is_none(&args[1]) {
                // A base is only meaningful for string conversion.
                return Err(ValueError::IncorrectParameterType);
            }
            if let Some(i) = x.downcast_ref::<BigInt>() {
                return Ok(Value::new(i.clone()));
            }
            if let Some(b) = x.downcast_ref::<bool>() {
                return Ok(Value::from(if *b { 1 } else { 0 }));
            }
            if let Some(f) = x.downcast_ref::<f64>() {
                return match BigInt::from_f64(f.trunc()) {
                    Some(i) => Ok(Value::new(i)),
                    None => starlark_err!(
                        INT_CONVERSION_FAILED_ERROR_CODE,
                        format!("int(): cannot convert {} to an integer", *f),
                        "not a finite float".to_owned()
                    ),
                };
            }
            Err(ValueError::IncorrectParameterType)
        },
    );

    add_function(
        &env,
        "len",
        FunctionSignature::new().required("x"),
        |_, args| Ok(Value::from(args[0].length()?)),
    );

    add_function(
        &env,
        "list",
        FunctionSignature::new().optional("x", none()),
        |_, args| {
            if is_none(&args[0]) {
                return Ok(List::new());
            }
            Ok(Value::new(List::from_values(args[0].to_vec()?)))
        },
    );

    add_function(
        &env,
        "max",
        FunctionSignature::new()
            .with_args("args")
            .named_optional("key", none()),
        |ctx, args| extremum(ctx, args[0].clone(), args[1].clone(), Ordering::Greater, "max()"),
    );

    add_function(
        &env,
        "min",
        FunctionSignature::new()
            .with_args("args")
            .named_optional("key", none()),
        |ctx, args| extremum(ctx, args[0].clone(), args[1].clone(), Ordering::Less, "min()"),
    );

    add_function(
        &env,
        "print",
        FunctionSignature::new().with_args("args"),
        |ctx, args| {
            let line = args[0]
                .to_vec()?
                .iter()
                .map(Value::to_str)
                .collect::<Vec<String>>()
                .join(" ");
            ctx.thread.print(&line);
            Ok(none())
        },
    );

    add_function(
        &env,
        "range",
        FunctionSignature::new()
            .required("a")
            .optional("b", none())
            .optional("c", none()),
        |_, args| {
            let (start, stop) = if is_none(&args[1]) {
                (0, get_i64(&args[0])?)
            } else {
                (get_i64(&args[0])?, get_i64(&args[1])?)
            };
            let step = if is_none(&args[2]) {
                1
            } else {
                get_i64(&args[2])?
            };
            match NonZeroI64::new(step) {
                Some(step) => Ok(Value::new(Range::new(start, stop, step))),
                None => starlark_err!(
                    NUL_RANGE_STEP_ERROR_CODE,
                    "range(): step cannot be zero".to_owned(),
                    "step cannot be zero".to_owned()
                ),
            }
        },
    );

    add_function(
        &env,
        "repr",
        FunctionSignature::new().required("x"),
        |_, args| Ok(Value::from(args[0].to_repr())),
    );

    add_function(
        &env,
        "reversed",
        FunctionSignature::new().required("x"),
        |_, args| {
            let mut items = args[0].to_vec()?;
            items.reverse();
            Ok(Value::new(List::from_values(items)))
        },
    );

    add_function(
        &env,
        "set",
        FunctionSignature::new().optional("x", none()),
        |_, args| {
            let mut result = Set::new_typed();
            if !is_none(&args[0]) {
                for v in args[0].to_vec()? {
                    result.insert(v)?;
                }
            }
            Ok(Value::new(result))
        },
    );

    add_function(
        &env,
        "sorted",
        FunctionSignature::new()
            .required("x")
            .named_optional("key", none())
            .named_optional("reverse", Value::from(false)),
        |ctx, args| {
            let items = args[0].to_vec()?;
            let key = args[1].clone();
            let mut keyed = Vec::with_capacity(items.len());
            for v in items {
                let k = if is_none(&key) {
                    v.clone()
                } else {
                    key.call(ctx, vec![v.clone()], Default::default(), None, None)?
                };
                keyed.push((k, v));
            }
            let mut error = None;
            keyed.sort_by(|a, b| match a.0.compare(&b.0) {
                Ok(o) => o,
                Err(e) => {
                    if error.is_none() {
                        error = Some(e);
                    }
                    Ordering::Equal
                }
            });
            if let Some(e) = error {
                return Err(e);
            }
            if args[2].to_bool() {
                keyed.reverse();
            }
            Ok(Value::new(List::from_values(
                keyed.into_iter().map(|(_, v)| v).collect(),
            )))
        },
    );

    add_function(
        &env,
        "str",
        FunctionSignature::new().optional("x", Value::from("")),
        |_, args| Ok(Value::from(args[0].to_str())),
    );

    add_function(
        &env,
        "tuple",
        FunctionSignature::new().optional("x", none()),
        |_, args| {
            if is_none(&args[0]) {
                return Ok(Value::new(Tuple::new(Vec::new())));
            }
            Ok(Value::new(Tuple::new(args[0].to_vec()?)))
        },
    );

    add_function(
        &env,
        "type",
        FunctionSignature::new().required("x"),
        |_, args| Ok(Value::from(args[0].get_type())),
    );

    add_function(
        &env,
        "zip",
        FunctionSignature::new().with_args("args"),
        |_, args| {
            let columns: Vec<Vec<Value>> = args[0]
                .to_vec()?
                .into_iter()
                .map(|v| v.to_vec())
                .collect::<Result<_, _>>()?;
            let shortest = columns.iter().map(Vec::len).min().unwrap_or(0);
            let mut result = Vec::with_capacity(shortest);
            for i in 0..shortest {
                result.push(Value::new(Tuple::new(
                    columns.iter().map(|c| c[i].clone()).collect(),
                )));
            }
            Ok(Value::new(List::from_values(result)))
        },
    );

    string::register(&env);
    list::register(&env);
    dict::register(&env);
    set::register(&env);
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_has_the_constants() {
        let env = global_environment();
        assert_eq!("None", env.get("None").unwrap().to_repr());
        assert_eq!("True", env.get("True").unwrap().to_repr());
        assert!(env.get("len").is_ok());
        assert!(env.get("range").is_ok());
        assert!(env.get("nonexistent").is_err());
    }

    #[test]
    fn int_parsing() {
        assert_eq!("255", int_from_str("0xFF", 16).unwrap().to_string());
        assert_eq!("-12", int_from_str(" -12 ", 10).unwrap().to_string());
        assert!(int_from_str("zz", 10).is_err());
    }
}
