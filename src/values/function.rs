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

//! Callable values: language-defined functions and lambdas, host-provided
//! native functions, and methods bound to a receiver.

use crate::eval::module::Module;
use crate::eval::CallContext;
use crate::resolve::ScopeInfo;
use crate::syntax::ast::{AstExpr, AstStatement};
use crate::values::cell::ValueCell;
use crate::values::dict::Dictionary;
use crate::values::error::{RuntimeError, ValueError};
use crate::values::tuple::Tuple;
use crate::values::{freeze_cells, FunctionId, TypedValue, Value, ValueResult};
use codemap::CodeMap;
use linked_hash_map::LinkedHashMap;
use std::fmt;
use std::fmt::Write as _;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

// Error codes -- CF = Critical Function call
const NOT_ENOUGH_PARAMS_ERROR_CODE: &str = "CF00";
const DUPLICATE_ARGUMENT_ERROR_CODE: &str = "CF01";
const UNEXPECTED_KEYWORD_ARGUMENT_ERROR_CODE: &str = "CF02";
const EXTRA_POSITIONAL_ERROR_CODE: &str = "CF03";
const ARGS_NOT_ITERABLE_ERROR_CODE: &str = "CF04";
const KWARGS_NOT_MAPPABLE_ERROR_CODE: &str = "CF05";
const KWARGS_KEY_NOT_STRING_ERROR_CODE: &str = "CF06";

/// One declared parameter with its optional default value.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<Value>,
}

impl Param {
    fn required(name: &str) -> Param {
        Param {
            name: name.to_owned(),
            default: None,
        }
    }

    fn with_default(name: &str, default: Value) -> Param {
        Param {
            name: name.to_owned(),
            default: Some(default),
        }
    }
}

/// The normalized signature of a callable: positional-or-keyword
/// parameters, an optional `*args` rest, keyword-only parameters, and an
/// optional `**kwargs` rest.
#[derive(Debug, Clone, Default)]
pub struct FunctionSignature {
    positional: Vec<Param>,
    args: Option<String>,
    named_only: Vec<Param>,
    kwargs: Option<String>,
}

impl FunctionSignature {
    pub fn new() -> FunctionSignature {
        Default::default()
    }

    /// Builder: a required positional-or-keyword parameter.
    pub fn required(mut self, name: &str) -> FunctionSignature {
        self.positional.push(Param::required(name));
        self
    }

    /// Builder: a defaulted positional-or-keyword parameter.
    pub fn optional(mut self, name: &str, default: Value) -> FunctionSignature {
        self.positional.push(Param::with_default(name, default));
        self
    }

    /// Builder: the `*args` rest parameter.
    pub fn with_args(mut self, name: &str) -> FunctionSignature {
        self.args = Some(name.to_owned());
        self
    }

    /// Builder: a required keyword-only parameter.
    pub fn named(mut self, name: &str) -> FunctionSignature {
        self.named_only.push(Param::required(name));
        self
    }

    /// Builder: a defaulted keyword-only parameter.
    pub fn named_optional(mut self, name: &str, default: Value) -> FunctionSignature {
        self.named_only.push(Param::with_default(name, default));
        self
    }

    /// Builder: the `**kwargs` rest parameter.
    pub fn with_kwargs(mut self, name: &str) -> FunctionSignature {
        self.kwargs = Some(name.to_owned());
        self
    }

    /// The number of values `bind` produces: one per declared parameter in
    /// declaration order, with `*args` as a tuple and `**kwargs` as a dict.
    pub fn slot_count(&self) -> usize {
        self.positional.len()
            + self.named_only.len()
            + self.args.iter().count()
            + self.kwargs.iter().count()
    }

    /// Every default value of the signature, for freezing.
    fn visit_defaults(&self, visitor: &mut dyn FnMut(&Value)) {
        for p in self.positional.iter().chain(self.named_only.iter()) {
            if let Some(d) = &p.default {
                visitor(d);
            }
        }
    }

    /// Bind call-site arguments to declared parameters.
    ///
    /// Positional arguments fill positional parameters in order, surplus
    /// going to `*args`; named arguments fill parameters by name, surplus
    /// going to `**kwargs`; remaining unbound parameters take their default
    /// values. Missing, duplicate and unexpected arguments are distinct
    /// errors.
    pub fn bind(
        &self,
        function_type: &FunctionType,
        positional: Vec<Value>,
        named: LinkedHashMap<String, Value>,
        args: Option<Value>,
        kwargs: Option<Value>,
    ) -> Result<Vec<Value>, ValueError> {
        let mut av = positional;
        if let Some(x) = args {
            match x.to_vec() {
                Ok(items) => av.extend(items),
                Err(..) => return Err(FunctionError::ArgsArrayIsNotIterable.into()),
            }
        }
        let mut named = named;
        if let Some(x) = kwargs {
            let keys = x
                .to_vec()
                .map_err(|_| ValueError::from(FunctionError::KWArgsDictIsNotMappable))?;
            for k in keys {
                let name = match k.downcast_ref::<String>() {
                    Some(s) => s.clone(),
                    None => return Err(FunctionError::KWArgsKeyIsNotString.into()),
                };
                let v = x
                    .at(k)
                    .map_err(|_| ValueError::from(FunctionError::KWArgsDictIsNotMappable))?;
                if named.insert(name.clone(), v).is_some() {
                    return Err(FunctionError::DuplicateArgument(name).into());
                }
            }
        }

        let mut pos_slots: Vec<Option<Value>> = vec![None; self.positional.len()];
        let mut extra = Vec::new();
        for (i, v) in av.into_iter().enumerate() {
            if i < pos_slots.len() {
                pos_slots[i] = Some(v);
            } else if self.args.is_some() {
                extra.push(v);
            } else {
                return Err(FunctionError::ExtraPositionalParameters {
                    function_type: function_type.clone(),
                    signature: self.clone(),
                }
                .into());
            }
        }

        let mut named_slots: Vec<Option<Value>> = vec![None; self.named_only.len()];
        let mut kw_extra: LinkedHashMap<String, Value> = LinkedHashMap::new();
        for (name, v) in named {
            if let Some(i) = self.positional.iter().position(|p| p.name == name) {
                if pos_slots[i].is_some() {
                    return Err(FunctionError::DuplicateArgument(name).into());
                }
                pos_slots[i] = Some(v);
            } else if let Some(i) = self.named_only.iter().position(|p| p.name == name) {
                if named_slots[i].is_some() {
                    return Err(FunctionError::DuplicateArgument(name).into());
                }
                named_slots[i] = Some(v);
            } else if self.kwargs.is_some() {
                kw_extra.insert(name, v);
            } else {
                return Err(FunctionError::UnexpectedKeywordArgument(name).into());
            }
        }

        let mut result = Vec::with_capacity(self.slot_count());
        for (slot, p) in pos_slots.iter_mut().zip(self.positional.iter()) {
            match slot.take().or_else(|| p.default.clone()) {
                Some(v) => result.push(v),
                None => {
                    return Err(FunctionError::NotEnoughParameter {
                        missing: p.name.clone(),
                        function_type: function_type.clone(),
                        signature: self.clone(),
                    }
                    .into())
                }
            }
        }
        if self.args.is_some() {
            result.push(Value::new(Tuple::new(extra)));
        }
        for (slot, p) in named_slots.iter_mut().zip(self.named_only.iter()) {
            match slot.take().or_else(|| p.default.clone()) {
                Some(v) => result.push(v),
                None => {
                    return Err(FunctionError::NotEnoughParameter {
                        missing: p.name.clone(),
                        function_type: function_type.clone(),
                        signature: self.clone(),
                    }
                    .into())
                }
            }
        }
        if self.kwargs.is_some() {
            let mut d = Dictionary::new_typed();
            for (k, v) in kw_extra {
                d.insert(Value::from(k), v)?;
            }
            result.push(Value::new(d));
        }
        Ok(result)
    }
}

/// How the callable was defined; used in its printed forms.
#[derive(Debug, Clone)]
pub enum FunctionType {
    /// A host-provided function.
    Native(String),
    /// A `def` (or lambda), with the name of the module defining it.
    Def(String, String),
}

impl FunctionType {
    fn to_str(&self) -> String {
        match self {
            FunctionType::Native(name) => name.clone(),
            FunctionType::Def(name, ..) => name.clone(),
        }
    }

    fn to_repr(&self) -> String {
        match self {
            FunctionType::Native(name) => format!("<native function {}>", name),
            FunctionType::Def(name, module) => format!("<function {} from {}>", name, module),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FunctionError {
    NotEnoughParameter {
        missing: String,
        function_type: FunctionType,
        signature: FunctionSignature,
    },
    DuplicateArgument(String),
    UnexpectedKeywordArgument(String),
    ExtraPositionalParameters {
        function_type: FunctionType,
        signature: FunctionSignature,
    },
    ArgsArrayIsNotIterable,
    KWArgsDictIsNotMappable,
    KWArgsKeyIsNotString,
}

impl From<FunctionError> for RuntimeError {
    fn from(e: FunctionError) -> RuntimeError {
        RuntimeError {
            code: match e {
                FunctionError::NotEnoughParameter { .. } => NOT_ENOUGH_PARAMS_ERROR_CODE,
                FunctionError::DuplicateArgument(..) => DUPLICATE_ARGUMENT_ERROR_CODE,
                FunctionError::UnexpectedKeywordArgument(..) => {
                    UNEXPECTED_KEYWORD_ARGUMENT_ERROR_CODE
                }
                FunctionError::ExtraPositionalParameters { .. } => EXTRA_POSITIONAL_ERROR_CODE,
                FunctionError::ArgsArrayIsNotIterable => ARGS_NOT_ITERABLE_ERROR_CODE,
                FunctionError::KWArgsDictIsNotMappable => KWARGS_NOT_MAPPABLE_ERROR_CODE,
                FunctionError::KWArgsKeyIsNotString => KWARGS_KEY_NOT_STRING_ERROR_CODE,
            },
            label: match &e {
                FunctionError::NotEnoughParameter { .. } => {
                    "Not enough arguments in function call".to_owned()
                }
                FunctionError::DuplicateArgument(name) => {
                    format!("Argument '{}' is passed more than once", name)
                }
                FunctionError::UnexpectedKeywordArgument(name) => {
                    format!("Unexpected keyword argument '{}'", name)
                }
                FunctionError::ExtraPositionalParameters { .. } => {
                    "Too many positional arguments in function call".to_owned()
                }
                FunctionError::ArgsArrayIsNotIterable => "*args is not iterable".to_owned(),
                FunctionError::KWArgsDictIsNotMappable => "**kwargs is not mappable".to_owned(),
                FunctionError::KWArgsKeyIsNotString => {
                    "**kwargs contains a non-string key".to_owned()
                }
            },
            message: match &e {
                FunctionError::NotEnoughParameter {
                    missing,
                    function_type,
                    signature,
                } => format!(
                    "Missing argument '{}' for call to {}",
                    missing,
                    repr(function_type, signature)
                ),
                FunctionError::DuplicateArgument(name) => format!(
                    "Function received an argument '{}' both by position and by name",
                    name
                ),
                FunctionError::UnexpectedKeywordArgument(name) => format!(
                    "Function does not accept a keyword argument named '{}'",
                    name
                ),
                FunctionError::ExtraPositionalParameters {
                    function_type,
                    signature,
                } => format!(
                    "Too many positional arguments for call to {}",
                    repr(function_type, signature)
                ),
                FunctionError::ArgsArrayIsNotIterable => {
                    "The argument provided for *args is not iterable".to_owned()
                }
                FunctionError::KWArgsDictIsNotMappable => {
                    "The argument provided for **kwargs is not mappable".to_owned()
                }
                FunctionError::KWArgsKeyIsNotString => {
                    "The **kwargs dictionary contains a key that is not a string".to_owned()
                }
            },
        }
    }
}

impl From<FunctionError> for ValueError {
    fn from(e: FunctionError) -> ValueError {
        ValueError::Runtime(e.into())
    }
}

pub(crate) enum StrOrRepr {
    Str,
    Repr,
}

pub(crate) fn str_impl(
    buf: &mut String,
    function_type: &FunctionType,
    signature: &FunctionSignature,
    str_or_repr: StrOrRepr,
) -> fmt::Result {
    write!(
        buf,
        "{}",
        match str_or_repr {
            StrOrRepr::Str => function_type.to_str(),
            StrOrRepr::Repr => function_type.to_repr(),
        }
    )?;
    write!(buf, "(")?;
    let mut first = true;
    let mut sep = |buf: &mut String| -> fmt::Result {
        if !first {
            buf.push_str(", ");
        }
        first = false;
        Ok(())
    };
    for p in &signature.positional {
        sep(buf)?;
        match &p.default {
            None => write!(buf, "{}", p.name)?,
            Some(d) => write!(buf, "{} = {}", p.name, d.to_repr())?,
        }
    }
    match &signature.args {
        Some(name) => {
            sep(buf)?;
            write!(buf, "*{}", name)?;
        }
        None => {
            if !signature.named_only.is_empty() {
                sep(buf)?;
                write!(buf, "*")?;
            }
        }
    }
    for p in &signature.named_only {
        sep(buf)?;
        match &p.default {
            None => write!(buf, "{}", p.name)?,
            Some(d) => write!(buf, "{} = {}", p.name, d.to_repr())?,
        }
    }
    if let Some(name) = &signature.kwargs {
        sep(buf)?;
        write!(buf, "**{}", name)?;
    }
    write!(buf, ")")?;
    Ok(())
}

pub(crate) fn repr(function_type: &FunctionType, signature: &FunctionSignature) -> String {
    let mut buf = String::new();
    str_impl(&mut buf, function_type, signature, StrOrRepr::Repr).unwrap();
    buf
}

/// A host-provided function participating in the object protocol.
pub struct NativeFunction {
    function: Box<dyn Fn(&mut CallContext<'_>, Vec<Value>) -> ValueResult>,
    signature: FunctionSignature,
    function_type: FunctionType,
}

impl NativeFunction {
    pub fn new<F>(name: &str, signature: FunctionSignature, function: F) -> Value
    where
        F: Fn(&mut CallContext<'_>, Vec<Value>) -> ValueResult + 'static,
    {
        Value::new(NativeFunction {
            function: Box::new(function),
            signature,
            function_type: FunctionType::Native(name.to_owned()),
        })
    }
}

impl TypedValue for NativeFunction {
    any!();

    fn get_type(&self) -> &'static str {
        "function"
    }

    fn to_str_impl(&self, buf: &mut String) -> fmt::Result {
        str_impl(buf, &self.function_type, &self.signature, StrOrRepr::Str)
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        str_impl(buf, &self.function_type, &self.signature, StrOrRepr::Repr)
    }

    fn get_hash(&self) -> Result<u64, ValueError> {
        Ok(self as *const NativeFunction as usize as u64)
    }

    fn call(
        &self,
        ctx: &mut CallContext,
        positional: Vec<Value>,
        named: LinkedHashMap<String, Value>,
        args: Option<Value>,
        kwargs: Option<Value>,
    ) -> ValueResult {
        let bound = self
            .signature
            .bind(&self.function_type, positional, named, args, kwargs)?;
        (self.function)(ctx, bound)
    }
}

/// A method bound to the object it was selected from: `"a".startswith`.
pub struct WrappedMethod {
    method: Value,
    self_obj: Value,
}

impl WrappedMethod {
    pub fn new(self_obj: Value, method: Value) -> Value {
        Value::new(WrappedMethod { method, self_obj })
    }
}

impl TypedValue for WrappedMethod {
    any!();

    fn get_type(&self) -> &'static str {
        "function"
    }

    fn to_str_impl(&self, buf: &mut String) -> fmt::Result {
        self.method.to_str_impl(buf)
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        self.method.to_repr_impl(buf)
    }

    fn get_hash(&self) -> Result<u64, ValueError> {
        self.method.get_hash()
    }

    fn function_id(&self) -> Option<FunctionId> {
        self.method.function_id()
    }

    fn has_value_links(&self) -> bool {
        true
    }

    fn visit_links(&self, visitor: &mut dyn FnMut(&Value)) {
        visitor(&self.method);
        visitor(&self.self_obj);
    }

    fn call(
        &self,
        ctx: &mut CallContext,
        positional: Vec<Value>,
        named: LinkedHashMap<String, Value>,
        args: Option<Value>,
        kwargs: Option<Value>,
    ) -> ValueResult {
        // The wrapper inserts the receiver as the first positional argument.
        let positional: Vec<Value> = Some(self.self_obj.clone())
            .into_iter()
            .chain(positional.into_iter())
            .collect();
        self.method.call(ctx, positional, named, args, kwargs)
    }
}

/// The body of a language-defined function: statements for `def`, a single
/// expression for `lambda`. The shared pointer doubles as the function
/// identity for recursion detection.
#[derive(Clone)]
pub(crate) enum FunctionBody {
    Statements(AstStatement),
    Expression(AstExpr),
}

impl FunctionBody {
    fn function_id(&self) -> FunctionId {
        match self {
            FunctionBody::Statements(s) => FunctionId::from_ptr(Rc::as_ptr(s)),
            FunctionBody::Expression(e) => FunctionId::from_ptr(Rc::as_ptr(e)),
        }
    }
}

/// A function defined by `def` or `lambda`: resolved body, evaluated
/// defaults, captured cells and the module it closes over.
pub struct Def {
    signature: FunctionSignature,
    function_type: FunctionType,
    body: FunctionBody,
    scope: ScopeInfo,
    captured: Vec<ValueCell>,
    module: Rc<Module>,
    map: Arc<Mutex<CodeMap>>,
}

impl Def {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        module_name: String,
        signature: FunctionSignature,
        body: FunctionBody,
        scope: ScopeInfo,
        captured: Vec<ValueCell>,
        module: Rc<Module>,
        map: Arc<Mutex<CodeMap>>,
    ) -> Value {
        Value::new(Def {
            signature,
            function_type: FunctionType::Def(name, module_name),
            body,
            scope,
            captured,
            module,
            map,
        })
    }

    pub(crate) fn body(&self) -> &FunctionBody {
        &self.body
    }

    pub(crate) fn scope(&self) -> &ScopeInfo {
        &self.scope
    }

    pub(crate) fn captured(&self) -> &[ValueCell] {
        &self.captured
    }

    pub(crate) fn module(&self) -> &Rc<Module> {
        &self.module
    }

    pub(crate) fn map(&self) -> &Arc<Mutex<CodeMap>> {
        &self.map
    }
}

impl TypedValue for Def {
    any!();

    fn get_type(&self) -> &'static str {
        "function"
    }

    fn to_str_impl(&self, buf: &mut String) -> fmt::Result {
        str_impl(buf, &self.function_type, &self.signature, StrOrRepr::Str)
    }

    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        str_impl(buf, &self.function_type, &self.signature, StrOrRepr::Repr)
    }

    fn get_hash(&self) -> Result<u64, ValueError> {
        Ok(self as *const Def as usize as u64)
    }

    fn function_id(&self) -> Option<FunctionId> {
        Some(self.body.function_id())
    }

    fn has_value_links(&self) -> bool {
        true
    }

    fn visit_links(&self, visitor: &mut dyn FnMut(&Value)) {
        self.signature.visit_defaults(visitor);
    }

    /// Freezing a function freezes its default values and its captured
    /// cells (the "captured state" of the closure).
    fn freeze(&self) {
        self.visit_links(&mut |v| v.freeze());
        freeze_cells(&self.captured);
    }

    fn call(
        &self,
        ctx: &mut CallContext,
        positional: Vec<Value>,
        named: LinkedHashMap<String, Value>,
        args: Option<Value>,
        kwargs: Option<Value>,
    ) -> ValueResult {
        let bound = self
            .signature
            .bind(&self.function_type, positional, named, args, kwargs)?;
        crate::eval::eval_def_call(self, ctx, bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ft() -> FunctionType {
        FunctionType::Native("f".to_owned())
    }

    fn named(pairs: &[(&str, i64)]) -> LinkedHashMap<String, Value> {
        let mut m = LinkedHashMap::new();
        for (k, v) in pairs {
            m.insert((*k).to_owned(), Value::from(*v));
        }
        m
    }

    fn reprs(values: Vec<Value>) -> Vec<String> {
        values.into_iter().map(|v| v.to_repr()).collect()
    }

    #[test]
    fn positional_binding() {
        let sig = FunctionSignature::new().required("a").optional("b", Value::from(9));
        assert_eq!(
            vec!["1", "2"],
            reprs(
                sig.bind(&ft(), vec![Value::from(1), Value::from(2)], named(&[]), None, None)
                    .unwrap()
            )
        );
        assert_eq!(
            vec!["1", "9"],
            reprs(sig.bind(&ft(), vec![Value::from(1)], named(&[]), None, None).unwrap())
        );
    }

    #[test]
    fn named_binding_and_star_args() {
        let sig = FunctionSignature::new()
            .required("a")
            .with_args("rest")
            .named("k")
            .with_kwargs("kw");
        let bound = sig
            .bind(
                &ft(),
                vec![Value::from(1), Value::from(2), Value::from(3)],
                named(&[("k", 4), ("z", 5)]),
                None,
                None,
            )
            .unwrap();
        assert_eq!(vec!["1", "(2, 3)", "4", "{\"z\": 5}"], reprs(bound));
    }

    #[test]
    fn binding_errors_are_distinct() {
        let sig = FunctionSignature::new().required("a");
        // Missing.
        let missing = sig.bind(&ft(), vec![], named(&[]), None, None);
        match missing {
            Err(ValueError::Runtime(e)) => assert_eq!(NOT_ENOUGH_PARAMS_ERROR_CODE, e.code),
            _ => panic!("expected a missing-argument error"),
        }
        // Duplicate.
        let dup = sig.bind(&ft(), vec![Value::from(1)], named(&[("a", 2)]), None, None);
        match dup {
            Err(ValueError::Runtime(e)) => assert_eq!(DUPLICATE_ARGUMENT_ERROR_CODE, e.code),
            _ => panic!("expected a duplicate-argument error"),
        }
        // Unexpected keyword.
        let unexpected = sig.bind(&ft(), vec![Value::from(1)], named(&[("b", 2)]), None, None);
        match unexpected {
            Err(ValueError::Runtime(e)) => {
                assert_eq!(UNEXPECTED_KEYWORD_ARGUMENT_ERROR_CODE, e.code)
            }
            _ => panic!("expected an unexpected-keyword error"),
        }
        // Too many positional.
        let extra = sig.bind(
            &ft(),
            vec![Value::from(1), Value::from(2)],
            named(&[]),
            None,
            None,
        );
        match extra {
            Err(ValueError::Runtime(e)) => assert_eq!(EXTRA_POSITIONAL_ERROR_CODE, e.code),
            _ => panic!("expected a too-many-positional error"),
        }
    }

    #[test]
    fn splat_arguments() {
        let sig = FunctionSignature::new().required("a").required("b");
        let args = Value::from(vec![1, 2]);
        assert_eq!(
            vec!["1", "2"],
            reprs(sig.bind(&ft(), vec![], named(&[]), Some(args), None).unwrap())
        );
        let kwargs = Dictionary::new();
        kwargs.set_at(Value::from("b"), Value::from(2)).unwrap();
        assert_eq!(
            vec!["1", "2"],
            reprs(
                sig.bind(&ft(), vec![Value::from(1)], named(&[]), None, Some(kwargs))
                    .unwrap()
            )
        );
    }

    #[test]
    fn kwargs_key_collision_is_duplicate() {
        let sig = FunctionSignature::new().required("a").with_kwargs("kw");
        let kwargs = Dictionary::new();
        kwargs.set_at(Value::from("x"), Value::from(2)).unwrap();
        let r = sig.bind(
            &ft(),
            vec![Value::from(1)],
            named(&[("x", 1)]),
            None,
            Some(kwargs),
        );
        match r {
            Err(ValueError::Runtime(e)) => assert_eq!(DUPLICATE_ARGUMENT_ERROR_CODE, e.code),
            _ => panic!("expected a duplicate-argument error"),
        }
    }

    #[test]
    fn signature_repr() {
        let sig = FunctionSignature::new()
            .required("a")
            .optional("b", Value::from(1))
            .with_args("args")
            .named("c")
            .with_kwargs("kw");
        assert_eq!(
            "<native function f>(a, b = 1, *args, c, **kw)",
            repr(&ft(), &sig)
        );
        let sig2 = FunctionSignature::new().required("a").named("c");
        assert_eq!("<native function f>(a, *, c)", repr(&ft(), &sig2));
    }
}
