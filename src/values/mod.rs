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

//! The value model: a `TypedValue` trait defining the object protocol of
//! every value in the language, and the `Value` handle holding one.
//!
//! `Value` is a cheap-to-clone shared handle; aliasing is the norm (two
//! variables can name the same list). Mutable containers carry a
//! [`Mutability`](mutability/struct.Mutability.html) header implementing the
//! frozen flag and the live-iterator count.
//!
//! Embedders define new kinds by implementing [`TypedValue`]; all protocol
//! methods default to an "operation not supported" error, so a minimal type
//! only provides `any!()`, its type name and its `repr`.

use crate::eval::CallContext;
use crate::values::cell::ValueCell;
use crate::values::error::ValueError;
use crate::values::iter::{IterationGuard, ValueIter};
use crate::values::mutability::Mutability;
use linked_hash_map::LinkedHashMap;
use num_bigint::BigInt;
use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Generate the `as_any`/`as_any_mut` accessors every `TypedValue`
/// implementation needs for downcasting.
#[macro_export]
macro_rules! any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

/// Pointer to the heap cell of a value, used for identity comparison of
/// callables and for cycle checks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DataPtr(usize);

/// Identity of a function body, used to detect recursion: every closure
/// compiled from the same `def` shares one id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FunctionId(pub DataPtr);

impl FunctionId {
    pub(crate) fn from_ptr<T: ?Sized>(ptr: *const T) -> FunctionId {
        FunctionId(DataPtr(ptr as *const () as usize))
    }
}

/// A value in the interpreted language.
///
/// This is a wrapper around a [`TypedValue`] which is cheap to clone and
/// safe to pass around.
#[derive(Clone)]
pub struct Value {
    value: Rc<RefCell<dyn TypedValue>>,
}

pub type ValueResult = Result<Value, ValueError>;

// Containers printing themselves must not recurse forever on cyclic value
// graphs; the visit stack makes `repr` render the knot as `[...]`/`{...}`.
thread_local!(static REPR_STACK: RefCell<Vec<usize>> = RefCell::new(Vec::new()));

// Equality and comparison of deeply nested (or aliased-cyclic) structures
// are depth limited.
thread_local!(static VALUE_DEPTH: Cell<u32> = Cell::new(0));

const MAX_VALUE_RECURSION: u32 = 200;

/// Guard for one level of value recursion (equality, comparison).
#[must_use]
pub(crate) struct StackGuard {
    prev: u32,
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        VALUE_DEPTH.with(|c| c.set(self.prev));
    }
}

pub(crate) fn try_inc() -> Result<StackGuard, ValueError> {
    let prev = VALUE_DEPTH.with(|c| c.get());
    if prev >= MAX_VALUE_RECURSION {
        return Err(ValueError::TooManyRecursionLevel);
    }
    VALUE_DEPTH.with(|c| c.set(prev + 1));
    Ok(StackGuard { prev })
}

/// Guard for printing one container; `enter` returns `None` when the
/// container is already being printed further up the stack.
pub(crate) struct ReprGuard(());

impl ReprGuard {
    pub(crate) fn enter<T: ?Sized>(this: &T) -> Option<ReprGuard> {
        let ptr = this as *const T as *const () as usize;
        REPR_STACK.with(|s| {
            let mut s = s.borrow_mut();
            if s.contains(&ptr) {
                None
            } else {
                s.push(ptr);
                Some(ReprGuard(()))
            }
        })
    }
}

impl Drop for ReprGuard {
    fn drop(&mut self) {
        REPR_STACK.with(|s| {
            s.borrow_mut().pop();
        });
    }
}

/// The object protocol. All values, built-in or embedder-supplied,
/// implement this trait; operations a kind does not provide keep their
/// default "unsupported" implementation.
pub trait TypedValue: 'static {
    /// See the `any!()` macro.
    fn as_any(&self) -> &dyn Any;
    /// See the `any!()` macro.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The type name, as returned by the `type()` function.
    fn get_type(&self) -> &'static str;

    /// The `str()` form; defaults to the `repr()` form.
    fn to_str_impl(&self, buf: &mut String) -> fmt::Result {
        self.to_repr_impl(buf)
    }

    /// The `repr()` form.
    fn to_repr_impl(&self, buf: &mut String) -> fmt::Result;

    /// Truth value, as used by `if` and `bool()`.
    fn to_bool(&self) -> bool {
        true
    }

    /// Machine integer conversion for kinds that are numeric indices.
    fn to_int(&self) -> Result<i64, ValueError> {
        Err(ValueError::OperationNotSupported {
            op: "int()".to_owned(),
            left: self.get_type().to_owned(),
            right: None,
        })
    }

    /// 64-bit hash; errors for unhashable kinds.
    fn get_hash(&self) -> Result<u64, ValueError> {
        Err(ValueError::NotHashableValue)
    }

    /// Equality. Total on hashable pairs; callables use identity, which is
    /// handled by [`Value::equals`] before dispatching here.
    fn equals(&self, _other: &Value) -> Result<bool, ValueError> {
        Ok(false)
    }

    /// Three-way comparison, defined only between compatible kinds.
    fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        Err(ValueError::OperationNotSupported {
            op: "compare".to_owned(),
            left: self.get_type().to_owned(),
            right: Some(other.get_type().to_owned()),
        })
    }

    /// Function call.
    fn call(
        &self,
        _ctx: &mut CallContext,
        _positional: Vec<Value>,
        _named: LinkedHashMap<String, Value>,
        _args: Option<Value>,
        _kwargs: Option<Value>,
    ) -> ValueResult {
        Err(ValueError::OperationNotSupported {
            op: "call()".to_owned(),
            left: self.get_type().to_owned(),
            right: None,
        })
    }

    /// `a[index]`.
    fn at(&self, index: Value) -> ValueResult {
        Err(ValueError::OperationNotSupported {
            op: "[]".to_owned(),
            left: self.get_type().to_owned(),
            right: Some(index.get_type().to_owned()),
        })
    }

    /// `a[index] = new_value`.
    fn set_at(&mut self, index: Value, _new_value: Value) -> Result<(), ValueError> {
        Err(ValueError::OperationNotSupported {
            op: "[] =".to_owned(),
            left: self.get_type().to_owned(),
            right: Some(index.get_type().to_owned()),
        })
    }

    /// `a[start:stop:stride]`.
    fn slice(
        &self,
        _start: Option<Value>,
        _stop: Option<Value>,
        _stride: Option<Value>,
    ) -> ValueResult {
        Err(ValueError::OperationNotSupported {
            op: "[::]".to_owned(),
            left: self.get_type().to_owned(),
            right: None,
        })
    }

    /// The elements iterated over, in order. Iteration bookkeeping (the
    /// iterator count) is handled by [`Value::iter`].
    fn iter_items(&self) -> Result<Vec<Value>, ValueError> {
        Err(ValueError::TypeNotX {
            object_type: self.get_type().to_owned(),
            op: "iterable".to_owned(),
        })
    }

    /// `len(a)`.
    fn length(&self) -> Result<i64, ValueError> {
        Err(ValueError::OperationNotSupported {
            op: "len()".to_owned(),
            left: self.get_type().to_owned(),
            right: None,
        })
    }

    /// `a.attribute`, not counting methods (which the environment's
    /// type-value registry provides).
    fn get_attr(&self, attribute: &str) -> ValueResult {
        Err(ValueError::OperationNotSupported {
            op: format!(".{}", attribute),
            left: self.get_type().to_owned(),
            right: None,
        })
    }

    /// Whether `a.attribute` would succeed.
    fn has_attr(&self, _attribute: &str) -> Result<bool, ValueError> {
        Ok(false)
    }

    /// `a.attribute = new_value`.
    fn set_attr(&mut self, attribute: &str, _new_value: Value) -> Result<(), ValueError> {
        Err(ValueError::OperationNotSupported {
            op: format!(".{} =", attribute),
            left: self.get_type().to_owned(),
            right: None,
        })
    }

    /// Attribute names for `dir()`, not counting methods.
    fn dir_attr(&self) -> Result<Vec<String>, ValueError> {
        Ok(Vec::new())
    }

    /// `other in self`.
    fn is_in(&self, other: &Value) -> Result<bool, ValueError> {
        Err(ValueError::OperationNotSupported {
            op: "in".to_owned(),
            left: other.get_type().to_owned(),
            right: Some(self.get_type().to_owned()),
        })
    }

    /// Unary `+`.
    fn plus(&self) -> ValueResult {
        Err(ValueError::OperationNotSupported {
            op: "+".to_owned(),
            left: self.get_type().to_owned(),
            right: None,
        })
    }

    /// Unary `-`.
    fn minus(&self) -> ValueResult {
        Err(ValueError::OperationNotSupported {
            op: "-".to_owned(),
            left: self.get_type().to_owned(),
            right: None,
        })
    }

    /// Binary `+`.
    fn add(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("+", &other))
    }

    /// Binary `-`.
    fn sub(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("-", &other))
    }

    /// Binary `*`.
    fn mul(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("*", &other))
    }

    /// Binary `%` (modulo, or string interpolation).
    fn percent(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("%", &other))
    }

    /// Binary `/` (real division).
    fn div(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("/", &other))
    }

    /// Binary `//` (floored division).
    fn floor_div(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("//", &other))
    }

    /// Binary `|` (bitwise or, or dict/set union).
    fn pipe(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("|", &other))
    }

    /// Binary `&`.
    fn bit_and(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("&", &other))
    }

    /// Binary `^`.
    fn bit_xor(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("^", &other))
    }

    /// Binary `<<`.
    fn left_shift(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with("<<", &other))
    }

    /// Binary `>>`.
    fn right_shift(&self, other: Value) -> ValueResult {
        Err(self.unsupported_with(">>", &other))
    }

    /// The mutability header of mutable containers; `None` for immutable
    /// kinds.
    fn mutability(&self) -> Option<&Mutability> {
        None
    }

    /// Whether an immutable kind still references other values (tuple,
    /// function) and therefore participates in transitive freezing.
    fn has_value_links(&self) -> bool {
        false
    }

    /// Visit every value this one directly references.
    fn visit_links(&self, _visitor: &mut dyn FnMut(&Value)) {}

    /// Freeze this value and, transitively, everything it references.
    /// Idempotent; the mutability header breaks reference cycles.
    fn freeze(&self) {
        let recurse = match self.mutability() {
            Some(state) => state.freeze(),
            None => self.has_value_links(),
        };
        if recurse {
            self.visit_links(&mut |v| v.freeze());
        }
    }

    /// Identity used for recursion detection; `None` for non-callables.
    fn function_id(&self) -> Option<FunctionId> {
        None
    }

    #[doc(hidden)]
    fn unsupported_with(&self, op: &str, other: &Value) -> ValueError {
        ValueError::OperationNotSupported {
            op: op.to_owned(),
            left: self.get_type().to_owned(),
            right: Some(other.get_type().to_owned()),
        }
    }
}

impl Value {
    /// Create a new `Value` from an implementation of the object protocol.
    pub fn new<T: TypedValue>(t: T) -> Value {
        Value {
            value: Rc::new(RefCell::new(t)),
        }
    }

    /// Identity pointer of the heap cell.
    pub fn data_ptr(&self) -> DataPtr {
        DataPtr(Rc::as_ptr(&self.value) as *const () as usize)
    }

    pub fn same_as(&self, other: &Value) -> bool {
        self.data_ptr() == other.data_ptr()
    }

    /// Borrow the underlying typed value if it has type `T`.
    pub fn downcast_ref<T: TypedValue>(&self) -> Option<Ref<'_, T>> {
        let borrowed = self.value.borrow();
        if borrowed.as_any().is::<T>() {
            Some(Ref::map(borrowed, |v| {
                v.as_any().downcast_ref::<T>().unwrap()
            }))
        } else {
            None
        }
    }

    /// Mutably borrow the underlying typed value if it has type `T`.
    ///
    /// This only hands out the Rust-level borrow; the language-level frozen
    /// and iteration checks remain the responsibility of the mutating
    /// operation itself.
    pub fn downcast_mut<T: TypedValue>(&self) -> Option<RefMut<'_, T>> {
        let borrowed = self.value.borrow_mut();
        if borrowed.as_any().is::<T>() {
            Some(RefMut::map(borrowed, |v| {
                v.as_any_mut().downcast_mut::<T>().unwrap()
            }))
        } else {
            None
        }
    }

    pub fn get_type(&self) -> &'static str {
        self.value.borrow().get_type()
    }

    pub fn to_str_impl(&self, buf: &mut String) -> fmt::Result {
        self.value.borrow().to_str_impl(buf)
    }

    pub fn to_str(&self) -> String {
        let mut buf = String::new();
        self.to_str_impl(&mut buf).unwrap();
        buf
    }

    pub fn to_repr_impl(&self, buf: &mut String) -> fmt::Result {
        self.value.borrow().to_repr_impl(buf)
    }

    pub fn to_repr(&self) -> String {
        let mut buf = String::new();
        self.to_repr_impl(&mut buf).unwrap();
        buf
    }

    pub fn to_bool(&self) -> bool {
        self.value.borrow().to_bool()
    }

    pub fn to_int(&self) -> Result<i64, ValueError> {
        self.value.borrow().to_int()
    }

    pub fn get_hash(&self) -> Result<u64, ValueError> {
        self.value.borrow().get_hash()
    }

    pub fn equals(&self, other: &Value) -> Result<bool, ValueError> {
        let _guard = try_inc()?;
        // Identity implies equality, except for floats where NaN != NaN.
        if self.same_as(other) && self.get_type() != "float" {
            return Ok(true);
        }
        self.value.borrow().equals(other)
    }

    pub fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        let _guard = try_inc()?;
        self.value.borrow().compare(other)
    }

    pub fn call(
        &self,
        ctx: &mut CallContext,
        positional: Vec<Value>,
        named: LinkedHashMap<String, Value>,
        args: Option<Value>,
        kwargs: Option<Value>,
    ) -> ValueResult {
        self.value.borrow().call(ctx, positional, named, args, kwargs)
    }

    pub fn at(&self, index: Value) -> ValueResult {
        self.value.borrow().at(index)
    }

    pub fn set_at(&self, index: Value, new_value: Value) -> Result<(), ValueError> {
        self.value.borrow_mut().set_at(index, new_value)
    }

    pub fn slice(
        &self,
        start: Option<Value>,
        stop: Option<Value>,
        stride: Option<Value>,
    ) -> ValueResult {
        self.value.borrow().slice(start, stop, stride)
    }

    /// Iterate; the returned iterator locks the container against mutation
    /// until dropped.
    pub fn iter(&self) -> Result<ValueIter, ValueError> {
        let items = self.value.borrow().iter_items()?;
        let guard = IterationGuard::new(self.clone());
        Ok(ValueIter::new(items, guard))
    }

    /// Snapshot of the elements, without locking.
    pub fn to_vec(&self) -> Result<Vec<Value>, ValueError> {
        self.value.borrow().iter_items()
    }

    pub fn length(&self) -> Result<i64, ValueError> {
        self.value.borrow().length()
    }

    pub fn get_attr(&self, attribute: &str) -> ValueResult {
        self.value.borrow().get_attr(attribute)
    }

    pub fn has_attr(&self, attribute: &str) -> Result<bool, ValueError> {
        self.value.borrow().has_attr(attribute)
    }

    pub fn set_attr(&self, attribute: &str, new_value: Value) -> Result<(), ValueError> {
        self.value.borrow_mut().set_attr(attribute, new_value)
    }

    pub fn dir_attr(&self) -> Result<Vec<String>, ValueError> {
        self.value.borrow().dir_attr()
    }

    pub fn is_in(&self, other: &Value) -> Result<bool, ValueError> {
        self.value.borrow().is_in(other)
    }

    pub fn plus(&self) -> ValueResult {
        self.value.borrow().plus()
    }

    pub fn minus(&self) -> ValueResult {
        self.value.borrow().minus()
    }

    pub fn add(&self, other: Value) -> ValueResult {
        self.value.borrow().add(other)
    }

    pub fn sub(&self, other: Value) -> ValueResult {
        self.value.borrow().sub(other)
    }

    pub fn mul(&self, other: Value) -> ValueResult {
        self.value.borrow().mul(other)
    }

    pub fn percent(&self, other: Value) -> ValueResult {
        self.value.borrow().percent(other)
    }

    pub fn div(&self, other: Value) -> ValueResult {
        self.value.borrow().div(other)
    }

    pub fn floor_div(&self, other: Value) -> ValueResult {
        self.value.borrow().floor_div(other)
    }

    pub fn pipe(&self, other: Value) -> ValueResult {
        self.value.borrow().pipe(other)
    }

    pub fn bit_and(&self, other: Value) -> ValueResult {
        self.value.borrow().bit_and(other)
    }

    pub fn bit_xor(&self, other: Value) -> ValueResult {
        self.value.borrow().bit_xor(other)
    }

    pub fn left_shift(&self, other: Value) -> ValueResult {
        self.value.borrow().left_shift(other)
    }

    pub fn right_shift(&self, other: Value) -> ValueResult {
        self.value.borrow().right_shift(other)
    }

    pub fn freeze(&self) {
        self.value.borrow().freeze();
    }

    pub fn is_frozen(&self) -> bool {
        match self.value.borrow().mutability() {
            Some(m) => m.is_frozen(),
            None => true,
        }
    }

    pub(crate) fn begin_iteration(&self) {
        if let Some(m) = self.value.borrow().mutability() {
            m.begin_iteration();
        }
    }

    pub(crate) fn end_iteration(&self) {
        if let Some(m) = self.value.borrow().mutability() {
            m.end_iteration();
        }
    }

    pub fn function_id(&self) -> Option<FunctionId> {
        self.value.borrow().function_id()
    }

    /// Convert an index value to a machine index in `0..len`, counting
    /// negative values from the end.
    pub fn convert_index(&self, len: i64) -> Result<i64, ValueError> {
        match self.to_int() {
            Ok(x) => {
                let i = if x < 0 {
                    len.checked_add(x).ok_or(ValueError::IntegerOverflow)?
                } else {
                    x
                };
                if i < 0 || i >= len {
                    Err(ValueError::IndexOutOfBound(i))
                } else {
                    Ok(i)
                }
            }
            Err(..) => Err(ValueError::IncorrectParameterType),
        }
    }
}

fn convert_index_aux(
    len: i64,
    v: Option<Value>,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64, ValueError> {
    match v {
        None => Ok(default),
        Some(v) if v.get_type() == "NoneType" => Ok(default),
        Some(v) => match v.to_int() {
            Ok(x) => {
                let i = if x < 0 { len + x } else { x };
                Ok(i.max(min).min(max))
            }
            Err(..) => Err(ValueError::IncorrectParameterType),
        },
    }
}

/// Parse the three optional slice operands against a length, yielding
/// `(start, stop, stride)` clamped into range.
pub fn convert_slice_indices(
    len: i64,
    start: Option<Value>,
    stop: Option<Value>,
    stride: Option<Value>,
) -> Result<(i64, i64, i64), ValueError> {
    let stride = match stride {
        None => 1,
        Some(v) if v.get_type() == "NoneType" => 1,
        Some(v) => v.to_int().map_err(|_| ValueError::IncorrectParameterType)?,
    };
    if stride == 0 {
        return Err(ValueError::StrideZero);
    }
    let (def_start, def_end, clamp) = if stride < 0 {
        (len - 1, -1, -1)
    } else {
        (0, len, 0)
    };
    let start = convert_index_aux(len, start, def_start, clamp, len + clamp)?;
    let stop = convert_index_aux(len, stop, def_end, clamp, len + clamp)?;
    Ok((start, stop, stride))
}

/// Collect the elements of `it` selected by converted slice indices.
pub(crate) fn slice_elements<T: Clone>(items: &[T], start: i64, stop: i64, stride: i64) -> Vec<T> {
    let mut result = Vec::new();
    if stride > 0 {
        let mut i = start;
        while i < stop {
            result.push(items[i as usize].clone());
            i += stride;
        }
    } else {
        let mut i = start;
        while i > stop {
            result.push(items[i as usize].clone());
            i += stride;
        }
    }
    result
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value[{}]({})", self.get_type(), self.to_repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.equals(other) == Ok(true)
    }
}

impl Eq for Value {}

// Submodules
pub mod boolean;
pub mod cell;
pub mod dict;
pub mod error;
pub mod float;
pub mod function;
pub mod hashed_value;
pub mod int;
pub mod iter;
pub mod list;
pub mod mutability;
pub mod none;
pub mod num;
pub mod range;
pub mod set;
pub mod string;
pub mod tuple;

// Converters
use crate::values::list::List;
use crate::values::none::NoneType;
use crate::values::tuple::Tuple;

impl From<BigInt> for Value {
    fn from(a: BigInt) -> Value {
        Value::new(a)
    }
}

macro_rules! from_int {
    ($($t:ty),+) => {
        $(impl From<$t> for Value {
            fn from(a: $t) -> Value {
                Value::new(BigInt::from(a))
            }
        })+
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(a: f64) -> Value {
        Value::new(a)
    }
}

impl From<bool> for Value {
    fn from(a: bool) -> Value {
        Value::new(a)
    }
}

impl From<String> for Value {
    fn from(a: String) -> Value {
        Value::new(a)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(a: &'a str) -> Value {
        Value::new(a.to_owned())
    }
}

impl From<NoneType> for Value {
    fn from(_: NoneType) -> Value {
        Value::new(NoneType::None)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(a: Vec<T>) -> Value {
        Value::new(List::from_values(
            a.into_iter().map(Into::into).collect::<Vec<Value>>(),
        ))
    }
}

impl<T1: Into<Value>, T2: Into<Value>> From<(T1, T2)> for Value {
    fn from(a: (T1, T2)) -> Value {
        Value::new(Tuple::new(vec![a.0.into(), a.1.into()]))
    }
}

impl<T1: Into<Value>, T2: Into<Value>, T3: Into<Value>> From<(T1, T2, T3)> for Value {
    fn from(a: (T1, T2, T3)) -> Value {
        Value::new(Tuple::new(vec![a.0.into(), a.1.into(), a.2.into()]))
    }
}

/// Freeze every cell of a captured-variables vector.
pub(crate) fn freeze_cells(cells: &[ValueCell]) {
    for c in cells {
        c.freeze();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_index() {
        assert_eq!(Ok(6), Value::from(6).convert_index(7));
        assert_eq!(Ok(6), Value::from(-1).convert_index(7));
        assert_eq!(
            Ok((6, 7, 1)),
            convert_slice_indices(7, Some(Value::from(6)), None, None)
        );
        assert_eq!(
            Ok((6, -1, -1)),
            convert_slice_indices(7, Some(Value::from(-1)), None, Some(Value::from(-1)))
        );
        assert_eq!(
            Ok((6, 7, 1)),
            convert_slice_indices(7, Some(Value::from(-1)), Some(Value::from(10)), None)
        );
        // Errors
        assert_eq!(
            Err(ValueError::StrideZero),
            convert_slice_indices(7, None, None, Some(Value::from(0)))
        );
        assert_eq!(
            Err(ValueError::IncorrectParameterType),
            Value::from("a").convert_index(7)
        );
        assert_eq!(
            Err(ValueError::IndexOutOfBound(8)),
            Value::from(8).convert_index(7)
        );
        assert_eq!(
            Err(ValueError::IndexOutOfBound(-1)),
            Value::from(-8).convert_index(7)
        );
    }

    #[test]
    fn identity_implies_equality() {
        let l = Value::from(vec![1, 2, 3]);
        assert_eq!(Ok(true), l.equals(&l.clone()));
    }

    #[test]
    fn aliasing_is_visible() {
        let v1 = Value::from(vec![1, 2, 3]);
        let v2 = v1.clone();
        v2.set_at(Value::from(2), Value::from(4)).unwrap();
        assert_eq!("[1, 2, 4]", v1.to_repr());
    }

    #[test]
    fn cyclic_repr_terminates() {
        let l = Value::from(vec![1]);
        l.set_at(Value::from(0), l.clone()).unwrap();
        assert_eq!("[[...]]", l.to_repr());
    }

    #[test]
    fn freeze_is_transitive() {
        let inner = Value::from(vec![1]);
        let outer = Value::from(vec![inner.clone()]);
        outer.freeze();
        assert_eq!(
            Err(ValueError::CannotMutateFrozenValue),
            inner.set_at(Value::from(0), Value::from(2))
        );
    }

    #[test]
    fn freeze_survives_cycles() {
        let l = Value::from(vec![1]);
        l.set_at(Value::from(0), l.clone()).unwrap();
        l.freeze();
        assert!(l.is_frozen());
    }
}
