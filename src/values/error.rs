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

//! Errors of the object protocol.

use crate::errors::ErrorKind;
use crate::syntax::errors::SyntaxError;
use crate::values::string::interpolation::StringInterpolationError;
use crate::values::Value;
use codemap::Span;
use codemap_diagnostic::{Diagnostic, Level, SpanLabel, SpanStyle};

// Error codes -- CV = Critical Value operation
pub const NOT_SUPPORTED_ERROR_CODE: &str = "CV00";
pub const FROZEN_VALUE_ERROR_CODE: &str = "CV01";
pub const INCORRECT_PARAMETER_TYPE_ERROR_CODE: &str = "CV02";
pub const OUT_OF_BOUND_ERROR_CODE: &str = "CV03";
pub const NOT_HASHABLE_VALUE_ERROR_CODE: &str = "CV04";
pub const KEY_NOT_FOUND_ERROR_CODE: &str = "CV05";
pub const DIVISION_BY_ZERO_ERROR_CODE: &str = "CV08";
pub const TOO_MANY_RECURSION_LEVEL_ERROR_CODE: &str = "CV13";
pub const MUTATION_DURING_ITERATION_ERROR_CODE: &str = "CV15";
pub const INTEGER_OVERFLOW_ERROR_CODE: &str = "CV16";
pub const NEGATIVE_SHIFT_COUNT_ERROR_CODE: &str = "CV17";
pub const STRIDE_ZERO_ERROR_CODE: &str = "CV18";

/// Error that can be returned by functions of the object protocol.
#[derive(Clone, Debug)]
pub enum ValueError {
    /// The operation is not supported for this type.
    OperationNotSupported {
        op: String,
        left: String,
        right: Option<String>,
    },
    /// The operation is not supported because the type is not of a certain
    /// category (e.g. not iterable).
    TypeNotX { object_type: String, op: String },
    /// Division or modulo by zero.
    DivisionByZero,
    /// A computation exceeded a representable bound (e.g. a slot index or a
    /// shift amount too large for the machine).
    IntegerOverflow,
    /// A shift by a negative number of bits.
    NegativeShiftCount,
    /// A slice with a stride of zero.
    StrideZero,
    /// Trying to mutate a frozen value.
    CannotMutateFrozenValue,
    /// Trying to mutate a container while an iteration over it is in flight.
    MutationDuringIteration,
    /// Trying to apply an incorrect parameter type, e.g. for slicing.
    IncorrectParameterType,
    /// Trying to access an index outside of the value range.
    IndexOutOfBound(i64),
    /// The value is not hashable but a hash was requested (e.g. dict key).
    NotHashableValue,
    /// The key was not found in the collection.
    KeyNotFound(Value),
    /// Wrapper around runtime errors to be bubbled up.
    Runtime(RuntimeError),
    /// Wrapper around diagnosed errors to be bubbled up.
    DiagnosedError(Diagnostic),
    /// String interpolation errors.
    StringInterpolation(StringInterpolationError),
    /// Too many recursion levels in an internal operation (equality or
    /// printing of deeply nested values).
    TooManyRecursionLevel,
}

/// A simpler error format to return as a ValueError.
#[derive(Clone, Debug)]
pub struct RuntimeError {
    pub code: &'static str,
    pub message: String,
    pub label: String,
}

impl<T: Into<RuntimeError>> SyntaxError for T {
    fn to_diagnostic(self, file_span: Span) -> Diagnostic {
        ValueError::Runtime(self.into()).to_diagnostic(file_span)
    }
}

impl From<RuntimeError> for ValueError {
    fn from(e: RuntimeError) -> ValueError {
        ValueError::Runtime(e)
    }
}

impl From<StringInterpolationError> for ValueError {
    fn from(e: StringInterpolationError) -> ValueError {
        ValueError::StringInterpolation(e)
    }
}

impl ValueError {
    /// The kind of this error, for host policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValueError::OperationNotSupported { .. }
            | ValueError::TypeNotX { .. }
            | ValueError::IncorrectParameterType
            | ValueError::NotHashableValue => ErrorKind::Type,
            ValueError::DivisionByZero
            | ValueError::IntegerOverflow
            | ValueError::NegativeShiftCount
            | ValueError::StrideZero => ErrorKind::Arithmetic,
            ValueError::CannotMutateFrozenValue | ValueError::MutationDuringIteration => {
                ErrorKind::Mutation
            }
            ValueError::IndexOutOfBound(..) | ValueError::KeyNotFound(..) => ErrorKind::Value,
            ValueError::TooManyRecursionLevel => ErrorKind::Interrupted,
            ValueError::StringInterpolation(e) => e.kind(),
            ValueError::Runtime(e) => ErrorKind::from_code(e.code).unwrap_or(ErrorKind::Value),
            ValueError::DiagnosedError(d) => ErrorKind::of(d).unwrap_or(ErrorKind::Value),
        }
    }

    fn label(&self) -> String {
        match self {
            ValueError::Runtime(e) => e.label.clone(),
            ValueError::OperationNotSupported {
                op,
                left,
                right: Some(right),
            } => format!("{} not supported for types {} and {}", op, left, right),
            ValueError::OperationNotSupported {
                op,
                left,
                right: None,
            } => format!("{} not supported for type {}", op, left),
            ValueError::TypeNotX { object_type, op } => {
                format!("The type '{}' is not {}", object_type, op)
            }
            ValueError::DivisionByZero => "Division by zero".to_owned(),
            ValueError::IntegerOverflow => "Integer overflow".to_owned(),
            ValueError::NegativeShiftCount => "Negative shift count".to_owned(),
            ValueError::StrideZero => "Zero stride".to_owned(),
            ValueError::CannotMutateFrozenValue => "Frozen value".to_owned(),
            ValueError::MutationDuringIteration => "Mutation during iteration".to_owned(),
            ValueError::IncorrectParameterType => "Type of parameters mismatch".to_owned(),
            ValueError::IndexOutOfBound(..) => "Index out of bound".to_owned(),
            ValueError::NotHashableValue => "Value is not hashable".to_owned(),
            ValueError::KeyNotFound(..) => "Key not found".to_owned(),
            ValueError::TooManyRecursionLevel => "Too many recursion levels".to_owned(),
            ValueError::DiagnosedError(..) | ValueError::StringInterpolation(..) => {
                unreachable!()
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ValueError::Runtime(e) => e.message.clone(),
            ValueError::OperationNotSupported {
                op,
                left,
                right: Some(right),
            } => format!("Cannot {} types {} and {}", op, left, right),
            ValueError::OperationNotSupported {
                op,
                left,
                right: None,
            } => format!("Cannot {} on type {}", op, left),
            ValueError::TypeNotX { object_type, op } => {
                format!("The type '{}' is not {}", object_type, op)
            }
            ValueError::DivisionByZero => "Cannot divide by zero".to_owned(),
            ValueError::IntegerOverflow => "Integer overflow".to_owned(),
            ValueError::NegativeShiftCount => "Cannot shift by a negative number of bits".to_owned(),
            ValueError::StrideZero => "The stride of a slice cannot be zero".to_owned(),
            ValueError::CannotMutateFrozenValue => "Cannot mutate a frozen value".to_owned(),
            ValueError::MutationDuringIteration => {
                "Cannot mutate an iterable while iterating on it".to_owned()
            }
            ValueError::IncorrectParameterType => "Type of parameters mismatch".to_owned(),
            ValueError::IndexOutOfBound(b) => format!("Index {} is out of bound", b),
            ValueError::KeyNotFound(k) => format!("Key '{}' was not found", k.to_repr()),
            ValueError::NotHashableValue => "Value is not hashable".to_owned(),
            ValueError::TooManyRecursionLevel => "Too many recursion levels".to_owned(),
            ValueError::DiagnosedError(..) | ValueError::StringInterpolation(..) => {
                unreachable!()
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ValueError::OperationNotSupported { .. } | ValueError::TypeNotX { .. } => {
                NOT_SUPPORTED_ERROR_CODE
            }
            ValueError::DivisionByZero => DIVISION_BY_ZERO_ERROR_CODE,
            ValueError::IntegerOverflow => INTEGER_OVERFLOW_ERROR_CODE,
            ValueError::NegativeShiftCount => NEGATIVE_SHIFT_COUNT_ERROR_CODE,
            ValueError::StrideZero => STRIDE_ZERO_ERROR_CODE,
            ValueError::CannotMutateFrozenValue => FROZEN_VALUE_ERROR_CODE,
            ValueError::MutationDuringIteration => MUTATION_DURING_ITERATION_ERROR_CODE,
            ValueError::IncorrectParameterType => INCORRECT_PARAMETER_TYPE_ERROR_CODE,
            ValueError::IndexOutOfBound(..) => OUT_OF_BOUND_ERROR_CODE,
            ValueError::NotHashableValue => NOT_HASHABLE_VALUE_ERROR_CODE,
            ValueError::KeyNotFound(..) => KEY_NOT_FOUND_ERROR_CODE,
            ValueError::Runtime(e) => e.code,
            ValueError::TooManyRecursionLevel => TOO_MANY_RECURSION_LEVEL_ERROR_CODE,
            ValueError::DiagnosedError(..) | ValueError::StringInterpolation(..) => {
                unreachable!()
            }
        }
    }
}

impl SyntaxError for ValueError {
    fn to_diagnostic(self, file_span: Span) -> Diagnostic {
        match self {
            ValueError::DiagnosedError(d) => d,
            ValueError::StringInterpolation(e) => e.to_diagnostic(file_span),
            e => Diagnostic {
                level: Level::Error,
                message: e.message(),
                code: Some(e.code().to_owned()),
                spans: vec![SpanLabel {
                    span: file_span,
                    style: SpanStyle::Primary,
                    label: Some(e.label()),
                }],
            },
        }
    }
}

impl PartialEq for ValueError {
    fn eq(&self, other: &ValueError) -> bool {
        match (self, other) {
            (ValueError::CannotMutateFrozenValue, ValueError::CannotMutateFrozenValue)
            | (ValueError::MutationDuringIteration, ValueError::MutationDuringIteration)
            | (ValueError::IncorrectParameterType, ValueError::IncorrectParameterType)
            | (ValueError::DivisionByZero, ValueError::DivisionByZero)
            | (ValueError::NegativeShiftCount, ValueError::NegativeShiftCount)
            | (ValueError::StrideZero, ValueError::StrideZero)
            | (ValueError::IntegerOverflow, ValueError::IntegerOverflow)
            | (ValueError::NotHashableValue, ValueError::NotHashableValue)
            | (ValueError::TooManyRecursionLevel, ValueError::TooManyRecursionLevel) => true,
            (
                ValueError::OperationNotSupported { op: x, .. },
                ValueError::OperationNotSupported { op: y, .. },
            ) => x == y,
            (ValueError::IndexOutOfBound(x), ValueError::IndexOutOfBound(y)) => x == y,
            _ => false,
        }
    }
}
