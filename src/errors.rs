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

//! Classification of errors into the kinds hosts dispatch on.
//!
//! Every error this crate surfaces is a `Diagnostic` carrying a stable code
//! string (`"CV08"`, `"CS00"`, ...). [`ErrorKind`] groups those codes into
//! a small taxonomy so that an embedder can, say, render parse errors
//! differently from runtime errors without matching on individual codes.

use codemap_diagnostic::Diagnostic;

/// The kind of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Scanner and parser failures: invalid escapes, unterminated strings,
    /// unexpected tokens, indentation errors.
    Syntax,
    /// Static rule violations found by the resolver: undefined names,
    /// duplicate bindings, misplaced `return`/`break`/`continue`/`load`,
    /// reserved words, dialect gates.
    Static,
    /// Operator/operand type mismatches, non-iterables iterated,
    /// non-hashables used as keys, non-numbers where numbers are required.
    Type,
    /// Domain errors on well-typed operands: missing keys, out-of-range
    /// indices, string-to-number parse failures, empty-sequence aggregates.
    Value,
    /// Division or modulo by zero, negative shift counts, zero strides.
    Arithmetic,
    /// Writes to frozen values and mutation during iteration.
    Mutation,
    /// Missing, duplicate or unexpected call arguments.
    Argument,
    /// Recursion, step-budget exhaustion, stack depth and cancellation.
    Interrupted,
    /// Load cycles and failures to import loaded symbols.
    Load,
}

impl ErrorKind {
    /// The kind of a diagnostic code, or `None` for codes this crate does
    /// not emit (e.g. host-defined ones).
    pub fn from_code(code: &str) -> Option<ErrorKind> {
        // Codes that deviate from their family's kind.
        let specific = match code {
            // Invalid assignment targets and duplicate parameter names are
            // static rules the parser happens to enforce.
            "CP02" | "CP03" | "CP12" => Some(ErrorKind::Static),
            // Unpacking the wrong number of values is a value error, not a
            // misplaced-statement error.
            "CE03" => Some(ErrorKind::Value),
            "CE04" => Some(ErrorKind::Interrupted),
            // A numeric conversion on a non-number (`%d` on a string) or a
            // `%(name)` conversion on a non-mapping is a type error.
            "CI07" | "CI08" => Some(ErrorKind::Type),
            "CM00" => Some(ErrorKind::Mutation),
            "CM01" | "CM03" => Some(ErrorKind::Load),
            "CM02" => Some(ErrorKind::Value),
            "CR01" | "CR02" | "CR11" => Some(ErrorKind::Type),
            "CR06" => Some(ErrorKind::Arithmetic),
            "CV00" | "CV02" | "CV04" => Some(ErrorKind::Type),
            "CV01" | "CV15" => Some(ErrorKind::Mutation),
            "CV03" | "CV05" => Some(ErrorKind::Value),
            "CV08" | "CV16" | "CV17" | "CV18" => Some(ErrorKind::Arithmetic),
            "CV13" => Some(ErrorKind::Interrupted),
            _ => None,
        };
        if specific.is_some() {
            return specific;
        }
        match code.get(..2)? {
            "CL" | "CP" => Some(ErrorKind::Syntax),
            "CS" | "CE" => Some(ErrorKind::Static),
            "CF" => Some(ErrorKind::Argument),
            "CN" => Some(ErrorKind::Interrupted),
            "CD" => Some(ErrorKind::Load),
            "CI" | "CT" | "CR" => Some(ErrorKind::Value),
            _ => None,
        }
    }

    /// The kind of a rendered diagnostic.
    pub fn of(diagnostic: &Diagnostic) -> Option<ErrorKind> {
        diagnostic.code.as_deref().and_then(ErrorKind::from_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::loader;
    use crate::eval::thread;
    use crate::values::error;

    #[test]
    fn codes_map_to_their_kinds() {
        assert_eq!(Some(ErrorKind::Syntax), ErrorKind::from_code("CL01"));
        assert_eq!(Some(ErrorKind::Syntax), ErrorKind::from_code("CP00"));
        assert_eq!(Some(ErrorKind::Static), ErrorKind::from_code("CS04"));
        assert_eq!(Some(ErrorKind::Static), ErrorKind::from_code("CE00"));
        assert_eq!(
            Some(ErrorKind::Type),
            ErrorKind::from_code(error::NOT_SUPPORTED_ERROR_CODE)
        );
        assert_eq!(
            Some(ErrorKind::Value),
            ErrorKind::from_code(error::KEY_NOT_FOUND_ERROR_CODE)
        );
        assert_eq!(Some(ErrorKind::Argument), ErrorKind::from_code("CF01"));
        assert_eq!(
            Some(ErrorKind::Load),
            ErrorKind::from_code(loader::LOAD_CYCLE_ERROR_CODE)
        );
        assert_eq!(
            Some(ErrorKind::Interrupted),
            ErrorKind::from_code(thread::STEP_LIMIT_ERROR_CODE)
        );
        assert_eq!(None, ErrorKind::from_code("XY00"));
        assert_eq!(None, ErrorKind::from_code(""));
    }

    #[test]
    fn the_arithmetic_kind_covers_all_three_cases() {
        // Division/modulo by zero, negative shift counts and zero strides
        // classify together.
        assert_eq!(
            Some(ErrorKind::Arithmetic),
            ErrorKind::from_code(error::DIVISION_BY_ZERO_ERROR_CODE)
        );
        assert_eq!(
            Some(ErrorKind::Arithmetic),
            ErrorKind::from_code(error::NEGATIVE_SHIFT_COUNT_ERROR_CODE)
        );
        assert_eq!(
            Some(ErrorKind::Arithmetic),
            ErrorKind::from_code(error::STRIDE_ZERO_ERROR_CODE)
        );
    }
}
