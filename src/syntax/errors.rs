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

//! Conversion of internal errors to user-visible diagnostics.

use codemap::Span;
use codemap_diagnostic::Diagnostic;

/// An error that can be rendered as a diagnostic once a source span is known.
///
/// Most internal error enums (lexical, value, function-call...) implement
/// this trait so that the evaluator can attach the span of the offending
/// syntax node at the point the error crosses it.
pub trait SyntaxError {
    /// Convert the error to a codemap diagnostic anchored at `file_span`.
    fn to_diagnostic(self, file_span: Span) -> Diagnostic;
}
