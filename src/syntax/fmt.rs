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

//! Helpers shared by the syntax-tree pretty printer.
//!
//! Pretty-printing is used for diagnostics and for the parse/print/reparse
//! round-trip property: printing a successfully parsed tree and parsing the
//! output again yields a structurally equivalent tree.

use std::fmt;

/// Print the elements of `v` separated by `, `. With `for_tuple` set, a
/// single element is followed by a trailing comma so that one-element tuples
/// print as `(x,)`.
pub(crate) fn comma_separated_fmt<I, F>(
    f: &mut dyn fmt::Write,
    v: &[I],
    converter: F,
    for_tuple: bool,
) -> fmt::Result
where
    F: Fn(&I, &mut dyn fmt::Write) -> fmt::Result,
{
    for (i, e) in v.iter().enumerate() {
        if i != 0 {
            f.write_str(", ")?;
        }
        converter(e, f)?;
    }
    if v.len() == 1 && for_tuple {
        f.write_str(",")?;
    }
    Ok(())
}

/// Print `s` as a double-quoted string literal that the scanner decodes back
/// to `s`.
pub(crate) fn fmt_string_literal(f: &mut dyn fmt::Write, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            c if (c as u32) < 0x20 => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_str("\"")
}

/// Print a float literal so that reparsing yields a float again (a bare
/// integral value would otherwise scan as an int literal).
pub(crate) fn fmt_float_literal(f: &mut dyn fmt::Write, v: f64) -> fmt::Result {
    if v.is_infinite() {
        // Infinity has no literal form; the smallest overflowing literal
        // scans back to the same value.
        if v > 0.0 {
            f.write_str("1e999")
        } else {
            f.write_str("-1e999")
        }
    } else if v == v.trunc() {
        write!(f, "{:.1}", v)
    } else {
        write!(f, "{}", v)
    }
}

/// One extra level of block indentation.
pub(crate) fn indent(tab: &str) -> String {
    let mut s = tab.to_owned();
    s.push_str("  ");
    s
}
