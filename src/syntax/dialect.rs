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

//! Dialect options the embedder chooses at resolve time.

/// Host-selected switches over the strict core language.
///
/// The strict dialect guarantees termination: no recursion, no `while`
/// loops, no control flow or rebinding at the top level of a module.
/// Hosts that do not need the guarantee can enable the extensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dialect {
    /// Permit `if`, `for` and `while` statements (and rebinding of global
    /// variables, including augmented assignment) at module top level.
    pub allow_top_level_control: bool,
    /// Permit recursive function calls and `while` loops.
    pub allow_recursion: bool,
}

impl Dialect {
    /// The default dialect: terminating programs only.
    pub const STRICT: Dialect = Dialect {
        allow_top_level_control: false,
        allow_recursion: false,
    };

    /// All extensions enabled.
    pub const EXTENDED: Dialect = Dialect {
        allow_top_level_control: true,
        allow_recursion: true,
    };
}

impl Default for Dialect {
    fn default() -> Dialect {
        Dialect::STRICT
    }
}
