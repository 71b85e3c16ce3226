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

//! Helpers to execute code snippets in tests.

use crate::environment::Environment;
use crate::eval::{eval_module, Module, Thread};
use crate::resolve::resolve;
use crate::stdlib::global_environment;
use crate::syntax::dialect::Dialect;
use crate::syntax::parser::parse;
use crate::values::Value;
use codemap::CodeMap;
use codemap_diagnostic::Diagnostic;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// The dialect test snippets run under: top-level control flow on (so
/// snippets can loop), recursion off (the language default).
pub const TEST_DIALECT: Dialect = Dialect {
    allow_top_level_control: true,
    allow_recursion: false,
};

/// Execute a snippet in a fresh module on a fresh thread; the value of the
/// last statement is returned.
pub fn starlark_eval_dialect(snippet: &str, dialect: &Dialect) -> Result<Value, Diagnostic> {
    let map = Arc::new(Mutex::new(CodeMap::new()));
    let env = global_environment();
    env.freeze();
    let ast = parse(&map, "<test>", snippet)?;
    let program = resolve(&map, ast, dialect, &env)?;
    let module = Rc::new(Module::new("test", &program));
    let mut thread = Thread::new(dialect);
    eval_module(&program, &module, &mut thread, &env)
}

pub fn starlark_eval(snippet: &str) -> Result<Value, Diagnostic> {
    starlark_eval_dialect(snippet, &TEST_DIALECT)
}

/// Execute a snippet and report the truth value of its last statement.
pub fn starlark_default(snippet: &str) -> Result<bool, Diagnostic> {
    starlark_eval(snippet).map(|v| v.to_bool())
}

/// The error code a failing snippet produces.
pub fn starlark_fail_code(snippet: &str) -> String {
    starlark_eval(snippet)
        .expect_err("snippet unexpectedly succeeded")
        .code
        .expect("diagnostic carries no code")
}

/// Assert that the last statement of a snippet is true.
#[macro_export]
macro_rules! starlark_ok {
    ($t:expr) => {
        assert!(
            $crate::testutil::starlark_default($t).unwrap(),
            "snippet evaluated to false: {}",
            $t
        );
    };
}

/// Assert that a snippet fails, optionally with a specific error code.
#[macro_export]
macro_rules! starlark_fail {
    ($t:expr) => {
        assert!($crate::testutil::starlark_default($t).is_err());
    };
    ($t:expr, $c:expr) => {
        assert_eq!($c, $crate::testutil::starlark_fail_code($t).as_str());
    };
}
