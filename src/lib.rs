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

//! A deterministic, embeddable interpreter for a Python-like configuration
//! dialect (Starlark).
//!
//! The crate is organized as a pipeline:
//!
//! * [`syntax`](syntax/index.html) scans and parses source into a spanned
//!   syntax tree,
//! * [`resolve`](resolve/index.html) statically classifies every name use
//!   and assigns slots,
//! * [`values`](values/index.html) defines the runtime value kinds and the
//!   object protocol,
//! * [`eval`](eval/index.html) executes resolved programs against a `Thread`
//!   and a `Module`,
//! * [`stdlib`](stdlib/index.html) provides the universal built-in functions
//!   and methods.
//!
//! A minimal embedding parses, resolves and executes a module:
//!
//! ```rust
//! use skylark::eval::{eval_module, Module, Thread};
//! use skylark::resolve::resolve;
//! use skylark::stdlib::global_environment;
//! use skylark::syntax::dialect::Dialect;
//! use skylark::syntax::parser::parse;
//! use std::rc::Rc;
//! use std::sync::{Arc, Mutex};
//!
//! let map = Arc::new(Mutex::new(codemap::CodeMap::new()));
//! let env = global_environment();
//! env.freeze();
//! let ast = parse(&map, "<demo>", "x = [n * n for n in range(4)]\n").unwrap();
//! let program = resolve(&map, ast, &Dialect::STRICT, &env).unwrap();
//! let module = Rc::new(Module::new("demo", &program));
//! let mut thread = Thread::new(&Dialect::STRICT);
//! eval_module(&program, &module, &mut thread, &env).unwrap();
//! assert_eq!("[0, 1, 4, 9]", module.get("x").unwrap().to_repr());
//! ```

#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod values;
pub mod environment;
pub mod errors;
pub mod eval;
pub mod resolve;
pub mod stdlib;
pub mod syntax;

#[doc(hidden)]
pub mod testutil;
