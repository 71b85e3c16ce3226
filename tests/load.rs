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

//! Module loading: memoization, cycle detection, and the freeze boundary
//! between modules.

use codemap::CodeMap;
use codemap_diagnostic::{Diagnostic, Level};
use skylark::environment::Environment;
use skylark::eval::{eval_module, loader, FileLoader, Module, ModuleCache, Thread};
use skylark::resolve::resolve;
use skylark::stdlib::global_environment;
use skylark::syntax::dialect::Dialect;
use skylark::syntax::parser::parse;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// A loader over in-memory sources, the shape an embedder would write.
struct SourceLoader {
    sources: HashMap<String, String>,
    cache: ModuleCache,
    env: Environment,
    map: Arc<Mutex<CodeMap>>,
    executed: RefCell<Vec<String>>,
}

impl SourceLoader {
    fn new(sources: &[(&str, &str)]) -> SourceLoader {
        let env = global_environment();
        env.freeze();
        SourceLoader {
            sources: sources
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            cache: ModuleCache::new(),
            env,
            map: Arc::new(Mutex::new(CodeMap::new())),
            executed: RefCell::new(Vec::new()),
        }
    }
}

impl FileLoader for SourceLoader {
    fn load(&self, thread: &mut Thread, path: &str) -> Result<Rc<Module>, Diagnostic> {
        self.cache.load_with(path, || {
            let source = self.sources.get(path).ok_or_else(|| Diagnostic {
                level: Level::Error,
                message: format!("Module '{}' does not exist", path),
                code: None,
                spans: Vec::new(),
            })?;
            self.executed.borrow_mut().push(path.to_owned());
            let ast = parse(&self.map, path, source)?;
            let program = resolve(&self.map, ast, &Dialect::STRICT, &self.env)?;
            let module = Rc::new(Module::new(path, &program));
            eval_module(&program, &module, thread, &self.env)?;
            Ok(module)
        })
    }
}

fn run_root(sources: &[(&str, &str)], root: &str) -> Result<Rc<Module>, Diagnostic> {
    let loader = Rc::new(SourceLoader::new(sources));
    let mut thread = Thread::new(&Dialect::STRICT);
    thread.set_loader(loader.clone());
    loader.load(&mut thread, root)
}

#[test]
fn loaded_symbols_are_bound_in_the_file_block() {
    let m = run_root(
        &[
            ("lib.sky", "answer = 42\ndouble = 2 * answer\n"),
            (
                "root.sky",
                "load(\"lib.sky\", \"answer\", d = \"double\")\nresult = answer + d\n",
            ),
        ],
        "root.sky",
    )
    .unwrap();
    assert_eq!("126", m.get("result").unwrap().to_repr());
    // File-block names are not globals of the importing module.
    assert!(m.get("answer").is_none());
}

#[test]
fn loads_are_memoized() {
    let loader = Rc::new(SourceLoader::new(&[
        ("dep.sky", "x = 1\n"),
        ("a.sky", "load(\"dep.sky\", \"x\")\na = x\n"),
        ("b.sky", "load(\"dep.sky\", \"x\")\nb = x\n"),
        (
            "root.sky",
            "load(\"a.sky\", \"a\")\nload(\"b.sky\", \"b\")\ntotal = a + b\n",
        ),
    ]));
    let mut thread = Thread::new(&Dialect::STRICT);
    thread.set_loader(loader.clone());
    let m = loader.load(&mut thread, "root.sky").unwrap();
    assert_eq!("2", m.get("total").unwrap().to_repr());
    // The shared dependency's top level ran exactly once.
    let executed = loader.executed.borrow();
    assert_eq!(
        1,
        executed.iter().filter(|p| p.as_str() == "dep.sky").count()
    );
}

#[test]
fn load_cycles_are_detected() {
    let err = run_root(
        &[
            ("a.sky", "load(\"b.sky\", \"y\")\nx = 1\n"),
            ("b.sky", "load(\"a.sky\", \"x\")\ny = 1\n"),
        ],
        "a.sky",
    )
    .unwrap_err();
    assert_eq!(
        Some(loader::LOAD_CYCLE_ERROR_CODE.to_owned()),
        err.code
    );
    assert_eq!(
        Some(skylark::errors::ErrorKind::Load),
        skylark::errors::ErrorKind::of(&err)
    );
}

#[test]
fn a_module_is_frozen_once_loaded() {
    // The canonical freeze scenario: another module may call `f`, but `f`
    // can no longer mutate its module's globals.
    let err = run_root(
        &[
            ("lib.sky", "L = [1]\ndef f():\n  L.append(2)\n"),
            ("root.sky", "load(\"lib.sky\", \"f\")\nf()\n"),
        ],
        "root.sky",
    )
    .unwrap_err();
    assert_eq!(
        Some(skylark::values::error::FROZEN_VALUE_ERROR_CODE.to_owned()),
        err.code
    );
}

#[test]
fn private_symbols_cannot_be_imported() {
    let err = run_root(
        &[
            ("lib.sky", "_secret = 1\n"),
            ("root.sky", "load(\"lib.sky\", s = \"_secret\")\n"),
        ],
        "root.sky",
    )
    .unwrap_err();
    assert_eq!(Some("CM03".to_owned()), err.code);
}

#[test]
fn missing_symbols_are_reported() {
    let err = run_root(
        &[
            ("lib.sky", "x = 1\n"),
            ("root.sky", "load(\"lib.sky\", \"nope\")\n"),
        ],
        "root.sky",
    )
    .unwrap_err();
    assert_eq!(Some("CM01".to_owned()), err.code);
}

#[test]
fn loading_without_a_loader_is_an_error() {
    let map = Arc::new(Mutex::new(CodeMap::new()));
    let env = global_environment();
    env.freeze();
    let ast = parse(&map, "root.sky", "load(\"lib.sky\", \"x\")\n").unwrap();
    let program = resolve(&map, ast, &Dialect::STRICT, &env).unwrap();
    let module = Rc::new(Module::new("root", &program));
    let mut thread = Thread::new(&Dialect::STRICT);
    let err = eval_module(&program, &module, &mut thread, &env).unwrap_err();
    assert_eq!(Some(loader::NO_LOADER_ERROR_CODE.to_owned()), err.code);
}
