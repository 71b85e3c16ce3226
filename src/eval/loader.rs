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

//! Resolution of `load()` statements: the host-supplied callback, plus the
//! memoizing, cycle-detecting cache most hosts wrap it in.

use crate::eval::module::Module;
use crate::eval::thread::Thread;
use codemap_diagnostic::{Diagnostic, Level};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// Error codes -- CD = Critical loaDing
pub const LOAD_CYCLE_ERROR_CODE: &str = "CD00";
pub const NO_LOADER_ERROR_CODE: &str = "CD01";

/// The host side of the `load()` statement: map a module path to an
/// initialized module.
pub trait FileLoader {
    fn load(&self, thread: &mut Thread, path: &str) -> Result<Rc<Module>, Diagnostic>;
}

enum CacheEntry {
    /// The module's top-level statements are currently executing.
    Initializing,
    Loaded(Rc<Module>),
}

/// Memoization and cycle detection for loaders.
///
/// Completed modules are returned as-is on repeated loads; a request for a
/// module whose initialization is still in flight is a load cycle.
#[derive(Default)]
pub struct ModuleCache {
    entries: RefCell<HashMap<String, CacheEntry>>,
}

impl ModuleCache {
    pub fn new() -> ModuleCache {
        Default::default()
    }

    /// Run `f` to produce the module for `path`, unless it is already
    /// cached. Reentrant: `f` will usually recurse into further loads.
    pub fn load_with<F>(&self, path: &str, f: F) -> Result<Rc<Module>, Diagnostic>
    where
        F: FnOnce() -> Result<Rc<Module>, Diagnostic>,
    {
        {
            let mut entries = self.entries.borrow_mut();
            match entries.get(path) {
                Some(CacheEntry::Loaded(m)) => return Ok(m.clone()),
                Some(CacheEntry::Initializing) => {
                    return Err(Diagnostic {
                        level: Level::Error,
                        message: format!(
                            "Load cycle detected: module '{}' is still initializing",
                            path
                        ),
                        code: Some(LOAD_CYCLE_ERROR_CODE.to_owned()),
                        spans: Vec::new(),
                    });
                }
                None => {
                    entries.insert(path.to_owned(), CacheEntry::Initializing);
                }
            }
        }
        match f() {
            Ok(module) => {
                self.entries
                    .borrow_mut()
                    .insert(path.to_owned(), CacheEntry::Loaded(module.clone()));
                Ok(module)
            }
            Err(e) => {
                // Allow the host to retry after a failure.
                self.entries.borrow_mut().remove(path);
                Err(e)
            }
        }
    }
}
