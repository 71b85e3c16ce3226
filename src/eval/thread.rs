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

//! The per-execution context.
//!
//! A `Thread` is not a concurrency primitive: it exists so that everything
//! mutable during one execution (call stack, step budget, host hooks) lives
//! in one place, letting frozen modules be shared between real threads
//! without synchronization.

use crate::eval::call_stack::CallStack;
use crate::eval::loader::FileLoader;
use crate::syntax::dialect::Dialect;
use crate::values::error::RuntimeError;
use std::any::Any;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Error codes -- CN = Critical thread coNtrol
pub const CANCELLED_ERROR_CODE: &str = "CN00";
pub const STEP_LIMIT_ERROR_CODE: &str = "CN01";
pub const STACK_OVERFLOW_ERROR_CODE: &str = "CN02";

const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// The state carried through one execution: call stack, step counting,
/// cancellation, and the host's hooks (print handler, file loader, opaque
/// state).
pub struct Thread {
    pub(crate) call_stack: CallStack,
    max_call_depth: usize,
    steps: u64,
    step_limit: Option<u64>,
    cancelled: Arc<AtomicBool>,
    print_handler: Box<dyn Fn(&str)>,
    pub(crate) loader: Option<Rc<dyn FileLoader>>,
    pub(crate) recursion_enabled: bool,
    state: Option<Box<dyn Any>>,
}

impl Thread {
    pub fn new(dialect: &Dialect) -> Thread {
        Thread {
            call_stack: CallStack::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            steps: 0,
            step_limit: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            print_handler: Box::new(|s| eprintln!("{}", s)),
            loader: None,
            recursion_enabled: dialect.allow_recursion,
            state: None,
        }
    }

    /// Number of statements executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Terminate execution with an error once this many statements have
    /// run. Usable as a fuel limit.
    pub fn set_step_limit(&mut self, limit: u64) {
        self.step_limit = Some(limit);
    }

    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.max_call_depth = depth;
    }

    pub(crate) fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// The cooperative cancellation flag. Another thread may set it; the
    /// execution observes it between statements.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Replace the handler backing the `print` built-in. The default writes
    /// to standard error.
    pub fn set_print_handler<F: Fn(&str) + 'static>(&mut self, handler: F) {
        self.print_handler = Box::new(handler);
    }

    pub(crate) fn print(&self, line: &str) {
        (self.print_handler)(line);
    }

    /// The callback used to resolve `load()` statements.
    pub fn set_loader(&mut self, loader: Rc<dyn FileLoader>) {
        self.loader = Some(loader);
    }

    /// Host-opaque state, for native functions that need it.
    pub fn set_state<T: Any>(&mut self, state: T) {
        self.state = Some(Box::new(state));
    }

    pub fn state<T: Any>(&self) -> Option<&T> {
        self.state.as_ref().and_then(|s| s.downcast_ref())
    }

    pub fn state_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.state.as_mut().and_then(|s| s.downcast_mut())
    }

    /// The between-statements check: counts a step, then tests the budget
    /// and the cancellation flag.
    pub(crate) fn check_step(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        if let Some(limit) = self.step_limit {
            if self.steps > limit {
                return Err(RuntimeError {
                    code: STEP_LIMIT_ERROR_CODE,
                    message: format!("Execution exceeded the step budget of {}", limit),
                    label: "step budget exceeded".to_owned(),
                });
            }
        }
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(RuntimeError {
                code: CANCELLED_ERROR_CODE,
                message: "Execution was cancelled".to_owned(),
                label: "cancelled".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_budget() {
        let mut t = Thread::new(&Dialect::STRICT);
        t.set_step_limit(2);
        assert!(t.check_step().is_ok());
        assert!(t.check_step().is_ok());
        let e = t.check_step().unwrap_err();
        assert_eq!(STEP_LIMIT_ERROR_CODE, e.code);
    }

    #[test]
    fn cancellation() {
        let mut t = Thread::new(&Dialect::STRICT);
        let flag = t.cancellation_flag();
        assert!(t.check_step().is_ok());
        flag.store(true, Ordering::Relaxed);
        let e = t.check_step().unwrap_err();
        assert_eq!(CANCELLED_ERROR_CODE, e.code);
    }

    #[test]
    fn opaque_state() {
        let mut t = Thread::new(&Dialect::STRICT);
        t.set_state(42i32);
        assert_eq!(Some(&42), t.state::<i32>());
        assert_eq!(None, t.state::<String>());
    }
}
