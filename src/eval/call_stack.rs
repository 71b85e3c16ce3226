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

//! The call stack of a thread: one frame per in-progress call, used for
//! recursion detection, the depth limit and backtrace rendering.

use crate::values::{FunctionId, Value};
use codemap::{CodeMap, Pos};
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct Frame {
    function: Value,
    map: Arc<Mutex<CodeMap>>,
    pos: Pos,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frame").field(&self.function).finish()
    }
}

/// The stack of in-progress calls.
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    stack: Vec<Frame>,
}

impl CallStack {
    /// Push a frame for a call to `function` at source position `pos`.
    pub fn push(&mut self, function: Value, map: Arc<Mutex<CodeMap>>, pos: Pos) {
        self.stack.push(Frame {
            function,
            map,
            pos,
        });
    }

    /// Pop a frame; panics if the stack is empty.
    pub fn pop(&mut self) {
        self.stack.pop().unwrap();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether a function with the given body identity is being called.
    pub fn contains(&self, function_id: FunctionId) -> bool {
        self.stack
            .iter()
            .any(|frame| frame.function.function_id() == Some(function_id))
    }

    /// Render the stack as lines each starting with a newline, innermost
    /// call last printed first.
    pub fn print_with_newline_before(&self) -> impl fmt::Display + '_ {
        DisplayWithNewlineBefore { call_stack: self }
    }
}

struct DisplayWithNewlineBefore<'a> {
    call_stack: &'a CallStack,
}

impl<'a> fmt::Display for DisplayWithNewlineBefore<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.call_stack.stack.iter().rev() {
            let loc = { frame.map.lock().unwrap().look_up_pos(frame.pos) };
            // Lines are 0-based in the code map; add 1 for human output.
            write!(
                f,
                "\n    call to {} at {}:{}",
                frame.function.to_str(),
                loc.file.name(),
                loc.position.line + 1,
            )?;
        }
        Ok(())
    }
}
