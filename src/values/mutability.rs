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

//! The mutability header every mutable container carries: the frozen flag
//! and the count of iterations currently in flight.

use crate::values::error::ValueError;
use std::cell::Cell;

/// Frozen flag plus live-iterator count.
///
/// Freezing is a one-way transition; the iterator count is strictly positive
/// exactly while an iteration is in flight, and any mutation attempted in
/// that window fails.
#[derive(Debug, Default)]
pub struct Mutability {
    frozen: Cell<bool>,
    iterators: Cell<u32>,
}

impl Mutability {
    pub fn new() -> Mutability {
        Default::default()
    }

    /// Check that a mutation is currently permitted.
    ///
    /// To be called as `self.mutability.test()?` at the start of every
    /// mutating operation.
    pub fn test(&self) -> Result<(), ValueError> {
        if self.frozen.get() {
            return Err(ValueError::CannotMutateFrozenValue);
        }
        if self.iterators.get() > 0 {
            return Err(ValueError::MutationDuringIteration);
        }
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }

    /// Mark the container frozen. Returns true if it was mutable before, in
    /// which case the caller propagates the freeze to linked values.
    pub fn freeze(&self) -> bool {
        !self.frozen.replace(true)
    }

    pub(crate) fn begin_iteration(&self) {
        if !self.frozen.get() {
            self.iterators.set(self.iterators.get() + 1);
        }
    }

    pub(crate) fn end_iteration(&self) {
        if !self.frozen.get() {
            let n = self.iterators.get();
            debug_assert!(n > 0);
            self.iterators.set(n.saturating_sub(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_is_rejected_while_iterating() {
        let m = Mutability::new();
        assert_eq!(Ok(()), m.test());
        m.begin_iteration();
        m.begin_iteration();
        assert_eq!(Err(ValueError::MutationDuringIteration), m.test());
        m.end_iteration();
        assert_eq!(Err(ValueError::MutationDuringIteration), m.test());
        m.end_iteration();
        assert_eq!(Ok(()), m.test());
    }

    #[test]
    fn freeze_is_idempotent_and_one_way() {
        let m = Mutability::new();
        assert!(m.freeze());
        assert!(!m.freeze());
        assert_eq!(Err(ValueError::CannotMutateFrozenValue), m.test());
    }
}
