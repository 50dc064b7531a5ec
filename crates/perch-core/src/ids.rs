use std::cell::Cell;
use std::fmt;

use uuid::Uuid;

/// Identifier source injected into the task store; see [`crate::clock::Clock`]
/// for the same seam on the time side.
pub trait IdGen: fmt::Debug {
    fn next_id(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGen for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Counting ids (`task-1`, `task-2`, ...) for deterministic tests.
#[derive(Debug)]
pub struct SeqIds {
    prefix: String,
    next: Cell<u64>,
}

impl SeqIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: Cell::new(1),
        }
    }
}

impl IdGen for SeqIds {
    fn next_id(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}-{n}", self.prefix)
    }
}
