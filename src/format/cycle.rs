//! Recursion tracking for nested formatters.

use std::fmt;

use crate::catalog::TableId;

/// Placeholder prefix emitted when a formatter chain would recurse.
pub const CYCLE_DETECTED: &str = "<Cycle Detected.>";

/// What the engine was doing with a table on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatOp {
    Formatting,
    Aggregating,
}

impl fmt::Display for FormatOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatOp::Formatting => write!(f, "formatting"),
            FormatOp::Aggregating => write!(f, "aggregating"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    table: TableId,
    name: String,
    op: FormatOp,
}

/// The active chain of (table, operation) pairs of one compilation.
///
/// Immutable: [`CycleStack::push`] returns an extended copy, so each nested
/// call sees exactly the chain that led to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStack {
    frames: Vec<Frame>,
}

impl CycleStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn push(&self, table: TableId, name: &str, op: FormatOp) -> Self {
        let mut frames = self.frames.clone();
        frames.push(Frame {
            table,
            name: name.to_string(),
            op,
        });
        Self { frames }
    }

    pub fn contains(&self, table: TableId) -> bool {
        self.frames.iter().any(|f| f.table == table)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// `A(formatting) -> B(aggregating) -> next`
    pub fn describe(&self, next: &str) -> String {
        let mut parts: Vec<String> = self
            .frames
            .iter()
            .map(|f| format!("{}({})", f.name, f.op))
            .collect();
        parts.push(next.to_string());
        parts.join(" -> ")
    }

    /// Literal text that replaces a formatter that would re-enter the stack.
    pub fn placeholder(&self, next: &str) -> String {
        format!("{}: {}", CYCLE_DETECTED, self.describe(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_does_not_mutate() {
        let base = CycleStack::new();
        let extended = base.push(TableId(0), "CollectionObject", FormatOp::Aggregating);
        assert!(base.is_empty());
        assert_eq!(extended.len(), 1);
        assert!(extended.contains(TableId(0)));
        assert!(!extended.contains(TableId(1)));
    }

    #[test]
    fn test_placeholder() {
        let stack = CycleStack::new()
            .push(TableId(0), "CollectionObject", FormatOp::Aggregating)
            .push(TableId(1), "Collector", FormatOp::Formatting);
        assert_eq!(
            stack.placeholder("CollectionObject"),
            "<Cycle Detected.>: CollectionObject(aggregating) -> Collector(formatting) -> CollectionObject"
        );
    }
}
