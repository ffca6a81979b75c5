//! Positions inside the step tree and the pure advancement rules
//!
//! A [`Position`] is a path of indices: `[i]` is the i-th top-level step,
//! `[i, j]` the j-th child of block `i`, and so on. Every operation returns a
//! new value; nothing here mutates a position in place.

use super::step::Step;
use serde::Serialize;
use std::fmt;

/// Path of indices addressing one step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Position(Vec<usize>);

impl Position {
    /// The first top-level step
    pub fn root() -> Self {
        Position(vec![0])
    }

    pub fn from_indices(indices: impl Into<Vec<usize>>) -> Self {
        Position(indices.into())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// First child of the block at this position
    pub fn descend(&self) -> Self {
        self.child(0)
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Position(indices)
    }

    /// Same depth, one step further
    pub fn next_sibling(&self) -> Self {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last += 1;
        }
        Position(indices)
    }

    /// Enclosing block, `None` at the top level
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            return None;
        }
        let mut indices = self.0.clone();
        indices.pop();
        Some(Position(indices))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{index}")?;
        }
        f.write_str("]")
    }
}

/// Resolve a position to the step it addresses.
///
/// Descends into a block only while more indices remain. `None` means there
/// is no step at that index of the innermost sequence.
pub fn lookup<'a>(steps: &'a [Step], position: &Position) -> Option<&'a Step> {
    lookup_path(steps, position.indices())
}

fn lookup_path<'a>(steps: &'a [Step], path: &[usize]) -> Option<&'a Step> {
    let (&head, tail) = path.split_first()?;
    let step = steps.get(head)?;
    match step.children() {
        Some(children) if !tail.is_empty() => lookup_path(children, tail),
        _ => Some(step),
    }
}

/// Outcome of [`advance`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// Position of the next step to interpret
    pub next: Position,
    /// `if` blocks that ran out of children on the way, innermost first
    pub exited: Vec<Position>,
}

/// Compute where control goes once the step at `position` has finished.
///
/// An exhausted `if` is left for good and advancement continues from it. An
/// exhausted `while` yields the loop's own position so its condition is
/// checked again. Running off the end of the top level yields the
/// out-of-range index `[len]`.
pub fn advance(steps: &[Step], position: &Position) -> Advance {
    let mut exited = Vec::new();
    let next = advance_from(steps, position, &mut exited);
    Advance { next, exited }
}

fn advance_from(steps: &[Step], position: &Position, exited: &mut Vec<Position>) -> Position {
    let sibling = position.next_sibling();
    if lookup(steps, &sibling).is_some() {
        return sibling;
    }

    let Some(parent) = position.parent() else {
        return sibling;
    };

    if let Some(Step::If(_)) = lookup(steps, &parent) {
        exited.push(parent.clone());
        return advance_from(steps, &parent, exited);
    }

    parent
}
