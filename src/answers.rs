//! Collected answers and the read-only view handed to script callbacks

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Answers collected during one conversation, keyed by input name.
///
/// A name visited several times inside a `while` block accumulates one value
/// per visit, in submission order. Values are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerStore {
    values: BTreeMap<String, Vec<String>>,
}

impl AnswerStore {
    /// Append a value under `name`, creating the sequence if needed
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, values)` in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Read-only view over the answers at the moment a callback runs.
///
/// Cloning is cheap: the store is shared and the runtime copies it on write,
/// so a context never observes answers submitted after it was handed out.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    answers: Arc<AnswerStore>,
}

impl ChatContext {
    pub fn new(answers: Arc<AnswerStore>) -> Self {
        Self { answers }
    }

    /// All values collected for `name`, oldest first
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.answers.get(name)
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)?.first().map(String::as_str)
    }

    pub fn last(&self, name: &str) -> Option<&str> {
        self.get(name)?.last().map(String::as_str)
    }
}
