//! Structural validation, run once before a conversation starts

use super::callback::{CompletionHook, Condition};
use super::cursor::Position;
use super::step::{Block, InputStep, OutputStep, Step};
use std::sync::Arc;
use thiserror::Error;

/// Malformed script. Raised before any message is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("step {position} defines {populated} of input, output, if, while; exactly one is required")]
    AmbiguousStep { position: Position, populated: usize },
    #[error("step {position} defines none of input, output, if, while")]
    EmptyStep { position: Position },
    #[error("{kind} block at {position} has no children")]
    EmptyBlock {
        position: Position,
        kind: &'static str,
    },
}

/// Authoring shape of a block: condition, children and optional hook
#[derive(Clone)]
pub struct BlockDefinition {
    pub condition: Arc<dyn Condition>,
    pub children: Vec<StepDefinition>,
    pub complete: Option<Arc<dyn CompletionHook>>,
}

impl BlockDefinition {
    pub fn new(condition: impl Condition + 'static, children: Vec<StepDefinition>) -> Self {
        Self {
            condition: Arc::new(condition),
            children,
            complete: None,
        }
    }
}

/// Authoring shape of a step: four optional slots, exactly one of which
/// must be filled
#[derive(Clone, Default)]
pub struct StepDefinition {
    pub output: Option<OutputStep>,
    pub input: Option<InputStep>,
    pub if_block: Option<BlockDefinition>,
    pub while_block: Option<BlockDefinition>,
}

impl StepDefinition {
    fn populated(&self) -> usize {
        usize::from(self.output.is_some())
            + usize::from(self.input.is_some())
            + usize::from(self.if_block.is_some())
            + usize::from(self.while_block.is_some())
    }
}

/// Check that every block, at every depth, has at least one child
pub(crate) fn check_steps(steps: &[Step], prefix: &[usize]) -> Result<(), ScriptError> {
    for (index, step) in steps.iter().enumerate() {
        let path = child_path(prefix, index);
        if let Some(children) = step.children() {
            if children.is_empty() {
                return Err(ScriptError::EmptyBlock {
                    position: Position::from_indices(path),
                    kind: step.kind(),
                });
            }
            check_steps(children, &path)?;
        }
    }
    Ok(())
}

/// Convert authoring definitions into typed steps
pub(crate) fn compile_definitions(
    definitions: Vec<StepDefinition>,
    prefix: &[usize],
) -> Result<Vec<Step>, ScriptError> {
    definitions
        .into_iter()
        .enumerate()
        .map(|(index, definition)| compile_definition(definition, &child_path(prefix, index)))
        .collect()
}

fn compile_definition(definition: StepDefinition, path: &[usize]) -> Result<Step, ScriptError> {
    let position = || Position::from_indices(path.to_vec());
    match definition.populated() {
        0 => return Err(ScriptError::EmptyStep { position: position() }),
        1 => {}
        populated => {
            return Err(ScriptError::AmbiguousStep {
                position: position(),
                populated,
            })
        }
    }

    let StepDefinition {
        output,
        input,
        if_block,
        while_block,
    } = definition;

    if let Some(output) = output {
        return Ok(Step::Output(output));
    }
    if let Some(input) = input {
        return Ok(Step::Input(input));
    }
    if let Some(block) = if_block {
        return Ok(Step::If(compile_block(block, path, "if")?));
    }
    match while_block {
        Some(block) => Ok(Step::While(compile_block(block, path, "while")?)),
        None => Err(ScriptError::EmptyStep { position: position() }),
    }
}

fn compile_block(
    block: BlockDefinition,
    path: &[usize],
    kind: &'static str,
) -> Result<Block, ScriptError> {
    if block.children.is_empty() {
        return Err(ScriptError::EmptyBlock {
            position: Position::from_indices(path.to_vec()),
            kind,
        });
    }
    Ok(Block {
        condition: block.condition,
        children: compile_definitions(block.children, path)?,
        complete: block.complete,
    })
}

fn child_path(prefix: &[usize], index: usize) -> Vec<usize> {
    let mut path = prefix.to_vec();
    path.push(index);
    path
}
