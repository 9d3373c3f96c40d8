// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command batches: the unit of scheduling.

use crate::{BatchError, BatchId, CommandSpec, PipelineExecutionResult, Value};
use serde::{Deserialize, Serialize};

/// Completion callback for a batch. Invoked at most once, on the thread that
/// finished the batch.
pub type CompletionCallback = Box<dyn FnOnce(PipelineExecutionResult) + Send + 'static>;

/// How a batch is wired into the interpreter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchFlags {
    pub add_to_history: bool,
    /// Treat every command as script text.
    pub run_as_script: bool,
    pub use_local_scope: bool,
    /// Append the default-output step, merging errors into output.
    pub append_default_output: bool,
}

impl BatchFlags {
    /// Flags for a line typed at the console.
    pub fn interactive() -> Self {
        Self { add_to_history: true, append_default_output: true, ..Self::default() }
    }
}

/// An immutable description of one unit of work plus its completion callback.
pub struct CommandBatch {
    id: BatchId,
    commands: Vec<CommandSpec>,
    input: Vec<Value>,
    flags: BatchFlags,
    on_complete: Option<CompletionCallback>,
}

/// Everything about a batch except its callback.
#[derive(Debug, Clone)]
pub struct BatchParts {
    pub id: BatchId,
    pub commands: Vec<CommandSpec>,
    pub input: Vec<Value>,
    pub flags: BatchFlags,
}

impl CommandBatch {
    pub fn builder() -> CommandBatchBuilder {
        CommandBatchBuilder::default()
    }

    /// A batch holding a single script command and default flags.
    pub fn script(text: impl Into<String>) -> Self {
        Self::single(CommandSpec::script(text), BatchFlags::default())
    }

    /// A batch for a console line: script text, recorded in history, with
    /// default output appended.
    pub fn interactive(text: impl Into<String>) -> Self {
        Self::single(CommandSpec::script(text), BatchFlags::interactive())
    }

    fn single(command: CommandSpec, flags: BatchFlags) -> Self {
        Self { id: BatchId::new(), commands: vec![command], input: Vec::new(), flags, on_complete: None }
    }

    pub fn id(&self) -> &BatchId {
        &self.id
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn input(&self) -> &[Value] {
        &self.input
    }

    pub fn flags(&self) -> BatchFlags {
        self.flags
    }

    pub fn has_callback(&self) -> bool {
        self.on_complete.is_some()
    }

    /// Replace the completion callback.
    pub fn on_complete(
        mut self,
        f: impl FnOnce(PipelineExecutionResult) + Send + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Run `next` after the existing callback (if any). The existing callback
    /// receives a copy of the result, `next` receives the original.
    pub fn chain_completion(
        mut self,
        next: impl FnOnce(PipelineExecutionResult) + Send + 'static,
    ) -> Self {
        let chained: CompletionCallback = match self.on_complete.take() {
            Some(first) => Box::new(move |result: PipelineExecutionResult| {
                first(result.clone());
                next(result);
            }),
            None => Box::new(next),
        };
        self.on_complete = Some(chained);
        self
    }

    /// Split into the execution description and the callback.
    pub fn into_parts(self) -> (BatchParts, Option<CompletionCallback>) {
        let parts = BatchParts {
            id: self.id,
            commands: self.commands,
            input: self.input,
            flags: self.flags,
        };
        (parts, self.on_complete)
    }
}

impl std::fmt::Debug for CommandBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBatch")
            .field("id", &self.id)
            .field("commands", &self.commands)
            .field("input", &self.input)
            .field("flags", &self.flags)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Builder for [`CommandBatch`].
#[derive(Default)]
pub struct CommandBatchBuilder {
    commands: Vec<CommandSpec>,
    input: Vec<Value>,
    flags: BatchFlags,
    on_complete: Option<CompletionCallback>,
}

impl CommandBatchBuilder {
    crate::setters! {
        set { flags: BatchFlags }
    }

    pub fn command(mut self, spec: CommandSpec) -> Self {
        self.commands.push(spec);
        self
    }

    pub fn script(self, text: impl Into<String>) -> Self {
        self.command(CommandSpec::script(text))
    }

    pub fn commands(mut self, specs: impl IntoIterator<Item = CommandSpec>) -> Self {
        self.commands.extend(specs);
        self
    }

    pub fn input(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.input.extend(values);
        self
    }

    pub fn add_to_history(mut self, v: bool) -> Self {
        self.flags.add_to_history = v;
        self
    }

    pub fn run_as_script(mut self, v: bool) -> Self {
        self.flags.run_as_script = v;
        self
    }

    pub fn use_local_scope(mut self, v: bool) -> Self {
        self.flags.use_local_scope = v;
        self
    }

    pub fn append_default_output(mut self, v: bool) -> Self {
        self.flags.append_default_output = v;
        self
    }

    pub fn on_complete(
        mut self,
        f: impl FnOnce(PipelineExecutionResult) + Send + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Result<CommandBatch, BatchError> {
        if self.commands.is_empty() {
            return Err(BatchError::NoCommands);
        }
        Ok(CommandBatch {
            id: BatchId::new(),
            commands: self.commands,
            input: self.input,
            flags: self.flags,
            on_complete: self.on_complete,
        })
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
