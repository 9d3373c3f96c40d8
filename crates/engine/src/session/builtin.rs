// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal builtin interpreter session.
//!
//! Supports a handful of commands, enough to drive the engine end to end:
//!
//! | Command              | Effect                                          |
//! |----------------------|-------------------------------------------------|
//! | `echo [args..]`      | emit each argument; no arguments passes input   |
//! | `write-error <msg>`  | write a non-terminating error                   |
//! | `throw-error [msg]`  | terminating error                               |
//! | `sleep <ms>`         | wait, honouring stop requests                   |
//! | `set <name> <value>` | assign a variable                               |
//! | `get <name>`         | emit a variable                                 |
//! | `count`              | emit the number of input values                 |
//! | `history`            | emit recorded history entries                   |
//! | `out-default`        | pass input through                              |
//!
//! Script text splits statements on `;` and newlines and chains stages with
//! `|`. Unquoted arguments that parse as JSON (other than strings) become
//! JSON values, so `echo 1` emits the number 1.

use super::{
    InterpreterSession, InvocationContext, PipelineSpec, ScriptError, SessionError,
    SessionPipeline, SessionState,
};
use parking_lot::Mutex;
use porch_core::{BatchFlags, CommandSpec, ErrorRecord, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Granularity at which `sleep` checks for stop requests.
const SLEEP_SLICE: Duration = Duration::from_millis(5);
/// Longest accepted `sleep`.
const MAX_SLEEP: Duration = Duration::from_secs(24 * 60 * 60);

// ---------------------------------------------------------------------------
// Lexing and parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word { text: String, quoted: bool },
    Pipe,
    Separator,
}

/// Split text into words. Separators and pipes are only recognised in script
/// text; a plain command treats them as ordinary characters.
fn lex(text: &str, script: bool) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = text.chars();

    fn flush(tokens: &mut Vec<Token>, word: &mut String, in_word: &mut bool, quoted: &mut bool) {
        if *in_word {
            tokens.push(Token::Word { text: std::mem::take(word), quoted: *quoted });
        }
        *in_word = false;
        *quoted = false;
    }

    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\'' => {
                let close = ch;
                in_word = true;
                quoted = true;
                loop {
                    match chars.next() {
                        Some(c) if c == close => break,
                        Some(c) => word.push(c),
                        None => return Err(format!("unterminated {} quote", close)),
                    }
                }
            }
            ';' | '\n' if script => {
                flush(&mut tokens, &mut word, &mut in_word, &mut quoted);
                tokens.push(Token::Separator);
            }
            '|' if script => {
                flush(&mut tokens, &mut word, &mut in_word, &mut quoted);
                tokens.push(Token::Pipe);
            }
            c if c.is_whitespace() => flush(&mut tokens, &mut word, &mut in_word, &mut quoted),
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    flush(&mut tokens, &mut word, &mut in_word, &mut quoted);
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
enum Builtin {
    Echo(Vec<Value>),
    WriteError(String),
    ThrowError(String),
    Sleep(Duration),
    Set(String, Value),
    Get(String),
    Count,
    History,
    OutDefault,
}

#[derive(Debug, Clone, PartialEq)]
struct Stage {
    name: String,
    builtin: Builtin,
}

#[derive(Debug, Clone, PartialEq)]
struct Statement {
    stages: Vec<Stage>,
}

#[derive(Debug, Clone, PartialEq)]
struct CompiledCommand {
    text: String,
    statements: Vec<Statement>,
    merge_errors: bool,
}

fn literal(text: String, quoted: bool) -> Value {
    if !quoted {
        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            if !value.is_string() {
                return value;
            }
        }
    }
    Value::String(text)
}

fn joined(args: &[(String, bool)]) -> Option<String> {
    if args.is_empty() {
        None
    } else {
        Some(args.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>().join(" "))
    }
}

fn parse_stage(words: Vec<(String, bool)>, source: &str) -> Result<Stage, SessionError> {
    let parse_err = |message: String| SessionError::Parse { text: source.to_string(), message };

    let mut words = words.into_iter();
    let Some((name, _)) = words.next() else {
        return Err(parse_err("empty pipeline stage".to_string()));
    };
    let args: Vec<(String, bool)> = words.collect();

    let no_args = |builtin: Builtin| {
        if args.is_empty() {
            Ok(builtin)
        } else {
            Err(parse_err(format!("`{}` takes no arguments", name)))
        }
    };

    let builtin = match name.as_str() {
        "echo" => Builtin::Echo(args.iter().cloned().map(|(t, q)| literal(t, q)).collect()),
        "write-error" => Builtin::WriteError(
            joined(&args).ok_or_else(|| parse_err("`write-error` needs a message".to_string()))?,
        ),
        "throw-error" | "throw" => {
            Builtin::ThrowError(joined(&args).unwrap_or_else(|| "script error".to_string()))
        }
        "sleep" => match args.as_slice() {
            [(ms, _)] => {
                let ms: u64 =
                    ms.parse().map_err(|_| parse_err(format!("invalid duration `{}`", ms)))?;
                let duration = Duration::from_millis(ms);
                if duration > MAX_SLEEP {
                    return Err(parse_err(format!(
                        "duration `{}` exceeds {} ms",
                        ms,
                        MAX_SLEEP.as_millis()
                    )));
                }
                Builtin::Sleep(duration)
            }
            _ => return Err(parse_err("usage: sleep <milliseconds>".to_string())),
        },
        "set" => match args.as_slice() {
            [(var, _), (value, quoted)] => Builtin::Set(var.clone(), literal(value.clone(), *quoted)),
            [(var, _), rest @ ..] if !rest.is_empty() => {
                Builtin::Set(var.clone(), Value::String(joined(rest).unwrap_or_default()))
            }
            _ => return Err(parse_err("usage: set <name> <value>".to_string())),
        },
        "get" => match args.as_slice() {
            [(var, _)] => Builtin::Get(var.clone()),
            _ => return Err(parse_err("usage: get <name>".to_string())),
        },
        "count" => no_args(Builtin::Count)?,
        "history" => no_args(Builtin::History)?,
        "out-default" => no_args(Builtin::OutDefault)?,
        other => return Err(SessionError::UnknownCommand(other.to_string())),
    };

    Ok(Stage { name, builtin })
}

fn compile(spec: &CommandSpec) -> Result<CompiledCommand, SessionError> {
    let tokens = lex(&spec.text, spec.is_script)
        .map_err(|message| SessionError::Parse { text: spec.text.clone(), message })?;

    let mut statements = Vec::new();
    let mut stages = Vec::new();
    let mut words = Vec::new();
    let mut saw_pipe = false;

    for token in tokens {
        match token {
            Token::Word { text, quoted } => words.push((text, quoted)),
            Token::Pipe => {
                stages.push(parse_stage(std::mem::take(&mut words), &spec.text)?);
                saw_pipe = true;
            }
            Token::Separator => {
                if !words.is_empty() || saw_pipe {
                    stages.push(parse_stage(std::mem::take(&mut words), &spec.text)?);
                }
                if !stages.is_empty() {
                    statements.push(Statement { stages: std::mem::take(&mut stages) });
                }
                saw_pipe = false;
            }
        }
    }
    if !words.is_empty() || saw_pipe {
        stages.push(parse_stage(words, &spec.text)?);
    }
    if !stages.is_empty() {
        statements.push(Statement { stages });
    }

    Ok(CompiledCommand { text: spec.text.clone(), statements, merge_errors: spec.merge_errors })
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct SessionData {
    state: SessionState,
    globals: HashMap<String, Value>,
    history: Vec<String>,
}

/// Counts invocations and the most that were ever active at once.
#[derive(Default)]
struct Activity {
    active: AtomicUsize,
    peak: AtomicUsize,
    invocations: AtomicUsize,
}

struct ActiveGuard<'a>(&'a Activity);

impl Activity {
    fn enter(&self) -> ActiveGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.invocations.fetch_add(1, Ordering::SeqCst);
        ActiveGuard(self)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Shared {
    data: Mutex<SessionData>,
    activity: Activity,
    startup: Vec<String>,
}

/// The builtin interpreter session. Cloning shares the same session.
#[derive(Clone)]
pub struct BuiltinSession {
    shared: Arc<Shared>,
}

impl Default for BuiltinSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinSession {
    pub fn new() -> Self {
        Self::with_startup(Vec::new())
    }

    /// A session that runs `lines` as script when it is opened.
    pub fn with_startup(lines: Vec<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                data: Mutex::new(SessionData {
                    state: SessionState::NotOpened,
                    globals: HashMap::new(),
                    history: Vec::new(),
                }),
                activity: Activity::default(),
                startup: lines,
            }),
        }
    }

    /// Highest number of pipelines ever running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.shared.activity.peak.load(Ordering::SeqCst)
    }

    /// Pipelines running right now.
    pub fn active(&self) -> usize {
        self.shared.activity.active.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> usize {
        self.shared.activity.invocations.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> Vec<String> {
        self.shared.data.lock().history.clone()
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.shared.data.lock().globals.get(name).cloned()
    }

    fn run_startup(&self) -> Result<(), SessionError> {
        let stop = CancellationToken::new();
        let runner = Runner { shared: &self.shared, flags: BatchFlags::default(), stop: &stop };
        let mut local = HashMap::new();
        for line in &self.shared.startup {
            let command = compile(&CommandSpec::script(line.as_str()))?;
            let mut out = Vec::new();
            runner
                .run_command(&command, Vec::new(), &mut out, &mut local)
                .map_err(|e| SessionError::Open(format!("startup `{}`: {}", line, e)))?;
        }
        Ok(())
    }
}

impl InterpreterSession for BuiltinSession {
    type Pipeline = BuiltinPipeline;

    fn open(&self) -> Result<(), SessionError> {
        {
            let mut data = self.shared.data.lock();
            match data.state {
                SessionState::NotOpened => {}
                SessionState::Opened => return Ok(()),
                state => return Err(SessionError::NotOpen(state)),
            }
            data.globals
                .insert("version".to_string(), Value::String(env!("CARGO_PKG_VERSION").into()));
            data.state = SessionState::Opened;
        }

        if let Err(e) = self.run_startup() {
            self.shared.data.lock().state = SessionState::Broken;
            return Err(e);
        }
        tracing::debug!(startup = self.shared.startup.len(), "builtin session opened");
        Ok(())
    }

    fn close(&self) -> Result<(), SessionError> {
        let mut data = self.shared.data.lock();
        if data.state.is_finished() {
            return Ok(());
        }
        data.state = SessionState::Closing;
        data.globals.clear();
        data.state = SessionState::Closed;
        tracing::debug!("builtin session closed");
        Ok(())
    }

    fn state(&self) -> SessionState {
        self.shared.data.lock().state
    }

    fn create_pipeline(&self, spec: &PipelineSpec) -> Result<BuiltinPipeline, SessionError> {
        let state = self.state();
        if state != SessionState::Opened {
            return Err(SessionError::NotOpen(state));
        }
        let commands = spec.commands.iter().map(compile).collect::<Result<Vec<_>, _>>()?;
        Ok(BuiltinPipeline { commands, flags: spec.flags, shared: Arc::clone(&self.shared) })
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// A stream element. Errors travel alongside output so that merging keeps
/// emission order.
#[derive(Debug, Clone, PartialEq)]
enum Item {
    Output(Value),
    Error(ErrorRecord),
}

pub struct BuiltinPipeline {
    commands: Vec<CompiledCommand>,
    flags: BatchFlags,
    shared: Arc<Shared>,
}

impl SessionPipeline for BuiltinPipeline {
    fn invoke(&mut self, ctx: &mut InvocationContext<'_>) -> Result<(), ScriptError> {
        let _active = self.shared.activity.enter();

        if self.flags.add_to_history {
            let mut data = self.shared.data.lock();
            for command in &self.commands {
                if command.text != porch_core::command::DEFAULT_OUTPUT_COMMAND {
                    data.history.push(command.text.clone());
                }
            }
        }

        let stop = ctx.stop_token().clone();
        let runner = Runner { shared: &self.shared, flags: self.flags, stop: &stop };
        let mut local = HashMap::new();
        let mut stream: Vec<Item> = ctx.take_input().into_iter().map(Item::Output).collect();
        let mut outcome = Ok(());

        for command in &self.commands {
            let mut out = Vec::new();
            let result = runner.run_command(command, std::mem::take(&mut stream), &mut out, &mut local);
            stream = out;
            if let Err(e) = result {
                outcome = Err(e);
                break;
            }
        }

        for item in stream {
            match item {
                Item::Output(value) => ctx.write_output(value),
                Item::Error(record) => ctx.write_error(record),
            }
        }
        outcome
    }
}

struct Runner<'a> {
    shared: &'a Shared,
    flags: BatchFlags,
    stop: &'a CancellationToken,
}

impl Runner<'_> {
    fn check_stop(&self) -> Result<(), ScriptError> {
        if self.stop.is_cancelled() {
            Err(ScriptError::Stopped)
        } else {
            Ok(())
        }
    }

    /// Run one command. The first statement receives `input`; later
    /// statements start empty. Everything produced lands in `out`, including
    /// partial output of a failing statement.
    fn run_command(
        &self,
        command: &CompiledCommand,
        input: Vec<Item>,
        out: &mut Vec<Item>,
        local: &mut HashMap<String, Value>,
    ) -> Result<(), ScriptError> {
        let mut input = Some(input);
        let mut result = Ok(());

        for statement in &command.statements {
            let mut current = input.take().unwrap_or_default();
            for stage in &statement.stages {
                if let Err(e) = self.check_stop() {
                    out.append(&mut current);
                    result = Err(e);
                    break;
                }
                let mut next = Vec::new();
                let stage_result = self.run_stage(stage, current, &mut next, local);
                current = next;
                if let Err(e) = stage_result {
                    result = Err(e);
                    break;
                }
            }
            out.append(&mut current);
            if result.is_err() {
                break;
            }
        }
        // A command with no statements still forwards its input.
        if let Some(mut unused) = input {
            out.append(&mut unused);
        }

        if command.merge_errors {
            for item in out.iter_mut() {
                if let Item::Error(record) = item {
                    *item = Item::Output(record.to_value());
                }
            }
        }
        result
    }

    fn run_stage(
        &self,
        stage: &Stage,
        input: Vec<Item>,
        out: &mut Vec<Item>,
        local: &mut HashMap<String, Value>,
    ) -> Result<(), ScriptError> {
        match &stage.builtin {
            Builtin::Echo(args) if args.is_empty() => out.extend(input),
            Builtin::Echo(args) => {
                pass_errors(input, out);
                out.extend(args.iter().cloned().map(Item::Output));
            }
            Builtin::WriteError(message) => {
                out.extend(input);
                out.push(Item::Error(ErrorRecord::from_command(&stage.name, message.as_str())));
            }
            Builtin::ThrowError(message) => {
                pass_errors(input, out);
                return Err(ScriptError::failed(message.as_str()));
            }
            Builtin::Sleep(duration) => {
                let Some(deadline) = Instant::now().checked_add(*duration) else {
                    return Err(ScriptError::failed("sleep duration out of range"));
                };
                loop {
                    if self.stop.is_cancelled() {
                        out.extend(input);
                        return Err(ScriptError::Stopped);
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    std::thread::sleep(SLEEP_SLICE.min(deadline - now));
                }
                out.extend(input);
            }
            Builtin::Set(name, value) => {
                out.extend(input);
                if self.flags.use_local_scope {
                    local.insert(name.clone(), value.clone());
                } else {
                    self.shared.data.lock().globals.insert(name.clone(), value.clone());
                }
            }
            Builtin::Get(name) => {
                pass_errors(input, out);
                let value = local
                    .get(name)
                    .cloned()
                    .or_else(|| self.shared.data.lock().globals.get(name).cloned());
                match value {
                    Some(value) => out.push(Item::Output(value)),
                    None => out.push(Item::Error(ErrorRecord::from_command(
                        &stage.name,
                        format!("variable `{}` is not defined", name),
                    ))),
                }
            }
            Builtin::Count => {
                let count = input.iter().filter(|i| matches!(i, Item::Output(_))).count();
                pass_errors(input, out);
                out.push(Item::Output(Value::from(count)));
            }
            Builtin::History => {
                pass_errors(input, out);
                let history = self.shared.data.lock().history.clone();
                out.extend(history.into_iter().map(|h| Item::Output(Value::String(h))));
            }
            Builtin::OutDefault => out.extend(input),
        }
        Ok(())
    }
}

/// Forward error items, dropping output values the stage does not consume.
fn pass_errors(input: Vec<Item>, out: &mut Vec<Item>) {
    out.extend(input.into_iter().filter(|i| matches!(i, Item::Error(_))));
}

#[cfg(test)]
#[path = "builtin_tests.rs"]
mod tests;
