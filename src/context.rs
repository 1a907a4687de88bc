use std::collections::HashMap;

use tracing::debug;

use crate::engine::Engine;
use crate::errors::Result;
use crate::expression::{self, Program};
use crate::functions::Registry;
use crate::value::Value;

/// Filename reported in diagnostics when none is configured.
pub const DEFAULT_FILENAME: &str = "(embedded-script-eval)";

/// The entry point for all communication with the evaluator.
///
/// A context owns the global bindings and the function registry scripts run
/// against. Globals survive across `load_string` calls on the same context:
///
/// ```
/// use embedded_script_eval::Context;
///
/// let mut ctx = Context::new();
/// ctx.load_string("x = 2").unwrap();
/// let result = ctx.load_string("x * 21").unwrap();
/// assert_eq!(result.as_i64().unwrap(), 42);
/// ```
pub struct Context {
    filename: String,
    registry: Registry,
    globals: HashMap<String, Value>,
    step_limit: Option<u64>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A context with the builtin function registry, no globals, and no
    /// step limit.
    pub fn new() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            registry: Registry::with_builtins(),
            globals: HashMap::new(),
            step_limit: None,
        }
    }

    /// Sets the filename used in diagnostics.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Caps the number of evaluation steps per run. `None` means unlimited.
    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn with_global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(name.into(), value.into());
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn step_limit(&self) -> Option<u64> {
        self.step_limit
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.globals.insert(name.into(), value.into());
    }

    /// Parses source text into a [`Program`] that can be run many times.
    pub fn parse(&self, code: &str) -> Result<Program> {
        debug!(filename = %self.filename, bytes = code.len(), "parsing script");
        expression::parse_program(code)
    }

    /// Runs a previously parsed program against this context's globals.
    pub fn run(&mut self, program: &Program) -> Result<Value> {
        debug!(
            filename = %self.filename,
            statements = program.stmts.len(),
            "running script"
        );
        Engine::new(&self.registry, &mut self.globals, self.step_limit).run(program)
    }

    /// Like [`Context::run`], with the given values bound to the `ARGV`
    /// global for the duration of this and later runs.
    pub fn run_with_args(&mut self, program: &Program, args: Vec<Value>) -> Result<Value> {
        self.globals.insert("ARGV".to_string(), Value::Array(args));
        self.run(program)
    }

    /// Parses and runs a snippet, returning its value.
    pub fn load_string(&mut self, code: &str) -> Result<Value> {
        let program = self.parse(code)?;
        self.run(&program)
    }

    /// Parses and runs a snippet with `ARGV` bound to the given values.
    pub fn load_string_with_args(&mut self, code: &str, args: Vec<Value>) -> Result<Value> {
        let program = self.parse(code)?;
        self.run_with_args(&program, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn globals_survive_across_runs() {
        let mut ctx = Context::new();
        ctx.load_string("counter = 1").unwrap();
        ctx.load_string("counter = counter + 1").unwrap();
        assert_eq!(ctx.global("counter"), Some(&Value::Fixnum(2)));
    }

    #[test]
    fn host_globals_are_visible_to_scripts() {
        let mut ctx = Context::new().with_global("greeting", "Hello");
        let out = ctx.load_string("greeting + ' World'").unwrap();
        assert_eq!(out, Value::Str("Hello World".into()));
    }

    #[test]
    fn argv_binding() {
        let mut ctx = Context::new();
        let out = ctx
            .load_string_with_args(
                "sum(ARGV)",
                vec![Value::Fixnum(1), Value::Fixnum(2), Value::Float(3.5)],
            )
            .unwrap();
        assert_eq!(out, Value::Float(6.5));
        // ARGV is an ordinary global afterwards.
        assert_eq!(ctx.load_string("ARGV[0]").unwrap(), Value::Fixnum(1));
    }

    #[test]
    fn parse_once_run_twice() {
        let mut ctx = Context::new();
        let program = ctx.parse("a = 'Hello'\nb = 'World'\na + b").unwrap();
        assert_eq!(ctx.run(&program).unwrap(), Value::Str("HelloWorld".into()));
        assert_eq!(ctx.run(&program).unwrap(), Value::Str("HelloWorld".into()));
    }

    #[test]
    fn empty_program_is_nil() {
        let mut ctx = Context::new();
        assert_eq!(ctx.load_string("").unwrap(), Value::Nil);
    }

    #[test]
    fn defaults() {
        let ctx = Context::new();
        assert_eq!(ctx.filename(), DEFAULT_FILENAME);
        assert_eq!(ctx.step_limit(), None);
        assert!(ctx.registry().contains("len"));

        let ctx = Context::new()
            .with_filename("demo.ese")
            .with_step_limit(Some(10));
        assert_eq!(ctx.filename(), "demo.ese");
        assert_eq!(ctx.step_limit(), Some(10));
    }
}
