use tracing::debug;

use crate::context::Context;
use crate::errors::{Error, Result};
use crate::functions::Registry;
use crate::value::Value;

/// One-line guidance printed when the capability is missing.
pub const INSTALL_HINT: &str =
    "Please install the Sandbox gem from https://github.com/mattn/mruby-sandbox to run this example";

/// Environment variable that forces [`Availability::Unavailable`] even in
/// builds that carry the capability. Lets the absent-capability path be
/// exercised without recompiling.
pub const NO_SANDBOX_ENV: &str = "ESE_NO_SANDBOX";

/// Evaluation steps a sandbox grants per run unless configured otherwise.
pub const DEFAULT_STEP_LIMIT: u64 = 100_000;

/// Whether the sandboxed evaluation capability is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    /// Probes the running environment: the capability must be compiled in
    /// (cargo feature `sandbox`) and not disabled via [`NO_SANDBOX_ENV`].
    pub fn detect() -> Self {
        if cfg!(feature = "sandbox") && std::env::var_os(NO_SANDBOX_ENV).is_none() {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }

    pub fn is_available(self) -> bool {
        self == Availability::Available
    }
}

/// An isolated evaluator.
///
/// A sandbox owns a private [`Context`]: no globals are shared with any
/// other context, only the builtin registry is callable, and every run is
/// bounded by a step budget. State set by one `eval` persists to the next
/// on the same sandbox and nowhere else.
pub struct Sandbox {
    ctx: Context,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox").finish_non_exhaustive()
    }
}

impl Sandbox {
    /// Acquires the sandbox capability, failing with
    /// [`Error::SandboxUnavailable`] when it is absent.
    pub fn new() -> Result<Self> {
        Self::with_availability(Availability::detect())
    }

    /// Like [`Sandbox::new`] with an explicit capability probe result,
    /// so both outcomes stay reachable in tests.
    pub fn with_availability(availability: Availability) -> Result<Self> {
        match availability {
            Availability::Unavailable => Err(Error::SandboxUnavailable),
            Availability::Available => {
                debug!(step_limit = DEFAULT_STEP_LIMIT, "sandbox created");
                Ok(Self {
                    ctx: Context::new()
                        .with_filename("(sandbox)")
                        .with_registry(Registry::with_builtins())
                        .with_step_limit(Some(DEFAULT_STEP_LIMIT)),
                })
            }
        }
    }

    /// Replaces the per-run step budget. `None` removes the bound.
    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.ctx = std::mem::take(&mut self.ctx).with_step_limit(limit);
        self
    }

    /// Evaluates source text inside the isolation boundary.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        self.ctx.load_string(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unavailable_capability_is_an_error() {
        let err = Sandbox::with_availability(Availability::Unavailable).unwrap_err();
        assert!(matches!(err, Error::SandboxUnavailable));
        assert_eq!(err.to_string(), "sandbox capability is not available");
    }

    #[test]
    fn evaluates_a_string_literal() {
        let mut sb = Sandbox::with_availability(Availability::Available).unwrap();
        let out = sb.eval("'Hello World'").unwrap();
        assert_eq!(out, Value::Str("Hello World".into()));
        assert_eq!(out.to_string(), "Hello World");
    }

    #[test]
    fn state_persists_within_a_sandbox_but_not_across() {
        let mut sb = Sandbox::with_availability(Availability::Available).unwrap();
        sb.eval("secret = 41").unwrap();
        assert_eq!(sb.eval("secret + 1").unwrap(), Value::Fixnum(42));

        let mut other = Sandbox::with_availability(Availability::Available).unwrap();
        let err = other.eval("secret").unwrap_err();
        assert_eq!(
            err.to_string(),
            "runtime error: undefined variable 'secret'"
        );
    }

    #[test]
    fn runaway_scripts_hit_the_step_budget() {
        let mut sb = Sandbox::with_availability(Availability::Available)
            .unwrap()
            .with_step_limit(Some(10));
        let err = sb.eval("[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "runtime error: evaluation step budget exhausted"
        );
    }
}
