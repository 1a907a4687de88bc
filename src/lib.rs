//! A small embeddable script evaluator with an optional sandboxed
//! evaluation capability.
//!
//! Host code talks to the evaluator through a [`Context`]: encode Rust data
//! into [`Value`]s, load a snippet, decode the result.
//!
//! ```
//! use embedded_script_eval::Context;
//!
//! let mut ctx = Context::new();
//! let val = ctx.load_string("1 + 2").unwrap();
//! assert_eq!(val.as_i64().unwrap(), 3);
//! ```
//!
//! The [`Sandbox`] facade adds capability gating on top: construction fails
//! with [`Error::SandboxUnavailable`] when the optional capability is
//! absent, and a successful construction yields an isolated evaluator with
//! its own state and a bounded step budget.
//!
//! ```
//! use embedded_script_eval::{Availability, Sandbox};
//!
//! match Sandbox::with_availability(Availability::detect()) {
//!     Ok(mut sb) => println!("{}", sb.eval("'Hello World'").unwrap()),
//!     Err(_) => println!("{}", embedded_script_eval::INSTALL_HINT),
//! }
//! ```

pub mod context;
pub mod errors;
pub mod functions;
pub mod sandbox;
pub mod value;

mod engine;
mod expression;
mod parser;

pub use context::Context;
pub use errors::{Error, Result};
pub use expression::Program;
pub use sandbox::{Availability, Sandbox, INSTALL_HINT};
pub use value::{Value, ValueType};

/// Convenience: evaluate a snippet in a fresh default [`Context`].
pub fn eval(code: &str) -> Result<Value> {
    Context::new().load_string(code)
}
