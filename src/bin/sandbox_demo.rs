use std::process::ExitCode;

use embedded_script_eval::{Error, Sandbox, INSTALL_HINT};

/// Evaluates a string literal inside a sandboxed evaluator. When the
/// sandbox capability is absent, prints installation guidance instead and
/// exits successfully: missing the optional capability is not an error.
fn main() -> ExitCode {
    let mut sandbox = match Sandbox::new() {
        Ok(sandbox) => sandbox,
        Err(Error::SandboxUnavailable) => {
            println!("{INSTALL_HINT}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match sandbox.eval("'Hello World'") {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
