use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use embedded_script_eval::{Context, Value};

/// Run a script file or inline expression and print the result.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Script file to run
    script: Option<PathBuf>,
    /// Inline source to evaluate instead of a file
    #[arg(short = 'e', long = "eval", conflicts_with = "script")]
    eval: Option<String>,
    /// Values made available to the script as the ARGV array (repeatable)
    #[arg(long = "arg")]
    args: Vec<String>,
    /// Print the result as pretty JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (source, filename) = match (&args.script, &args.eval) {
        (Some(path), None) => match fs::read_to_string(path) {
            Ok(source) => (source, path.display().to_string()),
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        (None, Some(source)) => (source.clone(), "-e".to_string()),
        _ => {
            eprintln!("usage: ese <script> | ese -e <source>");
            return ExitCode::from(2);
        }
    };

    let mut ctx = Context::new().with_filename(filename);
    let argv = args.args.iter().map(|s| Value::from(s.as_str())).collect();

    match ctx.load_string_with_args(&source, argv) {
        Ok(result) => {
            if args.json {
                // Serialization of a Value cannot fail.
                println!("{}", serde_json::to_string_pretty(&result).unwrap());
            } else if !result.is_nil() {
                println!("{result}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
