//! Evaluate a math expression from the command line.
//!
//! ```text
//! cargo run --example evaluate -- "sqrt(x) + y/2" --vars '{"x": 9, "y": [4, 8]}'
//! ```

use clap::Parser;
use formula_tree::{evaluate_expression, Bindings};
use std::process::ExitCode;

#[derive(Parser)]
#[command(about = "Evaluate a math expression via its expression tree")]
struct Cli {
    /// Expression, e.g. 'sqrt(x)+y/2'
    expr: String,

    /// JSON object of variables, e.g. '{"x": 9, "y": [4, 8]}'
    #[arg(long, default_value = "{}")]
    vars: String,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let bindings: Bindings = match serde_json::from_str(&cli.vars) {
        Ok(bindings) => bindings,
        Err(err) => {
            eprintln!("Invalid --vars: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match evaluate_expression(&cli.expr, &bindings) {
        Ok(result) => {
            println!("{}", result);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
