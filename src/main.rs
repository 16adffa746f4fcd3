use std::io::{self, BufRead};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use qsim_challenges::challenge::{judge, Exercise, Expected};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "qsim-challenges", version, about = "Numeric quantum circuit exercises")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read one JSON line from stdin and print the answer
    Run {
        #[arg(value_enum)]
        exercise: Exercise,

        /// Grade the answer against this expected output instead of printing it
        #[arg(long, value_name = "JSON")]
        expect: Option<Expected>,
    },
    /// Run the built-in cases of one exercise, or of all of them
    Check {
        #[arg(value_enum)]
        exercise: Option<Exercise>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Command::Run { exercise, expect } => {
            let answer = read_line().and_then(|line| exercise.solve_line(&line));
            match expect {
                Some(expected) => {
                    let verdict = judge(&expected, answer, exercise.tolerance());
                    println!("{}", verdict);
                    Ok(if verdict.is_correct() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    })
                }
                None => {
                    println!("{}", answer?);
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Command::Check { exercise } => {
            let exercises = match exercise {
                Some(exercise) => vec![exercise],
                None => Exercise::ALL.to_vec(),
            };

            let mut failures = 0;
            for exercise in exercises {
                for (i, verdict) in exercise.check().iter().enumerate() {
                    println!("{} #{}: {}", exercise.name(), i + 1, verdict);
                    if !verdict.is_correct() {
                        failures += 1;
                    }
                }
            }
            info!(failures, "check finished");

            Ok(if failures == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_output_is_parsed_up_front() {
        let cli = Cli::try_parse_from(["qsim-challenges", "run", "qram", "--expect", "[0.5, 0.5]"]);
        assert!(matches!(
            cli.map(|cli| cli.cmd),
            Ok(Command::Run { expect: Some(_), .. })
        ));

        assert!(Cli::try_parse_from(["qsim-challenges", "run", "qram", "--expect", "[0.5,"]).is_err());
        assert!(Cli::try_parse_from(["qsim-challenges", "run", "qram", "--expect", "\"x\""]).is_err());
    }
}
