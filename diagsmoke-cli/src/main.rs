//! diagsmoke binary.
//!
//! Entry point for the `diagsmoke` command-line tool.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use diagsmoke::exit::{codes, exit_code};
use diagsmoke::{
    execute_check, execute_list, execute_run, CheckArgs, Cli, Command, CommandError, ListArgs,
    RunArgs, ShutdownFlag, StderrLogger,
};
use diagsmoke_analyzer::BackendKind;
use diagsmoke_fs::RealFilesystem;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            let code = if e.use_stderr() {
                codes::INVALID_ARGS
            } else {
                codes::SUCCESS
            };
            return ExitCode::from(code as u8);
        }
    };

    let result = match cli.command {
        Command::Run(args) => run_run(args).await,
        Command::List(args) => run_list(args),
        Command::Check(args) => run_check(args),
    };

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}

/// Run the run command.
async fn run_run(args: RunArgs) -> Result<i32, CommandError> {
    // Set up shutdown handler for graceful termination on Ctrl+C
    let shutdown = ShutdownFlag::new();
    let logger = StderrLogger::from_count(args.verbose);
    let backend = Arc::new(BackendKind::from(args.backend).create());
    let mut stdout = std::io::stdout();

    let result = execute_run(&args, backend, &RealFilesystem, &shutdown, &logger, &mut stdout).await?;

    if result.interrupted {
        eprintln!("interrupted");
    }
    Ok(result.exit_code)
}

/// Run the list command.
fn run_list(args: ListArgs) -> Result<i32, CommandError> {
    execute_list(&args, &RealFilesystem, &mut std::io::stdout())?;
    Ok(codes::SUCCESS)
}

/// Run the check command.
fn run_check(args: CheckArgs) -> Result<i32, CommandError> {
    execute_check(&args, &RealFilesystem, &mut std::io::stdout())?;
    Ok(codes::SUCCESS)
}
