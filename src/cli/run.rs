//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Dispatches to command handlers
//! - Handles all error output

use anyhow::Result;
use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{BreachError, CliArgs, Config, ExitCode};
use breach_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// This function handles ALL output including errors. It returns `Result<(), ExitCode>`:
/// - On success: returns `Ok(())` after printing any output
/// - On error: prints the user-facing report, returns `Err(ExitCode)`
///
/// main.rs only calls `std::process::exit(code.as_i32())` on error - it does NOT print.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    // A second subscriber (tests calling run twice) is not an error worth reporting
    let _ = init_tracing(cli.verbose);

    let result = dispatch(cli);

    if let Err(error) = result {
        return Err(report_error(&error));
    }

    Ok(())
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init => commands::execute_init_command(cli.config.as_deref()),
        Commands::Add {
            repo,
            paths,
            reference,
            include,
            exclude,
        } => commands::execute_add_command(
            cli.config.as_deref(),
            &repo,
            paths,
            reference,
            include,
            exclude,
        ),
        Commands::List => {
            let config = discover(cli_args(&cli.config, &cli.cache_dir))?;
            commands::execute_list_command(&config, cli.verbose)
        }
        Commands::Build {
            output,
            budget,
            format,
            no_tests,
            policy,
            hidden,
            json,
        } => {
            let config = discover(CliArgs {
                format,
                max_tokens: budget,
                include_tests: no_tests.then_some(false),
                policy,
                ..cli_args(&cli.config, &cli.cache_dir)
            })?;
            commands::execute_build_command(
                &config,
                &commands::BuildOptions {
                    output,
                    hidden,
                    json,
                },
                cli.verbose,
            )
        }
        Commands::Dump {
            repo,
            output,
            budget,
            format,
            paths,
            include,
            exclude,
            no_tests,
            hidden,
            local,
            reference,
        } => commands::execute_dump_command(
            &commands::DumpOptions {
                repo,
                output,
                budget,
                format,
                paths,
                include,
                exclude,
                include_tests: !no_tests,
                hidden,
                local,
                reference,
                cache_dir: cli.cache_dir,
            },
            cli.verbose,
        ),
    }
}

fn cli_args(
    config_path: &Option<std::path::PathBuf>,
    cache_dir: &Option<std::path::PathBuf>,
) -> CliArgs {
    CliArgs {
        config_path: config_path.clone(),
        cache_dir: cache_dir.clone(),
        ..CliArgs::default()
    }
}

fn discover(cli_args: CliArgs) -> Result<Config> {
    Ok(Config::discover(&cli_args)?)
}

/// Print an error for the user and pick the exit code
fn report_error(error: &anyhow::Error) -> ExitCode {
    if let Some(breach_error) = error.downcast_ref::<BreachError>() {
        eprintln!("{}", breach_error.display_for_user());
        return breach_error.to_exit_code();
    }

    eprintln!("✗ Unexpected error: {error:#}");

    if let Some(suggestions) = enhance_error_context(error) {
        eprintln!("\n  Suggestions:");
        for (i, suggestion) in suggestions.iter().enumerate() {
            eprintln!("    {}. {}", i + 1, suggestion);
        }
    }

    eprintln!("\n  Run with --verbose for more detailed output");

    ExitCode::INTERNAL
}

/// Suggestions for common failure scenarios that are not a [`BreachError`]
fn enhance_error_context(error: &anyhow::Error) -> Option<Vec<String>> {
    let error_str = format!("{error:#}");

    if error_str.contains("Permission denied") {
        Some(vec![
            "Check file and directory permissions".to_string(),
            "Ensure you have write access to the current directory".to_string(),
        ])
    } else if error_str.contains("No such file or directory") {
        Some(vec![
            "Verify the specified paths exist".to_string(),
            "Check that you're running from the correct directory".to_string(),
        ])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breach_utils::error::{ConfigError, SourceError};

    #[test]
    fn test_breach_errors_map_to_their_exit_codes() {
        let err = anyhow::Error::from(BreachError::Config(ConfigError::NoRepositories));
        assert_eq!(report_error(&err), ExitCode::CLI_ARGS);

        let err = anyhow::Error::from(BreachError::Source(SourceError::NotFound {
            path: "/nope".to_string(),
        }));
        assert_eq!(report_error(&err), ExitCode::SOURCE_UNAVAILABLE);

        let err = anyhow::Error::from(BreachError::Sink {
            path: "out.md".to_string(),
            reason: "read-only".to_string(),
        });
        assert_eq!(report_error(&err), ExitCode::SINK_FAILED);
    }

    #[test]
    fn test_context_wrapped_breach_error_keeps_its_code() {
        let err = anyhow::Error::from(BreachError::Config(ConfigError::NoRepositories))
            .context("while building");
        assert_eq!(report_error(&err), ExitCode::CLI_ARGS);
    }

    #[test]
    fn test_other_errors_are_internal() {
        let err = anyhow::anyhow!("something odd");
        assert_eq!(report_error(&err), ExitCode::INTERNAL);
        assert!(enhance_error_context(&anyhow::anyhow!("Permission denied (os error 13)")).is_some());
        assert!(enhance_error_context(&err).is_none());
    }
}
