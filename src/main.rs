use anyhow::Result;
use clap::Parser;
use stackdiff::cli::{Cli, Commands};
use stackdiff::commands;

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("Error: {error:#}");
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Report {
            snapshot,
            config,
            allowed_destroy_types,
            no_fail_on_destructive,
            ignore_destructive_stages,
            stack_selector_patterns,
            stack_selection_strategy,
            diff_method,
            title,
            quiet_comment_policy,
            commit,
            out_dir,
            plain,
            verbosity,
        } => {
            init_logging(verbosity);
            commands::report::run_report(commands::report::ReportConfig {
                snapshot,
                config,
                allowed_destroy_types,
                no_fail_on_destructive,
                ignore_destructive_stages,
                stack_selector_patterns,
                stack_selection_strategy,
                diff_method,
                title,
                quiet_comment_policy,
                commit,
                out_dir,
                plain,
            })
        }
        Commands::Init { force } => {
            init_logging(0);
            commands::init::init_config(force)?;
            Ok(0)
        }
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
