//! funcboot CLI - bootstrap an Azure Functions app inside a uv project

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic as _;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use funcboot::core::BootstrapError;
use funcboot::util::diagnostic;
use funcboot::util::Shell;

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Shell,
    pub verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let opts = GlobalOptions {
        shell: Shell::from_flags(cli.quiet, cli.verbose, cli.color, cli.json),
        verbose: cli.verbose,
    };

    if let Err(e) = run(cli, &opts) {
        report_error(&e, &opts.shell);
        std::process::exit(1);
    }
}

fn run(cli: Cli, opts: &GlobalOptions) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("funcboot=debug")
    } else {
        EnvFilter::new("funcboot=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Bootstrap(args) => commands::bootstrap::execute(args, opts),
        Commands::Patch(cmd) => commands::patch::execute(cmd, opts),
        Commands::Doctor(args) => commands::doctor::execute(args, opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn report_error(e: &anyhow::Error, shell: &Shell) {
    let Some(err) = e.downcast_ref::<BootstrapError>() else {
        if shell.is_json() {
            shell.error(format!("{:#}", e));
        } else {
            eprintln!("error: {:#}", e);
        }
        return;
    };

    if shell.is_json() {
        let event = serde_json::json!({
            "reason": "error",
            "code": err.code().map(|c| c.to_string()),
            "message": err.to_string(),
        });
        shell.json_event(&event);
    } else {
        diagnostic::emit(&err.to_diagnostic(), shell.use_color());
    }
}
