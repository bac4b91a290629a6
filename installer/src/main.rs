//! tvm CLI entrypoint.
//!
//! This binary resolves the OpenTofu version a project asks for, installs it
//! after verifying its checksum, and manages pinned-version files. Results go
//! to stdout; logs and errors go to stderr.

use clap::Parser;
use log::LevelFilter;
use std::error::Error;
use std::io::Write;
use tvm_installer::catalog::GithubCatalog;
use tvm_installer::cli::{Cli, Command, InstallArgs};
use tvm_installer::config::Config;
use tvm_installer::download::UreqClient;
use tvm_installer::error::Result;
use tvm_installer::manager::VersionManager;
use tvm_installer::output::{
    detected_message, pinned_message, reset_message, uninstall_message, version_list,
};
use tvm_installer::resolver::ConstraintResolver;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.log_level());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// `RUST_LOG` refines the level chosen by `-v` and `-q`.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write) -> Result<()> {
    let mut config = Config::from_env()?;
    cli.global.apply(&mut config);
    // A bare `install` installs what `detect` resolves.
    if matches!(cli.command, Command::Install(InstallArgs { version: None })) {
        config.auto_install = true;
    }

    let client = UreqClient::new(config.http_timeout);
    let catalog = GithubCatalog::new(
        &client,
        &config.tool.releases_url,
        config.github_token.as_deref(),
    );
    let manager = VersionManager::new(&config, ConstraintResolver::standard(), &client, &catalog);

    let message = execute(&cli.command, &manager, &config)?;
    write_line(stdout, message);
    Ok(())
}

/// Runs one subcommand and returns the text to print.
fn execute(command: &Command, manager: &VersionManager<'_>, config: &Config) -> Result<String> {
    let tool = config.tool.folder.as_str();
    match command {
        Command::Detect => Ok(detected_message(tool, &manager.detect()?)),
        Command::Install(args) => {
            let detected = match &args.version {
                Some(requested) => manager.install(requested.clone())?,
                None => manager.detect()?,
            };
            Ok(detected_message(tool, &detected))
        }
        Command::Use(args) => {
            let written = manager.use_version(args.version.clone(), args.working_dir)?;
            Ok(pinned_message(&written))
        }
        Command::List => Ok(version_list(tool, &manager.list_local()?, false)),
        Command::ListRemote => Ok(version_list(tool, &manager.list_remote()?, true)),
        Command::Uninstall(args) => {
            let removed = manager.uninstall(&args.version)?;
            Ok(uninstall_message(tool, &args.version, removed))
        }
        Command::Reset => {
            let removed = manager.reset()?;
            Ok(reset_message(&config.root_pinned_file(), removed))
        }
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_line(stderr, format!("error: {err}"));
            let mut source = err.source();
            while let Some(cause) = source {
                write_line(stderr, format!("  caused by: {cause}"));
                source = cause.source();
            }
            1
        }
    }
}

fn write_line(out: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}
