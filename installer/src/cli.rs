//! CLI argument definitions for tvm.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::Config;
use crate::verification::VerificationPolicy;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use tvm_version::RequestedVersion;

/// Resolve, install and pin OpenTofu versions.
#[derive(Parser, Debug)]
#[command(name = "tvm")]
#[command(version, about)]
#[command(long_about = concat!(
    "Resolve, install and pin OpenTofu versions.\n\n",
    "The version to use is taken from, in order: the TVM_TOFU_VERSION ",
    "environment variable, a .opentofu-version file, a .tofuswitch.toml file, ",
    "and the required_version constraints declared in the project. Releases ",
    "are verified against their published SHA-256 checksums before being ",
    "extracted under the install root.",
))]
#[command(after_help = concat!(
    "VERSION may be an exact version (1.6.0, v1.6), a keyword (latest, ",
    "latest-stable, latest-allowed, min-required) or a constraint ",
    "(\">= 1.5, < 2.0\", \"~> 1.6\").\n\n",
    "EXAMPLES:\n",
    "  Install whatever the project asks for:\n",
    "    $ tvm detect\n\n",
    "  Pin the newest release allowed by the project:\n",
    "    $ tvm use latest-allowed --working-dir\n\n",
    "  Show published releases:\n",
    "    $ tvm list-remote",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve the version the project requires, installing it if needed.
    Detect,

    /// Install a version; without VERSION, the one the project requires.
    Install(InstallArgs),

    /// Resolve a version and write it to a pinned-version file.
    Use(UseArgs),

    /// List installed versions.
    List,

    /// List published versions.
    ListRemote,

    /// Remove an installed version.
    Uninstall(UninstallArgs),

    /// Remove the pinned-version file from the install root.
    Reset,
}

/// Arguments for the install command.
#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    /// Version, keyword, or constraint to install.
    #[arg(value_name = "VERSION")]
    pub version: Option<RequestedVersion>,
}

/// Arguments for the use command.
#[derive(Args, Debug, Clone)]
pub struct UseArgs {
    /// Version, keyword, or constraint to pin.
    #[arg(value_name = "VERSION")]
    pub version: RequestedVersion,

    /// Write the file in the working directory instead of the install root.
    #[arg(short, long)]
    pub working_dir: bool,
}

/// Arguments for the uninstall command.
#[derive(Args, Debug, Clone)]
pub struct UninstallArgs {
    /// Installed version to remove.
    #[arg(value_name = "VERSION")]
    pub version: String,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Install root [default: ~/.tvm, or TVM_ROOT].
    #[arg(long, global = true, value_name = "DIR")]
    pub root_path: Option<Utf8PathBuf>,

    /// Ignore installed versions when resolving keywords and constraints.
    #[arg(short, long, global = true)]
    pub force_remote: bool,

    /// Install even when the release publishes no checksum.
    #[arg(long, global = true)]
    pub skip_checksum: bool,

    /// Resolve without installing.
    #[arg(short, long, global = true)]
    pub no_install: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl GlobalArgs {
    /// The log level selected by `-q` and `-v`.
    ///
    /// # Examples
    ///
    /// ```
    /// use log::LevelFilter;
    /// use tvm_installer::cli::GlobalArgs;
    ///
    /// let args = GlobalArgs { verbosity: 2, ..GlobalArgs::default() };
    /// assert_eq!(args.log_level(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Apply the flags over a config loaded from the environment.
    ///
    /// `--skip-checksum` only relaxes the policy; a checksum that is
    /// published is still verified.
    pub fn apply(&self, config: &mut Config) {
        if let Some(root) = &self.root_path {
            config.root_path.clone_from(root);
        }
        if self.force_remote {
            config.force_remote = true;
        }
        if self.skip_checksum {
            config.verification = VerificationPolicy::optional();
        }
        if self.no_install {
            config.auto_install = false;
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
