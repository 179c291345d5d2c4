//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{CleanupCommand, InstallCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Automates OpenShift installs on AWS with short-lived (STS) credentials
#[derive(Debug, Parser, Clone)]
#[command(name = "openshift-sts-installer")]
#[command(version)]
#[command(
    about = "Install OpenShift on AWS in manual credentials (STS) mode",
    long_about = "Runs the eleven-step STS installation: extract credentials requests and \
                  binaries from a release image, generate install-config.yaml, create AWS \
                  identity resources with ccoctl, deploy and verify the cluster. Completed \
                  steps are detected on disk, so an interrupted run can simply be restarted."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors and the final summary
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run (or resume) the installation
    Install(InstallCommand),

    /// Delete the AWS resources created for a cluster
    Cleanup(CleanupCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
