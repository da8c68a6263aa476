//! Subcommand implementations.

pub(crate) mod config;
pub(crate) mod run;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Coloured text for terminals.
    Pretty,
    /// A single JSON document on stdout.
    Json,
}
