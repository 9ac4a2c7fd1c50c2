use clap::{Parser, Subcommand};
use skill_check::output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "skill-check",
    version,
    about = "Security analysis for SKILL.md agent instruction files"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "debug", "skill_check=trace")
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse one SKILL.md file or GitHub blob URL
    Check {
        /// Local path, or https://github.com/<owner>/<repo>/blob/<ref>/<path>
        target: String,

        /// Output format
        #[arg(long, short, default_value = "markdown", value_enum)]
        format: OutputFormat,

        /// Write output to file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Fail on SUSPICIOUS as well as DANGEROUS
        #[arg(long)]
        strict: bool,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Analyse every SKILL.md found under a directory
    #[command(name = "check-all")]
    CheckAll {
        /// Directory to search recursively
        path: PathBuf,

        /// Output format
        #[arg(long, short, default_value = "markdown", value_enum)]
        format: OutputFormat,

        /// Fail on SUSPICIOUS as well as DANGEROUS
        #[arg(long)]
        strict: bool,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List all built-in rules with descriptions
    ListRules,

    /// Show full explanation for a rule
    Explain {
        /// Rule ID (e.g., "bidi-control")
        rule_id: String,
    },
}
