//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Embeddable test-orchestration engine
#[derive(Parser, Debug)]
#[command(name = "suite-harness")]
#[command(version)]
#[command(about = "Run registered test suites with per-suite async timeouts")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the demo suites
    Run(RunArgs),

    /// List suites and their cases
    List(ListArgs),

    /// Show or create configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Only run suites with this title
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Number of times to run the suites
    #[arg(short, long)]
    pub rounds: Option<u32>,

    /// Default suite timeout in milliseconds
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show case modes and suite timeouts
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write an example configuration file
    Init {
        /// Destination (.yaml, .yml or .json)
        #[arg(default_value = "suite-harness.yaml")]
        path: String,
    },

    /// List supported environment variables
    Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::parse_from([
            "suite-harness",
            "run",
            "--suite",
            "module",
            "--rounds",
            "3",
            "--format",
            "json",
        ]);

        match args.command {
            Command::Run(run) => {
                assert_eq!(run.suite.as_deref(), Some("module"));
                assert_eq!(run.rounds, Some(3));
                assert_eq!(run.format.as_deref(), Some("json"));
                assert!(!run.no_color);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_init_default_path() {
        let args = Args::parse_from(["suite-harness", "config", "init"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { path },
            }) => assert_eq!(path, "suite-harness.yaml"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = Args::parse_from(["suite-harness", "list", "-v", "--config", "x.yaml"]);
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some("x.yaml"));
    }
}
