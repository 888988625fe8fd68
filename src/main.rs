//! suite-harness - run registered test suites from the command line
//!
//! Runs the built-in demo suites and prints the report.
//!
//! ## Usage
//!
//! ```bash
//! # Run every suite
//! suite-harness run
//!
//! # Run one suite three times and print JSON
//! suite-harness run --suite timers --rounds 3 --format json
//!
//! # List suites and cases
//! suite-harness list --detailed
//!
//! # Write an example configuration
//! suite-harness config init suite-harness.yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::info;

use suite_harness::cli::{self, Args};
use suite_harness::config::{print_env_help, EnvConfig, HarnessConfig};
use suite_harness::demo::register_demo_suites;
use suite_harness::executor::{aggregate_rounds, Runner};
use suite_harness::output::ResultFormatter;
use suite_harness::registry::Registry;
use suite_harness::utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let env = EnvConfig::load();
    let config = load_config(args.config.as_deref(), &env)?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        config.log_level()?
    };
    init_logger(level);

    match args.command {
        cli::Command::Run(run_args) => run_suites(run_args, config).await,
        cli::Command::List(list_args) => {
            list_suites(list_args, &config);
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &config, &env)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&str>, env: &EnvConfig) -> Result<HarnessConfig> {
    let config = match path.or(env.config_file.as_deref()) {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::load_default()?,
    };

    let config = config.with_env(env);
    config
        .validate()
        .context("Invalid configuration after environment overrides")?;
    Ok(config)
}

fn build_registry(config: &HarnessConfig) -> Registry {
    let mut registry = Registry::new().with_default_timeout(config.default_timeout_ms);
    register_demo_suites(&mut registry);
    registry
}

async fn run_suites(args: cli::RunArgs, mut config: HarnessConfig) -> Result<ExitCode> {
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.default_timeout_ms = timeout_ms;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if args.no_color {
        config.color = false;
    }
    config.validate()?;

    let mut formatter = ResultFormatter::new(config.output_format()?);
    if !config.color {
        formatter = formatter.no_color();
    }

    let registry = build_registry(&config);
    let runner = match args.suite {
        Some(title) => {
            if registry.find(&title).next().is_none() {
                anyhow::bail!("Unknown suite: {title}");
            }
            Runner::new().only(title)
        }
        None => Runner::new(),
    };

    info!(
        "Running {} suite(s), {} round(s)",
        registry.len(),
        config.rounds
    );

    let mut reports = Vec::with_capacity(config.rounds as usize);
    for round in 1..=config.rounds {
        info!("=== Round {}/{} ===", round, config.rounds);
        let (report, stats) = runner.run_timed(&registry).await;
        println!("{}", formatter.format_run(&report, &stats)?);
        reports.push(report);
    }

    if reports.len() > 1 {
        let aggregate = aggregate_rounds(&reports);
        println!("{}", formatter.format_aggregate(&aggregate)?);
    }

    if reports.iter().all(|r| r.is_all_passed()) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn list_suites(args: cli::ListArgs, config: &HarnessConfig) {
    let registry = build_registry(config);

    println!("\nRegistered Suites ({} total)\n", registry.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for suite in registry.suites() {
        if args.detailed {
            println!(
                "\n{:2}. {} ({} cases, {} async, {}ms timeout)",
                suite.index() + 1,
                suite.title(),
                suite.len(),
                suite.async_count(),
                suite.timeout_ms()
            );
        } else {
            println!("\n{:2}. {}", suite.index() + 1, suite.title());
        }
        println!("──────────────────────────────────────────────────────────────────────");

        for case in suite.cases() {
            if args.detailed {
                println!("    - {:40} [{}]", case.message(), case.mode());
            } else {
                println!("    - {}", case.message());
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn manage_config(args: cli::ConfigArgs, config: &HarnessConfig, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Show => {
            let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
            println!("{yaml}");
            if env.has_any() {
                env.print_summary();
            }
        }
        cli::ConfigAction::Init { path } => {
            HarnessConfig::example().save(&path)?;
            println!("✓ Wrote example configuration to {path}");
        }
        cli::ConfigAction::Env => print_env_help(),
    }

    Ok(())
}
