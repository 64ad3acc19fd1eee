// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! mcdr-catalog - aggregates the MCDReforged plugin catalogue.
//!
//! This is the binary entry point: it loads configuration, resolves the
//! GitHub credential, runs the pipeline once, and maps failures to exit codes.

mod run;

use std::path::PathBuf;

use clap::Parser;
use mcdr_catalog_config::{CatalogConfig, load_and_validate, render_errors, validation};
use mcdr_catalog_pipeline::install_signal_handler;
use tracing::{error, info};

use crate::run::{EXIT_CONFIG, EXIT_OK, RunError, TOKEN_ENV, resolve_token, run_catalog};

/// mcdr-catalog - builds plugins.json from the MCDReforged plugin catalogue.
#[derive(Parser, Debug)]
#[command(name = "mcdr-catalog", version, about, long_about = None)]
struct Cli {
    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Retries after the first attempt on transient failure.
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Maximum number of requests in flight.
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Read plugin descriptors from this directory instead of the remote listing.
    #[arg(long, value_name = "DIR")]
    plugins_dir: Option<PathBuf>,

    /// Directory holding plugins.json.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Use this config file instead of the XDG hierarchy.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut CatalogConfig) {
        if let Some(timeout) = self.timeout {
            config.fetch.timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            config.fetch.max_retries = retries;
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch.concurrency = concurrency;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            render_errors(&errors);
            std::process::exit(EXIT_CONFIG);
        }
    };
    cli.apply(&mut config);
    if let Err(errors) = validation::validate_config(&config) {
        render_errors(&errors);
        std::process::exit(EXIT_CONFIG);
    }

    init_tracing(&config.log.level);

    let Some(token) = resolve_token(config.github.token.as_deref(), std::env::var(TOKEN_ENV).ok())
    else {
        let err = RunError::MissingCredential;
        error!(error = %err, "cannot start catalog run");
        std::process::exit(err.exit_code());
    };

    let cancel = install_signal_handler();
    match run_catalog(&config, cli.plugins_dir.as_deref(), token, &cancel).await {
        Ok(summary) => {
            info!(
                listed = summary.listed,
                written = summary.written,
                degraded = summary.degraded,
                "catalog run complete"
            );
            std::process::exit(EXIT_OK);
        }
        Err(err) => {
            error!(error = %err, "catalog run failed");
            std::process::exit(err.exit_code());
        }
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mcdr_catalog={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "mcdr-catalog",
            "--timeout",
            "30",
            "--retries",
            "5",
            "--concurrency",
            "4",
            "--output-dir",
            "/tmp/catalog",
            "--log-level",
            "debug",
            "--plugins-dir",
            "./plugins",
        ]);
        let mut config = CatalogConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.fetch.concurrency, 4);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/catalog"));
        assert_eq!(config.log.level, "debug");
        assert_eq!(cli.plugins_dir, Some(PathBuf::from("./plugins")));
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::parse_from(["mcdr-catalog"]);
        let mut config = CatalogConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.fetch.timeout_secs, 15);
        assert_eq!(config.fetch.max_retries, 3);
        assert!(cli.config.is_none());
    }

    #[test]
    fn invalid_override_fails_validation() {
        let cli = Cli::parse_from(["mcdr-catalog", "--concurrency", "0"]);
        let mut config = CatalogConfig::default();
        cli.apply(&mut config);
        assert!(validation::validate_config(&config).is_err());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = mcdr_catalog_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.output.file_name, "plugins.json");
    }
}
