//! Travel Buddy binary - composition root.
//!
//! 1. Load `.env` and parse the command line
//! 2. Initialize tracing (stderr, so stdout carries only answers)
//! 3. Layer configuration: defaults < TOML file < environment < CLI flags,
//!    then apply the configured log level
//! 4. Dispatch the subcommand; any failure exits non-zero

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use travel_buddy_core::config::BuddyConfig;

use crate::cli::{Cli, Command};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Level used until the configuration is loaded: `--log-level`, then
/// `LOG_LEVEL`, then `warn`.
fn provisional_level(cli_level: Option<&str>, env_level: Option<String>) -> String {
    cli_level
        .map(str::to_string)
        .or(env_level)
        .unwrap_or_else(|| "warn".to_string())
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the subscriber before configuration is read so load and override
/// warnings reach stderr. `RUST_LOG` wins over every other level source.
fn init_tracing(provisional: &str) -> Option<FilterHandle> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let env_set = from_env.is_some();
    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| build_filter(provisional)));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
    (!env_set).then_some(handle)
}

/// Switch to the level from the layered configuration.
fn apply_configured_level(handle: Option<FilterHandle>, level: &str) {
    if let Some(handle) = handle {
        if let Err(e) = handle.reload(build_filter(level)) {
            tracing::warn!(error = %e, "Could not apply configured log level");
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter_handle = init_tracing(&provisional_level(
        cli.log_level.as_deref(),
        std::env::var("LOG_LEVEL").ok(),
    ));

    let config_file = cli.resolve_config_path();
    let mut config = BuddyConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    apply_configured_level(filter_handle, &config.general.log_level);

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_file.display(),
        backend = %config.model.backend,
        model = %config.model.model_id,
        store = %config.memory.storage_path,
        "Starting Travel Buddy"
    );

    let result = match &cli.command {
        Command::Query(args) => commands::run_query(&config, args).await,
        Command::Interactive(args) => commands::run_interactive(&config, args).await,
        Command::Memory { action } => commands::run_memory(&config, action).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisional_level_prefers_flag() {
        assert_eq!(
            provisional_level(Some("debug"), Some("error".to_string())),
            "debug"
        );
        assert_eq!(provisional_level(None, Some("error".to_string())), "error");
        assert_eq!(provisional_level(None, None), "warn");
    }

    #[test]
    fn test_config_warnings_reach_installed_subscriber() {
        let (filter, _handle) = reload::Layer::new(build_filter("warn"));
        let captured = std::sync::Arc::new(std::sync::Mutex::new(Vec::<u8>::new()));
        let sink = captured.clone();
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(move || CaptureWriter(sink.clone())),
        );

        tracing::subscriber::with_default(subscriber, || {
            let mut config = BuddyConfig::default();
            config.apply_overrides(|key| (key == "MAX_NEW_TOKENS").then(|| "lots".to_string()));
        });

        let output = String::from_utf8(captured.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Ignoring unparseable override"));
        assert!(output.contains("MAX_NEW_TOKENS"));
    }

    struct CaptureWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
