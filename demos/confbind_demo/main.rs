//! # confbind demo application
//!
//! A sample CLI tool that loads a [`DemoConfig`](config::DemoConfig) from a
//! document, the environment and command-line flags, then prints the result.
//! It exists to demonstrate and manually verify confbind's layering.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example confbind_demo
//! cargo run --example confbind_demo -- --config demo.json --port 9000
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature               | How to exercise it                                                    |
//! |-----------------------|-----------------------------------------------------------------------|
//! | Record defaults       | `cargo run --example confbind_demo`                                   |
//! | JSON or TOML document | `--config demo.json` or `--config demo.toml`                          |
//! | Env var override      | `CONFBIND_DEMO_PORT=9999 cargo run --example confbind_demo`           |
//! | Nullable from env     | `CONFBIND_DEMO_TIMEOUT=2.5 cargo run --example confbind_demo`         |
//! | Flag override         | `cargo run --example confbind_demo -- --port 1 --verbose`             |
//! | Strict documents      | `--config demo.json --strict` with a misspelled key                   |
//! | Logging               | `RUST_LOG=confbind=trace cargo run --example confbind_demo`           |

mod config;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use confbind::{ConfbindError, Loader, Options};

use config::DemoConfig;

/// confbind demo: layered configuration from a document, env vars and flags.
#[derive(Parser, Debug)]
#[command(name = "confbind-demo")]
struct Cli {
    /// Config document to load (.toml is TOML, anything else JSON).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Reject document keys the config does not know.
    #[arg(long)]
    strict: bool,

    /// Override the host.
    #[arg(long)]
    host: Option<String>,

    /// Override the port.
    #[arg(long)]
    port: Option<i64>,

    /// Override the worker count.
    #[arg(long)]
    workers: Option<i32>,

    /// Enable verbose output.
    #[arg(long)]
    verbose: bool,
}

/// Flags that feed the option layer. Field names match the record's keys;
/// `None` fields are dropped by [`Options::from_serialize`].
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct FlagOptions {
    host: Option<String>,
    port: Option<i64>,
    workers: Option<i32>,
    verbose: Option<bool>,
}

fn load(cli: &Cli) -> Result<DemoConfig, ConfbindError> {
    let flags = Options::from_serialize(&FlagOptions {
        host: cli.host.clone(),
        port: cli.port,
        workers: cli.workers,
        verbose: cli.verbose.then_some(true),
    })?;

    let mut loader = Loader::new().strict(cli.strict).options(flags);
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    loader.load()
}

fn ansi_color_code(name: &str) -> &str {
    match name {
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "magenta" => "\x1b[35m",
        "cyan" => "\x1b[36m",
        "white" => "\x1b[37m",
        _ => "\x1b[0m",
    }
}

const RESET: &str = "\x1b[0m";

fn echo(config: &DemoConfig) {
    let color = ansi_color_code(&config.color);

    if config.verbose {
        println!("{color}[verbose] Resolved configuration for {:?}{RESET}", config.name);
        println!();
    }

    let workers = config
        .workers
        .map_or_else(|| "unset".to_string(), |w| w.to_string());
    let entries = [
        ("name", config.name.clone()),
        ("host", config.host.clone()),
        ("port", config.port.to_string()),
        ("verbose", config.verbose.to_string()),
        ("timeout", config.timeout.to_string()),
        ("workers", workers),
        ("color", config.color.clone()),
    ];

    let max_key_len = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in &entries {
        println!("{color}{key:<max_key_len$}{RESET}  {value}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match load(&cli) {
        Ok(config) => echo(&config),
        Err(ConfbindError::UnknownKeys(errors)) => {
            for err in errors {
                eprintln!("Error: {err}");
            }
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
