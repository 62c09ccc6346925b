//! # HeartShard
//!
//! Interactive storm simulator over the generational engine.
//!
//! ```bash
//! heartshard --seed 42
//! heartshard --roster cast.toml --strategy exclusion_ripple --save-path run.json
//! heartshard --load run.json
//! ```

use clap::Parser;
use heartshard_core::USAGE;
use heartshard_shell::{Cli, Shell};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // HEARTSHARD_LOG_FORMAT=json switches to machine-parseable logs on stderr.
    let log_format =
        std::env::var("HEARTSHARD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "heartshard=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = Cli::parse();

    if !cli.quiet {
        println!("HeartShard Storm Sim v{} | {}", env!("CARGO_PKG_VERSION"), USAGE);
    }

    let engine = match cli.build_engine() {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut shell = Shell::new(engine, cli.save_path.clone()).with_format(cli.format);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = shell.run(stdin.lock(), stdout.lock()) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
