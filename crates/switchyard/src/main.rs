//! Switchyard route table tool.
//!
//! Loads a YAML route table, builds a router from it and matches requests
//! against it.

mod manifest;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use switchyard_telemetry::{log_lookup_completed, log_routes_loaded, log_strategy_selected};
use switchyard_telemetry::{LogFormat, TelemetryConfig};

use crate::manifest::RouteTable;

#[derive(Parser, Debug)]
#[command(name = "switchyard", about = "Switchyard HTTP route matcher", version)]
struct Cli {
    /// Log level (RUST_LOG takes precedence).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, global = true, default_value = "json")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Match one request against a route table.
    ///
    /// Exits 0 on a match, 2 when nothing matches, 1 on route table errors.
    Match {
        /// Route table file (YAML).
        #[arg(short, long)]
        routes: PathBuf,

        /// Request method.
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, optionally prefixed by a host.
        #[arg(short, long)]
        path: String,

        /// Output format (text or json).
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check that a route table loads and that a strategy can serve it.
    Check {
        /// Route table file (YAML).
        #[arg(short, long)]
        routes: PathBuf,
    },

    /// List the registrations of a route table in order.
    Routes {
        /// Route table file (YAML).
        #[arg(short, long)]
        routes: PathBuf,
    },
}

fn load(path: &Path) -> anyhow::Result<RouteTable> {
    let table = RouteTable::load(path)?;
    log_routes_loaded!(file = %path.display(), routes = table.routes.len());
    Ok(table)
}

/// Run the match command.
fn run_match(routes: &Path, method: &str, path: &str, format: &str) -> anyhow::Result<ExitCode> {
    let table = load(routes)?;
    let router = table.build_router()?;
    let found = router
        .lookup(method, path)
        .with_context(|| format!("{} can not be served", routes.display()))?;
    let strategy = router.strategy().unwrap_or(router.name());
    log_lookup_completed!(method, path, strategy, matched = found.is_some());

    let Some(found) = found else {
        if format == "json" {
            let output = serde_json::json!({
                "method": method,
                "path": path,
                "strategy": strategy,
                "matched": false,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            eprintln!("no route matches {method} {path}");
        }
        return Ok(ExitCode::from(2));
    };

    let handlers: Vec<&str> = found.handlers.iter().map(|&i| table.handler(i)).collect();

    if format == "json" {
        let params: serde_json::Map<String, serde_json::Value> = found
            .params
            .iter()
            .map(|(name, value)| (name.to_string(), value.into()))
            .collect();
        let output = serde_json::json!({
            "method": method,
            "path": path,
            "strategy": strategy,
            "matched": true,
            "handlers": handlers,
            "params": params,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("handlers: {}", handlers.join(", "));
        for (name, value) in found.params.iter() {
            println!("param {name} = {value}");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Run the check command.
fn run_check(routes: &Path) -> anyhow::Result<ExitCode> {
    let table = load(routes)?;
    let router = table.build_router()?;

    // The first lookup commits lazy strategies to the whole route set.
    router
        .lookup("GET", "/")
        .with_context(|| format!("{} can not be served", routes.display()))?;

    let strategy = router.strategy().unwrap_or(router.name());
    log_strategy_selected!(
        file = %routes.display(),
        strategy,
        strict = router.config().strict
    );
    println!(
        "{}: {} route(s), strategy {}",
        routes.display(),
        table.routes.len(),
        strategy
    );
    Ok(ExitCode::SUCCESS)
}

/// Run the routes command.
fn run_routes(routes: &Path) -> anyhow::Result<ExitCode> {
    let table = load(routes)?;
    for route in &table.routes {
        println!("{:<7} {} -> {}", route.method, route.path, route.handler);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_format) = LogFormat::parse(&cli.log_format) else {
        eprintln!("error: invalid log format: {}", cli.log_format);
        return ExitCode::from(1);
    };
    let telemetry = TelemetryConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(log_format);
    if let Err(e) = switchyard_telemetry::init_logging(&telemetry) {
        eprintln!("warning: {e}");
    }

    let result = match &cli.command {
        Commands::Match {
            routes,
            method,
            path,
            format,
        } => run_match(routes, method, path, format),
        Commands::Check { routes } => run_check(routes),
        Commands::Routes { routes } => run_routes(routes),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
