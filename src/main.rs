use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, bail};
use log::{debug, info, warn};

use ytdigest::config::{Config, config_path};
use ytdigest::llm::ModelRouter;
use ytdigest::pipeline::{Pipeline, PipelineSettings};
use ytdigest::server::{self, AppState};
use ytdigest::youtube::Fetcher;
use ytdigest::{Outcome, output};

mod cli;

use cli::{Cli, Command, OutputFormat};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytdigest.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytdigest")
        .join("logs")
}

fn key_status(var: &str) -> String {
    if std::env::var(var).is_ok() {
        format!("  \x1b[32m✅\x1b[0m {var}")
    } else {
        format!("  \x1b[31m❌\x1b[0m {var} (not set)")
    }
}

fn build_after_help() -> String {
    let log_path = log_dir().join("ytdigest.log");

    format!(
        "\nAPI KEYS:\n{}\n{}\n\nConfig is read from: {}\nLogs are written to: {}",
        key_status("OPENAI_API_KEY"),
        key_status("ANTHROPIC_API_KEY"),
        config_path().display(),
        log_path.display()
    )
}

fn read_urls(url: Option<String>) -> Result<Vec<String>> {
    let urls = match url {
        Some(url) => vec![url],
        None => {
            let stdin = io::stdin();
            stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
        }
    };

    let urls: Vec<String> = urls
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    if urls.is_empty() {
        bail!("no URL provided\n\nUsage: ytdigest recipe <URL>\n       echo <URL> | ytdigest summarize");
    }
    Ok(urls)
}

fn print_outcome<T, F>(outcome: &Outcome<T>, format: OutputFormat, text: F)
where
    T: serde::Serialize,
    F: Fn(&Outcome<T>) -> String,
{
    let rendered = match format {
        OutputFormat::Text => text(outcome),
        OutputFormat::Json => output::render_json(outcome),
    };
    println!("{rendered}");
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable config: {e}");
        Config::default()
    });

    if cli.verbose {
        let path = config_path();
        if path.exists() {
            eprintln!("Config: {}", path.display());
        }
        eprintln!(
            "Models: summary={} recipe={} language={}",
            cli.model.as_deref().unwrap_or(&config.summary.model),
            cli.model.as_deref().unwrap_or(&config.recipe.model),
            config.language
        );
    }
    debug!("Config: {config:?}");

    let client = reqwest::Client::new();
    let completion = ModelRouter::from_env(client.clone(), Duration::from_millis(config.completion.timeout_ms));
    let pipeline = Pipeline::new(
        Fetcher::new(client),
        Arc::new(completion),
        PipelineSettings::from(&config),
    );

    let mut failures = 0;
    let mut total = 0;

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            if cli.verbose {
                eprintln!("Listening on {bind}");
            }
            let state = AppState {
                pipeline: Arc::new(pipeline),
            };
            server::serve(&bind, state).await?;
        }
        Command::Summarize { url, format } => {
            for url in read_urls(url)? {
                let outcome = pipeline.summarize(&url, cli.model.as_deref()).await;
                total += 1;
                if !outcome.is_success() {
                    failures += 1;
                }
                print_outcome(&outcome, format, output::render_summary);
            }
        }
        Command::Recipe { url, format } => {
            for url in read_urls(url)? {
                let outcome = pipeline.recipe(&url, cli.model.as_deref()).await;
                total += 1;
                if !outcome.is_success() {
                    failures += 1;
                }
                print_outcome(&outcome, format, output::render_recipe);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {total} requests failed");
    }

    Ok(())
}
