//! CLI definition, tracing setup, and the run loop wiring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use linkprompt_core::inference::build_inference;
use linkprompt_core::pipeline::{Iteration, Pipeline, PipelineConfig, ProgressReporter};
use linkprompt_fetch::HttpFetcher;
use linkprompt_shared::{AppConfig, LinkPromptError, LogFormat, RunPaths, load_config_for};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// linkprompt: run a list of prompts against every page in a link file.
#[derive(Parser)]
#[command(
    name = "linkprompt",
    version,
    about = "Fetch each linked page and answer a fixed set of prompts about it with a local model.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Link file, one URL per line. Prompts, progress and results live next to it.
    #[arg(default_value = "links.txt")]
    pub link_file: PathBuf,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing from the `[logging]` section. `RUST_LOG` wins when set.
pub(crate) fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("linkprompt=info"));

    // stdout carries the prompt/answer echo, so logs go to stderr.
    match config.logging.format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Load config, build the adapters, and loop until a fatal error.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let paths = RunPaths::from_link_file(Some(&cli.link_file));
    let config = load_config_for(&paths)?;
    init_tracing(&config);

    println!("Link-Datei: {}", paths.link_file.display());
    println!("Prompt-Datei: {}", paths.prompt_file.display());
    println!("Modell: {}", config.pipeline.model);
    info!(
        config = %paths.config_file.display(),
        backend = ?config.inference.backend,
        "configuration loaded"
    );

    let fetcher = HttpFetcher::new(&config.fetch)?;
    let inference = build_inference(&config.inference)?;
    let pipeline = Pipeline::new(
        PipelineConfig {
            paths,
            model: config.pipeline.model.clone(),
            interval: Duration::from_secs(config.pipeline.interval_secs),
            save_raw: config.fetch.save_raw,
        },
        Arc::new(fetcher),
        Arc::from(inference),
    );

    let reporter = CliProgress::new();
    match pipeline.run(&reporter).await {
        Ok(()) => Ok(()),
        Err(LinkPromptError::NoPrompts { path }) => {
            reporter.spinner.finish_and_clear();
            eprintln!("Keine Prompts gefunden. Bitte fülle {}", path.display());
            std::process::exit(1);
        }
        Err(e) => {
            reporter.spinner.finish_and_clear();
            Err(eyre!(e))
        }
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Echoes answers to stdout under an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn link_started(&self, number: usize, total: usize, url: &str) {
        self.spinner
            .set_message(format!("Link [{number}/{total}] {url}"));
    }

    fn link_unavailable(&self, number: usize, _url: &str) {
        self.spinner
            .suspend(|| println!("Link {number}: Webseite nicht vorhanden"));
    }

    fn prompt_finished(&self, _number: usize, prompt: &str, response: &str) {
        self.spinner.suspend(|| {
            println!("Prompt: {prompt}");
            println!("Ergebnis: {response}");
        });
    }

    fn waiting(&self, iteration: &Iteration, wait: Duration) {
        let secs = wait.as_secs();
        let message = match iteration {
            Iteration::NoLinks => format!("Keine Links gefunden. Warte {secs} Sekunden..."),
            _ => format!("Alle Links verarbeitet. Warte {secs} Sekunden auf neue Links..."),
        };
        self.spinner.set_message(message);
    }
}
