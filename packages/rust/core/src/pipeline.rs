//! Resumable link-processing loop.
//!
//! Each iteration re-reads the link and prompt files, resumes at the
//! persisted cursor, and for every remaining link: fetches the page,
//! extracts its visible text, runs every prompt against it, and records the
//! answers in the result log and the link's snapshot. The cursor advances
//! only after a link is fully handled.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use linkprompt_extract::extract;
use linkprompt_fetch::PageFetcher;
use linkprompt_shared::{LinkPromptError, LinkSnapshot, PromptResult, Result, RunPaths, read_lines};
use linkprompt_storage::{END_OF_LINK, ProgressTracker, ResultSink, result_block, unavailable_block};

use crate::inference::Inference;
use crate::prompt::build_prompt;

// ---------------------------------------------------------------------------
// Config & results
// ---------------------------------------------------------------------------

/// Settings for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Where every input and output file lives.
    pub paths: RunPaths,
    /// Model identifier handed to the inference adapter.
    pub model: String,
    /// Sleep between idle iterations.
    pub interval: Duration,
    /// Keep every fetched body as `page_<n>.html`.
    pub save_raw: bool,
}

/// What a single iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// The link file is missing or has no usable lines.
    NoLinks,
    /// Every link before the cursor has already been handled.
    UpToDate { cursor: usize, links: usize },
    /// Links `from..to` (zero-based) were handled in this iteration.
    Processed { from: usize, to: usize },
}

impl Iteration {
    /// Whether the loop should sleep before the next iteration.
    pub fn is_idle(&self) -> bool {
        !matches!(self, Self::Processed { .. })
    }
}

/// How one link ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The page could not be fetched; no prompts were run.
    Unavailable,
    /// Every prompt was run against the page text.
    Completed { prompts: usize },
}

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Observer for pipeline events, used by the CLI to echo progress.
pub trait ProgressReporter: Send + Sync {
    /// A link is about to be fetched. `number` is 1-based.
    fn link_started(&self, number: usize, total: usize, url: &str);
    /// The page for a link could not be fetched.
    fn link_unavailable(&self, number: usize, url: &str);
    /// One prompt has been answered.
    fn prompt_finished(&self, number: usize, prompt: &str, response: &str);
    /// Nothing to do; the loop sleeps for `wait`.
    fn waiting(&self, iteration: &Iteration, wait: Duration);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn link_started(&self, _number: usize, _total: usize, _url: &str) {}
    fn link_unavailable(&self, _number: usize, _url: &str) {}
    fn prompt_finished(&self, _number: usize, _prompt: &str, _response: &str) {}
    fn waiting(&self, _iteration: &Iteration, _wait: Duration) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Arc<dyn PageFetcher>,
    inference: Arc<dyn Inference>,
    cursor: ProgressTracker,
    sink: ResultSink,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn PageFetcher>,
        inference: Arc<dyn Inference>,
    ) -> Self {
        let cursor = ProgressTracker::new(&config.paths.progress_file);
        let sink = ResultSink::new(config.paths.clone());
        Self {
            config,
            fetcher,
            inference,
            cursor,
            sink,
        }
    }

    /// Create the result log so it exists before the first link is handled.
    pub fn prepare(&self) -> Result<()> {
        self.sink.ensure_log()
    }

    /// Loop forever: process pending links, then sleep whenever idle.
    ///
    /// Returns only on a fatal error, such as an empty prompt file.
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<()> {
        self.prepare()?;
        info!(
            links = %self.config.paths.link_file.display(),
            prompts = %self.config.paths.prompt_file.display(),
            model = %self.config.model,
            interval_secs = self.config.interval.as_secs(),
            "pipeline started"
        );

        loop {
            let iteration = self.run_once(progress).await?;
            if iteration.is_idle() {
                progress.waiting(&iteration, self.config.interval);
                tokio::time::sleep(self.config.interval).await;
            }
        }
    }

    /// One pass over the link file, starting at the persisted cursor.
    #[instrument(skip_all)]
    pub async fn run_once(&self, progress: &dyn ProgressReporter) -> Result<Iteration> {
        let paths = &self.config.paths;
        let links = read_lines(&paths.link_file)?;
        let prompts = read_lines(&paths.prompt_file)?;

        if links.is_empty() {
            info!(path = %paths.link_file.display(), "no links found");
            return Ok(Iteration::NoLinks);
        }
        if prompts.is_empty() {
            return Err(LinkPromptError::NoPrompts {
                path: paths.prompt_file.clone(),
            });
        }

        let start = self.cursor.read()?;
        if start >= links.len() {
            debug!(cursor = start, links = links.len(), "all links processed");
            return Ok(Iteration::UpToDate {
                cursor: start,
                links: links.len(),
            });
        }

        info!(from = start + 1, to = links.len(), prompts = prompts.len(), "processing links");
        for (index, url) in links.iter().enumerate().skip(start) {
            progress.link_started(index + 1, links.len(), url);
            self.process_link(index, url, &prompts, progress).await?;
            self.cursor.advance(index + 1)?;
        }

        Ok(Iteration::Processed {
            from: start,
            to: links.len(),
        })
    }

    /// Handle one link: fetch, extract, run every prompt, record results.
    ///
    /// Does not touch the cursor. `index` is zero-based.
    #[instrument(skip_all, fields(link = index + 1, url = %url))]
    pub async fn process_link(
        &self,
        index: usize,
        url: &str,
        prompts: &[String],
        progress: &dyn ProgressReporter,
    ) -> Result<LinkOutcome> {
        let number = index + 1;

        let body = match self.fetcher.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "page not available");
                self.sink.append_log(&unavailable_block(number, url))?;
                self.sink
                    .write_snapshot(index, &LinkSnapshot::unavailable(url))?;
                progress.link_unavailable(number, url);
                return Ok(LinkOutcome::Unavailable);
            }
        };

        if self.config.save_raw {
            self.sink.write_raw_page(index, &body)?;
        }

        let mut snapshot = LinkSnapshot::new(url, extract(&body));
        debug!(bytes = body.len(), chars = snapshot.page_text.len(), "page extracted");
        self.sink.write_snapshot(index, &snapshot)?;

        for prompt in prompts {
            let instruction = build_prompt(&snapshot.page_text, prompt);
            let response = self.inference.infer(&self.config.model, &instruction).await;

            progress.prompt_finished(number, prompt, &response);
            let block = result_block(number, url, prompt, &response);

            snapshot.results.push(PromptResult::new(prompt.as_str(), response));
            self.sink.write_snapshot(index, &snapshot)?;
            self.sink.append_log(&block)?;
        }

        self.sink.append_log(END_OF_LINK)?;
        info!(prompts = prompts.len(), "link done");
        Ok(LinkOutcome::Completed {
            prompts: prompts.len(),
        })
    }
}
