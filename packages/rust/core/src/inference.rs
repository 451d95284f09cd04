//! Inference adapters.
//!
//! An [`Inference`] turns an instruction into response text. Failures never
//! surface as errors: the pipeline records [`INFERENCE_FAILED`] as the
//! response and moves on to the next prompt.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use linkprompt_shared::{InferenceBackend, InferenceSettings, LinkPromptError, Result};

/// Response text recorded when the model could not be run at all.
pub const INFERENCE_FAILED: &str = "Konnte Ollama nicht ausführen.";

/// Sends one instruction to a model and returns its output.
#[async_trait]
pub trait Inference: Send + Sync {
    /// Always yields a string. Adapter failures map to [`INFERENCE_FAILED`].
    async fn infer(&self, model: &str, instruction: &str) -> String;
}

/// Build the adapter selected in `[inference]`.
pub fn build_inference(settings: &InferenceSettings) -> Result<Box<dyn Inference>> {
    match settings.backend {
        InferenceBackend::Cli => Ok(Box::new(OllamaCli::new(settings.command.clone()))),
        InferenceBackend::Http => Ok(Box::new(OllamaHttp::new(
            &settings.host,
            Duration::from_secs(settings.timeout_secs),
        )?)),
    }
}

// ---------------------------------------------------------------------------
// Local CLI
// ---------------------------------------------------------------------------

/// Runs `<command> run <model>` and feeds the instruction on stdin.
///
/// The instruction never passes through a shell, so quotes and other
/// metacharacters in page text reach the model unchanged.
#[derive(Debug, Clone)]
pub struct OllamaCli {
    command: String,
}

impl OllamaCli {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn run(&self, model: &str, instruction: &str) -> Result<String> {
        let mut child = Command::new(&self.command)
            .arg("run")
            .arg(model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LinkPromptError::Inference(format!(
                    "failed to spawn `{}`: {e}. Is `{}` installed?",
                    self.command, self.command
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| LinkPromptError::Inference("failed to capture model stdin".into()))?;

        // Feed stdin while collecting output so a chatty model cannot block us.
        let feed = async move {
            let written = stdin.write_all(instruction.as_bytes()).await;
            drop(stdin);
            written
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());

        let output =
            output.map_err(|e| LinkPromptError::Inference(format!("model process failed: {e}")))?;
        if let Err(e) = written {
            // The model may exit before reading everything; its output still counts.
            debug!(error = %e, "model closed stdin early");
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "model exited unsuccessfully");
            if stdout.is_empty() {
                return Err(LinkPromptError::Inference(format!(
                    "model exited with {}",
                    output.status
                )));
            }
        }

        Ok(stdout)
    }
}

#[async_trait]
impl Inference for OllamaCli {
    #[instrument(
        skip_all,
        fields(model = %model, command = %self.command, chars = instruction.len())
    )]
    async fn infer(&self, model: &str, instruction: &str) -> String {
        match self.run(model, instruction).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "inference failed");
                INFERENCE_FAILED.to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP server
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Calls `POST {host}/api/generate` on a running Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaHttp {
    client: reqwest::Client,
    endpoint: String,
}

impl OllamaHttp {
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                LinkPromptError::config(format!("failed to build inference client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", host.trim_end_matches('/')),
        })
    }

    async fn generate(&self, model: &str, instruction: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest {
                model,
                prompt: instruction,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| LinkPromptError::Inference(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkPromptError::Inference(format!(
                "server answered HTTP {status}"
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LinkPromptError::Inference(format!("unexpected response body: {e}")))?;
        Ok(body.response)
    }
}

#[async_trait]
impl Inference for OllamaHttp {
    #[instrument(
        skip_all,
        fields(model = %model, endpoint = %self.endpoint, chars = instruction.len())
    )]
    async fn infer(&self, model: &str, instruction: &str) -> String {
        match self.generate(model, instruction).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "inference failed");
                INFERENCE_FAILED.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_command_yields_failure_text() {
        let cli = OllamaCli::new(format!("lp-no-such-binary-{}", uuid::Uuid::now_v7()));
        assert_eq!(cli.infer("m", "hello").await, INFERENCE_FAILED);
    }

    #[cfg(unix)]
    fn fake_model(body: &str) -> (std::path::PathBuf, String) {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("lp-inference-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let script = dir.join("fake-ollama");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let command = script.to_string_lossy().to_string();
        (dir, command)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cli_passes_model_and_instruction_verbatim() {
        let (tmp, command) = fake_model("echo \"$1 $2\"\ncat");
        let cli = OllamaCli::new(command);

        let instruction = "it's \"quoted\" $HOME `id`\nsecond line";
        let out = cli.infer("deepseek-r1:7b", instruction).await;
        assert_eq!(out, format!("run deepseek-r1:7b\n{instruction}"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cli_failure_with_output_keeps_output() {
        let (tmp, command) = fake_model("echo partial\nexit 3");
        let cli = OllamaCli::new(command);
        assert_eq!(cli.infer("m", "x").await, "partial\n");
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cli_failure_without_output_is_failure_text() {
        let (tmp, command) = fake_model("echo 'model not found' >&2\nexit 1");
        let cli = OllamaCli::new(command);
        assert_eq!(cli.infer("m", "x").await, INFERENCE_FAILED);
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn http_returns_response_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-r1:7b",
                "prompt": "Summarize",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "deepseek-r1:7b",
                "response": "Short summary.",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let http = OllamaHttp::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
        assert_eq!(http.infer("deepseek-r1:7b", "Summarize").await, "Short summary.");
    }

    #[tokio::test]
    async fn http_errors_yield_failure_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let http = OllamaHttp::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(http.infer("m", "x").await, INFERENCE_FAILED);

        let unreachable = OllamaHttp::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert_eq!(unreachable.infer("m", "x").await, INFERENCE_FAILED);
    }

    #[tokio::test]
    async fn http_garbage_body_yields_failure_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let http = OllamaHttp::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(http.infer("m", "x").await, INFERENCE_FAILED);
    }

    #[test]
    fn builds_selected_backend() {
        let mut settings = InferenceSettings::default();
        assert!(build_inference(&settings).is_ok());
        settings.backend = InferenceBackend::Http;
        assert!(build_inference(&settings).is_ok());
    }
}
