use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use smartdoc_core::config::LlmSettings;
use smartdoc_core::traits::Generator;

/// Blocking client for a local Ollama runtime (`/api/generate`).
#[derive(Clone)]
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: Client,
}

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

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        Self::new(&settings.base_url, &settings.model, Duration::from_secs(settings.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the runtime answers at all.
    pub fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        self.client.get(&url).send().map(|r| r.status().is_success()).unwrap_or(false)
    }

    /// Whether the configured model is pulled. `deepseek-r1` matches `deepseek-r1:latest`.
    pub fn has_model(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        let res = self.client.get(&url).send().with_context(|| format!("Ollama unreachable at {}", self.base_url))?;
        if !res.status().is_success() {
            bail!("Ollama tags request failed: {}", res.status());
        }
        let tags: TagsResponse = res.json().context("unexpected tags response")?;
        Ok(tags.models.iter().any(|m| m.name == self.model || m.name.split(':').next() == Some(self.model.as_str())))
    }
}

impl Generator for OllamaGenerator {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest { model: &self.model, prompt, stream: false };
        let start = Instant::now();
        debug!(model = %self.model, prompt_chars = prompt.len(), "calling Ollama");

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .with_context(|| format!("Ollama unreachable at {}", self.base_url))?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().unwrap_or_default();
            bail!("Ollama returned {status}: {}", text.trim());
        }
        let payload: GenerateResponse = res.json().context("unexpected Ollama response")?;
        info!(model = %self.model, ms = start.elapsed().as_millis() as u64, "generated answer");
        Ok(payload.response)
    }
}
