//! # Run Configuration
//!
//! `TestConfig` is the authoritative description of one load-test run. It is
//! built once from the command line, validated before any request is sent,
//! and then shared read-only (behind an `Arc`) by the scheduler and every
//! executor task.

use crate::{cli::Args, prompts, utils};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Model and sampling settings sent with every chat-completion call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Base URL of the OpenAI-compatible API, without the `/chat/completions` suffix
    pub base_url: String,

    /// Bearer token; never written to reports
    #[serde(skip_serializing, default)]
    pub api_key: String,

    pub model: String,

    /// Fixed system-role message preceding each user prompt
    pub system_prompt: String,

    pub temperature: f32,
    pub top_p: f32,

    /// Optional top-k; omitted from the request body when `None`
    pub top_k: Option<u32>,

    pub max_tokens: u32,

    /// Whether the server may generate extended reasoning output
    ///
    /// Disabled by default so latency reflects plain completions.
    pub enable_thinking: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: crate::defaults::BASE_URL.to_string(),
            api_key: crate::defaults::API_KEY.to_string(),
            model: crate::defaults::MODEL.to_string(),
            system_prompt: crate::defaults::SYSTEM_PROMPT.to_string(),
            temperature: crate::defaults::TEMPERATURE,
            top_p: crate::defaults::TOP_P,
            top_k: None,
            max_tokens: crate::defaults::MAX_TOKENS,
            enable_thinking: false,
        }
    }
}

/// Configuration for one load-test run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestConfig {
    /// Nominal requests per second
    pub target_rate: f64,

    /// Length of the release window
    pub duration: Duration,

    /// Prompts in send order
    pub prompt_pool: Vec<String>,

    /// Lift the pool-length cap and reuse prompts as `pool[i % len]`
    pub cycle_prompts: bool,

    pub model: ModelSettings,

    /// Directory the timestamped text report is written into
    pub output_dir: PathBuf,

    /// Optional JSON export path
    pub json_output: Option<PathBuf>,
}

impl TestConfig {
    /// Create a test configuration from CLI arguments
    ///
    /// Loads the prompt pool (built-in or from `--prompts-file`) and validates
    /// every parameter.
    ///
    /// ## Returns
    /// - `Ok(TestConfig)`: Valid configuration ready for use
    /// - `Err(anyhow::Error)`: Unreadable prompt file or invalid parameter
    pub fn from_args(args: &Args) -> Result<Self> {
        let prompt_pool = match &args.prompts_file {
            Some(path) => prompts::load_prompts_file(path)?,
            None => prompts::default_prompts(),
        };

        let config = Self {
            target_rate: args.target_rate,
            duration: args.duration,
            prompt_pool,
            cycle_prompts: args.cycle_prompts,
            model: ModelSettings {
                base_url: args.base_url.trim_end_matches('/').to_string(),
                api_key: args.api_key.clone(),
                model: args.model.clone(),
                system_prompt: args.system_prompt.clone(),
                temperature: args.temperature,
                top_p: args.top_p,
                top_k: args.top_k,
                max_tokens: args.max_tokens,
                enable_thinking: args.enable_thinking,
            },
            output_dir: args.output_dir.clone(),
            json_output: args.json_output.clone(),
        };

        config.validate().context("Invalid load-test configuration")?;
        Ok(config)
    }

    /// Check every parameter a run depends on.
    pub fn validate(&self) -> Result<()> {
        utils::validate_target_rate(self.target_rate)?;
        utils::validate_duration(self.duration)?;
        if self.prompt_pool.is_empty() {
            anyhow::bail!("Prompt pool cannot be empty");
        }
        let planned = self.target_rate * self.duration.as_secs_f64();
        if self.cycle_prompts && planned > crate::defaults::MAX_REQUESTS as f64 {
            anyhow::bail!(
                "Run would issue {:.0} requests, more than the limit of {}; lower --qps or --duration",
                planned,
                crate::defaults::MAX_REQUESTS
            );
        }
        if self.model.model.trim().is_empty() {
            anyhow::bail!("Model name cannot be empty");
        }
        if self.model.base_url.trim().is_empty() {
            anyhow::bail!("Base URL cannot be empty");
        }
        utils::validate_sampling(
            self.model.temperature,
            self.model.top_p,
            self.model.max_tokens,
        )
    }

    /// Number of request slots in the release window, `floor(rate * duration)`.
    pub fn scheduled_slots(&self) -> usize {
        // Absorb float error so e.g. 0.29 req/s over 100s yields 29, not 28.
        (self.target_rate * self.duration.as_secs_f64() + 1e-9).floor() as usize
    }

    /// Number of requests this run will dispatch
    ///
    /// Capped at the prompt pool length unless `cycle_prompts` is set.
    pub fn total_requests(&self) -> usize {
        let slots = self.scheduled_slots();
        if self.cycle_prompts {
            slots
        } else {
            slots.min(self.prompt_pool.len())
        }
    }
}
