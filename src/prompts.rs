//! Prompt pools
//!
//! The load generator sends one prompt per request, drawn in order from a
//! pool. The pool is either the built-in set of thirty general-knowledge
//! questions or a user-supplied file with one prompt per line.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Built-in prompt pool, thirty short open-ended questions.
pub const DEFAULT_PROMPTS: [&str; 30] = [
    "What is artificial intelligence?",
    "How should I start learning to program?",
    "Describe the main characteristics of the Python language.",
    "What are the basic principles of quantum computing?",
    "How do I build a simple website?",
    "What are some applications of blockchain technology?",
    "What is the difference between machine learning and deep learning?",
    "How can I learn a foreign language effectively?",
    "Recommend a few science fiction novels.",
    "How can I maintain a healthy lifestyle?",
    "What effects does climate change have on the Earth?",
    "Which planets are in the solar system?",
    "How can I manage my time well?",
    "What is the most important invention in human history?",
    "How can creativity be cultivated?",
    "What are the basic steps of big data analysis?",
    "How can a team collaborate effectively?",
    "Describe some traditional Chinese festivals.",
    "How do I cook a simple home-style dish?",
    "What is the highest mountain in the world?",
    "How should I cope with work pressure?",
    "Describe several common ways to invest.",
    "How can I protect my personal privacy and data?",
    "What ethical issues might artificial intelligence raise?",
    "How can I improve my reading comprehension?",
    "Describe some effective study methods.",
    "How do I build a good reading habit?",
    "What might future means of transportation look like?",
    "How do I get started with writing?",
    "Describe a few popular music genres.",
];

/// The built-in pool as owned strings.
pub fn default_prompts() -> Vec<String> {
    DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect()
}

/// Load a prompt pool from a text file, one prompt per line.
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
/// An empty resulting pool is an error since no request could be planned.
pub fn load_prompts_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prompts file {}", path.display()))?;

    let prompts = parse_prompts(&text);
    if prompts.is_empty() {
        anyhow::bail!("Prompts file {} contains no prompts", path.display());
    }

    debug!("Loaded {} prompts from {}", prompts.len(), path.display());
    Ok(prompts)
}

fn parse_prompts(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
