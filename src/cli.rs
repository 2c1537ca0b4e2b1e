use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Chat Loadgen - fixed-rate load generator for chat-completion endpoints
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Target request rate in requests per second
    #[clap(short = 'q', long = "qps", default_value_t = crate::defaults::TARGET_RATE, help_heading = "Load Options")]
    pub target_rate: f64,

    /// How long to keep issuing requests (e.g. "30", "30s", "500ms", "2m")
    #[clap(short = 'd', long, value_parser = parse_duration, default_value = "30s", help_heading = "Load Options")]
    pub duration: Duration,

    /// File with one prompt per line (defaults to the built-in prompt pool)
    #[clap(short = 'p', long, help_heading = "Load Options")]
    pub prompts_file: Option<PathBuf>,

    /// Reuse prompts cyclically instead of capping the run at the pool size
    #[clap(long, default_value_t = false, help_heading = "Load Options")]
    pub cycle_prompts: bool,

    /// Base URL of the OpenAI-compatible API (the "/chat/completions" path is appended)
    #[clap(long, default_value = crate::defaults::BASE_URL, help_heading = "Endpoint Options")]
    pub base_url: String,

    /// API key sent as a bearer token
    #[clap(long, env = "OPENAI_API_KEY", default_value = crate::defaults::API_KEY, hide_env_values = true, help_heading = "Endpoint Options")]
    pub api_key: String,

    /// Model name sent with every request
    #[clap(short = 'm', long, default_value = crate::defaults::MODEL, help_heading = "Endpoint Options")]
    pub model: String,

    /// System prompt sent ahead of every user prompt
    #[clap(long, default_value = crate::defaults::SYSTEM_PROMPT, help_heading = "Endpoint Options")]
    pub system_prompt: String,

    /// Sampling temperature
    #[clap(long, default_value_t = crate::defaults::TEMPERATURE, help_heading = "Sampling Options")]
    pub temperature: f32,

    /// Nucleus sampling probability mass
    #[clap(long, default_value_t = crate::defaults::TOP_P, help_heading = "Sampling Options")]
    pub top_p: f32,

    /// Top-k sampling (omitted from the request when unset)
    #[clap(long, help_heading = "Sampling Options")]
    pub top_k: Option<u32>,

    /// Maximum tokens generated per request
    #[clap(long, default_value_t = crate::defaults::MAX_TOKENS, help_heading = "Sampling Options")]
    pub max_tokens: u32,

    /// Let the server generate reasoning content (disabled by default for speed)
    #[clap(long, default_value_t = false, help_heading = "Sampling Options")]
    pub enable_thinking: bool,

    /// Directory the text report is written into
    #[clap(short = 'o', long, default_value = crate::defaults::OUTPUT_DIR, help_heading = "Output Options")]
    pub output_dir: PathBuf,

    /// Additionally write the full run as JSON to this path
    #[clap(long, help_heading = "Output Options")]
    pub json_output: Option<PathBuf>,

    /// Silence all console output except warnings and errors
    #[clap(long, default_value_t = false, help_heading = "Logging Options")]
    pub quiet: bool,

    /// Increase console verbosity (-v debug, -vv trace)
    #[clap(short = 'v', long, action = clap::ArgAction::Count, help_heading = "Logging Options")]
    pub verbose: u8,

    /// Also write log output to this file
    #[clap(long, help_heading = "Logging Options")]
    pub log_file: Option<PathBuf>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            target_rate: crate::defaults::TARGET_RATE,
            duration: crate::defaults::DURATION,
            prompts_file: None,
            cycle_prompts: false,
            base_url: crate::defaults::BASE_URL.to_string(),
            api_key: crate::defaults::API_KEY.to_string(),
            model: crate::defaults::MODEL.to_string(),
            system_prompt: crate::defaults::SYSTEM_PROMPT.to_string(),
            temperature: crate::defaults::TEMPERATURE,
            top_p: crate::defaults::TOP_P,
            top_k: None,
            max_tokens: crate::defaults::MAX_TOKENS,
            enable_thinking: false,
            output_dir: PathBuf::from(crate::defaults::OUTPUT_DIR),
            json_output: None,
            quiet: false,
            verbose: 0,
            log_file: None,
        }
    }
}

/// Parse duration from string (e.g., "10s", "5m", "1h")
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, "s")
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, "m")
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, "h")
    } else {
        (s, "s") // Default to seconds
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", num_str))?;

    if !num.is_finite() || num < 0.0 {
        return Err(format!("Duration must be a non-negative number: {}", s));
    }

    let seconds = match unit {
        "ms" => num / 1000.0,
        "s" => num,
        "m" => num * 60.0,
        "h" => num * 3600.0,
        _ => return Err(format!("Invalid duration unit: {}", unit)),
    };

    Duration::try_from_secs_f64(seconds).map_err(|e| format!("Invalid duration {}: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("10").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));

        assert!(parse_duration("").is_err());
        assert!(parse_duration("invalid").is_err());
        assert!(parse_duration("-3s").is_err());
    }

    #[test]
    fn test_args_defaults_match_clap_defaults() {
        let parsed = Args::parse_from(["chat-loadgen"]);
        let defaults = Args::default();

        assert_eq!(parsed.target_rate, defaults.target_rate);
        assert_eq!(parsed.duration, defaults.duration);
        assert_eq!(parsed.model, defaults.model);
        assert_eq!(parsed.max_tokens, defaults.max_tokens);
        assert_eq!(parsed.output_dir, defaults.output_dir);
        assert!(!parsed.cycle_prompts);
        assert!(!parsed.enable_thinking);
        assert!(parsed.top_k.is_none());
    }

    #[test]
    fn test_args_parse_load_options() {
        let args = Args::parse_from([
            "chat-loadgen",
            "-q",
            "2",
            "-d",
            "5s",
            "--top-k",
            "20",
            "--cycle-prompts",
            "-vv",
        ]);

        assert_eq!(args.target_rate, 2.0);
        assert_eq!(args.duration, Duration::from_secs(5));
        assert_eq!(args.top_k, Some(20));
        assert!(args.cycle_prompts);
        assert_eq!(args.verbose, 2);
    }
}
