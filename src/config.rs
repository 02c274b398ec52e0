use clap::Parser;
use std::time::Duration;

use crate::error::ConfigError;
use crate::gemini::GEMINI_API_BASE;
use crate::slack::SLACK_API_BASE;

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const SLACK_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";

/// Credentials that must be present before the listener is bound.
pub const REQUIRED_ENV: [&str; 2] = [GOOGLE_API_KEY, SLACK_BOT_TOKEN];

// CLI argument structure, every flag also readable from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "slack-gemini-bridge")]
#[command(about = "Answers Slack mentions and direct messages with Gemini")]
pub struct Args {
    // Port to listen on (all interfaces)
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = GOOGLE_API_KEY, hide_env_values = true)]
    pub google_api_key: Option<String>,

    // Bot token (xoxb-...)
    #[arg(long, env = SLACK_BOT_TOKEN, hide_env_values = true)]
    pub slack_bot_token: Option<String>,

    // When set, POST / requires a valid X-Slack-Signature
    #[arg(long, env = "SLACK_SIGNING_SECRET", hide_env_values = true)]
    pub slack_signing_secret: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash-lite-preview-02-05")]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_API_BASE", default_value = GEMINI_API_BASE)]
    pub gemini_api_base: String,

    #[arg(long, env = "SLACK_API_BASE", default_value = SLACK_API_BASE)]
    pub slack_api_base: String,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: usize,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // Seconds to wait for the generation backend
    #[arg(long, env = "GENERATION_TIMEOUT", default_value_t = 30)]
    pub generation_timeout: u64,

    // Seconds to wait for a Slack API call
    #[arg(long, env = "SLACK_TIMEOUT", default_value_t = 10)]
    pub slack_timeout: u64,

    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub google_api_key: String,
    pub slack_bot_token: String,
    pub slack_signing_secret: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub slack_api_base: String,
    pub rate_limit: usize,
    pub rate_window: Duration,
    pub generation_timeout: Duration,
    pub slack_timeout: Duration,
    pub log_json: bool,
}

impl Args {
    /// Check required credentials, reporting every missing one at once.
    pub fn validate(self) -> Result<Config, ConfigError> {
        let google_api_key = non_empty(self.google_api_key);
        let slack_bot_token = non_empty(self.slack_bot_token);

        let mut missing = Vec::new();
        if google_api_key.is_none() {
            missing.push(GOOGLE_API_KEY.to_string());
        }
        if slack_bot_token.is_none() {
            missing.push(SLACK_BOT_TOKEN.to_string());
        }

        match (google_api_key, slack_bot_token) {
            (Some(google_api_key), Some(slack_bot_token)) => Ok(Config {
                port: self.port,
                google_api_key,
                slack_bot_token,
                slack_signing_secret: non_empty(self.slack_signing_secret),
                gemini_model: self.gemini_model,
                gemini_api_base: self.gemini_api_base,
                slack_api_base: self.slack_api_base,
                rate_limit: self.rate_limit,
                rate_window: Duration::from_secs(self.rate_window),
                generation_timeout: Duration::from_secs(self.generation_timeout),
                slack_timeout: Duration::from_secs(self.slack_timeout),
                log_json: self.log_json,
            }),
            _ => Err(ConfigError::MissingEnv(missing)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
