mod config;
mod error;
mod events;
mod gemini;
mod handlers;
mod metrics;
mod models;
mod notices;
mod pipeline;
mod rate_limit;
mod signature;
mod slack;
mod state;

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::{Args, Config};
use crate::gemini::GeminiClient;
use crate::pipeline::ReplyPipeline;
use crate::rate_limit::SlidingWindowLimiter;
use crate::slack::SlackClient;
use crate::state::AppState;

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // .env is optional; real environment variables take precedence
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_logging(args.log_json);

    let config = match args.validate() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("set them in the environment or in a .env file");
            std::process::exit(1);
        }
    };

    let state = Arc::new(build_state(&config)?);
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Slack bridge listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Slack bridge stopped");
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState, reqwest::Error> {
    let gemini_http = reqwest::Client::builder()
        .timeout(config.generation_timeout)
        .build()?;
    let slack_http = reqwest::Client::builder()
        .timeout(config.slack_timeout)
        .build()?;

    let generator = Arc::new(GeminiClient::new(
        gemini_http,
        &config.gemini_api_base,
        config.google_api_key.clone(),
        config.gemini_model.clone(),
    ));
    let messenger = Arc::new(SlackClient::new(
        slack_http,
        &config.slack_api_base,
        config.slack_bot_token.clone(),
    ));
    let limiter = Arc::new(SlidingWindowLimiter::new(config.rate_limit, config.rate_window));

    tracing::info!(
        model = generator.model(),
        rate_limit = limiter.ceiling(),
        rate_window_secs = limiter.window().as_secs(),
        signature_check = config.slack_signing_secret.is_some(),
        "Reply pipeline configured"
    );

    Ok(AppState {
        pipeline: ReplyPipeline::new(
            limiter,
            generator,
            messenger.clone(),
            config.generation_timeout,
            config.slack_timeout,
        ),
        messenger,
        signing_secret: config.slack_signing_secret.clone(),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
