use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{FailureKind, GenerationError, SlackError};
use crate::events::EventCategory;
use crate::gemini::TextGenerator;
use crate::metrics::{
    GENERATION_FAILURES, GENERATION_LATENCY, SLACK_POST_FAILURES, THROTTLED_TOTAL,
    THROTTLE_WINDOW_SIZE,
};
use crate::models::IncomingEvent;
use crate::notices;
use crate::rate_limit::SlidingWindowLimiter;
use crate::slack::Messenger;

/// Result of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Success { text: String },
    Failure { kind: FailureKind },
}

/// Message the pipeline tried to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub channel: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Replied(Outbound),
    Throttled(Outbound),
    Failed { kind: FailureKind, notice: Outbound },
    Skipped,
}

impl PipelineOutcome {
    pub fn outbound(&self) -> Option<&Outbound> {
        match self {
            Self::Replied(o) | Self::Throttled(o) => Some(o),
            Self::Failed { notice, .. } => Some(notice),
            Self::Skipped => None,
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled(_))
    }
}

/// Turns a classified event into at most one outbound Slack message.
///
/// Never returns an error: generation and messaging failures end up as a
/// notice to the user, and failures to deliver that notice are only logged.
pub struct ReplyPipeline {
    limiter: Arc<SlidingWindowLimiter>,
    generator: Arc<dyn TextGenerator>,
    messenger: Arc<dyn Messenger>,
    generation_timeout: Duration,
    post_timeout: Duration,
}

impl ReplyPipeline {
    pub fn new(
        limiter: Arc<SlidingWindowLimiter>,
        generator: Arc<dyn TextGenerator>,
        messenger: Arc<dyn Messenger>,
        generation_timeout: Duration,
        post_timeout: Duration,
    ) -> Self {
        Self {
            limiter,
            generator,
            messenger,
            generation_timeout,
            post_timeout,
        }
    }

    pub async fn handle(&self, category: EventCategory, event: &IncomingEvent) -> PipelineOutcome {
        if !category.is_actionable() {
            return PipelineOutcome::Skipped;
        }
        let mention = category == EventCategory::ChannelMention;

        // Every actionable event takes a slot, including one that turns out
        // to have nowhere to reply to.
        let admitted = self.limiter.admit();
        THROTTLE_WINDOW_SIZE.set(self.limiter.len() as i64);

        let Some(channel) = event.channel.as_deref().filter(|c| !c.is_empty()) else {
            tracing::warn!(category = category.as_str(), admitted, "Event has no channel, skipping");
            return PipelineOutcome::Skipped;
        };
        let user = event.user();
        let address = |text: &str| {
            if mention {
                notices::mention(user, text)
            } else {
                text.to_string()
            }
        };

        let question = if mention {
            extract_question(event.text())
        } else {
            event.text().to_string()
        };

        if !admitted {
            THROTTLED_TOTAL.inc();
            if self.limiter.is_empty() {
                tracing::warn!("Rate limit ceiling is zero, every event is throttled");
            }
            tracing::info!(channel, user, "Local rate limit reached, sending throttle notice");
            let notice = Outbound {
                channel: channel.to_string(),
                text: address(notices::THROTTLED),
            };
            self.deliver_best_effort(&notice).await;
            return PipelineOutcome::Throttled(notice);
        }

        let kind = match self.generate(&question).await {
            ReplyOutcome::Success { text } => {
                let reply = Outbound {
                    channel: channel.to_string(),
                    text: address(&text),
                };
                match self.deliver(&reply).await {
                    Ok(()) => {
                        tracing::info!(channel, user, "Reply posted");
                        return PipelineOutcome::Replied(reply);
                    }
                    Err(e) => {
                        tracing::warn!(channel, error = %e, "Failed to post reply");
                        classify_failure(&e.to_string())
                    }
                }
            }
            ReplyOutcome::Failure { kind } => kind,
        };

        let notice = Outbound {
            channel: channel.to_string(),
            text: address(&notices::failure_notice(kind)),
        };
        self.deliver_best_effort(&notice).await;
        PipelineOutcome::Failed { kind, notice }
    }

    async fn generate(&self, prompt: &str) -> ReplyOutcome {
        let start = Instant::now();
        let result =
            match tokio::time::timeout(self.generation_timeout, self.generator.generate(prompt))
                .await
            {
                Ok(r) => r,
                Err(_) => Err(GenerationError::Timeout(self.generation_timeout.as_secs())),
            };
        GENERATION_LATENCY.observe(start.elapsed().as_secs_f64());

        match result {
            Ok(text) => ReplyOutcome::Success { text },
            Err(e) => {
                let kind = failure_kind(&e);
                GENERATION_FAILURES.with_label_values(&[kind.as_str()]).inc();
                tracing::warn!(error = %e, kind = kind.as_str(), "Generation failed");
                ReplyOutcome::Failure { kind }
            }
        }
    }

    async fn deliver(&self, out: &Outbound) -> Result<(), SlackError> {
        match tokio::time::timeout(
            self.post_timeout,
            self.messenger.post_message(&out.channel, &out.text),
        )
        .await
        {
            Ok(r) => r,
            Err(_) => Err(SlackError::Timeout(self.post_timeout.as_secs())),
        }
    }

    // Notices are fire-and-forget: a failed post is logged and dropped.
    async fn deliver_best_effort(&self, out: &Outbound) {
        if let Err(e) = self.deliver(out).await {
            SLACK_POST_FAILURES.inc();
            tracing::warn!(channel = %out.channel, error = %e, "Failed to post notice, dropping");
        }
    }
}

/// Strip the leading `<@BOT>` markup: everything after the first `>`, trimmed.
pub fn extract_question(text: &str) -> String {
    match text.split_once('>') {
        Some((_, rest)) => rest.trim().to_string(),
        None => text.trim().to_string(),
    }
}

// Only backend-reported API errors carry meaningful text; transport,
// decode and timeout failures are always unknown.
fn failure_kind(err: &GenerationError) -> FailureKind {
    match err {
        GenerationError::Api { .. } => classify_failure(&err.to_string()),
        _ => FailureKind::Unknown,
    }
}

/// Map a backend error message to a user-facing failure kind.
///
/// Substring based; these match the wording of Google's API errors.
pub fn classify_failure(message: &str) -> FailureKind {
    if message.contains("429") || message.contains("RATE_LIMIT_EXCEEDED") {
        FailureKind::RateLimitedUpstream
    } else if message.contains("InvalidArgument") {
        FailureKind::InvalidInput
    } else {
        FailureKind::Unknown
    }
}
