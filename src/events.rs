use crate::models::EventPayload;

/// Header Slack sets on automatic redeliveries.
pub const RETRY_NUM_HEADER: &str = "X-Slack-Retry-Num";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    VerificationChallenge,
    DuplicateRetry,
    ChannelMention,
    DirectMessage,
    Ignored,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerificationChallenge => "verification_challenge",
            Self::DuplicateRetry => "duplicate_retry",
            Self::ChannelMention => "channel_mention",
            Self::DirectMessage => "direct_message",
            Self::Ignored => "ignored",
        }
    }

    /// Whether this category leads to a generation call.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::ChannelMention | Self::DirectMessage)
    }
}

/// Classify an inbound payload. `retry_num` is the raw retry header value.
///
/// Rules are checked in priority order: challenge, redelivery, mention,
/// direct message. Anything else is ignored.
pub fn classify(payload: &EventPayload, retry_num: Option<&str>) -> EventCategory {
    if payload.challenge.is_some() {
        return EventCategory::VerificationChallenge;
    }

    if is_redelivery(retry_num) {
        return EventCategory::DuplicateRetry;
    }

    let Some(event) = &payload.event else {
        return EventCategory::Ignored;
    };

    match event.event_type.as_deref() {
        Some("app_mention") => EventCategory::ChannelMention,
        // a subtype marks system messages (joins, topic changes, edits)
        Some("message")
            if event.channel_type.as_deref() == Some("im") && event.subtype.is_none() =>
        {
            EventCategory::DirectMessage
        }
        _ => EventCategory::Ignored,
    }
}

fn is_redelivery(retry_num: Option<&str>) -> bool {
    retry_num
        .and_then(|v| v.trim().parse::<i64>().ok())
        .is_some_and(|n| n > 0)
}
