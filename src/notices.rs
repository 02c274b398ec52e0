// Fixed user-facing texts posted back to Slack (zh-TW, matching the workspace locale)
use crate::error::FailureKind;

pub const HEALTH_TEXT: &str = "Your Slack Bot is running!";

pub const THROTTLED: &str = "很抱歉，由於請求量過大，我暫時無法處理新的請求。請稍後再試。";

pub const FAILURE_PREAMBLE: &str = "很抱歉，我目前暫時無法處理您的請求。";

pub const UPSTREAM_RATE_LIMITED: &str = "Google API 配額已達上限，請稍後再試。";
pub const UNSUPPORTED_CONTENT: &str = "您的問題可能包含不支援的內容。請嘗試更改您的問題。";
pub const UNEXPECTED_ERROR: &str = "發生未預期的錯誤，請稍後再試。";

pub fn failure_variant(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::RateLimitedUpstream => UPSTREAM_RATE_LIMITED,
        FailureKind::InvalidInput => UNSUPPORTED_CONTENT,
        FailureKind::Unknown => UNEXPECTED_ERROR,
    }
}

/// Preamble followed by the variant for `kind`.
pub fn failure_notice(kind: FailureKind) -> String {
    format!("{FAILURE_PREAMBLE} {}", failure_variant(kind))
}

/// Prefix `text` with a mention of `user`.
pub fn mention(user: &str, text: &str) -> String {
    format!("<@{user}> {text}")
}
