//! Named fixed waits.
//!
//! The host UI exposes no completion signal for its animations or for the
//! round-trip of an edit, so every UI action is followed by a fixed settle
//! interval. These are approximations, not guarantees.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlePolicy {
    /// After scrolling a message into view and hovering it.
    #[serde(with = "millis")]
    pub reveal: Duration,
    /// After opening the more-actions menu.
    #[serde(with = "millis")]
    pub menu: Duration,
    /// For the inline editor to mount after activating edit.
    #[serde(with = "millis")]
    pub editor_mount: Duration,
    /// Between replacing the text and committing it.
    #[serde(with = "millis")]
    pub input: Duration,
    /// For the edit commit round-trip.
    #[serde(with = "millis")]
    pub commit: Duration,
    /// For the delete confirmation dialog to open.
    #[serde(with = "millis")]
    pub delete_dialog: Duration,
    /// After confirming deletion.
    #[serde(with = "millis")]
    pub after_confirm: Duration,
    /// Rate limit between two messages, whatever the outcome.
    #[serde(with = "millis")]
    pub inter_message: Duration,
    /// For virtualization to mount content after a pagination scroll.
    #[serde(with = "millis")]
    pub pagination: Duration,
    /// For search results to render after submitting a query.
    #[serde(with = "millis")]
    pub search: Duration,
    /// For the view to settle on a message after activating a search result.
    #[serde(with = "millis")]
    pub jump: Duration,
    /// After navigating to a channel or server url.
    #[serde(with = "millis")]
    pub navigation: Duration,
    /// After login is detected, before the run starts.
    #[serde(with = "millis")]
    pub stabilize: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            reveal: Duration::from_millis(500),
            menu: Duration::from_millis(500),
            editor_mount: Duration::from_millis(500),
            input: Duration::from_millis(300),
            commit: Duration::from_millis(1000),
            delete_dialog: Duration::from_millis(500),
            after_confirm: Duration::from_millis(1000),
            inter_message: Duration::from_millis(1500),
            pagination: Duration::from_millis(2000),
            search: Duration::from_millis(1500),
            jump: Duration::from_millis(1500),
            navigation: Duration::from_millis(2000),
            stabilize: Duration::from_millis(3000),
        }
    }
}

impl SettlePolicy {
    /// Zero waits everywhere; for fixture pages that react synchronously.
    pub fn immediate() -> Self {
        Self {
            reveal: Duration::ZERO,
            menu: Duration::ZERO,
            editor_mount: Duration::ZERO,
            input: Duration::ZERO,
            commit: Duration::ZERO,
            delete_dialog: Duration::ZERO,
            after_confirm: Duration::ZERO,
            inter_message: Duration::ZERO,
            pagination: Duration::ZERO,
            search: Duration::ZERO,
            jump: Duration::ZERO,
            navigation: Duration::ZERO,
            stabilize: Duration::ZERO,
        }
    }
}

/// Suspend for `interval`; a zero interval returns without yielding to the timer.
pub async fn settle(interval: Duration) {
    if !interval.is_zero() {
        tokio::time::sleep(interval).await;
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
