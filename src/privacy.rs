//! Privacy redaction of message bodies

use serde::{Deserialize, Serialize};

use crate::models::Message;

/// Text written in place of a redacted message body
pub const DEFAULT_PLACEHOLDER: &str = "[redacted]";

/// Whether message text is replaced before writing, and with what
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionPolicy {
    /// Replace every message's text
    pub enabled: bool,
    /// Replacement text
    pub placeholder: String,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl RedactionPolicy {
    /// Policy that leaves text untouched
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Apply the policy to every message of a run
    pub fn apply(&self, messages: &mut [Message]) {
        if !self.enabled {
            return;
        }
        for message in messages {
            message.text.clone_from(&self.placeholder);
        }
    }
}
