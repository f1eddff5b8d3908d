//! Structured logging utilities.
//!
//! Provides context-aware logging with subscription_id and the check guid
//! included in every log message.

use std::fmt;

/// Logging context for result processing.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub subscription_id: String,
    pub guid: Option<String>,
}

impl LogContext {
    pub fn new(subscription_id: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            guid: None,
        }
    }

    pub fn with_check(&self, guid: &str) -> Self {
        Self {
            subscription_id: self.subscription_id.clone(),
            guid: Some(guid.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.guid {
            Some(guid) => write!(f, "[sub={}] [check={}]", self.subscription_id, guid),
            None => write!(f, "[sub={}]", self.subscription_id),
        }
    }
}
