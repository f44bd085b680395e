//! # Notifier
//!
//! The one place where command results become user-facing notices.
//! Every response line carries exactly one notice; commands never
//! build notices themselves, they return a [`Reply`] or an [`ApiError`].

use atelie_core::{Confirmation, Outcome};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{ApiError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Successful command output.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub data: Value,
    pub message: String,
    /// Set when the front-end must show the message as a warning
    /// (pending confirmation, negative stock).
    pub attention: bool,
}

impl Reply {
    pub fn done(data: impl Serialize, message: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Reply {
            data: to_value(data)?,
            message: message.into(),
            attention: false,
        })
    }

    pub fn attention(data: impl Serialize, message: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Reply {
            data: to_value(data)?,
            message: message.into(),
            attention: true,
        })
    }

    /// Wraps an engine outcome: `Ok` is a success, anything waiting on
    /// the user is a warning carrying the confirmation text.
    pub fn from_outcome<T: Serialize>(
        outcome: Outcome<T>,
        done: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let pending = match &outcome {
            Outcome::Ok { .. } => None,
            Outcome::NeedsConfirmation { confirmation } => Some(confirmation_message(confirmation)),
            Outcome::Blocked { reasons } => Some(reasons.join("; ")),
        };
        match pending {
            None => Reply::done(outcome, done),
            Some(message) => Reply::attention(outcome, message),
        }
    }
}

fn confirmation_message(confirmation: &Confirmation) -> String {
    if confirmation.mandatory() {
        warn!(confirmation = ?confirmation, "Hard confirmation required");
    }
    confirmation.message()
}

fn to_value(data: impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(data).map_err(|e| ApiError::internal(format!("Response encoding failed: {}", e)))
}

/// Turns a command result into the notice shown to the user, and logs it.
pub struct Notifier;

impl Notifier {
    pub fn notice(cmd: &str, result: &Result<Reply, ApiError>) -> Notice {
        match result {
            Ok(reply) if reply.attention => {
                warn!(cmd = %cmd, message = %reply.message, "Command needs attention");
                Notice {
                    level: NoticeLevel::Warning,
                    message: reply.message.clone(),
                }
            }
            Ok(reply) => {
                info!(cmd = %cmd, message = %reply.message, "Command succeeded");
                Notice {
                    level: NoticeLevel::Success,
                    message: reply.message.clone(),
                }
            }
            Err(err) => {
                match err.code {
                    ErrorCode::ValidationError
                    | ErrorCode::NotFound
                    | ErrorCode::Duplicate
                    | ErrorCode::InvalidRequest
                    | ErrorCode::BusinessLogic => {
                        warn!(cmd = %cmd, code = ?err.code, message = %err.message, "Command rejected")
                    }
                    _ => error!(cmd = %cmd, code = ?err.code, message = %err.message, "Command failed"),
                }
                Notice {
                    level: NoticeLevel::Error,
                    message: err.message.clone(),
                }
            }
        }
    }

    /// Notice written before exiting when the host cannot start.
    pub fn fatal(message: impl Into<String>) -> Notice {
        let message = message.into();
        error!(message = %message, "Startup failed");
        Notice {
            level: NoticeLevel::Error,
            message,
        }
    }
}
