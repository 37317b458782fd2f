//! User-facing outcome messages.

use crate::KbError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    /// Degraded but committed, e.g. saved locally while the mirror was down
    Info,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// A short message for the user about the outcome of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Notice for an operation that failed before anything was committed.
    pub fn from_error(error: &KbError) -> Self {
        match error {
            KbError::Validation(_) => Self::error("Please fill in all required fields"),
            KbError::OutOfBounds { .. } | KbError::NotFound(_) | KbError::InvalidId(_) => {
                Self::error("That solution no longer exists. Refresh and try again.")
            }
            KbError::InvalidRemoteData(_) => {
                Self::error("The backend returned data that could not be read.")
            }
            _ => Self::error("An error occurred. Please try again."),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}
