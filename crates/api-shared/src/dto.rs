//! Request and response bodies exchanged with the flat-file service.
//!
//! Field names match the JSON the service has always returned, so older browser clients keep
//! working against it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Response to a successful replace or append
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SaveRes {
    pub success: bool,
    pub message: String,
    /// Number of solutions stored after the write
    pub count: usize,
}

impl SaveRes {
    pub fn ok(message: impl Into<String>, count: usize) -> Self {
        Self {
            success: true,
            message: message.into(),
            count,
        }
    }
}

/// Error body returned with any non-2xx status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
