// SPDX-License-Identifier: MIT

//! Application error types shared across the client.

/// Application error type.
///
/// Every fallible path in the crate funnels into this enum so callers can
/// decide how loudly to surface a failure (blocking notice, silent rollback,
/// log-only) without inspecting strings.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Remote gateway failure: transport error, non-2xx status, or a
    /// `success:false` envelope. Carries the human-readable message.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Login rejected (unknown volunteer name or wrong leader password).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Client-side validation failure, caught before any optimistic
    /// mutation or network call.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Business-rule refusal (self-removal, cell/group capacity,
    /// per-day instance cap).
    #[error("Refused: {0}")]
    Refused(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures raised before any gateway call: no optimistic
    /// state change happened and there is nothing to roll back.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::Refused(_) | AppError::Unauthorized(_)
        )
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
