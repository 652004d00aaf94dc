//! The tagged result every ledger operation resolves to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure taxonomy shared by every operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No caller identity.
    AuthRequired,
    /// Identity known, capability insufficient.
    Forbidden,
    NotFound,
    /// Token unknown, expired or revoked.
    InvalidToken,
    /// Conditional consumption found nothing to consume.
    AlreadyRedeemed,
    PromotionInactive,
    Conflict,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::AuthRequired => "auth_required",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::InvalidToken => "invalid_token",
            ErrorCode::AlreadyRedeemed => "already_redeemed",
            ErrorCode::PromotionInactive => "promotion_inactive",
            ErrorCode::Conflict => "conflict",
            ErrorCode::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that map onto the shared taxonomy.
pub trait Coded {
    fn code(&self) -> ErrorCode;
}

/// `{success, data?, error?}` envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reply<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    /// Human-readable detail accompanying `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<T> Reply<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            detail: None,
        }
    }

    pub fn err(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(code),
            detail: Some(detail.into()),
        }
    }
}

impl<T, E> From<Result<T, E>> for Reply<T>
where
    E: Coded + fmt::Display,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Reply::ok(data),
            Err(e) => Reply::err(e.code(), e.to_string()),
        }
    }
}
