//! Unified error handling for the hiel crate
//!
//! Domain modules keep their own error types ([`StoreError`],
//! [`SchedulerError`], [`SessionError`]); this module wraps them in a single
//! [`Error`] for code that crosses module boundaries.
//!
//! # Architecture
//!
//! - [`HielErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use hiel::error::{Error, HielErrorTrait};
//!
//! fn report(err: Error) {
//!     if err.is_recoverable() {
//!         println!("다시 시도해 주세요: {}", err.korean_desc());
//!     } else {
//!         eprintln!("{} ({})", err, err.category().korean_desc());
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::scheduler::error::SchedulerError;
pub use crate::session::SessionError;
pub use crate::store::StoreError;

/// Common trait for hiel error types
pub trait HielErrorTrait: std::error::Error {
    /// Whether a manual retry may succeed
    fn is_recoverable(&self) -> bool;

    /// Korean description for user-facing messages
    fn korean_desc(&self) -> String;

    /// Error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Document store and file I/O
    Storage,
    /// Rejected input or undecodable records
    Validation,
    /// Scheduler state (no month open, superseded fetch)
    Scheduler,
    /// Permission checks on the current session
    Session,
    /// Configuration loading and validation
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn korean_desc(&self) -> &'static str {
        match self {
            Self::Storage => "저장소 오류",
            Self::Validation => "입력 오류",
            Self::Scheduler => "일정 오류",
            Self::Session => "세션 오류",
            Self::Config => "설정 오류",
            Self::Other => "기타 오류",
        }
    }
}

/// Unified error type for the hiel crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Input rejected before reaching the store
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl HielErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_recoverable(),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Session(SessionError::Io(_)) => true,
            Self::Session(_) => false,
            Self::Validation(_) => false,
            Self::Io(_) => true,
            Self::Json(_) | Self::Toml(_) | Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn korean_desc(&self) -> String {
        match self {
            Self::Store(e) => e.korean_desc(),
            Self::Scheduler(e) => e.korean_desc(),
            Self::Session(e) => e.korean_desc(),
            Self::Validation(msg) => format!("입력 오류: {msg}"),
            Self::Io(e) => format!("입출력 오류: {e}"),
            Self::Json(e) => format!("JSON 오류: {e}"),
            Self::Toml(e) => format!("설정 파일 오류: {e}"),
            Self::Config(msg) => format!("설정 오류: {msg}"),
            Self::Other { context, .. } => context.clone(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(e) => store_category(e),
            Self::Scheduler(e) => match e {
                SchedulerError::Store { source, .. } => store_category(source),
                e if e.is_invalid_input() => ErrorCategory::Validation,
                _ => ErrorCategory::Scheduler,
            },
            Self::Session(SessionError::PermissionDenied { .. }) => ErrorCategory::Session,
            Self::Session(_) => ErrorCategory::Storage,
            Self::Validation(_) | Self::Json(_) => ErrorCategory::Validation,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Toml(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

/// Rejected records are bad input even when the store reported them
fn store_category(err: &StoreError) -> ErrorCategory {
    match err {
        StoreError::Validation { .. } | StoreError::Decode { .. } | StoreError::InvalidField(_) => {
            ErrorCategory::Validation
        }
        _ => ErrorCategory::Storage,
    }
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True when a record lookup found nothing
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::NotFound { .. })
                | Self::Scheduler(SchedulerError::Store {
                    source: StoreError::NotFound { .. },
                    ..
                })
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
