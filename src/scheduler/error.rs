//! Error types for the scheduler module

use std::fmt;

use crate::models::YearMonth;
use crate::store::StoreError;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Availability writes only accept an explicit answer
    InvalidStatus { status: String },

    /// Date string that is not `YYYY-MM-DD`
    InvalidDate { input: String },

    /// Month string that is not `YYYY-MM`
    InvalidMonth { input: String },

    /// Position name outside the fixed enumeration
    InvalidPosition { input: String },

    /// `month_view` or `switch_month` before any month was opened
    NoMonthOpen,

    /// A newer month was opened while this fetch was in flight
    Superseded { requested: YearMonth, current: YearMonth },

    /// Store read or write failed
    Store { operation: String, source: StoreError },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStatus { status } => {
                write!(
                    f,
                    "Invalid availability status '{}'. Expected available or unavailable",
                    status
                )
            }
            Self::InvalidDate { input } => {
                write!(f, "Invalid date '{}'. Expected YYYY-MM-DD", input)
            }
            Self::InvalidMonth { input } => {
                write!(f, "Invalid month '{}'. Expected YYYY-MM", input)
            }
            Self::InvalidPosition { input } => {
                write!(f, "Unknown position '{}'", input)
            }
            Self::NoMonthOpen => write!(f, "No month is open"),
            Self::Superseded { requested, current } => {
                write!(
                    f,
                    "Fetch for {} discarded; {} was opened meanwhile",
                    requested, current
                )
            }
            Self::Store { operation, source } => {
                write!(f, "Store error during '{}': {}", operation, source)
            }
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for SchedulerError {
    fn from(err: StoreError) -> Self {
        Self::Store {
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

impl SchedulerError {
    pub fn invalid_status(status: impl Into<String>) -> Self {
        Self::InvalidStatus {
            status: status.into(),
        }
    }

    pub fn invalid_date(input: impl Into<String>) -> Self {
        Self::InvalidDate {
            input: input.into(),
        }
    }

    pub fn invalid_month(input: impl Into<String>) -> Self {
        Self::InvalidMonth {
            input: input.into(),
        }
    }

    pub fn invalid_position(input: impl Into<String>) -> Self {
        Self::InvalidPosition {
            input: input.into(),
        }
    }

    /// Wrap a store error with the operation that triggered it
    pub fn store(operation: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            operation: operation.into(),
            source,
        }
    }

    /// Caller-supplied input was rejected
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidStatus { .. }
                | Self::InvalidDate { .. }
                | Self::InvalidMonth { .. }
                | Self::InvalidPosition { .. }
        )
    }

    /// Get Korean description for the error
    pub fn korean_desc(&self) -> String {
        match self {
            Self::InvalidStatus { status } => {
                format!("잘못된 참석 상태: '{}' (가능/불가만 허용)", status)
            }
            Self::InvalidDate { input } => format!("잘못된 날짜: '{}'", input),
            Self::InvalidMonth { input } => format!("잘못된 월: '{}'", input),
            Self::InvalidPosition { input } => format!("알 수 없는 포지션: '{}'", input),
            Self::NoMonthOpen => "선택된 월이 없습니다".to_string(),
            Self::Superseded { requested, .. } => {
                format!("{} 조회 결과가 무시되었습니다", requested.korean_label())
            }
            Self::Store { source, .. } => source.korean_desc(),
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Superseded { .. } => true,
            Self::Store { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}
