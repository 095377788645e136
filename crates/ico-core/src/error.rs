//! # Error Types
//!
//! Domain-specific error types for ico-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ico-core errors (this file)                                           │
//! │  ├── ScheduleError      - Sale window (phase) violations               │
//! │  ├── DistributionError  - Vesting distribution violations              │
//! │  ├── AmountError        - Decimal amount parsing / math failures       │
//! │  ├── ValidationError    - Form field failures                          │
//! │  └── CoreError          - Everything above + purchase/listing rules    │
//! │                                                                         │
//! │  config errors (config.rs)                                             │
//! │  └── ConfigError        - Bad rules file or override (→ CoreError)     │
//! │                                                                         │
//! │  Flow: ScheduleError → CoreError → Report → Front end                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Carry the 1-based row index the user sees on screen
//! 3. Errors are enum variants, never String
//! 4. Each variant has a stable machine code for the front end
//!
//! None of these errors are retryable: every one means the user has to
//! edit the input.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

// =============================================================================
// Schedule Error
// =============================================================================

/// A sale schedule violation.
///
/// Every `window` is the 1-based position of the offending row in the
/// submitted list.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScheduleError {
    /// A start, end, price or cap value is missing.
    #[error("Phase {window}: all fields are required")]
    IncompleteWindow { window: usize },

    /// The start or end could not be parsed as an instant.
    #[error("Phase {window}: contains an invalid date")]
    InvalidDate { window: usize },

    /// `start >= end`.
    #[error("Phase {window}: end must be after start")]
    InvertedInterval { window: usize },

    /// The window is not inside the sale period.
    #[error("Phase {window}: must fall within the sale period")]
    OutOfBounds { window: usize },

    /// Price is zero, negative or not a number.
    #[error("Phase {window}: price must be greater than 0")]
    NonPositivePrice { window: usize },

    /// Allocation cap is zero, negative or not a number.
    #[error("Phase {window}: max allocation must be greater than 0")]
    NonPositiveCap { window: usize },

    /// Two windows share part of their time range.
    ///
    /// ## User Workflow
    /// ```text
    /// Phase 1: 01-01 ──────── 01-15
    /// Phase 2:          01-10 ──────── 02-01
    ///                     ▲
    ///                     └── Overlap { first: 1, second: 2 }
    /// ```
    #[error("Phase {second}: overlaps phase {first}")]
    Overlap { first: usize, second: usize },

    /// The window does not start where the previous one ended.
    #[error("Phase {window}: start must equal the previous phase's end")]
    Gap { window: usize },
}

impl ScheduleError {
    /// Stable machine-readable code.
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::IncompleteWindow { .. } => "INCOMPLETE_WINDOW",
            ScheduleError::InvalidDate { .. } => "INVALID_DATE",
            ScheduleError::InvertedInterval { .. } => "INVERTED_INTERVAL",
            ScheduleError::OutOfBounds { .. } => "OUT_OF_BOUNDS",
            ScheduleError::NonPositivePrice { .. } => "NON_POSITIVE_PRICE",
            ScheduleError::NonPositiveCap { .. } => "NON_POSITIVE_CAP",
            ScheduleError::Overlap { .. } => "OVERLAP",
            ScheduleError::Gap { .. } => "GAP",
        }
    }

    /// The row the UI should highlight (the later row for an overlap).
    pub fn window(&self) -> usize {
        match *self {
            ScheduleError::IncompleteWindow { window }
            | ScheduleError::InvalidDate { window }
            | ScheduleError::InvertedInterval { window }
            | ScheduleError::OutOfBounds { window }
            | ScheduleError::NonPositivePrice { window }
            | ScheduleError::NonPositiveCap { window }
            | ScheduleError::Gap { window } => window,
            ScheduleError::Overlap { second, .. } => second,
        }
    }
}

// =============================================================================
// Distribution Error
// =============================================================================

/// Which field of an allocation row is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DistributionField {
    ReleaseAt,
    Percent,
}

impl std::fmt::Display for DistributionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionField::ReleaseAt => write!(f, "release date"),
            DistributionField::Percent => write!(f, "percent"),
        }
    }
}

/// An allocation distribution violation.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DistributionError {
    #[error("Release {entry}: {field} is required")]
    MissingField {
        entry: usize,
        field: DistributionField,
    },

    /// Releases must happen strictly after the sale closes.
    #[error("Release {entry}: must be after the sale end")]
    ReleaseBeforeSaleEnd { entry: usize },

    #[error("Release {entry}: percent must be greater than 0")]
    NonPositivePercent { entry: usize },

    /// Edit-time only: the running total passed 100.
    #[error("Release {entry}: total {total}% exceeds 100%")]
    PercentOverflow { entry: usize, total: f64 },

    /// Submission-time: the total is not 100 within tolerance.
    #[error("Release percentages total {total}%, expected 100%")]
    PercentSumMismatch { total: f64 },
}

impl DistributionError {
    /// Stable machine-readable code.
    pub fn kind(&self) -> &'static str {
        match self {
            DistributionError::MissingField { .. } => "MISSING_FIELD",
            DistributionError::ReleaseBeforeSaleEnd { .. } => "RELEASE_BEFORE_SALE_END",
            DistributionError::NonPositivePercent { .. } => "NON_POSITIVE_PERCENT",
            DistributionError::PercentOverflow { .. } => "PERCENT_OVERFLOW",
            DistributionError::PercentSumMismatch { .. } => "PERCENT_SUM_MISMATCH",
        }
    }

    /// The 1-based row at fault, if the error concerns a single row.
    pub fn entry(&self) -> Option<usize> {
        match *self {
            DistributionError::MissingField { entry, .. }
            | DistributionError::ReleaseBeforeSaleEnd { entry }
            | DistributionError::NonPositivePercent { entry }
            | DistributionError::PercentOverflow { entry, .. } => Some(entry),
            DistributionError::PercentSumMismatch { .. } => None,
        }
    }
}

// =============================================================================
// Amount Error
// =============================================================================

/// Decimal amount parsing and arithmetic failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount must not be negative")]
    Negative,

    #[error("amount must contain only digits and one decimal point")]
    InvalidDigit,

    #[error("amount has more than {max} decimal places")]
    TooManyDecimals { max: u32 },

    #[error("amount is too large")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for individual form fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A period whose end does not come after its start.
    #[error("{field} must end after it starts")]
    InvertedPeriod { field: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_format(field: &str, reason: &str) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They should be caught
/// and translated to user-facing messages by the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Distribution(#[from] DistributionError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Purchase attempted outside the sale's live period.
    ///
    /// ## When This Occurs
    /// - The sale has not started yet or has ended
    /// - An administrator paused the sale
    #[error("Sale {name} is {status}, purchases are closed")]
    SaleNotLive { name: String, status: String },

    /// Payment amount is unusable.
    #[error("Invalid purchase amount: {reason}")]
    InvalidPurchaseAmount { reason: String },

    /// Requested tokens exceed what is left in the current allocation.
    #[error("Requested {requested} tokens, only {remaining} remaining")]
    ExceedsAllocation { requested: String, remaining: String },

    /// The buyer has no wallet address on their profile.
    #[error("No wallet linked to this account")]
    WalletNotLinked,

    /// Instant cannot be expressed as unix seconds for a contract call.
    #[error("{field} is before the unix epoch")]
    TimestampOutOfRange { field: String },
}

impl CoreError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Schedule(e) => e.kind(),
            CoreError::Distribution(e) => e.kind(),
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::Amount(_) => "INVALID_AMOUNT",
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::SaleNotLive { .. } => "SALE_NOT_LIVE",
            CoreError::InvalidPurchaseAmount { .. } => "INVALID_PURCHASE_AMOUNT",
            CoreError::ExceedsAllocation { .. } => "EXCEEDS_ALLOCATION",
            CoreError::WalletNotLinked => "WALLET_NOT_LINKED",
            CoreError::TimestampOutOfRange { .. } => "TIMESTAMP_OUT_OF_RANGE",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result of schedule validation.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Result of distribution validation.
pub type DistributionResult<T> = Result<T, DistributionError>;

// =============================================================================
// Unit Tests
// =============================================================================
