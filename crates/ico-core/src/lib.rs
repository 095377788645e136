//! # ico-core: Pure Business Logic for the ICO Launchpad
//!
//! This crate is the **heart** of the launchpad. It holds every rule the
//! sale-management screens enforce, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ICO Launchpad Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Front End                                │   │
//! │  │   Listings ──► Detail/Purchase ──► Create Sale ──► Phases      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ drafts (JSON / wasm)                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ico-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐ │   │
//! │  │   │ schedule  │  │distribution│  │   draft   │  │ purchase  │ │   │
//! │  │   │  windows  │  │  vesting   │  │ createICO │  │  quotes   │ │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ payloads                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   External collaborators: auth, database, image storage,        │   │
//! │  │   wallet signing, sale contract                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`schedule`] - Sale window (phase) validation
//! - [`distribution`] - Vesting / allocation distribution validation
//! - [`draft`] - Two-step sale creation draft and `createICO` payload
//! - [`listing`] - Listing status, ordering and filtering
//! - [`purchase`] - Purchase quotes and the approve/purchase call plan
//! - [`units`] - 18-decimal fixed-point token amounts
//! - [`time`] - Form date parsing in the configured offset (JST by default)
//! - [`validation`] - Field validators for form input
//! - [`config`] - Tunable validation rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Same input = same output, no hidden state
//! 2. **No I/O**: Database, network, files, environment and wallet access
//!    are FORBIDDEN here; binaries hand in text and key lookups
//! 3. **Integer Amounts**: Prices, caps and supplies are 18-decimal base units
//! 4. **Explicit Errors**: All errors are typed values with 1-based indexes
//!
//! ## Example Usage
//!
//! ```rust
//! use ico_core::schedule::{validate_schedule, WindowDraft};
//! use ico_core::time::parse_instant_jst;
//!
//! let sale_start = parse_instant_jst("2024-01-01T00:00").unwrap();
//! let sale_end = parse_instant_jst("2024-02-01T00:00").unwrap();
//!
//! let windows = vec![
//!     WindowDraft::new("2024-01-01T00:00", "2024-01-15T00:00", "1", "1000"),
//!     WindowDraft::new("2024-01-15T00:00", "2024-02-01T00:00", "2", "2000"),
//! ];
//!
//! let schedule = validate_schedule(&windows, sale_start, sale_end).unwrap();
//! assert_eq!(schedule.len(), 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod distribution;
pub mod draft;
pub mod error;
pub mod listing;
pub mod purchase;
pub mod schedule;
pub mod time;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{ConfigError, ContiguityOrder, SaleRules};
pub use error::{
    AmountError, CoreError, CoreResult, DistributionError, ScheduleError, ValidationError,
};
pub use types::*;
pub use units::TokenAmount;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Decimal places of every token and stablecoin amount handled here.
///
/// Matches the sale contract, which takes all amounts as 18-decimal integers.
pub const TOKEN_DECIMALS: u32 = 18;

/// The total an allocation distribution must reach.
pub const PERCENT_TOTAL: f64 = 100.0;

/// Default absolute tolerance when comparing a percentage sum against 100.
pub const DEFAULT_PERCENT_EPSILON: f64 = 0.01;

/// Default offset for naive form dates: JST (UTC+09:00).
///
/// Sale administrators enter every date in Japan Standard Time.
pub const DEFAULT_INPUT_OFFSET_SECS: i32 = 9 * 60 * 60;

/// Object storage bucket that holds sale images.
pub const IMAGE_BUCKET: &str = "ico-images";

/// Maximum sale name length, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// Token symbol length bounds, in characters.
pub const MIN_SYMBOL_LENGTH: usize = 2;
pub const MAX_SYMBOL_LENGTH: usize = 11;

/// Maximum description length (markdown source), in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;
