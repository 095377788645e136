//! # Check Report
//!
//! What `sale-check` prints to stdout.
//!
//! ## Output
//! ```json
//! { "ok": false, "code": "OVERLAP", "message": "Phase 2: overlaps phase 1", "index": 2 }
//! ```
//!
//! `index` is the 1-based row the front end should highlight; it is absent
//! when the error is about the whole input (e.g. a percentage total).

use ico_core::{CoreError, DistributionError, ScheduleError, ValidationError};
use serde::Serialize;

/// Code used when the input passed every check.
pub const ACCEPTED: &str = "ACCEPTED";

/// Result of one check, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub ok: bool,

    /// Machine-readable outcome, stable across releases.
    pub code: String,

    /// Human-readable message.
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl CheckReport {
    pub fn accepted(message: impl Into<String>) -> Self {
        CheckReport {
            ok: true,
            code: ACCEPTED.to_string(),
            message: message.into(),
            index: None,
        }
    }

    pub fn rejected(code: &str, message: impl Into<String>, index: Option<usize>) -> Self {
        CheckReport {
            ok: false,
            code: code.to_string(),
            message: message.into(),
            index,
        }
    }

    /// Process exit code: 0 accepted, 1 rejected.
    pub fn exit_code(&self) -> u8 {
        if self.ok {
            0
        } else {
            1
        }
    }
}

impl From<ScheduleError> for CheckReport {
    fn from(err: ScheduleError) -> Self {
        CheckReport::rejected(err.kind(), err.to_string(), Some(err.window()))
    }
}

impl From<DistributionError> for CheckReport {
    fn from(err: DistributionError) -> Self {
        CheckReport::rejected(err.kind(), err.to_string(), err.entry())
    }
}

impl From<ValidationError> for CheckReport {
    fn from(err: ValidationError) -> Self {
        CheckReport::rejected("VALIDATION_ERROR", err.to_string(), None)
    }
}

impl From<CoreError> for CheckReport {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Schedule(e) => e.into(),
            CoreError::Distribution(e) => e.into(),
            CoreError::Validation(e) => e.into(),
            other => CheckReport::rejected(other.code(), other.to_string(), None),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_report() {
        let report: CheckReport = ScheduleError::Overlap {
            first: 1,
            second: 2,
        }
        .into();

        assert!(!report.ok);
        assert_eq!(report.exit_code(), 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["code"], "OVERLAP");
        assert_eq!(json["message"], "Phase 2: overlaps phase 1");
        assert_eq!(json["index"], 2);
    }

    #[test]
    fn test_sum_mismatch_has_no_index() {
        let report: CheckReport = DistributionError::PercentSumMismatch { total: 99.0 }.into();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["code"], "PERCENT_SUM_MISMATCH");
        assert!(json.get("index").is_none());
    }

    #[test]
    fn test_core_error_unwraps_to_inner_code() {
        let report: CheckReport = CoreError::from(ScheduleError::Gap { window: 3 }).into();
        assert_eq!(report.code, "GAP");
        assert_eq!(report.index, Some(3));

        let report: CheckReport = CoreError::WalletNotLinked.into();
        assert_eq!(report.code, "WALLET_NOT_LINKED");
    }

    #[test]
    fn test_accepted() {
        let report = CheckReport::accepted("2 phases");
        assert!(report.ok);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.code, ACCEPTED);
    }
}
