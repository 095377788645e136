//! # Distribution Module
//!
//! Vesting (allocation distribution) rules: how much of a buyer's tokens
//! unlock at each release date after the sale closes.
//!
//! ## Two Passes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EDIT TIME   validate_distribution_edit()                               │
//! │    rows still missing a field are skipped                              │
//! │    running total > 100 + ε  → PercentOverflow                          │
//! │    total may still be below 100                                        │
//! │                                                                         │
//! │  SUBMIT      validate_distribution()                                    │
//! │    every row must be filled → MissingField                             │
//! │    |total - 100| > ε        → PercentSumMismatch                       │
//! │    (above OR below 100)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Percentages are fractional (`33.33`), so they are `f64` and totals are
//! compared with an absolute tolerance ([`SaleRules::percent_epsilon`]).

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::config::SaleRules;
use crate::error::{
    AmountError, DistributionError, DistributionField, DistributionResult, ValidationError,
};
use crate::time::parse_instant;
use crate::units::TokenAmount;
use crate::PERCENT_TOTAL;

// =============================================================================
// Draft and Entry
// =============================================================================

/// A release row as typed into the vesting editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct AllocationDraft {
    pub release_at: String,
    pub percent: String,
}

impl AllocationDraft {
    pub fn new(release_at: impl Into<String>, percent: impl Into<String>) -> Self {
        AllocationDraft {
            release_at: release_at.into(),
            percent: percent.into(),
        }
    }

    /// Converts the raw row into an [`AllocationEntry`].
    ///
    /// Blank fields become `None`; text that is present but unreadable is
    /// an `InvalidFormat` error.
    pub fn to_entry(&self, offset: FixedOffset) -> Result<AllocationEntry, ValidationError> {
        let release_at = match self.release_at.trim() {
            "" => None,
            raw => Some(
                parse_instant(raw, offset)
                    .ok_or_else(|| ValidationError::invalid_format("releaseAt", "not a date"))?,
            ),
        };

        let percent = match self.percent.trim() {
            "" => None,
            raw => Some(
                raw.parse::<f64>()
                    .map_err(|_| ValidationError::invalid_format("percent", "not a number"))?,
            ),
        };

        Ok(AllocationEntry {
            release_at,
            percent,
        })
    }
}

/// A release row with parsed but not yet validated values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AllocationEntry {
    pub release_at: Option<DateTime<Utc>>,
    pub percent: Option<f64>,
}

impl AllocationEntry {
    pub fn new(release_at: DateTime<Utc>, percent: f64) -> Self {
        AllocationEntry {
            release_at: Some(release_at),
            percent: Some(percent),
        }
    }
}

// =============================================================================
// Validated Distribution
// =============================================================================

/// One validated release: strictly after the sale end, positive percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingRelease {
    release_at: DateTime<Utc>,
    percent: f64,
}

impl VestingRelease {
    pub fn release_at(&self) -> DateTime<Utc> {
        self.release_at
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }
}

/// A validated distribution whose releases total 100%.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationDistribution {
    releases: Vec<VestingRelease>,
}

impl AllocationDistribution {
    pub fn releases(&self) -> &[VestingRelease] {
        &self.releases
    }

    /// Percentage unlocked at `at`, clamped to 100.
    ///
    /// ## Example
    /// ```rust
    /// use ico_core::distribution::{validate_distribution, AllocationEntry};
    /// use ico_core::time::parse_instant_jst;
    ///
    /// let sale_end = parse_instant_jst("2024-02-01T00:00").unwrap();
    /// let march = parse_instant_jst("2024-03-01T00:00").unwrap();
    /// let april = parse_instant_jst("2024-04-01T00:00").unwrap();
    /// let vesting = validate_distribution(
    ///     &[AllocationEntry::new(march, 40.0), AllocationEntry::new(april, 60.0)],
    ///     sale_end,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(vesting.unlocked_percent_at(sale_end), 0.0);
    /// assert_eq!(vesting.unlocked_percent_at(march), 40.0);
    /// assert_eq!(vesting.unlocked_percent_at(april), 100.0);
    /// ```
    pub fn unlocked_percent_at(&self, at: DateTime<Utc>) -> f64 {
        let unlocked: f64 = self
            .releases
            .iter()
            .filter(|r| r.release_at <= at)
            .map(|r| r.percent)
            .sum();
        unlocked.min(PERCENT_TOTAL)
    }

    /// Tokens out of `total` a buyer may claim at `at`.
    ///
    /// Once every release has passed this is exactly `total`, so tolerance
    /// in the percentages never strands dust.
    pub fn releasable_amount(
        &self,
        total: TokenAmount,
        at: DateTime<Utc>,
    ) -> Result<TokenAmount, AmountError> {
        if self.releases.iter().all(|r| r.release_at <= at) {
            return Ok(total);
        }
        let bps = (self.unlocked_percent_at(at) * 100.0).round() as u32;
        total.portion_bps(bps)
    }

    /// The first release strictly after `at`.
    pub fn next_release(&self, at: DateTime<Utc>) -> Option<&VestingRelease> {
        self.releases
            .iter()
            .filter(|r| r.release_at > at)
            .min_by_key(|r| r.release_at)
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Submission-time check with the default rules.
///
/// ## Rules
/// Row by row (1-based):
/// 1. release date and percent present → `MissingField`
/// 2. release strictly after `sale_end` → `ReleaseBeforeSaleEnd`
/// 3. percent > 0 → `NonPositivePercent`
///
/// Then: total within ε of 100 → `PercentSumMismatch`.
pub fn validate_distribution(
    entries: &[AllocationEntry],
    sale_end: DateTime<Utc>,
) -> DistributionResult<AllocationDistribution> {
    validate_distribution_with(&SaleRules::default(), entries, sale_end)
}

/// [`validate_distribution`] with explicit rules.
pub fn validate_distribution_with(
    rules: &SaleRules,
    entries: &[AllocationEntry],
    sale_end: DateTime<Utc>,
) -> DistributionResult<AllocationDistribution> {
    let result = check_distribution(rules, entries, sale_end);
    match &result {
        Ok(d) => debug!(releases = d.releases.len(), "Distribution accepted"),
        Err(err) => debug!(code = err.kind(), %err, "Distribution rejected"),
    }
    result
}

fn check_distribution(
    rules: &SaleRules,
    entries: &[AllocationEntry],
    sale_end: DateTime<Utc>,
) -> DistributionResult<AllocationDistribution> {
    let mut releases = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let entry_no = index + 1;
        let release_at = entry.release_at.ok_or(DistributionError::MissingField {
            entry: entry_no,
            field: DistributionField::ReleaseAt,
        })?;
        let percent = entry.percent.ok_or(DistributionError::MissingField {
            entry: entry_no,
            field: DistributionField::Percent,
        })?;
        check_release(entry_no, release_at, percent, sale_end)?;
        releases.push(VestingRelease {
            release_at,
            percent,
        });
    }

    let total: f64 = releases.iter().map(|r| r.percent).sum();
    if (total - PERCENT_TOTAL).abs() > rules.percent_epsilon {
        return Err(DistributionError::PercentSumMismatch { total });
    }

    Ok(AllocationDistribution { releases })
}

/// Edit-time check with the default rules.
///
/// Returns the running total of the filled rows.
///
/// ## Example
/// ```rust
/// use ico_core::distribution::{validate_distribution_edit, AllocationEntry};
/// use ico_core::time::parse_instant_jst;
/// use ico_core::DistributionError;
///
/// let sale_end = parse_instant_jst("2024-02-01T00:00").unwrap();
/// let march = parse_instant_jst("2024-03-01T00:00").unwrap();
///
/// // Half-typed: the blank row is ignored and 60% alone is fine.
/// let rows = [AllocationEntry::new(march, 60.0), AllocationEntry::default()];
/// assert_eq!(validate_distribution_edit(&rows, sale_end), Ok(60.0));
///
/// let rows = [AllocationEntry::new(march, 60.0), AllocationEntry::new(march, 50.0)];
/// assert!(matches!(
///     validate_distribution_edit(&rows, sale_end),
///     Err(DistributionError::PercentOverflow { entry: 2, .. })
/// ));
/// ```
pub fn validate_distribution_edit(
    entries: &[AllocationEntry],
    sale_end: DateTime<Utc>,
) -> DistributionResult<f64> {
    validate_distribution_edit_with(&SaleRules::default(), entries, sale_end)
}

/// [`validate_distribution_edit`] with explicit rules.
pub fn validate_distribution_edit_with(
    rules: &SaleRules,
    entries: &[AllocationEntry],
    sale_end: DateTime<Utc>,
) -> DistributionResult<f64> {
    let mut total = 0.0;

    for (index, entry) in entries.iter().enumerate() {
        let (Some(release_at), Some(percent)) = (entry.release_at, entry.percent) else {
            continue;
        };
        let entry_no = index + 1;
        check_release(entry_no, release_at, percent, sale_end)?;

        total += percent;
        if total > PERCENT_TOTAL + rules.percent_epsilon {
            debug!(entry = entry_no, total, "Distribution overflows 100%");
            return Err(DistributionError::PercentOverflow {
                entry: entry_no,
                total,
            });
        }
    }

    Ok(total)
}

fn check_release(
    entry: usize,
    release_at: DateTime<Utc>,
    percent: f64,
    sale_end: DateTime<Utc>,
) -> DistributionResult<()> {
    if release_at <= sale_end {
        return Err(DistributionError::ReleaseBeforeSaleEnd { entry });
    }
    if percent.is_nan() || percent <= 0.0 {
        return Err(DistributionError::NonPositivePercent { entry });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{jst, parse_instant_jst};

    fn at(input: &str) -> DateTime<Utc> {
        parse_instant_jst(input).unwrap()
    }

    fn sale_end() -> DateTime<Utc> {
        at("2024-02-01T00:00")
    }

    fn entries(percents: &[f64]) -> Vec<AllocationEntry> {
        percents
            .iter()
            .enumerate()
            .map(|(i, &p)| AllocationEntry::new(at(&format!("2024-03-{:02}T00:00", i + 1)), p))
            .collect()
    }

    #[test]
    fn test_full_distribution_passes() {
        let vesting = validate_distribution(&entries(&[25.0, 25.0, 50.0]), sale_end()).unwrap();
        assert_eq!(vesting.releases().len(), 3);

        let thirds = validate_distribution(&entries(&[33.33, 33.33, 33.34]), sale_end());
        assert!(thirds.is_ok());
    }

    #[test]
    fn test_sum_of_99_is_mismatch() {
        let err = validate_distribution(&entries(&[50.0, 49.0]), sale_end()).unwrap_err();
        assert_eq!(err, DistributionError::PercentSumMismatch { total: 99.0 });
    }

    #[test]
    fn test_date_only_releases_summing_to_99() {
        let sale_end = at("2024-02-01");
        let rows: Vec<AllocationEntry> = [("2024-02-02", "50"), ("2024-02-03", "49")]
            .iter()
            .map(|(date, pct)| AllocationDraft::new(*date, *pct).to_entry(jst()).unwrap())
            .collect();
        assert_eq!(
            validate_distribution(&rows, sale_end),
            Err(DistributionError::PercentSumMismatch { total: 99.0 })
        );
    }

    #[test]
    fn test_sums_off_by_two_hundredths_fail_both_ways() {
        for percents in [[50.0, 50.02], [50.0, 49.98]] {
            let err = validate_distribution(&entries(&percents), sale_end()).unwrap_err();
            assert_eq!(err.kind(), "PERCENT_SUM_MISMATCH", "{percents:?}");
        }
    }

    #[test]
    fn test_release_at_sale_end_is_rejected() {
        let rows = [AllocationEntry::new(sale_end(), 100.0)];
        assert_eq!(
            validate_distribution(&rows, sale_end()),
            Err(DistributionError::ReleaseBeforeSaleEnd { entry: 1 })
        );
    }

    #[test]
    fn test_missing_fields_and_non_positive_percent() {
        let mut rows = entries(&[50.0, 50.0]);
        rows[1].percent = None;
        assert_eq!(
            validate_distribution(&rows, sale_end()),
            Err(DistributionError::MissingField {
                entry: 2,
                field: DistributionField::Percent
            })
        );

        let rows = entries(&[100.0, 0.0]);
        assert_eq!(
            validate_distribution(&rows, sale_end()),
            Err(DistributionError::NonPositivePercent { entry: 2 })
        );

        let rows = entries(&[f64::NAN]);
        assert_eq!(
            validate_distribution(&rows, sale_end()).unwrap_err().kind(),
            "NON_POSITIVE_PERCENT"
        );
    }

    #[test]
    fn test_empty_distribution_is_mismatch() {
        assert_eq!(
            validate_distribution(&[], sale_end()),
            Err(DistributionError::PercentSumMismatch { total: 0.0 })
        );
    }

    #[test]
    fn test_edit_pass_reports_overflow_at_crossing_row() {
        let rows = entries(&[40.0, 40.0, 30.0, 10.0]);
        match validate_distribution_edit(&rows, sale_end()) {
            Err(DistributionError::PercentOverflow { entry, total }) => {
                assert_eq!(entry, 3);
                assert!((total - 110.0).abs() < 1e-9);
            }
            other => panic!("expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_pass_tolerates_epsilon_and_partial_rows() {
        assert!(validate_distribution_edit(&entries(&[50.0, 50.005]), sale_end()).is_ok());

        let mut rows = entries(&[30.0, 90.0]);
        rows[1].release_at = None;
        assert_eq!(validate_distribution_edit(&rows, sale_end()), Ok(30.0));
    }

    #[test]
    fn test_custom_epsilon() {
        let rules = SaleRules {
            percent_epsilon: 0.5,
            ..SaleRules::default()
        };
        assert!(validate_distribution_with(&rules, &entries(&[50.0, 49.6]), sale_end()).is_ok());
    }

    #[test]
    fn test_draft_conversion() {
        let draft = AllocationDraft::new("2024-03-01T00:00", " 12.5 ");
        let entry = draft.to_entry(jst()).unwrap();
        assert_eq!(entry.release_at, Some(at("2024-03-01T00:00")));
        assert_eq!(entry.percent, Some(12.5));

        let blank = AllocationDraft::default().to_entry(jst()).unwrap();
        assert_eq!(blank, AllocationEntry::default());

        assert!(matches!(
            AllocationDraft::new("soon", "10").to_entry(jst()),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            AllocationDraft::new("", "ten").to_entry(jst()),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_releasable_amount() {
        let vesting = validate_distribution(&entries(&[33.33, 33.33, 33.34]), sale_end()).unwrap();
        let total = TokenAmount::from_whole(1000);

        assert_eq!(vesting.releasable_amount(total, sale_end()).unwrap(), TokenAmount::zero());
        assert_eq!(
            vesting.releasable_amount(total, at("2024-03-01T12:00")).unwrap(),
            crate::units::parse_units("333.3").unwrap()
        );
        assert_eq!(vesting.releasable_amount(total, at("2024-04-01T00:00")).unwrap(), total);
    }

    #[test]
    fn test_next_release() {
        let vesting = validate_distribution(&entries(&[50.0, 50.0]), sale_end()).unwrap();
        let next = vesting.next_release(at("2024-03-01T00:00")).unwrap();
        assert_eq!(next.release_at(), at("2024-03-02T00:00"));
        assert!(vesting.next_release(at("2024-03-02T00:00")).is_none());
    }
}
