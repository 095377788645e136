//! # Schedule Module
//!
//! Validation of sale windows (phases) before they are sent to the sale
//! contract's `setSalePhases`.
//!
//! ## Validation Passes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Phase Editor → Contract                               │
//! │                                                                         │
//! │  Keystroke in row i                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_window(i)          ← cheap, row-local                        │
//! │  ├── IncompleteWindow / InvalidDate / InvertedInterval                 │
//! │  └── OutOfBounds / NonPositivePrice / NonPositiveCap                   │
//! │                                                                         │
//! │  "Save" pressed                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_schedule()         ← exhaustive gate                         │
//! │  ├── every row-local check, row by row                                 │
//! │  ├── Overlap against every earlier row                                 │
//! │  └── Gap between neighbours (after all rows pass)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleSchedule ──► SalePhasesArgs ──► wallet signs setSalePhases        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Windows are half-open for overlap purposes: two windows conflict unless
//! `a.end <= b.start || a.start >= b.end`. The sale bounds are closed: a
//! window may start exactly at the sale start and end exactly at the sale
//! end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::config::{ContiguityOrder, SaleRules};
use crate::error::{CoreError, CoreResult, ScheduleError, ScheduleResult};
use crate::time::{parse_instant, to_input_string, unix_seconds};
use crate::units::{parse_units, TokenAmount};

// =============================================================================
// Window Draft
// =============================================================================

/// One row of the phase editor, exactly as typed.
///
/// Blank (or whitespace-only) fields count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct WindowDraft {
    pub start_date: String,
    pub end_date: String,
    pub price: String,
    pub max_allocation: String,
}

impl WindowDraft {
    pub fn new(
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        price: impl Into<String>,
        max_allocation: impl Into<String>,
    ) -> Self {
        WindowDraft {
            start_date: start_date.into(),
            end_date: end_date.into(),
            price: price.into(),
            max_allocation: max_allocation.into(),
        }
    }

    fn is_complete(&self) -> bool {
        [
            &self.start_date,
            &self.end_date,
            &self.price,
            &self.max_allocation,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// Editable field of a [`WindowDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum WindowField {
    StartDate,
    EndDate,
    Price,
    MaxAllocation,
}

// =============================================================================
// Schedule Draft
// =============================================================================

/// The phase editor's in-progress state.
///
/// ## Editing Rules
/// - Opens with a single row spanning the whole sale
/// - `push_next` appends a row starting where the last one ends,
///   pre-filled with the last row's price and cap
/// - `remove` refuses to drop the last remaining row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScheduleDraft {
    pub windows: Vec<WindowDraft>,
}

impl ScheduleDraft {
    /// A one-row draft covering `[sale_start, sale_end]`, price and cap blank.
    pub fn spanning(sale_start: DateTime<Utc>, sale_end: DateTime<Utc>, rules: &SaleRules) -> Self {
        ScheduleDraft {
            windows: vec![WindowDraft::new(
                to_input_string(sale_start, rules.input_offset),
                to_input_string(sale_end, rules.input_offset),
                "",
                "",
            )],
        }
    }

    /// Appends the next phase.
    ///
    /// ## Example
    /// ```rust
    /// use ico_core::schedule::{ScheduleDraft, WindowDraft};
    ///
    /// let mut draft = ScheduleDraft {
    ///     windows: vec![WindowDraft::new("2024-01-01T00:00", "2024-01-15T00:00", "1", "1000")],
    /// };
    /// draft.push_next();
    /// assert_eq!(draft.windows[1].start_date, "2024-01-15T00:00");
    /// assert_eq!(draft.windows[1].price, "1");
    /// ```
    pub fn push_next(&mut self) {
        let next = match self.windows.last() {
            Some(last) => WindowDraft::new(
                last.end_date.clone(),
                last.end_date.clone(),
                last.price.clone(),
                last.max_allocation.clone(),
            ),
            None => WindowDraft::default(),
        };
        self.windows.push(next);
    }

    /// Removes the row at `index` (0-based). Returns `false` when refused.
    pub fn remove(&mut self, index: usize) -> bool {
        if self.windows.len() <= 1 || index >= self.windows.len() {
            return false;
        }
        self.windows.remove(index);
        true
    }

    /// Replaces one field of the row at `index` (0-based).
    pub fn set_field(
        &mut self,
        index: usize,
        field: WindowField,
        value: impl Into<String>,
    ) -> bool {
        let Some(row) = self.windows.get_mut(index) else {
            return false;
        };
        let value = value.into();
        match field {
            WindowField::StartDate => row.start_date = value,
            WindowField::EndDate => row.end_date = value,
            WindowField::Price => row.price = value,
            WindowField::MaxAllocation => row.max_allocation = value,
        }
        true
    }

    /// Runs the exhaustive check over every row.
    pub fn validate(
        &self,
        rules: &SaleRules,
        sale_start: DateTime<Utc>,
        sale_end: DateTime<Utc>,
    ) -> ScheduleResult<SaleSchedule> {
        validate_schedule_with(rules, &self.windows, sale_start, sale_end)
    }
}

// =============================================================================
// Validated Types
// =============================================================================

/// A single validated phase: `start < end`, positive price and cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    unit_price: TokenAmount,
    allocation_cap: TokenAmount,
}

impl SaleWindow {
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn unit_price(&self) -> TokenAmount {
        self.unit_price
    }

    pub fn allocation_cap(&self) -> TokenAmount {
        self.allocation_cap
    }

    /// Half-open containment: `start <= at < end`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    fn overlaps(&self, other: &SaleWindow) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

/// A validated, immutable schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleSchedule {
    windows: Vec<SaleWindow>,
}

impl SaleSchedule {
    pub fn windows(&self) -> &[SaleWindow] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// The phase selling at `at`, with its 1-based number.
    pub fn active_window(&self, at: DateTime<Utc>) -> Option<(usize, &SaleWindow)> {
        self.windows
            .iter()
            .enumerate()
            .find(|(_, w)| w.contains(at))
            .map(|(i, w)| (i + 1, w))
    }

    /// Sum of every phase's allocation cap.
    pub fn total_cap(&self) -> CoreResult<TokenAmount> {
        self.windows
            .iter()
            .try_fold(TokenAmount::zero(), |acc, w| acc.checked_add(w.allocation_cap))
            .map_err(CoreError::from)
    }

    /// Builds the `setSalePhases` call for the sale with on-chain id `ico_id`.
    pub fn phase_args(&self, ico_id: u64) -> CoreResult<SalePhasesArgs> {
        let seconds = |t: DateTime<Utc>, field: &str| {
            unix_seconds(t).ok_or_else(|| CoreError::TimestampOutOfRange {
                field: field.to_string(),
            })
        };

        let mut args = SalePhasesArgs {
            ico_id,
            start_times: Vec::with_capacity(self.windows.len()),
            end_times: Vec::with_capacity(self.windows.len()),
            prices: Vec::with_capacity(self.windows.len()),
            max_allocations: Vec::with_capacity(self.windows.len()),
        };
        for window in &self.windows {
            args.start_times.push(seconds(window.start, "phase start")?);
            args.end_times.push(seconds(window.end, "phase end")?);
            args.prices.push(window.unit_price);
            args.max_allocations.push(window.allocation_cap);
        }
        Ok(args)
    }
}

/// Arguments of the contract's `setSalePhases(icoId, startTimes, endTimes,
/// prices, maxAllocations)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalePhasesArgs {
    pub ico_id: u64,
    pub start_times: Vec<u64>,
    pub end_times: Vec<u64>,
    #[ts(type = "Array<string>")]
    pub prices: Vec<TokenAmount>,
    #[ts(type = "Array<string>")]
    pub max_allocations: Vec<TokenAmount>,
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a submitted schedule with the default [`SaleRules`].
///
/// ## Rules
/// Row by row, in input order (numbers are 1-based):
/// 1. all four fields present → `IncompleteWindow`
/// 2. both dates parse → `InvalidDate`
/// 3. `start < end` → `InvertedInterval`
/// 4. inside `[sale_start, sale_end]` → `OutOfBounds`
/// 5. price > 0 → `NonPositivePrice`
/// 6. cap > 0 → `NonPositiveCap`
/// 7. no intersection with an earlier row → `Overlap { first, second }`
///
/// Then, once every row passed: neighbours touch → `Gap`.
///
/// ## Example
/// ```rust
/// use ico_core::schedule::{validate_schedule, WindowDraft};
/// use ico_core::time::parse_instant_jst;
/// use ico_core::ScheduleError;
///
/// let start = parse_instant_jst("2024-01-01T00:00").unwrap();
/// let end = parse_instant_jst("2024-02-01T00:00").unwrap();
/// let windows = vec![
///     WindowDraft::new("2024-01-01T00:00", "2024-01-15T00:00", "1", "1000"),
///     WindowDraft::new("2024-01-10T00:00", "2024-02-01T00:00", "2", "2000"),
/// ];
/// assert_eq!(
///     validate_schedule(&windows, start, end),
///     Err(ScheduleError::Overlap { first: 1, second: 2 })
/// );
/// ```
pub fn validate_schedule(
    windows: &[WindowDraft],
    sale_start: DateTime<Utc>,
    sale_end: DateTime<Utc>,
) -> ScheduleResult<SaleSchedule> {
    validate_schedule_with(&SaleRules::default(), windows, sale_start, sale_end)
}

/// [`validate_schedule`] with explicit rules.
pub fn validate_schedule_with(
    rules: &SaleRules,
    windows: &[WindowDraft],
    sale_start: DateTime<Utc>,
    sale_end: DateTime<Utc>,
) -> ScheduleResult<SaleSchedule> {
    let result = check_schedule(rules, windows, sale_start, sale_end);
    match &result {
        Ok(schedule) => debug!(phases = schedule.len(), "Schedule accepted"),
        Err(err) => debug!(code = err.kind(), %err, "Schedule rejected"),
    }
    result
}

/// Row-local checks (1–6) for a single row, for per-edit feedback.
///
/// `index` is 0-based; errors report it 1-based.
pub fn validate_window(
    rules: &SaleRules,
    index: usize,
    draft: &WindowDraft,
    sale_start: DateTime<Utc>,
    sale_end: DateTime<Utc>,
) -> ScheduleResult<SaleWindow> {
    let window = index + 1;

    if !draft.is_complete() {
        return Err(ScheduleError::IncompleteWindow { window });
    }

    let start = parse_instant(&draft.start_date, rules.input_offset);
    let end = parse_instant(&draft.end_date, rules.input_offset);
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ScheduleError::InvalidDate { window });
    };

    if start >= end {
        return Err(ScheduleError::InvertedInterval { window });
    }

    if start < sale_start || end > sale_end {
        return Err(ScheduleError::OutOfBounds { window });
    }

    let unit_price = positive_amount(&draft.price)
        .ok_or(ScheduleError::NonPositivePrice { window })?;
    let allocation_cap = positive_amount(&draft.max_allocation)
        .ok_or(ScheduleError::NonPositiveCap { window })?;

    Ok(SaleWindow {
        start,
        end,
        unit_price,
        allocation_cap,
    })
}

fn check_schedule(
    rules: &SaleRules,
    drafts: &[WindowDraft],
    sale_start: DateTime<Utc>,
    sale_end: DateTime<Utc>,
) -> ScheduleResult<SaleSchedule> {
    let mut windows: Vec<SaleWindow> = Vec::with_capacity(drafts.len());

    for (index, draft) in drafts.iter().enumerate() {
        let window = validate_window(rules, index, draft, sale_start, sale_end)?;

        if let Some(earlier) = windows.iter().position(|w| w.overlaps(&window)) {
            return Err(ScheduleError::Overlap {
                first: earlier + 1,
                second: index + 1,
            });
        }

        windows.push(window);
    }

    check_contiguity(&windows, rules.contiguity)?;

    Ok(SaleSchedule { windows })
}

/// Neighbours must touch: `previous.end == next.start`.
fn check_contiguity(windows: &[SaleWindow], order: ContiguityOrder) -> ScheduleResult<()> {
    // Positions into `windows`, in the order neighbours are compared.
    let mut sequence: Vec<usize> = (0..windows.len()).collect();
    if order == ContiguityOrder::Chronological {
        sequence.sort_by_key(|&i| windows[i].start);
    }

    for pair in sequence.windows(2) {
        let (previous, next) = (&windows[pair[0]], &windows[pair[1]]);
        if previous.end != next.start {
            return Err(ScheduleError::Gap { window: pair[1] + 1 });
        }
    }
    Ok(())
}

/// Parses a strictly positive amount; blanks, garbage and zero are `None`.
fn positive_amount(raw: &str) -> Option<TokenAmount> {
    parse_units(raw).ok().filter(TokenAmount::is_positive)
}

// =============================================================================
// Unit Tests
// =============================================================================
