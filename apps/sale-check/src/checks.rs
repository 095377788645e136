//! Input documents and the checks run on them.
//!
//! Every document uses the front end's camelCase names:
//!
//! ```text
//! schedule            { saleStart, saleEnd,
//!                       windows: [{ startDate, endDate, price, maxAllocation }] }
//! distribution(-edit) { saleEnd, entries: [{ releaseAt, percent }] }
//! draft               { name, symbol, description, price, totalSupply,
//!                       startDate, endDate, imageName }
//! ```

use ico_core::distribution::{
    validate_distribution_edit_with, validate_distribution_with, AllocationDraft, AllocationEntry,
};
use ico_core::draft::SaleDraft;
use ico_core::schedule::{validate_schedule_with, WindowDraft};
use ico_core::time::parse_instant;
use ico_core::validation::validate_period;
use ico_core::{SaleRules, ValidationError};
use serde::Deserialize;
use tracing::info;

use crate::report::CheckReport;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub sale_start: String,
    pub sale_end: String,
    #[serde(default)]
    pub windows: Vec<WindowDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionInput {
    pub sale_end: String,
    #[serde(default)]
    pub entries: Vec<AllocationDraft>,
}

pub fn check_schedule(rules: &SaleRules, input: &ScheduleInput) -> CheckReport {
    let (sale_start, sale_end) =
        match validate_period(&input.sale_start, &input.sale_end, rules.input_offset) {
            Ok(period) => period,
            Err(err) => return err.into(),
        };

    match validate_schedule_with(rules, &input.windows, sale_start, sale_end) {
        Ok(schedule) => {
            info!(phases = schedule.len(), "Schedule accepted");
            let cap = schedule
                .total_cap()
                .map(|c| c.to_string())
                .unwrap_or_else(|_| "overflow".to_string());
            CheckReport::accepted(format!(
                "{} phase(s), total allocation {}",
                schedule.len(),
                cap
            ))
        }
        Err(err) => err.into(),
    }
}

/// Runs the submission check, or the edit-time check when `edit` is set.
pub fn check_distribution(rules: &SaleRules, input: &DistributionInput, edit: bool) -> CheckReport {
    let Some(sale_end) = parse_instant(&input.sale_end, rules.input_offset) else {
        let err = ValidationError::InvalidFormat {
            field: "saleEnd".to_string(),
            reason: "not a date".to_string(),
        };
        return err.into();
    };

    let mut entries: Vec<AllocationEntry> = Vec::with_capacity(input.entries.len());
    for (index, draft) in input.entries.iter().enumerate() {
        match draft.to_entry(rules.input_offset) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                return CheckReport::rejected(
                    "VALIDATION_ERROR",
                    format!("Release {}: {}", index + 1, err),
                    Some(index + 1),
                )
            }
        }
    }

    if edit {
        match validate_distribution_edit_with(rules, &entries, sale_end) {
            Ok(total) => CheckReport::accepted(format!("running total {}%", total)),
            Err(err) => err.into(),
        }
    } else {
        match validate_distribution_with(rules, &entries, sale_end) {
            Ok(distribution) => {
                info!(releases = distribution.releases().len(), "Distribution accepted");
                CheckReport::accepted(format!(
                    "{} release(s) totalling 100%",
                    distribution.releases().len()
                ))
            }
            Err(err) => err.into(),
        }
    }
}

pub fn check_draft(rules: &SaleRules, draft: &SaleDraft) -> CheckReport {
    let config = match draft.validate(rules) {
        Ok(config) => config,
        Err(err) => return err.into(),
    };

    match config.create_args() {
        Ok(args) => {
            info!(symbol = %args.symbol, "Sale draft accepted");
            CheckReport::accepted(format!(
                "{} ({}) ready for createICO",
                config.name, config.symbol
            ))
        }
        Err(err) => err.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule_input(json: &str) -> ScheduleInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_schedule_document() {
        let input = schedule_input(
            r#"{
                "saleStart": "2024-01-01T00:00",
                "saleEnd": "2024-02-01T00:00",
                "windows": [
                    { "startDate": "2024-01-01T00:00", "endDate": "2024-01-15T00:00", "price": "1", "maxAllocation": "1000" },
                    { "startDate": "2024-01-10T00:00", "endDate": "2024-02-01T00:00", "price": "2", "maxAllocation": "2000" }
                ]
            }"#,
        );
        let report = check_schedule(&SaleRules::default(), &input);
        assert_eq!(report.code, "OVERLAP");
        assert_eq!(report.index, Some(2));
    }

    #[test]
    fn test_schedule_with_bad_sale_period() {
        let input = schedule_input(r#"{ "saleStart": "2024-02-01", "saleEnd": "2024-01-01" }"#);
        let report = check_schedule(&SaleRules::default(), &input);
        assert_eq!(report.code, "VALIDATION_ERROR");
    }

    #[test]
    fn test_distribution_document() {
        let input: DistributionInput = serde_json::from_str(
            r#"{
                "saleEnd": "2024-02-01T00:00",
                "entries": [
                    { "releaseAt": "2024-03-01T00:00", "percent": "50" },
                    { "releaseAt": "2024-04-01T00:00", "percent": "49" }
                ]
            }"#,
        )
        .unwrap();
        let rules = SaleRules::default();

        let report = check_distribution(&rules, &input, false);
        assert_eq!(report.code, "PERCENT_SUM_MISMATCH");
        assert_eq!(report.index, None);

        // Below 100 is fine while editing.
        let report = check_distribution(&rules, &input, true);
        assert!(report.ok);
    }

    #[test]
    fn test_distribution_malformed_row_reports_index() {
        let input: DistributionInput = serde_json::from_str(
            r#"{
                "saleEnd": "2024-02-01T00:00",
                "entries": [ { "releaseAt": "2024-03-01T00:00", "percent": "half" } ]
            }"#,
        )
        .unwrap();
        let report = check_distribution(&SaleRules::default(), &input, false);
        assert_eq!(report.code, "VALIDATION_ERROR");
        assert_eq!(report.index, Some(1));
    }

    #[test]
    fn test_draft_document() {
        let draft: SaleDraft = serde_json::from_str(
            r#"{
                "name": "Sakura",
                "symbol": "SKR",
                "price": "0.5",
                "totalSupply": "1000000",
                "startDate": "2024-01-01T00:00",
                "endDate": "2024-02-01T00:00"
            }"#,
        )
        .unwrap();
        assert!(check_draft(&SaleRules::default(), &draft).ok);
    }
}
