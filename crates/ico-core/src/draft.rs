//! # Sale Creation Draft
//!
//! The two-step "Create Sale" form and the payloads it produces.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Step 1: Details                   Step 2: Review                       │
//! │  ┌────────────────────┐  advance   ┌────────────────────┐               │
//! │  │ name, symbol,      │ ─────────► │ read-only summary  │               │
//! │  │ description,       │            │                    │               │
//! │  │ price, supply,     │ ◄───────── │ [Back]  [Create]   │               │
//! │  │ start, end, image  │    back    └─────────┬──────────┘               │
//! │  └────────────────────┘                      │                          │
//! │                                              ▼                          │
//! │                          SaleConfig ──► CreateSaleArgs (createICO)      │
//! │                                    └──► NewSaleRecord  (icos row)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::config::SaleRules;
use crate::error::{CoreError, CoreResult};
use crate::time::unix_seconds;
use crate::types::{CreateSaleArgs, NewSaleRecord};
use crate::units::TokenAmount;
use crate::validation::{
    validate_description, validate_period, validate_positive_amount, validate_sale_name,
    validate_symbol, ValidationResult,
};

// =============================================================================
// Draft
// =============================================================================

/// Which page of the form is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DraftStep {
    #[default]
    Details,
    Review,
}

/// The creation form as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleDraft {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub price: String,
    pub total_supply: String,
    pub start_date: String,
    pub end_date: String,
    /// File name of the selected image, if any.
    pub image_name: Option<String>,
    pub step: DraftStep,
}

impl SaleDraft {
    /// Validates the details page and moves to review.
    ///
    /// The step only changes when every field passes.
    ///
    /// ## Example
    /// ```rust
    /// use ico_core::draft::{DraftStep, SaleDraft};
    /// use ico_core::SaleRules;
    ///
    /// let mut draft = SaleDraft {
    ///     name: "Sakura".into(),
    ///     symbol: "SKR".into(),
    ///     price: "0.5".into(),
    ///     total_supply: "1000000".into(),
    ///     start_date: "2024-01-01T00:00".into(),
    ///     end_date: "2024-02-01T00:00".into(),
    ///     ..SaleDraft::default()
    /// };
    ///
    /// let config = draft.advance(&SaleRules::default()).unwrap();
    /// assert_eq!(draft.step, DraftStep::Review);
    /// assert_eq!(config.symbol, "SKR");
    /// ```
    pub fn advance(&mut self, rules: &SaleRules) -> ValidationResult<SaleConfig> {
        let config = self.validate(rules)?;
        self.step = DraftStep::Review;
        Ok(config)
    }

    /// Validates without changing the step.
    pub fn validate(&self, rules: &SaleRules) -> ValidationResult<SaleConfig> {
        let result = self.check(rules);
        if let Err(err) = &result {
            debug!(%err, "Sale draft rejected");
        }
        result
    }

    fn check(&self, rules: &SaleRules) -> ValidationResult<SaleConfig> {
        let name = validate_sale_name(&self.name)?;
        let symbol = validate_symbol(&self.symbol)?;
        let description = validate_description(&self.description)?;
        let price = validate_positive_amount("price", &self.price)?;
        let total_supply = validate_positive_amount("totalSupply", &self.total_supply)?;
        let (start, end) = validate_period(&self.start_date, &self.end_date, rules.input_offset)?;

        let image_name = self
            .image_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(SaleConfig {
            name,
            symbol,
            description,
            price,
            total_supply,
            start,
            end,
            image_name,
        })
    }

    /// Back to the details page; input is kept.
    pub fn back(&mut self) {
        self.step = DraftStep::Details;
    }

    /// Clears the form after a sale was created.
    pub fn reset(&mut self) {
        *self = SaleDraft::default();
    }
}

// =============================================================================
// Sale Config
// =============================================================================

/// A fully validated sale definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleConfig {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub price: TokenAmount,
    pub total_supply: TokenAmount,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub image_name: Option<String>,
}

impl SaleConfig {
    /// The `createICO` call.
    pub fn create_args(&self) -> CoreResult<CreateSaleArgs> {
        let start_time = unix_seconds(self.start).ok_or_else(|| CoreError::TimestampOutOfRange {
            field: "startDate".to_string(),
        })?;
        let end_time = unix_seconds(self.end).ok_or_else(|| CoreError::TimestampOutOfRange {
            field: "endDate".to_string(),
        })?;

        Ok(CreateSaleArgs {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            total_supply: self.total_supply,
            token_price: self.price,
            start_time,
            end_time,
        })
    }

    /// The `icos` row. `image_path` is what the storage upload returned.
    pub fn record(&self, image_path: Option<String>) -> NewSaleRecord {
        NewSaleRecord {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            description: self.description.clone(),
            price: self.price,
            start_date: self.start,
            end_date: self.end,
            total_supply: self.total_supply,
            image_url: image_path,
        }
    }

    /// Storage key for this sale's image, if one was selected.
    pub fn image_key(&self, now_ms: i64) -> Option<String> {
        self.image_name
            .as_deref()
            .map(|name| image_object_key(now_ms, name))
    }
}

/// Object key for an uploaded image: `<unix millis>-<file name>`.
///
/// ## Example
/// ```rust
/// use ico_core::draft::image_object_key;
///
/// assert_eq!(image_object_key(1704067200000, "logo.png"), "1704067200000-logo.png");
/// ```
pub fn image_object_key(now_ms: i64, file_name: &str) -> String {
    format!("{}-{}", now_ms, file_name)
}

// =============================================================================
// Unit Tests
// =============================================================================
