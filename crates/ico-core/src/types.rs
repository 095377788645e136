//! # Domain Types
//!
//! Rows and contract payloads shared between the launchpad screens.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  SaleListing    │   │ NewSaleRecord   │   │ CreateSaleArgs  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  row to insert  │   │  createICO(...) │       │
//! │  │  contract_id    │   │  into `icos`    │   │  base units +   │       │
//! │  │  price, supply  │   │                 │   │  unix seconds   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │ ListingStatus   │   │ PurchaseRecord  │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  Paused         │   │  row to insert  │                             │
//! │  │  Upcoming       │   │  into           │                             │
//! │  │  Live           │   │  `purchases`    │                             │
//! │  │  Ended          │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity
//! A listing has a database `id` (UUID v4) and the `contract_id` the sale
//! contract assigned when `createICO` was mined. Purchases go to the
//! contract by `contract_id` and to the database by `id`.
//!
//! Rows keep the database's snake_case column names; contract payloads use
//! camelCase like the front end.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::units::TokenAmount;

// =============================================================================
// Listing Status
// =============================================================================

/// Where a listing stands relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// An administrator switched the sale off.
    Paused,
    /// `now < start`.
    Upcoming,
    /// `start <= now < end`. The only status that accepts purchases.
    Live,
    /// `now >= end`.
    Ended,
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ListingStatus::Paused => "paused",
            ListingStatus::Upcoming => "upcoming",
            ListingStatus::Live => "live",
            ListingStatus::Ended => "ended",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Sale Listing
// =============================================================================

/// A persisted sale, as read from the `icos` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleListing {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,

    /// Markdown source.
    pub description: String,

    /// Token ticker, e.g. `SAKURA`.
    pub symbol: String,

    /// Listing price per token, in stablecoin base units.
    #[ts(type = "string")]
    pub price: TokenAmount,

    /// Object path inside the image bucket.
    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,

    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,

    #[ts(type = "string")]
    pub total_supply: TokenAmount,

    /// Tokens sold so far.
    #[ts(type = "string")]
    #[serde(default)]
    pub sold_amount: TokenAmount,

    /// Administrators can pause a sale without deleting it.
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Sale id on the contract.
    pub contract_id: u64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

// =============================================================================
// Records to Insert
// =============================================================================

/// Row inserted into `icos` once `createICO` has been sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleRecord {
    pub name: String,
    pub symbol: String,
    pub description: String,
    #[ts(type = "string")]
    pub price: TokenAmount,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
    #[ts(type = "string")]
    pub total_supply: TokenAmount,
    pub image_url: Option<String>,
}

/// Row inserted into `purchases` after both transactions were sent.
///
/// Price is snapshotted so history survives later price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseRecord {
    pub user_id: String,
    /// Listing `id`, not `contract_id`.
    pub ico_id: String,
    /// Tokens bought.
    #[ts(type = "string")]
    pub amount: TokenAmount,
    /// Unit price at the time of purchase (frozen).
    #[ts(type = "string")]
    pub price_per_token: TokenAmount,
    /// Stablecoin paid.
    #[ts(type = "string")]
    pub paid_amount: TokenAmount,
}

// =============================================================================
// Contract Payloads
// =============================================================================

/// Arguments of `createICO(name, symbol, totalSupply, tokenPrice, startTime,
/// endTime)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleArgs {
    pub name: String,
    pub symbol: String,
    #[ts(type = "string")]
    pub total_supply: TokenAmount,
    #[ts(type = "string")]
    pub token_price: TokenAmount,
    /// Unix seconds.
    pub start_time: u64,
    /// Unix seconds.
    pub end_time: u64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_status_display() {
        assert_eq!(ListingStatus::Live.to_string(), "live");
        assert_eq!(ListingStatus::Paused.to_string(), "paused");
    }

    #[test]
    fn test_listing_deserializes_database_row() {
        let listing: SaleListing = serde_json::from_str(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "name": "Sakura",
                "description": "",
                "symbol": "SKR",
                "price": "500000000000000000",
                "image_url": null,
                "start_date": "2024-01-01T00:00:00Z",
                "end_date": "2024-02-01T00:00:00Z",
                "total_supply": "1000000000000000000000",
                "contract_id": 3,
                "created_at": "2023-12-20T10:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(listing.price.to_string(), "0.5");
        assert!(listing.sold_amount.is_zero());
        assert!(listing.is_active);
    }

    #[test]
    fn test_create_sale_args_are_camel_case() {
        let args = CreateSaleArgs {
            name: "Sakura".to_string(),
            symbol: "SKR".to_string(),
            total_supply: TokenAmount::from_whole(1),
            token_price: TokenAmount::from_whole(2),
            start_time: 1,
            end_time: 2,
        };
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["totalSupply"], "1000000000000000000");
        assert_eq!(json["startTime"], 1);
    }
}
