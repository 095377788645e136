//! # Purchase Module
//!
//! Turns "I want to pay X USDT" into a checked quote, the two wallet
//! transactions, and the history row.
//!
//! ## Purchase Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Buyer types 100 (USDT)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  quote_purchase()                                                       │
//! │  ├── listing Live?                      → SaleNotLive                   │
//! │  ├── amount parses, > 0?                → InvalidPurchaseAmount         │
//! │  ├── price: active phase or listing                                     │
//! │  ├── tokens = paid × 10^18 / price                                      │
//! │  └── tokens ≤ remaining allocation?     → ExceedsAllocation             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PurchaseQuote::calls()                                                 │
//! │  ├── 1. USDT.approve(saleContract, paid)                                │
//! │  └── 2. Sale.purchaseTokens(contractId, paid)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PurchaseQuote::record()  → `purchases` row                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::schedule::SaleSchedule;
use crate::types::{ListingStatus, PurchaseRecord, SaleListing};
use crate::units::{parse_units, TokenAmount};
use crate::validation::{validate_uuid, validate_wallet_address};

// =============================================================================
// Quote
// =============================================================================

/// A checked purchase, ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseQuote {
    pub listing_id: String,
    pub contract_id: u64,
    /// 1-based phase number when priced from a schedule.
    pub phase: Option<usize>,
    /// Stablecoin to pay.
    #[ts(type = "string")]
    pub pay_amount: TokenAmount,
    #[ts(type = "string")]
    pub unit_price: TokenAmount,
    /// Tokens received, rounded down.
    #[ts(type = "string")]
    pub tokens: TokenAmount,
}

/// Quotes a purchase of `listing` paying `pay_input` stablecoin at `now`.
///
/// With a `schedule`, price and cap come from the phase active at `now`;
/// without one, from the listing price and remaining supply.
///
/// ## Example
/// ```rust,no_run
/// # use chrono::Utc;
/// # fn listing() -> ico_core::SaleListing { unimplemented!() }
/// use ico_core::purchase::quote_purchase;
///
/// let quote = quote_purchase(&listing(), None, "100", Utc::now()).unwrap();
/// println!("{} tokens", quote.tokens);
/// ```
pub fn quote_purchase(
    listing: &SaleListing,
    schedule: Option<&SaleSchedule>,
    pay_input: &str,
    now: DateTime<Utc>,
) -> CoreResult<PurchaseQuote> {
    let status = listing.status(now);
    if status != ListingStatus::Live {
        return Err(CoreError::SaleNotLive {
            name: listing.name.clone(),
            status: status.to_string(),
        });
    }

    let pay_amount = parse_units(pay_input).map_err(|e| CoreError::InvalidPurchaseAmount {
        reason: e.to_string(),
    })?;
    if !pay_amount.is_positive() {
        return Err(CoreError::InvalidPurchaseAmount {
            reason: "amount must be greater than 0".to_string(),
        });
    }

    let remaining_supply = listing.remaining_supply();
    let (phase, unit_price, remaining) = match schedule {
        Some(schedule) => {
            let (phase, window) =
                schedule
                    .active_window(now)
                    .ok_or_else(|| CoreError::SaleNotLive {
                        name: listing.name.clone(),
                        status: "between phases".to_string(),
                    })?;
            (
                Some(phase),
                window.unit_price(),
                window.allocation_cap().min(remaining_supply),
            )
        }
        None => (None, listing.price, remaining_supply),
    };

    let tokens = pay_amount.tokens_at(unit_price)?;
    if tokens.is_zero() {
        return Err(CoreError::InvalidPurchaseAmount {
            reason: "amount is too small to buy any tokens".to_string(),
        });
    }
    if tokens > remaining {
        return Err(CoreError::ExceedsAllocation {
            requested: tokens.to_string(),
            remaining: remaining.to_string(),
        });
    }

    debug!(
        listing = %listing.id,
        phase = ?phase,
        paid = %pay_amount,
        tokens = %tokens,
        "Purchase quoted"
    );

    Ok(PurchaseQuote {
        listing_id: listing.id.clone(),
        contract_id: listing.contract_id,
        phase,
        pay_amount,
        unit_price,
        tokens,
    })
}

// =============================================================================
// Call Plan
// =============================================================================

/// `USDT.approve(spender, amount)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ApproveCall {
    pub spender: String,
    #[ts(type = "string")]
    pub amount: TokenAmount,
}

/// `Sale.purchaseTokens(icoId, usdtAmount)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTokensCall {
    pub ico_id: u64,
    #[ts(type = "string")]
    pub usdt_amount: TokenAmount,
}

/// The two transactions, sent in order from `from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct PurchaseCalls {
    pub from: String,
    pub approve: ApproveCall,
    pub purchase: PurchaseTokensCall,
}

impl PurchaseQuote {
    /// Builds the approve + purchase pair.
    ///
    /// `buyer_wallet` is the address on the buyer's profile; `None` or blank
    /// means the buyer has to link a wallet first.
    pub fn calls(
        &self,
        sale_contract: &str,
        buyer_wallet: Option<&str>,
    ) -> CoreResult<PurchaseCalls> {
        let wallet = buyer_wallet
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or(CoreError::WalletNotLinked)?;
        let from = validate_wallet_address(wallet)?;
        let spender = validate_wallet_address(sale_contract)?;

        Ok(PurchaseCalls {
            from,
            approve: ApproveCall {
                spender,
                amount: self.pay_amount,
            },
            purchase: PurchaseTokensCall {
                ico_id: self.contract_id,
                usdt_amount: self.pay_amount,
            },
        })
    }

    /// The `purchases` row for `user_id`.
    pub fn record(&self, user_id: &str) -> CoreResult<PurchaseRecord> {
        let user_id = validate_uuid("user_id", user_id)?;
        Ok(PurchaseRecord {
            user_id: user_id.to_string(),
            ico_id: self.listing_id.clone(),
            amount: self.tokens,
            price_per_token: self.unit_price,
            paid_amount: self.pay_amount,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::tests::listing;
    use crate::schedule::{validate_schedule, WindowDraft};
    use chrono::TimeZone;

    const SALE_CONTRACT: &str = "0x1111111111111111111111111111111111111111";
    const BUYER: &str = "0x2222222222222222222222222222222222222222";

    fn mid_sale() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_quote_at_listing_price() {
        let quote = quote_purchase(&listing("a", 1), None, "100", mid_sale()).unwrap();
        assert_eq!(quote.tokens, TokenAmount::from_whole(200));
        assert_eq!(quote.phase, None);
        assert_eq!(quote.contract_id, 1);
    }

    #[test]
    fn test_quote_rejects_closed_sale() {
        let l = listing("a", 1);
        let before = Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap();
        let err = quote_purchase(&l, None, "100", before).unwrap_err();
        assert_eq!(err.code(), "SALE_NOT_LIVE");
        assert_eq!(err.to_string(), "Sale Sakura is upcoming, purchases are closed");

        let mut paused = l.clone();
        paused.is_active = false;
        assert!(matches!(
            quote_purchase(&paused, None, "100", mid_sale()),
            Err(CoreError::SaleNotLive { .. })
        ));
    }

    #[test]
    fn test_quote_rejects_bad_amounts() {
        let l = listing("a", 1);
        for input in ["", "0", "-5", "ten", "0.0000000000000000001"] {
            assert!(
                matches!(
                    quote_purchase(&l, None, input, mid_sale()),
                    Err(CoreError::InvalidPurchaseAmount { .. })
                ),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_quote_rejects_more_than_remaining_supply() {
        let mut l = listing("a", 1);
        l.sold_amount = TokenAmount::from_whole(900);
        // 100 tokens left at 0.5 each.
        assert!(quote_purchase(&l, None, "50", mid_sale()).is_ok());
        let err = quote_purchase(&l, None, "50.5", mid_sale()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ExceedsAllocation { ref requested, ref remaining }
                if requested == "101" && remaining == "100"
        ));
    }

    #[test]
    fn test_quote_uses_active_phase() {
        let l = listing("a", 1);
        let windows = vec![
            WindowDraft::new("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z", "0.25", "100"),
            WindowDraft::new("2024-01-05T00:00:00Z", "2024-02-01T00:00:00Z", "1", "500"),
        ];
        let schedule = validate_schedule(&windows, l.start_date, l.end_date).unwrap();

        let early = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let quote = quote_purchase(&l, Some(&schedule), "10", early).unwrap();
        assert_eq!(quote.phase, Some(1));
        assert_eq!(quote.tokens, TokenAmount::from_whole(40));

        // Phase 1 cap is 100 tokens.
        assert!(matches!(
            quote_purchase(&l, Some(&schedule), "30", early),
            Err(CoreError::ExceedsAllocation { .. })
        ));

        let quote = quote_purchase(&l, Some(&schedule), "10", mid_sale()).unwrap();
        assert_eq!(quote.phase, Some(2));
        assert_eq!(quote.tokens, TokenAmount::from_whole(10));
    }

    #[test]
    fn test_calls_require_linked_wallet() {
        let quote = quote_purchase(&listing("a", 1), None, "100", mid_sale()).unwrap();

        assert!(matches!(
            quote.calls(SALE_CONTRACT, None),
            Err(CoreError::WalletNotLinked)
        ));
        assert!(matches!(
            quote.calls(SALE_CONTRACT, Some("  ")),
            Err(CoreError::WalletNotLinked)
        ));
        assert!(matches!(
            quote.calls(SALE_CONTRACT, Some("0x12")),
            Err(CoreError::Validation(_))
        ));

        let calls = quote.calls(SALE_CONTRACT, Some(BUYER)).unwrap();
        assert_eq!(calls.from, BUYER);
        assert_eq!(calls.approve.spender, SALE_CONTRACT);
        assert_eq!(calls.approve.amount, TokenAmount::from_whole(100));
        assert_eq!(calls.purchase.ico_id, 1);
        assert_eq!(calls.purchase.usdt_amount, calls.approve.amount);
    }

    #[test]
    fn test_record_snapshots_price() {
        let quote = quote_purchase(&listing("a", 1), None, "100", mid_sale()).unwrap();
        let record = quote.record("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(record.ico_id, "a");
        assert_eq!(record.amount, TokenAmount::from_whole(200));
        assert_eq!(record.price_per_token.to_string(), "0.5");
        assert_eq!(record.paid_amount, TokenAmount::from_whole(100));

        assert!(quote.record("nobody").is_err());
    }
}
