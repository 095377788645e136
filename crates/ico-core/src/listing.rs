//! # Listing Module
//!
//! Read-side rules for sale listings: status, progress, ordering and the
//! admin dashboard counters.
//!
//! ## Status Timeline
//! ```text
//!            start_date                 end_date
//!                │                          │
//!   UPCOMING     │          LIVE            │     ENDED
//! ───────────────┼──────────────────────────┼──────────────►  now
//!
//!   is_active == false  →  PAUSED, whatever the clock says
//! ```

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::types::{ListingStatus, SaleListing};
use crate::units::TokenAmount;
use crate::IMAGE_BUCKET;

impl SaleListing {
    /// Status at `now`.
    pub fn status(&self, now: DateTime<Utc>) -> ListingStatus {
        if !self.is_active {
            ListingStatus::Paused
        } else if now < self.start_date {
            ListingStatus::Upcoming
        } else if now < self.end_date {
            ListingStatus::Live
        } else {
            ListingStatus::Ended
        }
    }

    /// Tokens still for sale.
    pub fn remaining_supply(&self) -> TokenAmount {
        self.total_supply.saturating_sub(self.sold_amount)
    }

    /// Sold share of the supply in basis points (0..=10_000).
    pub fn progress_bps(&self) -> u32 {
        if self.total_supply.is_zero() {
            return 0;
        }
        let sold = self.sold_amount.min(self.total_supply);
        crate::units::mul_div(sold.base_units(), 10_000, self.total_supply.base_units())
            .map(|bps| bps as u32)
            .unwrap_or(0)
    }

    /// Public URL of the listing image.
    ///
    /// ## Example
    /// ```rust,no_run
    /// # fn listing() -> ico_core::SaleListing { unimplemented!() }
    /// let url = listing().image_public_url("https://abc.supabase.co/");
    /// // Some("https://abc.supabase.co/storage/v1/object/public/ico-images/17000-logo.png")
    /// ```
    pub fn image_public_url(&self, storage_base: &str) -> Option<String> {
        let path = self.image_url.as_deref()?.trim_start_matches('/');
        if path.is_empty() {
            return None;
        }
        Some(format!(
            "{}/storage/v1/object/public/{}/{}",
            storage_base.trim_end_matches('/'),
            IMAGE_BUCKET,
            path
        ))
    }

    /// Pause or resume. Returns the new flag.
    pub fn toggle_active(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.is_active
    }
}

// =============================================================================
// Collections
// =============================================================================

/// Sorts newest first by `created_at`.
pub fn newest_first(listings: &mut [SaleListing]) {
    listings.sort_by_key(|l| Reverse(l.created_at));
}

/// Listings with `status` at `now`, in their current order.
pub fn filter_by_status(
    listings: &[SaleListing],
    status: ListingStatus,
    now: DateTime<Utc>,
) -> Vec<&SaleListing> {
    listings.iter().filter(|l| l.status(now) == status).collect()
}

/// Counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ListingSummary {
    pub total: usize,
    pub upcoming: usize,
    pub live: usize,
    pub ended: usize,
    pub paused: usize,
}

pub fn summarize(listings: &[SaleListing], now: DateTime<Utc>) -> ListingSummary {
    listings
        .iter()
        .fold(ListingSummary::default(), |mut summary, listing| {
            summary.total += 1;
            match listing.status(now) {
                ListingStatus::Upcoming => summary.upcoming += 1,
                ListingStatus::Live => summary.live += 1,
                ListingStatus::Ended => summary.ended += 1,
                ListingStatus::Paused => summary.paused += 1,
            }
            summary
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
