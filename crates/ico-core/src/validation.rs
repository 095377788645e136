//! # Validation Module
//!
//! Field validators for the sale creation form and the purchase screen.
//!
//! ## Where These Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form controls                                                │
//! │  ├── required / maxLength attributes                                   │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (field by field)                                 │
//! │  ├── name, symbol, description, amounts, period                        │
//! │  └── ids and wallet addresses                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: schedule / distribution (whole-structure rules)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators return the cleaned value so callers never re-parse.
//!
//! ## Usage
//! ```rust
//! use ico_core::validation::{validate_symbol, validate_positive_amount};
//!
//! assert_eq!(validate_symbol(" ABC ").unwrap(), "ABC");
//! assert!(validate_positive_amount("price", "0").is_err());
//! ```

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::time::parse_instant;
use crate::units::{parse_units, TokenAmount};
use crate::{MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MAX_SYMBOL_LENGTH, MIN_SYMBOL_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a sale name.
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
pub fn validate_sale_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

/// Validates a token symbol.
///
/// ## Rules
/// - Must not be empty
/// - 2 to 11 characters
/// - Uppercase ASCII letters and digits only
///
/// ## Example
/// ```rust
/// use ico_core::validation::validate_symbol;
///
/// assert!(validate_symbol("SAKURA").is_ok());
/// assert!(validate_symbol("sakura").is_err());
/// assert!(validate_symbol("S").is_err());
/// ```
pub fn validate_symbol(symbol: &str) -> ValidationResult<String> {
    let symbol = symbol.trim();

    if symbol.is_empty() {
        return Err(ValidationError::required("symbol"));
    }

    let len = symbol.chars().count();
    if len < MIN_SYMBOL_LENGTH {
        return Err(ValidationError::TooShort {
            field: "symbol".to_string(),
            min: MIN_SYMBOL_LENGTH,
        });
    }
    if len > MAX_SYMBOL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "symbol".to_string(),
            max: MAX_SYMBOL_LENGTH,
        });
    }

    if !symbol
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ValidationError::invalid_format(
            "symbol",
            "must contain only uppercase letters and digits",
        ));
    }

    Ok(symbol.to_string())
}

/// Validates a markdown description. Empty is allowed.
pub fn validate_description(description: &str) -> ValidationResult<String> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LENGTH,
        });
    }

    Ok(description.trim().to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a decimal amount and requires it to be greater than zero.
///
/// `field` names the input in the error.
pub fn validate_positive_amount(field: &str, raw: &str) -> ValidationResult<TokenAmount> {
    if raw.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    let amount = parse_units(raw).map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })?;

    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(amount)
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a start/end pair and requires `start < end`.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Create Sale: Details step                                              │
/// │                                                                         │
/// │  Start: 2024-01-01T00:00   End: 2024-02-01T00:00                       │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_period() ← THIS FUNCTION                                     │
/// │       │                                                                 │
/// │       ├── blank?            → Required                                 │
/// │       ├── unparseable?      → InvalidFormat                            │
/// │       ├── start >= end?     → InvertedPeriod                           │
/// │       └── OK → (start, end) in UTC                                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_period(
    start: &str,
    end: &str,
    offset: FixedOffset,
) -> ValidationResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = validate_instant("startDate", start, offset)?;
    let end = validate_instant("endDate", end, offset)?;

    if start >= end {
        return Err(ValidationError::InvertedPeriod {
            field: "sale period".to_string(),
        });
    }

    Ok((start, end))
}

fn validate_instant(
    field: &str,
    raw: &str,
    offset: FixedOffset,
) -> ValidationResult<DateTime<Utc>> {
    if raw.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    parse_instant(raw, offset).ok_or_else(|| ValidationError::invalid_format(field, "not a date"))
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a UUID string (listing, user and purchase ids).
///
/// ## Example
/// ```rust
/// use ico_core::validation::validate_uuid;
///
/// assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<Uuid> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    Uuid::parse_str(id.trim())
        .map_err(|_| ValidationError::invalid_format(field, "must be a valid UUID"))
}

/// Validates an EVM address: `0x` followed by 40 hex digits.
///
/// Returns the address lowercased.
pub fn validate_wallet_address(address: &str) -> ValidationResult<String> {
    let address = address.trim();

    if address.is_empty() {
        return Err(ValidationError::required("wallet address"));
    }

    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| ValidationError::invalid_format("wallet address", "must start with 0x"))?;

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::invalid_format(
            "wallet address",
            "must be 40 hexadecimal digits",
        ));
    }

    Ok(format!("0x{}", hex.to_ascii_lowercase()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::jst;

    #[test]
    fn test_validate_sale_name() {
        assert_eq!(validate_sale_name("  Sakura Token ").unwrap(), "Sakura Token");
        assert!(validate_sale_name("").is_err());
        assert!(validate_sale_name(&"a".repeat(100)).is_ok());
        assert!(matches!(
            validate_sale_name(&"a".repeat(101)),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
        // Counted in characters, not bytes.
        assert!(validate_sale_name(&"桜".repeat(100)).is_ok());
    }

    #[test]
    fn test_validate_symbol() {
        assert!(validate_symbol("AB").is_ok());
        assert!(validate_symbol("ABCDEFGHIJ1").is_ok());
        assert!(matches!(
            validate_symbol("ABCDEFGHIJ12"),
            Err(ValidationError::TooLong { max: 11, .. })
        ));
        assert!(matches!(
            validate_symbol("A"),
            Err(ValidationError::TooShort { min: 2, .. })
        ));
        assert!(matches!(
            validate_symbol("AB-C"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_symbol("  "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_description() {
        assert_eq!(validate_description("").unwrap(), "");
        assert!(validate_description(&"x".repeat(5000)).is_ok());
        assert!(validate_description(&"x".repeat(5001)).is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert_eq!(
            validate_positive_amount("price", "0.5").unwrap(),
            crate::units::parse_units("0.5").unwrap()
        );
        assert!(matches!(
            validate_positive_amount("price", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_positive_amount("price", "0"),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_positive_amount("price", "-2"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_period() {
        let (start, end) = validate_period("2024-01-01T00:00", "2024-02-01T00:00", jst()).unwrap();
        assert!(start < end);

        assert!(matches!(
            validate_period("2024-02-01T00:00", "2024-02-01T00:00", jst()),
            Err(ValidationError::InvertedPeriod { .. })
        ));
        assert!(matches!(
            validate_period("", "2024-02-01T00:00", jst()),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_period("2024-01-01T00:00", "later", jst()),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }

    #[test]
    fn test_validate_wallet_address() {
        let addr = "0xAbCdEf0123456789abcdef0123456789ABCDEF01";
        assert_eq!(
            validate_wallet_address(addr).unwrap(),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
        assert!(validate_wallet_address("").is_err());
        assert!(validate_wallet_address("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(validate_wallet_address("0x1234").is_err());
        assert!(validate_wallet_address("0xZZcdef0123456789abcdef0123456789abcdef01").is_err());
    }
}
