//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API layer                                                    │
//! │  ├── Deserialization into typed requests                               │
//! │  └── Unsigned quantities, Money prices                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Names, descriptions, usernames                                    │
//! │  ├── Non-negative prices, line quantities                              │
//! │  └── Password strength (every failed rule reported)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Storage                                                      │
//! │  └── Exact CSV headers, parseable fields                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::fmt;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length, counted in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_USERNAME_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Stapler").is_ok());
/// assert!(validate_product_name("  ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a product description. Empty is fine.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(())
}

/// Validates a username.
///
/// ## Rules
/// - Must not be empty or surrounded by whitespace
/// - At most 50 characters
/// - No control characters
pub fn validate_username(username: &str) -> ValidationResult<()> {
    if username.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.trim() != username || username.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain surrounding whitespace or control characters".to_string(),
        });
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a product price.
///
/// ## Rules
/// - Must be non-negative (zero is allowed for free items)
/// - Must not exceed MAX_PRICE_CENTS (1,000,000.00)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Password Rules
// =============================================================================

/// A single password strength rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordRule::MinLength => {
                write!(f, "must be at least {} characters", MIN_PASSWORD_LEN)
            }
            PasswordRule::Uppercase => f.write_str("must contain an uppercase letter"),
            PasswordRule::Lowercase => f.write_str("must contain a lowercase letter"),
            PasswordRule::Digit => f.write_str("must contain a digit"),
        }
    }
}

/// Returns every rule the password breaks, in a fixed order.
///
/// An empty vector means the password is acceptable.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::{password_violations, PasswordRule};
///
/// assert!(password_violations("Secret123").is_empty());
/// assert_eq!(
///     password_violations("short"),
///     vec![PasswordRule::MinLength, PasswordRule::Uppercase, PasswordRule::Digit]
/// );
/// ```
pub fn password_violations(password: &str) -> Vec<PasswordRule> {
    let mut violations = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        violations.push(PasswordRule::MinLength);
    }
    if !password.chars().any(char::is_uppercase) {
        violations.push(PasswordRule::Uppercase);
    }
    if !password.chars().any(char::is_lowercase) {
        violations.push(PasswordRule::Lowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PasswordRule::Digit);
    }

    violations
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Stapler").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(" alice").is_err());
        assert!(validate_username("al\nice").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_cents(1099)).is_ok());
        assert!(validate_price(Money::from_cents(-1)).is_err());
        assert!(validate_price(Money::from_cents(MAX_PRICE_CENTS)).is_ok());
        assert!(matches!(
            validate_price(Money::from_cents(MAX_PRICE_CENTS + 1)),
            Err(ValidationError::OutOfRange { max: MAX_PRICE_CENTS, .. })
        ));
        assert!(validate_price(Money::from_cents(i64::MAX)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_password_rules_report_all_violations() {
        assert!(password_violations("Abcdefg1").is_empty());
        assert_eq!(
            password_violations("abcdefgh"),
            vec![PasswordRule::Uppercase, PasswordRule::Digit]
        );
        assert_eq!(
            password_violations("ABC"),
            vec![
                PasswordRule::MinLength,
                PasswordRule::Lowercase,
                PasswordRule::Digit
            ]
        );
        assert_eq!(password_violations("").len(), 4);
    }

    #[test]
    fn test_password_length_counts_characters() {
        // 8 characters, more than 8 bytes
        assert!(password_violations("Éécole12").is_empty());
    }
}
