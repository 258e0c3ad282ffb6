//! Price display using decimal arithmetic.
//!
//! Amounts are plain [`Decimal`] values everywhere in the storefront; [`Price`]
//! only pairs an amount with its currency for display.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Indian rupees.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }

    /// Format for display, e.g. `₹2,100`, `₹12,50,000` or `₹1,999.50`.
    ///
    /// Rupee amounts use Indian lakh/crore grouping, other currencies group
    /// by thousands. Whole amounts drop the fractional part.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.amount.round_dp(2);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let abs = rounded.abs();

        let whole = abs.trunc();
        let fraction = abs - whole;
        let grouped = group_digits(&whole.to_string(), self.currency_code);

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(self.currency_code.symbol());
        out.push_str(&grouped);
        if !fraction.is_zero() {
            // Two digits after the point, e.g. 0.5 -> "50"
            let cents = (fraction * Decimal::ONE_HUNDRED).trunc().to_string();
            out.push_str(&format!(".{cents:0>2}"));
        }
        out
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Insert separators: the last three digits form one group, the rest are
/// grouped in pairs for INR and in threes otherwise.
fn group_digits(digits: &str, currency: CurrencyCode) -> String {
    let step = match currency {
        CurrencyCode::INR => 2,
        CurrencyCode::USD => 3,
    };
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 2);
    for (i, c) in digits.chars().enumerate() {
        let from_end = len - i;
        if i > 0 && from_end >= 3 && (from_end - 3) % step == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
        }
    }
}
