//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Backend payloads carry bare amounts; `Price` pairs an amount with the
/// store's currency for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g. won, dollars).
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

    /// Create a price in the default currency (KRW).
    #[must_use]
    pub const fn krw(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::KRW)
    }

    /// Format for display with a currency symbol and thousands separators
    /// (e.g. `₩12,500`, `$4.50`).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.amount.round_dp(self.currency_code.minor_units());
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = rounded.abs().to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let minor = self.currency_code.minor_units() as usize;
        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(self.currency_code.symbol());
        out.push_str(&grouped);
        if minor > 0 {
            out.push('.');
            out.push_str(fraction);
            for _ in fraction.len()..minor {
                out.push('0');
            }
        }
        out
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    KRW,
    USD,
    EUR,
    JPY,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::KRW => "₩",
            Self::USD => "$",
            Self::EUR => "€",
            Self::JPY => "¥",
        }
    }

    /// Number of decimal places used for display.
    #[must_use]
    pub const fn minor_units(&self) -> u32 {
        match self {
            Self::KRW | Self::JPY => 0,
            Self::USD | Self::EUR => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_krw_groups_thousands() {
        assert_eq!(Price::krw(Decimal::new(12_500, 0)).display(), "₩12,500");
        assert_eq!(Price::krw(Decimal::new(500, 0)).display(), "₩500");
        assert_eq!(
            Price::krw(Decimal::new(1_234_567, 0)).display(),
            "₩1,234,567"
        );
    }

    #[test]
    fn test_display_pads_minor_units() {
        let price = Price::new(Decimal::new(45, 1), CurrencyCode::USD);
        assert_eq!(price.display(), "$4.50");
    }

    #[test]
    fn test_display_negative() {
        let price = Price::krw(Decimal::new(-3000, 0));
        assert_eq!(price.to_string(), "-₩3,000");
    }
}
