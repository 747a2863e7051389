use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{EngineError, Result};

/// round half-up (ties away from zero) to the given number of decimal places
pub(crate) fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// currency with its number of decimal places (2 for most, 0 for JPY-style, 3 for KWD-style)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    code: String,
    precision: u32,
}

impl Currency {
    pub fn new(code: &str, precision: u32) -> Result<Self> {
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(EngineError::Validation {
                message: format!("currency code must be three letters, got '{}'", code),
            });
        }
        if precision > 8 {
            return Err(EngineError::Validation {
                message: format!("currency precision out of range: {}", precision),
            });
        }
        Ok(Self {
            code: code.to_ascii_uppercase(),
            precision,
        })
    }

    /// standard two-decimal currency
    pub fn of(code: &str) -> Result<Self> {
        Self::new(code, 2)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// currency-aware monetary amount, rounded half-up to the currency precision at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    currency: Currency,
    amount: Decimal,
}

impl Money {
    pub fn of(currency: Currency, amount: Decimal) -> Self {
        let amount = round_half_up(amount, currency.precision());
        Self { currency, amount }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::of(currency, Decimal::ZERO)
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    fn check_currency(&self, other: &Money) -> Result<()> {
        if self.currency.code() != other.currency.code() {
            return Err(EngineError::CurrencyMismatch {
                left: self.currency.code().to_string(),
                right: other.currency.code().to_string(),
            });
        }
        Ok(())
    }

    pub fn plus(&self, other: &Money) -> Result<Money> {
        self.check_currency(other)?;
        Ok(Money::of(self.currency.clone(), self.amount + other.amount))
    }

    pub fn minus(&self, other: &Money) -> Result<Money> {
        self.check_currency(other)?;
        Ok(Money::of(self.currency.clone(), self.amount - other.amount))
    }

    pub fn multiplied_by(&self, factor: Decimal) -> Money {
        Money::of(self.currency.clone(), self.amount * factor)
    }

    pub fn divided_by(&self, divisor: Decimal) -> Result<Money> {
        if divisor.is_zero() {
            return Err(EngineError::DivisionByZero);
        }
        Ok(Money::of(self.currency.clone(), self.amount / divisor))
    }

    pub fn is_greater_than(&self, other: &Money) -> Result<bool> {
        self.check_currency(other)?;
        Ok(self.amount > other.amount)
    }

    pub fn is_less_than(&self, other: &Money) -> Result<bool> {
        self.check_currency(other)?;
        Ok(self.amount < other.amount)
    }

    pub fn is_equal_to(&self, other: &Money) -> Result<bool> {
        self.check_currency(other)?;
        Ok(self.amount == other.amount)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn absolute(&self) -> Money {
        Money::of(self.currency.clone(), self.amount.abs())
    }

    pub fn negated(&self) -> Money {
        Money::of(self.currency.clone(), -self.amount)
    }

    pub fn min_of(&self, other: &Money) -> Result<Money> {
        self.check_currency(other)?;
        Ok(Money::of(self.currency.clone(), self.amount.min(other.amount)))
    }

    pub fn max_of(&self, other: &Money) -> Result<Money> {
        self.check_currency(other)?;
        Ok(Money::of(self.currency.clone(), self.amount.max(other.amount)))
    }

    /// round to the nearest multiple of `multiple`, half-up on ties
    pub fn round_to_multiples_of(&self, multiple: Decimal) -> Result<Money> {
        if multiple.is_zero() {
            return Err(EngineError::DivisionByZero);
        }
        let units = round_half_up(self.amount / multiple, 0);
        Ok(Money::of(self.currency.clone(), units * multiple))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency.code(), self.amount)
    }
}

/// per-period or annual interest rate, stored as a fraction (0.01 for 1%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from a percentage (e.g. 1.5 for 1.5%)
    pub fn from_percent(percent: Decimal) -> Self {
        Rate(percent / Decimal::from(100))
    }

    pub fn from_fraction(fraction: Decimal) -> Self {
        Rate(fraction)
    }

    pub fn as_fraction(&self) -> Decimal {
        self.0
    }

    pub fn as_percent(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}
