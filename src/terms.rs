use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};
use crate::money::{Money, Rate};

/// unit for loan term and repayment frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodFrequencyType {
    Days,
    Weeks,
    Months,
    Years,
}

/// interest method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestMethod {
    /// constant interest on the original principal every period
    Flat,
    /// interest on the principal still outstanding at period start
    DecliningBalance,
}

/// amortization method for declining-balance loans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationMethod {
    /// equal payment amounts throughout the term (EMI)
    EqualInstallments,
    /// equal principal portions, payment amount declines
    EqualPrincipal,
}

/// days-in-year basis for day-count interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaysInYear {
    Days360,
    Days365,
}

impl DaysInYear {
    pub fn basis(&self) -> u32 {
        match self {
            DaysInYear::Days360 => 360,
            DaysInYear::Days365 => 365,
        }
    }
}

/// immutable contractual shape of one loan, validated once before any calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplicationTerms {
    pub principal: Money,
    pub loan_term_frequency: u32,
    pub loan_term_frequency_type: PeriodFrequencyType,
    pub number_of_repayments: u32,
    pub repayment_every: u32,
    pub repayment_frequency_type: PeriodFrequencyType,
    pub interest_rate_per_period: Rate,
    pub interest_method: InterestMethod,
    pub amortization_method: AmortizationMethod,
    pub expected_disbursement_date: NaiveDate,
    pub principal_grace_periods: u32,
    pub interest_payment_grace_periods: u32,
    pub interest_charged_grace_periods: u32,
    pub in_arrears_tolerance: Option<Money>,
    pub days_in_year: DaysInYear,
}

impl LoanApplicationTerms {
    /// terms with no grace periods, no tolerance and a 365-day year
    #[allow(clippy::too_many_arguments)]
    pub fn standard(
        principal: Money,
        interest_rate_per_period: Rate,
        number_of_repayments: u32,
        repayment_every: u32,
        repayment_frequency_type: PeriodFrequencyType,
        interest_method: InterestMethod,
        amortization_method: AmortizationMethod,
        expected_disbursement_date: NaiveDate,
    ) -> Self {
        Self {
            principal,
            loan_term_frequency: number_of_repayments * repayment_every,
            loan_term_frequency_type: repayment_frequency_type,
            number_of_repayments,
            repayment_every,
            repayment_frequency_type,
            interest_rate_per_period,
            interest_method,
            amortization_method,
            expected_disbursement_date,
            principal_grace_periods: 0,
            interest_payment_grace_periods: 0,
            interest_charged_grace_periods: 0,
            in_arrears_tolerance: None,
            days_in_year: DaysInYear::Days365,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(EngineError::Validation {
                message: format!("principal must be positive, got {}", self.principal),
            });
        }
        if self.loan_term_frequency == 0 {
            return Err(EngineError::Validation {
                message: "loan term frequency must be greater than zero".to_string(),
            });
        }
        if self.number_of_repayments == 0 {
            return Err(EngineError::Validation {
                message: "number of repayments must be greater than zero".to_string(),
            });
        }
        if self.repayment_every == 0 {
            return Err(EngineError::Validation {
                message: "repayment interval must be greater than zero".to_string(),
            });
        }
        if self.interest_rate_per_period.is_negative() {
            return Err(EngineError::Validation {
                message: format!(
                    "interest rate must not be negative, got {}",
                    self.interest_rate_per_period
                ),
            });
        }
        if let Some(tolerance) = &self.in_arrears_tolerance {
            if tolerance.currency().code() != self.principal.currency().code() {
                return Err(EngineError::Validation {
                    message: format!(
                        "in-arrears tolerance currency {} does not match principal currency {}",
                        tolerance.currency(),
                        self.principal.currency()
                    ),
                });
            }
            if tolerance.is_negative() {
                return Err(EngineError::Validation {
                    message: "in-arrears tolerance must not be negative".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use rust_decimal_macros::dec;

    fn base_terms() -> LoanApplicationTerms {
        LoanApplicationTerms::standard(
            Money::of(Currency::of("USD").unwrap(), dec!(10000)),
            Rate::from_percent(dec!(1)),
            12,
            1,
            PeriodFrequencyType::Months,
            InterestMethod::DecliningBalance,
            AmortizationMethod::EqualInstallments,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_standard_terms_are_valid() {
        assert!(base_terms().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_principal() {
        let mut terms = base_terms();
        terms.principal = Money::zero(Currency::of("USD").unwrap());
        assert!(matches!(
            terms.validate(),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_counts() {
        let mut terms = base_terms();
        terms.number_of_repayments = 0;
        assert!(terms.validate().is_err());

        let mut terms = base_terms();
        terms.repayment_every = 0;
        assert!(terms.validate().is_err());

        let mut terms = base_terms();
        terms.loan_term_frequency = 0;
        assert!(terms.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_rate() {
        let mut terms = base_terms();
        terms.interest_rate_per_period = Rate::from_percent(dec!(-0.5));
        assert!(terms.validate().is_err());
    }

    #[test]
    fn test_rejects_foreign_currency_tolerance() {
        let mut terms = base_terms();
        terms.in_arrears_tolerance = Some(Money::of(Currency::of("EUR").unwrap(), dec!(5)));
        assert!(terms.validate().is_err());
    }
}
