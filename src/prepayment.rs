use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{EngineError, Result};
use crate::money::{Money, Rate};
use crate::schedule::generate;
use crate::terms::{InterestMethod, LoanApplicationTerms};

pub type LoanId = Uuid;

/// loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Pending,
    Active,
    Closed,
    Overpaid,
    WrittenOff,
}

/// point-in-time view of a loan, as loaded by the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub id: LoanId,
    pub status: LoanStatus,
    pub terms: LoanApplicationTerms,
    pub outstanding_principal: Money,
    pub outstanding_interest: Money,
    pub outstanding_fees: Money,
    pub outstanding_penalties: Money,
    pub interest_paid_to_date: Money,
    pub annual_interest_rate: Rate,
    pub last_accrual_date: Option<NaiveDate>,
    pub early_repayment_penalty_rate: Option<Rate>,
}

/// full early-settlement quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementBreakdown {
    pub loan_id: LoanId,
    pub settlement_date: NaiveDate,
    pub outstanding_principal: Money,
    pub outstanding_interest: Money,
    pub outstanding_fees: Money,
    pub outstanding_penalties: Money,
    /// interest accrued between the last accrual and the settlement date
    pub unaccrued_interest: Money,
    pub early_repayment_penalty: Money,
    pub total_settlement_amount: Money,
    /// shortfall when a proposed payment does not cover the total
    pub additional_principal_required: Money,
}

/// projected savings from settling early, diffed against the original schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitBreakdown {
    pub loan_id: LoanId,
    pub as_of_date: NaiveDate,
    pub original_total_interest: Money,
    pub interest_savings: Money,
    pub days_saved: i64,
    pub remaining_periods: u32,
}

fn ensure_active(loan: &LoanSnapshot) -> Result<()> {
    if loan.status != LoanStatus::Active {
        return Err(EngineError::LoanNotActive {
            status: loan.status,
        });
    }
    Ok(())
}

/// compute the amount required to fully close the loan on `on_date`
pub fn calculate_settlement(
    loan: &LoanSnapshot,
    on_date: NaiveDate,
    proposed_amount: Option<&Money>,
    include_early_penalty: bool,
) -> Result<SettlementBreakdown> {
    ensure_active(loan)?;

    let currency = loan.outstanding_principal.currency().clone();

    // accrual may lag the settlement date for declining-balance loans
    let mut unaccrued_interest = Money::zero(currency.clone());
    if loan.terms.interest_method == InterestMethod::DecliningBalance {
        if let Some(last_accrual) = loan.last_accrual_date {
            let days = (on_date - last_accrual).num_days();
            if days > 0 {
                let daily_rate = loan.annual_interest_rate.as_fraction() / Decimal::from(365);
                unaccrued_interest = Money::of(
                    currency.clone(),
                    loan.outstanding_principal.amount() * daily_rate * Decimal::from(days),
                );
            }
        }
    }

    let early_repayment_penalty = match (include_early_penalty, loan.early_repayment_penalty_rate)
    {
        (true, Some(penalty_rate)) => loan
            .outstanding_principal
            .multiplied_by(penalty_rate.as_fraction()),
        _ => Money::zero(currency.clone()),
    };

    let total_settlement_amount = loan
        .outstanding_principal
        .plus(&loan.outstanding_interest)?
        .plus(&loan.outstanding_fees)?
        .plus(&loan.outstanding_penalties)?
        .plus(&unaccrued_interest)?
        .plus(&early_repayment_penalty)?;

    let additional_principal_required = match proposed_amount {
        Some(proposed) if proposed.is_less_than(&total_settlement_amount)? => {
            total_settlement_amount.minus(proposed)?
        }
        _ => Money::zero(currency),
    };

    debug!(
        "settlement for loan {} on {}: total {}",
        loan.id, on_date, total_settlement_amount
    );

    Ok(SettlementBreakdown {
        loan_id: loan.id,
        settlement_date: on_date,
        outstanding_principal: loan.outstanding_principal.clone(),
        outstanding_interest: loan.outstanding_interest.clone(),
        outstanding_fees: loan.outstanding_fees.clone(),
        outstanding_penalties: loan.outstanding_penalties.clone(),
        unaccrued_interest,
        early_repayment_penalty,
        total_settlement_amount,
        additional_principal_required,
    })
}

/// project the interest and time saved by settling on `on_date` instead of
/// running the loan to maturity
pub fn calculate_benefit(loan: &LoanSnapshot, on_date: NaiveDate) -> Result<BenefitBreakdown> {
    ensure_active(loan)?;

    // rebuild the contractual schedule from the stored terms
    let original = generate(&loan.terms)?;
    let settlement = calculate_settlement(loan, on_date, None, false)?;

    let remaining_interest = settlement
        .outstanding_interest
        .plus(&settlement.unaccrued_interest)?;
    let savings_amount = original.total_interest.amount()
        - loan.interest_paid_to_date.amount()
        - remaining_interest.amount();
    let interest_savings = Money::of(
        original.currency.clone(),
        savings_amount.max(Decimal::ZERO),
    );

    let days_saved = original
        .final_due_date()
        .map(|final_due| (final_due - on_date).num_days().max(0))
        .unwrap_or(0);

    let remaining_periods = original
        .repayment_periods()
        .filter(|p| p.due_date > on_date)
        .count() as u32;

    Ok(BenefitBreakdown {
        loan_id: loan.id,
        as_of_date: on_date,
        original_total_interest: original.total_interest,
        interest_savings,
        days_saved,
        remaining_periods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use crate::terms::{AmortizationMethod, PeriodFrequencyType};
    use rust_decimal_macros::dec;

    fn usd() -> Currency {
        Currency::of("USD").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn active_loan() -> LoanSnapshot {
        let terms = LoanApplicationTerms::standard(
            Money::of(usd(), dec!(12000)),
            Rate::from_percent(dec!(1)),
            12,
            1,
            PeriodFrequencyType::Months,
            InterestMethod::DecliningBalance,
            AmortizationMethod::EqualInstallments,
            date(2024, 1, 1),
        );
        LoanSnapshot {
            id: Uuid::new_v4(),
            status: LoanStatus::Active,
            terms,
            outstanding_principal: Money::of(usd(), dec!(9132.95)),
            outstanding_interest: Money::zero(usd()),
            outstanding_fees: Money::zero(usd()),
            outstanding_penalties: Money::zero(usd()),
            interest_paid_to_date: Money::of(usd(), dec!(331.52)),
            annual_interest_rate: Rate::from_percent(dec!(12)),
            last_accrual_date: Some(date(2024, 4, 1)),
            early_repayment_penalty_rate: None,
        }
    }

    #[test]
    fn test_settlement_on_clean_loan_equals_principal() {
        let mut loan = active_loan();
        loan.last_accrual_date = Some(date(2024, 4, 15));

        let settlement =
            calculate_settlement(&loan, date(2024, 4, 15), None, false).unwrap();
        assert_eq!(
            settlement.total_settlement_amount,
            loan.outstanding_principal
        );
        assert!(settlement.unaccrued_interest.is_zero());
        assert!(settlement.early_repayment_penalty.is_zero());
        assert!(settlement.additional_principal_required.is_zero());
    }

    #[test]
    fn test_settlement_adds_unaccrued_interest() {
        let loan = active_loan();

        // 14 days of accrual lag at 12% annual on 9132.95
        let settlement =
            calculate_settlement(&loan, date(2024, 4, 15), None, false).unwrap();
        let expected = Money::of(
            usd(),
            dec!(9132.95) * dec!(0.12) / dec!(365) * dec!(14),
        );
        assert_eq!(settlement.unaccrued_interest, expected);
        assert_eq!(
            settlement.total_settlement_amount,
            loan.outstanding_principal.plus(&expected).unwrap()
        );
    }

    #[test]
    fn test_flat_loan_accrues_no_catchup_interest() {
        let mut loan = active_loan();
        loan.terms.interest_method = InterestMethod::Flat;

        let settlement =
            calculate_settlement(&loan, date(2024, 4, 15), None, false).unwrap();
        assert!(settlement.unaccrued_interest.is_zero());
    }

    #[test]
    fn test_early_repayment_penalty_applied_on_request() {
        let mut loan = active_loan();
        loan.last_accrual_date = Some(date(2024, 4, 15));
        loan.early_repayment_penalty_rate = Some(Rate::from_percent(dec!(2)));

        let with_penalty =
            calculate_settlement(&loan, date(2024, 4, 15), None, true).unwrap();
        assert_eq!(
            with_penalty.early_repayment_penalty.amount(),
            dec!(182.66) // 2% of 9132.95
        );

        let without_penalty =
            calculate_settlement(&loan, date(2024, 4, 15), None, false).unwrap();
        assert!(without_penalty.early_repayment_penalty.is_zero());
    }

    #[test]
    fn test_proposed_amount_shortfall_reported() {
        let mut loan = active_loan();
        loan.last_accrual_date = Some(date(2024, 4, 15));

        let proposed = Money::of(usd(), dec!(9000));
        let settlement =
            calculate_settlement(&loan, date(2024, 4, 15), Some(&proposed), false).unwrap();
        assert_eq!(
            settlement.additional_principal_required.amount(),
            dec!(132.95)
        );

        let generous = Money::of(usd(), dec!(10000));
        let settlement =
            calculate_settlement(&loan, date(2024, 4, 15), Some(&generous), false).unwrap();
        assert!(settlement.additional_principal_required.is_zero());
    }

    #[test]
    fn test_non_active_loan_is_rejected() {
        for status in [
            LoanStatus::Pending,
            LoanStatus::Closed,
            LoanStatus::Overpaid,
            LoanStatus::WrittenOff,
        ] {
            let mut loan = active_loan();
            loan.status = status;
            assert!(matches!(
                calculate_settlement(&loan, date(2024, 4, 15), None, false),
                Err(EngineError::LoanNotActive { .. })
            ));
            assert!(matches!(
                calculate_benefit(&loan, date(2024, 4, 15)),
                Err(EngineError::LoanNotActive { .. })
            ));
        }
    }

    #[test]
    fn test_benefit_reports_savings_and_remaining_periods() {
        let mut loan = active_loan();
        loan.last_accrual_date = Some(date(2024, 4, 15));

        let benefit = calculate_benefit(&loan, date(2024, 4, 15)).unwrap();

        // settling after period 3 skips the interest of the remaining nine
        let expected_savings = benefit.original_total_interest.amount()
            - loan.interest_paid_to_date.amount();
        assert_eq!(benefit.interest_savings.amount(), expected_savings);
        assert!(benefit.interest_savings.is_positive());

        // original maturity is 2025-01-01
        assert_eq!(benefit.days_saved, 261);
        assert_eq!(benefit.remaining_periods, 9);
    }

    #[test]
    fn test_savings_floored_at_zero() {
        let mut loan = active_loan();
        loan.last_accrual_date = Some(date(2024, 4, 15));
        loan.interest_paid_to_date = Money::of(usd(), dec!(99999));

        let benefit = calculate_benefit(&loan, date(2024, 4, 15)).unwrap();
        assert!(benefit.interest_savings.is_zero());
    }
}
