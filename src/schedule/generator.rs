use log::debug;
use rust_decimal::Decimal;

use crate::errors::{EngineError, Result};
use crate::money::{round_half_up, Money};
use crate::schedule::{dates, LoanSchedule, SchedulePeriod};
use crate::terms::{AmortizationMethod, InterestMethod, LoanApplicationTerms};

/// per-period principal and interest are stored at a fixed two decimal
/// places regardless of currency precision; downstream reconciliation
/// depends on this granularity
const PERIOD_AMOUNT_DP: u32 = 2;

fn round_period(value: Decimal) -> Decimal {
    round_half_up(value, PERIOD_AMOUNT_DP)
}

/// build the full amortization schedule for the given loan terms:
/// one disbursement period followed by `number_of_repayments` repayment
/// periods
pub fn generate(terms: &LoanApplicationTerms) -> Result<LoanSchedule> {
    terms.validate()?;

    debug!(
        "generating schedule: {} over {} repayments, {:?}/{:?}",
        terms.principal, terms.number_of_repayments, terms.interest_method, terms.amortization_method
    );

    let currency = terms.principal.currency().clone();
    let loan_term_in_days =
        dates::nominal_term_in_days(terms.loan_term_frequency, terms.loan_term_frequency_type);

    let mut periods = Vec::with_capacity(terms.number_of_repayments as usize + 1);
    periods.push(SchedulePeriod::disbursement(
        terms.expected_disbursement_date,
        terms.principal.clone(),
    ));

    let principal = terms.principal.amount();
    let rate = terms.interest_rate_per_period.as_fraction();
    let repayments = terms.number_of_repayments;
    let emi = equated_installment(terms)?;

    let mut cursor = terms.expected_disbursement_date;
    if terms.principal_grace_periods > 0 {
        cursor = dates::advance(
            cursor,
            terms.repayment_frequency_type,
            terms.principal_grace_periods * terms.repayment_every,
        )?;
    }

    let flat_principal = round_period(principal / Decimal::from(repayments));
    let flat_interest = round_period(principal * rate);

    let mut balance = principal;
    for number in 1..=repayments {
        let from_date = cursor;
        cursor = dates::advance(cursor, terms.repayment_frequency_type, terms.repayment_every)?;
        let is_final = number == repayments;

        let (principal_due, interest_due) = match terms.interest_method {
            InterestMethod::Flat => (flat_principal, flat_interest),
            InterestMethod::DecliningBalance => {
                let interest = round_period(balance * rate);
                let principal_due = match terms.amortization_method {
                    AmortizationMethod::EqualInstallments => {
                        let unclamped = round_period(emi.amount() - interest);
                        // final-period clamp avoids leaving a rounding residue
                        if is_final || unclamped > balance {
                            balance
                        } else {
                            unclamped
                        }
                    }
                    AmortizationMethod::EqualPrincipal => {
                        if is_final {
                            balance
                        } else {
                            flat_principal
                        }
                    }
                };
                (principal_due, interest)
            }
        };

        let interest_due = if number <= terms.interest_charged_grace_periods {
            Decimal::ZERO
        } else {
            interest_due
        };

        balance = (balance - principal_due).max(Decimal::ZERO);

        periods.push(SchedulePeriod::repayment(
            number,
            from_date,
            cursor,
            Money::of(currency.clone(), principal_due),
            Money::of(currency.clone(), interest_due),
            Money::of(currency.clone(), balance),
        ));
    }

    Ok(LoanSchedule::from_periods(
        currency,
        periods,
        loan_term_in_days,
    ))
}

/// equated installment for the loan terms, rounded to currency precision
///
/// flat: (P + P·r·n) / n; declining balance: P·r·(1+r)^n / ((1+r)^n − 1),
/// with EMI = P/n when the rate is zero
pub(crate) fn equated_installment(terms: &LoanApplicationTerms) -> Result<Money> {
    let currency = terms.principal.currency().clone();
    let principal = terms.principal.amount();
    let rate = terms.interest_rate_per_period.as_fraction();
    let n = terms.number_of_repayments;

    let amount = match terms.interest_method {
        InterestMethod::Flat => {
            (principal + principal * rate * Decimal::from(n)) / Decimal::from(n)
        }
        InterestMethod::DecliningBalance => annuity_installment(principal, rate, n)?,
    };

    Ok(Money::of(currency, amount))
}

/// standard annuity installment over `n` periods at periodic rate `rate`
pub(crate) fn annuity_installment(principal: Decimal, rate: Decimal, n: u32) -> Result<Decimal> {
    if n == 0 {
        return Err(EngineError::Calculation {
            message: "annuity term must be greater than zero".to_string(),
        });
    }
    if rate.is_zero() {
        return Ok(principal / Decimal::from(n));
    }

    let base = Decimal::ONE + rate;
    let mut compound = Decimal::ONE;
    for _ in 0..n {
        compound *= base;
    }

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(EngineError::Calculation {
            message: format!("annuity denominator vanished for rate {}", rate),
        });
    }

    Ok(principal * rate * compound / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Rate};
    use crate::terms::PeriodFrequencyType;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn usd() -> Currency {
        Currency::of("USD").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn declining_terms() -> LoanApplicationTerms {
        LoanApplicationTerms::standard(
            Money::of(usd(), dec!(12000)),
            Rate::from_percent(dec!(1)),
            12,
            1,
            PeriodFrequencyType::Months,
            InterestMethod::DecliningBalance,
            AmortizationMethod::EqualInstallments,
            date(2024, 1, 1),
        )
    }

    #[test]
    fn test_declining_balance_monthly_schedule() {
        let schedule = generate(&declining_terms()).unwrap();

        // disbursement plus twelve repayments
        assert_eq!(schedule.periods.len(), 13);
        assert_eq!(schedule.periods[0].principal_disbursed.amount(), dec!(12000));

        // 12000 at 1% per period over 12 periods
        let first = &schedule.periods[1];
        assert_eq!(first.interest.due.amount(), dec!(120.00));
        assert_eq!(first.principal.due.amount(), dec!(946.19));
        assert_eq!(first.outstanding_loan_balance.amount(), dec!(11053.81));
        assert_eq!(first.due_date, date(2024, 2, 1));

        // principal sums back to the disbursed amount
        assert_eq!(schedule.total_principal.amount(), dec!(12000));

        // balance is non-increasing and ends at zero
        let mut previous = dec!(12000);
        for period in schedule.repayment_periods() {
            assert!(period.outstanding_loan_balance.amount() <= previous);
            previous = period.outstanding_loan_balance.amount();
        }
        assert_eq!(previous, Decimal::ZERO);
    }

    #[test]
    fn test_emi_satisfies_annuity_identity() {
        let principal = dec!(12000);
        let rate = dec!(0.01);
        let emi = annuity_installment(principal, rate, 12).unwrap();

        let mut compound = Decimal::ONE;
        for _ in 0..12 {
            compound *= Decimal::ONE + rate;
        }
        let lhs = emi * (compound - Decimal::ONE);
        let rhs = principal * rate * compound;
        assert!((lhs - rhs).abs() < dec!(0.000001));

        // rounded to currency precision this is the well-known 1066.19
        assert_eq!(round_half_up(emi, 2), dec!(1066.19));
    }

    #[test]
    fn test_zero_rate_emi_is_principal_over_n() {
        assert_eq!(
            annuity_installment(dec!(1200), Decimal::ZERO, 12).unwrap(),
            dec!(100)
        );

        let mut terms = declining_terms();
        terms.interest_rate_per_period = Rate::ZERO;
        let schedule = generate(&terms).unwrap();
        assert_eq!(schedule.total_interest.amount(), Decimal::ZERO);
        assert_eq!(schedule.periods[1].principal.due.amount(), dec!(1000));
    }

    #[test]
    fn test_flat_schedule_constant_components() {
        let terms = LoanApplicationTerms::standard(
            Money::of(usd(), dec!(1200)),
            Rate::from_percent(dec!(2)),
            10,
            1,
            PeriodFrequencyType::Months,
            InterestMethod::Flat,
            AmortizationMethod::EqualInstallments,
            date(2024, 3, 15),
        );
        let schedule = generate(&terms).unwrap();

        // flat: principal 1200/10, interest 1200 x 2% every period
        for period in schedule.repayment_periods() {
            assert_eq!(period.principal.due.amount(), dec!(120.00));
            assert_eq!(period.interest.due.amount(), dec!(24.00));
        }
        assert_eq!(schedule.total_interest.amount(), dec!(240.00));
        assert_eq!(schedule.total_repayment_expected.amount(), dec!(1440.00));
    }

    #[test]
    fn test_equal_principal_declining_interest() {
        let terms = LoanApplicationTerms::standard(
            Money::of(usd(), dec!(1200)),
            Rate::from_percent(dec!(1)),
            12,
            1,
            PeriodFrequencyType::Months,
            InterestMethod::DecliningBalance,
            AmortizationMethod::EqualPrincipal,
            date(2024, 1, 1),
        );
        let schedule = generate(&terms).unwrap();

        let periods: Vec<_> = schedule.repayment_periods().collect();
        for period in &periods {
            assert_eq!(period.principal.due.amount(), dec!(100.00));
        }
        // interest declines with the balance
        for pair in periods.windows(2) {
            assert!(pair[1].interest.due.amount() < pair[0].interest.due.amount());
        }
        assert_eq!(periods[0].interest.due.amount(), dec!(12.00));
    }

    #[test]
    fn test_principal_grace_shifts_first_due_date() {
        let mut terms = declining_terms();
        terms.principal_grace_periods = 2;
        let schedule = generate(&terms).unwrap();

        // first due date moves out by the grace periods
        assert_eq!(schedule.periods[1].from_date, date(2024, 3, 1));
        assert_eq!(schedule.periods[1].due_date, date(2024, 4, 1));
    }

    #[test]
    fn test_interest_charged_grace_zeroes_early_interest() {
        let mut terms = declining_terms();
        terms.interest_charged_grace_periods = 2;
        let schedule = generate(&terms).unwrap();

        assert!(schedule.periods[1].interest.due.is_zero());
        assert!(schedule.periods[2].interest.due.is_zero());
        assert!(schedule.periods[3].interest.due.is_positive());
    }

    #[test]
    fn test_weekly_frequency_due_dates() {
        let terms = LoanApplicationTerms::standard(
            Money::of(usd(), dec!(500)),
            Rate::from_percent(dec!(1)),
            4,
            2,
            PeriodFrequencyType::Weeks,
            InterestMethod::Flat,
            AmortizationMethod::EqualInstallments,
            date(2024, 1, 1),
        );
        let schedule = generate(&terms).unwrap();
        assert_eq!(schedule.periods[1].due_date, date(2024, 1, 15));
        assert_eq!(schedule.periods[2].due_date, date(2024, 1, 29));
        assert_eq!(schedule.loan_term_in_days, 56);
    }

    #[test]
    fn test_invalid_terms_abort_generation() {
        let mut terms = declining_terms();
        terms.number_of_repayments = 0;
        assert!(generate(&terms).is_err());
    }
}
