use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};
use crate::money::{round_half_up, Money};
use crate::schedule::generator::annuity_installment;
use crate::schedule::{dates, LoanSchedule, SchedulePeriod};
use crate::terms::{InterestMethod, LoanApplicationTerms};

/// what gets compounded when interest is recalculated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundingMethod {
    None,
    Interest,
    Fee,
    InterestAndFee,
}

/// policy for rebuilding the future schedule after a mid-life event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RescheduleStrategy {
    /// keep the EMI, finish the loan in fewer installments
    ReduceNumberOfInstallments,
    /// keep the installment count, shrink the EMI
    ReduceEmiAmount,
    /// keep the per-period proportions, shift due dates forward
    RescheduleNextRepayments,
}

/// rest frequency for interest recalculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecalculationFrequency {
    Daily,
    Weekly,
    Monthly,
    SameAsRepayment,
}

impl RecalculationFrequency {
    /// resolve a configured name; unknown names fall back to monthly
    pub fn from_name(name: &str) -> Self {
        match name {
            "daily" => RecalculationFrequency::Daily,
            "weekly" => RecalculationFrequency::Weekly,
            "monthly" => RecalculationFrequency::Monthly,
            "same_as_repayment" => RecalculationFrequency::SameAsRepayment,
            other => {
                warn!("unknown recalculation frequency '{}', using monthly", other);
                RecalculationFrequency::Monthly
            }
        }
    }
}

/// product-level interest recalculation settings, read-only during recalculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRecalculationConfig {
    pub compounding_method: CompoundingMethod,
    pub reschedule_strategy: RescheduleStrategy,
    pub recalculation_frequency: RecalculationFrequency,
    pub frequency_interval: u32,
}

/// rebuild the future portion of a schedule after a mid-life transaction
///
/// the input schedule is never mutated; a new schedule is always returned
/// so the original stays available for comparison
pub fn recalculate(
    schedule: &LoanSchedule,
    terms: &LoanApplicationTerms,
    config: Option<&InterestRecalculationConfig>,
    transaction_date: NaiveDate,
    transaction_amount: &Money,
    is_payment: bool,
) -> Result<LoanSchedule> {
    let config = match config {
        Some(c) if c.compounding_method != CompoundingMethod::None => c,
        // recalculation is opt-in per loan product
        _ => return Ok(schedule.clone()),
    };

    if transaction_amount.currency().code() != schedule.currency.code() {
        return Err(EngineError::CurrencyMismatch {
            left: transaction_amount.currency().code().to_string(),
            right: schedule.currency.code().to_string(),
        });
    }

    debug!(
        "recalculating schedule via {:?} for {} on {}",
        config.reschedule_strategy, transaction_amount, transaction_date
    );

    // the disbursement period is always part of the past
    let mut past: Vec<SchedulePeriod> = Vec::new();
    let mut future: Vec<SchedulePeriod> = Vec::new();
    for period in &schedule.periods {
        if !period.is_repayment() || period.due_date <= transaction_date {
            past.push(period.clone());
        } else {
            future.push(period.clone());
        }
    }

    let mut outstanding = past
        .last()
        .map(|p| p.outstanding_loan_balance.amount())
        .unwrap_or_else(|| terms.principal.amount());
    if is_payment {
        // the full transaction amount is assumed to reduce principal first
        outstanding = (outstanding - transaction_amount.amount()).max(Decimal::ZERO);
    }

    let new_future = match config.reschedule_strategy {
        RescheduleStrategy::ReduceNumberOfInstallments => {
            reduce_number_of_installments(&future, terms, outstanding)?
        }
        RescheduleStrategy::ReduceEmiAmount => reduce_emi_amount(&future, terms, outstanding)?,
        RescheduleStrategy::RescheduleNextRepayments => {
            reschedule_next_repayments(&future, terms, outstanding, transaction_date)?
        }
    };

    let mut next_number = past.iter().filter(|p| p.is_repayment()).count() as u32 + 1;
    let mut periods = past;
    for mut period in new_future {
        period.period_number = next_number;
        next_number += 1;
        periods.push(period);
    }

    Ok(LoanSchedule::from_periods(
        schedule.currency.clone(),
        periods,
        schedule.loan_term_in_days,
    ))
}

fn round_period(value: Decimal) -> Decimal {
    round_half_up(value, 2)
}

/// keep the original EMI; amortize the new balance in as many of the
/// original future periods as it needs, dropping the rest
fn reduce_number_of_installments(
    future: &[SchedulePeriod],
    terms: &LoanApplicationTerms,
    outstanding: Decimal,
) -> Result<Vec<SchedulePeriod>> {
    if future.is_empty() || outstanding <= Decimal::ZERO {
        return Ok(Vec::new());
    }

    let currency = terms.principal.currency().clone();
    let rate = terms.interest_rate_per_period.as_fraction();
    let emi = future[0].total_due().amount();
    let original_principal_due = future[0].principal.due.amount();
    let original_interest_due = future[0].interest.due.amount();

    let mut rebuilt = Vec::new();
    let mut balance = outstanding;

    for (index, original) in future.iter().enumerate() {
        if balance <= Decimal::ZERO {
            break;
        }
        let is_last_available = index == future.len() - 1;

        let (principal_due, interest_due) = match terms.interest_method {
            InterestMethod::Flat => {
                let principal_due = if is_last_available {
                    balance
                } else {
                    original_principal_due.min(balance)
                };
                (principal_due, original_interest_due)
            }
            InterestMethod::DecliningBalance => {
                let interest = round_period(balance * rate);
                let unclamped = round_period(emi - interest);
                let principal_due = if is_last_available || unclamped > balance {
                    balance
                } else {
                    unclamped
                };
                (principal_due, interest)
            }
        };

        balance = (balance - principal_due).max(Decimal::ZERO);
        rebuilt.push(SchedulePeriod::repayment(
            original.period_number,
            original.from_date,
            original.due_date,
            Money::of(currency.clone(), principal_due),
            Money::of(currency.clone(), interest_due),
            Money::of(currency.clone(), balance),
        ));
    }

    Ok(rebuilt)
}

/// keep the original number of future periods; size a new EMI to amortize
/// the new balance across all of them
fn reduce_emi_amount(
    future: &[SchedulePeriod],
    terms: &LoanApplicationTerms,
    outstanding: Decimal,
) -> Result<Vec<SchedulePeriod>> {
    if future.is_empty() || outstanding <= Decimal::ZERO {
        return Ok(Vec::new());
    }

    let currency = terms.principal.currency().clone();
    let rate = terms.interest_rate_per_period.as_fraction();
    let count = future.len() as u32;
    let original_interest_due = future[0].interest.due.amount();

    let flat_principal = round_period(outstanding / Decimal::from(count));
    let emi = match terms.interest_method {
        InterestMethod::Flat => flat_principal + original_interest_due,
        InterestMethod::DecliningBalance => {
            Money::of(currency.clone(), annuity_installment(outstanding, rate, count)?).amount()
        }
    };

    let mut rebuilt = Vec::new();
    let mut balance = outstanding;

    for (index, original) in future.iter().enumerate() {
        let is_last = index == future.len() - 1;

        let (principal_due, interest_due) = match terms.interest_method {
            InterestMethod::Flat => {
                let principal_due = if is_last { balance } else { flat_principal };
                (principal_due, original_interest_due)
            }
            InterestMethod::DecliningBalance => {
                let interest = round_period(balance * rate);
                let unclamped = round_period(emi - interest);
                let principal_due = if is_last || unclamped > balance {
                    balance
                } else {
                    unclamped
                };
                (principal_due, interest)
            }
        };

        balance = (balance - principal_due).max(Decimal::ZERO);
        rebuilt.push(SchedulePeriod::repayment(
            original.period_number,
            original.from_date,
            original.due_date,
            Money::of(currency.clone(), principal_due),
            Money::of(currency.clone(), interest_due),
            Money::of(currency.clone(), balance),
        ));
    }

    Ok(rebuilt)
}

/// keep the first future period's principal/interest proportions, advance
/// due dates from the transaction date and recompute declining-balance
/// interest from actual day counts
fn reschedule_next_repayments(
    future: &[SchedulePeriod],
    terms: &LoanApplicationTerms,
    outstanding: Decimal,
    transaction_date: NaiveDate,
) -> Result<Vec<SchedulePeriod>> {
    if future.is_empty() || outstanding <= Decimal::ZERO {
        return Ok(Vec::new());
    }

    let first = &future[0];
    let total_due = first.total_due().amount();
    if total_due <= Decimal::ZERO {
        return Ok(Vec::new());
    }

    let currency = terms.principal.currency().clone();
    let rate = terms.interest_rate_per_period.as_fraction();
    let daily_rate = rate / Decimal::from(terms.days_in_year.basis());
    let principal_share = first.principal.due.amount() / total_due;
    let interest_share = first.interest.due.amount() / total_due;

    let mut rebuilt = Vec::new();
    let mut balance = outstanding;
    let mut cursor = transaction_date;

    for index in 0..future.len() {
        if balance <= Decimal::ZERO {
            break;
        }
        let from_date = cursor;
        let due_date = dates::advance(cursor, terms.repayment_frequency_type, terms.repayment_every)?;
        cursor = due_date;
        let is_last_available = index == future.len() - 1;

        let (principal_due, interest_due) = match terms.interest_method {
            InterestMethod::Flat => {
                let interest = round_period(total_due * interest_share);
                let unclamped = round_period(total_due * principal_share);
                let principal_due = if is_last_available || unclamped > balance {
                    balance
                } else {
                    unclamped
                };
                (principal_due, interest)
            }
            InterestMethod::DecliningBalance => {
                let days = Decimal::from((due_date - from_date).num_days());
                let interest = round_period(balance * daily_rate * days);
                let unclamped = round_period(total_due - interest);
                let principal_due = if is_last_available || unclamped > balance {
                    balance
                } else {
                    unclamped
                };
                (principal_due, interest)
            }
        };

        balance = (balance - principal_due).max(Decimal::ZERO);
        rebuilt.push(SchedulePeriod::repayment(
            0, // renumbered by the caller
            from_date,
            due_date,
            Money::of(currency.clone(), principal_due),
            Money::of(currency.clone(), interest_due),
            Money::of(currency.clone(), balance),
        ));
    }

    Ok(rebuilt)
}
