pub mod dates;
pub mod generator;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::money::{Currency, Money};

pub use generator::generate;

/// period type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodType {
    Disbursement,
    Repayment,
}

/// one repayment component of a period: what was due at generation time,
/// what is currently due, and what has been paid or waived against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComponent {
    pub original_due: Money,
    pub due: Money,
    pub paid: Money,
    pub waived_or_written_off: Money,
}

impl PeriodComponent {
    pub fn new(due: Money) -> Self {
        let zero = Money::zero(due.currency().clone());
        Self {
            original_due: due.clone(),
            due,
            paid: zero.clone(),
            waived_or_written_off: zero,
        }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Money::zero(currency))
    }

    /// due − paid − waived, never negative
    pub fn outstanding(&self) -> Money {
        let amount =
            self.due.amount() - self.paid.amount() - self.waived_or_written_off.amount();
        Money::of(self.due.currency().clone(), amount.max(Decimal::ZERO))
    }

    /// apply a payment against this component, returning the portion consumed
    pub fn apply_payment(&mut self, amount: &Money) -> Result<Money> {
        let applied = amount.min_of(&self.outstanding())?;
        self.paid = self.paid.plus(&applied)?;
        Ok(applied)
    }

    /// waive part of this component, returning the portion consumed
    pub fn apply_waiver(&mut self, amount: &Money) -> Result<Money> {
        let applied = amount.min_of(&self.outstanding())?;
        self.waived_or_written_off = self.waived_or_written_off.plus(&applied)?;
        Ok(applied)
    }
}

/// one row of the amortization table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub period_number: u32,
    pub period_type: PeriodType,
    pub from_date: NaiveDate,
    pub due_date: NaiveDate,
    pub principal_disbursed: Money,
    pub principal: PeriodComponent,
    pub interest: PeriodComponent,
    pub fees: PeriodComponent,
    pub penalties: PeriodComponent,
    /// principal still outstanding after this period
    pub outstanding_loan_balance: Money,
}

impl SchedulePeriod {
    /// period 0 carrying the disbursed principal with zero due amounts
    pub fn disbursement(date: NaiveDate, principal: Money) -> Self {
        let currency = principal.currency().clone();
        Self {
            period_number: 0,
            period_type: PeriodType::Disbursement,
            from_date: date,
            due_date: date,
            outstanding_loan_balance: principal.clone(),
            principal_disbursed: principal,
            principal: PeriodComponent::zero(currency.clone()),
            interest: PeriodComponent::zero(currency.clone()),
            fees: PeriodComponent::zero(currency.clone()),
            penalties: PeriodComponent::zero(currency),
        }
    }

    pub fn repayment(
        period_number: u32,
        from_date: NaiveDate,
        due_date: NaiveDate,
        principal_due: Money,
        interest_due: Money,
        outstanding_loan_balance: Money,
    ) -> Self {
        let currency = principal_due.currency().clone();
        Self {
            period_number,
            period_type: PeriodType::Repayment,
            from_date,
            due_date,
            principal_disbursed: Money::zero(currency.clone()),
            principal: PeriodComponent::new(principal_due),
            interest: PeriodComponent::new(interest_due),
            fees: PeriodComponent::zero(currency.clone()),
            penalties: PeriodComponent::zero(currency),
            outstanding_loan_balance,
        }
    }

    pub fn is_repayment(&self) -> bool {
        self.period_type == PeriodType::Repayment
    }

    fn currency(&self) -> Currency {
        self.principal.due.currency().clone()
    }

    /// sum of all component due amounts
    pub fn total_due(&self) -> Money {
        let amount = self.principal.due.amount()
            + self.interest.due.amount()
            + self.fees.due.amount()
            + self.penalties.due.amount();
        Money::of(self.currency(), amount)
    }

    /// sum of all component outstanding amounts
    pub fn total_outstanding(&self) -> Money {
        let amount = self.principal.outstanding().amount()
            + self.interest.outstanding().amount()
            + self.fees.outstanding().amount()
            + self.penalties.outstanding().amount();
        Money::of(self.currency(), amount)
    }
}

/// full amortization schedule with totals derived from the repayment periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub currency: Currency,
    pub periods: Vec<SchedulePeriod>,
    pub loan_term_in_days: i64,
    pub total_principal: Money,
    pub total_interest: Money,
    pub total_fees: Money,
    pub total_penalties: Money,
    pub total_repayment_expected: Money,
    pub total_outstanding: Money,
}

impl LoanSchedule {
    /// the only constructor: totals are always recomputed from the
    /// repayment periods' original-due components
    pub fn from_periods(
        currency: Currency,
        periods: Vec<SchedulePeriod>,
        loan_term_in_days: i64,
    ) -> Self {
        let mut principal = Decimal::ZERO;
        let mut interest = Decimal::ZERO;
        let mut fees = Decimal::ZERO;
        let mut penalties = Decimal::ZERO;
        let mut outstanding = Decimal::ZERO;

        for period in periods.iter().filter(|p| p.is_repayment()) {
            principal += period.principal.original_due.amount();
            interest += period.interest.original_due.amount();
            fees += period.fees.original_due.amount();
            penalties += period.penalties.original_due.amount();
            outstanding += period.total_outstanding().amount();
        }

        Self {
            total_principal: Money::of(currency.clone(), principal),
            total_interest: Money::of(currency.clone(), interest),
            total_fees: Money::of(currency.clone(), fees),
            total_penalties: Money::of(currency.clone(), penalties),
            total_repayment_expected: Money::of(
                currency.clone(),
                principal + interest + fees + penalties,
            ),
            total_outstanding: Money::of(currency.clone(), outstanding),
            currency,
            periods,
            loan_term_in_days,
        }
    }

    pub fn repayment_periods(&self) -> impl Iterator<Item = &SchedulePeriod> {
        self.periods.iter().filter(|p| p.is_repayment())
    }

    /// due date of the last repayment period
    pub fn final_due_date(&self) -> Option<NaiveDate> {
        self.repayment_periods().map(|p| p.due_date).last()
    }
}
