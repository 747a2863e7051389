use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};
use crate::money::Money;
use crate::schedule::SchedulePeriod;

/// outstanding component a payment can be applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentType {
    Principal,
    Interest,
    Fees,
    Penalties,
}

/// ordered component list plus the due-date-first flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRule {
    pub order: [ComponentType; 4],
    pub due_date_ordering: bool,
}

/// the seven built-in payment allocation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentAllocationStrategy {
    #[default]
    PrincipalInterestPenaltiesFees,
    HeavinessPrincipalInterestPenaltiesFees,
    InterestPrincipalPenaltiesFees,
    PrincipalInterestFeesPenalties,
    DueDatePrincipalInterestPenaltiesFees,
    InterestPrincipalFeesPenaltiesOverdueDue,
    OverdueDueInterestPrincipalPenaltiesFees,
}

impl PaymentAllocationStrategy {
    /// resolve a strategy name; unknown names fall back to the default
    pub fn from_name(name: &str) -> Self {
        match name {
            "principal_interest_penalties_fees" => Self::PrincipalInterestPenaltiesFees,
            "heaviness_principal_interest_penalties_fees" => {
                Self::HeavinessPrincipalInterestPenaltiesFees
            }
            "interest_principal_penalties_fees" => Self::InterestPrincipalPenaltiesFees,
            "principal_interest_fees_penalties" => Self::PrincipalInterestFeesPenalties,
            "due_date_principal_interest_penalties_fees" => {
                Self::DueDatePrincipalInterestPenaltiesFees
            }
            "interest_principal_fees_penalties_overdue_due" => {
                Self::InterestPrincipalFeesPenaltiesOverdueDue
            }
            "overdue_due_interest_principal_penalties_fees" => {
                Self::OverdueDueInterestPrincipalPenaltiesFees
            }
            other => {
                warn!("unknown allocation strategy '{}', using default", other);
                Self::default()
            }
        }
    }

    /// the data-driven rule behind each strategy
    pub fn rule(&self) -> AllocationRule {
        use ComponentType::*;
        match self {
            Self::PrincipalInterestPenaltiesFees | Self::HeavinessPrincipalInterestPenaltiesFees => {
                AllocationRule {
                    order: [Principal, Interest, Penalties, Fees],
                    due_date_ordering: false,
                }
            }
            Self::InterestPrincipalPenaltiesFees => AllocationRule {
                order: [Interest, Principal, Penalties, Fees],
                due_date_ordering: false,
            },
            Self::PrincipalInterestFeesPenalties => AllocationRule {
                order: [Principal, Interest, Fees, Penalties],
                due_date_ordering: false,
            },
            Self::DueDatePrincipalInterestPenaltiesFees => AllocationRule {
                order: [Principal, Interest, Penalties, Fees],
                due_date_ordering: true,
            },
            Self::InterestPrincipalFeesPenaltiesOverdueDue => AllocationRule {
                order: [Interest, Principal, Fees, Penalties],
                due_date_ordering: true,
            },
            Self::OverdueDueInterestPrincipalPenaltiesFees => AllocationRule {
                order: [Interest, Principal, Penalties, Fees],
                due_date_ordering: true,
            },
        }
    }
}

/// what one period received from a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAllocation {
    pub period_number: u32,
    pub due_date: NaiveDate,
    pub to_principal: Money,
    pub to_interest: Money,
    pub to_fees: Money,
    pub to_penalties: Money,
}

impl PeriodAllocation {
    pub fn total(&self) -> Money {
        let amount = self.to_principal.amount()
            + self.to_interest.amount()
            + self.to_fees.amount()
            + self.to_penalties.amount();
        Money::of(self.to_principal.currency().clone(), amount)
    }
}

/// strategy-level component totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTotals {
    pub to_principal: Money,
    pub to_interest: Money,
    pub to_fees: Money,
    pub to_penalties: Money,
}

impl AllocationTotals {
    fn zero(currency: crate::money::Currency) -> Self {
        Self {
            to_principal: Money::zero(currency.clone()),
            to_interest: Money::zero(currency.clone()),
            to_fees: Money::zero(currency.clone()),
            to_penalties: Money::zero(currency),
        }
    }

    pub fn total_allocated(&self) -> Money {
        let amount = self.to_principal.amount()
            + self.to_interest.amount()
            + self.to_fees.amount()
            + self.to_penalties.amount();
        Money::of(self.to_principal.currency().clone(), amount)
    }
}

/// allocation plan for one payment; applying it to stored balances is the
/// caller's job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub strategy: PaymentAllocationStrategy,
    pub per_period: Vec<PeriodAllocation>,
    pub totals: AllocationTotals,
    /// amount left after every outstanding component is covered; a positive
    /// value is an overpayment, not an error
    pub unallocated: Money,
}

/// allocate a payment across the outstanding periods per the strategy's
/// ordered rule; pure, never mutates the input periods
pub fn allocate(
    payment: &Money,
    strategy: PaymentAllocationStrategy,
    periods: &[SchedulePeriod],
) -> Result<AllocationResult> {
    if payment.is_negative() {
        return Err(EngineError::Validation {
            message: format!("payment amount must not be negative, got {}", payment),
        });
    }
    for period in periods {
        if period.principal.due.currency().code() != payment.currency().code() {
            return Err(EngineError::CurrencyMismatch {
                left: payment.currency().code().to_string(),
                right: period.principal.due.currency().code().to_string(),
            });
        }
    }

    let rule = strategy.rule();
    debug!(
        "allocating {} via {:?} across {} periods",
        payment,
        strategy,
        periods.len()
    );

    let currency = payment.currency().clone();
    let mut ordered: Vec<&SchedulePeriod> = periods.iter().collect();
    if rule.due_date_ordering {
        ordered.sort_by_key(|p| p.due_date);
    }

    let mut remaining = payment.amount();
    let mut per_period = Vec::new();
    let mut totals = AllocationTotals::zero(currency.clone());

    for period in ordered {
        if remaining <= Decimal::ZERO {
            break;
        }
        if !period.total_outstanding().is_positive() {
            continue;
        }

        let mut row = PeriodAllocation {
            period_number: period.period_number,
            due_date: period.due_date,
            to_principal: Money::zero(currency.clone()),
            to_interest: Money::zero(currency.clone()),
            to_fees: Money::zero(currency.clone()),
            to_penalties: Money::zero(currency.clone()),
        };

        for component in rule.order {
            if remaining <= Decimal::ZERO {
                break;
            }
            let outstanding = match component {
                ComponentType::Principal => period.principal.outstanding(),
                ComponentType::Interest => period.interest.outstanding(),
                ComponentType::Fees => period.fees.outstanding(),
                ComponentType::Penalties => period.penalties.outstanding(),
            };
            if !outstanding.is_positive() {
                continue;
            }

            let applied = remaining.min(outstanding.amount());
            remaining -= applied;
            let applied = Money::of(currency.clone(), applied);
            match component {
                ComponentType::Principal => {
                    row.to_principal = row.to_principal.plus(&applied)?;
                    totals.to_principal = totals.to_principal.plus(&applied)?;
                }
                ComponentType::Interest => {
                    row.to_interest = row.to_interest.plus(&applied)?;
                    totals.to_interest = totals.to_interest.plus(&applied)?;
                }
                ComponentType::Fees => {
                    row.to_fees = row.to_fees.plus(&applied)?;
                    totals.to_fees = totals.to_fees.plus(&applied)?;
                }
                ComponentType::Penalties => {
                    row.to_penalties = row.to_penalties.plus(&applied)?;
                    totals.to_penalties = totals.to_penalties.plus(&applied)?;
                }
            }
        }

        if row.total().is_positive() {
            per_period.push(row);
        }
    }

    Ok(AllocationResult {
        strategy,
        per_period,
        totals,
        unallocated: Money::of(currency, remaining),
    })
}
