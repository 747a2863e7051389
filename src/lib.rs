pub mod allocation;
pub mod errors;
pub mod money;
pub mod prepayment;
pub mod recalculation;
pub mod schedule;
pub mod terms;

// re-export key types
pub use allocation::{
    allocate, AllocationResult, AllocationRule, AllocationTotals, ComponentType,
    PaymentAllocationStrategy, PeriodAllocation,
};
pub use errors::{EngineError, Result};
pub use money::{Currency, Money, Rate};
pub use prepayment::{
    calculate_benefit, calculate_settlement, BenefitBreakdown, LoanId, LoanSnapshot, LoanStatus,
    SettlementBreakdown,
};
pub use recalculation::{
    recalculate, CompoundingMethod, InterestRecalculationConfig, RecalculationFrequency,
    RescheduleStrategy,
};
pub use schedule::{generate, LoanSchedule, PeriodComponent, PeriodType, SchedulePeriod};
pub use terms::{
    AmortizationMethod, DaysInYear, InterestMethod, LoanApplicationTerms, PeriodFrequencyType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
