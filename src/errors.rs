use thiserror::Error;

use crate::prepayment::LoanStatus;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid loan terms: {message}")]
    Validation { message: String },

    #[error("calculation error: {message}")]
    Calculation { message: String },

    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("loan not active: current status is {status:?}")]
    LoanNotActive { status: LoanStatus },
}

pub type Result<T> = std::result::Result<T, EngineError>;
