use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BillingError {
    #[error("billing month must be between 1 and 12, got {month}")]
    MonthOutOfRange { month: u32 },
}

pub type BillingResult<T> = Result<T, BillingError>;
