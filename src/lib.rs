pub mod billing;
pub mod error;

mod config;

pub use config::BILLING_MAX_CHARGE_FAILURES;
