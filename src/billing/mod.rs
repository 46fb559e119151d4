pub mod adapters;
pub mod models;
pub mod processor;
pub mod worker;

pub use adapters::{
    CreditCardCharger, CustomerHandle, CustomerSource, StaticCustomerSource,
};
pub use models::{
    AnnualSubscription, BillingPeriod, Customer, MonthlySubscription, Subscription, MAX_FAILURES,
};
pub use processor::BillingProcessor;
pub use worker::{start_billing_worker, BillingJob, BillingRunHandle};
