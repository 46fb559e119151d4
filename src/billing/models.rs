use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};

/// Consecutive failed charges tolerated before a monthly subscription is
/// cancelled.
pub const MAX_FAILURES: u32 = 3;

/// key: billing-period -> ordinal year/month pair
///
/// Periods compare ordinally (year first, then month), not as calendar
/// dates. That keeps the paid-through check below a plain field
/// comparison at the cost of a known looseness documented there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> BillingResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(BillingError::MonthOutOfRange { month });
        }
        Ok(Self { year, month })
    }

    /// The period containing the current wall-clock instant.
    pub fn current() -> Self {
        let now = Utc::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }
}

/// key: billing-customer -> optional subscription owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub subscription: Option<Subscription>,
}

impl Customer {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            subscription: None,
        }
    }

    pub fn with_subscription(subscription: Subscription) -> Self {
        Self {
            subscription: Some(subscription),
            ..Self::new()
        }
    }
}

impl Default for Customer {
    fn default() -> Self {
        Self::new()
    }
}

/// key: billing-subscription -> monthly/annual variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subscription {
    Monthly(MonthlySubscription),
    Annual(AnnualSubscription),
}

impl Subscription {
    pub fn is_current(&self) -> bool {
        match self {
            Subscription::Monthly(monthly) => monthly.is_current(),
            Subscription::Annual(annual) => annual.is_current(),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Subscription::Monthly(_))
    }

    pub fn needs_billing(&self, period: BillingPeriod) -> bool {
        match self {
            Subscription::Monthly(monthly) => monthly.needs_billing(period),
            Subscription::Annual(annual) => annual.needs_billing(period),
        }
    }

    pub fn record_charged_result(&mut self, charged: bool, max_failures: u32) {
        if let Subscription::Monthly(monthly) = self {
            monthly.record_charged_result(charged, max_failures);
        }
    }
}

/// key: billing-subscription-monthly -> recurring plan with dunning state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySubscription {
    pub paid_through_year: i32,
    pub paid_through_month: u32,
    pub failure_count: u32,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl MonthlySubscription {
    /// A subscription that has never been paid; due on the next pass.
    pub fn new() -> Self {
        Self::paid_through(0, 0)
    }

    pub fn paid_through(year: i32, month: u32) -> Self {
        Self {
            paid_through_year: year,
            paid_through_month: month,
            failure_count: 0,
            canceled_at: None,
        }
    }

    pub fn is_current(&self) -> bool {
        self.canceled_at.is_none()
    }

    /// Ordinal comparison, not a calendar diff: a customer paid through
    /// December of year Y reads as current for every month of year Y+1.
    /// Preserved deliberately.
    pub fn needs_billing(&self, period: BillingPeriod) -> bool {
        self.paid_through_year <= period.year && self.paid_through_month < period.month
    }

    /// Feed one charge outcome into the dunning state machine. Success
    /// clears the failure streak and advances the paid-through date by
    /// one period; the `max_failures`-th consecutive failure cancels the
    /// subscription. Cancellation is terminal.
    pub fn record_charged_result(&mut self, charged: bool, max_failures: u32) {
        if charged {
            self.failure_count = 0;
            self.advance_paid_through();
            return;
        }

        self.failure_count += 1;
        if self.failure_count >= max_failures && self.canceled_at.is_none() {
            self.canceled_at = Some(Utc::now());
        }
    }

    fn advance_paid_through(&mut self) {
        if self.paid_through_month >= 12 {
            self.paid_through_year += 1;
            self.paid_through_month = 1;
        } else {
            self.paid_through_month += 1;
        }
    }
}

impl Default for MonthlySubscription {
    fn default() -> Self {
        Self::new()
    }
}

/// key: billing-subscription-annual -> paid up front, never re-billed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnualSubscription {
    pub paid_through_year: i32,
}

impl AnnualSubscription {
    pub fn paid_through(year: i32) -> Self {
        Self {
            paid_through_year: year,
        }
    }

    pub fn is_current(&self) -> bool {
        true
    }

    pub fn needs_billing(&self, _period: BillingPeriod) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_rejects_out_of_range_month() {
        let err = BillingPeriod::new(2011, 13).expect_err("month 13 should be rejected");
        assert_eq!(err, BillingError::MonthOutOfRange { month: 13 });
        assert!(BillingPeriod::new(2011, 0).is_err());
        assert!(BillingPeriod::new(2011, 8).is_ok());
    }

    #[test]
    fn current_period_is_always_a_valid_month() {
        let period = BillingPeriod::current();
        assert!((1..=12).contains(&period.month));
    }

    #[test]
    fn unpaid_monthly_subscription_needs_billing() {
        let subscription = MonthlySubscription::new();
        let period = BillingPeriod::new(2011, 8).unwrap();
        assert!(subscription.needs_billing(period));
    }

    #[test]
    fn subscription_paid_through_period_does_not_need_billing() {
        let subscription = MonthlySubscription::paid_through(2011, 8);
        let period = BillingPeriod::new(2011, 8).unwrap();
        assert!(!subscription.needs_billing(period));
    }

    #[test]
    fn subscription_paid_through_next_year_does_not_need_billing() {
        let subscription = MonthlySubscription::paid_through(2012, 8);
        let period = BillingPeriod::new(2011, 8).unwrap();
        assert!(!subscription.needs_billing(period));
    }

    #[test]
    fn december_paid_through_reads_current_for_following_year() {
        // The preserved ordinal looseness.
        let subscription = MonthlySubscription::paid_through(2011, 12);
        let period = BillingPeriod::new(2012, 8).unwrap();
        assert!(!subscription.needs_billing(period));
    }

    #[test]
    fn failures_below_limit_leave_subscription_current() {
        let mut subscription = MonthlySubscription::new();
        for _ in 0..MAX_FAILURES - 1 {
            subscription.record_charged_result(false, MAX_FAILURES);
        }
        assert!(subscription.is_current());
        assert_eq!(subscription.failure_count, MAX_FAILURES - 1);
    }

    #[test]
    fn reaching_max_failures_cancels_subscription() {
        let mut subscription = MonthlySubscription::new();
        for _ in 0..MAX_FAILURES {
            subscription.record_charged_result(false, MAX_FAILURES);
        }
        assert!(!subscription.is_current());
        assert!(subscription.canceled_at.is_some());
    }

    #[test]
    fn successful_charge_clears_failures_and_advances_paid_through() {
        let mut subscription = MonthlySubscription::paid_through(2011, 7);
        subscription.failure_count = 2;

        subscription.record_charged_result(true, MAX_FAILURES);

        assert!(subscription.is_current());
        assert_eq!(subscription.failure_count, 0);
        assert_eq!(subscription.paid_through_year, 2011);
        assert_eq!(subscription.paid_through_month, 8);
    }

    #[test]
    fn paid_through_wraps_december_into_next_year() {
        let mut subscription = MonthlySubscription::paid_through(2011, 12);
        subscription.record_charged_result(true, MAX_FAILURES);
        assert_eq!(subscription.paid_through_year, 2012);
        assert_eq!(subscription.paid_through_month, 1);
    }

    #[test]
    fn annual_subscription_is_current_and_never_due() {
        let subscription = Subscription::Annual(AnnualSubscription::paid_through(2011));
        let period = BillingPeriod::new(2011, 8).unwrap();
        assert!(subscription.is_current());
        assert!(!subscription.is_recurring());
        assert!(!subscription.needs_billing(period));
    }

    #[test]
    fn recording_results_on_annual_subscription_is_a_no_op() {
        let mut subscription = Subscription::Annual(AnnualSubscription::paid_through(2011));
        for _ in 0..MAX_FAILURES {
            subscription.record_charged_result(false, MAX_FAILURES);
        }
        assert!(subscription.is_current());
    }

    #[test]
    fn subscription_serializes_with_kind_tag() {
        let subscription = Subscription::Monthly(MonthlySubscription::paid_through(2011, 8));
        let value = serde_json::to_value(&subscription).unwrap();
        assert_eq!(value["kind"], "monthly");
        assert_eq!(value["paid_through_year"], 2011);
        assert_eq!(value["paid_through_month"], 8);
        assert_eq!(value["failure_count"], 0);
    }
}
