//! Recurring subscription model and billing calendar helpers.

use super::client::ClientSummary;
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How often a subscription is billed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Quarterly,
    Annual,
    Unrecognized(String),
}

impl BillingCycle {
    pub fn as_str(&self) -> &str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Annual => "annual",
            BillingCycle::Unrecognized(s) => s,
        }
    }

    /// Number of months covered by one billing period.
    pub fn months(&self) -> Option<u32> {
        match self {
            BillingCycle::Monthly => Some(1),
            BillingCycle::Quarterly => Some(3),
            BillingCycle::Annual => Some(12),
            BillingCycle::Unrecognized(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.months().is_some()
    }
}

impl From<&str> for BillingCycle {
    fn from(s: &str) -> Self {
        match s {
            "monthly" => BillingCycle::Monthly,
            "quarterly" => BillingCycle::Quarterly,
            "annual" => BillingCycle::Annual,
            _ => BillingCycle::Unrecognized(s.to_string()),
        }
    }
}

impl From<String> for BillingCycle {
    fn from(s: String) -> Self {
        BillingCycle::from(s.as_str())
    }
}

impl From<BillingCycle> for String {
    fn from(cycle: BillingCycle) -> Self {
        cycle.as_str().to_string()
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
    /// The relationship needs attention before it churns.
    AtRisk,
    Unrecognized(String),
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::AtRisk => "at_risk",
            SubscriptionStatus::Unrecognized(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, SubscriptionStatus::Unrecognized(_))
    }

    pub fn label(&self) -> &str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Paused => "Paused",
            SubscriptionStatus::Cancelled => "Cancelled",
            SubscriptionStatus::AtRisk => "At risk",
            SubscriptionStatus::Unrecognized(_) => "Unknown",
        }
    }
}

impl From<&str> for SubscriptionStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "paused" => SubscriptionStatus::Paused,
            "cancelled" => SubscriptionStatus::Cancelled,
            "at_risk" => SubscriptionStatus::AtRisk,
            _ => SubscriptionStatus::Unrecognized(s.to_string()),
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        SubscriptionStatus::from(s.as_str())
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_true() -> bool {
    true
}

/// A recurring service sold to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    #[serde(default)]
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    pub next_billing_date: NaiveDate,
    #[serde(default = "default_true")]
    pub auto_renew: bool,
    /// Opaque subscription reference at the payment provider.
    #[serde(default)]
    pub payment_ref: Option<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AsRef<Subscription> for Subscription {
    fn as_ref(&self) -> &Subscription {
        self
    }
}

/// A subscription row joined with its client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub client: Option<ClientSummary>,
}

impl SubscriptionView {
    pub fn client_name(&self) -> Option<&str> {
        self.client.as_ref().map(|c| c.name.as_str())
    }
}

impl AsRef<Subscription> for SubscriptionView {
    fn as_ref(&self) -> &Subscription {
        &self.subscription
    }
}

/// Fields required to create a new subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscription {
    pub client_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    pub next_billing_date: NaiveDate,
}

/// Fields that can be updated on an existing subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSubscription {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub billing_cycle: Option<BillingCycle>,
    pub status: Option<SubscriptionStatus>,
    pub next_billing_date: Option<NaiveDate>,
}

impl UpdateSubscription {
    pub fn is_empty(&self) -> bool {
        *self == UpdateSubscription::default()
    }

    pub fn apply(self, subscription: &mut Subscription) {
        if let Some(name) = self.name {
            subscription.name = name;
        }
        if let Some(description) = self.description {
            subscription.description = Some(description);
        }
        if let Some(amount) = self.amount {
            subscription.amount = amount;
        }
        if let Some(cycle) = self.billing_cycle {
            subscription.billing_cycle = cycle;
        }
        if let Some(status) = self.status {
            subscription.status = status;
        }
        if let Some(date) = self.next_billing_date {
            subscription.next_billing_date = date;
        }
    }
}

/// What the public signup page shows for a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicOffer {
    pub subscription_id: Uuid,
    pub agency_name: String,
    pub service_name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub billing_cycle: BillingCycle,
}

/// Details submitted on the public signup page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSignup {
    pub email: String,
    pub company_name: String,
    pub phone: Option<String>,
}

/// Outcome of a public signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupReceipt {
    pub subscription_id: Uuid,
    pub client_id: Uuid,
    /// False when an existing client with the same email was reused.
    pub client_created: bool,
    pub payment_ref: Option<String>,
}

/// First billing date after `start`, one full cycle later.
///
/// With `billing_day` set the result is moved to that day of the month.
/// Returns `None` for an unrecognized cycle or an out-of-range day.
pub fn next_billing_date(
    start: NaiveDate,
    cycle: &BillingCycle,
    billing_day: Option<u32>,
) -> Option<NaiveDate> {
    let next = start.checked_add_months(Months::new(cycle.months()?))?;
    match billing_day {
        Some(day) if (1..=28).contains(&day) => next.with_day(day),
        Some(_) => None,
        None => Some(next),
    }
}
