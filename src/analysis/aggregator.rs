//! Dashboard metrics and revenue aggregation.
//!
//! Every function here is a pure function of its arguments. Rows the
//! functions cannot interpret (an unrecognized billing cycle, a negative
//! amount) are left out of the result instead of failing, so one bad row
//! never takes the dashboard down.

use crate::models::{
    Client, ClientStatus, JournalEntry, Subscription, SubscriptionStatus, ValueType,
};
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The headline numbers shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Monthly recurring revenue of active subscriptions.
    pub mrr: Decimal,
    pub active_clients: usize,
    pub at_risk_subscriptions: usize,
    pub new_clients_this_month: usize,
}

/// Compute all dashboard metrics from one snapshot of a tenant's data.
///
/// `now` fixes both the current month and its time zone; pass
/// `chrono::Local::now()` for the caller's calendar.
pub fn compute_metrics<S, Tz>(
    clients: &[Client],
    subscriptions: &[S],
    now: &DateTime<Tz>,
) -> Metrics
where
    S: AsRef<Subscription>,
    Tz: TimeZone,
{
    Metrics {
        mrr: monthly_recurring_revenue(subscriptions),
        active_clients: count_active_clients(clients),
        at_risk_subscriptions: count_at_risk(subscriptions),
        new_clients_this_month: count_new_clients_this_month(clients, now),
    }
}

/// The amount one subscription contributes per month, whatever its status.
pub fn normalized_monthly_amount(subscription: &Subscription) -> Option<Decimal> {
    let months = subscription.billing_cycle.months()?;
    if subscription.amount.is_sign_negative() {
        return None;
    }
    Some(subscription.amount / Decimal::from(months))
}

/// Sum of normalized monthly amounts over active subscriptions.
///
/// Amounts are summed per billing period first and divided once per period,
/// so three quarterly subscriptions of 100 contribute exactly 100.
pub fn monthly_recurring_revenue<S: AsRef<Subscription>>(subscriptions: &[S]) -> Decimal {
    let mut by_period: BTreeMap<u32, Decimal> = BTreeMap::new();

    for subscription in subscriptions.iter().map(AsRef::as_ref) {
        if subscription.status != SubscriptionStatus::Active
            || subscription.amount.is_sign_negative()
        {
            continue;
        }
        let Some(months) = subscription.billing_cycle.months() else {
            continue;
        };
        let total = by_period.entry(months).or_insert(Decimal::ZERO);
        *total = total.saturating_add(subscription.amount);
    }

    by_period
        .into_iter()
        .map(|(months, total)| total / Decimal::from(months))
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Clients whose status is exactly `active`.
pub fn count_active_clients(clients: &[Client]) -> usize {
    clients
        .iter()
        .filter(|c| c.status == ClientStatus::Active)
        .count()
}

/// Subscriptions flagged `at_risk`.
pub fn count_at_risk<S: AsRef<Subscription>>(subscriptions: &[S]) -> usize {
    subscriptions
        .iter()
        .filter(|s| s.as_ref().status == SubscriptionStatus::AtRisk)
        .count()
}

/// First instant of the month containing `now`, in `now`'s time zone.
///
/// When local midnight on the 1st is skipped by a clock change, the month
/// starts at the first local time that exists.
pub fn start_of_month<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let first = now.date_naive().with_day(1)?.and_hms_opt(0, 0, 0)?;
    let tz = now.timezone();
    first_existing_instant(first, |local| tz.from_local_datetime(local))
}

/// Resolve `local`, stepping forward a quarter hour at a time through a gap.
/// Gives up after one day.
fn first_existing_instant<T, F>(local: NaiveDateTime, resolve: F) -> Option<T>
where
    F: Fn(&NaiveDateTime) -> LocalResult<T>,
{
    let step = Duration::minutes(15);
    let mut candidate = local;
    for _ in 0..(24 * 4) {
        if let Some(instant) = resolve(&candidate).earliest() {
            return Some(instant);
        }
        candidate = candidate.checked_add_signed(step)?;
    }
    None
}

/// Clients created between the start of the current month and `now`, both
/// inclusive.
pub fn count_new_clients_this_month<Tz: TimeZone>(clients: &[Client], now: &DateTime<Tz>) -> usize {
    let Some(start) = start_of_month(now) else {
        return 0;
    };
    let start = start.with_timezone(&Utc);
    let end = now.with_timezone(&Utc);

    clients
        .iter()
        .filter(|c| c.created_at >= start && c.created_at <= end)
        .count()
}

/// Revenue attributed to a single client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRevenue {
    pub client_id: Uuid,
    pub client_name: String,
    /// Monthly revenue from the client's active subscriptions.
    pub monthly_revenue: Decimal,
    /// Number of subscriptions in any status.
    pub subscriptions: usize,
}

/// Per-client revenue, in the order of `clients`.
pub fn revenue_by_client<S: AsRef<Subscription>>(
    clients: &[Client],
    subscriptions: &[S],
) -> Vec<ClientRevenue> {
    clients
        .iter()
        .map(|client| {
            let owned: Vec<&Subscription> = subscriptions
                .iter()
                .map(AsRef::as_ref)
                .filter(|s| s.client_id == client.id)
                .collect();

            ClientRevenue {
                client_id: client.id,
                client_name: client.name.clone(),
                monthly_revenue: monthly_recurring_revenue(&owned),
                subscriptions: owned.len(),
            }
        })
        .collect()
}

/// Total declared value per value type. Entries with an amount but no type
/// count as `other`; entries without an amount are skipped.
pub fn journal_value_by_type<E: AsRef<JournalEntry>>(entries: &[E]) -> BTreeMap<ValueType, Decimal> {
    let mut totals: BTreeMap<ValueType, Decimal> = BTreeMap::new();

    for entry in entries.iter().map(AsRef::as_ref) {
        let Some(amount) = entry.value_amount else {
            continue;
        };
        let value_type = entry.value_type.clone().unwrap_or(ValueType::Other);
        let total = totals.entry(value_type).or_insert(Decimal::ZERO);
        *total = total.saturating_add(amount);
    }

    totals
}

/// The `n` most recent entries, newest intervention first.
pub fn recent_entries<E: Clone + AsRef<JournalEntry>>(entries: &[E], n: usize) -> Vec<E> {
    let mut sorted: Vec<E> = entries.to_vec();
    sorted.sort_by(|a, b| {
        let (a, b) = (a.as_ref(), b.as_ref());
        b.intervention_date
            .cmp(&a.intervention_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    sorted.truncate(n);
    sorted
}

/// Longest renewal horizon `Duration::days` accepts.
const MAX_RENEWAL_DAYS: i64 = i64::MAX / 86_400_000;

/// Active subscriptions billing within `within_days` of `today`, soonest first.
pub fn upcoming_renewals<S: Clone + AsRef<Subscription>>(
    subscriptions: &[S],
    today: NaiveDate,
    within_days: i64,
) -> Vec<S> {
    let horizon = today
        .checked_add_signed(Duration::days(within_days.clamp(0, MAX_RENEWAL_DAYS)))
        .unwrap_or(NaiveDate::MAX);

    let mut due: Vec<S> = subscriptions
        .iter()
        .filter(|s| {
            let s = s.as_ref();
            s.status == SubscriptionStatus::Active
                && s.next_billing_date >= today
                && s.next_billing_date <= horizon
        })
        .cloned()
        .collect();

    due.sort_by_key(|s| s.as_ref().next_billing_date);
    due
}
