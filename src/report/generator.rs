//! Markdown and JSON rendering.
//!
//! Every view is rendered from data that is already filtered and aggregated;
//! nothing here touches the store.

use crate::analysis::{normalized_monthly_amount, ClientRevenue, Metrics};
use crate::models::{
    Client, ClientStatus, JournalEntryView, PublicOffer, SignupReceipt, SubscriptionStatus,
    SubscriptionView, ValueType,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub agency_name: String,
    pub generated_at: DateTime<Utc>,
    pub currency: String,
    pub metrics: Metrics,
    pub recent_activity: Vec<JournalEntryView>,
    pub upcoming_renewals: Vec<SubscriptionView>,
    pub renewal_days: i64,
    pub value_by_type: BTreeMap<ValueType, Decimal>,
}

/// A client list row with its revenue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRow {
    #[serde(flatten)]
    pub client: Client,
    pub monthly_revenue: Decimal,
    pub subscriptions: usize,
}

/// Pair each client with its revenue line. Both slices come from the same
/// client list, so rows without a revenue line show zero.
pub fn client_rows(clients: &[Client], revenue: &[ClientRevenue]) -> Vec<ClientRow> {
    clients
        .iter()
        .map(|client| {
            let line = revenue.iter().find(|r| r.client_id == client.id);
            ClientRow {
                client: client.clone(),
                monthly_revenue: line.map_or(Decimal::ZERO, |r| r.monthly_revenue),
                subscriptions: line.map_or(0, |r| r.subscriptions),
            }
        })
        .collect()
}

/// `1500.00 EUR`
pub fn format_money(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {}", amount, currency)
}

/// Escape a value for a Markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

fn status_badge(status: &SubscriptionStatus) -> String {
    let icon = match status {
        SubscriptionStatus::Active => "🟢",
        SubscriptionStatus::Paused => "⏸️",
        SubscriptionStatus::Cancelled => "⚪",
        SubscriptionStatus::AtRisk => "🔴",
        SubscriptionStatus::Unrecognized(raw) => return format!("❔ {}", raw),
    };
    format!("{} {}", icon, status.label())
}

fn client_badge(status: &ClientStatus) -> String {
    let icon = match status {
        ClientStatus::Active => "🟢",
        ClientStatus::Inactive => "⚪",
        ClientStatus::Lead => "🟡",
        ClientStatus::Unrecognized(raw) => return format!("❔ {}", raw),
    };
    format!("{} {}", icon, status.label())
}

/// Generate the dashboard.
pub fn generate_dashboard_markdown(report: &DashboardReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {} Dashboard\n\n", report.agency_name));
    output.push_str(&format!(
        "*Generated {}*\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push_str(&generate_metrics_section(&report.metrics, &report.currency));
    output.push_str(&generate_activity_section(&report.recent_activity));
    output.push_str(&generate_renewals_section(
        &report.upcoming_renewals,
        report.renewal_days,
    ));
    output.push_str(&generate_value_section(&report.value_by_type));

    output
}

fn generate_metrics_section(metrics: &Metrics, currency: &str) -> String {
    let mut section = String::new();

    section.push_str("## Key Metrics\n\n");
    section.push_str("| MRR | Active Clients | At Risk | New This Month |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{}** | {} | {} | {} |\n\n",
        format_money(metrics.mrr, currency),
        metrics.active_clients,
        metrics.at_risk_subscriptions,
        metrics.new_clients_this_month
    ));

    if metrics.at_risk_subscriptions > 0 {
        section.push_str(&format!(
            "> ⚠️ {} subscription(s) need attention.\n\n",
            metrics.at_risk_subscriptions
        ));
    }

    section
}

fn generate_activity_section(entries: &[JournalEntryView]) -> String {
    let mut section = String::new();

    section.push_str("## Recent Activity\n\n");
    if entries.is_empty() {
        section.push_str("No intervention logged yet.\n\n");
        return section;
    }

    for view in entries {
        let entry = &view.entry;
        section.push_str(&format!(
            "- **{}** {}",
            entry.intervention_date.format("%Y-%m-%d"),
            entry.title
        ));
        if let Some(ref client) = view.client_name {
            section.push_str(&format!(" ({})", client));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_renewals_section(renewals: &[SubscriptionView], within_days: i64) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Renewals (next {} days)\n\n", within_days));
    if renewals.is_empty() {
        section.push_str("Nothing due.\n\n");
        return section;
    }

    section.push_str("| Date | Service | Client | Amount |\n");
    section.push_str("|:---|:---|:---|---:|\n");
    for view in renewals {
        let s = &view.subscription;
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            s.next_billing_date.format("%Y-%m-%d"),
            cell(&s.name),
            cell(view.client_name().unwrap_or("-")),
            format_money(s.amount, &s.currency)
        ));
    }
    section.push('\n');

    section
}

fn generate_value_section(value_by_type: &BTreeMap<ValueType, Decimal>) -> String {
    if value_by_type.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Delivered Value\n\n");
    section.push_str("| Type | Total |\n");
    section.push_str("|:---|---:|\n");
    for (value_type, total) in value_by_type {
        section.push_str(&format!("| {} | {} |\n", value_type.label(), total));
    }
    section.push('\n');

    section
}

/// Generate the client list.
pub fn generate_clients_markdown(rows: &[ClientRow], currency: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Clients ({})\n\n", rows.len()));
    if rows.is_empty() {
        output.push_str("No client matches.\n");
        return output;
    }

    output.push_str("| Client | Email | Company | Status | Subscriptions | Monthly |\n");
    output.push_str("|:---|:---|:---|:---|:---:|---:|\n");
    for row in rows {
        let c = &row.client;
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            cell(&c.name),
            cell(&c.email),
            cell(c.company.as_deref().unwrap_or("-")),
            client_badge(&c.status),
            row.subscriptions,
            format_money(row.monthly_revenue, currency)
        ));
    }

    output.push_str("\n*Ids:*\n\n");
    for row in rows {
        output.push_str(&format!("- `{}` {}\n", row.client.id, row.client.name));
    }

    output
}

/// Generate the subscription list.
pub fn generate_subscriptions_markdown(views: &[SubscriptionView]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Subscriptions ({})\n\n", views.len()));
    if views.is_empty() {
        output.push_str("No subscription matches.\n");
        return output;
    }

    output.push_str("| Service | Client | Amount | Cycle | Monthly | Status | Next Billing |\n");
    output.push_str("|:---|:---|---:|:---|---:|:---|:---|\n");
    for view in views {
        let s = &view.subscription;
        let monthly = normalized_monthly_amount(s)
            .map_or_else(|| "-".to_string(), |m| format_money(m, &s.currency));
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            cell(&s.name),
            cell(view.client_name().unwrap_or("-")),
            format_money(s.amount, &s.currency),
            s.billing_cycle,
            monthly,
            status_badge(&s.status),
            s.next_billing_date.format("%Y-%m-%d")
        ));
    }

    output.push_str("\n*Ids:*\n\n");
    for view in views {
        output.push_str(&format!(
            "- `{}` {}\n",
            view.subscription.id, view.subscription.name
        ));
    }

    output
}

/// Generate the journal.
pub fn generate_journal_markdown(entries: &[JournalEntryView]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Value Journal ({})\n\n", entries.len()));
    if entries.is_empty() {
        output.push_str("No entry matches.\n");
        return output;
    }

    for view in entries {
        let entry = &view.entry;
        output.push_str(&format!(
            "### {} - {}\n\n",
            entry.intervention_date.format("%Y-%m-%d"),
            entry.title
        ));

        let mut meta = Vec::new();
        if let Some(ref client) = view.client_name {
            meta.push(format!("Client: {}", client));
        }
        if let Some(ref subscription) = view.subscription_name {
            meta.push(format!("Service: {}", subscription));
        }
        if let Some(amount) = entry.value_amount {
            let label = entry
                .value_type
                .as_ref()
                .map_or("Value", |v| v.label());
            meta.push(format!("{}: {}", label, amount));
        }
        if !meta.is_empty() {
            output.push_str(&format!("*{}*\n\n", meta.join(" | ")));
        }

        output.push_str(&entry.description);
        output.push_str("\n\n---\n\n");
    }

    output
}

/// Generate the public offer page.
pub fn generate_offer_markdown(offer: &PublicOffer, link: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", offer.service_name));
    output.push_str(&format!("*Offered by {}*\n\n", offer.agency_name));

    let monthly = offer
        .billing_cycle
        .months()
        .map(|m| offer.amount / Decimal::from(m));
    match monthly {
        Some(per_month) => output.push_str(&format!(
            "**{} / month** (billed {}: {})\n\n",
            format_money(per_month, &offer.currency),
            offer.billing_cycle,
            format_money(offer.amount, &offer.currency)
        )),
        None => output.push_str(&format!(
            "**{}** ({})\n\n",
            format_money(offer.amount, &offer.currency),
            offer.billing_cycle
        )),
    }

    if let Some(ref description) = offer.description {
        output.push_str(description);
        output.push_str("\n\n");
    }

    output.push_str(&format!("Sign up: {}\n", link));

    output
}

/// Generate the confirmation shown after a public signup.
pub fn generate_signup_markdown(receipt: &SignupReceipt, offer: &PublicOffer) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "✅ Signed up to **{}** with {}.\n\n",
        offer.service_name, offer.agency_name
    ));
    if receipt.client_created {
        output.push_str("A new client record was created.\n");
    } else {
        output.push_str("Your existing client record was used.\n");
    }
    match receipt.payment_ref {
        Some(ref reference) => output.push_str(&format!("Payment reference: `{}`\n", reference)),
        None => output.push_str("The agency will contact you to set up payment.\n"),
    }

    output
}

/// Generate a JSON document for any view.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingCycle, JournalEntry, Subscription};
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_client(name: &str) -> Client {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
        Client {
            id: Uuid::new_v4(),
            agency_id: Uuid::nil(),
            name: name.to_string(),
            email: format!("contact@{}.com", name.to_lowercase()),
            phone: None,
            company: None,
            address: None,
            notes: None,
            status: ClientStatus::Active,
            created_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn create_test_subscription(name: &str, status: SubscriptionStatus) -> SubscriptionView {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let client = create_test_client("TechCorp");
        SubscriptionView {
            subscription: Subscription {
                id: Uuid::new_v4(),
                agency_id: Uuid::nil(),
                client_id: client.id,
                name: name.to_string(),
                description: None,
                amount: Decimal::from(1500),
                currency: "EUR".to_string(),
                billing_cycle: BillingCycle::Monthly,
                status,
                start_date: date(2024, 1, 15),
                next_billing_date: date(2024, 2, 15),
                auto_renew: true,
                payment_ref: None,
                created_by: None,
                created_at,
                updated_at: created_at,
            },
            client: Some(client.summary()),
        }
    }

    fn create_test_entry(title: &str) -> JournalEntryView {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 25, 17, 0, 0).unwrap();
        JournalEntryView {
            entry: JournalEntry {
                id: Uuid::new_v4(),
                agency_id: Uuid::nil(),
                client_id: Uuid::nil(),
                subscription_id: None,
                title: title.to_string(),
                description: "Product pages rewritten".to_string(),
                value_amount: Some(Decimal::from(3)),
                value_type: Some(ValueType::TimeSaved),
                intervention_date: date(2024, 1, 25),
                created_by: None,
                created_at,
                updated_at: created_at,
            },
            client_name: Some("TechCorp".to_string()),
            subscription_name: Some("Marketing Digital".to_string()),
        }
    }

    fn create_test_dashboard() -> DashboardReport {
        DashboardReport {
            agency_name: "Mon Agence Digital".to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap(),
            currency: "EUR".to_string(),
            metrics: Metrics {
                mrr: Decimal::from(2100),
                active_clients: 2,
                at_risk_subscriptions: 1,
                new_clients_this_month: 3,
            },
            recent_activity: vec![create_test_entry("SEO optimisation")],
            upcoming_renewals: vec![create_test_subscription(
                "Marketing Digital",
                SubscriptionStatus::Active,
            )],
            renewal_days: 30,
            value_by_type: [(ValueType::TimeSaved, Decimal::from(3))].into_iter().collect(),
        }
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::from(1500), "EUR"), "1500.00 EUR");
        assert_eq!(format_money(Decimal::new(33333, 2), "USD"), "333.33 USD");
    }

    #[test]
    fn test_generate_dashboard_markdown() {
        let markdown = generate_dashboard_markdown(&create_test_dashboard());

        assert!(markdown.contains("# Mon Agence Digital Dashboard"));
        assert!(markdown.contains("2100.00 EUR"));
        assert!(markdown.contains("need attention"));
        assert!(markdown.contains("SEO optimisation (TechCorp)"));
        assert!(markdown.contains("## Renewals (next 30 days)"));
        assert!(markdown.contains("| Time saved | 3 |"));
    }

    #[test]
    fn test_dashboard_without_activity() {
        let mut report = create_test_dashboard();
        report.recent_activity.clear();
        report.upcoming_renewals.clear();
        report.value_by_type.clear();
        report.metrics.at_risk_subscriptions = 0;

        let markdown = generate_dashboard_markdown(&report);
        assert!(markdown.contains("No intervention logged yet."));
        assert!(markdown.contains("Nothing due."));
        assert!(!markdown.contains("need attention"));
        assert!(!markdown.contains("## Delivered Value"));
    }

    #[test]
    fn test_client_rows_default_to_zero() {
        let clients = vec![create_test_client("TechCorp"), create_test_client("DesignStudio")];
        let revenue = vec![ClientRevenue {
            client_id: clients[0].id,
            client_name: "TechCorp".to_string(),
            monthly_revenue: Decimal::from(1500),
            subscriptions: 1,
        }];

        let rows = client_rows(&clients, &revenue);
        assert_eq!(rows[0].monthly_revenue, Decimal::from(1500));
        assert_eq!(rows[1].monthly_revenue, Decimal::ZERO);
        assert_eq!(rows[1].subscriptions, 0);

        let markdown = generate_clients_markdown(&rows, "EUR");
        assert!(markdown.contains("# Clients (2)"));
        assert!(markdown.contains("1500.00 EUR"));
    }

    #[test]
    fn test_subscription_markdown_escapes_cells() {
        let views = vec![create_test_subscription(
            "SEO | Ads",
            SubscriptionStatus::AtRisk,
        )];
        let markdown = generate_subscriptions_markdown(&views);
        assert!(markdown.contains("SEO \\| Ads"));
        assert!(markdown.contains("At risk"));
    }

    #[test]
    fn test_journal_markdown() {
        let markdown = generate_journal_markdown(&[create_test_entry("SEO optimisation")]);
        assert!(markdown.contains("### 2024-01-25 - SEO optimisation"));
        assert!(markdown.contains("Client: TechCorp | Service: Marketing Digital | Time saved: 3"));
    }

    #[test]
    fn test_offer_markdown_shows_monthly_price() {
        let offer = PublicOffer {
            subscription_id: Uuid::nil(),
            agency_name: "Mon Agence Digital".to_string(),
            service_name: "Design Services".to_string(),
            description: Some("Brand refresh".to_string()),
            amount: Decimal::from(2400),
            currency: "EUR".to_string(),
            billing_cycle: BillingCycle::Annual,
        };

        let markdown = generate_offer_markdown(&offer, "https://app.agencydesk.io/subscribe/x");
        assert!(markdown.contains("200.00 EUR / month"));
        assert!(markdown.contains("Brand refresh"));
        assert!(markdown.contains("Sign up: https://app.agencydesk.io/subscribe/x"));
    }

    #[test]
    fn test_generate_json() {
        let json = generate_json(&create_test_dashboard()).unwrap();
        assert!(json.contains("\"agency_name\""));
        assert!(json.contains("\"time_saved\""));

        let views = vec![create_test_subscription("SEO", SubscriptionStatus::Active)];
        let json = generate_json(&views).unwrap();
        assert!(json.contains("\"next_billing_date\""));
        assert!(json.contains("\"client\""));
    }
}
