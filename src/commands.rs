//! Command handlers.
//!
//! Each handler talks to an [`AgencyStore`], runs the analysis engines over
//! what it loaded and renders the result in the configured format.

use crate::analysis::{
    client_filter, compute_metrics, journal_filter, journal_value_by_type, recent_entries,
    revenue_by_client, subscription_filter, upcoming_renewals,
};
use crate::cli::{
    ClientCommand, Command, JournalCommand, OutputFormat, PublicCommand, SubscriptionCommand,
};
use crate::config::Config;
use crate::context::SessionContext;
use crate::error::AgencyError;
use crate::forms::{
    AgencyForm, ClientForm, ClientUpdateForm, JournalEntryForm, SignupForm, SubscriptionForm,
    SubscriptionUpdateForm,
};
use crate::report::{self, DashboardReport};
use crate::store::AgencyStore;
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// What a command printed and the exit code it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub exit_code: i32,
}

impl Outcome {
    fn ok(output: String) -> Self {
        Self {
            output,
            exit_code: 0,
        }
    }
}

/// Run one command against `store`.
pub async fn execute<S: AgencyStore>(store: &S, config: &Config, command: Command) -> Result<Outcome> {
    match command {
        Command::InitConfig => Ok(Outcome::ok(Config::default_toml())),
        Command::InitData {
            agency,
            email,
            first_name,
            last_name,
        } => {
            let form = AgencyForm {
                name: agency,
                owner_email: email,
                owner_first_name: first_name,
                owner_last_name: last_name,
            };
            init_data(store, config, form).await.map(Outcome::ok)
        }
        Command::Dashboard {
            fail_on_at_risk,
            renewals_within,
        } => dashboard(store, config, fail_on_at_risk, renewals_within).await,
        Command::Clients(cmd) => clients(store, config, cmd).await.map(Outcome::ok),
        Command::Subscriptions(cmd) => subscriptions(store, config, cmd).await.map(Outcome::ok),
        Command::Journal(cmd) => journal(store, config, cmd).await.map(Outcome::ok),
        Command::Public(cmd) => public(store, config, cmd).await.map(Outcome::ok),
    }
}

async fn session<S: AgencyStore>(store: &S, config: &Config) -> Result<SessionContext> {
    let user_id = config
        .session
        .user_id
        .context("No acting user: pass --user, set AGENCYDESK_USER or [session] user_id")?;

    let ctx = store
        .resolve_session(user_id)
        .await
        .context("Failed to open session")?;
    debug!("Session for user {} in agency {}", ctx.user_id, ctx.agency_id);
    Ok(ctx)
}

/// Render `value` as pretty JSON or through `markdown`.
fn render<T, F>(format: OutputFormat, value: &T, markdown: F) -> Result<String>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Json => report::generate_json(value),
        OutputFormat::Markdown => Ok(markdown(value)),
    }
}

async fn init_data<S: AgencyStore>(store: &S, config: &Config, form: AgencyForm) -> Result<String> {
    let input = form.validate().context("Invalid agency")?;
    let (agency, profile) = store.register_agency(input).await?;

    let value = serde_json::json!({ "agency": agency, "profile": profile });
    render(config.display.format, &value, |_| {
        format!(
            "✅ Registered agency '{}'.\n   Admin: {} <{}>\n   User id: {}\n\n   export AGENCYDESK_USER={}\n",
            agency.name,
            profile.display_name(),
            profile.email,
            profile.id,
            profile.id
        )
    })
}

async fn dashboard<S: AgencyStore>(
    store: &S,
    config: &Config,
    fail_on_at_risk: bool,
    renewals_within: Option<i64>,
) -> Result<Outcome> {
    let ctx = session(store, config).await?;

    let agency = store.agency(&ctx).await?;
    let clients = store.list_clients(&ctx).await?;
    let subscriptions = store.list_subscriptions(&ctx).await?;
    let journal = store.list_journal(&ctx).await?;

    let now = Local::now();
    let renewal_days = renewals_within.unwrap_or(config.display.renewal_days);
    let metrics = compute_metrics(&clients, &subscriptions, &now);
    info!(
        "MRR {} from {} subscriptions, {} active clients",
        metrics.mrr,
        subscriptions.len(),
        metrics.active_clients
    );

    let view = DashboardReport {
        agency_name: agency.name,
        generated_at: Utc::now(),
        currency: config.display.currency.clone(),
        metrics,
        recent_activity: recent_entries(&journal, config.display.recent_entries),
        upcoming_renewals: upcoming_renewals(&subscriptions, now.date_naive(), renewal_days),
        renewal_days,
        value_by_type: journal_value_by_type(&journal),
    };

    let output = render(config.display.format, &view, report::generate_dashboard_markdown)?;

    let at_risk = view.metrics.at_risk_subscriptions;
    let exit_code = if fail_on_at_risk && at_risk > 0 {
        warn!("{} subscription(s) at risk. Failing (exit code 2).", at_risk);
        2
    } else {
        0
    };

    Ok(Outcome { output, exit_code })
}

async fn clients<S: AgencyStore>(store: &S, config: &Config, cmd: ClientCommand) -> Result<String> {
    let ctx = session(store, config).await?;
    let format = config.display.format;

    match cmd {
        ClientCommand::List { search, status } => {
            let clients = store.list_clients(&ctx).await?;
            let subscriptions = store.list_subscriptions(&ctx).await?;
            let revenue = revenue_by_client(&clients, &subscriptions);

            let filtered = client_filter()
                .with_query(search.unwrap_or_default())
                .with_category(status)
                .apply(&clients);
            debug!("{} of {} clients match", filtered.len(), clients.len());

            let rows = report::client_rows(&filtered, &revenue);
            render(format, &rows, |rows| {
                report::generate_clients_markdown(rows, &config.display.currency)
            })
        }
        ClientCommand::Add {
            name,
            email,
            phone,
            company,
            address,
            notes,
            status,
        } => {
            let form = ClientForm {
                name,
                email,
                phone,
                company,
                address,
                notes,
                status,
            };
            let input = form.validate().context("Invalid client")?;
            let client = store.add_client(&ctx, input).await?;
            render(format, &client, |c| {
                format!("✅ Added client '{}' ({})\n", c.name, c.id)
            })
        }
        ClientCommand::Update {
            id,
            name,
            email,
            phone,
            company,
            address,
            notes,
            status,
        } => {
            let form = ClientUpdateForm {
                name,
                email,
                phone,
                company,
                address,
                notes,
                status,
            };
            let input = form.validate().context("Invalid client update")?;
            let client = store.update_client(&ctx, id, input).await?;
            render(format, &client, |c| {
                format!("✅ Updated client '{}' ({}), status {}\n", c.name, c.id, c.status)
            })
        }
        ClientCommand::Delete { id } => {
            store.delete_client(&ctx, id).await?;
            let value = serde_json::json!({ "deleted": id });
            render(format, &value, |_| format!("🗑️  Deleted client {}\n", id))
        }
    }
}

async fn subscriptions<S: AgencyStore>(
    store: &S,
    config: &Config,
    cmd: SubscriptionCommand,
) -> Result<String> {
    let ctx = session(store, config).await?;
    let format = config.display.format;

    match cmd {
        SubscriptionCommand::List { search, status } => {
            let subscriptions = store.list_subscriptions(&ctx).await?;
            let filtered = subscription_filter()
                .with_query(search.unwrap_or_default())
                .with_category(status)
                .apply(&subscriptions);
            debug!(
                "{} of {} subscriptions match",
                filtered.len(),
                subscriptions.len()
            );
            render(format, &filtered, |views| {
                report::generate_subscriptions_markdown(views)
            })
        }
        SubscriptionCommand::Add {
            client,
            name,
            description,
            amount,
            currency,
            cycle,
            status,
            start,
            next_billing,
            billing_day,
        } => {
            let form = SubscriptionForm {
                client_id: client,
                name,
                description,
                amount,
                currency,
                billing_cycle: cycle,
                status,
                start_date: start,
                next_billing_date: next_billing,
                billing_day,
            };
            let input = form
                .validate(&config.display.currency, Local::now().date_naive())
                .context("Invalid subscription")?;
            let subscription = store.add_subscription(&ctx, input).await?;
            render(format, &subscription, |s| {
                format!(
                    "✅ Created subscription '{}' ({})\n   {} {}, next billing {}\n   Public link: {}\n",
                    s.name,
                    s.id,
                    report::format_money(s.amount, &s.currency),
                    s.billing_cycle,
                    s.next_billing_date,
                    config.public_link(s.id)
                )
            })
        }
        SubscriptionCommand::Update {
            id,
            name,
            description,
            amount,
            cycle,
            status,
            next_billing,
        } => {
            let form = SubscriptionUpdateForm {
                name,
                description,
                amount,
                billing_cycle: cycle,
                status,
                next_billing_date: next_billing,
            };
            let input = form.validate().context("Invalid subscription update")?;
            let subscription = store.update_subscription(&ctx, id, input).await?;
            render(format, &subscription, |s| {
                format!(
                    "✅ Updated subscription '{}' ({}), status {}\n",
                    s.name,
                    s.id,
                    s.status.label()
                )
            })
        }
        SubscriptionCommand::Link { id } => {
            let subscriptions = store.list_subscriptions(&ctx).await?;
            if !subscriptions.iter().any(|s| s.subscription.id == id) {
                return Err(AgencyError::not_found("Subscription", id).into());
            }
            let link = config.public_link(id);
            let value = serde_json::json!({ "subscription_id": id, "link": link });
            render(format, &value, |_| format!("{}\n", link))
        }
    }
}

async fn journal<S: AgencyStore>(store: &S, config: &Config, cmd: JournalCommand) -> Result<String> {
    let ctx = session(store, config).await?;
    let format = config.display.format;

    match cmd {
        JournalCommand::List { search, value_type } => {
            let entries = store.list_journal(&ctx).await?;
            let filtered = journal_filter()
                .with_query(search.unwrap_or_default())
                .with_category(value_type)
                .apply(&entries);
            debug!("{} of {} journal entries match", filtered.len(), entries.len());
            render(format, &filtered, |views| report::generate_journal_markdown(views))
        }
        JournalCommand::Add {
            client,
            subscription,
            title,
            description,
            value,
            value_type,
            date,
        } => {
            let form = JournalEntryForm {
                client_id: client,
                subscription_id: subscription,
                title,
                description,
                value_amount: value,
                value_type,
                intervention_date: date,
            };
            let input = form
                .validate(Local::now().date_naive())
                .context("Invalid journal entry")?;
            let entry = store.add_journal_entry(&ctx, input).await?;
            render(format, &entry, |e| {
                format!(
                    "✅ Logged '{}' on {} ({})\n",
                    e.title, e.intervention_date, e.id
                )
            })
        }
    }
}

async fn public<S: AgencyStore>(store: &S, config: &Config, cmd: PublicCommand) -> Result<String> {
    let format = config.display.format;

    match cmd {
        PublicCommand::Show { subscription_id } => {
            let offer = store.public_offer(subscription_id).await?;
            let link = config.public_link(subscription_id);
            let value = serde_json::json!({ "offer": offer, "link": link });
            render(format, &value, |_| report::generate_offer_markdown(&offer, &link))
        }
        PublicCommand::Signup {
            subscription_id,
            email,
            company,
            phone,
        } => {
            let form = SignupForm {
                email,
                company_name: company,
                phone,
            };
            let input = form.validate().context("Invalid signup")?;
            let offer = store.public_offer(subscription_id).await?;
            let receipt = store.public_signup(subscription_id, input).await?;
            render(format, &receipt, |r| report::generate_signup_markdown(r, &offer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientStatus, SubscriptionStatus};
    use crate::store::{Dataset, JsonStore};
    use uuid::Uuid;

    async fn setup() -> (JsonStore, Config) {
        let store = JsonStore::in_memory(Dataset::default());
        let mut config = Config::default();
        config.display.format = OutputFormat::Json;

        let outcome = execute(
            &store,
            &config,
            Command::InitData {
                agency: "Mon Agence Digital".to_string(),
                email: "hello@agence.com".to_string(),
                first_name: None,
                last_name: None,
            },
        )
        .await
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        let user_id = value["profile"]["id"].as_str().unwrap();
        config.session.user_id = Some(Uuid::parse_str(user_id).unwrap());

        (store, config)
    }

    fn add_client(name: &str, status: Option<&str>) -> Command {
        Command::Clients(ClientCommand::Add {
            name: name.to_string(),
            email: format!("contact@{}.com", name.to_lowercase()),
            phone: None,
            company: None,
            address: None,
            notes: None,
            status: status.map(String::from),
        })
    }

    fn add_subscription(client_id: Uuid, amount: &str, status: Option<&str>) -> Command {
        Command::Subscriptions(SubscriptionCommand::Add {
            client: client_id.to_string(),
            name: "Marketing Digital".to_string(),
            description: None,
            amount: amount.to_string(),
            currency: None,
            cycle: Some("monthly".to_string()),
            status: status.map(String::from),
            start: Some("2024-01-15".to_string()),
            next_billing: None,
            billing_day: None,
        })
    }

    async fn created_id(store: &JsonStore, config: &Config, command: Command) -> Uuid {
        let outcome = execute(store, config, command).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        Uuid::parse_str(value["id"].as_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_command_without_user_fails() {
        let store = JsonStore::in_memory(Dataset::default());
        let config = Config::default();
        let dashboard = Command::Dashboard {
            fail_on_at_risk: false,
            renewals_within: None,
        };
        let result = execute(&store, &config, dashboard).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dashboard_fails_on_at_risk() {
        let (store, config) = setup().await;
        let client = created_id(&store, &config, add_client("TechCorp", None)).await;
        execute(&store, &config, add_subscription(client, "1500", None))
            .await
            .unwrap();

        let dashboard = Command::Dashboard {
            fail_on_at_risk: true,
            renewals_within: None,
        };
        let outcome = execute(&store, &config, dashboard.clone()).await.unwrap();
        assert_eq!(outcome.exit_code, 0);
        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(value["metrics"]["active_clients"], 1);

        execute(&store, &config, add_subscription(client, "600", Some("at_risk")))
            .await
            .unwrap();
        let outcome = execute(&store, &config, dashboard).await.unwrap();
        assert_eq!(outcome.exit_code, 2);
    }

    #[tokio::test]
    async fn test_client_list_filters() {
        let (store, config) = setup().await;
        created_id(&store, &config, add_client("TechCorp", None)).await;
        created_id(&store, &config, add_client("DesignStudio", Some("lead"))).await;

        let outcome = execute(
            &store,
            &config,
            Command::Clients(ClientCommand::List {
                search: None,
                status: Some("lead".to_string()),
            }),
        )
        .await
        .unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "DesignStudio");
        assert_eq!(rows[0]["status"], ClientStatus::Lead.as_str());
    }

    #[tokio::test]
    async fn test_invalid_form_is_rejected() {
        let (store, config) = setup().await;
        let result = execute(&store, &config, add_client("", None)).await;
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("name: is required"));
    }

    #[tokio::test]
    async fn test_subscription_update_and_link() {
        let (store, config) = setup().await;
        let client = created_id(&store, &config, add_client("TechCorp", None)).await;
        let sub = created_id(&store, &config, add_subscription(client, "1500", None)).await;

        let outcome = execute(
            &store,
            &config,
            Command::Subscriptions(SubscriptionCommand::Update {
                id: sub,
                name: None,
                description: None,
                amount: None,
                cycle: None,
                status: Some("paused".to_string()),
                next_billing: None,
            }),
        )
        .await
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(value["status"], SubscriptionStatus::Paused.as_str());

        let outcome = execute(
            &store,
            &config,
            Command::Subscriptions(SubscriptionCommand::Link { id: sub }),
        )
        .await
        .unwrap();
        assert!(outcome.output.contains(&format!("/subscribe/{}", sub)));

        let missing = execute(
            &store,
            &config,
            Command::Subscriptions(SubscriptionCommand::Link { id: Uuid::new_v4() }),
        )
        .await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_journal_add_and_search() {
        let (store, config) = setup().await;
        let client = created_id(&store, &config, add_client("TechCorp", None)).await;

        execute(
            &store,
            &config,
            Command::Journal(JournalCommand::Add {
                client: client.to_string(),
                subscription: None,
                title: "SEO optimisation".to_string(),
                description: "Product pages".to_string(),
                value: Some("3".to_string()),
                value_type: Some("time_saved".to_string()),
                date: Some("2024-01-25".to_string()),
            }),
        )
        .await
        .unwrap();

        let outcome = execute(
            &store,
            &config,
            Command::Journal(JournalCommand::List {
                search: Some("seo".to_string()),
                value_type: Some("all".to_string()),
            }),
        )
        .await
        .unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["client_name"], "TechCorp");
    }

    #[tokio::test]
    async fn test_public_signup_markdown() {
        let (store, mut config) = setup().await;
        let client = created_id(&store, &config, add_client("TechCorp", None)).await;
        let sub = created_id(&store, &config, add_subscription(client, "1500", None)).await;

        config.display.format = OutputFormat::Markdown;
        config.session.user_id = None;

        let outcome = execute(
            &store,
            &config,
            Command::Public(PublicCommand::Show {
                subscription_id: sub,
            }),
        )
        .await
        .unwrap();
        assert!(outcome.output.contains("1500.00 EUR / month"));

        let outcome = execute(
            &store,
            &config,
            Command::Public(PublicCommand::Signup {
                subscription_id: sub,
                email: "team@startupxyz.io".to_string(),
                company: "StartupXYZ".to_string(),
                phone: None,
            }),
        )
        .await
        .unwrap();
        assert!(outcome.output.contains("A new client record was created."));
    }
}
