//! JSON file backed store.
//!
//! The whole dataset lives in memory behind a lock and is written back to
//! disk after every mutation. Without a path the store is purely in-memory.

use super::{AgencyStore, Dataset};
use crate::context::SessionContext;
use crate::error::{AgencyError, AgencyResult};
use crate::models::{
    Agency, Client, ClientStatus, CreateAgency, CreateClient, CreateJournalEntry, CreateSignup,
    CreateSubscription, JournalEntry, JournalEntryView, Profile, PublicOffer, SignupReceipt,
    Subscription, SubscriptionStatus, SubscriptionView, UpdateClient, UpdateSubscription,
};
use chrono::Utc;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct JsonStore {
    path: Option<PathBuf>,
    data: RwLock<Dataset>,
}

impl JsonStore {
    /// Open the data file at `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> AgencyResult<Self> {
        let path = path.into();

        let dataset = if tokio::fs::try_exists(&path).await? {
            let raw = tokio::fs::read(&path).await?;
            let dataset: Dataset = serde_json::from_slice(&raw)?;
            debug!(
                "Loaded {} agencies, {} clients, {} subscriptions, {} journal entries from {}",
                dataset.agencies.len(),
                dataset.clients.len(),
                dataset.subscriptions.len(),
                dataset.journal.len(),
                path.display()
            );
            dataset
        } else {
            debug!("No data file at {}, starting empty", path.display());
            Dataset::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(dataset),
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory(dataset: Dataset) -> Self {
        Self {
            path: None,
            data: RwLock::new(dataset),
        }
    }

    async fn persist(&self, data: &Dataset) -> AgencyResult<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &content).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!("Saved dataset to {}", path.display());
        Ok(())
    }

    /// Save `next` and only then make it the live dataset, so a failed write
    /// leaves memory matching the file.
    async fn commit(&self, live: &mut Dataset, next: Dataset) -> AgencyResult<()> {
        self.persist(&next).await?;
        *live = next;
        Ok(())
    }
}

fn find_client<'a>(data: &'a Dataset, ctx: &SessionContext, id: Uuid) -> AgencyResult<&'a Client> {
    data.clients
        .iter()
        .find(|c| c.id == id && ctx.owns(c.agency_id))
        .ok_or_else(|| AgencyError::not_found("Client", id))
}

fn find_subscription<'a>(
    data: &'a Dataset,
    ctx: &SessionContext,
    id: Uuid,
) -> AgencyResult<&'a Subscription> {
    data.subscriptions
        .iter()
        .find(|s| s.id == id && ctx.owns(s.agency_id))
        .ok_or_else(|| AgencyError::not_found("Subscription", id))
}

fn subscription_view(data: &Dataset, subscription: &Subscription) -> SubscriptionView {
    let client = data
        .clients
        .iter()
        .find(|c| c.id == subscription.client_id && c.agency_id == subscription.agency_id)
        .map(Client::summary);

    SubscriptionView {
        subscription: subscription.clone(),
        client,
    }
}

fn journal_view(data: &Dataset, entry: &JournalEntry) -> JournalEntryView {
    let client_name = data
        .clients
        .iter()
        .find(|c| c.id == entry.client_id && c.agency_id == entry.agency_id)
        .map(|c| c.name.clone());
    let subscription_name = entry.subscription_id.and_then(|sid| {
        data.subscriptions
            .iter()
            .find(|s| s.id == sid && s.agency_id == entry.agency_id)
            .map(|s| s.name.clone())
    });

    JournalEntryView {
        entry: entry.clone(),
        client_name,
        subscription_name,
    }
}

impl AgencyStore for JsonStore {
    async fn register_agency(&self, input: CreateAgency) -> AgencyResult<(Agency, Profile)> {
        let now = Utc::now();
        let agency = Agency {
            id: Uuid::new_v4(),
            name: input.name,
            logo_url: None,
            primary_color: None,
            secondary_color: None,
            payment_account_id: None,
            created_at: now,
            updated_at: now,
        };
        let profile = Profile {
            id: Uuid::new_v4(),
            agency_id: agency.id,
            email: input.owner_email,
            first_name: input.owner_first_name,
            last_name: input.owner_last_name,
            created_at: now,
            updated_at: now,
        };

        let mut data = self.data.write().await;
        let mut next = data.clone();
        next.agencies.push(agency.clone());
        next.profiles.push(profile.clone());
        self.commit(&mut data, next).await?;

        info!("Registered agency '{}' ({})", agency.name, agency.id);
        Ok((agency, profile))
    }

    async fn resolve_session(&self, user_id: Uuid) -> AgencyResult<SessionContext> {
        let data = self.data.read().await;
        data.profiles
            .iter()
            .find(|p| p.id == user_id)
            .map(SessionContext::from)
            .ok_or_else(|| AgencyError::Unauthenticated(user_id.to_string()))
    }

    async fn agency(&self, ctx: &SessionContext) -> AgencyResult<Agency> {
        let data = self.data.read().await;
        data.agencies
            .iter()
            .find(|a| a.id == ctx.agency_id)
            .cloned()
            .ok_or_else(|| AgencyError::not_found("Agency", ctx.agency_id))
    }

    async fn profile(&self, ctx: &SessionContext) -> AgencyResult<Profile> {
        let data = self.data.read().await;
        data.profiles
            .iter()
            .find(|p| p.id == ctx.user_id && ctx.owns(p.agency_id))
            .cloned()
            .ok_or_else(|| AgencyError::Unauthenticated(ctx.user_id.to_string()))
    }

    async fn list_clients(&self, ctx: &SessionContext) -> AgencyResult<Vec<Client>> {
        let data = self.data.read().await;
        let mut clients: Vec<Client> = data
            .clients
            .iter()
            .filter(|c| ctx.owns(c.agency_id))
            .cloned()
            .collect();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(clients)
    }

    async fn add_client(&self, ctx: &SessionContext, input: CreateClient) -> AgencyResult<Client> {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            agency_id: ctx.agency_id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            company: input.company,
            address: input.address,
            notes: input.notes,
            status: input.status,
            created_by: Some(ctx.user_id),
            created_at: now,
            updated_at: now,
        };

        let mut data = self.data.write().await;
        let mut next = data.clone();
        next.clients.push(client.clone());
        self.commit(&mut data, next).await?;

        info!("Added client '{}' ({})", client.name, client.id);
        Ok(client)
    }

    async fn update_client(
        &self,
        ctx: &SessionContext,
        id: Uuid,
        input: UpdateClient,
    ) -> AgencyResult<Client> {
        let mut data = self.data.write().await;
        let mut next = data.clone();
        let client = next
            .clients
            .iter_mut()
            .find(|c| c.id == id && ctx.owns(c.agency_id))
            .ok_or_else(|| AgencyError::not_found("Client", id))?;

        input.apply(client);
        client.updated_at = Utc::now();
        let updated = client.clone();
        self.commit(&mut data, next).await?;

        info!("Updated client '{}' ({})", updated.name, updated.id);
        Ok(updated)
    }

    async fn delete_client(&self, ctx: &SessionContext, id: Uuid) -> AgencyResult<()> {
        let mut data = self.data.write().await;
        let name = find_client(&data, ctx, id)?.name.clone();

        let mut next = data.clone();
        next.clients.retain(|c| c.id != id);
        next.subscriptions.retain(|s| s.client_id != id);
        next.journal.retain(|e| e.client_id != id);
        let removed_subscriptions = data.subscriptions.len() - next.subscriptions.len();
        let removed_entries = data.journal.len() - next.journal.len();
        self.commit(&mut data, next).await?;

        if removed_subscriptions > 0 || removed_entries > 0 {
            warn!(
                "Deleting client '{}' also removed {} subscriptions and {} journal entries",
                name, removed_subscriptions, removed_entries
            );
        }
        info!("Deleted client '{}' ({})", name, id);
        Ok(())
    }

    async fn list_subscriptions(&self, ctx: &SessionContext) -> AgencyResult<Vec<SubscriptionView>> {
        let data = self.data.read().await;
        let mut views: Vec<SubscriptionView> = data
            .subscriptions
            .iter()
            .filter(|s| ctx.owns(s.agency_id))
            .map(|s| subscription_view(&data, s))
            .collect();
        views.sort_by(|a, b| b.subscription.created_at.cmp(&a.subscription.created_at));
        Ok(views)
    }

    async fn add_subscription(
        &self,
        ctx: &SessionContext,
        input: CreateSubscription,
    ) -> AgencyResult<Subscription> {
        if input.next_billing_date < input.start_date {
            return Err(AgencyError::InvalidReference(format!(
                "next billing date {} is before start date {}",
                input.next_billing_date, input.start_date
            )));
        }

        let mut data = self.data.write().await;
        find_client(&data, ctx, input.client_id).map_err(|_| {
            AgencyError::InvalidReference(format!(
                "client {} does not exist in this agency",
                input.client_id
            ))
        })?;

        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            agency_id: ctx.agency_id,
            client_id: input.client_id,
            name: input.name,
            description: input.description,
            amount: input.amount,
            currency: input.currency,
            billing_cycle: input.billing_cycle,
            status: input.status,
            start_date: input.start_date,
            next_billing_date: input.next_billing_date,
            auto_renew: true,
            payment_ref: None,
            created_by: Some(ctx.user_id),
            created_at: now,
            updated_at: now,
        };

        let mut next = data.clone();
        next.subscriptions.push(subscription.clone());
        self.commit(&mut data, next).await?;

        info!(
            "Created subscription '{}' ({}) for client {}",
            subscription.name, subscription.id, subscription.client_id
        );
        Ok(subscription)
    }

    async fn update_subscription(
        &self,
        ctx: &SessionContext,
        id: Uuid,
        input: UpdateSubscription,
    ) -> AgencyResult<Subscription> {
        let mut data = self.data.write().await;
        let mut next = data.clone();
        let subscription = next
            .subscriptions
            .iter_mut()
            .find(|s| s.id == id && ctx.owns(s.agency_id))
            .ok_or_else(|| AgencyError::not_found("Subscription", id))?;

        let previous_status = subscription.status.clone();
        input.apply(subscription);
        subscription.updated_at = Utc::now();
        let updated = subscription.clone();
        self.commit(&mut data, next).await?;

        if previous_status != updated.status {
            info!(
                "Subscription '{}' status changed: {} -> {}",
                updated.name, previous_status, updated.status
            );
        }
        if updated.status == SubscriptionStatus::AtRisk {
            warn!("Subscription '{}' ({}) is at risk", updated.name, updated.id);
        }
        Ok(updated)
    }

    async fn list_journal(&self, ctx: &SessionContext) -> AgencyResult<Vec<JournalEntryView>> {
        let data = self.data.read().await;
        let mut views: Vec<JournalEntryView> = data
            .journal
            .iter()
            .filter(|e| ctx.owns(e.agency_id))
            .map(|e| journal_view(&data, e))
            .collect();
        views.sort_by(|a, b| {
            b.entry
                .intervention_date
                .cmp(&a.entry.intervention_date)
                .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
        });
        Ok(views)
    }

    async fn add_journal_entry(
        &self,
        ctx: &SessionContext,
        input: CreateJournalEntry,
    ) -> AgencyResult<JournalEntry> {
        let mut data = self.data.write().await;
        find_client(&data, ctx, input.client_id).map_err(|_| {
            AgencyError::InvalidReference(format!(
                "client {} does not exist in this agency",
                input.client_id
            ))
        })?;
        if let Some(sid) = input.subscription_id {
            let subscription = find_subscription(&data, ctx, sid).map_err(|_| {
                AgencyError::InvalidReference(format!(
                    "subscription {} does not exist in this agency",
                    sid
                ))
            })?;
            if subscription.client_id != input.client_id {
                return Err(AgencyError::InvalidReference(format!(
                    "subscription {} does not belong to client {}",
                    sid, input.client_id
                )));
            }
        }

        let now = Utc::now();
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            agency_id: ctx.agency_id,
            client_id: input.client_id,
            subscription_id: input.subscription_id,
            title: input.title,
            description: input.description,
            value_amount: input.value_amount,
            value_type: input.value_type,
            intervention_date: input.intervention_date,
            created_by: Some(ctx.user_id),
            created_at: now,
            updated_at: now,
        };

        let mut next = data.clone();
        next.journal.push(entry.clone());
        self.commit(&mut data, next).await?;

        info!("Logged intervention '{}' ({})", entry.title, entry.id);
        Ok(entry)
    }

    async fn public_offer(&self, subscription_id: Uuid) -> AgencyResult<PublicOffer> {
        let data = self.data.read().await;
        let subscription = data
            .subscriptions
            .iter()
            .find(|s| s.id == subscription_id)
            .ok_or_else(|| AgencyError::not_found("Subscription", subscription_id))?;
        if subscription.status == SubscriptionStatus::Cancelled {
            return Err(AgencyError::InvalidReference(format!(
                "subscription {} is no longer offered",
                subscription_id
            )));
        }
        let agency = data
            .agencies
            .iter()
            .find(|a| a.id == subscription.agency_id)
            .ok_or_else(|| AgencyError::not_found("Agency", subscription.agency_id))?;

        Ok(PublicOffer {
            subscription_id,
            agency_name: agency.name.clone(),
            service_name: subscription.name.clone(),
            description: subscription.description.clone(),
            amount: subscription.amount,
            currency: subscription.currency.clone(),
            billing_cycle: subscription.billing_cycle.clone(),
        })
    }

    async fn public_signup(
        &self,
        subscription_id: Uuid,
        input: CreateSignup,
    ) -> AgencyResult<SignupReceipt> {
        let offer = self.public_offer(subscription_id).await?;

        let mut data = self.data.write().await;
        let (agency_id, payment_ref) = data
            .subscriptions
            .iter()
            .find(|s| s.id == offer.subscription_id)
            .map(|s| (s.agency_id, s.payment_ref.clone()))
            .ok_or_else(|| AgencyError::not_found("Subscription", subscription_id))?;

        let existing = data
            .clients
            .iter()
            .find(|c| c.agency_id == agency_id && c.email.eq_ignore_ascii_case(&input.email))
            .map(|c| c.id);

        let (client_id, client_created) = match existing {
            Some(id) => {
                debug!("Signup reuses existing client {}", id);
                (id, false)
            }
            None => {
                let now = Utc::now();
                let client = Client {
                    id: Uuid::new_v4(),
                    agency_id,
                    name: input.company_name.clone(),
                    email: input.email,
                    phone: input.phone,
                    company: Some(input.company_name),
                    address: None,
                    notes: Some(format!("Signed up for '{}'", offer.service_name)),
                    status: ClientStatus::Lead,
                    created_by: None,
                    created_at: now,
                    updated_at: now,
                };
                let id = client.id;
                let mut next = data.clone();
                next.clients.push(client);
                self.commit(&mut data, next).await?;
                (id, true)
            }
        };

        info!(
            "Public signup for '{}' of agency '{}' (client {})",
            offer.service_name, offer.agency_name, client_id
        );
        Ok(SignupReceipt {
            subscription_id,
            client_id,
            client_created,
            payment_ref,
        })
    }
}
