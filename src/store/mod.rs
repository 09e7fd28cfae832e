//! Data access for agencies, clients, subscriptions and the value journal.
//!
//! All operations are async. Tenant-scoped operations take a
//! [`SessionContext`]; records of other agencies are invisible to them and
//! report as not found. Only the public signup operations run without a
//! session, deriving the agency from the subscription they target.

pub mod json;

use crate::context::SessionContext;
use crate::error::AgencyResult;
use crate::models::{
    Agency, Client, CreateAgency, CreateClient, CreateJournalEntry, CreateSignup,
    CreateSubscription, JournalEntry, JournalEntryView, Profile, PublicOffer, SignupReceipt,
    Subscription, SubscriptionView, UpdateClient, UpdateSubscription,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use uuid::Uuid;

pub use json::JsonStore;

/// Everything the store persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub agencies: Vec<Agency>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub journal: Vec<JournalEntry>,
}

pub trait AgencyStore: Send + Sync {
    /// Create an agency together with its first profile.
    fn register_agency(
        &self,
        input: CreateAgency,
    ) -> impl Future<Output = AgencyResult<(Agency, Profile)>> + Send;

    /// Look up the profile of `user_id` and build its session.
    fn resolve_session(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = AgencyResult<SessionContext>> + Send;

    fn agency(&self, ctx: &SessionContext) -> impl Future<Output = AgencyResult<Agency>> + Send;

    fn profile(&self, ctx: &SessionContext)
        -> impl Future<Output = AgencyResult<Profile>> + Send;

    // -----------------------------------------------------------------------
    // Clients
    // -----------------------------------------------------------------------

    /// Clients of the session's agency, newest first.
    fn list_clients(
        &self,
        ctx: &SessionContext,
    ) -> impl Future<Output = AgencyResult<Vec<Client>>> + Send;

    fn add_client(
        &self,
        ctx: &SessionContext,
        input: CreateClient,
    ) -> impl Future<Output = AgencyResult<Client>> + Send;

    fn update_client(
        &self,
        ctx: &SessionContext,
        id: Uuid,
        input: UpdateClient,
    ) -> impl Future<Output = AgencyResult<Client>> + Send;

    /// Hard delete. The client's subscriptions and journal entries go with it.
    fn delete_client(
        &self,
        ctx: &SessionContext,
        id: Uuid,
    ) -> impl Future<Output = AgencyResult<()>> + Send;

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Subscriptions joined with their client, newest first.
    fn list_subscriptions(
        &self,
        ctx: &SessionContext,
    ) -> impl Future<Output = AgencyResult<Vec<SubscriptionView>>> + Send;

    fn add_subscription(
        &self,
        ctx: &SessionContext,
        input: CreateSubscription,
    ) -> impl Future<Output = AgencyResult<Subscription>> + Send;

    fn update_subscription(
        &self,
        ctx: &SessionContext,
        id: Uuid,
        input: UpdateSubscription,
    ) -> impl Future<Output = AgencyResult<Subscription>> + Send;

    // -----------------------------------------------------------------------
    // Value journal
    // -----------------------------------------------------------------------

    /// Journal entries joined with client and subscription names, latest
    /// intervention first.
    fn list_journal(
        &self,
        ctx: &SessionContext,
    ) -> impl Future<Output = AgencyResult<Vec<JournalEntryView>>> + Send;

    fn add_journal_entry(
        &self,
        ctx: &SessionContext,
        input: CreateJournalEntry,
    ) -> impl Future<Output = AgencyResult<JournalEntry>> + Send;

    // -----------------------------------------------------------------------
    // Public signup (no session)
    // -----------------------------------------------------------------------

    fn public_offer(
        &self,
        subscription_id: Uuid,
    ) -> impl Future<Output = AgencyResult<PublicOffer>> + Send;

    /// Record the signer as a lead client of the offering agency.
    fn public_signup(
        &self,
        subscription_id: Uuid,
        input: CreateSignup,
    ) -> impl Future<Output = AgencyResult<SignupReceipt>> + Send;
}
