//! Data models for the agency desk.
//!
//! Every record belongs to exactly one agency (tenant). Status-like fields are
//! closed enums with an `Unrecognized` fallback so that stored rows carrying
//! unknown values still load.

pub mod agency;
pub mod client;
pub mod journal;
pub mod subscription;

pub use agency::{Agency, CreateAgency, Profile};
pub use client::{Client, ClientStatus, CreateClient, UpdateClient};
pub use journal::{CreateJournalEntry, JournalEntry, JournalEntryView, ValueType};
pub use subscription::{
    next_billing_date, BillingCycle, CreateSignup, CreateSubscription, PublicOffer,
    SignupReceipt, Subscription, SubscriptionStatus, SubscriptionView, UpdateSubscription,
};
