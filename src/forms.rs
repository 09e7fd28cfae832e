//! Form parsing and validation.
//!
//! Forms hold raw user input as strings. `validate` turns a form into the typed
//! create/update input consumed by the store, or into a [`ValidationErrors`]
//! listing every rejected field. Numbers and dates are parsed here; nothing
//! downstream coerces strings.

use crate::error::ValidationErrors;
use crate::models::{
    next_billing_date, BillingCycle, ClientStatus, CreateAgency, CreateClient, CreateJournalEntry,
    CreateSignup, CreateSubscription, SubscriptionStatus, UpdateClient, UpdateSubscription,
    ValueType,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 100;
const MAX_TITLE_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// New client input.
#[derive(Debug, Clone, Default)]
pub struct ClientForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

impl ClientForm {
    pub fn validate(self) -> Result<CreateClient, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", &self.name, MAX_NAME_LEN);
        let email = self.email.trim().to_string();
        check_email(&mut errors, "email", &email);
        let status = match non_blank(self.status) {
            Some(raw) => known_client_status(&mut errors, &raw),
            None => ClientStatus::Active,
        };

        errors.finish(CreateClient {
            name,
            email,
            phone: non_blank(self.phone),
            company: non_blank(self.company),
            address: non_blank(self.address),
            notes: non_blank(self.notes),
            status,
        })
    }
}

/// Partial client update input. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ClientUpdateForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

impl ClientUpdateForm {
    pub fn validate(self) -> Result<UpdateClient, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self
            .name
            .map(|n| required_text(&mut errors, "name", &n, MAX_NAME_LEN));
        let email = self.email.map(|e| {
            let e = e.trim().to_string();
            check_email(&mut errors, "email", &e);
            e
        });
        let status = non_blank(self.status).map(|raw| known_client_status(&mut errors, &raw));

        let update = UpdateClient {
            name,
            email,
            phone: non_blank(self.phone),
            company: non_blank(self.company),
            address: non_blank(self.address),
            notes: non_blank(self.notes),
            status,
        };
        if update.is_empty() && errors.is_empty() {
            errors.add("update", "no field to update");
        }
        errors.finish(update)
    }
}

/// New subscription input.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionForm {
    pub client_id: String,
    pub name: String,
    pub description: Option<String>,
    pub amount: String,
    pub currency: Option<String>,
    pub billing_cycle: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub next_billing_date: Option<String>,
    /// Day of month (1 to 28) used when deriving the next billing date.
    pub billing_day: Option<u32>,
}

impl SubscriptionForm {
    /// Validate against the agency's default currency, with `today` as the
    /// start date when none is given.
    pub fn validate(
        self,
        default_currency: &str,
        today: NaiveDate,
    ) -> Result<CreateSubscription, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let client_id = parse_uuid(&mut errors, "client_id", &self.client_id);
        let name = required_text(&mut errors, "name", &self.name, MAX_NAME_LEN);
        let description = non_blank(self.description);
        if let Some(ref d) = description {
            check_max_len(&mut errors, "description", d, MAX_DESCRIPTION_LEN);
        }
        let amount = parse_amount(&mut errors, "amount", &self.amount);
        let currency = parse_currency(
            &mut errors,
            non_blank(self.currency).as_deref().unwrap_or(default_currency),
        );
        let billing_cycle = match non_blank(self.billing_cycle) {
            Some(raw) => known_billing_cycle(&mut errors, &raw),
            None => BillingCycle::Monthly,
        };
        let status = match non_blank(self.status) {
            Some(raw) => known_subscription_status(&mut errors, &raw),
            None => SubscriptionStatus::Active,
        };
        let start_date = match non_blank(self.start_date) {
            Some(raw) => parse_date(&mut errors, "start_date", &raw).unwrap_or(today),
            None => today,
        };
        if let Some(day) = self.billing_day {
            if !(1..=28).contains(&day) {
                errors.add("billing_day", "must be between 1 and 28");
            }
        }

        let next_billing_date = match non_blank(self.next_billing_date) {
            Some(raw) => parse_date(&mut errors, "next_billing_date", &raw),
            None => next_billing_date(start_date, &billing_cycle, self.billing_day),
        };
        let next_billing_date = match next_billing_date {
            Some(next) if next < start_date => {
                errors.add("next_billing_date", "must not be before the start date");
                start_date
            }
            Some(next) => next,
            None => {
                if errors.is_empty() {
                    errors.add("next_billing_date", "could not be derived");
                }
                start_date
            }
        };

        errors.finish(CreateSubscription {
            client_id: client_id.unwrap_or_default(),
            name,
            description,
            amount: amount.unwrap_or_default(),
            currency,
            billing_cycle,
            status,
            start_date,
            next_billing_date,
        })
    }
}

/// Partial subscription update input.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdateForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub billing_cycle: Option<String>,
    pub status: Option<String>,
    pub next_billing_date: Option<String>,
}

impl SubscriptionUpdateForm {
    pub fn validate(self) -> Result<UpdateSubscription, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self
            .name
            .map(|n| required_text(&mut errors, "name", &n, MAX_NAME_LEN));
        let description = non_blank(self.description);
        if let Some(ref d) = description {
            check_max_len(&mut errors, "description", d, MAX_DESCRIPTION_LEN);
        }
        let amount = self
            .amount
            .and_then(|a| parse_amount(&mut errors, "amount", &a));
        let billing_cycle =
            non_blank(self.billing_cycle).map(|raw| known_billing_cycle(&mut errors, &raw));
        let status =
            non_blank(self.status).map(|raw| known_subscription_status(&mut errors, &raw));
        let next_billing_date = non_blank(self.next_billing_date)
            .and_then(|raw| parse_date(&mut errors, "next_billing_date", &raw));

        let update = UpdateSubscription {
            name,
            description,
            amount,
            billing_cycle,
            status,
            next_billing_date,
        };
        if update.is_empty() && errors.is_empty() {
            errors.add("update", "no field to update");
        }
        errors.finish(update)
    }
}

/// New journal entry input.
#[derive(Debug, Clone, Default)]
pub struct JournalEntryForm {
    pub client_id: String,
    pub subscription_id: Option<String>,
    pub title: String,
    pub description: String,
    pub value_amount: Option<String>,
    pub value_type: Option<String>,
    pub intervention_date: Option<String>,
}

impl JournalEntryForm {
    pub fn validate(self, today: NaiveDate) -> Result<CreateJournalEntry, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let client_id = parse_uuid(&mut errors, "client_id", &self.client_id);
        let subscription_id = non_blank(self.subscription_id)
            .and_then(|raw| parse_uuid(&mut errors, "subscription_id", &raw));
        let title = required_text(&mut errors, "title", &self.title, MAX_TITLE_LEN);
        let description = required_text(
            &mut errors,
            "description",
            &self.description,
            MAX_DESCRIPTION_LEN,
        );
        let value_amount = non_blank(self.value_amount)
            .and_then(|raw| parse_amount(&mut errors, "value_amount", &raw));
        let value_type = non_blank(self.value_type).and_then(|raw| {
            let value_type = ValueType::from(choice(&raw).as_str());
            if value_type.is_recognized() {
                Some(value_type)
            } else {
                errors.add(
                    "value_type",
                    format!(
                        "unknown value type '{}' (expected time_saved, revenue_generated, cost_reduced or other)",
                        raw
                    ),
                );
                None
            }
        });
        let intervention_date = match non_blank(self.intervention_date) {
            Some(raw) => parse_date(&mut errors, "intervention_date", &raw).unwrap_or(today),
            None => today,
        };

        errors.finish(CreateJournalEntry {
            client_id: client_id.unwrap_or_default(),
            subscription_id,
            title,
            description,
            value_amount,
            value_type,
            intervention_date,
        })
    }
}

/// Public signup page input.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub company_name: String,
    pub phone: Option<String>,
}

impl SignupForm {
    pub fn validate(self) -> Result<CreateSignup, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = self.email.trim().to_string();
        check_email(&mut errors, "email", &email);
        let company_name =
            required_text(&mut errors, "company_name", &self.company_name, MAX_NAME_LEN);

        errors.finish(CreateSignup {
            email,
            company_name,
            phone: non_blank(self.phone),
        })
    }
}

/// Agency registration input.
#[derive(Debug, Clone, Default)]
pub struct AgencyForm {
    pub name: String,
    pub owner_email: String,
    pub owner_first_name: Option<String>,
    pub owner_last_name: Option<String>,
}

impl AgencyForm {
    pub fn validate(self) -> Result<CreateAgency, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", &self.name, MAX_NAME_LEN);
        let owner_email = self.owner_email.trim().to_string();
        check_email(&mut errors, "owner_email", &owner_email);

        errors.finish(CreateAgency {
            name,
            owner_email,
            owner_first_name: non_blank(self.owner_first_name),
            owner_last_name: non_blank(self.owner_last_name),
        })
    }
}

/// Trimmed value, or `None` when blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max_len: usize,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "is required");
    } else {
        check_max_len(errors, field, value, max_len);
    }
    value.to_string()
}

fn check_max_len(errors: &mut ValidationErrors, field: &'static str, value: &str, max_len: usize) {
    if value.chars().count() > max_len {
        errors.add(field, format!("must be at most {} characters", max_len));
    }
}

fn check_email(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.add(field, "is required");
    } else if !is_valid_email(value) {
        errors.add(field, format!("'{}' is not a valid email address", value));
    }
}

/// Loose address check: one `@`, a non-empty local part and a dotted domain.
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Parse a non-negative money amount. A decimal comma is accepted.
fn parse_amount(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        errors.add(field, "is required");
        return None;
    }
    match Decimal::from_str(&normalized) {
        Ok(amount) if amount.is_sign_negative() && !amount.is_zero() => {
            errors.add(field, "must not be negative");
            None
        }
        Ok(amount) => Some(amount),
        Err(_) => {
            errors.add(field, format!("'{}' is not a number", raw.trim()));
            None
        }
    }
}

fn parse_date(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, format!("'{}' is not a date (expected YYYY-MM-DD)", raw));
            None
        }
    }
}

fn parse_uuid(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> Option<Uuid> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, "is required");
        return None;
    }
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, format!("'{}' is not a valid identifier", raw));
            None
        }
    }
}

fn parse_currency(errors: &mut ValidationErrors, raw: &str) -> String {
    let code = raw.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        errors.add("currency", format!("'{}' is not a currency code", raw));
    }
    code
}

/// Typed choices are case-insensitive and may be padded. Stored values are not.
fn choice(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn known_client_status(errors: &mut ValidationErrors, raw: &str) -> ClientStatus {
    let status = ClientStatus::from(choice(raw).as_str());
    if !status.is_recognized() {
        errors.add(
            "status",
            format!("unknown client status '{}' (expected active, inactive or lead)", raw),
        );
    }
    status
}

fn known_subscription_status(errors: &mut ValidationErrors, raw: &str) -> SubscriptionStatus {
    let status = match choice(raw).as_str() {
        "canceled" => SubscriptionStatus::Cancelled,
        other => SubscriptionStatus::from(other),
    };
    if !status.is_recognized() {
        errors.add(
            "status",
            format!(
                "unknown subscription status '{}' (expected active, paused, cancelled or at_risk)",
                raw
            ),
        );
    }
    status
}

fn known_billing_cycle(errors: &mut ValidationErrors, raw: &str) -> BillingCycle {
    let cycle = match choice(raw).as_str() {
        "yearly" => BillingCycle::Annual,
        other => BillingCycle::from(other),
    };
    if !cycle.is_recognized() {
        errors.add(
            "billing_cycle",
            format!(
                "unknown billing cycle '{}' (expected monthly, quarterly or annual)",
                raw
            ),
        );
    }
    cycle
}
