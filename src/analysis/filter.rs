//! Free-text search plus one categorical filter over a list of records.
//!
//! One [`RecordFilter`] serves every list view. A view only chooses which
//! text fields the query is matched against and which field the category
//! compares; the matching rules live here once.

use crate::models::{Client, JournalEntryView, SubscriptionView};

/// Category value that disables the categorical filter.
pub const ALL: &str = "all";

/// Reads an optional text field from a record.
pub type TextField<T> = fn(&T) -> Option<&str>;

/// Reads the field a categorical filter compares.
pub type CategoryField<T> = fn(&T) -> &str;

/// Exact-match constraint on one field.
#[derive(Clone)]
pub struct Categorical<T> {
    pub field: CategoryField<T>,
    pub value: String,
}

impl<T> Categorical<T> {
    pub fn new(field: CategoryField<T>, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    fn matches(&self, record: &T) -> bool {
        self.value == ALL || (self.field)(record) == self.value
    }
}

/// A search query and an optional category over records of type `T`.
#[derive(Clone)]
pub struct RecordFilter<T> {
    query: String,
    text_fields: Vec<TextField<T>>,
    category_field: Option<CategoryField<T>>,
    category: Option<String>,
}

impl<T> RecordFilter<T> {
    pub fn new(text_fields: Vec<TextField<T>>) -> Self {
        Self {
            query: String::new(),
            text_fields,
            category_field: None,
            category: None,
        }
    }

    /// Field compared by [`RecordFilter::with_category`].
    pub fn category_field(mut self, field: CategoryField<T>) -> Self {
        self.category_field = Some(field);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Restrict to records whose category field equals `value`. `None` and
    /// [`ALL`] leave the list unrestricted.
    pub fn with_category(mut self, value: Option<impl Into<String>>) -> Self {
        self.category = value.map(Into::into);
        self
    }

    fn categorical(&self) -> Option<Categorical<T>> {
        match (self.category_field, &self.category) {
            (Some(field), Some(value)) => Some(Categorical::new(field, value.clone())),
            _ => None,
        }
    }

    /// Records matching both the query and the category, in input order.
    pub fn apply(&self, records: &[T]) -> Vec<T>
    where
        T: Clone,
    {
        filter_records(
            records,
            &self.query,
            &self.text_fields,
            self.categorical().as_ref(),
        )
    }
}

/// Filter `records` by a case-insensitive substring query over `text_fields`
/// and an optional categorical constraint.
///
/// An empty query matches every record. A record matches the query when any
/// of its text fields contains it; an unset field never matches. The
/// categorical value [`ALL`] matches every record. Relative order is kept.
pub fn filter_records<T: Clone>(
    records: &[T],
    query: &str,
    text_fields: &[TextField<T>],
    categorical: Option<&Categorical<T>>,
) -> Vec<T> {
    let needle = query.to_lowercase();

    records
        .iter()
        .filter(|record| matches_query(*record, &needle, text_fields))
        .filter(|record| categorical.map_or(true, |c| c.matches(record)))
        .cloned()
        .collect()
}

fn matches_query<T>(record: &T, needle: &str, text_fields: &[TextField<T>]) -> bool {
    needle.is_empty()
        || text_fields.iter().any(|field| {
            field(record)
                .map(|value| value.to_lowercase().contains(needle))
                .unwrap_or(false)
        })
}

fn client_name(c: &Client) -> Option<&str> {
    Some(c.name.as_str())
}

fn client_email(c: &Client) -> Option<&str> {
    Some(c.email.as_str())
}

fn client_company(c: &Client) -> Option<&str> {
    c.company.as_deref()
}

fn client_status(c: &Client) -> &str {
    c.status.as_str()
}

/// Client list: name, email and company; category is the client status.
pub fn client_filter() -> RecordFilter<Client> {
    RecordFilter::new(vec![
        client_name as TextField<Client>,
        client_email,
        client_company,
    ])
    .category_field(client_status)
}

fn subscription_name(s: &SubscriptionView) -> Option<&str> {
    Some(s.subscription.name.as_str())
}

fn subscription_description(s: &SubscriptionView) -> Option<&str> {
    s.subscription.description.as_deref()
}

fn subscription_client_name(s: &SubscriptionView) -> Option<&str> {
    s.client_name()
}

fn subscription_status(s: &SubscriptionView) -> &str {
    s.subscription.status.as_str()
}

/// Subscription list: service name, description and client name; category is
/// the subscription status.
pub fn subscription_filter() -> RecordFilter<SubscriptionView> {
    RecordFilter::new(vec![
        subscription_name as TextField<SubscriptionView>,
        subscription_description,
        subscription_client_name,
    ])
    .category_field(subscription_status)
}

fn entry_title(e: &JournalEntryView) -> Option<&str> {
    Some(e.entry.title.as_str())
}

fn entry_description(e: &JournalEntryView) -> Option<&str> {
    Some(e.entry.description.as_str())
}

fn entry_client_name(e: &JournalEntryView) -> Option<&str> {
    e.client_name.as_deref()
}

fn entry_value_type(e: &JournalEntryView) -> &str {
    e.entry.value_type.as_ref().map_or("", |v| v.as_str())
}

/// Journal list: title, description and client name; category is the value
/// type (entries without one never match a specific type).
pub fn journal_filter() -> RecordFilter<JournalEntryView> {
    RecordFilter::new(vec![
        entry_title as TextField<JournalEntryView>,
        entry_description,
        entry_client_name,
    ])
    .category_field(entry_value_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientStatus, JournalEntry, ValueType};
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn create_test_client(name: &str, company: Option<&str>, status: ClientStatus) -> Client {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
        Client {
            id: Uuid::new_v4(),
            agency_id: Uuid::nil(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            company: company.map(String::from),
            address: None,
            notes: None,
            status,
            created_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn create_test_entry(
        title: &str,
        description: &str,
        client_name: Option<&str>,
        value_type: Option<ValueType>,
    ) -> JournalEntryView {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 25, 17, 0, 0).unwrap();
        JournalEntryView {
            entry: JournalEntry {
                id: Uuid::new_v4(),
                agency_id: Uuid::nil(),
                client_id: Uuid::nil(),
                subscription_id: None,
                title: title.to_string(),
                description: description.to_string(),
                value_amount: None,
                value_type,
                intervention_date: NaiveDate::from_ymd_opt(2024, 1, 25).unwrap(),
                created_by: None,
                created_at,
                updated_at: created_at,
            },
            client_name: client_name.map(String::from),
            subscription_name: None,
        }
    }

    fn sample_clients() -> Vec<Client> {
        vec![
            create_test_client("TechCorp", None, ClientStatus::Active),
            create_test_client("DesignStudio", Some("Studio SARL"), ClientStatus::Lead),
            create_test_client("StartupXYZ", Some("Tech Ventures"), ClientStatus::Active),
        ]
    }

    fn names(clients: &[Client]) -> Vec<&str> {
        clients.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_empty_query_returns_input_in_order() {
        let clients = sample_clients();
        let filtered = client_filter().apply(&clients);
        assert_eq!(names(&filtered), names(&clients));
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let clients = sample_clients();
        let filtered = client_filter().with_query("tech").apply(&clients);
        assert_eq!(names(&filtered), vec!["TechCorp", "StartupXYZ"]);

        let filtered = client_filter().with_query("TECHCORP").apply(&clients);
        assert_eq!(names(&filtered), vec!["TechCorp"]);
    }

    #[test]
    fn test_unset_field_does_not_exclude_record() {
        // TechCorp has no company but still matches on its name.
        let clients = sample_clients();
        let filtered = client_filter().with_query("corp").apply(&clients);
        assert_eq!(names(&filtered), vec!["TechCorp"]);

        let filtered = client_filter().with_query("sarl").apply(&clients);
        assert_eq!(names(&filtered), vec!["DesignStudio"]);
    }

    #[test]
    fn test_category_all_is_ignored() {
        let clients = sample_clients();
        let all = client_filter().with_category(Some(ALL)).apply(&clients);
        assert_eq!(all.len(), 3);

        let active = client_filter().with_category(Some("active")).apply(&clients);
        assert_eq!(names(&active), vec!["TechCorp", "StartupXYZ"]);

        let none: Option<&str> = None;
        assert_eq!(client_filter().with_category(none).apply(&clients).len(), 3);
    }

    #[test]
    fn test_query_and_category_combine() {
        let clients = sample_clients();
        let filtered = client_filter()
            .with_query("studio")
            .with_category(Some("active"))
            .apply(&clients);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_filter_records_does_not_touch_input() {
        let clients = sample_clients();
        let fields: Vec<TextField<Client>> = vec![client_name];
        let lead = Categorical::new(client_status, "lead");

        let filtered = filter_records(&clients, "", &fields, Some(&lead));

        assert_eq!(names(&filtered), vec!["DesignStudio"]);
        assert_eq!(clients.len(), 3);
    }

    #[test]
    fn test_journal_search_scenario() {
        let entries = vec![
            create_test_entry("SEO optimisation", "Product pages", Some("TechCorp"), None),
            create_test_entry("Social posts", "Five posts published", Some("DesignStudio"), None),
            create_test_entry("Monthly review", "Keyword ranking for seo", Some("StartupXYZ"), None),
            create_test_entry("Ads audit", "CPC reduced", Some("SEO Masters"), None),
            create_test_entry("Newsletter", "Campaign sent", None, None),
        ];

        let filtered = journal_filter().with_query("seo").apply(&entries);

        let titles: Vec<&str> = filtered.iter().map(|e| e.entry.title.as_str()).collect();
        assert_eq!(titles, vec!["SEO optimisation", "Monthly review", "Ads audit"]);
    }

    #[test]
    fn test_journal_value_type_category() {
        let entries = vec![
            create_test_entry("A", "a", None, Some(ValueType::TimeSaved)),
            create_test_entry("B", "b", None, None),
            create_test_entry("C", "c", None, Some(ValueType::CostReduced)),
        ];

        let filtered = journal_filter()
            .with_category(Some("time_saved"))
            .apply(&entries);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].entry.title, "A");
    }
}
