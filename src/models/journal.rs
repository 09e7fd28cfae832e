//! Value journal: billable interventions performed for a client.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The kind of value an intervention delivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    TimeSaved,
    RevenueGenerated,
    CostReduced,
    Other,
    Unrecognized(String),
}

impl ValueType {
    pub fn as_str(&self) -> &str {
        match self {
            ValueType::TimeSaved => "time_saved",
            ValueType::RevenueGenerated => "revenue_generated",
            ValueType::CostReduced => "cost_reduced",
            ValueType::Other => "other",
            ValueType::Unrecognized(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ValueType::Unrecognized(_))
    }

    pub fn label(&self) -> &str {
        match self {
            ValueType::TimeSaved => "Time saved",
            ValueType::RevenueGenerated => "Revenue generated",
            ValueType::CostReduced => "Cost reduced",
            ValueType::Other => "Other",
            ValueType::Unrecognized(_) => "Unknown",
        }
    }
}

impl From<&str> for ValueType {
    fn from(s: &str) -> Self {
        match s {
            "time_saved" => ValueType::TimeSaved,
            "revenue_generated" => ValueType::RevenueGenerated,
            "cost_reduced" => ValueType::CostReduced,
            "other" => ValueType::Other,
            _ => ValueType::Unrecognized(s.to_string()),
        }
    }
}

impl From<String> for ValueType {
    fn from(s: String) -> Self {
        ValueType::from(s.as_str())
    }
}

impl From<ValueType> for String {
    fn from(value_type: ValueType) -> Self {
        value_type.as_str().to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One intervention logged for a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub client_id: Uuid,
    #[serde(default)]
    pub subscription_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub value_amount: Option<Decimal>,
    #[serde(default)]
    pub value_type: Option<ValueType>,
    pub intervention_date: NaiveDate,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A journal row joined with client and subscription names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntryView {
    #[serde(flatten)]
    pub entry: JournalEntry,
    pub client_name: Option<String>,
    pub subscription_name: Option<String>,
}

impl AsRef<JournalEntry> for JournalEntry {
    fn as_ref(&self) -> &JournalEntry {
        self
    }
}

impl AsRef<JournalEntry> for JournalEntryView {
    fn as_ref(&self) -> &JournalEntry {
        &self.entry
    }
}

/// Fields required to log a new intervention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateJournalEntry {
    pub client_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub value_amount: Option<Decimal>,
    pub value_type: Option<ValueType>,
    pub intervention_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_from_str() {
        assert_eq!(ValueType::from("time_saved"), ValueType::TimeSaved);
        assert_eq!(ValueType::from("cost_reduced"), ValueType::CostReduced);
        assert!(!ValueType::from("Cost_Reduced").is_recognized());
        assert_eq!(
            ValueType::from("goodwill"),
            ValueType::Unrecognized("goodwill".to_string())
        );
        assert_eq!(ValueType::RevenueGenerated.label(), "Revenue generated");
    }

    #[test]
    fn test_entry_optional_fields() {
        let json = r#"{
            "id": "6f1c2d59-6d5e-4a4b-9a53-0c8f3b2f7a10",
            "agency_id": "0b6f9a43-2f58-4bde-8c3c-1e9d1f0f8f11",
            "client_id": "1c9e2f2a-3b4d-4e5f-8a9b-0c1d2e3f4a5b",
            "title": "SEO audit",
            "description": "Audited product pages",
            "value_type": "time_saved",
            "value_amount": 3,
            "intervention_date": "2024-01-25",
            "created_at": "2024-01-25T17:00:00Z",
            "updated_at": "2024-01-25T17:00:00Z"
        }"#;
        let entry: JournalEntry = serde_json::from_str(json).unwrap();
        assert!(entry.subscription_id.is_none());
        assert_eq!(entry.value_type, Some(ValueType::TimeSaved));
        assert_eq!(entry.value_amount, Some(Decimal::from(3)));
    }
}
