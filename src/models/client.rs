//! Client model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Relationship status of a client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
    Lead,
    /// A stored value outside the known set.
    Unrecognized(String),
}

impl ClientStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::Lead => "lead",
            ClientStatus::Unrecognized(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ClientStatus::Unrecognized(_))
    }

    /// Human readable label.
    pub fn label(&self) -> &str {
        match self {
            ClientStatus::Active => "Active",
            ClientStatus::Inactive => "Inactive",
            ClientStatus::Lead => "Lead",
            ClientStatus::Unrecognized(_) => "Unknown",
        }
    }
}

impl From<&str> for ClientStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => ClientStatus::Active,
            "inactive" => ClientStatus::Inactive,
            "lead" => ClientStatus::Lead,
            _ => ClientStatus::Unrecognized(s.to_string()),
        }
    }
}

impl From<String> for ClientStatus {
    fn from(s: String) -> Self {
        ClientStatus::from(s.as_str())
    }
}

impl From<ClientStatus> for String {
    fn from(status: ClientStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client of the agency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
        }
    }
}

/// The client columns joined onto subscription rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
}

/// Fields required to create a new client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: ClientStatus,
}

/// Fields that can be updated on an existing client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: Option<ClientStatus>,
}

impl UpdateClient {
    pub fn is_empty(&self) -> bool {
        *self == UpdateClient::default()
    }

    /// Apply every set field to `client`.
    pub fn apply(self, client: &mut Client) {
        if let Some(name) = self.name {
            client.name = name;
        }
        if let Some(email) = self.email {
            client.email = email;
        }
        if let Some(phone) = self.phone {
            client.phone = Some(phone);
        }
        if let Some(company) = self.company {
            client.company = Some(company);
        }
        if let Some(address) = self.address {
            client.address = Some(address);
        }
        if let Some(notes) = self.notes {
            client.notes = Some(notes);
        }
        if let Some(status) = self.status {
            client.status = status;
        }
    }
}
