//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// AgencyDesk - clients, subscriptions and delivered value for small agencies
///
/// Track the clients of your agency, their recurring subscriptions and the
/// work delivered to them. Dashboard and lists render as Markdown or JSON.
///
/// Examples:
///   agencydesk init-data --agency "Mon Agence" --email hello@agence.com
///   agencydesk dashboard
///   agencydesk clients list --search tech --status active
///   agencydesk subscriptions add --client <ID> --name SEO --amount 1500
///   agencydesk journal list --search seo --format json
///   agencydesk init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .agencydesk.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Data file holding every agency's records
    #[arg(long, value_name = "FILE", env = "AGENCYDESK_DATA", global = true)]
    pub data: Option<PathBuf>,

    /// Profile id of the acting user
    #[arg(short, long, value_name = "UUID", env = "AGENCYDESK_USER", global = true)]
    pub user: Option<Uuid>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a default .agencydesk.toml configuration file
    InitConfig,

    /// Register an agency and its first admin profile
    InitData {
        /// Agency name
        #[arg(long)]
        agency: String,

        /// Owner email address
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },

    /// Show MRR, client counts, recent activity and upcoming renewals
    Dashboard {
        /// Exit with code 2 when any subscription is at risk
        ///
        /// Useful for scheduled checks.
        #[arg(long)]
        fail_on_at_risk: bool,

        /// Renewal horizon in days (default from config)
        #[arg(long, value_name = "DAYS")]
        renewals_within: Option<i64>,
    },

    /// Manage clients
    #[command(subcommand)]
    Clients(ClientCommand),

    /// Manage subscriptions
    #[command(subcommand)]
    Subscriptions(SubscriptionCommand),

    /// Browse and log delivered value
    #[command(subcommand)]
    Journal(JournalCommand),

    /// Public signup pages (no session required)
    #[command(subcommand)]
    Public(PublicCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum ClientCommand {
    /// List clients with their monthly revenue
    List {
        /// Search name, email and company
        #[arg(long)]
        search: Option<String>,

        /// Only clients with this status (active, inactive, lead, all)
        #[arg(long)]
        status: Option<String>,
    },

    /// Add a client
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// active, inactive or lead (default active)
        #[arg(long)]
        status: Option<String>,
    },

    /// Change fields of a client
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a client with its subscriptions and journal entries
    Delete { id: Uuid },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubscriptionCommand {
    /// List subscriptions
    List {
        /// Search service name, description and client name
        #[arg(long)]
        search: Option<String>,

        /// Only subscriptions with this status (active, paused, cancelled, at_risk, all)
        #[arg(long)]
        status: Option<String>,
    },

    /// Add a subscription for a client
    Add {
        #[arg(long, value_name = "CLIENT_ID")]
        client: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: String,
        /// ISO code (default from config)
        #[arg(long)]
        currency: Option<String>,
        /// monthly, quarterly or annual (default monthly)
        #[arg(long, value_name = "CYCLE")]
        cycle: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// YYYY-MM-DD (default today)
        #[arg(long, value_name = "DATE")]
        start: Option<String>,
        /// YYYY-MM-DD (default start plus one cycle)
        #[arg(long, value_name = "DATE")]
        next_billing: Option<String>,
        /// Day of month, 1 to 28, for the derived next billing date
        #[arg(long, value_name = "DAY")]
        billing_day: Option<u32>,
    },

    /// Change fields of a subscription
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long, value_name = "CYCLE")]
        cycle: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, value_name = "DATE")]
        next_billing: Option<String>,
    },

    /// Print the public signup link of a subscription
    Link { id: Uuid },
}

#[derive(Subcommand, Debug, Clone)]
pub enum JournalCommand {
    /// List journal entries, latest intervention first
    List {
        /// Search title, description and client name
        #[arg(long)]
        search: Option<String>,

        /// Only entries of this value type (time_saved, revenue_generated, cost_reduced, other, all)
        #[arg(long)]
        value_type: Option<String>,
    },

    /// Log an intervention
    Add {
        #[arg(long, value_name = "CLIENT_ID")]
        client: String,
        #[arg(long, value_name = "SUBSCRIPTION_ID")]
        subscription: Option<String>,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Declared value (hours or money, depending on the type)
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        value_type: Option<String>,
        /// YYYY-MM-DD (default today)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PublicCommand {
    /// Show the public offer of a subscription
    Show { subscription_id: Uuid },

    /// Sign up to a subscription as a prospect
    Signup {
        subscription_id: Uuid,
        #[arg(long)]
        email: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        phone: Option<String>,
    },
}

/// Output format for rendered views.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Command::Dashboard {
            renewals_within: Some(days),
            ..
        } = self.command
        {
            if days < 0 {
                return Err("Renewal horizon must not be negative".to_string());
            }
        }

        if let Some(ref data) = self.data {
            if data.is_dir() {
                return Err(format!("Data path is a directory: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            config: None,
            data: None,
            user: None,
            format: None,
            verbose: false,
            quiet: false,
            command,
        }
    }

    #[test]
    fn test_parse_subcommand() {
        let args = Args::try_parse_from([
            "agencydesk",
            "clients",
            "list",
            "--search",
            "tech",
            "--status",
            "active",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.format, Some(OutputFormat::Json));
        match args.command {
            Command::Clients(ClientCommand::List { search, status }) => {
                assert_eq!(search.as_deref(), Some("tech"));
                assert_eq!(status.as_deref(), Some("active"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_uuid() {
        let result = Args::try_parse_from(["agencydesk", "clients", "delete", "not-a-uuid"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_negative_horizon() {
        let args = make_args(Command::Dashboard {
            fail_on_at_risk: false,
            renewals_within: Some(-1),
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
