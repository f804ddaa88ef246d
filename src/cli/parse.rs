//! CLI parse: clap types for Roster. No behavior; definitions only.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Roster CLI - contact directory with group membership
#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Contact directory with transactional group membership")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage contacts
    Contact {
        #[command(subcommand)]
        command: ContactCommands,
    },
    /// Manage groups and their members
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Run one raw tagged command, e.g. '{"command":"delete_groups","ids":[3]}'
    Exec {
        /// Command as JSON
        payload: String,
    },
    /// Verify store consistency (membership mirrors, unique indexes)
    Check,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Contact fields shared by add and update.
#[derive(Args, Debug, Clone, Default)]
pub struct ContactArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// Phone number; pass "" to clear
    #[arg(long)]
    pub phone: Option<String>,
    /// Email address; pass "" to clear
    #[arg(long)]
    pub email: Option<String>,
    /// Birth date as YYYY-MM-DD
    #[arg(long)]
    pub birth_date: Option<NaiveDate>,
    #[arg(long)]
    pub owner_id: Option<u64>,
    /// Active flag (true or false)
    #[arg(long)]
    pub status: Option<bool>,
}

#[derive(Subcommand)]
pub enum ContactCommands {
    /// Create a contact
    Add {
        #[command(flatten)]
        fields: ContactArgs,
        /// Groups to join (comma separated ids)
        #[arg(long = "groups", value_delimiter = ',')]
        groups: Vec<u64>,
    },
    /// Update a contact and optionally replace its group set
    Update {
        id: u64,
        #[command(flatten)]
        fields: ContactArgs,
        /// Full desired group set; omit to keep current groups
        #[arg(long = "groups", value_delimiter = ',', conflicts_with = "clear_groups")]
        groups: Option<Vec<u64>>,
        /// Leave every group
        #[arg(long)]
        clear_groups: bool,
    },
    /// Show one contact with its groups
    Get { id: u64 },
    /// List contacts, optionally only members of one group
    List {
        #[arg(long)]
        group: Option<u64>,
    },
    /// Delete contacts and their memberships
    Delete {
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<u64>,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Create a group
    Add {
        name: String,
        /// Initial members (comma separated contact ids)
        #[arg(long = "members", value_delimiter = ',')]
        members: Vec<u64>,
    },
    /// Rename a group
    Rename { id: u64, name: String },
    /// List groups
    List,
    /// Delete groups and their memberships
    Delete {
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<u64>,
    },
    /// Add contacts to a group; existing members are skipped
    AddMembers {
        id: u64,
        #[arg(required = true, value_delimiter = ',')]
        contacts: Vec<u64>,
    },
    /// Remove contacts from a group
    RemoveMembers {
        id: u64,
        #[arg(required = true, value_delimiter = ',')]
        contacts: Vec<u64>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}
