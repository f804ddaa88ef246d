//! CLI presentation: text formatters per command family.
//! JSON output is the response envelope and needs no formatter.

mod contact;
mod group;
mod shared;

pub use contact::{format_contact_detail_text, format_contact_list_text};
pub use group::format_group_list_text;
pub use shared::{format_integrity_report_text, format_outcome_text};
