//! Contact presentation: list table and single-contact detail.

use crate::store::Contact;
use crate::types::GroupIdSet;
use comfy_table::Table;

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

pub fn format_contact_list_text(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return "No contacts found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["ID", "Name", "Email", "Phone", "Status"]);
    for contact in contacts {
        let name = contact.display_name();
        table.add_row(vec![
            contact.id.to_string(),
            or_dash(Some(name.as_str())).to_string(),
            or_dash(contact.email.as_deref()).to_string(),
            or_dash(contact.phone.as_deref()).to_string(),
            if contact.status { "active" } else { "inactive" }.to_string(),
        ]);
    }
    format!("{}\n\nTotal: {} contact(s)", table, contacts.len())
}

pub fn format_contact_detail_text(contact: &Contact, groups: &GroupIdSet) -> String {
    let mut output = format!("Contact: {}\n", contact.id);
    output.push_str(&format!("  First name: {}\n", or_dash(contact.first_name.as_deref())));
    output.push_str(&format!("  Last name:  {}\n", or_dash(contact.last_name.as_deref())));
    output.push_str(&format!("  Email:      {}\n", or_dash(contact.email.as_deref())));
    output.push_str(&format!("  Phone:      {}\n", or_dash(contact.phone.as_deref())));
    if let Some(birth_date) = contact.birth_date {
        output.push_str(&format!("  Birth date: {}\n", birth_date.format("%Y-%m-%d")));
    }
    if let Some(owner_id) = contact.owner_id {
        output.push_str(&format!("  Owner:      {}\n", owner_id));
    }
    output.push_str(&format!(
        "  Status:     {}\n",
        if contact.status { "active" } else { "inactive" }
    ));
    let group_list: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
    output.push_str(&format!(
        "  Groups:     {}\n",
        if group_list.is_empty() {
            "-".to_string()
        } else {
            group_list.join(", ")
        }
    ));
    output.push_str(&format!("  Updated:    {}", contact.updated_at.to_rfc3339()));
    output
}
