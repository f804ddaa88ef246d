//! Group presentation: list table with member counts.

use crate::store::Group;
use comfy_table::Table;

pub fn format_group_list_text(groups: &[(Group, usize)]) -> String {
    if groups.is_empty() {
        return "No groups found.\n\nUse 'roster group add <name>' to create one.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["ID", "Name", "Members"]);
    for (group, members) in groups {
        table.add_row(vec![
            group.id.to_string(),
            group.group_name.clone(),
            members.to_string(),
        ]);
    }
    format!("{}\n\nTotal: {} group(s)", table, groups.len())
}
