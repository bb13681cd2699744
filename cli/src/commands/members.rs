use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use pantry_core::db::Database;
use pantry_core::models::NewFamilyMember;

use super::helpers::truncate;

pub(crate) fn cmd_member_add(
    db: &Database,
    name: &str,
    role: Option<String>,
    restrictions: Vec<String>,
    json: bool,
) -> Result<()> {
    let member = db.insert_family_member(&NewFamilyMember {
        name: name.to_string(),
        role,
        dietary_restrictions: restrictions,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&member)?);
    } else {
        println!("Added {} (id {})", member.name, member.id);
    }
    Ok(())
}

pub(crate) fn cmd_member_list(db: &Database, json: bool) -> Result<()> {
    let members = db.list_family_members()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&members)?);
    } else if members.is_empty() {
        eprintln!("No family members. Use `pantry member add` to add one.");
    } else {
        #[derive(Tabled)]
        struct MemberRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Role")]
            role: String,
            #[tabled(rename = "Dietary restrictions")]
            restrictions: String,
        }

        let rows: Vec<MemberRow> = members
            .iter()
            .map(|m| MemberRow {
                id: m.id,
                name: truncate(&m.name, 30),
                role: m.role.clone().unwrap_or_default(),
                restrictions: truncate(&m.dietary_restrictions.join(", "), 40),
            })
            .collect();
        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }
    Ok(())
}

pub(crate) fn cmd_member_remove(db: &Database, id: i64, json: bool) -> Result<()> {
    let removed = db.delete_family_member(id)?;
    if json {
        println!("{}", serde_json::json!({ "removed": removed, "id": id }));
    } else if removed {
        println!("Removed family member {id}");
    } else {
        eprintln!("No family member with id {id}");
    }
    Ok(())
}
