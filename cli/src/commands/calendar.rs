use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use pantry_core::db::Database;
use pantry_core::models::{CalendarEvent, NewCalendarEvent};

use super::helpers::{parse_date, truncate};

pub(crate) fn cmd_calendar_add(
    db: &Database,
    description: &str,
    date: Option<String>,
    kind: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let event = db.insert_calendar_event(&NewCalendarEvent {
        date,
        event_type: kind,
        description: description.to_string(),
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&event)?);
    } else {
        println!(
            "Added '{}' on {} (id {})",
            event.description, event.date, event.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_calendar_list(
    db: &Database,
    date: Option<String>,
    within: i64,
    json: bool,
) -> Result<()> {
    let events = match date {
        Some(d) => db.events_for_date(parse_date(Some(d))?)?,
        None => db.upcoming_events(within)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else if events.is_empty() {
        eprintln!("No upcoming events.");
    } else {
        print_event_table(&events);
    }
    Ok(())
}

pub(crate) fn cmd_calendar_remove(db: &Database, id: i64, json: bool) -> Result<()> {
    let removed = db.delete_calendar_event(id)?;
    if json {
        println!("{}", serde_json::json!({ "removed": removed, "id": id }));
    } else if removed {
        println!("Removed event {id}");
    } else {
        eprintln!("No event with id {id}");
    }
    Ok(())
}

fn print_event_table(events: &[CalendarEvent]) {
    #[derive(Tabled)]
    struct EventRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let rows: Vec<EventRow> = events
        .iter()
        .map(|e| EventRow {
            id: e.id,
            date: e.date.clone(),
            kind: e.event_type.clone().unwrap_or_default(),
            description: truncate(&e.description, 45),
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}
