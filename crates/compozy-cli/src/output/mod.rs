use compozy_core::ids::{
    PREFIX_DOCUMENT, PREFIX_EXECUTION, PREFIX_MEMBER, PREFIX_MESSAGE, PREFIX_ORGANIZATION,
    PREFIX_PROBLEM, PREFIX_REPOSITORY, PREFIX_TASK, PREFIX_TRANSITION,
};
use compozy_core::progress::progress_for;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

use table::{Cell, Grid, GridStyle};

const PROGRESS_SLOTS: usize = 10;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => {
            let prefs = ui::prefs();
            let style = GridStyle {
                max_width: prefs.term_width,
                color: prefs.table_color,
            };
            Ok(render_table(&serde_json::to_value(value)?, style))
        }
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn render_table(value: &Value, style: GridStyle) -> String {
    match value {
        Value::Array(items) => rows_table(items, style),
        Value::Object(map) => match listed_rows(map) {
            Some(items) => rows_table(items, style),
            None => record_table(map, style),
        },
        scalar => text_of(scalar),
    }
}

/// List responses wrap their rows next to scalar context fields
/// (`{"problem_id": .., "tasks": [..]}`); the single array is the table.
fn listed_rows(map: &Map<String, Value>) -> Option<&[Value]> {
    let mut arrays = map.values().filter_map(Value::as_array);
    let rows = arrays.next()?;
    let context_is_scalar = map.values().all(|value| !value.is_object());
    (arrays.next().is_none() && context_is_scalar).then_some(rows.as_slice())
}

fn rows_table(items: &[Value], style: GridStyle) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }
    if !items.iter().all(Value::is_object) {
        // Ordered id lists, e.g. `task order`.
        return items
            .iter()
            .enumerate()
            .map(|(index, item)| format!("{:>3}. {}", index + 1, text_of(item)))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let rows: Vec<&Map<String, Value>> = items.iter().filter_map(Value::as_object).collect();
    let columns = columns_for(&rows);
    let mut grid = Grid::new(columns.iter().map(String::as_str));
    for row in rows {
        grid.push(columns.iter().map(|column| cell(column, row)).collect());
    }
    grid.render(style)
}

/// Single entities and aggregate views: one `field  value` row per key,
/// nested records flattened as `parent.child`.
fn record_table(map: &Map<String, Value>, style: GridStyle) -> String {
    let mut grid = Grid::new(["field", "value"]);
    for (key, value) in map {
        match value {
            Value::Object(inner) if !is_sender(inner) => {
                for (child, child_value) in inner {
                    grid.push(vec![
                        Cell::Text(format!("{key}.{child}")),
                        cell_for(child, child_value),
                    ]);
                }
            }
            Value::Array(items) if items.iter().any(Value::is_object) => {
                for (index, item) in items.iter().enumerate() {
                    grid.push(vec![Cell::Text(format!("{key}[{index}]")), Cell::Text(inline(item))]);
                }
            }
            _ => grid.push(vec![Cell::Text(key.clone()), cell_for(key, value)]),
        }
    }
    grid.render(style)
}

/// Columns for a list of rows. Known entities (recognised by id prefix) get a
/// curated set; anything else shows every key in first-seen order.
fn columns_for(rows: &[&Map<String, Value>]) -> Vec<String> {
    let prefix = rows
        .first()
        .and_then(|row| row.get("id"))
        .and_then(Value::as_str)
        .and_then(|id| id.split_once('-'))
        .map(|(prefix, _)| prefix);

    if let Some(curated) = prefix.and_then(curated_columns) {
        return curated
            .iter()
            .copied()
            .filter(|column| {
                *column == "progress" || rows.iter().any(|row| row.contains_key(*column))
            })
            .map(String::from)
            .collect();
    }

    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn curated_columns(prefix: &str) -> Option<&'static [&'static str]> {
    let columns: &'static [&'static str] = match prefix {
        PREFIX_PROBLEM => &["id", "title", "status", "progress", "priority", "updated_at"],
        PREFIX_TASK => &["order_index", "id", "title", "status", "priority", "dependencies"],
        PREFIX_EXECUTION => &["id", "attempt_number", "status", "agent_type", "job_id", "error_message"],
        PREFIX_TRANSITION => &["created_at", "from_status", "to_status", "actor", "reason"],
        PREFIX_MESSAGE => &["id", "sender", "message_type", "is_read", "content"],
        PREFIX_DOCUMENT => &["id", "kind", "version", "word_count", "is_approved", "approved_by"],
        PREFIX_ORGANIZATION => &["id", "slug", "name", "is_active"],
        PREFIX_MEMBER => &["user_id", "role", "invited_by", "joined_at"],
        PREFIX_REPOSITORY => &["id", "name", "provider", "url", "default_branch"],
        _ => return None,
    };
    Some(columns)
}

fn cell(column: &str, row: &Map<String, Value>) -> Cell {
    match row.get(column) {
        Some(value) => cell_for(column, value),
        // Problems carry no stored progress; derive it from the status.
        None if column == "progress" => row
            .get("status")
            .and_then(Value::as_str)
            .map_or(Cell::Empty, |status| progress_cell(progress_for(status))),
        None => Cell::Empty,
    }
}

fn cell_for(key: &str, value: &Value) -> Cell {
    match (key, value) {
        (_, Value::Null) => Cell::Empty,
        ("status" | "from_status" | "to_status", Value::String(status)) => Cell::Status(status.clone()),
        ("progress", Value::Number(n)) => n
            .as_u64()
            .and_then(|p| u8::try_from(p.min(100)).ok())
            .map_or(Cell::Empty, progress_cell),
        ("sender", Value::Object(sender)) => Cell::Text(sender_label(sender)),
        (_, Value::Number(n)) => Cell::Number(n.to_string()),
        (_, other) => Cell::Text(text_of(other)),
    }
}

fn progress_cell(percent: u8) -> Cell {
    let filled = usize::from(percent) * PROGRESS_SLOTS / 100;
    Cell::Text(format!(
        "{}{} {percent:>3}%",
        "█".repeat(filled),
        "░".repeat(PROGRESS_SLOTS - filled)
    ))
}

/// Chat senders serialize as `{"kind": "user", "user_id": ..}` or
/// `{"kind": "agent", "agent": ..}`.
fn is_sender(map: &Map<String, Value>) -> bool {
    map.get("kind").and_then(Value::as_str).is_some_and(|kind| kind == "user" || kind == "agent")
        && (map.contains_key("user_id") || map.contains_key("agent"))
}

fn sender_label(sender: &Map<String, Value>) -> String {
    match (sender.get("user_id"), sender.get("agent")) {
        (Some(Value::String(user)), _) => user.clone(),
        (_, Some(Value::String(agent))) => format!("{agent} (agent)"),
        _ => Value::Object(sender.clone()).to_string(),
    }
}

/// Scalar text; scalar arrays become comma lists.
fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::String(text) => text.clone(),
        Value::Array(items) if items.iter().all(|item| !item.is_object() && !item.is_array()) => {
            items.iter().map(text_of).collect::<Vec<_>>().join(", ")
        }
        other => other.to_string(),
    }
}

/// `key=value` pairs for an object squeezed into one cell.
fn inline(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{key}={}", text_of(value)))
            .collect::<Vec<_>>()
            .join(" "),
        other => text_of(other),
    }
}
