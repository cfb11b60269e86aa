use std::path::Path;

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use crate::error::DashboardError;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), DashboardError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Report written");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DashboardError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!(path = %path.display(), "Summary written");
    Ok(())
}

/// Render up to `max_rows` rows as a markdown table.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}
