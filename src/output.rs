use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Render the first `max_rows` rows as a Markdown table.
pub fn preview_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.iter().take(max_rows))
        .with(Style::markdown())
        .to_string()
}
