use serde::{Deserialize, Serialize};

/// Row highlight for the status table, keyed by exact unit name.
pub fn row_color(unit: &str) -> Option<&'static str> {
    match unit {
        "BN" => Some("rgba(0,255,0,.5)"),
        "Anzio" => Some("rgba(255,127,0,.5)"),
        "Bastogne" => Some("rgba(255,0,0,.5)"),
        "Carentan" => Some("rgba(0,0,255,.5)"),
        _ => None,
    }
}

/// Number of columns shown for each unit row.
pub const TABLE_COLUMNS: usize = 4;

/// Pad or truncate a raw sheet row to the table's column count.
pub fn table_cells(row: &[String]) -> Vec<String> {
    (0..TABLE_COLUMNS)
        .map(|i| row.get(i).cloned().unwrap_or_default())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notes {
    pub title: String,
    pub items: Vec<String>,
}

impl Notes {
    /// First row is the title, each later row is one note in its first cell.
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let mut iter = rows.iter();
        let title = iter
            .next()
            .and_then(|r| r.first())
            .cloned()
            .unwrap_or_default();
        let items = iter
            .filter_map(|r| r.first())
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect();
        Notes { title, items }
    }
}
