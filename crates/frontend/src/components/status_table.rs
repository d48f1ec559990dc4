use dioxus::prelude::*;

use battle_tracker_shared::table::{row_color, table_cells};

fn row_style(cells: &[String]) -> String {
    cells
        .first()
        .and_then(|unit| row_color(unit))
        .map(|color| format!("background-color: {color};"))
        .unwrap_or_default()
}

/// Unit rows exactly as the sheet reports them, colored by unit.
#[component]
pub fn StatusTable(rows: Vec<Vec<String>>) -> Element {
    rsx! {
        div { class: "panel status-table",
            table { id: "battle_table",
                tbody {
                    for (i, row) in rows.iter().enumerate() {
                        tr { key: "{i}", style: row_style(row),
                            for (j, cell) in table_cells(row).into_iter().enumerate() {
                                td { key: "{j}", "{cell}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
