use dioxus::prelude::*;

use battle_tracker_shared::table::Notes;

#[component]
pub fn NotesPanel(notes: Notes) -> Element {
    rsx! {
        div { class: "panel notes",
            h3 { id: "notes_title", "{notes.title}" }
            ul { id: "notes_list",
                for (i, item) in notes.items.iter().enumerate() {
                    li { key: "{i}", "{item}" }
                }
            }
        }
    }
}
