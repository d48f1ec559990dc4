pub mod map_view;
pub mod notes_panel;
pub mod status_table;
