pub mod dispatch;
pub mod error;
pub mod models;
pub mod presence;
pub mod reconcile;
pub mod registry;
pub mod table;
