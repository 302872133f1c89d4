// Adapters layer: concrete implementations for external systems (Reddit, SQLite, spreadsheets).

pub mod input;
pub mod output;
pub mod reddit;
pub mod sqlite;
pub mod xlsx;
