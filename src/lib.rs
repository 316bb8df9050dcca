//! SQL text for a database dashboard: report presets compiled from log
//! filters, and row-count statements for a selected table.

pub mod app;
pub mod error;
pub mod execute;
pub mod report;
pub mod table;
