//! Output formatting for CLI results

pub mod formatters;
pub mod table;
