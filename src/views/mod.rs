//! Plain-text list views over cached resources.

mod list;
mod table;

pub use list::{DeleteOutcome, ListStatus, ListView};
pub use table::{render_table, truncate, Listed};
