//! CLI command handlers, one per file.

mod checksum;
mod fetch;
mod list;
mod path;
mod resolve;

pub use checksum::run_checksum;
pub use fetch::run_fetch;
pub use list::run_list;
pub use path::run_path;
pub use resolve::run_resolve;
