//! Command implementations for the CLI.

mod eve;
mod import;
mod log;
mod recover;

pub use eve::cmd_eve;
pub use import::cmd_import;
pub use log::cmd_log;
pub use recover::cmd_recover;
