//! CLI subcommand implementations.

pub mod cancel;
pub mod hook;
pub mod init;
pub mod start;
pub mod status;
pub mod stop;
pub mod uninstall;
pub mod util;
