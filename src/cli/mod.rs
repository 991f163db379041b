pub mod commands;
pub mod core;
pub mod format;
pub mod forms;
pub mod help;
pub mod io;
pub mod output;
pub mod registry;
pub mod shell;
pub mod shell_context;
#[cfg(test)]
pub(crate) mod test_support;

pub use shell::run_cli;
