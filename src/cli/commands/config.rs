use subtrack_config::Config;

use crate::cli::core::{CommandError, CommandResult};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and change application settings",
        "config [show|set <key> <value>]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        show_config(context);
        return Ok(());
    }

    match args[0].to_lowercase().as_str() {
        "set" => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(format!(
                    "usage: config set <{}> <value>",
                    Config::KEYS.join("|")
                )));
            }
            let key = args[1];
            let value = args[2..].join(" ");
            let mut updated = context.config.clone();
            updated.set_value(key, &value)?;
            context.config = updated;
            context.persist_config()?;
            io::print_success(format!("Set {}.", key.to_ascii_lowercase()));
            if !key.eq_ignore_ascii_case("ui_color_enabled") {
                io::print_hint("Restart the shell for this setting to take effect.");
            }
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{}`",
            other
        ))),
    }
}

fn show_config(context: &ShellContext) {
    output_section("Configuration");
    for (key, value) in context.config.entries() {
        io::print_info(format!("  {:<22} {}", key, value));
    }
    io::print_info(format!(
        "  {:<22} {}",
        "config_file",
        context.config_manager.config_path().display()
    ));
}

#[cfg(test)]
mod tests {
    use crate::cli::test_support::TestShell;

    #[test]
    fn set_persists_valid_values_only() {
        let mut shell = TestShell::new();
        shell.run("config").unwrap();
        shell.run("config set request_timeout_secs 3").unwrap();
        assert_eq!(shell.context.config.request_timeout_secs, 3);

        assert!(shell.run("config set request_timeout_secs 0").is_err());
        assert!(shell.run("config set colour on").is_err());
        assert!(shell.run("config set rates_endpoint ftp://x").is_err());
        assert!(shell.run("config reset").is_err());
        assert_eq!(shell.context.config.request_timeout_secs, 3);

        let reopened = shell.reopen();
        assert_eq!(reopened.context.config.request_timeout_secs, 3);
    }
}
