use crate::cli::core::{CommandError, CommandResult};
use crate::cli::help;
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("version", "Show the version and build stamp", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit).with_aliases(&["quit"]),
    ]
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    io::print_info(build_info::version_line());
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(command) = args.first().map(|name| name.to_lowercase()) {
        if let Some(command) = context.command(&command) {
            help::print_command(command);
        } else {
            context.suggest_command(args[0]);
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

#[cfg(test)]
mod tests {
    use crate::cli::core::LoopControl;
    use crate::cli::test_support::TestShell;

    #[test]
    fn exit_stops_the_loop_and_help_never_fails() {
        let mut shell = TestShell::new();
        assert_eq!(
            shell.context.process_line("exit").unwrap(),
            LoopControl::Exit
        );
        shell.run("help").unwrap();
        shell.run("help summary").unwrap();
        shell.run("help summry").unwrap();
        shell.run("version").unwrap();
        shell.run("help rm").unwrap();
        assert_eq!(
            shell.context.process_line("QUIT").unwrap(),
            LoopControl::Exit
        );
        assert_eq!(
            shell.context.process_line("sumary").unwrap(),
            LoopControl::Continue
        );
    }
}
