use std::io::{self, BufRead, Lines, StdinLock};

use rustyline::{
    completion::Completer, error::ReadlineError, highlight::Highlighter, hint::Hinter,
    history::DefaultHistory, validate::Validator, Cmd, Context as ReadlineContext, Editor,
    Helper, KeyEvent,
};

use crate::cli::core::{CommandError, LoopControl};
use crate::cli::output::info as output_info;
use crate::cli::shell_context::{CliMode, ShellContext};
use crate::errors::CliError;

/// Setting this variable switches the shell to reading commands from stdin.
pub const SCRIPT_ENV: &str = "SUBTRACK_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    match mode {
        CliMode::Interactive => {
            output_info("SubTrack shell. Type `help` for commands.");
            let mut terminal = Terminal::new(context.command_words())?;
            drive(&mut context, &mut terminal)
        }
        CliMode::Script => drive(&mut context, &mut ScriptInput::stdin()),
    }
}

/// What a line source produced for one read.
enum Input {
    Line(String),
    Interrupted,
    Closed,
}

/// Where the shell reads commands from.
trait LineSource {
    fn read(&mut self, prompt: &str) -> Result<Input, CliError>;
}

/// Interactive terminal with history and command-word completion.
struct Terminal {
    editor: Editor<CommandWords, DefaultHistory>,
}

impl Terminal {
    fn new(words: Vec<&'static str>) -> Result<Self, CliError> {
        let mut editor = Editor::<CommandWords, DefaultHistory>::new()?;
        editor.set_helper(Some(CommandWords::new(words)));
        editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
        Ok(Self { editor })
    }
}

impl LineSource for Terminal {
    fn read(&mut self, prompt: &str) -> Result<Input, CliError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.trim()).ok();
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => {
                output_info("Exiting shell.");
                Ok(Input::Closed)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Piped stdin. `#` lines are comments.
struct ScriptInput<R> {
    lines: Lines<R>,
}

impl ScriptInput<StdinLock<'static>> {
    fn stdin() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }
}

impl<R: BufRead> LineSource for ScriptInput<R> {
    fn read(&mut self, _prompt: &str) -> Result<Input, CliError> {
        for line in self.lines.by_ref() {
            let line = line?;
            if !line.trim_start().starts_with('#') {
                return Ok(Input::Line(line));
            }
        }
        Ok(Input::Closed)
    }
}

/// Runs commands from `source` until it closes or a command asks to exit.
fn drive(context: &mut ShellContext, source: &mut dyn LineSource) -> Result<(), CliError> {
    loop {
        let line = match source.read(&context.prompt())? {
            Input::Line(line) => line,
            Input::Interrupted if context.confirm_exit()? => return Ok(()),
            Input::Interrupted => continue,
            Input::Closed => return Ok(()),
        };
        match run_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => return Ok(()),
            Err(err) => context.report_error(err),
        }
    }
}

/// Splits `line` shell-style and dispatches the first word.
pub(crate) fn run_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = parse_command_line(line)?;
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.dispatch(&raw.to_lowercase(), raw, &args)
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, CommandError> {
    shell_words::split(input)
        .map_err(|err| CommandError::InvalidArguments(format!("could not parse line: {}", err)))
}

/// Completes the first word against command names and aliases.
struct CommandWords {
    words: Vec<&'static str>,
}

impl CommandWords {
    fn new(mut words: Vec<&'static str>) -> Self {
        words.sort_unstable();
        words.dedup();
        Self { words }
    }

    fn matching(&self, typed: &str) -> Vec<String> {
        let needle = typed.to_ascii_lowercase();
        self.words
            .iter()
            .filter(|word| word.starts_with(&needle))
            .map(|word| word.to_string())
            .collect()
    }
}

impl Completer for CommandWords {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let typed = &line[..pos];
        let start = typed.len() - typed.trim_start().len();
        if typed[start..].contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        Ok((start, self.matching(&typed[start..])))
    }
}

impl Hinter for CommandWords {
    type Hint = String;
}

impl Highlighter for CommandWords {}

impl Validator for CommandWords {}

impl Helper for CommandWords {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::cli::test_support::TestShell;

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line(r#"add "Disney Plus" 7.99 usd monthly"#).unwrap();
        assert_eq!(tokens, vec!["add", "Disney Plus", "7.99", "usd", "monthly"]);
        assert!(matches!(
            parse_command_line(r#"add "unterminated"#),
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[test]
    fn completion_covers_only_the_first_word() {
        let words = CommandWords::new(vec!["list", "ls", "delete", "rm", "list"]);
        assert_eq!(words.matching("L"), vec!["list", "ls"]);
        assert!(words.matching("x").is_empty());
    }

    #[test]
    fn script_input_skips_comments_and_stops_at_exit() {
        let mut shell = TestShell::new();
        let script = "# seed\nadd A 1 usd monthly\n\n  # indented comment\nexit\nadd B 2 usd monthly\n";
        let mut source = ScriptInput {
            lines: Cursor::new(script).lines(),
        };
        drive(&mut shell.context, &mut source).unwrap();
        assert_eq!(shell.context.store.len(), 1);
    }

    #[test]
    fn bad_lines_are_reported_and_the_loop_continues() {
        let mut shell = TestShell::new();
        let script = "add \"broken\nadd Gym 0 usd monthly\nadd Gym 20 usd monthly\n";
        let mut source = ScriptInput {
            lines: Cursor::new(script).lines(),
        };
        drive(&mut shell.context, &mut source).unwrap();
        assert_eq!(shell.context.store.len(), 1);
    }
}
