pub mod config;
pub mod settings;
pub mod subscription;
pub mod summary;
pub mod system;

use chrono::NaiveDate;
use subtrack_domain::parse_date_lenient;

use crate::cli::core::CommandError;
use crate::cli::registry::{CommandEntry, CommandRegistry};

const ROOT_COMMAND_ORDER: &[&str] = &[
    "add",
    "edit",
    "delete",
    "list",
    "show",
    "summary",
    "upcoming",
    "categories",
    "stats",
    "currency",
    "rates",
    "export",
    "clear",
    "config",
    "help",
    "version",
    "exit",
];

pub(crate) fn all_entries() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(subscription::definitions());
    commands.extend(summary::definitions());
    commands.extend(settings::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let mut entries = all_entries();
    entries.sort_by_key(|entry| {
        ROOT_COMMAND_ORDER
            .iter()
            .position(|name| entry.name.eq_ignore_ascii_case(name))
            .unwrap_or(ROOT_COMMAND_ORDER.len())
    });
    for entry in entries {
        registry.register(entry);
    }
}

/// Positional arguments plus `--option value` pairs and bare `--switch` flags.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    options: Vec<(&'static str, &'a str)>,
    switches: Vec<&'static str>,
}

impl<'a> ParsedArgs<'a> {
    /// Splits `args`. Names in `options` consume the following token, names in
    /// `switches` stand alone; `--name=value` is accepted for options.
    pub fn parse(
        args: &[&'a str],
        options: &[&'static str],
        switches: &[&'static str],
    ) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(flag) = arg.strip_prefix("--") else {
                parsed.positional.push(arg);
                continue;
            };
            let (name, inline) = match flag.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (flag, None),
            };
            if let Some(&known) = switches.iter().find(|s| s.eq_ignore_ascii_case(name)) {
                if inline.is_some() {
                    return Err(CommandError::InvalidArguments(format!(
                        "`--{}` does not take a value",
                        known
                    )));
                }
                parsed.switches.push(known);
            } else if let Some(&known) = options.iter().find(|o| o.eq_ignore_ascii_case(name)) {
                let value = match inline {
                    Some(value) => value,
                    None => iter.next().ok_or_else(|| {
                        CommandError::InvalidArguments(format!("`--{}` needs a value", known))
                    })?,
                };
                parsed.options.push((known, value));
            } else {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `{}`",
                    arg
                )));
            }
        }
        Ok(parsed)
    }

    /// Last value given for `name`.
    pub fn option(&self, name: &str) -> Option<&'a str> {
        self.options
            .iter()
            .rev()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    pub fn switch(&self, name: &str) -> bool {
        self.switches.iter().any(|switch| *switch == name)
    }
}

pub(crate) fn parse_price(raw: &str) -> Result<f64, CommandError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{}` is not a valid price", raw)))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    parse_date_lenient(raw).ok_or_else(|| {
        CommandError::InvalidArguments(format!("`{}` is not a date (use YYYY-MM-DD)", raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::core::CommandResult;
    use crate::cli::shell_context::ShellContext;

    fn noop(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
        Ok(())
    }

    #[test]
    fn registry_follows_root_order() {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ROOT_COMMAND_ORDER);

        assert!(!registry.register(CommandEntry::new("add", "dup", "add", noop)));
        assert_eq!(registry.names().count(), ROOT_COMMAND_ORDER.len());
        assert_eq!(registry.resolve("ls").map(|entry| entry.name), Some("list"));
        assert_eq!(registry.resolve("quit").map(|entry| entry.name), Some("exit"));
    }

    #[test]
    fn options_switches_and_positionals_are_split() {
        let args = [
            "Netflix",
            "--category",
            "streaming",
            "15.49",
            "--yes",
            "--notes=family plan",
        ];
        let parsed = ParsedArgs::parse(&args, &["category", "notes"], &["yes"]).unwrap();
        assert_eq!(parsed.positional, vec!["Netflix", "15.49"]);
        assert_eq!(parsed.option("category"), Some("streaming"));
        assert_eq!(parsed.option("notes"), Some("family plan"));
        assert!(parsed.switch("yes"));
    }

    #[test]
    fn unknown_or_incomplete_options_are_rejected() {
        assert!(ParsedArgs::parse(&["--bogus"], &["category"], &[]).is_err());
        assert!(ParsedArgs::parse(&["--category"], &["category"], &[]).is_err());
        assert!(ParsedArgs::parse(&["--yes=1"], &[], &["yes"]).is_err());
    }

    #[test]
    fn price_and_date_parsing() {
        assert_eq!(parse_price(" 9.99 ").unwrap(), 9.99);
        assert!(parse_price("ten").is_err());
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("29/02/2024").is_err());
    }
}
