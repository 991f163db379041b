use std::path::PathBuf;

use subtrack_core::{ExportFormat, ExportService};
use subtrack_domain::Currency;
use subtrack_storage_json::write_text_atomic;

use crate::cli::commands::ParsedArgs;
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::format::{Table, TableColumn};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

const EXPORT_DIR: &str = "exports";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "currency",
            "Show or set the display currency",
            "currency [USD|EUR|JPY|GBP]",
            cmd_currency,
        ),
        CommandEntry::new(
            "rates",
            "Show exchange rates against USD",
            "rates [refresh]",
            cmd_rates,
        ),
        CommandEntry::new(
            "export",
            "Write all subscriptions to a JSON or CSV file",
            "export <json|csv> [path]",
            cmd_export,
        ),
        CommandEntry::new(
            "clear",
            "Delete every subscription",
            "clear [--yes]",
            cmd_clear,
        ),
    ]
}

fn cmd_currency(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let current = context.settings.display_currency();
            io::print_info(format!(
                "Display currency: {} ({})",
                current.code(),
                current.label()
            ));
            let options: Vec<&str> = Currency::ALL.iter().map(|c| c.code()).collect();
            io::print_hint(format!("Choose from {}.", options.join(", ")));
            Ok(())
        }
        [code] => {
            let currency: Currency = code.parse()?;
            context.settings.set_display_currency(currency)?;
            io::print_success(format!("Display currency set to {}.", currency.code()));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: currency [USD|EUR|JPY|GBP]".into(),
        )),
    }
}

fn cmd_rates(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let snapshot = match args {
        [] => context.rates.get_rates_with_source(),
        [action] if action.eq_ignore_ascii_case("refresh") => context.rates.refresh(),
        _ => return Err(CommandError::InvalidArguments("usage: rates [refresh]".into())),
    };

    output_section("Exchange rates (1 USD =)");
    let mut table = Table::new(vec![TableColumn::new("Currency", 0), TableColumn::new("Rate", 0)]);
    for (currency, rate) in snapshot.table.entries() {
        table.add_row(vec![currency.code().to_string(), format!("{:.4}", rate)]);
    }
    table.print();

    match snapshot.fetched_at {
        Some(at) => io::print_info(format!(
            "Source: {} (fetched {})",
            snapshot.source,
            at.format("%Y-%m-%d %H:%M UTC")
        )),
        None => io::print_info(format!("Source: {}", snapshot.source)),
    }
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (format, target) = match args {
        [format] => (format.parse::<ExportFormat>()?, None),
        [format, path] => (format.parse::<ExportFormat>()?, Some(PathBuf::from(path))),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: export <json|csv> [path]".into(),
            ))
        }
    };

    let path = target.unwrap_or_else(|| {
        context
            .base_dir
            .join(EXPORT_DIR)
            .join(ExportService::default_filename(format, context.clock.today()))
    });
    let contents = ExportService::render(format, context.store.list())?;
    write_text_atomic(&path, &contents)?;
    io::print_success(format!(
        "Exported {} subscription(s) to {}.",
        context.store.len(),
        path.display()
    ));
    Ok(())
}

fn cmd_clear(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &["yes"])?;
    if !parsed.positional.is_empty() {
        return Err(CommandError::InvalidArguments("usage: clear [--yes]".into()));
    }
    if !parsed.switch("yes")
        && !context.confirm("Delete ALL subscriptions? This cannot be undone.")?
    {
        io::print_info("Operation cancelled.");
        return Ok(());
    }

    let removed = context.store.len();
    context.store.clear_all()?;
    io::print_success(format!("Removed {} subscription(s).", removed));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::test_support::TestShell;
    use std::fs;
    use subtrack_core::CSV_HEADER;

    #[test]
    fn currency_is_validated_and_persisted() {
        let mut shell = TestShell::new();
        shell.run("currency").unwrap();
        shell.run("currency jpy").unwrap();
        assert_eq!(shell.context.settings.display_currency(), Currency::Jpy);
        assert!(shell.run("currency chf").is_err());
        assert_eq!(shell.context.settings.display_currency(), Currency::Jpy);

        let reopened = shell.reopen();
        assert_eq!(reopened.context.settings.display_currency(), Currency::Jpy);
    }

    #[test]
    fn rates_use_cache_until_refresh() {
        let mut shell = TestShell::new();
        shell.run("rates").unwrap();
        shell.run("rates").unwrap();
        assert_eq!(shell.rate_calls(), 1);
        shell.run("rates refresh").unwrap();
        assert_eq!(shell.rate_calls(), 2);
        assert!(shell.run("rates now").is_err());
    }

    #[test]
    fn export_writes_default_and_explicit_paths() {
        let mut shell = TestShell::new();
        shell
            .run("add \"Acme, Pro\" 12.5 usd monthly --category software")
            .unwrap();

        shell.run("export csv").unwrap();
        let default_path = shell
            .base_dir()
            .join("exports")
            .join("subscriptions-2024-06-01.csv");
        let csv = fs::read_to_string(&default_path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("\"Acme, Pro\",12.50,Monthly,Software,Active,2024-07-01")
        );

        let explicit = shell.base_dir().join("out").join("all.json");
        shell
            .run(&format!("export json \"{}\"", explicit.display()))
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&explicit).unwrap()).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(1));

        assert!(shell.run("export xml").is_err());
    }

    #[test]
    fn clear_removes_everything_in_script_mode() {
        let mut shell = TestShell::new();
        shell.run("add A 1 usd monthly").unwrap();
        shell.run("add B 2 usd monthly").unwrap();
        shell.run("clear").unwrap();
        assert!(shell.context.store.is_empty());
        assert!(shell.reopen().context.store.is_empty());
        assert!(shell.run("clear everything").is_err());
    }
}
