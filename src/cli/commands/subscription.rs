use subtrack_core::CostService;
use subtrack_domain::{
    BillingCycle, Category, Currency, Displayable, NewSubscription, Subscription,
    SubscriptionId, SubscriptionPatch, SubscriptionStatus,
};

use crate::cli::commands::{parse_date, parse_price, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::format::{describe_days, format_date, format_money, format_price, Table, TableColumn};
use crate::cli::forms::{FormResult, SubscriptionWizard};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

const ADD_USAGE: &str = "add <name> <price> <currency> <monthly|yearly|other> [--category c] [--start YYYY-MM-DD] [--renewal YYYY-MM-DD] [--status s] [--notes text]";
const ADD_OPTIONS: &[&str] = &["category", "start", "renewal", "status", "notes"];
const EDIT_FIELDS: &str = "name, price, currency, cycle, category, start, renewal, status, notes";
const SHORT_ID_LEN: usize = 8;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("add", "Add a subscription", ADD_USAGE, cmd_add),
        CommandEntry::new(
            "edit",
            "Change fields of a subscription",
            "edit <ref> <field> <value> [<field> <value>...]",
            cmd_edit,
        )
        .with_aliases(&["update"]),
        CommandEntry::new(
            "delete",
            "Remove a subscription",
            "delete <ref> [--yes]",
            cmd_delete,
        )
        .with_aliases(&["rm", "remove"]),
        CommandEntry::new(
            "list",
            "List subscriptions, optionally for one category",
            "list [category]",
            cmd_list,
        )
        .with_aliases(&["ls"]),
        CommandEntry::new(
            "show",
            "Show every detail of one subscription",
            "show <ref>",
            cmd_show,
        ),
    ]
}

fn short_id(id: &SubscriptionId) -> &str {
    id.short(SHORT_ID_LEN)
}

/// Resolves `reference` and returns the record's id, releasing the borrow on the store.
fn resolve_id(context: &ShellContext, reference: &str) -> Result<SubscriptionId, CommandError> {
    Ok(context.store.find(reference)?.id.clone())
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let draft = if args.is_empty() {
        if !context.can_prompt() {
            return Err(CommandError::InvalidArguments(format!("usage: {}", ADD_USAGE)));
        }
        let wizard = SubscriptionWizard::new(
            &context.theme,
            context.clock.today(),
            context.settings.display_currency(),
        );
        match wizard.run()? {
            FormResult::Completed(draft) => draft,
            FormResult::Cancelled => {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
        }
    } else {
        draft_from_args(args)?
    };

    let id = context.store.add(draft)?;
    if let Some(record) = context.store.get(&id) {
        io::print_success(format!(
            "Added `{}` ({}), next renewal {}.",
            record.name,
            short_id(&id),
            format_date(record.renewal_date)
        ));
    }
    Ok(())
}

fn draft_from_args(args: &[&str]) -> Result<NewSubscription, CommandError> {
    let parsed = ParsedArgs::parse(args, ADD_OPTIONS, &[])?;
    let [name, price, currency, cycle] = parsed.positional.as_slice() else {
        return Err(CommandError::InvalidArguments(format!("usage: {}", ADD_USAGE)));
    };

    let mut draft = NewSubscription::new(
        *name,
        parse_price(price)?,
        currency.parse::<Currency>()?,
        cycle.parse::<BillingCycle>()?,
    );
    if let Some(category) = parsed.option("category") {
        draft = draft.with_category(category.parse::<Category>()?);
    }
    if let Some(start) = parsed.option("start") {
        draft = draft.with_start_date(parse_date(start)?);
    }
    if let Some(renewal) = parsed.option("renewal") {
        draft = draft.with_renewal_date(parse_date(renewal)?);
    }
    if let Some(status) = parsed.option("status") {
        draft = draft.with_status(status.parse::<SubscriptionStatus>()?);
    }
    if let Some(notes) = parsed.option("notes") {
        draft = draft.with_notes(notes);
    }
    Ok(draft)
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((reference, pairs)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: edit <ref> <field> <value> [<field> <value>...]".into(),
        ));
    };
    if pairs.is_empty() || pairs.len() % 2 != 0 {
        return Err(CommandError::InvalidArguments(format!(
            "expected <field> <value> pairs; fields: {}",
            EDIT_FIELDS
        )));
    }

    let mut patch = SubscriptionPatch::default();
    for pair in pairs.chunks(2) {
        apply_field(&mut patch, pair[0], pair[1])?;
    }

    let id = resolve_id(context, reference)?;
    context.store.update(&id, patch)?;
    io::print_success(format!("Updated `{}`.", short_id(&id)));
    Ok(())
}

/// `notes -` clears the notes.
fn apply_field(patch: &mut SubscriptionPatch, field: &str, value: &str) -> CommandResult {
    match field.to_ascii_lowercase().as_str() {
        "name" => patch.name = Some(value.to_string()),
        "price" => patch.price = Some(parse_price(value)?),
        "currency" => patch.currency = Some(value.parse()?),
        "cycle" | "billing" | "billing_cycle" => patch.billing_cycle = Some(value.parse()?),
        "category" => patch.category = Some(value.parse()?),
        "start" | "start_date" => patch.start_date = Some(parse_date(value)?),
        "renewal" | "renewal_date" => patch.renewal_date = Some(parse_date(value)?),
        "status" => patch.status = Some(value.parse()?),
        "notes" => {
            patch.notes = Some(if value == "-" {
                None
            } else {
                Some(value.to_string())
            })
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown field `{}`; fields: {}",
                other, EDIT_FIELDS
            )))
        }
    }
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &["yes"])?;
    let [reference] = parsed.positional.as_slice() else {
        return Err(CommandError::InvalidArguments("usage: delete <ref> [--yes]".into()));
    };

    let record = context.store.find(reference)?;
    let (id, name, label) = (record.id.clone(), record.name.clone(), record.display_label());
    if !parsed.switch("yes") && !context.confirm(&format!("Delete {}?", label))? {
        io::print_info("Operation cancelled.");
        return Ok(());
    }

    context.store.delete(&id)?;
    io::print_success(format!("Deleted `{}`.", name));
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let filter = match args {
        [] => None,
        [category] => Some(category.parse::<Category>()?),
        _ => return Err(CommandError::InvalidArguments("usage: list [category]".into())),
    };

    let records: Vec<&Subscription> = context
        .store
        .list()
        .iter()
        .filter(|sub| filter.map_or(true, |category| sub.category == category))
        .collect();
    if records.is_empty() {
        match filter {
            Some(category) => io::print_info(format!("No {} subscriptions.", category.label())),
            None => io::print_info("No subscriptions yet. Use `add` to create one."),
        }
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::new("ID", SHORT_ID_LEN),
        TableColumn::new("Name", 0),
        TableColumn::new("Price", 0),
        TableColumn::new("Cycle", 0),
        TableColumn::new("Category", 0),
        TableColumn::new("Status", 0),
        TableColumn::new("Renewal", 0),
    ]);
    for sub in &records {
        table.add_row(vec![
            short_id(&sub.id).to_string(),
            sub.name.clone(),
            format_price(sub.price, sub.currency),
            sub.billing_cycle.label().to_string(),
            sub.category.label().to_string(),
            sub.status.label().to_string(),
            format_date(sub.renewal_date),
        ]);
    }
    table.print();
    Ok(())
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(CommandError::InvalidArguments("usage: show <ref>".into()));
    };

    let record = context.store.find(reference)?.clone();
    let now = context.clock.now();
    let icon = context
        .icons
        .icon_for(&record.name)
        .unwrap_or_else(|| "none".into());
    let monthly = match record.currency {
        Some(currency) => format_money(CostService::monthly_equivalent(&record), currency),
        None => "n/a".into(),
    };

    output_section(&record.name);
    let rows = vec![
        ("ID", record.id.to_string()),
        ("Price", format_price(record.price, record.currency)),
        ("Cycle", record.billing_cycle.label().to_string()),
        ("Per month", monthly),
        ("Category", record.category.label().to_string()),
        ("Status", record.status.label().to_string()),
        ("Started", format_date(record.start_date)),
        (
            "Renews",
            format!(
                "{} ({})",
                format_date(record.renewal_date),
                describe_days(CostService::days_until_renewal(&record, now))
            ),
        ),
        ("Notes", record.notes.clone().unwrap_or_else(|| "-".into())),
        ("Icon", icon),
        ("Created", record.created_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        ("Updated", record.updated_at.format("%Y-%m-%d %H:%M UTC").to_string()),
    ];
    for (label, value) in rows {
        io::print_info(format!("  {:<10} {}", label, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::test_support::TestShell;
    use chrono::NaiveDate;

    #[test]
    fn add_from_arguments_persists_record() {
        let mut shell = TestShell::new();
        shell
            .run("add \"Disney Plus\" 7.99 usd monthly --category streaming --start 2024-05-20")
            .unwrap();

        let records = shell.context.store.list();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Disney Plus");
        assert_eq!(record.currency, Some(Currency::Usd));
        assert_eq!(record.category, Category::Streaming);
        assert_eq!(record.renewal_date, NaiveDate::from_ymd_opt(2024, 6, 20).unwrap());
    }

    #[test]
    fn add_rejects_bad_input_without_side_effects() {
        let mut shell = TestShell::new();
        assert!(matches!(
            shell.run("add Gym 0 usd monthly"),
            Err(CommandError::Core(_))
        ));
        assert!(matches!(
            shell.run("add Gym 20 chf monthly"),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            shell.run("add Gym 20 usd"),
            Err(CommandError::InvalidArguments(_))
        ));
        // Script mode has no wizard.
        assert!(matches!(
            shell.run("add"),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(shell.context.store.is_empty());
    }

    #[test]
    fn edit_applies_pairs_and_clears_notes() {
        let mut shell = TestShell::new();
        shell
            .run("add Spotify 9.99 eur monthly --notes \"duo plan\"")
            .unwrap();
        shell
            .run("edit spotify price 11.99 status paused notes -")
            .unwrap();

        let record = &shell.context.store.list()[0];
        assert_eq!(record.price, 11.99);
        assert_eq!(record.status, SubscriptionStatus::Paused);
        assert_eq!(record.notes, None);
        assert_eq!(record.currency, Some(Currency::Eur));
    }

    #[test]
    fn edit_rejects_unknown_field_or_odd_pairs() {
        let mut shell = TestShell::new();
        shell.run("add Figma 12 usd monthly").unwrap();
        assert!(shell.run("edit figma colour red").is_err());
        assert!(shell.run("edit figma price").is_err());
        assert_eq!(shell.context.store.list()[0].price, 12.0);
    }

    #[test]
    fn delete_by_name_in_script_mode() {
        let mut shell = TestShell::new();
        shell.run("add Keep 3 usd monthly").unwrap();
        shell.run("add Drop 4 usd yearly").unwrap();
        shell.run("delete drop").unwrap();

        let names: Vec<&str> = shell
            .context
            .store
            .list()
            .iter()
            .map(|sub| sub.name.as_str())
            .collect();
        assert_eq!(names, vec!["Keep"]);
        assert!(matches!(
            shell.run("delete drop --yes"),
            Err(CommandError::Core(_))
        ));

        shell.run("rm keep --yes").unwrap();
        assert!(shell.context.store.is_empty());
    }

    #[test]
    fn list_and_show_accept_filters_and_references() {
        let mut shell = TestShell::new();
        shell
            .run("add Netflix 15.49 usd monthly --category streaming")
            .unwrap();
        shell.run("list").unwrap();
        shell.run("list streaming").unwrap();
        shell.run("list fitness").unwrap();
        assert!(shell.run("list bogus").is_err());
        shell.run("show netflix").unwrap();
        assert!(shell.run("show hbo").is_err());
    }
}
