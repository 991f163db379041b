use subtrack_core::{ConversionTarget, CostService, CostSummary, UPCOMING_WINDOW_DAYS};
use subtrack_domain::{Currency, Subscription};

use crate::cli::core::{CommandError, CommandResult};
use crate::cli::format::{describe_days, format_date, format_money, format_price, Table, TableColumn};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "summary",
            "Monthly and annual cost in the display currency",
            "summary",
            cmd_summary,
        ),
        CommandEntry::new(
            "upcoming",
            "Renewals due in the next 30 days",
            "upcoming",
            cmd_upcoming,
        ),
        CommandEntry::new(
            "categories",
            "Share of active subscriptions per category",
            "categories",
            cmd_categories,
        ),
        CommandEntry::new(
            "stats",
            "Subscription counts by status",
            "stats",
            cmd_stats,
        ),
    ]
}

fn reject_arguments(name: &str, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::InvalidArguments(format!(
            "`{}` takes no arguments",
            name
        )))
    }
}

/// True when some active record is priced in a currency other than `display`.
fn needs_conversion(subscriptions: &[Subscription], display: Currency) -> bool {
    subscriptions
        .iter()
        .filter(|sub| sub.is_active())
        .any(|sub| sub.currency.is_some_and(|currency| currency != display))
}

/// Totals in the display currency. Rates are only consulted when some active
/// record is priced in another currency.
pub(crate) fn current_summary(context: &ShellContext) -> CostSummary {
    let subscriptions = context.store.list();
    let display = context.settings.display_currency();
    let now = context.clock.now();
    if needs_conversion(subscriptions, display) {
        let rates = context.rates.get_rates();
        CostService::summarize(
            subscriptions,
            now,
            display,
            Some(ConversionTarget::new(&rates, display)),
        )
    } else {
        CostService::summarize(subscriptions, now, display, None)
    }
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    reject_arguments("summary", args)?;
    let summary = current_summary(context);

    output_section(format!("Summary ({})", summary.currency.code()));
    io::print_info(format!(
        "  Monthly   {}",
        format_money(summary.monthly, summary.currency)
    ));
    io::print_info(format!(
        "  Annual    {}",
        format_money(summary.annual, summary.currency)
    ));
    io::print_info(format!("  Active    {}", summary.active_count));
    io::print_info(format!(
        "  Upcoming  {} in the next {} days",
        summary.upcoming_count, UPCOMING_WINDOW_DAYS
    ));
    if summary.converted {
        io::print_hint("Amounts in other currencies were converted; see `rates`.");
    }
    Ok(())
}

fn cmd_upcoming(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    reject_arguments("upcoming", args)?;
    let upcoming = CostService::upcoming_renewals(context.store.list(), context.clock.now());
    if upcoming.is_empty() {
        io::print_info(format!(
            "No renewals in the next {} days.",
            UPCOMING_WINDOW_DAYS
        ));
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::new("Name", 0),
        TableColumn::new("Price", 0),
        TableColumn::new("Renewal", 0),
        TableColumn::new("Due", 0),
    ]);
    for item in &upcoming {
        let sub = item.subscription;
        table.add_row(vec![
            sub.name.clone(),
            format_price(sub.price, sub.currency),
            format_date(sub.renewal_date),
            describe_days(item.days_until),
        ]);
    }
    table.print();
    Ok(())
}

fn cmd_categories(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    reject_arguments("categories", args)?;
    let shares = CostService::category_breakdown(context.store.list());
    if shares.is_empty() {
        io::print_info("No active subscriptions.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::new("Category", 0),
        TableColumn::new("Count", 0),
        TableColumn::new("Share", 0),
        TableColumn::new("Color", 0),
    ]);
    for share in &shares {
        table.add_row(vec![
            share.label.to_string(),
            share.count.to_string(),
            format!("{:.1}%", share.percentage),
            share.color.to_string(),
        ]);
    }
    table.print();
    Ok(())
}

fn cmd_stats(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    reject_arguments("stats", args)?;
    let counts = CostService::status_counts(context.store.list());
    output_section("Statistics");
    io::print_info(format!("  Total      {}", counts.total));
    io::print_info(format!("  Active     {}", counts.active));
    io::print_info(format!("  Paused     {}", counts.paused));
    io::print_info(format!("  Cancelled  {}", counts.cancelled));
    Ok(())
}
