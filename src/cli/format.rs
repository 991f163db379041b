//! Text formatting for money, dates and simple tables.

use chrono::NaiveDate;
use subtrack_domain::Currency;

use crate::cli::io;

/// Formats `amount` with the currency symbol, thousands grouping and minor units.
pub fn format_money(amount: f64, currency: Currency) -> String {
    if !amount.is_finite() {
        return "n/a".into();
    }
    let body = format_number(amount.abs(), currency.minor_units());
    format!("{}{}{}", sign_of(amount, &body), currency.symbol(), body)
}

/// Like [`format_money`], but an absent currency renders the bare number.
pub fn format_price(amount: f64, currency: Option<Currency>) -> String {
    match currency {
        Some(currency) => format_money(amount, currency),
        None if amount.is_finite() => {
            let body = format_number(amount.abs(), 2);
            format!("{}{} (?)", sign_of(amount, &body), body)
        }
        None => "n/a".into(),
    }
}

/// Minus sign only when the rounded body is non-zero, so `-0.001` prints as zero.
fn sign_of(amount: f64, body: &str) -> &'static str {
    let nonzero = body.chars().any(|c| c.is_ascii_digit() && c != '0');
    if amount < 0.0 && nonzero {
        "-"
    } else {
        ""
    }
}

fn format_number(value: f64, precision: u8) -> String {
    let body = format!("{:.*}", precision as usize, value);
    match body.split_once('.') {
        Some((int_part, fraction)) => format!("{}.{}", group_digits(int_part), fraction),
        None => group_digits(&body),
    }
}

fn group_digits(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, ',');
        }
        grouped.insert(0, ch);
    }
    format!("{sign}{grouped}")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// "today", "in 1 day", "in 5 days", "3 days ago".
pub fn describe_days(days: i64) -> String {
    match days {
        0 => "today".into(),
        1 => "in 1 day".into(),
        -1 => "1 day ago".into(),
        d if d > 1 => format!("in {d} days"),
        d => format!("{} days ago", -d),
    }
}

/// Declarative description of a table column.
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub header: String,
    pub width: usize,
}

impl TableColumn {
    pub fn new(header: impl Into<String>, width: usize) -> Self {
        Self {
            header: header.into(),
            width,
        }
    }
}

/// Simple table model used for rendering read-only overviews.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row<S: Into<String>>(&mut self, cells: Vec<S>) {
        self.rows
            .push(cells.into_iter().map(|value| value.into()).collect());
    }

    /// Renders into lines; columns widen to fit their longest cell.
    pub fn render_lines(&self) -> Vec<String> {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(column.header.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(column.width)
            })
            .collect();

        let render = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(render(
            self.columns.iter().map(|col| col.header.as_str()).collect(),
        ));
        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        lines.push("-".repeat(total));
        for row in &self.rows {
            lines.push(render(row.iter().map(String::as_str).collect()));
        }
        lines
    }

    pub fn print(&self) {
        for line in self.render_lines() {
            io::print_info(line);
        }
    }
}
