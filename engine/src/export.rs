//! Income reports.
//!
//! Plain-text reports (monthly, full history grouped by month, arbitrary
//! period) and a tabular report with an optional per-executor view. Records
//! are never modified; every report works on a sorted copy.

use crate::catalog::{work_type_name, Directory};
use crate::format::format_amount;
use crate::income::IncomeRecord;
use crate::user::User;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

const RULE_WIDTH: usize = 60;
const MONTH_RULE_WIDTH: usize = 50;

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

pub const TABLE_HEAD: [&str; 6] = ["Дата", "Сумма", "Авто", "Работа", "Мастера", "Комментарий"];

fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS_GENITIVE.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// `dd.mm.yyyy`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn rule(width: usize, ch: char) -> String {
    std::iter::repeat(ch).take(width).collect()
}

fn sorted_by_date<'a>(records: impl IntoIterator<Item = &'a IncomeRecord>) -> Vec<&'a IncomeRecord> {
    let mut records: Vec<_> = records.into_iter().collect();
    records.sort_by_key(|r| r.date);
    records
}

fn total(records: &[&IncomeRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

/// Which optional parts a report line carries.
#[derive(Clone, Copy)]
struct LineStyle {
    vehicle: bool,
}

fn report_line(record: &IncomeRecord, dir: &Directory<'_>, style: LineStyle) -> String {
    let mut line = format!(
        "{} — {}",
        format_date(record.date),
        format_amount(record.amount, true)
    );
    if style.vehicle {
        if !record.car_brand.is_empty() {
            let _ = write!(line, " {}", record.car_brand);
        }
        if !record.vin.is_empty() {
            let _ = write!(line, " [{}]", record.vin);
        }
    }
    if let Some(work) = work_type_name(&record.work_type) {
        let _ = write!(line, " ({work})");
    }
    let executors = dir.executor_names(&record.executors);
    if !executors.is_empty() {
        let _ = write!(line, " [{executors}]");
    }
    if !record.comment.is_empty() {
        let _ = write!(line, " — {}", record.comment);
    }
    line
}

/// Report for one calendar month (`month` is 1-based).
pub fn monthly_report(records: &[IncomeRecord], year: i32, month: u32, users: &[User]) -> String {
    let dir = Directory::new(users);
    let selected = sorted_by_date(
        records
            .iter()
            .filter(|r| r.date.year() == year && r.date.month() == month),
    );

    let mut report = format!("Автосервис — отчет за {} {year}\n", month_name(month));
    report.push_str(&rule(RULE_WIDTH, '═'));
    report.push_str("\n\n");

    if selected.is_empty() {
        report.push_str("Нет записей за этот месяц.\n\n");
    } else {
        for record in &selected {
            report.push_str(&report_line(record, &dir, LineStyle { vehicle: false }));
            report.push('\n');
        }
        report.push('\n');
    }

    report.push_str(&rule(RULE_WIDTH, '═'));
    let _ = writeln!(
        report,
        "\nИТОГО ЗА МЕСЯЦ: {}",
        format_amount(total(&selected), true)
    );
    report
}

/// Whole history grouped by month, oldest first.
pub fn full_report(records: &[IncomeRecord], users: &[User], today: NaiveDate) -> String {
    if records.is_empty() {
        return "Нет записей для экспорта.".to_string();
    }
    let dir = Directory::new(users);

    let mut months: BTreeMap<(i32, u32), Vec<&IncomeRecord>> = BTreeMap::new();
    for record in records {
        months
            .entry((record.date.year(), record.date.month()))
            .or_default()
            .push(record);
    }

    let mut report = String::from("АВТОСЕРВИС — ПОЛНЫЙ ОТЧЕТ\n");
    report.push_str(&rule(RULE_WIDTH, '═'));
    let _ = writeln!(report, "\nДата формирования: {}\n", format_date(today));

    let mut grand_total = 0.0;
    for ((year, month), group) in months {
        let group = sorted_by_date(group);
        let month_total = total(&group);
        grand_total += month_total;

        let name = month_name(month);
        let _ = writeln!(report, "\n▌ {} {year}", name.to_uppercase());
        report.push_str(&rule(MONTH_RULE_WIDTH, '─'));
        report.push('\n');
        for record in &group {
            let _ = writeln!(
                report,
                "  {}",
                report_line(record, &dir, LineStyle { vehicle: false })
            );
        }
        let _ = writeln!(
            report,
            "  Итого за {name}: {}",
            format_amount(month_total, true)
        );
    }

    report.push('\n');
    report.push_str(&rule(RULE_WIDTH, '═'));
    let _ = writeln!(report, "\nОБЩИЙ ИТОГ: {}", format_amount(grand_total, true));
    report
}

/// Report over `start..=end`, with car brand and VIN on each line.
pub fn period_report(
    records: &[IncomeRecord],
    start: NaiveDate,
    end: NaiveDate,
    users: &[User],
) -> String {
    let dir = Directory::new(users);
    let selected = sorted_by_date(records.iter().filter(|r| r.date >= start && r.date <= end));

    let mut report = format!(
        "Автосервис — отчет за период с {} по {}\n",
        format_date(start),
        format_date(end)
    );
    report.push_str(&rule(RULE_WIDTH, '═'));
    report.push_str("\n\n");

    if selected.is_empty() {
        report.push_str("Нет записей за этот период.\n\n");
    } else {
        for record in &selected {
            report.push_str(&report_line(record, &dir, LineStyle { vehicle: true }));
            report.push('\n');
        }
        report.push('\n');
    }

    report.push_str(&rule(RULE_WIDTH, '═'));
    let _ = writeln!(
        report,
        "\nОБЩИЙ ИТОГ ЗА ПЕРИОД: {}",
        format_amount(total(&selected), true)
    );
    report
}

/// Options for [`report_table`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
    pub title: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Restrict to one executor and show only their part of each amount.
    pub executor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    pub title: String,
    pub period: Option<String>,
    /// Display name of the executor the table is restricted to.
    pub executor: Option<String>,
    pub head: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total: String,
    pub total_amount: f64,
}

/// Tabular report, one row per record in date order.
pub fn report_table(records: &[IncomeRecord], users: &[User], options: &TableOptions) -> ReportTable {
    let dir = Directory::new(users);
    let executor = options.executor.as_deref().filter(|e| !e.is_empty());

    let selected = sorted_by_date(records.iter().filter(|r| {
        options.start.map_or(true, |start| r.date >= start)
            && options.end.map_or(true, |end| r.date <= end)
            && executor.map_or(true, |e| {
                r.shares.contains_key(e) || r.executors.iter().any(|x| x == e)
            })
    }));

    let amount_of = |record: &IncomeRecord| match executor {
        Some(e) => record.share_of(e),
        None => record.amount,
    };
    // Table cells use plain spaces for grouping.
    let cell = |amount: f64| format_amount(amount, true).replace('\u{a0}', " ");

    let rows = selected
        .iter()
        .map(|record| {
            vec![
                format_date(record.date),
                cell(amount_of(*record)),
                if record.car_brand.is_empty() {
                    "—".to_string()
                } else {
                    record.car_brand.clone()
                },
                work_type_name(&record.work_type).unwrap_or_default().to_string(),
                dir.executor_names(&record.executors),
                record.comment.clone(),
            ]
        })
        .collect();

    let total_amount: f64 = selected.iter().map(|r| amount_of(*r)).sum();

    let period = match (options.start, options.end) {
        (Some(start), Some(end)) => Some(format!("{} — {}", format_date(start), format_date(end))),
        (Some(start), None) => Some(format!("с {}", format_date(start))),
        (None, Some(end)) => Some(format!("по {}", format_date(end))),
        (None, None) => None,
    };

    ReportTable {
        title: options
            .title
            .clone()
            .unwrap_or_else(|| "Отчет автосервиса".to_string()),
        period,
        executor: executor.map(|e| dir.executor_name(e).unwrap_or("Сотрудник").to_string()),
        head: TABLE_HEAD.iter().map(|h| h.to_string()).collect(),
        rows,
        total: format!("ИТОГО: {}", cell(total_amount)),
        total_amount,
    }
}
