//! Reports service
//!
//! Aggregates for the home dashboard and the reports screen. All figures are
//! computed from the store on demand.

use crate::config::UNCATEGORIZED_LABEL;
use crate::store::{AppStore, Bill};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Dashboard totals
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub bill_count: usize,
    pub paid_count: usize,
}

/// Spending of one category (or the uncategorized bucket)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// `None` for bills whose category no longer exists
    pub category_id: Option<String>,
    pub name: String,
    pub total: Decimal,
    /// Share of all spending, 0-100, two decimal places
    pub percentage: Decimal,
    pub budget_limit: Option<Decimal>,
    pub over_budget: bool,
}

/// Spending in one calendar month, keyed by due date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub total: Decimal,
}

impl MonthlyTotal {
    /// "YYYY-MM"
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

pub fn summary(store: &AppStore) -> Summary {
    let bills = store.bills();

    let total: Decimal = bills.iter().map(|bill| bill.amount).sum();
    let paid: Decimal = bills
        .iter()
        .filter(|bill| bill.is_paid())
        .map(|bill| bill.amount)
        .sum();

    Summary {
        total,
        paid,
        pending: total - paid,
        bill_count: bills.len(),
        paid_count: bills.iter().filter(|bill| bill.is_paid()).count(),
    }
}

/// Latest `limit` bills by due date, newest first
pub fn recent_bills(store: &AppStore, limit: usize) -> Vec<Bill> {
    let mut bills = store.bills().to_vec();
    bills.sort_by(|a, b| b.due_date.cmp(&a.due_date));
    bills.truncate(limit);
    bills
}

/// Whole days until the bill is due, rounded up; negative when overdue
pub fn days_until_due(bill: &Bill, now: DateTime<Utc>) -> i64 {
    let seconds = (bill.due_date - now).num_seconds();
    let day = 86_400;
    if seconds > 0 {
        (seconds + day - 1) / day
    } else {
        seconds / day
    }
}

/// One row per category in store order, then an uncategorized row when any
/// bill references a missing category.
pub fn category_totals(store: &AppStore) -> Vec<CategoryTotal> {
    let mut by_category: HashMap<&str, Decimal> = HashMap::new();
    let mut uncategorized = Decimal::ZERO;
    let mut has_uncategorized = false;

    for bill in store.bills() {
        if store.category(&bill.category_id).is_some() {
            *by_category.entry(bill.category_id.as_str()).or_default() += bill.amount;
        } else {
            uncategorized += bill.amount;
            has_uncategorized = true;
        }
    }

    let grand_total = summary(store).total;

    let mut rows: Vec<CategoryTotal> = store
        .categories()
        .iter()
        .map(|category| {
            let total = by_category
                .get(category.id.as_str())
                .copied()
                .unwrap_or_default();
            CategoryTotal {
                category_id: Some(category.id.clone()),
                name: category.name.clone(),
                total,
                percentage: percentage_of(total, grand_total),
                budget_limit: category.budget_limit,
                over_budget: category.budget_limit.is_some_and(|limit| total > limit),
            }
        })
        .collect();

    if has_uncategorized {
        rows.push(CategoryTotal {
            category_id: None,
            name: UNCATEGORIZED_LABEL.to_string(),
            total: uncategorized,
            percentage: percentage_of(uncategorized, grand_total),
            budget_limit: None,
            over_budget: false,
        });
    }

    rows
}

/// Totals for the `months` calendar months ending with the month of `now`,
/// oldest first. Months without bills are reported as zero.
pub fn monthly_spending(store: &AppStore, months: usize, now: DateTime<Utc>) -> Vec<MonthlyTotal> {
    let mut buckets: Vec<MonthlyTotal> = Vec::with_capacity(months);
    let (mut year, mut month) = (now.year(), now.month());

    for _ in 0..months {
        buckets.push(MonthlyTotal {
            year,
            month,
            total: Decimal::ZERO,
        });
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    buckets.reverse();

    for bill in store.bills() {
        let (year, month) = (bill.due_date.year(), bill.due_date.month());
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|bucket| bucket.year == year && bucket.month == month)
        {
            bucket.total += bill.amount;
        }
    }

    buckets
}

fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part * Decimal::ONE_HUNDRED / whole).round_dp(2)
}
