//! Notifications service
//!
//! Builds the notifications list from store state. Each kind is gated by
//! the signed-in user's notification settings; a signed-out store produces
//! nothing.

use super::reports::{self, days_until_due};
use crate::config::DUE_SOON_WINDOW_DAYS;
use crate::store::{AppStore, Bill, NotificationSettings};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    DueSoon,
    Overdue,
    PaymentConfirmation,
    BudgetAlert,
    MonthlySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

fn settings(store: &AppStore) -> Option<NotificationSettings> {
    store
        .user()
        .filter(|_| store.is_authenticated())
        .map(|user| user.notification_settings)
}

fn money(store: &AppStore, amount: Decimal) -> String {
    let currency = store
        .user()
        .map(|user| user.preferred_currency.as_str())
        .unwrap_or(crate::config::DEFAULT_CURRENCY);
    format!("{} {:.2}", currency, amount)
}

fn bill_label(store: &AppStore, bill: &Bill) -> String {
    if bill.description.trim().is_empty() {
        format!("{} bill", store.category_name_for(bill))
    } else {
        bill.description.clone()
    }
}

/// Due-soon, overdue and budget notifications as of `now`, most urgent first
pub fn pending_notifications(store: &AppStore, now: DateTime<Utc>) -> Vec<Notification> {
    let Some(settings) = settings(store) else {
        return Vec::new();
    };

    let mut notifications = Vec::new();

    if settings.bill_due_reminders {
        let mut unpaid: Vec<&Bill> = store.bills().iter().filter(|b| !b.is_paid()).collect();
        unpaid.sort_by_key(|bill| bill.due_date);

        for bill in unpaid {
            let days = days_until_due(bill, now);
            let label = bill_label(store, bill);
            let amount = money(store, bill.amount);

            let notification = if bill.due_date < now {
                Notification {
                    kind: NotificationKind::Overdue,
                    title: format!("{} Overdue", label),
                    message: format!("Your {} of {} is past due", label, amount),
                    bill_id: Some(bill.id.clone()),
                    category_id: None,
                }
            } else if days <= DUE_SOON_WINDOW_DAYS {
                let when = match days {
                    0 => "today".to_string(),
                    1 => "in 1 day".to_string(),
                    n => format!("in {} days", n),
                };
                Notification {
                    kind: NotificationKind::DueSoon,
                    title: format!("{} Due Soon", label),
                    message: format!("Your {} of {} is due {}", label, amount, when),
                    bill_id: Some(bill.id.clone()),
                    category_id: None,
                }
            } else {
                continue;
            };

            notifications.push(notification);
        }
    }

    if settings.budget_alerts {
        for row in reports::category_totals(store) {
            let (Some(limit), Some(category_id)) = (row.budget_limit, row.category_id) else {
                continue;
            };
            if row.over_budget {
                notifications.push(Notification {
                    kind: NotificationKind::BudgetAlert,
                    title: format!("{} Over Budget", row.name),
                    message: format!(
                        "{} spending of {} exceeds the budget of {}",
                        row.name,
                        money(store, row.total),
                        money(store, limit)
                    ),
                    bill_id: None,
                    category_id: Some(category_id),
                });
            }
        }
    }

    notifications
}

/// Confirmation for a bill that was just marked paid
pub fn payment_confirmation(store: &AppStore, bill: &Bill) -> Option<Notification> {
    let settings = settings(store)?;
    if !settings.payment_confirmations || !bill.is_paid() {
        return None;
    }

    let label = bill_label(store, bill);
    Some(Notification {
        kind: NotificationKind::PaymentConfirmation,
        title: "Payment Successful".to_string(),
        message: format!("{} payment of {} was recorded", label, money(store, bill.amount)),
        bill_id: Some(bill.id.clone()),
        category_id: None,
    })
}

/// Totals for the calendar month containing `month`
pub fn monthly_summary(store: &AppStore, month: DateTime<Utc>) -> Option<Notification> {
    let settings = settings(store)?;
    if !settings.monthly_summaries {
        return None;
    }

    let in_month: Vec<&Bill> = store
        .bills()
        .iter()
        .filter(|bill| {
            bill.due_date.year() == month.year() && bill.due_date.month() == month.month()
        })
        .collect();

    let total: Decimal = in_month.iter().map(|bill| bill.amount).sum();
    let paid = in_month.iter().filter(|bill| bill.is_paid()).count();

    Some(Notification {
        kind: NotificationKind::MonthlySummary,
        title: format!("{} Summary", month.format("%B %Y")),
        message: format!(
            "{} bills totalling {}, {} paid and {} outstanding",
            in_month.len(),
            money(store, total),
            paid,
            in_month.len() - paid
        ),
        bill_id: None,
        category_id: None,
    })
}
