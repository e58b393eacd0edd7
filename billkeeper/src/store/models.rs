//! Store models
//!
//! Rust structs representing the entities owned by the store.
//! All models serialize with camelCase names, which is the persisted
//! snapshot layout.

use super::wire;
use crate::config::{
    DEFAULT_CURRENCY, DEFAULT_LANGUAGE, DEFAULT_USER_NAME, MAX_ATTACHMENTS_PER_BILL,
    MAX_DESCRIPTION_LENGTH,
};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Per-user notification toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub bill_due_reminders: bool,
    pub payment_confirmations: bool,
    pub monthly_summaries: bool,
    pub budget_alerts: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            bill_due_reminders: true,
            payment_confirmations: true,
            monthly_summaries: true,
            budget_alerts: true,
        }
    }
}

/// Signed-in user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub preferred_currency: String,
    pub language: String,
    #[serde(default)]
    pub notification_settings: NotificationSettings,
}

impl User {
    /// Profile synthesized at sign-in, carrying default preferences
    pub fn with_defaults(id: String, email: String) -> Self {
        Self {
            id,
            email,
            name: DEFAULT_USER_NAME.to_string(),
            profile_picture: None,
            preferred_currency: DEFAULT_CURRENCY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            notification_settings: NotificationSettings::default(),
        }
    }
}

/// Settings-screen edit of the user profile; `None` leaves a field as is
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub name: Option<String>,
    /// `Some(None)` removes the picture
    #[serde(deserialize_with = "wire::double_option")]
    pub profile_picture: Option<Option<String>>,
    pub preferred_currency: Option<String>,
    pub language: Option<String>,
    pub notification_settings: Option<NotificationSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Unpaid,
    Paid,
}

impl BillStatus {
    pub fn toggled(self) -> Self {
        match self {
            BillStatus::Paid => BillStatus::Unpaid,
            BillStatus::Unpaid => BillStatus::Paid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BillStatus::Paid => "paid",
            BillStatus::Unpaid => "unpaid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringFrequency {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

/// Display theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// A recorded payable obligation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    #[serde(deserialize_with = "wire::timestamp")]
    pub date: DateTime<Utc>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub due_date: DateTime<Utc>,
    /// May reference a deleted category
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    /// Opaque locators handed over by the attachment picker
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_frequency: Option<RecurringFrequency>,
    #[serde(default)]
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    pub fn is_paid(&self) -> bool {
        self.status == BillStatus::Paid
    }

    /// Keep `recurring_frequency` present exactly when `is_recurring` is set
    pub(crate) fn normalize_recurrence(&mut self) {
        self.recurring_frequency = normalized_frequency(self.is_recurring, self.recurring_frequency);
    }
}

pub(crate) fn normalized_frequency(
    is_recurring: bool,
    frequency: Option<RecurringFrequency>,
) -> Option<RecurringFrequency> {
    if is_recurring {
        Some(frequency.unwrap_or_default())
    } else {
        None
    }
}

/// Fields supplied when creating a bill; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBill {
    pub amount: Decimal,
    #[serde(deserialize_with = "wire::timestamp")]
    pub date: DateTime<Utc>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub due_date: DateTime<Utc>,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_frequency: Option<RecurringFrequency>,
    #[serde(default)]
    pub status: BillStatus,
}

impl NewBill {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(AppError::Validation(
                "Amount cannot be negative".to_string(),
            ));
        }
        if self.category_id.trim().is_empty() {
            return Err(AppError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        validate_description(&self.description)?;
        validate_attachment_count(self.attachments.len())
    }
}

/// Partial bill update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillPatch {
    pub amount: Option<Decimal>,
    #[serde(deserialize_with = "wire::optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "wire::optional_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub is_recurring: Option<bool>,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub status: Option<BillStatus>,
}

impl BillPatch {
    pub fn status(status: BillStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(AppError::Validation(
                    "Amount cannot be negative".to_string(),
                ));
            }
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(attachments) = &self.attachments {
            validate_attachment_count(attachments.len())?;
        }
        Ok(())
    }

    /// Merge the provided fields into `bill`. Identity and timestamps are
    /// left to the caller.
    pub(crate) fn apply(self, bill: &mut Bill) {
        if let Some(amount) = self.amount {
            bill.amount = amount;
        }
        if let Some(date) = self.date {
            bill.date = date;
        }
        if let Some(due_date) = self.due_date {
            bill.due_date = due_date;
        }
        if let Some(category_id) = self.category_id {
            bill.category_id = category_id;
        }
        if let Some(description) = self.description {
            bill.description = description;
        }
        if let Some(attachments) = self.attachments {
            bill.attachments = attachments;
        }
        if let Some(is_recurring) = self.is_recurring {
            bill.is_recurring = is_recurring;
        }
        if let Some(frequency) = self.recurring_frequency {
            bill.recurring_frequency = Some(frequency);
        }
        if let Some(status) = self.status {
            bill.status = status;
        }
        bill.normalize_recurrence();
    }
}

/// Raw input of the new-bill form
#[derive(Debug, Clone, Default)]
pub struct BillDraft {
    /// Amount exactly as typed
    pub amount: String,
    pub category_id: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub attachments: Vec<String>,
}

impl BillDraft {
    /// Turn the form input into a `NewBill` stamped with `now`. Errors carry
    /// the prompt to show the user.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewBill> {
        let amount_text = self.amount.trim();
        if amount_text.is_empty() || self.category_id.trim().is_empty() {
            return Err(AppError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }

        let amount = Decimal::from_str(amount_text)
            .map_err(|_| AppError::Validation("Please enter a valid amount".to_string()))?;

        let bill = NewBill {
            amount,
            date: now,
            due_date: self.due_date.unwrap_or(now),
            category_id: self.category_id,
            description: self.description,
            attachments: self.attachments,
            is_recurring: self.is_recurring,
            recurring_frequency: self.recurring_frequency,
            status: BillStatus::Unpaid,
        };
        bill.validate()?;

        Ok(bill)
    }
}

/// A spending bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub budget_limit: Option<Decimal>,
}

/// Fields supplied when creating a category
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub icon: String,
    #[serde(default)]
    pub budget_limit: Option<Decimal>,
}

impl NewCategory {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_category_name(&self.name)?;
        validate_budget_limit(self.budget_limit)
    }
}

/// Partial category update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    /// `Some(None)` removes the budget limit
    #[serde(deserialize_with = "wire::double_option")]
    pub budget_limit: Option<Option<Decimal>>,
}

impl CategoryPatch {
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_category_name(name)?;
        }
        if let Some(limit) = self.budget_limit {
            validate_budget_limit(limit)?;
        }
        Ok(())
    }

    pub(crate) fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name.trim().to_string();
        }
        if let Some(color) = self.color {
            category.color = color;
        }
        if let Some(icon) = self.icon {
            category.icon = icon;
        }
        if let Some(limit) = self.budget_limit {
            category.budget_limit = limit;
        }
    }
}

/// Full store state as written to the storage slot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub bills: Vec<Bill>,
    pub categories: Vec<Category>,
    pub theme: Theme,
}

fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(AppError::Validation(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}

fn validate_attachment_count(count: usize) -> Result<()> {
    if count > MAX_ATTACHMENTS_PER_BILL {
        return Err(AppError::Validation(format!(
            "A bill can have at most {} attachments",
            MAX_ATTACHMENTS_PER_BILL
        )));
    }
    Ok(())
}

fn validate_category_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Category name is required".to_string()));
    }
    if trimmed.chars().count() > crate::config::MAX_CATEGORY_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Category name must be at most {} characters",
            crate::config::MAX_CATEGORY_NAME_LENGTH
        )));
    }
    Ok(())
}

fn validate_budget_limit(limit: Option<Decimal>) -> Result<()> {
    match limit {
        Some(limit) if limit.is_sign_negative() && !limit.is_zero() => Err(
            AppError::Validation("Budget limit cannot be negative".to_string()),
        ),
        _ => Ok(()),
    }
}
