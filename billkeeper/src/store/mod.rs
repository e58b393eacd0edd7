//! Application store
//!
//! Single owner of the user session, bills, categories and theme. Every
//! mutation is applied to memory synchronously and then hands a snapshot to
//! the `Persister`, so the new state is readable before the write lands.
//!
//! Updates and deletes of unknown ids are silent no-ops; they return `None`
//! or `false` so callers can tell without an error.

pub mod models;
pub mod persister;
mod wire;

pub use models::*;
pub use persister::Persister;

use crate::config::UNCATEGORIZED_LABEL;
use crate::error::{AppError, Result};
use crate::storage::SnapshotStorage;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

pub struct AppStore {
    state: Snapshot,
    persister: Persister,
}

impl AppStore {
    /// Store seeded from `snapshot` with an explicit persister
    pub fn new(state: Snapshot, persister: Persister) -> Self {
        Self { state, persister }
    }

    /// Empty store that never persists
    pub fn in_memory() -> Self {
        Self::new(Snapshot::default(), Persister::detached())
    }

    /// Load the persisted snapshot and attach a background writer for
    /// `storage`. A missing or unreadable slot starts an empty store. Must be
    /// called inside a tokio runtime.
    pub async fn open<S: SnapshotStorage>(storage: S) -> Result<Self> {
        let state = match storage.load().await {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    "Restored store: {} bills, {} categories, authenticated={}",
                    snapshot.bills.len(),
                    snapshot.categories.len(),
                    snapshot.is_authenticated
                );
                snapshot
            }
            Ok(None) => {
                tracing::info!("No saved state, starting with an empty store");
                Snapshot::default()
            }
            Err(e) => {
                tracing::error!("Failed to restore saved state, starting empty: {}", e);
                Snapshot::default()
            }
        };

        Ok(Self::new(state, Persister::spawn(storage)))
    }

    /// Wait for queued snapshot writes; reports the latest write's outcome
    pub async fn flush(&self) -> Result<()> {
        self.persister.flush().await
    }

    fn persist(&self) {
        self.persister.request_save(self.state.clone());
    }

    // ===== Selectors =====

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated
    }

    pub fn bills(&self) -> &[Bill] {
        &self.state.bills
    }

    pub fn categories(&self) -> &[Category] {
        &self.state.categories
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn bill(&self, id: &str) -> Option<&Bill> {
        self.state.bills.iter().find(|bill| bill.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.state.categories.iter().find(|category| category.id == id)
    }

    /// Category name for display, `Uncategorized` when the reference dangles
    pub fn category_name_for(&self, bill: &Bill) -> &str {
        self.category(&bill.category_id)
            .map(|category| category.name.as_str())
            .unwrap_or(UNCATEGORIZED_LABEL)
    }

    /// Copy of the full state
    pub fn snapshot(&self) -> Snapshot {
        self.state.clone()
    }

    // ===== Session =====

    /// Sign in. Credentials are not verified; any non-empty pair yields a
    /// session with a default profile.
    pub fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Please enter your email and password".to_string(),
            ));
        }

        let user = User::with_defaults(Uuid::new_v4().to_string(), email.to_string());
        self.state.user = Some(user.clone());
        self.state.is_authenticated = true;
        self.persist();

        tracing::info!("User signed in: {}", user.email);
        Ok(user)
    }

    /// Clear the session; safe to call when already signed out
    pub fn logout(&mut self) {
        self.state.user = None;
        self.state.is_authenticated = false;
        self.persist();

        tracing::info!("User signed out");
    }

    /// Apply a settings-screen edit to the signed-in user
    pub fn update_profile(&mut self, patch: UserPatch) -> Option<User> {
        let user = self.state.user.as_mut()?;

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(picture) = patch.profile_picture {
            user.profile_picture = picture;
        }
        if let Some(currency) = patch.preferred_currency {
            user.preferred_currency = currency;
        }
        if let Some(language) = patch.language {
            user.language = language;
        }
        if let Some(settings) = patch.notification_settings {
            user.notification_settings = settings;
        }

        let user = user.clone();
        self.persist();
        Some(user)
    }

    // ===== Bills =====

    pub fn add_bill(&mut self, new_bill: NewBill) -> Result<Bill> {
        new_bill.validate()?;

        let now = Utc::now();
        let mut bill = Bill {
            id: self.fresh_bill_id(),
            amount: new_bill.amount,
            date: new_bill.date,
            due_date: new_bill.due_date,
            category_id: new_bill.category_id,
            description: new_bill.description,
            attachments: new_bill.attachments,
            is_recurring: new_bill.is_recurring,
            recurring_frequency: new_bill.recurring_frequency,
            status: new_bill.status,
            created_at: now,
            updated_at: now,
        };
        bill.normalize_recurrence();

        self.state.bills.push(bill.clone());
        self.persist();

        tracing::debug!("Added bill {} ({})", bill.id, bill.amount);
        Ok(bill)
    }

    /// Merge `patch` into the bill. `Ok(None)` when the id is unknown.
    pub fn update_bill(&mut self, id: &str, patch: BillPatch) -> Result<Option<Bill>> {
        let Some(bill) = self.state.bills.iter_mut().find(|bill| bill.id == id) else {
            tracing::debug!("Update ignored, bill not found: {}", id);
            return Ok(None);
        };

        patch.validate()?;

        patch.apply(bill);
        bill.updated_at = stamp_after(bill.updated_at);

        let bill = bill.clone();
        self.persist();

        tracing::debug!("Updated bill {}", id);
        Ok(Some(bill))
    }

    /// Flip between paid and unpaid
    pub fn toggle_bill_status(&mut self, id: &str) -> Option<Bill> {
        let status = self.bill(id)?.status.toggled();
        self.update_bill(id, BillPatch::status(status)).ok().flatten()
    }

    /// Append a picker-supplied locator to the bill's attachments
    pub fn add_attachment(&mut self, id: &str, locator: String) -> Result<Option<Bill>> {
        let Some(bill) = self.bill(id) else {
            return Ok(None);
        };

        let mut attachments = bill.attachments.clone();
        attachments.push(locator);

        self.update_bill(
            id,
            BillPatch {
                attachments: Some(attachments),
                ..BillPatch::default()
            },
        )
    }

    /// Remove the bill; `false` when it did not exist
    pub fn delete_bill(&mut self, id: &str) -> bool {
        let before = self.state.bills.len();
        self.state.bills.retain(|bill| bill.id != id);

        if self.state.bills.len() == before {
            tracing::debug!("Delete ignored, bill not found: {}", id);
            return false;
        }

        self.persist();
        tracing::debug!("Deleted bill {}", id);
        true
    }

    // ===== Categories =====

    pub fn add_category(&mut self, new_category: NewCategory) -> Result<Category> {
        new_category.validate()?;

        let category = Category {
            id: self.fresh_category_id(),
            name: new_category.name.trim().to_string(),
            color: new_category.color,
            icon: new_category.icon,
            budget_limit: new_category.budget_limit,
        };

        self.state.categories.push(category.clone());
        self.persist();

        tracing::debug!("Added category {} ({})", category.id, category.name);
        Ok(category)
    }

    pub fn update_category(&mut self, id: &str, patch: CategoryPatch) -> Result<Option<Category>> {
        let Some(category) = self
            .state
            .categories
            .iter_mut()
            .find(|category| category.id == id)
        else {
            tracing::debug!("Update ignored, category not found: {}", id);
            return Ok(None);
        };

        patch.validate()?;
        patch.apply(category);

        let category = category.clone();
        self.persist();
        Ok(Some(category))
    }

    /// Remove the category. Bills referencing it are left untouched and
    /// read as `Uncategorized` from then on.
    pub fn delete_category(&mut self, id: &str) -> bool {
        let before = self.state.categories.len();
        self.state.categories.retain(|category| category.id != id);

        if self.state.categories.len() == before {
            tracing::debug!("Delete ignored, category not found: {}", id);
            return false;
        }

        self.persist();
        tracing::debug!("Deleted category {}", id);
        true
    }

    // ===== Theme =====

    pub fn set_theme(&mut self, theme: Theme) {
        self.state.theme = theme;
        self.persist();
    }

    fn fresh_bill_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.bill(&id).is_none() {
                return id;
            }
        }
    }

    fn fresh_category_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.category(&id).is_none() {
                return id;
            }
        }
    }
}

/// Current time, nudged forward so it is strictly later than `previous`
fn stamp_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonFileStorage, MemoryStorage};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn new_bill(amount: i64, category_id: &str) -> NewBill {
        NewBill {
            amount: Decimal::from(amount),
            date: Utc::now(),
            due_date: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            category_id: category_id.to_string(),
            description: String::new(),
            attachments: Vec::new(),
            is_recurring: false,
            recurring_frequency: None,
            status: BillStatus::Unpaid,
        }
    }

    fn new_category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            color: "#007AFF".to_string(),
            icon: "home".to_string(),
            budget_limit: None,
        }
    }

    #[test]
    fn test_add_bill_then_mark_paid() {
        let mut store = AppStore::in_memory();
        assert!(store.bills().is_empty());

        let bill = store.add_bill(new_bill(50, "c1")).unwrap();
        assert_eq!(store.bills().len(), 1);
        assert_eq!(bill.status, BillStatus::Unpaid);
        assert_eq!(bill.amount, Decimal::from(50));
        assert_eq!(bill.created_at, bill.updated_at);

        let updated = store
            .update_bill(&bill.id, BillPatch::status(BillStatus::Paid))
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, BillStatus::Paid);
        assert_eq!(updated.amount, Decimal::from(50));
        assert_eq!(updated.category_id, "c1");
        assert_eq!(updated.id, bill.id);
        assert_eq!(updated.created_at, bill.created_at);
    }

    #[test]
    fn test_bill_ids_are_unique() {
        let mut store = AppStore::in_memory();

        for _ in 0..100 {
            store.add_bill(new_bill(1, "c1")).unwrap();
        }

        let mut ids: Vec<&str> = store.bills().iter().map(|b| b.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_status_round_trip_advances_updated_at() {
        let mut store = AppStore::in_memory();
        let bill = store.add_bill(new_bill(20, "c1")).unwrap();
        let before = store.bill(&bill.id).unwrap().updated_at;

        store
            .update_bill(&bill.id, BillPatch::status(BillStatus::Paid))
            .unwrap();
        let after = store
            .update_bill(&bill.id, BillPatch::status(BillStatus::Unpaid))
            .unwrap()
            .unwrap();

        assert_eq!(after.status, BillStatus::Unpaid);
        assert!(after.updated_at > before);
    }

    #[test]
    fn test_non_recurring_drops_frequency() {
        let mut store = AppStore::in_memory();

        let bill = store
            .add_bill(NewBill {
                is_recurring: false,
                recurring_frequency: Some(RecurringFrequency::Weekly),
                ..new_bill(10, "c1")
            })
            .unwrap();
        assert_eq!(bill.recurring_frequency, None);

        let recurring = store
            .update_bill(
                &bill.id,
                BillPatch {
                    is_recurring: Some(true),
                    ..BillPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(
            recurring.recurring_frequency,
            Some(RecurringFrequency::Monthly)
        );

        let stopped = store
            .update_bill(
                &bill.id,
                BillPatch {
                    is_recurring: Some(false),
                    recurring_frequency: Some(RecurringFrequency::Yearly),
                    ..BillPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(!stopped.is_recurring);
        assert_eq!(stopped.recurring_frequency, None);
    }

    #[test]
    fn test_unknown_ids_are_no_ops() {
        let mut store = AppStore::in_memory();
        store.add_bill(new_bill(5, "c1")).unwrap();
        let before = store.snapshot();

        assert!(!store.delete_bill("missing"));
        assert!(store
            .update_bill("missing", BillPatch::status(BillStatus::Paid))
            .unwrap()
            .is_none());
        assert!(store.toggle_bill_status("missing").is_none());
        assert!(!store.delete_category("missing"));
        assert!(store
            .update_category("missing", CategoryPatch::default())
            .unwrap()
            .is_none());

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_invalid_patch_on_unknown_id_is_a_no_op() {
        let mut store = AppStore::in_memory();

        let bill = store.update_bill(
            "missing",
            BillPatch {
                amount: Some(Decimal::from(-3)),
                ..BillPatch::default()
            },
        );
        assert!(bill.unwrap().is_none());

        let category = store.update_category(
            "missing",
            CategoryPatch {
                name: Some("   ".to_string()),
                ..CategoryPatch::default()
            },
        );
        assert!(category.unwrap().is_none());
    }

    #[test]
    fn test_update_category_trims_name() {
        let mut store = AppStore::in_memory();
        let category = store.add_category(new_category("Housing")).unwrap();

        let updated = store
            .update_category(
                &category.id,
                CategoryPatch {
                    name: Some("  Rent  ".to_string()),
                    ..CategoryPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Rent");
        assert_eq!(store.category(&category.id).unwrap().name, "Rent");
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut store = AppStore::in_memory();
        assert!(matches!(
            store.add_bill(new_bill(-1, "c1")),
            Err(AppError::Validation(_))
        ));

        let bill = store.add_bill(new_bill(0, "c1")).unwrap();
        let result = store.update_bill(
            &bill.id,
            BillPatch {
                amount: Some(Decimal::from(-3)),
                ..BillPatch::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(store.bill(&bill.id).unwrap().amount, Decimal::ZERO);
    }

    #[test]
    fn test_delete_category_leaves_bills_dangling() {
        let mut store = AppStore::in_memory();
        let category = store.add_category(new_category("Utilities")).unwrap();
        let bill = store.add_bill(new_bill(80, &category.id)).unwrap();

        assert_eq!(store.category_name_for(&bill), "Utilities");
        assert!(store.delete_category(&category.id));

        let kept = store.bill(&bill.id).unwrap();
        assert_eq!(kept, &bill);
        assert_eq!(kept.category_id, category.id);
        assert_eq!(store.category_name_for(kept), UNCATEGORIZED_LABEL);
    }

    #[test]
    fn test_toggle_and_attachments() {
        let mut store = AppStore::in_memory();
        let bill = store.add_bill(new_bill(12, "c1")).unwrap();

        let paid = store.toggle_bill_status(&bill.id).unwrap();
        assert!(paid.is_paid());
        let unpaid = store.toggle_bill_status(&bill.id).unwrap();
        assert!(!unpaid.is_paid());

        store
            .add_attachment(&bill.id, "file:///receipt-1.pdf".to_string())
            .unwrap();
        let with_two = store
            .add_attachment(&bill.id, "file:///receipt-2.pdf".to_string())
            .unwrap()
            .unwrap();
        assert_eq!(
            with_two.attachments,
            vec!["file:///receipt-1.pdf", "file:///receipt-2.pdf"]
        );
    }

    #[test]
    fn test_update_category_merges_fields() {
        let mut store = AppStore::in_memory();
        let category = store.add_category(new_category("Rent")).unwrap();

        let updated = store
            .update_category(
                &category.id,
                CategoryPatch {
                    color: Some("#FF3B30".to_string()),
                    budget_limit: Some(Some(Decimal::from(1200))),
                    ..CategoryPatch::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Rent");
        assert_eq!(updated.color, "#FF3B30");
        assert_eq!(updated.budget_limit, Some(Decimal::from(1200)));
        assert!(store.add_category(new_category("  ")).is_err());
    }

    #[test]
    fn test_login_logout_and_profile() {
        let mut store = AppStore::in_memory();
        assert!(store.update_profile(UserPatch::default()).is_none());
        assert!(store.login("", "secret").is_err());
        assert!(store.login("me@example.com", "").is_err());

        let user = store.login("me@example.com", "anything").unwrap();
        assert!(store.is_authenticated());
        assert_eq!(user.email, "me@example.com");
        assert_eq!(user.preferred_currency, "USD");
        assert_eq!(user.language, "en");
        assert!(user.notification_settings.budget_alerts);

        let updated = store
            .update_profile(UserPatch {
                name: Some("Ada".to_string()),
                preferred_currency: Some("EUR".to_string()),
                ..UserPatch::default()
            })
            .unwrap();
        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.language, "en");

        store.logout();
        store.logout();
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_theme_defaults_to_system() {
        let mut store = AppStore::in_memory();
        assert_eq!(store.theme(), Theme::System);

        store.set_theme(Theme::Dark);
        assert_eq!(store.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_mutations_reach_storage() {
        let storage = MemoryStorage::new();
        let mut store = AppStore::open(storage.clone()).await.unwrap();

        let category = store.add_category(new_category("Internet")).unwrap();
        store.add_bill(new_bill(80, &category.id)).unwrap();
        store.set_theme(Theme::Light);
        store.flush().await.unwrap();

        let reopened = AppStore::open(storage).await.unwrap();
        assert_eq!(reopened.snapshot(), store.snapshot());
    }

    #[tokio::test]
    async fn test_no_op_delete_does_not_write() {
        let storage = MemoryStorage::new();
        let mut store = AppStore::open(storage.clone()).await.unwrap();

        assert!(!store.delete_bill("missing"));
        store.flush().await.unwrap();

        assert_eq!(storage.save_count(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_state() {
        let storage = MemoryStorage::new();
        let mut store = AppStore::open(storage.clone()).await.unwrap();

        storage.set_fail_writes(true);
        let bill = store.add_bill(new_bill(30, "c1")).unwrap();
        assert!(store.flush().await.is_err());
        assert!(store.bill(&bill.id).is_some());

        storage.set_fail_writes(false);
        store.set_theme(Theme::Dark);
        store.flush().await.unwrap();

        let reopened = AppStore::open(storage).await.unwrap();
        assert_eq!(reopened.bills().len(), 1);
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_unreadable_slot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(crate::config::SNAPSHOT_FILE_NAME);
        tokio::fs::write(&path, "{ broken").await.unwrap();

        let mut store = AppStore::open(JsonFileStorage::new(path.clone()))
            .await
            .unwrap();
        assert_eq!(store.snapshot(), Snapshot::default());

        // The next write replaces the broken slot
        store.set_theme(Theme::Dark);
        store.flush().await.unwrap();

        let reopened = AppStore::open(JsonFileStorage::new(path)).await.unwrap();
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_open_accepts_date_only_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(crate::config::SNAPSHOT_FILE_NAME);
        tokio::fs::write(
            &path,
            r#"{"state":{"bills":[{"id":"b1","amount":12.5,"date":"2024-02-01","dueDate":"2024-03-01","categoryId":"c1","description":"Electricity","status":"unpaid","createdAt":"2024-02-01T10:00:00Z","updatedAt":"2024-02-01T10:00:00Z"}]},"version":0}"#,
        )
        .await
        .unwrap();

        let store = AppStore::open(JsonFileStorage::new(path)).await.unwrap();
        let bill = store.bill("b1").unwrap();
        assert_eq!(
            bill.due_date,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(bill.amount, Decimal::new(125, 1));
    }
}
